//! Built-in lookup data: condition aliases, curated herbal and
//! pharmaceutical stores, known interactions.
//!
//! A [`StoreCatalog`] can also be read from a JSON file with the same shape,
//! which replaces the built-in data entirely.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use super::recommendations::{Availability, DrugTemplate, HerbalEntry, PharmaEntry, RecommendationStore};
use super::resolver::ConditionResolver;
use super::safety::{Interaction, SafetyGate};
use crate::error::PipelineError;
use Availability::{Common, EmergencyOnly, HospitalOnly, Otc, Prescription};

/// Historical and synonymous names -> store key
const ALIASES: &[(&str, &str)] = &[
    ("Influenza", "Fever"),
    ("Viral Fever", "Fever"),
    ("Flu", "Fever"),
    ("Common Cold", "Cold"),
    ("Pharyngitis", "Cold"),
    ("Rhinitis", "Cold"),
    ("Laryngitis", "Cold"),
    ("Cough", "Cold"),
    ("Pneumonia", "Bronchitis"),
    ("Tuberculosis", "Bronchitis"),
    ("Chikungunya", "Dengue"),
    ("Anxiety", "Depression"),
    ("Gastroenteritis", "GERD"),
    ("Diarrhea", "GERD"),
    ("Food Poisoning", "GERD"),
    ("Skin Infection", "Impetigo"),
    ("Headache", "Fever"),
    ("Migraine", "Fever"),
    ("Body Ache", "Fever"),
    ("Hypothyroidism", "Fever"),
    ("Hyperthyroidism", "Fever"),
    ("Thyroid", "Fever"),
    ("Urticaria", "Fever"),
    ("Osteoarthritis", "Arthritis"),
    ("Rheumatoid Arthritis", "Arthritis"),
    ("Joint Pain", "Arthritis"),
    ("Gout", "Arthritis"),
];

const fn drug(
    name: &'static str,
    brand_names: &'static [&'static str],
    dosage: &'static str,
    purpose: &'static str,
    availability: Availability,
) -> DrugTemplate {
    DrugTemplate {
        name,
        brand_names,
        dosage,
        purpose,
        availability,
    }
}

const PARACETAMOL: DrugTemplate = drug(
    "Paracetamol",
    &["Calpol", "Dolo 650", "Panadol"],
    "500-1000 mg every 6 hours",
    "Fever and pain management",
    Otc,
);

const IBUPROFEN: DrugTemplate = drug(
    "Ibuprofen",
    &["Brufen", "Combiflam"],
    "400-600 mg every 6-8 hours",
    "Anti-inflammatory, pain and fever relief",
    Otc,
);

const GUAIFENESIN: DrugTemplate = drug(
    "Cough Syrup (Guaifenesin)",
    &["Mucinex", "Robitussin", "Actikuf"],
    "5-10 ml every 4-6 hours",
    "Expectorant, clears mucus",
    Otc,
);

struct ConditionTemplate {
    key: &'static str,
    herbal: &'static [(&'static str, f64)],
    pharmaceuticals: &'static [DrugTemplate],
}

static CONDITIONS: &[ConditionTemplate] = &[
    ConditionTemplate {
        key: "Diabetes",
        herbal: &[("Bitter Melon", 0.8), ("Fenugreek", 0.75), ("Cinnamon", 0.6), ("Gymnema", 0.7)],
        pharmaceuticals: &[
            drug("Metformin", &["Glucophage", "Diabex"], "500-2000 mg daily (divided doses)", "First-line treatment, reduces blood glucose", Common),
            drug("Glibenclamide", &["Daonil", "Euglucon"], "5-20 mg daily", "Stimulates insulin release", Common),
            drug("Sitagliptin", &["Januvia", "Siglist"], "100 mg daily", "DPP-4 inhibitor, moderates blood glucose", Prescription),
            drug("Insulin (Rapid-acting)", &["Novolog", "Humalog"], "Individualized, before meals", "Direct blood glucose control", Prescription),
        ],
    },
    ConditionTemplate {
        key: "Heart Disease",
        herbal: &[("Garlic", 0.7), ("Hawthorn", 0.75), ("Arjuna", 0.8)],
        pharmaceuticals: &[
            drug("Aspirin", &["Disperin", "Ecosprin"], "75-325 mg daily", "Blood thinner, prevents clots", Otc),
            drug("Atorvastatin", &["Lipitor", "Storvas"], "10-80 mg daily", "Reduces cholesterol, prevents heart disease", Common),
            drug("Amlodipine", &["Norvasc", "Amlong"], "2.5-10 mg daily", "Blood pressure control", Common),
            drug("Metoprolol", &["Lopressor", "Betaloc"], "50-190 mg daily", "Beta-blocker, reduces heart rate and BP", Common),
            drug("Nitroglycerin (Sublingual)", &["Nitrostat", "Angised"], "0.4 mg under the tongue, may repeat once", "Acute angina relief", EmergencyOnly),
        ],
    },
    ConditionTemplate {
        key: "Asthma",
        herbal: &[("Tulsi", 0.7), ("Licorice", 0.6), ("Ginger", 0.65), ("Turmeric", 0.55)],
        pharmaceuticals: &[
            drug("Salbutamol", &["Ventolin", "Asthalin"], "100-200 mcg per dose, as needed", "Quick relief from asthma symptoms", Common),
            drug("Beclomethasone", &["Beclate", "Budecort"], "50-200 mcg twice daily", "Long-term control, reduces airway inflammation", Common),
            drug("Montelukast", &["Singulair", "Montair"], "4-10 mg daily", "Leukotriene inhibitor, prevents attacks", Prescription),
            drug("Nebulized Bronchodilator", &[], "As directed by emergency staff", "Severe attack not responding to inhaler", EmergencyOnly),
        ],
    },
    ConditionTemplate {
        key: "Depression",
        herbal: &[("Ashwagandha", 0.7), ("St John's Wort", 0.65), ("Brahmi", 0.6)],
        pharmaceuticals: &[
            drug("Sertraline", &["Zoloft", "Setarox"], "50-200 mg daily", "SSRI, increases serotonin levels", Prescription),
            drug("Escitalopram", &["Lexapro", "Escitalem"], "10-20 mg daily", "SSRI, antidepressant", Prescription),
            drug("Fluoxetine", &["Prozac", "Fluoxil"], "20-80 mg daily", "SSRI, long-acting antidepressant", Prescription),
        ],
    },
    ConditionTemplate {
        key: "COVID-19",
        herbal: &[("Giloy", 0.65), ("Tulsi", 0.6), ("Turmeric", 0.55)],
        pharmaceuticals: &[
            PARACETAMOL,
            drug("Dexamethasone", &["Decadron"], "6-8 mg daily", "Corticosteroid, reduces inflammation", Prescription),
            drug("Remdesivir", &["Veklury"], "200 mg loading, 100 mg daily", "Antiviral, reduces severity", HospitalOnly),
            drug("Tocilizumab", &["Actemra"], "4-8 mg/kg single dose", "Immunosuppressant, reduces cytokine storm", HospitalOnly),
        ],
    },
    ConditionTemplate {
        key: "Bronchitis",
        herbal: &[("Tulsi", 0.75), ("Licorice", 0.7), ("Ginger", 0.65), ("Honey", 0.6)],
        pharmaceuticals: &[
            GUAIFENESIN,
            drug("Amoxicillin", &["Augmentin", "Amoxyclav"], "500 mg thrice daily", "Antibiotic, treats bacterial infection", Common),
            drug("Salbutamol", &["Asthalin", "Ventolin"], "100-200 mcg, as needed", "Bronchodilator, relieves symptoms", Common),
            drug("Codeine", &["Codeimed", "Tixylix"], "15-30 mg every 6-8 hours", "Cough suppressant", Prescription),
        ],
    },
    ConditionTemplate {
        key: "Malaria",
        herbal: &[("Artemisia Annua", 0.8), ("Neem", 0.6), ("Giloy", 0.55)],
        pharmaceuticals: &[
            drug("Lumefantrine + Artemether", &["Coartem", "Artemin"], "As per body weight", "Artemisinin-based combination therapy", Prescription),
            drug("Chloroquine", &["Avloclor"], "600 mg daily for 3 days", "Treats Plasmodium vivax and ovale", Prescription),
            drug("Primaquine", &["Primacine"], "15-30 mg daily for 14 days", "Eliminates dormant parasites", Prescription),
            drug("Quinine", &["Quinorm"], "10 mg/kg every 8 hours", "Alternative for severe malaria", HospitalOnly),
            drug("IV Artesunate", &[], "2.4 mg/kg IV at 0, 12 and 24 hours", "Severe or cerebral malaria", EmergencyOnly),
        ],
    },
    ConditionTemplate {
        key: "Impetigo",
        herbal: &[("Neem", 0.75), ("Tea Tree Oil", 0.7), ("Turmeric", 0.6), ("Aloe Vera", 0.5)],
        pharmaceuticals: &[
            drug("Mupirocin Ointment", &["Bactroban"], "Apply locally 3 times daily", "Topical antibiotic for mild cases", Otc),
            drug("Cephalexin", &["Ceporex", "Lexinorm"], "500 mg four times daily", "Cephalosporin antibiotic", Common),
            drug("Cloxacillin", &["Orbenin", "Cloxapen"], "500 mg four times daily", "Beta-lactamase resistant penicillin", Common),
        ],
    },
    ConditionTemplate {
        key: "GERD",
        herbal: &[("Licorice", 0.7), ("Ginger", 0.65), ("Aloe Vera", 0.6), ("Fennel", 0.55)],
        pharmaceuticals: &[
            drug("Antacid (Aluminum Hydroxide)", &["Maalox", "Gelusil", "Mucaine"], "As needed after meals", "Neutralizes stomach acid", Otc),
            drug("Omeprazole", &["Prilosec", "Omez"], "20-40 mg daily", "Proton pump inhibitor, reduces acid", Common),
            drug("Pantoprazole", &["Pantocid"], "40 mg daily", "PPI, long-acting acid reduction", Common),
            drug("Domperidone", &["Motilium"], "10-20 mg thrice daily", "Promotes gastric motility", Common),
        ],
    },
    ConditionTemplate {
        key: "Dengue",
        herbal: &[("Papaya Leaf Extract", 0.8), ("Giloy", 0.7), ("Neem", 0.5)],
        pharmaceuticals: &[
            PARACETAMOL,
            drug("Oral Rehydration Solution", &["ORS Packets", "Electral"], "As tolerated, frequently", "Fluid and electrolyte replacement", Otc),
            drug("Chlorpheniramine", &["Avil"], "4-6 mg every 6-8 hours", "Antihistamine, reduces allergic reactions", Common),
            drug("Platelet Transfusion", &[], "As per requirement", "For severe thrombocytopenia", HospitalOnly),
        ],
    },
    ConditionTemplate {
        key: "Fever",
        herbal: &[("Giloy", 0.8), ("Tulsi", 0.75), ("Ginger", 0.6)],
        pharmaceuticals: &[
            PARACETAMOL,
            IBUPROFEN,
            drug("Aspirin", &["Disperin"], "325-650 mg every 4-6 hours", "Fever reduction and pain relief", Otc),
            drug("Metamizole", &["Novalgin", "Analgin"], "500-1000 mg every 6-8 hours", "Potent fever and pain reliever", Common),
        ],
    },
    ConditionTemplate {
        key: "Cold",
        herbal: &[("Tulsi", 0.8), ("Ginger", 0.75), ("Honey", 0.65), ("Echinacea", 0.6)],
        pharmaceuticals: &[
            GUAIFENESIN,
            drug("Cetirizine", &["Allerdin", "Histacet"], "10 mg once daily", "Antihistamine for allergy and runny nose", Otc),
            drug("Decongestant Nasal Spray", &["Nasivion", "Otrivin"], "1-2 sprays in each nostril every 8-12 hours", "Nasal congestion relief", Otc),
            PARACETAMOL,
        ],
    },
    ConditionTemplate {
        key: "Arthritis",
        herbal: &[("Turmeric", 0.85), ("Boswellia", 0.75), ("Ginger", 0.7), ("Ashwagandha", 0.55)],
        pharmaceuticals: &[
            drug("Ibuprofen", &["Brufen", "Ibugesic"], "200-400 mg every 6-8 hours", "NSAID, reduces inflammation and joint pain", Otc),
            drug("Glucosamine + Chondroitin", &["Joint-Care"], "1500 mg + 1200 mg daily", "Joint cartilage support", Otc),
            drug("Naproxen", &["Naprosyn", "Aleve"], "250-500 mg twice daily", "Long-acting NSAID for arthritis pain", Common),
            drug("Diclofenac", &["Voveran", "Cataflam"], "50-100 mg daily (divided doses)", "NSAID for moderate to severe joint pain", Common),
            drug("Methotrexate", &["Methoblast"], "7.5-25 mg weekly", "DMARD for rheumatoid arthritis", Prescription),
        ],
    },
];

/// (first, second, effect)
const INTERACTIONS: &[(&str, &str, &str)] = &[
    ("Ginger", "Aspirin", "May increase bleeding risk"),
    ("Ginger", "Warfarin", "May increase bleeding risk"),
    ("Turmeric", "Aspirin", "May increase bleeding risk"),
    ("Garlic", "Aspirin", "Additive antiplatelet effect, bleeding risk"),
    ("Ginkgo", "Aspirin", "Additive antiplatelet effect, bleeding risk"),
    ("Licorice", "Amlodipine", "Can raise blood pressure and counter the medication"),
    ("Licorice", "Digoxin", "Low potassium increases digoxin toxicity"),
    ("Ibuprofen", "Aspirin", "Reduces aspirin's cardioprotective effect, GI bleeding risk"),
    ("St John's Wort", "Sertraline", "Risk of serotonin syndrome"),
    ("Bitter Melon", "Metformin", "Additive glucose lowering, risk of hypoglycemia"),
    ("Fenugreek", "Metformin", "Additive glucose lowering, risk of hypoglycemia"),
];

/// Aliases, stores and interactions as one read-only bundle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreCatalog {
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub herbal: BTreeMap<String, Vec<HerbalEntry>>,
    #[serde(default)]
    pub pharmaceuticals: BTreeMap<String, Vec<PharmaEntry>>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl StoreCatalog {
    /// Compiled-in catalog
    pub fn builtin() -> Self {
        let aliases = ALIASES
            .iter()
            .map(|(alias, key)| (alias.to_string(), key.to_string()))
            .collect();
        let herbal = CONDITIONS
            .iter()
            .map(|c| {
                let entries = c.herbal.iter().map(|(name, rel)| HerbalEntry::new(name, *rel)).collect();
                (c.key.to_string(), entries)
            })
            .collect();
        let pharmaceuticals = CONDITIONS
            .iter()
            .map(|c| {
                let entries = c.pharmaceuticals.iter().map(DrugTemplate::to_entry).collect();
                (c.key.to_string(), entries)
            })
            .collect();
        let interactions = INTERACTIONS
            .iter()
            .map(|(first, second, effect)| Interaction {
                first: first.to_string(),
                second: second.to_string(),
                effect: effect.to_string(),
            })
            .collect();

        Self {
            aliases,
            herbal,
            pharmaceuticals,
            interactions,
        }
    }

    /// Reads a catalog from JSON. Missing sections are empty.
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let raw = fs::read_to_string(path)?;
        let catalog: StoreCatalog = serde_json::from_str(&raw)?;
        catalog.validate()?;
        info!(
            conditions = catalog.herbal.len().max(catalog.pharmaceuticals.len()),
            aliases = catalog.aliases.len(),
            "Loaded store catalog from {}",
            path.display()
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.herbal.is_empty() && self.pharmaceuticals.is_empty() {
            return Err(PipelineError::Config("Store catalog has no conditions".into()));
        }
        if let Some((key, entry)) = self
            .herbal
            .iter()
            .flat_map(|(key, entries)| entries.iter().map(move |e| (key, e)))
            .find(|(_, e)| !(0.0..=1.0).contains(&e.relevance))
        {
            return Err(PipelineError::Config(format!(
                "Herbal relevance for '{}' under '{}' is outside 0..1",
                entry.name, key
            )));
        }
        Ok(())
    }

    /// Splits the catalog into the three read-only components.
    pub fn into_parts(self) -> (ConditionResolver, RecommendationStore, SafetyGate) {
        let resolver = ConditionResolver::new(&self.aliases);
        let store = RecommendationStore::new(self.herbal, self.pharmaceuticals);
        let safety = SafetyGate::new(self.interactions);
        (resolver, store, safety)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_shape() {
        let catalog = StoreCatalog::builtin();
        assert_eq!(catalog.herbal.len(), 13);
        assert_eq!(catalog.pharmaceuticals.len(), 13);
        assert!(!catalog.herbal.contains_key("Typhoid"));
        assert!(catalog.herbal.values().all(|v| !v.is_empty()));
        assert!(catalog.pharmaceuticals.values().all(|v| !v.is_empty()));

        // every alias points at a real key
        for (alias, key) in &catalog.aliases {
            assert!(catalog.herbal.contains_key(key), "Alias '{}' -> '{}' has no entry", alias, key);
        }
    }

    #[test]
    fn test_builtin_parts_resolve_aliases() {
        let (resolver, store, _) = StoreCatalog::builtin().into_parts();
        let resolution = resolver.resolve("Typhoid / Influenza", &store);
        assert_eq!(resolution.key().ok(), Some("Fever"));

        let set = store.recommend(&resolver.resolve("Heart Disease", &store), "Heart Disease");
        assert_eq!(set.emergency_only.len(), 1);
        assert_eq!(set.emergency_only[0].name, "Nitroglycerin (Sublingual)");
    }

    #[test]
    fn test_from_path_replaces_builtin() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"herbal": {{"Scurvy": [{{"name": "Amla", "relevance": 0.9}}]}},
                "aliases": {{"Vitamin C Deficiency": "Scurvy"}}}}"#
        )
        .expect("write");

        let catalog = StoreCatalog::from_path(file.path()).expect("load");
        assert!(catalog.pharmaceuticals.is_empty());
        assert!(catalog.interactions.is_empty());

        let (resolver, store, _) = catalog.into_parts();
        assert_eq!(store.len(), 1);
        assert_eq!(
            resolver.resolve("vitamin c deficiency", &store).key().ok(),
            Some("Scurvy")
        );
    }

    #[test]
    fn test_from_path_rejects_bad_files() {
        let mut empty = tempfile::NamedTempFile::new().expect("temp file");
        write!(empty, "{{}}").expect("write");
        assert!(matches!(
            StoreCatalog::from_path(empty.path()),
            Err(PipelineError::Config(_))
        ));

        let mut broken = tempfile::NamedTempFile::new().expect("temp file");
        write!(broken, "not json").expect("write");
        assert!(matches!(
            StoreCatalog::from_path(broken.path()),
            Err(PipelineError::Serialization(_))
        ));

        assert!(matches!(
            StoreCatalog::from_path(Path::new("/nonexistent/stores.json")),
            Err(PipelineError::Io(_))
        ));
    }
}
