//! Herbal and pharmaceutical recommendations.
//!
//! Lookup cascades from the curated store, to keyword heuristics over the
//! condition name, to a generic symptomatic-relief set. Both lists are
//! therefore never empty.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::resolver::Resolution;

/// Where a pharmaceutical can be obtained. Declaration order is the
/// commonality order used when sorting routine entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Over the counter
    Otc,
    /// Any medical store
    Common,
    Prescription,
    HospitalOnly,
    /// Only under emergency care; never listed with routine entries
    EmergencyOnly,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Availability::Otc => "over the counter",
            Availability::Common => "medical store",
            Availability::Prescription => "prescription",
            Availability::HospitalOnly => "hospital only",
            Availability::EmergencyOnly => "emergency only",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HerbalEntry {
    pub name: String,
    /// 0.0 - 1.0, higher first
    pub relevance: f64,
}

impl HerbalEntry {
    pub fn new(name: &str, relevance: f64) -> Self {
        Self {
            name: name.to_string(),
            relevance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmaEntry {
    pub name: String,
    #[serde(default)]
    pub brand_names: Vec<String>,
    pub dosage: String,
    pub purpose: String,
    pub availability: Availability,
}

/// Static form of [`PharmaEntry`] for compiled-in tables
#[derive(Debug, Clone, Copy)]
pub struct DrugTemplate {
    pub name: &'static str,
    pub brand_names: &'static [&'static str],
    pub dosage: &'static str,
    pub purpose: &'static str,
    pub availability: Availability,
}

impl DrugTemplate {
    pub fn to_entry(&self) -> PharmaEntry {
        PharmaEntry {
            name: self.name.to_string(),
            brand_names: self.brand_names.iter().map(|b| b.to_string()).collect(),
            dosage: self.dosage.to_string(),
            purpose: self.purpose.to_string(),
            availability: self.availability,
        }
    }
}

/// Keyword rule applied to the condition name when the store has nothing
struct Heuristic {
    name: &'static str,
    triggers: &'static [&'static str],
    herbal: &'static [(&'static str, f64)],
    pharmaceuticals: &'static [DrugTemplate],
}

const PARACETAMOL: DrugTemplate = DrugTemplate {
    name: "Paracetamol",
    brand_names: &["Calpol", "Dolo 650", "Panadol"],
    dosage: "500-1000 mg every 6 hours",
    purpose: "Fever and pain management",
    availability: Availability::Otc,
};

const IBUPROFEN: DrugTemplate = DrugTemplate {
    name: "Ibuprofen",
    brand_names: &["Brufen", "Combiflam"],
    dosage: "400-600 mg every 6-8 hours",
    purpose: "Anti-inflammatory, pain and fever relief",
    availability: Availability::Otc,
};

const ORS: DrugTemplate = DrugTemplate {
    name: "Oral Rehydration Solution",
    brand_names: &["ORS Packets", "Electral"],
    dosage: "As tolerated, frequently",
    purpose: "Fluid and electrolyte replacement",
    availability: Availability::Otc,
};

/// Checked in order; the first heuristic with a trigger in the condition wins
static HEURISTICS: &[Heuristic] = &[
    Heuristic {
        name: "gastrointestinal",
        triggers: &["gastro", "diarr", "stomach", "digest", "food poison", "gerd", "acid", "ulcer"],
        herbal: &[("Ginger", 0.85), ("Peppermint", 0.75), ("Turmeric", 0.6), ("ORS", 0.5)],
        pharmaceuticals: &[
            ORS,
            DrugTemplate {
                name: "Antacid (Aluminum Hydroxide)",
                brand_names: &["Gelusil", "Mucaine"],
                dosage: "As needed after meals",
                purpose: "Neutralizes stomach acid",
                availability: Availability::Otc,
            },
            DrugTemplate {
                name: "Omeprazole",
                brand_names: &["Omez", "Prilosec"],
                dosage: "20-40 mg daily",
                purpose: "Reduces stomach acid",
                availability: Availability::Common,
            },
        ],
    },
    Heuristic {
        name: "febrile",
        triggers: &["fever", "dengue", "malaria", "typhoid", "typhus"],
        herbal: &[("Withaferin A", 0.7), ("Papaya Leaf Extract", 0.6), ("Turmeric", 0.5)],
        pharmaceuticals: &[PARACETAMOL, ORS],
    },
    Heuristic {
        name: "respiratory",
        triggers: &["cold", "cough", "bronch", "asthma", "flu", "influenza", "respirat", "pneumon", "sinus"],
        herbal: &[("Tulsi", 0.8), ("Ginger", 0.7), ("Licorice", 0.6)],
        pharmaceuticals: &[
            DrugTemplate {
                name: "Cough Syrup (Guaifenesin)",
                brand_names: &["Mucinex", "Robitussin"],
                dosage: "5-10 ml every 4-6 hours",
                purpose: "Expectorant, clears mucus",
                availability: Availability::Otc,
            },
            DrugTemplate {
                name: "Cetirizine",
                brand_names: &["Allerdin", "Histacet"],
                dosage: "10 mg once daily",
                purpose: "Antihistamine for runny nose",
                availability: Availability::Otc,
            },
            PARACETAMOL,
        ],
    },
    Heuristic {
        name: "headache",
        triggers: &["headache", "migraine"],
        herbal: &[("Peppermint", 0.7), ("Feverfew", 0.6), ("Turmeric", 0.5)],
        pharmaceuticals: &[PARACETAMOL, IBUPROFEN],
    },
    Heuristic {
        name: "musculoskeletal",
        triggers: &["muscle", "strain", "back pain", "sprain", "joint", "arthritis", "sciatica", "gout", "pain"],
        herbal: &[("Turmeric", 0.8), ("Ginger", 0.75), ("Arnica", 0.7), ("Boswellia", 0.65)],
        pharmaceuticals: &[
            IBUPROFEN,
            DrugTemplate {
                name: "Diclofenac Gel",
                brand_names: &["Voveran Emulgel", "Voltaren"],
                dosage: "Apply locally 3-4 times daily",
                purpose: "Topical anti-inflammatory",
                availability: Availability::Otc,
            },
            DrugTemplate {
                name: "Naproxen",
                brand_names: &["Naprosyn", "Aleve"],
                dosage: "250-500 mg twice daily",
                purpose: "Long-acting anti-inflammatory",
                availability: Availability::Common,
            },
        ],
    },
    Heuristic {
        name: "renal",
        triggers: &["kidney", "stone", "renal", "urinary", "cystitis", "bladder"],
        herbal: &[("Chanca Piedra", 0.8), ("Dandelion", 0.7), ("Cranberry", 0.65), ("Hydrangea", 0.6)],
        pharmaceuticals: &[
            PARACETAMOL,
            DrugTemplate {
                name: "Potassium Citrate",
                brand_names: &["Urocit-K", "Alkasol"],
                dosage: "10 ml in water, three times daily",
                purpose: "Alkalinizes urine, eases burning",
                availability: Availability::Common,
            },
            DrugTemplate {
                name: "Nitrofurantoin",
                brand_names: &["Macrobid", "Niftran"],
                dosage: "100 mg twice daily for 5 days",
                purpose: "Antibiotic for urinary infection",
                availability: Availability::Prescription,
            },
        ],
    },
];

const FALLBACK_HERBAL: &[(&str, f64)] = &[("Turmeric", 0.6), ("Ginger", 0.55), ("Neem", 0.45)];
const FALLBACK_PHARMACEUTICALS: &[DrugTemplate] = &[PARACETAMOL, ORS];

/// How specific the returned recommendations are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// Curated store entry for the resolved condition
    Curated,
    /// Keyword heuristic over the condition name
    Heuristic,
    /// Generic symptomatic relief
    Fallback,
}

/// Recommendations for one decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    /// Store key the entries came from, when the condition resolved
    pub condition_key: Option<String>,
    pub herbal: Vec<HerbalEntry>,
    /// Routine entries, most available first
    pub pharmaceuticals: Vec<PharmaEntry>,
    /// Entries to be given only under emergency care
    pub emergency_only: Vec<PharmaEntry>,
    pub source: RecommendationSource,
    /// Name of the heuristic used, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heuristic: Option<String>,
}

/// Curated entries keyed by canonical condition key. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct RecommendationStore {
    herbal: HashMap<String, Vec<HerbalEntry>>,
    pharmaceuticals: HashMap<String, Vec<PharmaEntry>>,
    /// lowercase key -> key as stored
    keys: HashMap<String, String>,
}

impl RecommendationStore {
    pub fn new(
        herbal: BTreeMap<String, Vec<HerbalEntry>>,
        pharmaceuticals: BTreeMap<String, Vec<PharmaEntry>>,
    ) -> Self {
        let keys = herbal
            .keys()
            .chain(pharmaceuticals.keys())
            .map(|k| (k.to_lowercase(), k.clone()))
            .collect();
        Self {
            herbal: herbal.into_iter().collect(),
            pharmaceuticals: pharmaceuticals.into_iter().collect(),
            keys,
        }
    }

    /// Store key matching `name` case-insensitively
    pub fn canonical_key(&self, name: &str) -> Option<&str> {
        self.keys.get(&name.trim().to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.canonical_key(name).is_some()
    }

    pub fn herbal(&self, key: &str) -> &[HerbalEntry] {
        self.herbal.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pharmaceuticals(&self, key: &str) -> &[PharmaEntry] {
        self.pharmaceuticals.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct condition keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Produces recommendations for a resolved (or unresolved) condition.
    ///
    /// Each list is filled independently: curated entries first, then the
    /// first matching heuristic over `condition`, then the generic set. The
    /// reported source is the least specific tier that was needed.
    pub fn recommend(&self, resolution: &Resolution, condition: &str) -> RecommendationSet {
        let condition_key = resolution.key().ok().map(str::to_string);

        let mut herbal: Vec<HerbalEntry> = condition_key
            .as_deref()
            .map(|key| self.herbal(key).to_vec())
            .unwrap_or_default();
        let curated_pharma: Vec<PharmaEntry> = condition_key
            .as_deref()
            .map(|key| self.pharmaceuticals(key).to_vec())
            .unwrap_or_default();
        let (mut emergency_only, mut pharmaceuticals): (Vec<PharmaEntry>, Vec<PharmaEntry>) = curated_pharma
            .into_iter()
            .partition(|entry| entry.availability == Availability::EmergencyOnly);

        let mut source = RecommendationSource::Curated;
        let mut heuristic_name = None;

        if herbal.is_empty() || pharmaceuticals.is_empty() {
            let lowered = condition.to_lowercase();
            let heuristic = HEURISTICS
                .iter()
                .find(|h| h.triggers.iter().any(|t| lowered.contains(t)));

            let (herbs, drugs) = match heuristic {
                Some(h) => {
                    source = RecommendationSource::Heuristic;
                    heuristic_name = Some(h.name.to_string());
                    (h.herbal, h.pharmaceuticals)
                }
                None => {
                    source = RecommendationSource::Fallback;
                    (FALLBACK_HERBAL, FALLBACK_PHARMACEUTICALS)
                }
            };

            if herbal.is_empty() {
                herbal = herbs.iter().map(|(name, rel)| HerbalEntry::new(name, *rel)).collect();
            }
            if pharmaceuticals.is_empty() {
                pharmaceuticals = drugs.iter().map(DrugTemplate::to_entry).collect();
            }
        }

        herbal.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        pharmaceuticals.sort_by_key(|entry| entry.availability);
        emergency_only.sort_by(|a, b| a.name.cmp(&b.name));

        RecommendationSet {
            condition_key,
            herbal,
            pharmaceuticals,
            emergency_only,
            source,
            heuristic: heuristic_name,
        }
    }
}
