use rand::Rng;
use shared::RiskLevel;
use std::ops::RangeInclusive;

pub struct ConditionEntry {
    pub name: &'static str,
    pub confidence: RangeInclusive<u8>,
    pub risk: RiskLevel,
    pub details: [&'static str; 4],
}

/// A catalog entry paired with the confidence drawn for this invocation.
pub struct DrawnCondition {
    pub entry: &'static ConditionEntry,
    pub confidence: u8,
}

pub static CATALOG: [ConditionEntry; 5] = [
    ConditionEntry {
        name: "Normal Sinus Rhythm",
        confidence: 88..=96,
        risk: RiskLevel::Low,
        details: [
            "Normal P waves preceding each QRS complex",
            "Regular RR intervals",
            "Normal QRS duration (0.08–0.10 sec)",
            "No significant ST segment abnormalities",
        ],
    },
    ConditionEntry {
        name: "Atrial Fibrillation",
        confidence: 83..=92,
        risk: RiskLevel::Medium,
        details: [
            "Irregular RR intervals",
            "Absence of distinct P waves",
            "Presence of fibrillatory waves",
            "Moderate risk of stroke",
        ],
    },
    ConditionEntry {
        name: "Myocardial Infarction",
        confidence: 75..=88,
        risk: RiskLevel::High,
        details: [
            "ST elevation in multiple leads",
            "Pathological Q waves",
            "T wave inversions",
            "Reciprocal ST depression",
        ],
    },
    ConditionEntry {
        name: "Left Bundle Branch Block",
        confidence: 82..=94,
        risk: RiskLevel::Medium,
        details: [
            "Wide QRS (>0.12 sec)",
            "Absence of Q waves in I, V5, V6",
            "Notched/slurred R waves",
            "ST-T changes in opposite direction",
        ],
    },
    ConditionEntry {
        name: "Ventricular Tachycardia",
        confidence: 79..=90,
        risk: RiskLevel::High,
        details: [
            "Wide QRS complexes",
            "Heart rate >100 bpm",
            "AV dissociation",
            "Medical emergency – call for help",
        ],
    },
];

/// Draws a fresh confidence for every entry, in catalog order.
pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Vec<DrawnCondition> {
    CATALOG
        .iter()
        .map(|entry| DrawnCondition {
            entry,
            confidence: rng.random_range(entry.confidence.clone()),
        })
        .collect()
}
