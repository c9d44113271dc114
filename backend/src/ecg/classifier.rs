use rand::Rng;
use shared::{Diagnosis, ReportShapeInfo, RiskLevel};

use super::catalog;
use super::decoder;
use super::error::EcgError;
use super::shape::REPORT_ASPECT_RATIO;

pub const FAST_PATH_MIN_WIDTH: u32 = 1500;
pub const FAST_PATH_MIN_HEIGHT: u32 = 1000;
pub const FAST_PATH_CONFIDENCE: u8 = 95;

const FAST_PATH_DETAILS: [&str; 5] = [
    "Normal P waves preceding each QRS complex",
    "Regular RR intervals (75–85 bpm)",
    "Normal QRS duration (0.08–0.10 sec)",
    "No significant ST segment abnormalities",
    "Normal T wave morphology",
];

/// Large, clearly landscape uploads skip the random draw entirely.
pub fn is_fast_path(width: u32, height: u32) -> bool {
    width > FAST_PATH_MIN_WIDTH
        && height > FAST_PATH_MIN_HEIGHT
        && f64::from(width) / f64::from(height) > REPORT_ASPECT_RATIO
}

pub fn classify<R: Rng + ?Sized>(
    bytes: &[u8],
    shape: ReportShapeInfo,
    rng: &mut R,
) -> Result<Diagnosis, EcgError> {
    let (width, height) = decoder::dimensions(bytes).map_err(EcgError::ClassificationFault)?;

    if is_fast_path(width, height) {
        log::debug!("Fast path for {}x{} upload", width, height);
        return Ok(Diagnosis {
            prediction: "Normal Sinus Rhythm".to_string(),
            confidence: FAST_PATH_CONFIDENCE,
            risk: RiskLevel::Low,
            details: FAST_PATH_DETAILS.iter().map(|d| d.to_string()).collect(),
            ecg_type: shape,
        });
    }

    let drawn = catalog::draw(rng);
    let selected = &drawn[rng.random_range(0..drawn.len())];

    Ok(Diagnosis {
        prediction: selected.entry.name.to_string(),
        confidence: selected.confidence,
        risk: selected.entry.risk,
        details: selected.entry.details.iter().map(|d| d.to_string()).collect(),
        ecg_type: shape,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecg::catalog::CATALOG;
    use crate::ecg::shape::detect;
    use crate::ecg::test_support::png;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn fast_path_thresholds_are_strict() {
        assert!(is_fast_path(1920, 1080));
        assert!(!is_fast_path(1600, 1000));
        assert!(!is_fast_path(1500, 900));
        assert!(!is_fast_path(1800, 1200));
        assert!(is_fast_path(1800, 1001));
    }

    #[test]
    fn fast_path_is_deterministic() {
        let bytes = png(1920, 1080);
        let shape = detect(&bytes);
        for seed in 0..5 {
            let diagnosis = classify(&bytes, shape.clone(), &mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(diagnosis.prediction, "Normal Sinus Rhythm");
            assert_eq!(diagnosis.confidence, 95);
            assert_eq!(diagnosis.risk, RiskLevel::Low);
            assert_eq!(diagnosis.details.len(), 5);
            assert_eq!(diagnosis.ecg_type, ReportShapeInfo::measured(true, 1920, 1080));
        }
    }

    #[test]
    fn catalog_path_respects_entry_bounds() {
        let bytes = png(400, 400);
        let shape = detect(&bytes);
        let mut rng = StdRng::seed_from_u64(1234);
        let mut seen = HashSet::new();

        for _ in 0..200 {
            let diagnosis = classify(&bytes, shape.clone(), &mut rng).unwrap();
            let entry = CATALOG
                .iter()
                .find(|entry| entry.name == diagnosis.prediction)
                .expect("prediction comes from the catalog");
            assert!(entry.confidence.contains(&diagnosis.confidence));
            assert_eq!(diagnosis.risk, entry.risk);
            assert_eq!(diagnosis.details.len(), 4);
            assert!(!diagnosis.ecg_type.is_ecg_report);
            seen.insert(diagnosis.prediction);
        }

        assert!(seen.len() > 1, "selection should vary across calls");
    }

    #[test]
    fn wide_but_short_image_uses_catalog() {
        let bytes = png(1600, 1000);
        let shape = detect(&bytes);
        assert!(shape.is_ecg_report);

        let mut rng = StdRng::seed_from_u64(3);
        let results: Vec<Diagnosis> = (0..50)
            .map(|_| classify(&bytes, shape.clone(), &mut rng).unwrap())
            .collect();
        assert!(results.iter().all(|d| d.details.len() == 4));
    }

    #[test]
    fn seeded_generator_reproduces_selection() {
        let bytes = png(400, 400);
        let shape = detect(&bytes);
        let a = classify(&bytes, shape.clone(), &mut StdRng::seed_from_u64(99)).unwrap();
        let b = classify(&bytes, shape, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unreadable_dimensions_are_a_classification_fault() {
        let result = classify(&[0u8; 10], ReportShapeInfo::default(), &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(EcgError::ClassificationFault(_))));
    }
}
