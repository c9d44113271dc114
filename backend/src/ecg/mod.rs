//! Image intake, validation and heuristic classification of ECG uploads.
//!
//! The pipeline is stateless: the catalog is read-only and randomness is
//! supplied per call, so concurrent analyses never share seed state.

pub mod catalog;
pub mod classifier;
pub mod decoder;
pub mod error;
pub mod preprocess;
pub mod shape;

use rand::Rng;
use shared::ClassificationResult;

pub use decoder::EcgImage;
pub use error::EcgError;

/// Runs gate, shape detection and classification over one image buffer.
/// Always yields exactly one of a diagnosis or an error object.
pub fn analyze<R: Rng + ?Sized>(bytes: &[u8], rng: &mut R) -> ClassificationResult {
    match run(bytes, rng) {
        Ok(result) => result,
        Err(e) => {
            log::error!("ECG analysis failed: {}", e.chain());
            ClassificationResult::failure(e.public_message())
        }
    }
}

fn run<R: Rng + ?Sized>(bytes: &[u8], rng: &mut R) -> Result<ClassificationResult, EcgError> {
    if !preprocess::preprocess(bytes) {
        return Err(EcgError::PreprocessFailure);
    }
    let shape = shape::detect(bytes);
    let diagnosis = classifier::classify(bytes, shape, rng)?;
    log::info!(
        "Classified upload as {} ({}%, {} risk)",
        diagnosis.prediction,
        diagnosis.confidence,
        diagnosis.risk
    );
    Ok(ClassificationResult::Success(diagnosis))
}
