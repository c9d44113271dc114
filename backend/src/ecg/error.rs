use std::error::Error;

pub const PREPROCESS_FAILED_MESSAGE: &str = "Image preprocessing failed or invalid image format";
pub const CLASSIFICATION_FAULT_MESSAGE: &str = "Prediction process encountered an error";

#[derive(Debug, thiserror::Error)]
pub enum EcgError {
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("{}", PREPROCESS_FAILED_MESSAGE)]
    PreprocessFailure,
    #[error("Dimension re-read failed: {0}")]
    ClassificationFault(#[source] image::ImageError),
}

impl EcgError {
    /// Message that may cross the service boundary. Internal causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            EcgError::Decode(e) => format!("Failed to analyze ECG image: {}", e),
            EcgError::PreprocessFailure => PREPROCESS_FAILED_MESSAGE.to_string(),
            EcgError::ClassificationFault(_) => CLASSIFICATION_FAULT_MESSAGE.to_string(),
        }
    }

    /// Full cause chain, outermost first, joined for a single log line.
    pub fn chain(&self) -> String {
        let mut parts = vec![self.to_string()];
        let mut source = self.source();
        while let Some(cause) = source {
            parts.push(cause.to_string());
            source = cause.source();
        }
        parts.join(": caused by: ")
    }
}
