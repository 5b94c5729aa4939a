/// Domain-level errors raised by the posture-analysis engine.
///
/// `NoDetection` never reaches an HTTP caller for single frames: the frame
/// analyzer folds it into an "Analysis Error" verdict. The remaining variants
/// are fatal for the request that produced them.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No pose detected")]
    NoDetection,

    #[error("Unsupported analysis mode: '{0}'. Valid modes: squat, sitting")]
    UnsupportedMode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
