use thiserror::Error;

use crate::driver::Locator;
use crate::session::Phase;

/// Failures raised by a [`crate::driver::BrowserDriver`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    #[error("no element matches {0}")]
    NoSuchElement(Locator),

    #[error("element is not interactable")]
    NotInteractable,

    #[error("click was intercepted by another element")]
    ClickIntercepted,

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("driver error: {0}")]
    Other(String),
}

impl DriverError {
    /// Errors that clear up by themselves once the page settles.
    pub fn is_transient(&self) -> bool {
        matches!(self, DriverError::NotInteractable | DriverError::ClickIntercepted)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutomationError {
    #[error("expected page structure is missing: {0}")]
    StructureMissing(String),

    #[error("no answer known for prompt: {0}")]
    UnknownPrompt(String),

    #[error("activity url is neither a vocabulary nor a verb activity: {0}")]
    UnrecognizedActivity(String),

    #[error("gave up waiting for {stage} after {attempts} attempts")]
    FinalizeExhausted { stage: &'static str, attempts: u32 },

    #[error(transparent)]
    Driver(DriverError),
}

impl From<DriverError> for AutomationError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::NoSuchElement(locator) => {
                AutomationError::StructureMissing(locator.to_string())
            }
            other => AutomationError::Driver(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} value {value:?} is not acceptable")]
    InvalidNumber { field: &'static str, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("{0} is already in flight")]
    Busy(Phase),

    #[error("worker thread panicked")]
    WorkerPanicked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_element_maps_to_structure_missing() {
        let err: AutomationError = DriverError::NoSuchElement(Locator::id("answer-input")).into();
        assert_eq!(
            err,
            AutomationError::StructureMissing("#answer-input".to_string())
        );
    }

    #[test]
    fn only_interaction_errors_are_transient() {
        assert!(DriverError::NotInteractable.is_transient());
        assert!(DriverError::ClickIntercepted.is_transient());
        assert!(!DriverError::NoSuchElement(Locator::id("x")).is_transient());
        assert!(!DriverError::Other("boom".into()).is_transient());
    }
}
