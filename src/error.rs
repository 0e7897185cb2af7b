//! Error types for the onboarding wizard.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Form error: {0}")]
    Form(#[from] FormError),
}

/// Errors found while validating the static step/field configuration.
///
/// These indicate a bug in the wizard definition. They surface once, when the
/// controller is constructed, never per keystroke.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Wizard has no steps")]
    NoSteps,

    #[error("Duplicate step key: {0}")]
    DuplicateStepKey(String),

    #[error("Step {step} is gated on completeness but declares no form")]
    GatedWithoutForm { step: String },

    #[error("Form in step {step} has no sections")]
    EmptyForm { step: String },

    #[error("Duplicate field key {field} in step {step}")]
    DuplicateFieldKey { step: String, field: String },

    #[error("Choice field {field} in step {step} has an empty option set")]
    EmptyOptionSet { step: String, field: String },

    #[error("Default option {option} for field {field} is not in its option set")]
    UnknownDefaultOption { field: String, option: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runtime form-input errors.
///
/// These can only be produced by a caller that disagrees with the validated
/// configuration (wrong key, foreign option, wrong value shape). User-shaped
/// input such as empty text or a malformed number is never an error; it just
/// leaves the field incomplete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Unknown step key: {0}")]
    UnknownStep(String),

    #[error("Step {0} has no form")]
    NoForm(String),

    #[error("Unknown field key: {0}")]
    UnknownField(String),

    #[error("Option {option} is not valid for field {field}")]
    InvalidOption { field: String, option: String },

    #[error("Field {field} does not accept a {given} value")]
    TypeMismatch { field: String, given: &'static str },

    #[error("Section index {index} out of range ({count} sections)")]
    SectionOutOfRange { index: usize, count: usize },
}

/// Result type alias for the wizard.
pub type Result<T> = std::result::Result<T, Error>;
