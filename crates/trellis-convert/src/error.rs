use thiserror::Error;

/// A converter was selected but could not handle the concrete value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("cannot convert `{value}` to {target}: {reason}")]
    InvalidValue {
        value: String,
        target: String,
        reason: String,
    },
    #[error("`{converter}` cannot convert a {found} value to {target}")]
    TypeMismatch {
        converter: String,
        found: String,
        target: String,
    },
    #[error("`{value}` is not a constant of enum {class}")]
    UnknownEnumConstant { class: String, value: String },
    #[error("cannot determine the element type of {0}")]
    MissingElementType(String),
    #[error("no collection implementation is known for {0}")]
    UnsupportedCollection(String),
}

/// A converter was registered in a way that can never be dispatched to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("converter `{0}` declares no convertible types and is not conditional")]
    NotConditional(String),
    #[error("cannot determine the source and target types of converter `{0}`")]
    UnresolvableGenerics(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid conversion config: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.message().to_string())
    }
}
