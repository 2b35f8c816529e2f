use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Settings for a [`crate::ConversionService`].
///
/// ```toml
/// register_defaults = true
/// no_op_fallback = true
/// element_delimiter = ";"
/// trim_elements = false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionConfig {
    /// Install the built-in string, number, enum, array and collection converters.
    #[serde(default = "default_true")]
    pub register_defaults: bool,
    /// Pass values through unchanged when the target type is assignable from the source and
    /// no converter applies.
    #[serde(default = "default_true")]
    pub no_op_fallback: bool,
    /// Separator used when splitting strings into elements and joining elements back.
    #[serde(default = "default_element_delimiter")]
    pub element_delimiter: String,
    /// Trim whitespace around each element split out of a string.
    #[serde(default = "default_true")]
    pub trim_elements: bool,
}

fn default_true() -> bool {
    true
}

fn default_element_delimiter() -> String {
    ",".to_string()
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            register_defaults: true,
            no_op_fallback: true,
            element_delimiter: default_element_delimiter(),
            trim_elements: true,
        }
    }
}

impl ConversionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ConversionConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.element_delimiter.is_empty() {
            return Err(ConfigError::Invalid(
                "`element_delimiter` must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
