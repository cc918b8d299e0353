use serde::Deserialize;

/// Connector configuration, parsed from TOML.
///
/// Declares the composite types the type cache knows about:
///
/// ```toml
/// [[types]]
/// name = "point3"
/// oid = 16385
/// fields = [
///     { name = "x", type = "float8" },
///     { name = "y", type = "float8" },
///     { name = "label", type = "text" },
/// ]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectorConfig {
    /// Composite types, in dependency order: a field may only name
    /// builtin types and types declared before it.
    #[serde(default)]
    pub types: Vec<CompositeTypeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompositeTypeConfig {
    pub name: String,
    pub oid: u32,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub dropped: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Invalid(String),

    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConnectorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }
}
