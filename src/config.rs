use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::TagSqlError;

/// Connection settings handed to a [`crate::driver::Connector`].
///
/// Drivers read what they need: a network driver uses all four fields,
/// while the sqlite adapter treats `dbname` as the database path and
/// ignores the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub dbname: String,
}

/// One settable configuration field; usable straight from a CLI flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ConfigField {
    Host,
    Username,
    Password,
    Dbname,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    database: DbConfig,
}

impl DbConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            dbname: dbname.into(),
        }
    }

    /// Overwrite a single field, chainable.
    ///
    /// Changing config on a live session affects the next establishment,
    /// not the connection already open.
    pub fn set(&mut self, field: ConfigField, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match field {
            ConfigField::Host => self.host = value,
            ConfigField::Username => self.username = value,
            ConfigField::Password => self.password = value,
            ConfigField::Dbname => self.dbname = value,
        }
        self
    }

    /// Load settings from a TOML file with a `[database]` table.
    ///
    /// # Errors
    ///
    /// Returns [`TagSqlError::Config`] when the file cannot be read or does
    /// not parse.
    pub fn from_toml_file(path: &Path) -> Result<Self, TagSqlError> {
        let text = fs::read_to_string(path)
            .map_err(|e| TagSqlError::Config(format!("cannot read {}: {e}", path.display())))?;
        let parsed: ConfigFile = toml::from_str(&text)
            .map_err(|e| TagSqlError::Config(format!("cannot parse {}: {e}", path.display())))?;
        Ok(parsed.database)
    }
}
