//! Connection configuration supplied by the `milvus_connector` tool

use mcp_milvus_client::{ClientOptions, DEFAULT_DATABASE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while turning a [`ConnConfig`] into client options
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid token format, e.g. username:password")]
    InvalidToken,

    #[error("address cannot be empty")]
    EmptyAddress,
}

/// Address, credentials and database of one backend connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnConfig {
    pub address: String,
    /// Optional `username:password`
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_db_name")]
    pub db_name: String,
}

fn default_db_name() -> String {
    DEFAULT_DATABASE.to_string()
}

impl ConnConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: String::new(),
            db_name: default_db_name(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_database(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    /// Validate and convert into connection options.
    ///
    /// An empty token means no credentials; otherwise it must split on `:`
    /// into exactly a username and a password.
    pub fn to_client_options(&self) -> Result<ClientOptions, ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }

        let db_name = if self.db_name.is_empty() {
            default_db_name()
        } else {
            self.db_name.clone()
        };
        let options = ClientOptions::new(self.address.clone()).with_database(db_name);

        if self.token.is_empty() {
            return Ok(options);
        }

        let parts: Vec<&str> = self.token.split(':').collect();
        match parts.as_slice() {
            [username, password] => Ok(options.with_credentials(*username, *password)),
            _ => Err(ConfigError::InvalidToken),
        }
    }
}
