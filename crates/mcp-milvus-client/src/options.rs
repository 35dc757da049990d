//! Connection options handed to a [`crate::Connector`]

use serde::{Deserialize, Serialize};

/// Database selected when none is given
pub const DEFAULT_DATABASE: &str = "default";

/// Everything needed to open one authenticated backend connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    pub address: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub db_name: String,
}

impl ClientOptions {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            username: None,
            password: None,
            db_name: DEFAULT_DATABASE.to_string(),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_database(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    /// Bearer token in the `username:password` form the backend expects
    pub fn bearer_token(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(password)) => Some(format!("{}:{}", user, password)),
            (Some(user), None) => Some(format!("{}:", user)),
            _ => None,
        }
    }
}
