//! DataHub connections
//!
//! A connection is one configured DataHub instance. Local rows may be
//! associated with a connection so a single catalog can manage several
//! environments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a configured DataHub instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A configured DataHub instance
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub name: String,
    /// GMS base URL
    pub url: String,
    /// Personal access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_token() {
        let conn = Connection {
            id: ConnectionId::new("prod"),
            name: "Production".to_string(),
            url: "https://datahub.example.com/gms".to_string(),
            token: Some("secret-token".to_string()),
        };
        let debug = format!("{:?}", conn);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("***"));
    }
}
