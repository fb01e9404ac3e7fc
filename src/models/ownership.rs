//! Ownership of metadata entities

use crate::urn::Urn;
use serde::{Deserialize, Serialize};

/// DataHub ownership type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnershipType {
    #[default]
    TechnicalOwner,
    BusinessOwner,
    DataSteward,
    None,
    /// Custom ownership type, e.g. `urn:li:ownershipType:__system__data_custodian`
    Custom(Urn),
}

/// One owner of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// User or group URN
    pub owner: Urn,
    #[serde(default)]
    pub ownership_type: OwnershipType,
}

impl Owner {
    pub fn new(owner: Urn, ownership_type: OwnershipType) -> Self {
        Self {
            owner,
            ownership_type,
        }
    }
}

/// Owners of an entity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ownership {
    #[serde(default)]
    pub owners: Vec<Owner>,
}

impl Ownership {
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Owner URNs in sorted order, for comparisons
    pub fn sorted_owner_urns(&self) -> Vec<String> {
        let mut urns: Vec<String> = self
            .owners
            .iter()
            .map(|o| o.owner.as_str().to_string())
            .collect();
        urns.sort();
        urns.dedup();
        urns
    }
}
