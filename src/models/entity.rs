//! Shared entity bookkeeping

use super::{ConnectionId, Ownership, SyncStatus};
use crate::urn::{EntityType, Urn, deterministic_urn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Documentation link attached to an entity (DataHub institutional memory)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// Fields every local entity row carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Local row identifier
    pub id: Uuid,
    /// DataHub URN, absent while the row only exists locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<Urn>,
    /// Id segment of the remote URN, used to group rows across connections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datahub_id: Option<String>,
    /// DataHub instance this row is associated with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionId>,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<Ownership>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Denormalized relationship payload as last seen remotely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships_data: Option<serde_json::Value>,
    /// Raw remote payload as last seen remotely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityMeta {
    /// Bookkeeping for a row created by a local user action
    pub fn local() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            urn: None,
            datahub_id: None,
            connection: None,
            sync_status: SyncStatus::LocalOnly,
            ownership: None,
            links: Vec::new(),
            relationships_data: None,
            raw_data: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bookkeeping for a row pulled from a DataHub instance
    pub fn pulled(urn: Urn, connection: Option<ConnectionId>) -> Self {
        let mut meta = Self::local();
        meta.datahub_id = Some(urn.id().to_string());
        meta.urn = Some(urn);
        meta.connection = connection;
        meta.sync_status = SyncStatus::Synced;
        meta
    }

    /// The explicit datahub_id, falling back to the URN's id segment
    pub fn effective_datahub_id(&self) -> Option<&str> {
        self.datahub_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| self.urn.as_ref().map(Urn::id))
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A locally managed DataHub entity
pub trait Entity {
    const ENTITY_TYPE: EntityType;

    fn meta(&self) -> &EntityMeta;

    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Human readable name
    fn name(&self) -> &str;

    /// Key hashed into the deterministic URN
    fn identity_key(&self) -> String {
        self.name().trim().to_string()
    }

    /// The stored URN, or the deterministic one for the given environment
    fn resolved_urn(&self, environment: &str, mutation: Option<&str>) -> Urn {
        self.meta().urn.clone().unwrap_or_else(|| {
            deterministic_urn(Self::ENTITY_TYPE, &self.identity_key(), environment, mutation)
        })
    }
}

/// Rows that can be grouped by datahub_id and ranked by connection
pub trait ConnectionScoped {
    fn datahub_id(&self) -> Option<&str>;

    fn connection(&self) -> Option<&ConnectionId>;
}

impl<E: Entity> ConnectionScoped for E {
    fn datahub_id(&self) -> Option<&str> {
        self.meta().effective_datahub_id()
    }

    fn connection(&self) -> Option<&ConnectionId> {
        self.meta().connection.as_ref()
    }
}

macro_rules! impl_entity {
    ($ty:ty, $entity_type:expr) => {
        impl $crate::models::Entity for $ty {
            const ENTITY_TYPE: $crate::urn::EntityType = $entity_type;

            fn meta(&self) -> &$crate::models::EntityMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::models::EntityMeta {
                &mut self.meta
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

pub(crate) use impl_entity;
