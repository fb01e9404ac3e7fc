//! Models module for the SDK
//!
//! Defines the local representation of DataHub metadata entities. Every entity
//! embeds an [`EntityMeta`] carrying its URN, connection association and sync
//! bookkeeping; the entity-specific fields mirror DataHub's aspects.

pub mod assertion;
pub mod connection;
pub mod contract;
pub mod domain;
pub mod entity;
pub mod glossary;
pub mod ownership;
pub mod product;
pub mod property;
pub mod sync_status;
pub mod tag;

pub use assertion::{Assertion, AssertionType};
pub use connection::{Connection, ConnectionId};
pub use contract::{ContractState, DataContract};
pub use domain::Domain;
pub use entity::{ConnectionScoped, Entity, EntityMeta, Link};
pub use glossary::{GlossaryNode, GlossaryTerm, TermSource};
pub use ownership::{Owner, Ownership, OwnershipType};
pub use product::DataProduct;
pub use property::{AllowedValue, Cardinality, PropertyValue, StructuredProperty, ValueType};
pub use sync_status::SyncStatus;
pub use tag::Tag;
