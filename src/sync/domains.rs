//! Parent reference resolution for hierarchical entities
//!
//! Domains and glossary nodes/terms store their parent as a free-form
//! reference. It is resolved in three tiers: a sibling row whose
//! `datahub_id` equals the reference, then the reference taken as an exact
//! URN, then by name. In the name tier a matching row that already carries
//! a URN (pulled from DataHub) resolves to that stored URN; only a
//! purely local row, or a name with no row at all, gets the deterministic
//! URN derived from the name.

use crate::models::{Domain, Entity};
use crate::urn::{Urn, deterministic_urn};

/// Resolve a parent reference against candidate rows of the parent type
pub fn resolve_parent_urn<E: Entity>(
    reference: &str,
    candidates: &[E],
    environment: &str,
    mutation: Option<&str>,
) -> Urn {
    let reference = reference.trim();

    if let Some(parent) = candidates
        .iter()
        .find(|c| c.meta().effective_datahub_id() == Some(reference))
    {
        return parent.resolved_urn(environment, mutation);
    }

    if let Ok(urn) = Urn::parse(reference) {
        return urn;
    }

    match candidates.iter().find(|c| c.name().trim() == reference) {
        Some(parent) => parent.resolved_urn(environment, mutation),
        None => deterministic_urn(E::ENTITY_TYPE, reference, environment, mutation),
    }
}

/// Parent URN of a domain, if it has a parent
pub fn resolve_domain_parent(
    domain: &Domain,
    domains: &[Domain],
    environment: &str,
    mutation: Option<&str>,
) -> Option<Urn> {
    domain
        .parent
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(|reference| resolve_parent_urn(reference, domains, environment, mutation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urn::EntityType;

    fn pulled(name: &str, id: &str) -> Domain {
        let mut d = Domain::new(name);
        d.meta.urn = Some(Urn::new(EntityType::Domain, id));
        d.meta.datahub_id = Some(id.to_string());
        d
    }

    #[test]
    fn test_resolves_by_datahub_id() {
        let domains = vec![pulled("Finance", "abc123")];
        let urn = resolve_parent_urn("abc123", &domains, "PROD", None);
        assert_eq!(urn.as_str(), "urn:li:domain:abc123");
    }

    #[test]
    fn test_resolves_exact_urn() {
        let urn = resolve_parent_urn("urn:li:domain:elsewhere", &Vec::<Domain>::new(), "PROD", None);
        assert_eq!(urn.as_str(), "urn:li:domain:elsewhere");
    }

    #[test]
    fn test_name_match_prefers_stored_urn() {
        let domains = vec![pulled("Finance", "abc123")];
        let urn = resolve_parent_urn("Finance", &domains, "PROD", None);
        assert_eq!(urn.as_str(), "urn:li:domain:abc123");
        assert_ne!(
            urn,
            deterministic_urn(EntityType::Domain, "Finance", "PROD", None)
        );
    }

    #[test]
    fn test_falls_back_to_deterministic() {
        let local_parent = Domain::new("Finance");
        let domains = vec![local_parent];
        let urn = resolve_parent_urn("Finance", &domains, "PROD", None);
        assert_eq!(
            urn,
            deterministic_urn(EntityType::Domain, "Finance", "PROD", None)
        );

        let missing = resolve_parent_urn("Marketing", &domains, "PROD", Some("eu"));
        assert_eq!(
            missing,
            deterministic_urn(EntityType::Domain, "Marketing", "PROD", Some("eu"))
        );
    }

    #[test]
    fn test_domain_without_parent() {
        let domain = Domain::new("Root").with_parent("  ");
        assert!(resolve_domain_parent(&domain, &[], "PROD", None).is_none());
    }
}
