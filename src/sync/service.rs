//! Per-entity-type sync runs

use super::SyncError;
use super::domains::{resolve_domain_parent, resolve_parent_urn};
use super::filter::filter_indices_by_connection;
use super::reconcile::{LocalView, SyncRecord, SyncReport, reconcile};
use super::remote::{
    RemoteAssertion, RemoteDomain, RemoteGlossaryNode, RemoteGlossaryTerm, RemoteRecord,
    RemoteStructuredProperty, RemoteTag,
};
use super::source::{MetadataSource, fetch_all};
use crate::models::{
    Assertion, ConnectionId, Domain, Entity, GlossaryNode, GlossaryTerm, StructuredProperty, Tag,
};
use crate::urn::Urn;
use tracing::info;

/// Default number of entities requested per search page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Reconciles local rows of one connection against a remote source
///
/// Each `sync_*` call narrows the local rows to one per `datahub_id` for the
/// configured connection, fetches every remote entity of that type and
/// classifies both sides. Indices in the returned report refer to the slice
/// that was passed in.
pub struct SyncService<S> {
    source: S,
    connection: Option<ConnectionId>,
    environment: String,
    mutation: Option<String>,
    page_size: usize,
}

impl<S: MetadataSource> SyncService<S> {
    pub fn new(source: S, environment: impl Into<String>) -> Self {
        Self {
            source,
            connection: None,
            environment: environment.into(),
            mutation: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_connection(mut self, connection: Option<ConnectionId>) -> Self {
        self.connection = connection;
        self
    }

    pub fn with_mutation(mut self, mutation: Option<String>) -> Self {
        self.mutation = mutation.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn connection(&self) -> Option<&ConnectionId> {
        self.connection.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn views<'a, E: Entity>(
        &self,
        rows: &'a [E],
        parent: impl Fn(&E) -> Option<Urn>,
    ) -> Vec<LocalView<'a, E>> {
        filter_indices_by_connection(rows, self.connection.as_ref())
            .into_iter()
            .map(|idx| LocalView::new(idx, &rows[idx]).with_parent(parent(&rows[idx])))
            .collect()
    }

    async fn run<'a, E, R>(&self, views: Vec<LocalView<'a, E>>) -> Result<SyncReport<R>, SyncError>
    where
        E: Entity,
        LocalView<'a, E>: SyncRecord,
        R: RemoteRecord,
    {
        let remotes: Vec<R> = fetch_all(&self.source, self.page_size).await?;
        let report = reconcile(&views, remotes);
        let summary = report.summary();
        info!(
            "{} sync: {} synced, {} modified, {} local only, {} remote only",
            R::ENTITY_TYPE,
            summary.synced,
            summary.modified,
            summary.local_only,
            summary.remote_only
        );
        Ok(report)
    }

    pub async fn sync_tags(&self, tags: &[Tag]) -> Result<SyncReport<RemoteTag>, SyncError> {
        self.run(self.views(tags, |_| None)).await
    }

    pub async fn sync_domains(
        &self,
        domains: &[Domain],
    ) -> Result<SyncReport<RemoteDomain>, SyncError> {
        let views = self.views(domains, |d| {
            resolve_domain_parent(d, domains, &self.environment, self.mutation.as_deref())
        });
        self.run(views).await
    }

    pub async fn sync_glossary_nodes(
        &self,
        nodes: &[GlossaryNode],
    ) -> Result<SyncReport<RemoteGlossaryNode>, SyncError> {
        let views = self.views(nodes, |n| self.glossary_parent(n.parent.as_deref(), nodes));
        self.run(views).await
    }

    /// Term parents are resolved against `nodes`
    pub async fn sync_glossary_terms(
        &self,
        terms: &[GlossaryTerm],
        nodes: &[GlossaryNode],
    ) -> Result<SyncReport<RemoteGlossaryTerm>, SyncError> {
        let views = self.views(terms, |t| self.glossary_parent(t.parent.as_deref(), nodes));
        self.run(views).await
    }

    pub async fn sync_structured_properties(
        &self,
        properties: &[StructuredProperty],
    ) -> Result<SyncReport<RemoteStructuredProperty>, SyncError> {
        self.run(self.views(properties, |_| None)).await
    }

    pub async fn sync_assertions(
        &self,
        assertions: &[Assertion],
    ) -> Result<SyncReport<RemoteAssertion>, SyncError> {
        self.run(self.views(assertions, |_| None)).await
    }

    fn glossary_parent(&self, reference: Option<&str>, nodes: &[GlossaryNode]) -> Option<Urn> {
        reference.filter(|p| !p.trim().is_empty()).map(|p| {
            resolve_parent_urn(p, nodes, &self.environment, self.mutation.as_deref())
        })
    }
}

/// Local rows for every remote-only entity of a report
pub fn pull_remote_only<R: RemoteRecord>(
    report: &SyncReport<R>,
    connection: Option<&ConnectionId>,
) -> Vec<R::Local> {
    report
        .remote_only
        .iter()
        .map(|remote| remote.local_row(connection))
        .collect()
}
