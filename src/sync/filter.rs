//! Connection-based row selection
//!
//! The same DataHub entity can be stored once per connection. List views show
//! a single representative per `datahub_id`, chosen in priority order:
//! the row of the current connection, then a row bound to any other
//! connection, then a row with no connection at all.

use crate::models::{ConnectionId, ConnectionScoped, Domain};
use std::collections::HashMap;

/// Rank of a row relative to the current connection (lower wins)
fn connection_rank<R: ConnectionScoped>(row: &R, current: Option<&ConnectionId>) -> u8 {
    match (row.connection(), current) {
        (Some(conn), Some(current)) if conn == current => 0,
        (Some(_), _) => 1,
        (None, _) => 2,
    }
}

/// Indices of the rows [`filter_by_connection`] selects
pub fn filter_indices_by_connection<R: ConnectionScoped>(
    rows: &[R],
    current: Option<&ConnectionId>,
) -> Vec<usize> {
    // (rank, row index) per group, plus group order
    let mut best: Vec<(u8, usize)> = Vec::new();
    let mut groups: HashMap<&str, usize> = HashMap::new();

    for (idx, row) in rows.iter().enumerate() {
        let rank = connection_rank(row, current);
        match row.datahub_id().filter(|id| !id.trim().is_empty()) {
            Some(id) => match groups.get(id) {
                Some(&group) => {
                    if rank < best[group].0 {
                        best[group] = (rank, idx);
                    }
                }
                None => {
                    groups.insert(id, best.len());
                    best.push((rank, idx));
                }
            },
            None => best.push((rank, idx)),
        }
    }

    best.into_iter().map(|(_, idx)| idx).collect()
}

/// Select one row per `datahub_id`.
///
/// Rows without a `datahub_id` are never merged with anything. Within the
/// same rank the earliest row wins, and the output keeps the order in which
/// each group first appeared.
pub fn filter_by_connection<'a, R: ConnectionScoped>(
    rows: &'a [R],
    current: Option<&ConnectionId>,
) -> Vec<&'a R> {
    filter_indices_by_connection(rows, current)
        .into_iter()
        .map(|idx| &rows[idx])
        .collect()
}

/// Domain flavour of [`filter_by_connection`]
pub fn filter_domains_by_connection<'a>(
    domains: &'a [Domain],
    current: Option<&ConnectionId>,
) -> Vec<&'a Domain> {
    filter_by_connection(domains, current)
}
