//! Knock snapshot DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::KnockEntity;
use crate::service::KnockPublication;

/// Request body for `PUT /knocks`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PutKnocksRequest {
    /// Complete current knock set.
    #[schema(value_type = Vec<Object>)]
    pub knocks: Vec<KnockEntity>,
}

/// Response body for `PUT /knocks`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PutKnocksResponse {
    /// `full`, `differential` or `unchanged`.
    pub mode: String,
    /// Knocks added since the previous snapshot.
    pub added: usize,
    /// Knocks whose comparable fields changed.
    pub updated: usize,
    /// Knocks no longer present.
    pub removed: usize,
    /// Size of the new snapshot.
    pub total: usize,
}

impl PutKnocksResponse {
    /// Describes what was published for a snapshot of `total` knocks.
    #[must_use]
    pub fn new(publication: &KnockPublication, total: usize) -> Self {
        let (mode, added, updated, removed) = match publication {
            KnockPublication::Full(n) => ("full", *n, 0, 0),
            KnockPublication::Differential(delta) => (
                "differential",
                delta.added.len(),
                delta.updated.len(),
                delta.removed.len(),
            ),
            KnockPublication::Unchanged => ("unchanged", 0, 0, 0),
        };
        Self {
            mode: mode.to_string(),
            added,
            updated,
            removed,
            total,
        }
    }
}
