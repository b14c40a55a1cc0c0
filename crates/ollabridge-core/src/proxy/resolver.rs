//! Model alias resolution against a lazily cached upstream catalog.
//!
//! The catalog is an immutable snapshot behind an `Arc`, replaced wholesale
//! on every refresh. Readers clone the `Arc` under a brief read lock and
//! match without holding any lock, so concurrent requests observe either
//! the old or the new catalog in full, never a torn one.

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::proxy::upstream::client::UpstreamClient;

pub struct ModelCatalog {
    upstream: Arc<UpstreamClient>,
    entries: RwLock<Arc<Vec<String>>>,
}

impl ModelCatalog {
    pub fn new(upstream: Arc<UpstreamClient>) -> Self {
        Self { upstream, entries: RwLock::new(Arc::new(Vec::new())) }
    }

    /// Current catalog snapshot. Cheap: one `Arc` clone.
    pub fn snapshot(&self) -> Arc<Vec<String>> {
        self.entries.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Fetch the catalog from the upstream and replace the snapshot.
    ///
    /// A fetch failure leaves any existing snapshot intact; the resolver is
    /// stale-tolerant and only `/api/tags` surfaces refresh errors directly.
    pub async fn refresh(&self) -> AppResult<Arc<Vec<String>>> {
        let ids = self.upstream.list_models().await?;
        debug!(count = ids.len(), "model catalog refreshed");
        let snapshot = Arc::new(ids);
        *self.entries.write().unwrap_or_else(std::sync::PoisonError::into_inner) =
            snapshot.clone();
        Ok(snapshot)
    }

    /// Resolve a client-supplied alias to a fully qualified upstream id.
    ///
    /// Resolution is total once a non-empty catalog exists: an alias with
    /// no exact or suffix match passes through unchanged, which lets
    /// clients use upstream-native identifiers without a prior catalog
    /// hit. Only an empty catalog that cannot be fetched is an error.
    pub async fn resolve(&self, alias: &str) -> AppResult<String> {
        let mut snapshot = self.snapshot();

        if snapshot.is_empty() {
            match self.refresh().await {
                Ok(fresh) => snapshot = fresh,
                Err(e) => {
                    // Re-wrap on the bare detail so the client-visible
                    // message carries a single "Upstream error:" prefix.
                    let detail = match e {
                        AppError::Upstream(detail) => detail,
                        other => other.to_string(),
                    };
                    return Err(AppError::Upstream(format!("failed to get models: {}", detail)));
                },
            }
        }

        match match_alias(&snapshot, alias) {
            Some(full_name) => Ok(full_name),
            None => {
                warn!(alias, "alias not in catalog, passing through unchanged");
                Ok(alias.to_string())
            },
        }
    }
}

/// Match an alias against catalog entries: exact match first, then the
/// first entry (in catalog order) whose id ends with the alias.
fn match_alias(catalog: &[String], alias: &str) -> Option<String> {
    if let Some(exact) = catalog.iter().find(|id| id.as_str() == alias) {
        return Some(exact.clone());
    }
    catalog.iter().find(|id| id.ends_with(alias)).cloned()
}
