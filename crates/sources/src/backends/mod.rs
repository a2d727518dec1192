//! Collaborators served from the in-memory [`store_data::StoreIndex`].
//!
//! These let the engine run end to end against a local dataset; production
//! deployments swap in remote implementations of the same traits.

pub mod affinity;
pub mod nearby;
pub mod neighbors;
pub mod popular;

pub use affinity::AffinityOracle;
pub use nearby::NearbyStores;
pub use neighbors::NeighborStores;
pub use popular::PopularStores;

use crate::collaborators::CollaboratorError;

/// Run an index scan on the blocking pool so it never stalls the runtime
/// (and the strategy timeouts driven by it).
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, CollaboratorError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(work))
        .await
        .map_err(|e| CollaboratorError::Unavailable(format!("index scan failed: {e}")))
}
