use crate::store::StoreState;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// CascadeReport
///
/// Aggregate outcome of a fan-out deletion: how many records were removed and
/// how many deletions failed. `succeeded + failed` always equals the fan-out
/// width; every outstanding delete is counted exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CascadeReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl CascadeReport {
    pub fn fully_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// delete_all
///
/// Issues one delete per id, all concurrently, and waits for every one of them
/// before reporting. `join_all` gives the join discipline the aggregation
/// needs: it resolves exactly once, after every future has completed, no
/// matter in which order the deletions race to finish. No shared counter to
/// misincrement, no early return.
///
/// Failures are best-effort by design: an individual failure is recorded in
/// the report but never aborts the remaining deletions.
pub async fn delete_all(store: &StoreState, collection: &str, ids: &[String]) -> CascadeReport {
    // Empty fan-out succeeds trivially.
    if ids.is_empty() {
        return CascadeReport::default();
    }

    let deletions = ids.iter().map(|id| {
        let store = store.clone();
        let id = id.clone();
        let collection = collection.to_string();
        async move { store.delete(&collection, &id).await }
    });

    let results = join_all(deletions).await;

    let mut report = CascadeReport::default();
    for result in results {
        match result {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                tracing::warn!("cascade delete failed in {}: {}", collection, e);
                report.failed += 1;
            }
        }
    }
    report
}
