use crate::models::Dataset;

pub struct ReconcileResult {
    pub changed: bool,
    pub result: Dataset,
}

/// Decide whether an edited snapshot should replace the canonical dataset.
///
/// The snapshot is a complete candidate table, not a delta. Equality is
/// structural: same row count, same values, same order. No validation
/// happens here; the editing surface has already done it.
pub fn reconcile(canonical: &Dataset, edited: Dataset) -> ReconcileResult {
    if *canonical == edited {
        ReconcileResult {
            changed: false,
            result: canonical.clone(),
        }
    } else {
        ReconcileResult {
            changed: true,
            result: edited,
        }
    }
}
