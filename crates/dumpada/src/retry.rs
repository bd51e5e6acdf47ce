//! Bounded retry for writes rejected by a storage-level UNIQUE guard.

use tracing::warn;

use crate::error::ServiceError;

/// Runs `op` until it succeeds, fails with anything other than a unique
/// violation, or `max_attempts` is exhausted.
///
/// Each attempt is expected to be a whole transaction, so a rejected attempt
/// leaves nothing behind and re-reads fresh state on the next try.
pub(crate) fn retry_on_conflict<T, F>(
    operation: &'static str,
    max_attempts: u32,
    mut op: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Result<T, ServiceError>,
{
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match op() {
            Err(e) if e.is_unique_violation() => {
                warn!(
                    operation,
                    attempt, max_attempts, "Write rejected by unique constraint, retrying"
                );
            }
            other => return other,
        }
    }
    Err(ServiceError::ConcurrencyConflict {
        attempts: max_attempts,
    })
}
