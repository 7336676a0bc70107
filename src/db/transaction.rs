use rusqlite::{Connection, Transaction, TransactionBehavior};

use super::DatabaseError;

/// Run `steps` inside one `BEGIN IMMEDIATE` transaction.
///
/// A step error rolls back and is returned unchanged; a failed rollback is
/// logged but never replaces that error. A failed commit surfaces as
/// `TransactionAborted` wrapping its cause.
pub fn run_in_transaction<T, F>(conn: &mut Connection, operation: &str, steps: F) -> Result<T, DatabaseError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, DatabaseError>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match steps(&tx) {
        Ok(value) => {
            tx.commit().map_err(|e| {
                tracing::error!(operation, error = %e, "Commit failed");
                DatabaseError::TransactionAborted(Box::new(e.into()))
            })?;
            tracing::debug!(operation, "Transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!(operation, error = %rollback_err, cause = %err, "Rollback failed");
            } else {
                tracing::debug!(operation, cause = %err, "Transaction rolled back");
            }
            Err(err)
        }
    }
}
