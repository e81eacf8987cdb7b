use crate::error::SqlResult;
use crate::tx_outcome::TxOutcome;

use super::Connection;

impl Connection {
    /// Runs `work` inside `BEGIN EXCLUSIVE` and finishes with the outcome it returns.
    ///
    /// When `work` fails, or `COMMIT` itself fails (a deferred constraint, a
    /// busy database), a `ROLLBACK` is attempted and the original error is
    /// returned unchanged; a failure of that rollback is logged and dropped.
    /// The connection is never left inside an open transaction. Transactions
    /// do not nest.
    ///
    /// # Errors
    /// Returns the error from `BEGIN`, from `work`, or from the final
    /// `COMMIT`/`ROLLBACK`.
    pub fn transaction<F>(&self, work: F) -> SqlResult<TxOutcome>
    where
        F: FnOnce(&Connection) -> SqlResult<TxOutcome>,
    {
        self.execute("BEGIN EXCLUSIVE", &[])?;

        let outcome = match work(self) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.rollback_after_failure("transaction work");
                return Err(err);
            }
        };

        if let Err(err) = self.execute(outcome.sql(), &[]) {
            if outcome.is_commit() {
                self.rollback_after_failure("commit");
            }
            return Err(err);
        }
        Ok(outcome)
    }

    fn rollback_after_failure(&self, stage: &'static str) {
        if let Err(rollback_err) = self.execute("ROLLBACK", &[]) {
            tracing::warn!(
                error = %rollback_err,
                stage,
                "rollback after failed transaction also failed"
            );
        }
    }
}
