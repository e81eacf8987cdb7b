use serde::{Deserialize, Serialize};

/// Decision returned by a transaction's unit of work.
///
/// The engine never picks one on its own; the only implicit rollback happens
/// when the unit of work fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxOutcome {
    /// Issue `COMMIT` and keep every write made inside the transaction.
    Commit,
    /// Issue `ROLLBACK` and discard every write made inside the transaction.
    Rollback,
}

impl TxOutcome {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            TxOutcome::Commit => "COMMIT",
            TxOutcome::Rollback => "ROLLBACK",
        }
    }

    #[must_use]
    pub fn is_commit(self) -> bool {
        matches!(self, TxOutcome::Commit)
    }
}
