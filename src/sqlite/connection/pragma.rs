use crate::error::SqlResult;
use crate::sqlite::statement::StepResult;

use super::Connection;

impl Connection {
    /// Schema version stored in the `user_version` pragma (a 32-bit slot in
    /// the database header).
    ///
    /// Re-queried on every call. A failed query is logged and reported as `None`.
    #[must_use]
    pub fn schema_version(&self) -> Option<i32> {
        let read = || -> SqlResult<Option<i32>> {
            let mut stmt = self.prepare("PRAGMA user_version;")?;
            match stmt.step()? {
                StepResult::Row(row) => Ok(row.value::<i32>(0)),
                StepResult::Done => Ok(None),
            }
        };
        match read() {
            Ok(version) => version,
            Err(err) => {
                tracing::error!(error = %err, "failed to fetch database schema version");
                None
            }
        }
    }

    /// Writes `version` into the `user_version` pragma.
    ///
    /// # Errors
    /// Propagates the classified error from preparing or stepping the pragma.
    pub fn set_schema_version(&self, version: i32) -> SqlResult<()> {
        // Pragmas take no bound parameters; `version` is a typed integer so the
        // rendered text is always a plain numeric literal.
        self.execute(&format!("PRAGMA user_version = {version};"), &[])
    }
}
