use std::fs;
use std::io;
use std::path::Path;

use crate::error::{SqlError, SqlResult};
use crate::sqlite::ffi::{self, RawBackup, RawDb};
use crate::types::Value;

use super::Connection;
use super::ops::OPEN_FLAGS;

/// Copy every remaining page in one pass.
const ALL_PAGES: i32 = -1;

impl Connection {
    /// Writes a copy of this database to `path`.
    ///
    /// With `vacuum`, any existing file at `path` is removed first and the
    /// copy is produced by `VACUUM INTO`: slower, but compacted. Without it,
    /// `path` is opened as a second handle (creating it if needed) and every
    /// page is copied over whatever it held before.
    ///
    /// # Errors
    /// Returns [`SqlError::Open`] if the destination cannot be opened, or
    /// [`SqlError::Execute`] (also for filesystem failures) if the copy fails.
    pub fn store_backup(&self, path: impl AsRef<Path>, vacuum: bool) -> SqlResult<()> {
        let path = path.as_ref();
        if vacuum {
            self.vacuum_into(path)?;
        } else {
            // Closed on drop, on every path out of this block.
            let dest = RawDb::open(&path.to_string_lossy(), OPEN_FLAGS)?;
            copy_all_pages(&dest, self.raw())?;
        }
        tracing::debug!(path = %path.display(), vacuum, "stored database backup");
        Ok(())
    }

    /// Replaces the contents of this database with the database at `path`.
    ///
    /// # Errors
    /// Returns [`SqlError::Open`] if `path` cannot be opened, or
    /// [`SqlError::Execute`] if the page copy fails.
    pub fn restore_backup(&self, path: impl AsRef<Path>) -> SqlResult<()> {
        let path = path.as_ref();
        let source = RawDb::open(
            &path.to_string_lossy(),
            ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_URI,
        )?;
        copy_all_pages(self.raw(), &source)?;
        tracing::debug!(path = %path.display(), "restored database backup");
        Ok(())
    }

    fn vacuum_into(&self, path: &Path) -> SqlResult<()> {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(SqlError::execute(
                    ffi::SQLITE_IOERR,
                    format!("failed to remove existing file at {}: {err}", path.display()),
                ));
            }
        }
        let target = Value::Text(path.to_string_lossy().into_owned());
        self.execute("VACUUM INTO ?", &[target])
    }
}

fn copy_all_pages(dest: &RawDb, source: &RawDb) -> SqlResult<()> {
    let backup = RawBackup::new(dest, source)?;
    let step_rc = backup.step(ALL_PAGES);
    let finish_rc = backup.finish();

    let code = dest.errcode();
    if code != ffi::SQLITE_OK {
        return Err(SqlError::execute(code, dest.errmsg()));
    }
    if step_rc != ffi::SQLITE_DONE {
        // Busy/locked steps leave the copy incomplete without recording an error.
        let rc = if finish_rc == ffi::SQLITE_OK { step_rc } else { finish_rc };
        return Err(SqlError::execute(rc, ffi::errstr(rc)));
    }
    Ok(())
}
