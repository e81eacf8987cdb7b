//! Raw engine handles.
//!
//! This is the only module that calls into `rusqlite::ffi` or holds raw
//! pointers. Everything above it (statement, connection, worker) is safe code
//! working with [`RawDb`], [`RawStmt`] and [`RawBackup`], each of which owns
//! exactly one native handle and releases it exactly once on drop.

#![allow(unsafe_code)]

use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::mem::ManuallyDrop;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};
use std::slice;

use rusqlite::ffi;

use crate::error::{SqlError, SqlResult};
use crate::sqlite::connection::hook::UpdateHook;

pub(crate) use ffi::{
    SQLITE_BLOB, SQLITE_CANTOPEN, SQLITE_DELETE, SQLITE_DONE, SQLITE_FLOAT, SQLITE_INSERT,
    SQLITE_INTEGER, SQLITE_INTERNAL, SQLITE_IOERR, SQLITE_MISUSE, SQLITE_OK, SQLITE_OPEN_CREATE,
    SQLITE_OPEN_READONLY, SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, SQLITE_ROW, SQLITE_TEXT,
    SQLITE_TOOBIG, SQLITE_UPDATE,
};

/// Owned `sqlite3*` database handle. Closed on drop.
pub(crate) struct RawDb {
    ptr: NonNull<ffi::sqlite3>,
}

impl RawDb {
    /// Opens (or creates) the database at `path`.
    ///
    /// A handle the engine hands back alongside a failure status is closed
    /// before the error is returned.
    pub(crate) fn open(path: &str, flags: c_int) -> SqlResult<Self> {
        let c_path = CString::new(path).map_err(|_| {
            SqlError::open(SQLITE_MISUSE, "database path contains an interior NUL byte")
        })?;
        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        // SAFETY: `c_path` is NUL-terminated and `db` is a valid out-pointer.
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &raw mut db, flags, ptr::null()) };

        match NonNull::new(db) {
            Some(ptr) if rc == SQLITE_OK => Ok(Self { ptr }),
            Some(ptr) => {
                // SAFETY: the engine allocated this handle; we are its only owner.
                let message = unsafe { errmsg_of(ptr.as_ptr()) };
                // SAFETY: as above; the handle is not used after this call.
                unsafe { ffi::sqlite3_close(ptr.as_ptr()) };
                Err(SqlError::open(rc, message))
            }
            None => {
                let code = if rc == SQLITE_OK { ffi::SQLITE_NOMEM } else { rc };
                Err(SqlError::open(code, errstr(code)))
            }
        }
    }

    /// Latest diagnostic text recorded on this handle.
    pub(crate) fn errmsg(&self) -> String {
        // SAFETY: `self.ptr` is a live handle for as long as `self` exists.
        unsafe { errmsg_of(self.ptr.as_ptr()) }
    }

    /// Latest status code recorded on this handle.
    pub(crate) fn errcode(&self) -> c_int {
        // SAFETY: live handle.
        unsafe { ffi::sqlite3_errcode(self.ptr.as_ptr()) }
    }

    /// Compiles the first statement in `sql`.
    pub(crate) fn prepare(&self, sql: &str) -> SqlResult<RawStmt<'_>> {
        let len = c_int::try_from(sql.len())
            .map_err(|_| SqlError::prepare(SQLITE_TOOBIG, "statement text is too long"))?;
        let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
        // SAFETY: `sql` is valid for `len` bytes; the engine does not require NUL
        // termination when an explicit length is passed.
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(
                self.ptr.as_ptr(),
                sql.as_ptr().cast::<c_char>(),
                len,
                &raw mut stmt,
                ptr::null_mut(),
            )
        };
        if rc != SQLITE_OK {
            return Err(SqlError::prepare(rc, self.errmsg()));
        }
        // Whitespace or comment-only SQL reports success with no statement.
        NonNull::new(stmt)
            .map(|ptr| RawStmt { ptr, db: self })
            .ok_or_else(|| SqlError::prepare(SQLITE_INTERNAL, "Failed to prepare statement."))
    }

    /// Runs one or more `;`-separated statements, discarding any rows.
    pub(crate) fn exec(&self, sql: &str) -> SqlResult<()> {
        let c_sql = CString::new(sql)
            .map_err(|_| SqlError::execute(SQLITE_MISUSE, "SQL contains an interior NUL byte"))?;
        let mut errmsg: *mut c_char = ptr::null_mut();
        // SAFETY: `c_sql` is NUL-terminated, no callback is installed and
        // `errmsg` is a valid out-pointer.
        let rc = unsafe {
            ffi::sqlite3_exec(
                self.ptr.as_ptr(),
                c_sql.as_ptr(),
                None,
                ptr::null_mut(),
                &raw mut errmsg,
            )
        };
        if rc == SQLITE_OK {
            return Ok(());
        }
        let message = if errmsg.is_null() {
            self.errmsg()
        } else {
            // SAFETY: the engine allocated `errmsg` with sqlite3_malloc; we copy it
            // and release it exactly once.
            unsafe {
                let text = CStr::from_ptr(errmsg).to_string_lossy().into_owned();
                ffi::sqlite3_free(errmsg.cast::<c_void>());
                text
            }
        };
        Err(SqlError::execute(rc, message))
    }

    pub(crate) fn last_insert_rowid(&self) -> i64 {
        // SAFETY: live handle.
        unsafe { ffi::sqlite3_last_insert_rowid(self.ptr.as_ptr()) }
    }

    pub(crate) fn changes(&self) -> c_int {
        // SAFETY: live handle.
        unsafe { ffi::sqlite3_changes(self.ptr.as_ptr()) }
    }

    pub(crate) fn busy_timeout(&self, millis: c_int) -> c_int {
        // SAFETY: live handle.
        unsafe { ffi::sqlite3_busy_timeout(self.ptr.as_ptr(), millis) }
    }

    /// Registers `hook` as the update hook, or clears it with `None`.
    ///
    /// The caller must keep `hook` at a stable address until it has been
    /// replaced or cleared by a later call.
    pub(crate) fn set_update_hook(&self, hook: Option<&UpdateHook>) {
        match hook {
            Some(hook) => {
                let ctx = ptr::from_ref(hook).cast_mut().cast::<c_void>();
                // SAFETY: live handle; `ctx` outlives the registration per the
                // contract above.
                unsafe {
                    ffi::sqlite3_update_hook(self.ptr.as_ptr(), Some(update_hook_trampoline), ctx);
                }
            }
            None => {
                // SAFETY: live handle; clearing never dereferences a context.
                unsafe {
                    ffi::sqlite3_update_hook(self.ptr.as_ptr(), None, ptr::null_mut());
                }
            }
        }
    }
}

impl Drop for RawDb {
    fn drop(&mut self) {
        // SAFETY: every `RawStmt`/`RawBackup` borrows `self`, so none are alive here.
        let rc = unsafe { ffi::sqlite3_close(self.ptr.as_ptr()) };
        if rc != SQLITE_OK {
            tracing::error!(code = rc, message = %errstr(rc), "failed to close database handle");
        }
    }
}

/// Owned `sqlite3_stmt*`. Finalized exactly once, either by
/// [`RawStmt::finalize`] or on drop.
pub(crate) struct RawStmt<'db> {
    ptr: NonNull<ffi::sqlite3_stmt>,
    db: &'db RawDb,
}

impl<'db> RawStmt<'db> {
    /// The connection this statement was prepared on.
    pub(crate) fn db(&self) -> &'db RawDb {
        self.db
    }

    pub(crate) fn parameter_count(&self) -> c_int {
        // SAFETY: live statement.
        unsafe { ffi::sqlite3_bind_parameter_count(self.ptr.as_ptr()) }
    }

    pub(crate) fn bind_i64(&self, idx: c_int, value: i64) -> c_int {
        // SAFETY: live statement; out-of-range indexes are reported, not UB.
        unsafe { ffi::sqlite3_bind_int64(self.ptr.as_ptr(), idx, value) }
    }

    pub(crate) fn bind_f64(&self, idx: c_int, value: f64) -> c_int {
        // SAFETY: live statement.
        unsafe { ffi::sqlite3_bind_double(self.ptr.as_ptr(), idx, value) }
    }

    /// Binds text with an explicit byte length; the engine copies it before
    /// returning (`SQLITE_TRANSIENT`).
    pub(crate) fn bind_text(&self, idx: c_int, value: &str) -> c_int {
        let Ok(len) = c_int::try_from(value.len()) else {
            return SQLITE_TOOBIG;
        };
        // SAFETY: `value` is valid for `len` bytes for the duration of the call
        // and SQLITE_TRANSIENT makes the engine take its own copy.
        unsafe {
            ffi::sqlite3_bind_text(
                self.ptr.as_ptr(),
                idx,
                value.as_ptr().cast::<c_char>(),
                len,
                ffi::SQLITE_TRANSIENT(),
            )
        }
    }

    /// Binds a blob with its exact byte length; copied like [`Self::bind_text`].
    pub(crate) fn bind_blob(&self, idx: c_int, value: &[u8]) -> c_int {
        if value.is_empty() {
            // SAFETY: live statement.
            return unsafe { ffi::sqlite3_bind_zeroblob(self.ptr.as_ptr(), idx, 0) };
        }
        let Ok(len) = c_int::try_from(value.len()) else {
            return SQLITE_TOOBIG;
        };
        // SAFETY: `value` is valid for `len` bytes and is copied by the engine.
        unsafe {
            ffi::sqlite3_bind_blob(
                self.ptr.as_ptr(),
                idx,
                value.as_ptr().cast::<c_void>(),
                len,
                ffi::SQLITE_TRANSIENT(),
            )
        }
    }

    pub(crate) fn bind_null(&self, idx: c_int) -> c_int {
        // SAFETY: live statement.
        unsafe { ffi::sqlite3_bind_null(self.ptr.as_ptr(), idx) }
    }

    pub(crate) fn step(&self) -> c_int {
        // SAFETY: live statement.
        unsafe { ffi::sqlite3_step(self.ptr.as_ptr()) }
    }

    pub(crate) fn reset(&self) -> c_int {
        // SAFETY: live statement.
        unsafe { ffi::sqlite3_reset(self.ptr.as_ptr()) }
    }

    pub(crate) fn column_count(&self) -> c_int {
        // SAFETY: live statement.
        unsafe { ffi::sqlite3_column_count(self.ptr.as_ptr()) }
    }

    /// Dynamic storage class of column `idx` in the current row.
    pub(crate) fn column_type(&self, idx: c_int) -> c_int {
        // SAFETY: live statement positioned on a row.
        unsafe { ffi::sqlite3_column_type(self.ptr.as_ptr(), idx) }
    }

    pub(crate) fn column_i64(&self, idx: c_int) -> i64 {
        // SAFETY: live statement positioned on a row.
        unsafe { ffi::sqlite3_column_int64(self.ptr.as_ptr(), idx) }
    }

    pub(crate) fn column_f64(&self, idx: c_int) -> f64 {
        // SAFETY: live statement positioned on a row.
        unsafe { ffi::sqlite3_column_double(self.ptr.as_ptr(), idx) }
    }

    /// Copies the text of column `idx`; `None` when the engine returns no data.
    pub(crate) fn column_text(&self, idx: c_int) -> Option<String> {
        // SAFETY: the pointer returned by column_text stays valid until the next
        // step/reset/finalize, and column_bytes must be read after it.
        unsafe {
            let text = ffi::sqlite3_column_text(self.ptr.as_ptr(), idx);
            if text.is_null() {
                return None;
            }
            let len = usize::try_from(ffi::sqlite3_column_bytes(self.ptr.as_ptr(), idx)).ok()?;
            let bytes = slice::from_raw_parts(text, len);
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    /// Copies the bytes of column `idx`; `None` when the engine returns no data.
    pub(crate) fn column_blob(&self, idx: c_int) -> Option<Vec<u8>> {
        // SAFETY: as for `column_text`.
        unsafe {
            let blob = ffi::sqlite3_column_blob(self.ptr.as_ptr(), idx);
            if blob.is_null() {
                return None;
            }
            let len = usize::try_from(ffi::sqlite3_column_bytes(self.ptr.as_ptr(), idx)).ok()?;
            if len == 0 {
                return None;
            }
            Some(slice::from_raw_parts(blob.cast::<u8>(), len).to_vec())
        }
    }

    pub(crate) fn column_name(&self, idx: c_int) -> Option<String> {
        // SAFETY: the returned name is owned by the statement and copied here.
        unsafe { opt_string(ffi::sqlite3_column_name(self.ptr.as_ptr(), idx)) }
    }

    /// Finalizes now and returns the engine's status.
    pub(crate) fn finalize(self) -> c_int {
        let this = ManuallyDrop::new(self);
        // SAFETY: `ManuallyDrop` suppresses the second finalize in `Drop`.
        unsafe { ffi::sqlite3_finalize(this.ptr.as_ptr()) }
    }
}

impl Drop for RawStmt<'_> {
    fn drop(&mut self) {
        // SAFETY: live statement, finalized only here.
        let rc = unsafe { ffi::sqlite3_finalize(self.ptr.as_ptr()) };
        if rc != SQLITE_OK {
            tracing::error!(
                code = rc,
                message = %self.db.errmsg(),
                "failed to finalize statement"
            );
        }
    }
}

/// Owned `sqlite3_backup*` copying every page of `source` into `dest`.
pub(crate) struct RawBackup<'a> {
    ptr: NonNull<ffi::sqlite3_backup>,
    dest: &'a RawDb,
}

impl<'a> RawBackup<'a> {
    pub(crate) fn new(dest: &'a RawDb, source: &RawDb) -> SqlResult<Self> {
        let main = c"main";
        // SAFETY: both handles are live and the schema names are NUL-terminated.
        let raw = unsafe {
            ffi::sqlite3_backup_init(
                dest.ptr.as_ptr(),
                main.as_ptr(),
                source.ptr.as_ptr(),
                main.as_ptr(),
            )
        };
        NonNull::new(raw)
            .map(|ptr| Self { ptr, dest })
            .ok_or_else(|| SqlError::execute(dest.errcode(), dest.errmsg()))
    }

    /// Copies up to `pages` pages; `-1` copies everything that remains.
    pub(crate) fn step(&self, pages: c_int) -> c_int {
        // SAFETY: live backup object.
        unsafe { ffi::sqlite3_backup_step(self.ptr.as_ptr(), pages) }
    }

    /// Releases the backup object; the outcome is recorded on `dest`.
    pub(crate) fn finish(self) -> c_int {
        let this = ManuallyDrop::new(self);
        // SAFETY: `ManuallyDrop` suppresses the second finish in `Drop`.
        unsafe { ffi::sqlite3_backup_finish(this.ptr.as_ptr()) }
    }
}

impl Drop for RawBackup<'_> {
    fn drop(&mut self) {
        // SAFETY: live backup object, finished only here.
        let rc = unsafe { ffi::sqlite3_backup_finish(self.ptr.as_ptr()) };
        if rc != SQLITE_OK {
            tracing::error!(code = rc, message = %self.dest.errmsg(), "failed to finish backup");
        }
    }
}

/// Engine-side entry point for the update hook.
///
/// `ctx` is the address of the [`UpdateHook`] registered through
/// [`RawDb::set_update_hook`].
unsafe extern "C" fn update_hook_trampoline(
    ctx: *mut c_void,
    op: c_int,
    _db_name: *const c_char,
    table: *const c_char,
    row_id: ffi::sqlite3_int64,
) {
    if ctx.is_null() {
        return;
    }
    // SAFETY: the owning connection keeps the hook alive while registered.
    let hook = unsafe { &*ctx.cast::<UpdateHook>() };
    // SAFETY: `table` is NULL or a NUL-terminated name valid for this call.
    let table = unsafe { opt_string(table) };

    if panic::catch_unwind(AssertUnwindSafe(|| hook.call(op, table, row_id))).is_err() {
        tracing::error!("change hook panicked inside a native callback; aborting");
        std::process::abort();
    }
}

/// # Safety
/// `db` must be a live handle (or NULL, which the engine reports as out of memory).
unsafe fn errmsg_of(db: *mut ffi::sqlite3) -> String {
    // SAFETY: forwarded contract.
    unsafe { opt_string(ffi::sqlite3_errmsg(db)) }.unwrap_or_else(|| "Unknown error.".to_owned())
}

/// Generic English description of a status code.
pub(crate) fn errstr(code: c_int) -> String {
    // SAFETY: sqlite3_errstr returns a static string for any code.
    unsafe { opt_string(ffi::sqlite3_errstr(code)) }.unwrap_or_else(|| "Unknown error.".to_owned())
}

/// # Safety
/// `text` must be NULL or point to a NUL-terminated string.
unsafe fn opt_string(text: *const c_char) -> Option<String> {
    if text.is_null() {
        None
    } else {
        // SAFETY: forwarded contract.
        Some(unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned())
    }
}
