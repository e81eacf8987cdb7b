use std::ffi::c_int;

use serde::{Deserialize, Serialize};

use crate::sqlite::ffi;

use super::Connection;

/// Kind of row mutation reported by a change hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row-level change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Table the row belongs to, when the engine reports one.
    pub table: Option<String>,
    pub row_id: i64,
}

/// Callback invoked for every row inserted, updated or deleted.
///
/// Runs synchronously on the queue's worker thread from inside the native
/// call that caused the change; it must not submit synchronous work to the
/// same queue.
pub type ChangeHook = Box<dyn Fn(ChangeEvent) + Send>;

/// Heap cell whose address is handed to the engine as the hook context.
pub(crate) struct UpdateHook {
    callback: ChangeHook,
}

impl UpdateHook {
    pub(crate) fn call(&self, op: c_int, table: Option<String>, row_id: i64) {
        let kind = match op {
            ffi::SQLITE_INSERT => ChangeKind::Insert,
            ffi::SQLITE_UPDATE => ChangeKind::Update,
            ffi::SQLITE_DELETE => ChangeKind::Delete,
            _ => return,
        };
        (self.callback)(ChangeEvent {
            kind,
            table,
            row_id,
        });
    }
}

impl Connection {
    /// Installs `hook` as the change hook, replacing any previous one;
    /// `None` removes it.
    ///
    /// The new cell is registered before the old one is released, so the
    /// engine never sees a context that is being torn down.
    pub fn set_change_hook(&self, hook: Option<ChangeHook>) {
        let next = hook.map(|callback| Box::new(UpdateHook { callback }));
        self.db.set_update_hook(next.as_deref());
        let previous = self.update_hook.replace(next);
        drop(previous);
    }
}
