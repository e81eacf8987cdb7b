mod backup;
mod ddl;
pub(crate) mod hook;
mod ops;
mod pragma;
mod tx;

use std::cell::RefCell;
use std::fmt;

use super::ffi::RawDb;

pub use hook::{ChangeEvent, ChangeHook, ChangeKind};

/// An open database handle.
///
/// Owned by exactly one [`SqlQueue`](crate::SqlQueue) worker and only ever
/// touched from that worker's thread; units of work receive it by shared
/// reference. Dropping it clears any change hook and then closes the handle.
pub struct Connection {
    db: RawDb,
    // Boxed so the address handed to the engine stays put across swaps
    update_hook: RefCell<Option<Box<hook::UpdateHook>>>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.db.set_update_hook(None);
        self.update_hook.get_mut().take();
        tracing::debug!("closing database connection");
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("has_update_hook", &self.update_hook.borrow().is_some())
            .finish_non_exhaustive()
    }
}
