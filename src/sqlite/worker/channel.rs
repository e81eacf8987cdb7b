use crate::sqlite::connection::Connection;

/// A unit of work, already wrapped so that it reports its own outcome.
pub(super) type Job = Box<dyn FnOnce(&Connection) + Send>;

pub(super) enum Command {
    Run(Job),
    Shutdown,
}
