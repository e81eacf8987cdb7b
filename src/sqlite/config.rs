use std::time::Duration;

use crate::error::SqlResult;

use super::worker::SqlQueue;

/// Thread name given to a queue's worker unless overridden.
pub const DEFAULT_WORKER_NAME: &str = "sqlkit-worker";

/// Options for opening a [`SqlQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueOptions {
    pub db_path: String,
    pub worker_name: String,
    pub busy_timeout: Option<Duration>,
}

impl QueueOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            worker_name: DEFAULT_WORKER_NAME.to_owned(),
            busy_timeout: None,
        }
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }
}

/// Fluent builder for [`QueueOptions`].
#[derive(Debug, Clone)]
pub struct QueueOptionsBuilder {
    opts: QueueOptions,
}

impl QueueOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: QueueOptions::new(db_path),
        }
    }

    /// Name of the dedicated worker thread.
    #[must_use]
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.opts.worker_name = name.into();
        self
    }

    /// How long lock contention from other connections is waited out before
    /// the engine reports busy.
    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn finish(self) -> QueueOptions {
        self.opts
    }

    /// Open a [`SqlQueue`] with these options.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Open`](crate::SqlError::Open) if the worker cannot
    /// be started or the database cannot be opened.
    pub fn open(self) -> SqlResult<SqlQueue> {
        SqlQueue::with_options(self.finish())
    }
}

impl SqlQueue {
    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> QueueOptionsBuilder {
        QueueOptionsBuilder::new(db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let defaults = QueueOptions::new(":memory:");
        assert_eq!(defaults.worker_name, DEFAULT_WORKER_NAME);
        assert_eq!(defaults.busy_timeout, None);

        let opts = SqlQueue::builder("db.sqlite")
            .worker_name("orders-db")
            .busy_timeout(Duration::from_millis(250))
            .finish();
        assert_eq!(opts.db_path, "db.sqlite");
        assert_eq!(opts.worker_name, "orders-db");
        assert_eq!(
            opts,
            QueueOptions {
                worker_name: "orders-db".into(),
                ..QueueOptions::new("db.sqlite").with_busy_timeout(Duration::from_millis(250))
            }
        );
    }
}
