// SQLite access layer
//
// - ffi: raw engine handles; the only module with `unsafe`
// - statement: prepared statements and row decoding
// - connection: one open database handle and everything run against it
// - config: queue options and builder
// - worker: the serial execution queue that owns a connection

pub(crate) mod ffi;

pub mod config;
pub mod connection;
pub mod statement;
pub mod worker;

pub use config::{QueueOptions, QueueOptionsBuilder};
pub use connection::{ChangeEvent, ChangeHook, ChangeKind, Connection};
pub use statement::{Statement, StepResult};
pub use worker::SqlQueue;
