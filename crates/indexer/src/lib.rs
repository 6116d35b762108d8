//! Indexation queue primitives: the in-flight state registry, the queue
//! controller state machine, and the ports it drives. The service crate
//! wires sessions together; this crate keeps the protocol logic testable
//! and self-contained.

pub mod ports;
pub mod queue;
pub mod registry;

pub use ports::{BackendError, IndexerBackend, Notifier};
pub use queue::{IndexOutcome, IndexationQueue};
pub use registry::{IndexingRegistry, IndexingState};
