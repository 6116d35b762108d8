//! Service support library: session wiring, tracing/logging bootstrap, and
//! notification sinks for Docshelf.

pub mod bootstrap;
mod logging;
pub mod notify;
pub mod session;

pub use bootstrap::bootstrap;
pub use logging::init_tracing;
pub use notify::{MemoryNotifier, Notification, TracingNotifier};
pub use session::Session;
