// Session Store: per-user interaction state held in process memory.
// The state machine transitions live on `Session`; the router drives them.

pub mod model;
pub mod store;

pub use model::{Mode, Role, Session, SessionKey, SessionSummary, Turn};
pub use store::{spawn_sweeper, SessionLimits, SessionStore};
