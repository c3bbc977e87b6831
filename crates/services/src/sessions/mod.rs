mod controller;
mod countdown;
mod progress;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{Navigation, QuizSession, SessionState, TickStatus};
pub use countdown::CountdownTick;
pub use progress::{AttemptProgress, CatalogSummary};
