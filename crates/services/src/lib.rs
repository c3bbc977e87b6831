#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use api::{HttpQuizApi, QuizCatalog, QuizGrader};
pub use config::{ApiConfig, ClientConfig, SessionConfig, UserContext};
pub use error::{ConfigError, QuizApiError, SessionError};

pub use sessions::{
    AttemptProgress, CatalogSummary, CountdownTick, Navigation, QuizSession, SessionState,
    TickStatus,
};
