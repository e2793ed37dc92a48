mod progress;
mod report;
mod service;
mod ticker;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::{QuestionStatus, ReviewItem, SessionProgress, StatusKind};
pub use report::{ResultReport, format_clock};
pub use service::{
    Navigation, QUESTIONS_PER_PAGE, SessionController, SessionEffect, SnapshotRejection,
};
pub use ticker::TickerGuard;
pub use workflow::{ExamSessionService, LiveSession, SessionPersistence};
