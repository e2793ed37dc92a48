#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod grading;
pub mod history_service;
pub mod preferences_service;
pub mod questions;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use config::ExamConfig;
pub use error::{AppServicesError, ConfigError, SessionError, SourceError, SubmitError};
pub use grading::{Grader, RemoteGrade, RemoteGrader};
pub use history_service::HistoryService;
pub use preferences_service::PreferencesService;
pub use questions::{QuestionDataProvider, ResolvedExam};
pub use sessions::{
    ExamSessionService, LiveSession, Navigation, ResultReport, SessionController, SessionEffect,
};
