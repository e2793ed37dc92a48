//! Question resolution: remote sources tried in order, demo dataset last.

mod demo;
mod http;
mod payload;
mod provider;
mod source;

pub use demo::{DEMO_SUBJECT_NAME, demo_exam, demo_questions};
pub use http::{HttpApi, HttpQuestionSource, HttpSourceKind, HttpSubjectDirectory};
pub use payload::{find_subject_name, parse_exam, sanitize_html};
pub use provider::{QuestionDataProvider, ResolvedExam};
pub use source::{QuestionSource, SourcedExam, SubjectDirectory, SubjectQuery};
