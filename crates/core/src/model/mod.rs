mod answers;
mod exam;
mod ids;
mod preferences;
mod question;
mod result;
mod session;
mod snapshot;

pub use ids::{ParseIdError, QuestionId, SubjectId};

pub use answers::AnswerStore;
pub use exam::{DurationPolicy, ExamError, ExamMetadata, SECONDS_PER_QUESTION};
pub use preferences::{ExamPreferences, ExamPreferencesDraft};
pub use question::{Question, QuestionError};
pub use result::{ExamResult, ScoreBand};
pub use session::{SessionMode, SessionState};
pub use snapshot::PersistedSnapshot;
