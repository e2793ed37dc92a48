use exam_core::model::{DurationPolicy, ExamError, ExamMetadata, Question, QuestionId, SubjectId};

/// Subject name shown while the bundled questions are in use.
pub const DEMO_SUBJECT_NAME: &str = "General Knowledge (Demo)";

struct DemoQuestion {
    id: u64,
    text: &'static str,
    options: [&'static str; 4],
    correct: &'static str,
    explanation: &'static str,
}

const DEMO_QUESTIONS: [DemoQuestion; 3] = [
    DemoQuestion {
        id: 1,
        text: "What is the capital of France?",
        options: ["London", "Berlin", "Paris", "Madrid"],
        correct: "Paris",
        explanation: "Paris is the capital and most populous city of France.",
    },
    DemoQuestion {
        id: 2,
        text: "Which programming language is primarily used for web development?",
        options: ["Python", "JavaScript", "Java", "C++"],
        correct: "JavaScript",
        explanation: "JavaScript is the primary language for client-side web development.",
    },
    DemoQuestion {
        id: 3,
        text: "What does HTML stand for?",
        options: [
            "Hyper Text Markup Language",
            "High Tech Modern Language",
            "Hyper Transfer Markup Language",
            "Home Tool Markup Language",
        ],
        correct: "Hyper Text Markup Language",
        explanation: "HTML is the standard markup language for creating web pages.",
    },
];

/// The bundled offline question set.
#[must_use]
pub fn demo_questions() -> Vec<Question> {
    DEMO_QUESTIONS
        .iter()
        .filter_map(|demo| {
            Question::new(
                QuestionId::new(demo.id),
                demo.text,
                demo.options.iter().map(|option| (*option).to_string()).collect(),
                demo.correct,
                Some(demo.explanation.to_string()),
            )
            .inspect_err(|err| tracing::error!(id = demo.id, error = %err, "invalid demo question"))
            .ok()
        })
        .collect()
}

/// The demo exam, keyed by the subject the user asked for so its progress is
/// saved under the same session key.
///
/// # Errors
///
/// Returns `ExamError` only if the bundled dataset is itself invalid.
pub fn demo_exam(subject_id: SubjectId, policy: DurationPolicy) -> Result<ExamMetadata, ExamError> {
    ExamMetadata::new(subject_id, DEMO_SUBJECT_NAME, demo_questions(), policy, None)
}
