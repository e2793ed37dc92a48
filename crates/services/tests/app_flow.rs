use exam_core::model::{ExamPreferencesDraft, QuestionId, SessionMode, SubjectId};
use exam_core::time::fixed_clock;
use serde_json::json;
use services::sessions::{Navigation, ResultReport};
use services::{AppServices, ExamConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn services_for(server: &MockServer, remote_submit: bool) -> AppServices {
    let mut config = ExamConfig::new(&format!("{}/api", server.uri())).unwrap();
    config.remote_submit = remote_submit;
    AppServices::in_memory(fixed_clock(), config).unwrap()
}

#[tokio::test]
async fn unreachable_backend_falls_back_to_demo_questions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = services_for(&server, false);
    let session = app.sessions().open(SubjectId::new(9)).await.unwrap();

    let (using_fallback, count, name) = session
        .read(|c| {
            (
                c.using_fallback_data(),
                c.exam().question_count(),
                c.exam().subject_name().to_string(),
            )
        })
        .await;
    assert!(using_fallback);
    assert_eq!(count, 3);
    assert_eq!(name, "General Knowledge (Demo)");
    assert_eq!(session.state().await.mode, SessionMode::InProgress);
}

#[tokio::test]
async fn backend_questions_flow_through_to_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subjects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 2, "name": "Astronomy" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/exams/2/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/question/Astronomy/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 11, "question": "Closest star?", "options": ["Sun", "Sirius"], "correct_option": "Sun" },
            { "id": 12, "question": "Red planet?", "options": ["Mars", "Venus"], "correct_option": "Mars" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/questions/"))
        .and(query_param("subject", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = services_for(&server, false);
    let session = app.sessions().open(SubjectId::new(2)).await.unwrap();
    assert_eq!(session.state().await.mode, SessionMode::NotStarted);
    assert_eq!(
        session.read(|c| c.exam().subject_name().to_string()).await,
        "Astronomy"
    );

    session.start().await;
    session.select_answer(QuestionId::new(11), "Sun").await;
    assert_eq!(session.navigate(Navigation::Delta(1)).await, 1);
    session.select_answer(QuestionId::new(12), "Venus").await;

    let result = session.submit().await.unwrap();
    assert_eq!(result.score_percent(), 50);
    assert!(!result.using_fallback_data());
    assert_eq!(
        ResultReport::new(&result, &[]).share_text(),
        "I scored 50% on Astronomy exam! Correct answers: 1/2"
    );

    let history = app.history().recent(10).await.unwrap();
    assert_eq!(history, vec![result]);
}

#[tokio::test]
async fn remote_grade_is_recorded_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/exams/5/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Biology",
            "questions": [
                { "id": 1, "question": "Cell powerhouse?", "options": ["Mitochondria", "Nucleus"], "correct_option": "Mitochondria" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/exams/5/submit/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "correct_count": 1,
            "total_questions": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = services_for(&server, true);
    let session = app.sessions().open(SubjectId::new(5)).await.unwrap();
    session.start().await;

    let result = session.submit().await.unwrap();
    assert_eq!(result.score_percent(), 100);
    assert_eq!(app.history().recent(1).await.unwrap(), vec![result]);
}

#[tokio::test]
async fn stored_preferences_reach_new_sessions() {
    let server = MockServer::start().await;
    let app = services_for(&server, false);

    let draft = ExamPreferencesDraft {
        show_explanation: Some(false),
        ..ExamPreferencesDraft::new()
    };
    let prefs = app.preferences().update(draft).await.unwrap();
    assert!(!prefs.show_explanation());

    let session = app.sessions().open(SubjectId::new(1)).await.unwrap();
    session.submit().await;
    let review = session.read(|c| c.review_items()).await;
    assert_eq!(review.len(), 3);
    assert!(review.iter().all(|item| item.explanation.is_none()));
}
