use std::sync::Arc;

use tokio::sync::Mutex;

use exam_core::Clock;
use exam_core::model::{
    ExamPreferences, ExamResult, QuestionId, SessionMode, SessionState, SubjectId,
};
use exam_core::timer::TimerStatus;
use storage::gateway::PersistenceGateway;

use super::service::{Navigation, SessionController, SessionEffect};
use super::ticker::{TickerGuard, spawn_ticker};
use crate::error::SessionError;
use crate::grading::Grader;
use crate::questions::QuestionDataProvider;

//
// ─── PERSISTENCE ───────────────────────────────────────────────────────────────
//

/// Applies controller effects against storage.
///
/// Every failure is logged and swallowed: saved progress is a best-effort
/// cache and must never block the in-memory session.
#[derive(Clone)]
pub struct SessionPersistence {
    gateway: PersistenceGateway,
    grader: Option<Arc<dyn Grader>>,
}

impl SessionPersistence {
    #[must_use]
    pub fn new(gateway: PersistenceGateway) -> Self {
        Self {
            gateway,
            grader: None,
        }
    }

    #[must_use]
    pub fn with_grader(mut self, grader: Arc<dyn Grader>) -> Self {
        self.grader = Some(grader);
        self
    }

    /// Apply `effects` in order.
    pub async fn apply(&self, controller: &mut SessionController, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::Autosave(snapshot) => {
                    if let Err(err) = self.gateway.save(&snapshot.session_key, &snapshot).await {
                        tracing::warn!(key = %snapshot.session_key, error = %err, "failed to save progress");
                    }
                }
                SessionEffect::ClearSnapshot => {
                    let key = controller.session_key();
                    if let Err(err) = self.gateway.remove(&key).await {
                        tracing::warn!(%key, error = %err, "failed to clear saved progress");
                    }
                }
                SessionEffect::RecordResult(result) => {
                    let result = self.grade(controller, result).await;
                    if let Err(err) = self.gateway.append_history(&result).await {
                        tracing::warn!(error = %err, "failed to record exam result");
                    }
                }
            }
        }
    }

    async fn grade(&self, controller: &mut SessionController, local: ExamResult) -> ExamResult {
        let Some(grader) = &self.grader else {
            return local;
        };
        if local.using_fallback_data() {
            return local;
        }

        let answers = controller.answers().answers_sorted();
        match grader.grade(local.subject_id(), &answers).await {
            Ok(grade) => {
                let graded = local.with_counts(grade.correct_count, grade.total_questions);
                controller.replace_result(graded.clone());
                tracing::info!(
                    local = local.score_percent(),
                    remote = graded.score_percent(),
                    "using server grade"
                );
                graded
            }
            Err(err) => {
                tracing::warn!(error = %err, "remote grading failed, keeping local score");
                local
            }
        }
    }
}

//
// ─── SESSION SERVICE ───────────────────────────────────────────────────────────
//

/// Opens exam sessions: resolves questions, resumes saved progress and wires
/// up autosave and the countdown ticker.
#[derive(Clone)]
pub struct ExamSessionService {
    clock: Clock,
    provider: QuestionDataProvider,
    gateway: PersistenceGateway,
    persistence: SessionPersistence,
}

impl ExamSessionService {
    #[must_use]
    pub fn new(clock: Clock, provider: QuestionDataProvider, gateway: PersistenceGateway) -> Self {
        let persistence = SessionPersistence::new(gateway.clone());
        Self {
            clock,
            provider,
            gateway,
            persistence,
        }
    }

    #[must_use]
    pub fn with_grader(mut self, grader: Arc<dyn Grader>) -> Self {
        self.persistence = self.persistence.with_grader(grader);
        self
    }

    /// Open a session for `subject_id`.
    ///
    /// A valid saved snapshot is resumed in progress; an invalid one is
    /// discarded. Sessions on demo questions start right away.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Exam` only if no exam could be built at all.
    pub async fn open(&self, subject_id: SubjectId) -> Result<LiveSession, SessionError> {
        let resolved = self.provider.resolve(subject_id).await?;
        let prefs = self.gateway.load_preferences().await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load preferences");
            ExamPreferences::default()
        });

        let key = resolved.exam.session_key();
        let saved = self.gateway.load(&key).await.unwrap_or_else(|err| {
            tracing::warn!(%key, error = %err, "failed to load saved progress");
            None
        });

        let (controller, resumed) = match saved {
            Some(snapshot) => match SessionController::resume(resolved.exam.clone(), &snapshot, self.clock) {
                Ok(controller) => {
                    tracing::info!(%key, remaining = controller.time_remaining(), "resuming saved progress");
                    (controller, true)
                }
                Err(reason) => {
                    tracing::info!(%key, %reason, "discarding saved progress");
                    if let Err(err) = self.gateway.remove(&key).await {
                        tracing::warn!(%key, error = %err, "failed to clear saved progress");
                    }
                    (SessionController::new(resolved.exam, self.clock), false)
                }
            },
            None => (SessionController::new(resolved.exam, self.clock), false),
        };

        let controller = controller
            .with_fallback_data(resolved.using_fallback_data)
            .with_show_explanation(prefs.show_explanation());
        let session = LiveSession::new(controller, self.persistence.clone(), resumed);

        if resolved.using_fallback_data && !resumed {
            tracing::info!(%key, "demo questions in use, starting immediately");
            session.start().await;
        } else {
            session.sync().await;
        }
        Ok(session)
    }
}

//
// ─── LIVE SESSION ──────────────────────────────────────────────────────────────
//

/// A running session: the controller behind an async mutex, shared with its
/// ticker task so ticks and user intents are applied one at a time.
///
/// Dropping the session aborts the ticker.
pub struct LiveSession {
    controller: Arc<Mutex<SessionController>>,
    persistence: SessionPersistence,
    ticker: Mutex<Option<TickerGuard>>,
    resumed: bool,
}

impl LiveSession {
    #[must_use]
    pub fn new(controller: SessionController, persistence: SessionPersistence, resumed: bool) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            persistence,
            ticker: Mutex::new(None),
            resumed,
        }
    }

    /// True when the session continued from saved progress.
    #[must_use]
    pub fn resumed(&self) -> bool {
        self.resumed
    }

    /// Run `f` against the controller.
    pub async fn read<R>(&self, f: impl FnOnce(&SessionController) -> R) -> R {
        let controller = self.controller.lock().await;
        f(&controller)
    }

    pub async fn state(&self) -> SessionState {
        self.read(SessionController::state).await
    }

    pub async fn start(&self) {
        self.dispatch(SessionController::start, |_| ()).await;
    }

    pub async fn select_answer(&self, question_id: QuestionId, option: &str) {
        self.dispatch(|c| c.select_answer(question_id, option), |_| ())
            .await;
    }

    /// Returns whether `question_id` is marked afterwards.
    pub async fn toggle_mark(&self, question_id: QuestionId) -> bool {
        self.dispatch(
            |c| c.toggle_mark(question_id),
            |c| c.answers().is_marked(question_id),
        )
        .await
    }

    /// Returns the page shown afterwards.
    pub async fn navigate(&self, navigation: Navigation) -> usize {
        self.dispatch(|c| c.navigate(navigation), SessionController::current_page)
            .await
    }

    pub async fn pause_timer(&self) -> bool {
        self.controller.lock().await.pause_timer()
    }

    pub async fn resume_timer(&self) -> bool {
        self.controller.lock().await.resume_timer()
    }

    /// Submit and return the recorded result (server-graded when available).
    pub async fn submit(&self) -> Option<ExamResult> {
        self.dispatch(SessionController::submit, |c| c.result().cloned())
            .await
    }

    pub async fn toggle_review(&self) -> SessionMode {
        self.controller.lock().await.toggle_review()
    }

    pub async fn restart(&self) {
        self.dispatch(SessionController::restart, |_| ()).await;
    }

    /// Switch to untimed study mode, abandoning any timed attempt.
    pub async fn study(&self) {
        self.dispatch(SessionController::study, |_| ()).await;
    }

    pub async fn set_show_explanation(&self, show_explanation: bool) {
        self.controller
            .lock()
            .await
            .set_show_explanation(show_explanation);
    }

    /// Cancel the countdown and stop the ticker.
    pub async fn close(self) {
        self.controller.lock().await.close();
        self.ticker.lock().await.take();
        tracing::debug!("session closed");
    }

    pub(crate) async fn sync(&self) {
        let controller = self.controller.lock().await;
        self.sync_ticker(&controller).await;
    }

    async fn dispatch<R>(
        &self,
        op: impl FnOnce(&mut SessionController) -> Vec<SessionEffect>,
        read: impl FnOnce(&SessionController) -> R,
    ) -> R {
        let mut controller = self.controller.lock().await;
        let effects = op(&mut controller);
        self.persistence.apply(&mut controller, effects).await;
        self.sync_ticker(&controller).await;
        read(&controller)
    }

    /// Keep exactly one ticker alive for the current timer generation while
    /// the attempt is in progress.
    async fn sync_ticker(&self, controller: &SessionController) {
        let mut ticker = self.ticker.lock().await;
        let wanted = controller.mode() == SessionMode::InProgress
            && matches!(
                controller.timer_status(),
                TimerStatus::Running | TimerStatus::Paused
            );
        let generation = controller.timer_generation();

        let current = ticker
            .as_ref()
            .is_some_and(|guard| guard.generation() == generation && !guard.is_finished());
        if wanted && current {
            return;
        }
        *ticker = wanted.then(|| {
            spawn_ticker(
                Arc::clone(&self.controller),
                self.persistence.clone(),
                generation,
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SourceError, SubmitError};
    use crate::grading::RemoteGrade;
    use crate::questions::{QuestionSource, SourcedExam, SubjectQuery};
    use async_trait::async_trait;
    use exam_core::model::{AnswerStore, DurationPolicy, PersistedSnapshot, Question};
    use exam_core::time::{fixed_clock, fixed_now};
    use std::collections::BTreeMap;
    use storage::repository::{InMemoryRepository, KeyValueStore, StorageError};

    struct StaticSource;

    #[async_trait]
    impl QuestionSource for StaticSource {
        fn id(&self) -> &'static str {
            "static"
        }

        async fn fetch(&self, _query: &SubjectQuery) -> Result<SourcedExam, SourceError> {
            let questions = (1..=2)
                .map(|id| {
                    Question::new(
                        QuestionId::new(id),
                        format!("Q{id}"),
                        vec!["A".into(), "B".into()],
                        "A",
                        None,
                    )
                    .unwrap()
                })
                .collect();
            Ok(SourcedExam {
                name: Some("Static".into()),
                duration_minutes: None,
                questions,
            })
        }
    }

    struct StubGrader(Result<RemoteGrade, ()>);

    #[async_trait]
    impl Grader for StubGrader {
        async fn grade(
            &self,
            _subject_id: SubjectId,
            _answers: &BTreeMap<QuestionId, String>,
        ) -> Result<RemoteGrade, SubmitError> {
            self.0
                .map_err(|()| SubmitError::Malformed("stub failure".into()))
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    fn gateway() -> PersistenceGateway {
        PersistenceGateway::new(Arc::new(InMemoryRepository::new()))
    }

    fn demo_service(gateway: &PersistenceGateway) -> ExamSessionService {
        ExamSessionService::new(
            fixed_clock(),
            QuestionDataProvider::offline(DurationPolicy::PerQuestion),
            gateway.clone(),
        )
    }

    fn live_service(gateway: &PersistenceGateway) -> ExamSessionService {
        ExamSessionService::new(
            fixed_clock(),
            QuestionDataProvider::new(vec![Arc::new(StaticSource)], DurationPolicy::PerQuestion),
            gateway.clone(),
        )
    }

    #[tokio::test]
    async fn demo_session_starts_immediately_and_autosaves() {
        let gateway = gateway();
        let session = demo_service(&gateway).open(SubjectId::new(4)).await.unwrap();

        let state = session.state().await;
        assert_eq!(state.mode, SessionMode::InProgress);
        assert!(session.read(SessionController::using_fallback_data).await);
        assert!(gateway.load("exam-4").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn live_session_waits_for_start() {
        let gateway = gateway();
        let session = live_service(&gateway).open(SubjectId::new(4)).await.unwrap();
        assert_eq!(session.state().await.mode, SessionMode::NotStarted);
        assert!(gateway.load("exam-4").await.unwrap().is_none());

        session.start().await;
        assert_eq!(session.state().await.mode, SessionMode::InProgress);
    }

    #[tokio::test]
    async fn saved_progress_resumes_with_remaining_time() {
        let gateway = gateway();
        let mut answers = AnswerStore::new();
        answers.set(QuestionId::new(1), "Paris");
        let saved = PersistedSnapshot::capture("exam-4", &answers, 0, 120, fixed_now());
        gateway.save("exam-4", &saved).await.unwrap();

        let session = demo_service(&gateway).open(SubjectId::new(4)).await.unwrap();
        assert!(session.resumed());
        let state = session.state().await;
        assert_eq!(state.mode, SessionMode::InProgress);
        assert_eq!(state.time_remaining_seconds, 120);
        assert_eq!(state.answers.answer(QuestionId::new(1)), Some("Paris"));
    }

    #[tokio::test]
    async fn invalid_saved_progress_is_discarded() {
        let gateway = gateway();
        let saved = PersistedSnapshot::capture("exam-4", &AnswerStore::new(), 0, 0, fixed_now());
        gateway.save("exam-4", &saved).await.unwrap();

        let session = live_service(&gateway).open(SubjectId::new(4)).await.unwrap();
        assert!(!session.resumed());
        assert_eq!(session.state().await.mode, SessionMode::NotStarted);
        assert!(gateway.load("exam-4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn submit_clears_progress_and_records_history() {
        let gateway = gateway();
        let session = demo_service(&gateway).open(SubjectId::new(4)).await.unwrap();
        session.select_answer(QuestionId::new(1), "Paris").await;

        let result = session.submit().await.unwrap();
        assert_eq!(result.correct_count(), 1);
        assert!(result.using_fallback_data());
        assert!(gateway.load("exam-4").await.unwrap().is_none());
        assert_eq!(gateway.history().await.unwrap(), vec![result]);

        // A second submit records nothing new.
        session.submit().await;
        assert_eq!(gateway.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn server_grade_replaces_local_counts() {
        let gateway = gateway();
        let service = live_service(&gateway).with_grader(Arc::new(StubGrader(Ok(RemoteGrade {
            correct_count: 2,
            total_questions: 2,
        }))));
        let session = service.open(SubjectId::new(4)).await.unwrap();
        session.start().await;

        let result = session.submit().await.unwrap();
        assert_eq!(result.correct_count(), 2);
        assert_eq!(result.score_percent(), 100);
        assert_eq!(gateway.history().await.unwrap()[0], result);
    }

    #[tokio::test]
    async fn failed_grading_keeps_local_score() {
        let gateway = gateway();
        let service = live_service(&gateway).with_grader(Arc::new(StubGrader(Err(()))));
        let session = service.open(SubjectId::new(4)).await.unwrap();
        session.start().await;
        session.select_answer(QuestionId::new(1), "A").await;

        let result = session.submit().await.unwrap();
        assert_eq!(result.correct_count(), 1);
        assert_eq!(result.score_percent(), 50);
    }

    #[tokio::test]
    async fn storage_failures_never_block_the_session() {
        let gateway = PersistenceGateway::new(Arc::new(BrokenStore));
        let session = demo_service(&gateway).open(SubjectId::new(4)).await.unwrap();
        session.select_answer(QuestionId::new(1), "Paris").await;
        assert!(session.toggle_mark(QuestionId::new(2)).await);

        let result = session.submit().await.unwrap();
        assert_eq!(result.correct_count(), 1);
        assert_eq!(session.toggle_review().await, SessionMode::Review);
    }

    #[tokio::test]
    async fn restart_removes_saved_progress() {
        let gateway = gateway();
        let session = demo_service(&gateway).open(SubjectId::new(4)).await.unwrap();
        session.select_answer(QuestionId::new(1), "Paris").await;
        assert!(gateway.load("exam-4").await.unwrap().is_some());

        session.restart().await;
        assert!(gateway.load("exam-4").await.unwrap().is_none());
        let state = session.state().await;
        assert_eq!(state.mode, SessionMode::NotStarted);
        assert!(state.answers.is_empty());
        session.close().await;
    }

    #[tokio::test]
    async fn preferences_control_explanations() {
        let gateway = gateway();
        gateway
            .save_preferences(&ExamPreferences::new(true, false, false))
            .await
            .unwrap();
        let session = demo_service(&gateway).open(SubjectId::new(4)).await.unwrap();
        assert!(!session.read(SessionController::show_explanation).await);
        session.set_show_explanation(true).await;
        assert!(session.read(SessionController::show_explanation).await);
    }

    #[tokio::test]
    async fn study_mode_saves_nothing() {
        let gateway = gateway();
        let session = demo_service(&gateway).open(SubjectId::new(4)).await.unwrap();
        session.select_answer(QuestionId::new(1), "Paris").await;

        session.study().await;
        assert!(gateway.load("exam-4").await.unwrap().is_none());

        session.select_answer(QuestionId::new(1), "Paris").await;
        session.submit().await;
        let state = session.state().await;
        assert_eq!(state.mode, SessionMode::Study);
        assert_eq!(state.answers.answer(QuestionId::new(1)), Some("Paris"));
        assert!(gateway.load("exam-4").await.unwrap().is_none());
        assert!(gateway.history().await.unwrap().is_empty());
        session.close().await;
    }
}
