use thiserror::Error;

use exam_core::Clock;
use exam_core::model::{
    AnswerStore, ExamMetadata, ExamResult, PersistedSnapshot, Question, QuestionId, SessionMode,
    SessionState,
};
use exam_core::scoring::{self, ScoreReport};
use exam_core::timer::{CountdownTimer, TimerEvent, TimerStatus};

use super::progress::{QuestionStatus, ReviewItem, SessionProgress, StatusKind};

/// Questions shown per page; navigation moves in whole pages.
pub const QUESTIONS_PER_PAGE: usize = 1;

//
// ─── INTENTS AND EFFECTS ───────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Move relative to the current page.
    Delta(i64),
    /// Jump to a page.
    Index(usize),
}

/// Persistence work requested by a controller operation.
///
/// The controller never performs I/O; the workflow applies these in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    Autosave(PersistedSnapshot),
    ClearSnapshot,
    RecordResult(ExamResult),
}

/// Why a saved snapshot cannot be resumed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotRejection {
    #[error("snapshot belongs to {found}, expected {expected}")]
    KeyMismatch { expected: String, found: String },
    #[error("snapshot has no time left")]
    Expired,
    #[error("snapshot claims {remaining}s left of a {duration}s exam")]
    Overlong { remaining: u32, duration: u32 },
    #[error("snapshot answers none of this exam's questions")]
    UnknownQuestions,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// State machine for one exam attempt.
///
/// `NotStarted → InProgress → Submitted ⇄ Review`. Operations that are illegal
/// in the current mode are ignored and return no effects.
#[derive(Debug, Clone)]
pub struct SessionController {
    exam: ExamMetadata,
    clock: Clock,
    mode: SessionMode,
    answers: AnswerStore,
    current_page: usize,
    timer: CountdownTimer,
    report: Option<ScoreReport>,
    result: Option<ExamResult>,
    using_fallback_data: bool,
    show_explanation: bool,
}

impl SessionController {
    /// A fresh, not yet started attempt with the timer at full duration.
    #[must_use]
    pub fn new(exam: ExamMetadata, clock: Clock) -> Self {
        let timer = CountdownTimer::new(exam.duration_seconds());
        Self {
            exam,
            clock,
            mode: SessionMode::NotStarted,
            answers: AnswerStore::new(),
            current_page: 0,
            timer,
            report: None,
            result: None,
            using_fallback_data: false,
            show_explanation: true,
        }
    }

    /// Continue an attempt from a saved snapshot, already in progress.
    ///
    /// Answers to questions that are no longer part of the exam, or naming an
    /// option the question does not offer, are dropped and the page is
    /// clamped.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotRejection` when the snapshot belongs to another
    /// session, has no time left (or more than the exam allows), or has
    /// answers for none of the exam's questions.
    pub fn resume(
        exam: ExamMetadata,
        snapshot: &PersistedSnapshot,
        clock: Clock,
    ) -> Result<Self, SnapshotRejection> {
        check_snapshot(&exam, snapshot)?;

        let mut controller = Self::new(exam, clock);
        controller.answers = restore_answers(&controller.exam, snapshot);
        controller.current_page =
            (snapshot.current_question_index / QUESTIONS_PER_PAGE).min(controller.last_page());
        controller
            .timer
            .start_from(controller.exam.duration_seconds(), snapshot.time_remaining_seconds);
        controller.mode = SessionMode::InProgress;
        Ok(controller)
    }

    /// Mark results produced by this attempt as coming from demo data.
    #[must_use]
    pub fn with_fallback_data(mut self, using_fallback_data: bool) -> Self {
        self.using_fallback_data = using_fallback_data;
        self
    }

    #[must_use]
    pub fn with_show_explanation(mut self, show_explanation: bool) -> Self {
        self.show_explanation = show_explanation;
        self
    }

    pub fn set_show_explanation(&mut self, show_explanation: bool) {
        self.show_explanation = show_explanation;
    }

    // ─── Operations ───────────────────────────────────────────────────────────

    /// Begin the attempt and start the countdown. Leaving study mode this way
    /// discards the study answers.
    pub fn start(&mut self) -> Vec<SessionEffect> {
        match self.mode {
            SessionMode::NotStarted => {}
            SessionMode::Study => {
                self.answers.clear();
                self.current_page = 0;
            }
            mode => {
                tracing::debug!(?mode, "start ignored");
                return Vec::new();
            }
        }
        self.timer.start(self.exam.duration_seconds());
        self.mode = SessionMode::InProgress;
        tracing::info!(session = %self.session_key(), duration = self.exam.duration_seconds(), "exam started");
        vec![self.autosave()]
    }

    /// Record `option` for `question_id`. During an attempt the last answer
    /// wins; in study mode the first answer is final.
    pub fn select_answer(&mut self, question_id: QuestionId, option: &str) -> Vec<SessionEffect> {
        if !self.mode.accepts_answers() {
            tracing::debug!(mode = ?self.mode, %question_id, "answer ignored outside an attempt");
            return Vec::new();
        }
        let option = option.trim();
        match self.exam.question(question_id) {
            Some(question) if question.has_option(option) => {}
            Some(_) => {
                tracing::debug!(%question_id, option, "answer ignored: unknown option");
                return Vec::new();
            }
            None => {
                tracing::debug!(%question_id, "answer ignored: unknown question");
                return Vec::new();
            }
        }
        if self.mode == SessionMode::Study && self.answers.is_answered(question_id) {
            tracing::debug!(%question_id, "answer ignored: already revealed");
            return Vec::new();
        }
        self.answers.set(question_id, option);
        self.autosave_if_in_progress()
    }

    /// Flag or unflag `question_id` for review. Allowed during and after the
    /// attempt; only saved while it is in progress.
    pub fn toggle_mark(&mut self, question_id: QuestionId) -> Vec<SessionEffect> {
        if self.mode == SessionMode::NotStarted || !self.exam.contains(question_id) {
            tracing::debug!(mode = ?self.mode, %question_id, "mark ignored");
            return Vec::new();
        }
        self.answers.toggle_mark(question_id);
        self.autosave_if_in_progress()
    }

    /// Move to another page, clamping out-of-range requests.
    pub fn navigate(&mut self, navigation: Navigation) -> Vec<SessionEffect> {
        let last = self.last_page();
        let target = match navigation {
            Navigation::Index(page) => page.min(last),
            Navigation::Delta(delta) => {
                let current = i64::try_from(self.current_page).unwrap_or(i64::MAX);
                let last_signed = i64::try_from(last).unwrap_or(i64::MAX);
                let target = current.saturating_add(delta).clamp(0, last_signed);
                usize::try_from(target).unwrap_or(last)
            }
        };
        if target == self.current_page {
            return Vec::new();
        }
        self.current_page = target;
        self.autosave_if_in_progress()
    }

    /// Returns true if the countdown was running and is now paused.
    pub fn pause_timer(&mut self) -> bool {
        self.mode == SessionMode::InProgress && self.timer.pause()
    }

    /// Returns true if the countdown was paused and is running again.
    pub fn resume_timer(&mut self) -> bool {
        self.mode == SessionMode::InProgress && self.timer.resume()
    }

    /// Advance the countdown by one second, submitting when it runs out.
    pub fn tick(&mut self) -> Vec<SessionEffect> {
        if self.mode != SessionMode::InProgress {
            return Vec::new();
        }
        match self.timer.tick() {
            TimerEvent::Idle => Vec::new(),
            TimerEvent::Tick { .. } => vec![self.autosave()],
            TimerEvent::Expired => {
                tracing::info!(session = %self.session_key(), "time is up, submitting");
                self.finish()
            }
        }
    }

    /// Score the attempt. Accepted at any completion level; unanswered
    /// questions count as incorrect. Repeated calls are no-ops.
    pub fn submit(&mut self) -> Vec<SessionEffect> {
        if self.mode != SessionMode::InProgress {
            tracing::debug!(mode = ?self.mode, "submit ignored");
            return Vec::new();
        }
        self.finish()
    }

    /// Switch between the submitted summary and the review overlay. Returns
    /// the resulting mode.
    pub fn toggle_review(&mut self) -> SessionMode {
        self.mode = match self.mode {
            SessionMode::Submitted => SessionMode::Review,
            SessionMode::Review => SessionMode::Submitted,
            other => {
                tracing::debug!(mode = ?other, "review toggle ignored");
                other
            }
        };
        self.mode
    }

    /// Discard the attempt and return to a fresh, not started session.
    pub fn restart(&mut self) -> Vec<SessionEffect> {
        self.timer.cancel();
        self.timer.reset(self.exam.duration_seconds());
        self.answers.clear();
        self.current_page = 0;
        self.report = None;
        self.result = None;
        self.mode = SessionMode::NotStarted;
        tracing::info!(session = %self.session_key(), "exam restarted");
        vec![SessionEffect::ClearSnapshot]
    }

    /// Switch to untimed study mode. Leaving a timed attempt discards it like
    /// `restart` does.
    pub fn study(&mut self) -> Vec<SessionEffect> {
        let effects = match self.mode {
            SessionMode::Study => return Vec::new(),
            SessionMode::NotStarted => Vec::new(),
            _ => self.restart(),
        };
        self.mode = SessionMode::Study;
        tracing::info!(session = %self.session_key(), "study mode");
        effects
    }

    /// Stop the countdown for good before the session is dropped.
    pub fn close(&mut self) {
        self.timer.cancel();
    }

    /// Swap in a result for the same attempt, e.g. one graded by the backend.
    /// Returns false if `result` belongs to another attempt.
    pub fn replace_result(&mut self, result: ExamResult) -> bool {
        match &self.result {
            Some(current) if current.attempt_id() == result.attempt_id() => {
                self.result = Some(result);
                true
            }
            _ => false,
        }
    }

    fn finish(&mut self) -> Vec<SessionEffect> {
        self.timer.cancel();
        let report = scoring::score(self.exam.questions(), &self.answers);
        let result = ExamResult::new(
            self.exam.subject_id(),
            self.exam.subject_name(),
            report.correct_count,
            report.total_questions(),
            self.timer.elapsed(),
            self.clock.now(),
            self.using_fallback_data,
        );
        tracing::info!(
            session = %self.session_key(),
            correct = result.correct_count(),
            total = result.total_questions(),
            score = result.score_percent(),
            "exam submitted"
        );
        self.report = Some(report);
        self.result = Some(result.clone());
        self.mode = SessionMode::Submitted;
        vec![
            SessionEffect::ClearSnapshot,
            SessionEffect::RecordResult(result),
        ]
    }

    fn autosave(&self) -> SessionEffect {
        SessionEffect::Autosave(self.snapshot())
    }

    fn autosave_if_in_progress(&self) -> Vec<SessionEffect> {
        if self.mode == SessionMode::InProgress {
            vec![self.autosave()]
        } else {
            Vec::new()
        }
    }

    fn last_page(&self) -> usize {
        self.total_pages().saturating_sub(1)
    }

    // ─── Reads ────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn exam(&self) -> &ExamMetadata {
        &self.exam
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn session_key(&self) -> String {
        self.exam.session_key()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.timer.remaining()
    }

    #[must_use]
    pub fn timer_status(&self) -> TimerStatus {
        self.timer.status()
    }

    /// Changes whenever the countdown is started, reset or cancelled.
    #[must_use]
    pub fn timer_generation(&self) -> u64 {
        self.timer.generation()
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_page * QUESTIONS_PER_PAGE
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.exam.question_count().div_ceil(QUESTIONS_PER_PAGE)
    }

    #[must_use]
    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn report(&self) -> Option<&ScoreReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub fn using_fallback_data(&self) -> bool {
        self.using_fallback_data
    }

    #[must_use]
    pub fn show_explanation(&self) -> bool {
        self.show_explanation
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState {
            mode: self.mode,
            time_remaining_seconds: self.timer.remaining(),
            answers: self.answers.clone(),
            current_question_index: self.current_question_index(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot::capture(
            self.session_key(),
            &self.answers,
            self.current_question_index(),
            self.timer.remaining(),
            self.clock.now(),
        )
    }

    #[must_use]
    pub fn current_page_questions(&self) -> &[Question] {
        let questions = self.exam.questions();
        let start = self.current_question_index().min(questions.len());
        let end = (start + QUESTIONS_PER_PAGE).min(questions.len());
        &questions[start..end]
    }

    /// True when every question on the visible page has an answer. Used as a
    /// soft guard before an explicit submit.
    #[must_use]
    pub fn page_complete(&self) -> bool {
        self.current_page_questions()
            .iter()
            .all(|question| self.answers.is_answered(question.id()))
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let questions = self.exam.questions();
        let answered = questions
            .iter()
            .filter(|q| self.answers.is_answered(q.id()))
            .count();
        let marked = questions
            .iter()
            .filter(|q| self.answers.is_marked(q.id()))
            .count();
        SessionProgress {
            total: questions.len(),
            answered,
            marked,
            remaining: questions.len() - answered,
        }
    }

    #[must_use]
    pub fn question_status(&self, index: usize) -> Option<QuestionStatus> {
        let question = self.exam.questions().get(index)?;
        let kind = if index / QUESTIONS_PER_PAGE == self.current_page {
            StatusKind::Current
        } else if self.answers.is_answered(question.id()) {
            StatusKind::Answered
        } else {
            StatusKind::Unanswered
        };
        Some(QuestionStatus {
            kind,
            marked: self.answers.is_marked(question.id()),
        })
    }

    /// Correct answer for a question answered in study mode.
    #[must_use]
    pub fn study_reveal(&self, question_id: QuestionId) -> Option<ReviewItem> {
        if self.mode != SessionMode::Study {
            return None;
        }
        let question = self.exam.question(question_id)?;
        let chosen = self.answers.answer(question_id)?;
        Some(ReviewItem {
            question_id,
            text: question.text().to_string(),
            user_answer: Some(chosen.to_string()),
            correct_answer: question.correct_option().to_string(),
            is_correct: question.is_correct(chosen),
            explanation: question
                .explanation()
                .filter(|_| self.show_explanation)
                .map(str::to_string),
        })
    }

    /// Per-question outcome once the attempt is scored; empty before that.
    #[must_use]
    pub fn review_items(&self) -> Vec<ReviewItem> {
        let Some(report) = self.report.as_ref().filter(|_| self.mode.is_finished()) else {
            return Vec::new();
        };
        self.exam
            .questions()
            .iter()
            .zip(&report.results)
            .map(|(question, outcome)| ReviewItem {
                question_id: question.id(),
                text: question.text().to_string(),
                user_answer: outcome.user_answer.clone(),
                correct_answer: outcome.correct_answer.clone(),
                is_correct: outcome.is_correct,
                explanation: question
                    .explanation()
                    .filter(|_| self.show_explanation)
                    .map(str::to_string),
            })
            .collect()
    }
}

fn restore_answers(exam: &ExamMetadata, snapshot: &PersistedSnapshot) -> AnswerStore {
    let mut answers = snapshot.answer_store();
    answers.retain_questions(|id| exam.contains(id));
    for (question_id, option) in answers.answers_sorted() {
        let trimmed = option.trim();
        match exam.question(question_id) {
            Some(question) if question.has_option(trimmed) => {
                if trimmed != option {
                    answers.set(question_id, trimmed);
                }
            }
            _ => {
                tracing::debug!(%question_id, option = %option, "dropping saved answer: unknown option");
                answers.unset(question_id);
            }
        }
    }
    answers
}

fn check_snapshot(exam: &ExamMetadata, snapshot: &PersistedSnapshot) -> Result<(), SnapshotRejection> {
    let expected = exam.session_key();
    if !snapshot.session_key.is_empty() && snapshot.session_key != expected {
        return Err(SnapshotRejection::KeyMismatch {
            expected,
            found: snapshot.session_key.clone(),
        });
    }

    let remaining = snapshot.time_remaining_seconds;
    let duration = exam.duration_seconds();
    if remaining == 0 {
        return Err(SnapshotRejection::Expired);
    }
    if remaining > duration {
        return Err(SnapshotRejection::Overlong {
            remaining,
            duration,
        });
    }

    if !snapshot.answers.is_empty() && !snapshot.answers.keys().any(|id| exam.contains(*id)) {
        return Err(SnapshotRejection::UnknownQuestions);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{DurationPolicy, SubjectId};
    use exam_core::time::{fixed_clock, fixed_now};

    fn question(id: u64, correct: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            vec!["A".into(), "B".into(), "C".into()],
            correct,
            Some(format!("Because {correct}.")),
        )
        .unwrap()
    }

    fn exam() -> ExamMetadata {
        ExamMetadata::new(
            SubjectId::new(1),
            "Math",
            vec![question(1, "A"), question(2, "B"), question(3, "C")],
            DurationPolicy::PerQuestion,
            None,
        )
        .unwrap()
    }

    fn started() -> SessionController {
        let mut controller = SessionController::new(exam(), fixed_clock());
        controller.start();
        controller
    }

    fn q(id: u64) -> QuestionId {
        QuestionId::new(id)
    }

    fn snapshot(answers: &[(u64, &str)], remaining: u32) -> PersistedSnapshot {
        let mut store = AnswerStore::new();
        for (id, option) in answers {
            store.set(q(*id), *option);
        }
        PersistedSnapshot::capture("exam-1", &store, 0, remaining, fixed_now())
    }

    #[test]
    fn partial_submission_scores_unanswered_as_incorrect() {
        let mut controller = started();
        assert_eq!(controller.time_remaining(), 180);

        controller.select_answer(q(1), "A");
        controller.select_answer(q(2), "C");
        let effects = controller.submit();

        assert_eq!(controller.mode(), SessionMode::Submitted);
        let result = controller.result().unwrap();
        assert_eq!(result.correct_count(), 1);
        assert_eq!(result.total_questions(), 3);
        assert_eq!(result.score_percent(), 33);
        assert!(matches!(
            effects.as_slice(),
            [SessionEffect::ClearSnapshot, SessionEffect::RecordResult(recorded)] if recorded == result
        ));
    }

    #[test]
    fn toggling_mark_twice_clears_it() {
        let mut controller = started();
        controller.toggle_mark(q(2));
        assert!(controller.answers().is_marked(q(2)));
        controller.toggle_mark(q(2));
        assert_eq!(controller.answers().marked_count(), 0);
    }

    #[test]
    fn expiry_submits_exactly_once() {
        let mut controller =
            SessionController::resume(exam(), &snapshot(&[], 5), fixed_clock()).unwrap();

        let mut records = 0;
        for _ in 0..5 {
            records += controller
                .tick()
                .iter()
                .filter(|effect| matches!(effect, SessionEffect::RecordResult(_)))
                .count();
        }
        assert_eq!(records, 1);
        assert_eq!(controller.mode(), SessionMode::Submitted);
        assert_eq!(controller.time_remaining(), 0);

        assert!(controller.tick().is_empty());
        assert!(controller.submit().is_empty());
    }

    #[test]
    fn resume_keeps_saved_time_and_answers() {
        let controller =
            SessionController::resume(exam(), &snapshot(&[(1, "A")], 120), fixed_clock())
                .unwrap();
        assert_eq!(controller.mode(), SessionMode::InProgress);
        assert_eq!(controller.time_remaining(), 120);
        assert_eq!(controller.timer_status(), TimerStatus::Running);
        assert_eq!(controller.answers().answer(q(1)), Some("A"));
    }

    #[test]
    fn resume_rejects_unusable_snapshots() {
        let mut foreign = snapshot(&[], 60);
        foreign.session_key = "exam-2".into();
        assert!(matches!(
            SessionController::resume(exam(), &foreign, fixed_clock()),
            Err(SnapshotRejection::KeyMismatch { .. })
        ));
        assert_eq!(
            SessionController::resume(exam(), &snapshot(&[], 0), fixed_clock()).unwrap_err(),
            SnapshotRejection::Expired
        );
        assert!(matches!(
            SessionController::resume(exam(), &snapshot(&[], 500), fixed_clock()),
            Err(SnapshotRejection::Overlong { .. })
        ));
        assert_eq!(
            SessionController::resume(exam(), &snapshot(&[(42, "A")], 60), fixed_clock())
                .unwrap_err(),
            SnapshotRejection::UnknownQuestions
        );
    }

    #[test]
    fn resume_drops_stale_answers_and_clamps_page() {
        let mut stale = snapshot(&[(1, "B"), (42, "A")], 60);
        stale.current_question_index = 10;
        let controller = SessionController::resume(exam(), &stale, fixed_clock()).unwrap();
        assert_eq!(controller.answers().answered_count(), 1);
        assert_eq!(controller.current_page(), 2);
    }

    #[test]
    fn restart_matches_a_brand_new_session() {
        let fresh = SessionController::new(exam(), fixed_clock());

        let mut controller = started();
        controller.select_answer(q(1), "A");
        controller.toggle_mark(q(3));
        controller.navigate(Navigation::Index(2));
        controller.tick();
        controller.submit();
        controller.toggle_review();

        let effects = controller.restart();
        assert_eq!(effects, vec![SessionEffect::ClearSnapshot]);
        assert_eq!(controller.state(), fresh.state());
        assert_eq!(controller.time_remaining(), 180);
        assert_eq!(controller.timer_status(), TimerStatus::Idle);
        assert!(controller.result().is_none());
        assert!(controller.tick().is_empty());
    }

    #[test]
    fn answers_only_count_while_in_progress() {
        let mut controller = SessionController::new(exam(), fixed_clock());
        assert!(controller.select_answer(q(1), "A").is_empty());

        controller.start();
        assert_eq!(controller.select_answer(q(1), "A").len(), 1);
        assert_eq!(controller.select_answer(q(1), " B ").len(), 1);
        assert_eq!(controller.answers().answer(q(1)), Some("B"));
        assert!(controller.select_answer(q(1), "Z").is_empty());
        assert!(controller.select_answer(q(9), "A").is_empty());

        controller.submit();
        assert!(controller.select_answer(q(1), "A").is_empty());
        assert_eq!(controller.answers().answer(q(1)), Some("B"));
    }

    #[test]
    fn start_and_submit_respect_mode() {
        let mut controller = SessionController::new(exam(), fixed_clock());
        assert!(controller.submit().is_empty());
        assert_eq!(controller.mode(), SessionMode::NotStarted);

        assert!(matches!(
            controller.start().as_slice(),
            [SessionEffect::Autosave(_)]
        ));
        assert!(controller.start().is_empty());
    }

    #[test]
    fn navigation_clamps_and_saves_only_in_progress() {
        let mut controller = started();
        assert!(controller.navigate(Navigation::Delta(-3)).is_empty());
        assert_eq!(controller.current_page(), 0);

        assert_eq!(controller.navigate(Navigation::Delta(1)).len(), 1);
        assert_eq!(controller.current_page(), 1);
        controller.navigate(Navigation::Index(99));
        assert_eq!(controller.current_page(), 2);
        controller.navigate(Navigation::Delta(i64::MIN));
        assert_eq!(controller.current_page(), 0);

        controller.submit();
        controller.toggle_review();
        assert!(controller.navigate(Navigation::Index(1)).is_empty());
        assert_eq!(controller.current_page(), 1);
    }

    #[test]
    fn pause_freezes_the_countdown() {
        let mut controller = started();
        controller.tick();
        assert!(controller.pause_timer());
        assert!(controller.tick().is_empty());
        assert_eq!(controller.time_remaining(), 179);
        assert!(controller.resume_timer());
        assert_eq!(controller.tick().len(), 1);
        assert_eq!(controller.time_remaining(), 178);
    }

    #[test]
    fn review_toggle_leaves_attempt_untouched() {
        let mut controller = started();
        controller.select_answer(q(1), "A");
        controller.toggle_mark(q(2));
        controller.submit();
        let answers = controller.answers().clone();
        let result = controller.result().cloned();

        assert_eq!(controller.toggle_review(), SessionMode::Review);
        assert!(controller.toggle_mark(q(3)).is_empty());
        assert!(controller.answers().is_marked(q(3)));
        controller.toggle_mark(q(3));
        assert_eq!(controller.toggle_review(), SessionMode::Submitted);

        assert_eq!(controller.answers(), &answers);
        assert_eq!(controller.result().cloned(), result);
    }

    #[test]
    fn review_items_reveal_answers_and_respect_explanation_toggle() {
        let mut controller = started();
        assert!(controller.review_items().is_empty());
        controller.select_answer(q(2), "B");
        controller.submit();

        let items = controller.review_items();
        assert_eq!(items.len(), 3);
        assert!(items[1].is_correct);
        assert_eq!(items[0].user_answer, None);
        assert_eq!(items[0].correct_answer, "A");
        assert_eq!(items[0].explanation.as_deref(), Some("Because A."));

        controller.set_show_explanation(false);
        assert!(controller.review_items().iter().all(|item| item.explanation.is_none()));
    }

    #[test]
    fn progress_status_and_page_guard() {
        let mut controller = started();
        assert!(!controller.page_complete());
        controller.select_answer(q(1), "A");
        assert!(controller.page_complete());
        controller.toggle_mark(q(3));
        controller.navigate(Navigation::Delta(1));

        let progress = controller.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.marked, 1);
        assert_eq!(progress.remaining, 2);
        assert!(!progress.is_complete());

        assert_eq!(
            controller.question_status(0).unwrap().kind,
            StatusKind::Answered
        );
        assert_eq!(
            controller.question_status(1).unwrap().kind,
            StatusKind::Current
        );
        let third = controller.question_status(2).unwrap();
        assert_eq!(third.kind, StatusKind::Unanswered);
        assert!(third.marked);
        assert!(controller.question_status(3).is_none());
        assert_eq!(controller.current_page_questions()[0].id(), q(2));
    }

    #[test]
    fn replace_result_only_accepts_same_attempt() {
        let mut controller = started();
        controller.submit();
        let local = controller.result().cloned().unwrap();

        let remote = local.with_counts(3, 3);
        assert!(controller.replace_result(remote.clone()));
        assert_eq!(controller.result(), Some(&remote));

        let other = ExamResult::new(SubjectId::new(1), "Math", 0, 3, 0, fixed_now(), false);
        assert!(!controller.replace_result(other));
    }

    #[test]
    fn autosave_snapshot_reflects_state() {
        let mut controller = started();
        controller.select_answer(q(2), "C");
        controller.navigate(Navigation::Index(1));
        let effects = controller.toggle_mark(q(2));

        let [SessionEffect::Autosave(saved)] = effects.as_slice() else {
            panic!("expected one autosave, got {effects:?}");
        };
        assert_eq!(saved.session_key, "exam-1");
        assert_eq!(saved.current_question_index, 1);
        assert_eq!(saved.time_remaining_seconds, 180);
        assert_eq!(saved.marked, vec![q(2)]);
        assert_eq!(saved.answer_store().answer(q(2)), Some("C"));
    }

    #[test]
    fn fallback_flag_reaches_the_result() {
        let mut controller = SessionController::new(exam(), fixed_clock()).with_fallback_data(true);
        controller.start();
        controller.tick();
        controller.submit();
        let result = controller.result().unwrap();
        assert!(result.using_fallback_data());
        assert_eq!(result.time_spent_seconds(), 1);
        assert_eq!(result.completed_at(), fixed_now());
    }

    #[test]
    fn resume_drops_answers_naming_unknown_options() {
        let saved = snapshot(&[(1, "A"), (2, "Z"), (3, " C ")], 90);
        let controller = SessionController::resume(exam(), &saved, fixed_clock()).unwrap();

        assert_eq!(controller.answers().answer(q(1)), Some("A"));
        assert!(!controller.answers().is_answered(q(2)));
        assert_eq!(controller.answers().answer(q(3)), Some("C"));
        assert_eq!(controller.answers().answered_count(), 2);
    }

    #[test]
    fn study_mode_is_untimed_and_reveals_first_answer() {
        let mut controller = SessionController::new(exam(), fixed_clock());
        assert!(controller.study().is_empty());
        assert_eq!(controller.mode(), SessionMode::Study);

        assert!(controller.select_answer(q(1), "B").is_empty());
        assert!(controller.select_answer(q(1), "A").is_empty());
        assert_eq!(controller.answers().answer(q(1)), Some("B"));

        let reveal = controller.study_reveal(q(1)).unwrap();
        assert_eq!(reveal.user_answer.as_deref(), Some("B"));
        assert_eq!(reveal.correct_answer, "A");
        assert!(!reveal.is_correct);
        assert_eq!(reveal.explanation.as_deref(), Some("Because A."));
        assert!(controller.study_reveal(q(2)).is_none());

        assert!(controller.tick().is_empty());
        assert!(!controller.pause_timer());
        assert!(controller.submit().is_empty());
        assert_eq!(controller.time_remaining(), 180);
        assert_eq!(controller.mode(), SessionMode::Study);
        assert!(controller.result().is_none());
        assert_eq!(controller.progress().answered, 1);
    }

    #[test]
    fn study_reveal_hides_explanation_when_switched_off() {
        let mut controller =
            SessionController::new(exam(), fixed_clock()).with_show_explanation(false);
        controller.study();
        controller.select_answer(q(2), "B");
        let reveal = controller.study_reveal(q(2)).unwrap();
        assert!(reveal.is_correct);
        assert_eq!(reveal.explanation, None);
    }

    #[test]
    fn studying_abandons_a_timed_attempt() {
        let mut controller = started();
        controller.select_answer(q(1), "A");
        controller.tick();

        assert_eq!(controller.study(), vec![SessionEffect::ClearSnapshot]);
        assert_eq!(controller.mode(), SessionMode::Study);
        assert!(controller.answers().is_empty());
        assert_eq!(controller.time_remaining(), 180);
        assert!(controller.study().is_empty());
    }

    #[test]
    fn starting_from_study_begins_a_fresh_attempt() {
        let mut controller = SessionController::new(exam(), fixed_clock());
        controller.study();
        controller.select_answer(q(1), "A");
        controller.navigate(Navigation::Index(2));

        let effects = controller.start();
        assert_eq!(controller.mode(), SessionMode::InProgress);
        assert!(controller.answers().is_empty());
        assert_eq!(controller.current_page(), 0);
        assert!(matches!(effects.as_slice(), [SessionEffect::Autosave(_)]));
        assert!(controller.study_reveal(q(1)).is_none());
    }
}
