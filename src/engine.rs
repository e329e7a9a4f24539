//! Assessment orchestrator: sequences the four activities, routes interaction
//! events into the running module, folds scored results into the profile, and
//! drives classification and completion.
//!
//! One session per user; only one activity ever runs inside a session. All
//! persistence is fire-and-forget through the session's profile store, so
//! state transitions depend on local computation alone.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::activities::{
    ActivityEvent, ActivityTicker, AudioVisualSession, MemoryChallenge, ProblemSolving,
    ReadingWritingSession,
};
use crate::config::AssessmentConfig;
use crate::error::{AssessmentError, AssessmentResult};
use crate::persistence::ProfileService;
use crate::profile::{ProfileStore, ScoredUpdate};
use crate::types::{ActivityResult, ActivityType, LearningType, UserLearningProfile};

/// Orchestrator states. `ActivityScored` is transient: the engine settles on
/// `ActivitySelection` or `Complete` within the same call that scored the
/// result, returning the scored outcome to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentPhase {
    NotStarted,
    ActivitySelection,
    ActivityRunning(ActivityType),
    ActivityScored,
    Complete,
    /// Entered directly at start when a finished profile already exists.
    ResultsView,
}

impl AssessmentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "notStarted",
            Self::ActivitySelection => "activitySelection",
            Self::ActivityRunning(_) => "activityRunning",
            Self::ActivityScored => "activityScored",
            Self::Complete => "complete",
            Self::ResultsView => "resultsView",
        }
    }
}

pub enum RunningActivity {
    MemoryChallenge(MemoryChallenge),
    ProblemSolving(ProblemSolving),
    AudioVisual(AudioVisualSession),
    ReadingWriting(ReadingWritingSession),
}

impl RunningActivity {
    fn handle(
        &mut self,
        event: &ActivityEvent,
        now_ms: i64,
    ) -> AssessmentResult<Option<ActivityResult>> {
        match self {
            Self::MemoryChallenge(a) => a.handle(event, now_ms),
            Self::ProblemSolving(a) => a.handle(event, now_ms),
            Self::AudioVisual(a) => a.handle(event, now_ms),
            Self::ReadingWriting(a) => a.handle(event, now_ms),
        }
    }

    pub fn activity_type(&self) -> ActivityType {
        match self {
            Self::MemoryChallenge(_) => ActivityType::MemoryChallenge,
            Self::ProblemSolving(_) => ActivityType::ProblemSolving,
            Self::AudioVisual(_) => ActivityType::AudioVisual,
            Self::ReadingWriting(_) => ActivityType::ReadingWriting,
        }
    }
}

struct AssessmentSession {
    phase: AssessmentPhase,
    store: ProfileStore,
    running: Option<RunningActivity>,
    /// Owned per run; dropping it aborts the timer task, so a cancelled or
    /// scored run can never receive further ticks.
    ticker: Option<ActivityTicker>,
}

type SessionMap = Arc<RwLock<HashMap<String, AssessmentSession>>>;
type OnComplete = Arc<dyn Fn(LearningType) + Send + Sync>;

pub struct AssessmentEngine {
    config: AssessmentConfig,
    service: Arc<dyn ProfileService>,
    sessions: SessionMap,
    on_complete: parking_lot::RwLock<Option<OnComplete>>,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl AssessmentEngine {
    pub fn new(config: AssessmentConfig, service: Arc<dyn ProfileService>) -> Self {
        Self {
            config,
            service,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            on_complete: parking_lot::RwLock::new(None),
        }
    }

    /// Callback fired once when a user's assessment completes, with the final
    /// primary learning type. Used by the host to route to a results view.
    pub fn set_on_complete<F>(&self, callback: F)
    where
        F: Fn(LearningType) + Send + Sync + 'static,
    {
        *self.on_complete.write() = Some(Arc::new(callback));
    }

    /// Initialize (or resume) a user's assessment. Fetches the stored profile;
    /// a fetch failure starts a fresh assessment. A profile that is already
    /// complete lands directly in `ResultsView`.
    pub async fn start(&self, user_id: &str) -> AssessmentPhase {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(user_id) {
                return session.phase;
            }
        }

        let store =
            ProfileStore::load_or_create(Arc::clone(&self.service), user_id, now_ms()).await;
        let phase = if store.is_complete() {
            AssessmentPhase::ResultsView
        } else {
            AssessmentPhase::ActivitySelection
        };

        tracing::info!(
            user_id = %user_id,
            phase = phase.as_str(),
            completed = store.profile().activities_completed.len(),
            "assessment session started"
        );

        self.sessions.write().await.insert(
            user_id.to_string(),
            AssessmentSession {
                phase,
                store,
                running: None,
                ticker: None,
            },
        );
        phase
    }

    pub async fn phase(&self, user_id: &str) -> AssessmentResult<AssessmentPhase> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(user_id)
            .ok_or_else(|| AssessmentError::SessionNotFound(user_id.to_string()))?;
        Ok(session.phase)
    }

    pub async fn profile(&self, user_id: &str) -> AssessmentResult<UserLearningProfile> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(user_id)
            .ok_or_else(|| AssessmentError::SessionNotFound(user_id.to_string()))?;
        Ok(session.store.profile().clone())
    }

    /// `100 × completed / total`.
    pub async fn progress(&self, user_id: &str) -> AssessmentResult<f64> {
        Ok(self.profile(user_id).await?.progress_percent())
    }

    /// Lowest-index not-yet-completed activity type. A hint only; selecting
    /// any pending type is equally valid.
    pub async fn recommended_next(&self, user_id: &str) -> AssessmentResult<Option<ActivityType>> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(user_id)
            .ok_or_else(|| AssessmentError::SessionNotFound(user_id.to_string()))?;
        Ok(session.store.pending_activities().into_iter().next())
    }

    pub async fn pending_activities(
        &self,
        user_id: &str,
    ) -> AssessmentResult<Vec<ActivityType>> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(user_id)
            .ok_or_else(|| AssessmentError::SessionNotFound(user_id.to_string()))?;
        Ok(session.store.pending_activities())
    }

    /// Begin a run of the chosen activity. Any activity type may be selected
    /// while the assessment is unfinished; re-selecting a completed type
    /// replaces that type's score contribution when the run is scored.
    pub async fn select_activity(
        &self,
        user_id: &str,
        activity_type: ActivityType,
    ) -> AssessmentResult<()> {
        let now = now_ms();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(user_id)
            .ok_or_else(|| AssessmentError::SessionNotFound(user_id.to_string()))?;

        match session.phase {
            AssessmentPhase::ActivitySelection => {}
            AssessmentPhase::Complete | AssessmentPhase::ResultsView => {
                return Err(AssessmentError::ActivityUnavailable(activity_type));
            }
            _ => {
                return Err(AssessmentError::InvalidPhase {
                    expected: "activitySelection",
                    found: session.phase.as_str(),
                });
            }
        }

        let running = match activity_type {
            ActivityType::MemoryChallenge => RunningActivity::MemoryChallenge(
                MemoryChallenge::new(self.config.memory_challenge.clone(), user_id, now),
            ),
            ActivityType::ProblemSolving => RunningActivity::ProblemSolving(ProblemSolving::new(
                self.config.problem_solving.clone(),
                user_id,
                now,
            )),
            ActivityType::AudioVisual => RunningActivity::AudioVisual(AudioVisualSession::new(
                self.config.audio_visual.clone(),
                user_id,
                now,
            )),
            ActivityType::ReadingWriting => RunningActivity::ReadingWriting(
                ReadingWritingSession::new(self.config.reading_writing.clone(), user_id, now),
            ),
        };

        session.running = Some(running);
        session.phase = AssessmentPhase::ActivityRunning(activity_type);

        // Timer-driven modules get a per-second ticker scoped to this run.
        session.ticker = match activity_type {
            ActivityType::MemoryChallenge | ActivityType::AudioVisual => Some(
                self.spawn_run_ticker(user_id, self.config.audio_visual.tick_interval_ms),
            ),
            _ => None,
        };

        tracing::info!(
            user_id = %user_id,
            activity_type = activity_type.as_str(),
            "activity selected"
        );
        Ok(())
    }

    fn spawn_run_ticker(&self, user_id: &str, interval_ms: u64) -> ActivityTicker {
        let sessions = Arc::clone(&self.sessions);
        let user_id = user_id.to_string();
        ActivityTicker::spawn(interval_ms, move || {
            let sessions = Arc::clone(&sessions);
            let user_id = user_id.clone();
            async move {
                let mut guard = sessions.write().await;
                let Some(session) = guard.get_mut(&user_id) else {
                    return false;
                };
                match session.running.as_mut() {
                    Some(running) => {
                        let _ = running.handle(&ActivityEvent::Tick, now_ms());
                        true
                    }
                    None => false,
                }
            }
        })
    }

    /// Route an interaction event into the running activity. When the event
    /// finishes the module's final phase, the result is scored synchronously
    /// and the scored outcome is returned.
    pub async fn handle_event(
        &self,
        user_id: &str,
        event: ActivityEvent,
    ) -> AssessmentResult<Option<ScoredUpdate>> {
        let now = now_ms();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(user_id)
            .ok_or_else(|| AssessmentError::SessionNotFound(user_id.to_string()))?;

        let running = session.running.as_mut().ok_or(AssessmentError::InvalidPhase {
            expected: "activityRunning",
            found: session.phase.as_str(),
        })?;

        match running.handle(&event, now)? {
            None => Ok(None),
            Some(result) => {
                // Run is over: stop its timer and drop the module before any
                // further transition.
                session.ticker = None;
                session.running = None;
                session.phase = AssessmentPhase::ActivityScored;

                let update = session.store.apply_result(&self.config, &result, now);
                session.store.spawn_save_result(result, now);

                tracing::info!(
                    user_id = %user_id,
                    progress = update.progress_percent,
                    primary = update.classification.primary.as_str(),
                    confidence = update.classification.confidence,
                    "activity scored"
                );

                if update.assessment_complete {
                    session.phase = AssessmentPhase::Complete;
                    session.store.spawn_update_profile();
                    let callback = self.on_complete.read().clone();
                    if let Some(callback) = callback {
                        callback(update.classification.primary);
                    }
                    tracing::info!(
                        user_id = %user_id,
                        primary = update.classification.primary.as_str(),
                        "assessment complete"
                    );
                } else {
                    session.phase = AssessmentPhase::ActivitySelection;
                }

                Ok(Some(update))
            }
        }
    }

    /// Abandon the in-progress run. Stops its timer, discards unsaved
    /// counters, and touches neither scores nor persistence.
    pub async fn cancel_activity(&self, user_id: &str) -> AssessmentResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(user_id)
            .ok_or_else(|| AssessmentError::SessionNotFound(user_id.to_string()))?;

        let running = session.running.take().ok_or(AssessmentError::InvalidPhase {
            expected: "activityRunning",
            found: session.phase.as_str(),
        })?;
        session.ticker = None;
        session.phase = AssessmentPhase::ActivitySelection;

        tracing::info!(
            user_id = %user_id,
            activity_type = running.activity_type().as_str(),
            "activity cancelled"
        );
        Ok(())
    }

    /// Explicit retake: clears scores and completions (keeping the user id)
    /// and returns to activity selection. Only valid from a finished state.
    pub async fn retake(&self, user_id: &str) -> AssessmentResult<()> {
        let now = now_ms();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(user_id)
            .ok_or_else(|| AssessmentError::SessionNotFound(user_id.to_string()))?;

        match session.phase {
            AssessmentPhase::Complete | AssessmentPhase::ResultsView => {}
            _ => {
                return Err(AssessmentError::InvalidPhase {
                    expected: "complete | resultsView",
                    found: session.phase.as_str(),
                });
            }
        }

        session.store.reset(now);
        // Push the cleared record out so a stale completed profile cannot
        // resurrect on the next start.
        session.store.spawn_update_profile();
        session.phase = AssessmentPhase::ActivitySelection;

        tracing::info!(user_id = %user_id, "assessment reset for retake");
        Ok(())
    }

    /// Read-only access to the running activity, for rendering its state.
    pub async fn with_running<R>(
        &self,
        user_id: &str,
        f: impl FnOnce(&RunningActivity) -> R,
    ) -> AssessmentResult<R> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(user_id)
            .ok_or_else(|| AssessmentError::SessionNotFound(user_id.to_string()))?;
        let running = session.running.as_ref().ok_or(AssessmentError::InvalidPhase {
            expected: "activityRunning",
            found: session.phase.as_str(),
        })?;
        Ok(f(running))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryProfileService;

    fn engine_with_service() -> (AssessmentEngine, Arc<InMemoryProfileService>) {
        let service = Arc::new(InMemoryProfileService::new());
        let engine = AssessmentEngine::new(
            AssessmentConfig::default(),
            Arc::clone(&service) as Arc<dyn ProfileService>,
        );
        (engine, service)
    }

    #[tokio::test]
    async fn start_enters_activity_selection_for_new_user() {
        let (engine, _service) = engine_with_service();
        assert_eq!(
            engine.start("u1").await,
            AssessmentPhase::ActivitySelection
        );
        assert_eq!(engine.progress("u1").await.unwrap(), 0.0);
        assert_eq!(
            engine.recommended_next("u1").await.unwrap(),
            Some(ActivityType::MemoryChallenge)
        );
    }

    #[tokio::test]
    async fn start_enters_results_view_for_completed_profile() {
        let (engine, service) = engine_with_service();
        let mut profile = UserLearningProfile::new("u1", 0);
        for ty in ActivityType::ALL {
            profile.activities_completed.insert(ty);
        }
        profile.refresh_completion();
        service.seed_profile(profile);

        assert_eq!(engine.start("u1").await, AssessmentPhase::ResultsView);
    }

    #[tokio::test]
    async fn start_survives_fetch_failure() {
        let (engine, service) = engine_with_service();
        service.set_fail_fetch(true);
        assert_eq!(
            engine.start("u1").await,
            AssessmentPhase::ActivitySelection
        );
    }

    #[tokio::test]
    async fn selection_requires_selection_phase() {
        let (engine, _service) = engine_with_service();
        engine.start("u1").await;
        engine
            .select_activity("u1", ActivityType::ProblemSolving)
            .await
            .unwrap();

        let err = engine
            .select_activity("u1", ActivityType::AudioVisual)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidPhase { .. }));
    }

    #[tokio::test]
    async fn cancel_returns_to_selection_without_score_changes() {
        let (engine, _service) = engine_with_service();
        engine.start("u1").await;
        engine
            .select_activity("u1", ActivityType::ProblemSolving)
            .await
            .unwrap();
        engine
            .handle_event("u1", ActivityEvent::Click)
            .await
            .unwrap();

        engine.cancel_activity("u1").await.unwrap();
        assert_eq!(
            engine.phase("u1").await.unwrap(),
            AssessmentPhase::ActivitySelection
        );

        let profile = engine.profile("u1").await.unwrap();
        assert!(profile.learning_type_scores.is_zero());
        assert!(profile.activities_completed.is_empty());
    }

    #[tokio::test]
    async fn cancel_without_running_activity_fails() {
        let (engine, _service) = engine_with_service();
        engine.start("u1").await;
        let err = engine.cancel_activity("u1").await.unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidPhase { .. }));
    }

    #[tokio::test]
    async fn events_require_a_session() {
        let (engine, _service) = engine_with_service();
        let err = engine
            .handle_event("ghost", ActivityEvent::Click)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn retake_requires_finished_state() {
        let (engine, _service) = engine_with_service();
        engine.start("u1").await;
        let err = engine.retake("u1").await.unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidPhase { .. }));
    }
}
