//! Profile store: holds the current user's learning profile, folds scored
//! results into it, and mediates best-effort persistence.

use std::sync::Arc;

use crate::classifier::{classify, Classification};
use crate::config::AssessmentConfig;
use crate::persistence::ProfileService;
use crate::scoring::{contribution, replace_contribution};
use crate::types::{ActivityResult, ActivityType, UserLearningProfile};

/// Outcome of folding one activity result into the profile.
#[derive(Debug, Clone)]
pub struct ScoredUpdate {
    pub progress_percent: f64,
    pub assessment_complete: bool,
    pub classification: Classification,
}

pub struct ProfileStore {
    service: Arc<dyn ProfileService>,
    /// Carries the per-activity-type contribution map, so a resumed session
    /// replaces stale contributions the same way a fresh one does.
    profile: UserLearningProfile,
}

impl ProfileStore {
    /// Fetch the existing profile, or create a fresh one. A fetch failure is
    /// treated as "no existing profile" and logged.
    pub async fn load_or_create(
        service: Arc<dyn ProfileService>,
        user_id: &str,
        now_ms: i64,
    ) -> Self {
        let profile = match service.fetch_profile(user_id).await {
            Ok(Some(existing)) => existing,
            Ok(None) => UserLearningProfile::new(user_id, now_ms),
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %err,
                    "profile fetch failed, starting fresh assessment"
                );
                UserLearningProfile::new(user_id, now_ms)
            }
        };

        Self { service, profile }
    }

    /// Store wrapped around an already-known profile (tests, resumed flows).
    pub fn with_profile(service: Arc<dyn ProfileService>, profile: UserLearningProfile) -> Self {
        Self { service, profile }
    }

    pub fn profile(&self) -> &UserLearningProfile {
        &self.profile
    }

    pub fn is_complete(&self) -> bool {
        self.profile.assessment_complete
    }

    pub fn pending_activities(&self) -> Vec<ActivityType> {
        ActivityType::ALL
            .into_iter()
            .filter(|ty| !self.profile.activities_completed.contains(ty))
            .collect()
    }

    /// Fold a finished activity into the score vector. Scoring is synchronous
    /// and purely local; persistence happens separately via the `spawn_`
    /// methods. Re-completing a type replaces its prior contribution.
    pub fn apply_result(
        &mut self,
        config: &AssessmentConfig,
        result: &ActivityResult,
        now_ms: i64,
    ) -> ScoredUpdate {
        let activity_type = result.activity_type();
        let delta = contribution(&config.scoring, result);

        replace_contribution(
            &mut self.profile.learning_type_scores,
            self.profile.score_contributions.get(&activity_type),
            &delta,
        );
        self.profile.score_contributions.insert(activity_type, delta);

        self.profile.activities_completed.insert(activity_type);
        self.profile.refresh_completion();
        self.profile.last_updated_ms = now_ms;

        // Advisory until all four activities are in; authoritative after.
        let classification = classify(&config.classifier, &self.profile.learning_type_scores);
        self.profile.primary_learning_type = classification.primary;
        self.profile.confidence = classification.confidence;

        ScoredUpdate {
            progress_percent: self.profile.progress_percent(),
            assessment_complete: self.profile.assessment_complete,
            classification,
        }
    }

    /// Retake: zero everything except the user id.
    pub fn reset(&mut self, now_ms: i64) {
        self.profile.reset(now_ms);
    }

    /// Fire-and-forget telemetry save. Failure is logged; the caller's state
    /// transition has already happened and is never reverted. The result is
    /// timestamped here, at the persistence handoff.
    pub fn spawn_save_result(&self, mut result: ActivityResult, now_ms: i64) {
        let service = Arc::clone(&self.service);
        result.common_mut().timestamp_ms = now_ms;
        tokio::spawn(async move {
            if let Err(err) = service.save_activity_result(&result).await {
                tracing::warn!(
                    user_id = %result.user_id(),
                    activity_type = result.activity_type().as_str(),
                    error = %err,
                    "activity result save failed (non-fatal)"
                );
            }
        });
    }

    /// Fire-and-forget durable profile write.
    pub fn spawn_update_profile(&self) {
        let service = Arc::clone(&self.service);
        let profile = self.profile.clone();
        tokio::spawn(async move {
            if let Err(err) = service.update_profile(&profile).await {
                tracing::warn!(
                    user_id = %profile.user_id,
                    error = %err,
                    "profile update failed; local results remain available"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryProfileService;
    use crate::types::{MemoryChallengeResult, ResultCommon};

    fn memory_result(user_id: &str, recall_accuracy: f64) -> ActivityResult {
        ActivityResult::MemoryChallenge(MemoryChallengeResult {
            common: ResultCommon::new(user_id, 0, 30_000),
            recall_accuracy,
            response_time_ms: 1_500.0,
            engagement_level: 8.0,
            correct_answers: 8,
            total_questions: 10,
            visual_elements_recalled: 8,
        })
    }

    #[tokio::test]
    async fn load_or_create_falls_back_on_fetch_failure() {
        let service = Arc::new(InMemoryProfileService::new());
        service.set_fail_fetch(true);

        let store = ProfileStore::load_or_create(service, "u1", 100).await;
        assert_eq!(store.profile().user_id, "u1");
        assert!(store.profile().learning_type_scores.is_zero());
    }

    #[tokio::test]
    async fn load_or_create_resumes_existing_profile() {
        let service = Arc::new(InMemoryProfileService::new());
        let mut existing = UserLearningProfile::new("u1", 0);
        existing.activities_completed.insert(ActivityType::MemoryChallenge);
        existing.learning_type_scores.visual = 8.0;
        service.seed_profile(existing);

        let store = ProfileStore::load_or_create(service, "u1", 100).await;
        assert_eq!(store.profile().activities_completed.len(), 1);
        assert_eq!(store.pending_activities().len(), 3);
    }

    #[tokio::test]
    async fn apply_result_replaces_prior_contribution() {
        let service = Arc::new(InMemoryProfileService::new());
        let mut store = ProfileStore::load_or_create(service, "u1", 0).await;
        let config = AssessmentConfig::default();

        let first = store.apply_result(&config, &memory_result("u1", 80.0), 10);
        assert_eq!(store.profile().learning_type_scores.visual, 8.0);
        assert_eq!(first.progress_percent, 25.0);

        let second = store.apply_result(&config, &memory_result("u1", 40.0), 20);
        assert_eq!(store.profile().learning_type_scores.visual, 4.0);
        assert_eq!(second.progress_percent, 25.0);
        assert_eq!(store.profile().activities_completed.len(), 1);
    }

    #[tokio::test]
    async fn advisory_classification_after_single_activity() {
        let service = Arc::new(InMemoryProfileService::new());
        let mut store = ProfileStore::load_or_create(service, "u1", 0).await;
        let config = AssessmentConfig::default();

        let update = store.apply_result(&config, &memory_result("u1", 100.0), 10);
        assert_eq!(
            update.classification.primary,
            crate::types::LearningType::Visual
        );
        assert!((update.classification.confidence - 1.0).abs() < 1e-9);
        assert!(!update.assessment_complete);
    }

    #[tokio::test]
    async fn resumed_profile_replaces_stale_contribution() {
        let service = Arc::new(InMemoryProfileService::new());
        let config = AssessmentConfig::default();

        // First session scores the memory challenge and persists the profile.
        let mut store = ProfileStore::load_or_create(
            Arc::clone(&service) as Arc<dyn ProfileService>,
            "u1",
            0,
        )
        .await;
        store.apply_result(&config, &memory_result("u1", 80.0), 10);
        assert_eq!(store.profile().learning_type_scores.visual, 8.0);
        service.seed_profile(store.profile().clone());

        // A resumed session re-completes the same activity recalling nothing.
        // The stored 8 points must be replaced, not stacked on or kept.
        let mut resumed = ProfileStore::load_or_create(service, "u1", 20).await;
        resumed.apply_result(&config, &memory_result("u1", 0.0), 30);
        assert_eq!(resumed.profile().learning_type_scores.visual, 0.0);
        assert_eq!(resumed.profile().activities_completed.len(), 1);
    }

    #[tokio::test]
    async fn save_stamps_persistence_time() {
        let service = Arc::new(InMemoryProfileService::new());
        let store = ProfileStore::load_or_create(
            Arc::clone(&service) as Arc<dyn ProfileService>,
            "u1",
            0,
        )
        .await;

        store.spawn_save_result(memory_result("u1", 80.0), 99_000);
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let saved = service.saved_results();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].common().timestamp_ms, 99_000);
    }

    #[tokio::test]
    async fn save_failure_does_not_block_local_state() {
        let service = Arc::new(InMemoryProfileService::new());
        service.set_fail_saves(true);
        let mut store =
            ProfileStore::load_or_create(Arc::clone(&service) as Arc<dyn ProfileService>, "u1", 0)
                .await;
        let config = AssessmentConfig::default();

        let result = memory_result("u1", 80.0);
        store.apply_result(&config, &result, 10);
        store.spawn_save_result(result, 10);
        tokio::task::yield_now().await;

        // Local profile advanced even though the save failed.
        assert_eq!(store.profile().activities_completed.len(), 1);
        assert!(service.saved_results().is_empty());
    }
}
