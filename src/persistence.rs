//! The persistence seam: an abstract profile-service contract plus an
//! in-memory implementation (tests, local runs) and an HTTP client
//! implementation for the remote profile/activity store.
//!
//! All calls through this seam are best-effort from the engine's point of
//! view: failures are logged by the caller, never awaited by a state
//! transition, and never revert local progress.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::types::{ActivityResult, UserLearningProfile};

#[derive(Error, Debug)]
pub enum ProfileServiceError {
    #[error("profile service transport error: {0}")]
    Transport(String),

    #[error("profile service returned status {0}")]
    Status(u16),

    #[error("profile payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("profile service unavailable: {0}")]
    Unavailable(String),
}

pub type ProfileServiceResult<T> = Result<T, ProfileServiceError>;

/// Contract consumed by the engine. Implementations own transport, auth, and
/// storage details; the engine only needs these three operations.
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// `Ok(None)` means no existing record; the assessment starts fresh.
    async fn fetch_profile(&self, user_id: &str)
        -> ProfileServiceResult<Option<UserLearningProfile>>;

    /// Fire-and-forget telemetry write after every activity completion.
    async fn save_activity_result(&self, result: &ActivityResult) -> ProfileServiceResult<()>;

    /// Durable profile write; invoked when the assessment completes and when
    /// a retake clears the record.
    async fn update_profile(&self, profile: &UserLearningProfile) -> ProfileServiceResult<()>;
}

// ==================== In-memory implementation ====================

/// Map-backed service for tests and local runs, with failure injection so the
/// non-blocking error paths can be exercised.
#[derive(Default)]
pub struct InMemoryProfileService {
    profiles: RwLock<HashMap<String, UserLearningProfile>>,
    results: RwLock<Vec<ActivityResult>>,
    fail_fetch: AtomicBool,
    fail_saves: AtomicBool,
    fail_updates: AtomicBool,
}

impl InMemoryProfileService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_profile(&self, profile: UserLearningProfile) {
        self.profiles
            .write()
            .insert(profile.user_id.clone(), profile);
    }

    pub fn profile_of(&self, user_id: &str) -> Option<UserLearningProfile> {
        self.profiles.read().get(user_id).cloned()
    }

    pub fn saved_results(&self) -> Vec<ActivityResult> {
        self.results.read().clone()
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileService for InMemoryProfileService {
    async fn fetch_profile(
        &self,
        user_id: &str,
    ) -> ProfileServiceResult<Option<UserLearningProfile>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ProfileServiceError::Unavailable("fetch disabled".into()));
        }
        Ok(self.profiles.read().get(user_id).cloned())
    }

    async fn save_activity_result(&self, result: &ActivityResult) -> ProfileServiceResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ProfileServiceError::Unavailable("saves disabled".into()));
        }
        self.results.write().push(result.clone());
        Ok(())
    }

    async fn update_profile(&self, profile: &UserLearningProfile) -> ProfileServiceResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(ProfileServiceError::Unavailable("updates disabled".into()));
        }
        self.profiles
            .write()
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

// ==================== HTTP implementation ====================

/// JSON client for a remote profile service.
///
/// Endpoints:
/// - `GET  {base}/users/{id}/learning-profile` (404 => no record)
/// - `POST {base}/activity-results`
/// - `PUT  {base}/users/{id}/learning-profile`
pub struct HttpProfileService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpProfileService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn profile_url(&self, user_id: &str) -> String {
        format!("{}/users/{}/learning-profile", self.base_url, user_id)
    }
}

#[async_trait]
impl ProfileService for HttpProfileService {
    async fn fetch_profile(
        &self,
        user_id: &str,
    ) -> ProfileServiceResult<Option<UserLearningProfile>> {
        let response = self
            .client
            .get(self.profile_url(user_id))
            .send()
            .await
            .map_err(|e| ProfileServiceError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProfileServiceError::Status(response.status().as_u16()));
        }

        let profile = response
            .json::<UserLearningProfile>()
            .await
            .map_err(|e| ProfileServiceError::Transport(e.to_string()))?;
        Ok(Some(profile))
    }

    async fn save_activity_result(&self, result: &ActivityResult) -> ProfileServiceResult<()> {
        let response = self
            .client
            .post(format!("{}/activity-results", self.base_url))
            .json(result)
            .send()
            .await
            .map_err(|e| ProfileServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProfileServiceError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn update_profile(&self, profile: &UserLearningProfile) -> ProfileServiceResult<()> {
        let response = self
            .client
            .put(self.profile_url(&profile.user_id))
            .json(profile)
            .send()
            .await
            .map_err(|e| ProfileServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProfileServiceError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
