//! Core data model: learning types, activity types, activity results,
//! score vectors, and the per-user learning profile.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Number of distinct activities in a full assessment.
pub const TOTAL_ACTIVITIES: u32 = 4;

// ==================== LearningType ====================

/// The classification target: one of the four VARK modalities, or
/// `Undetermined` before any activity has been completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum LearningType {
    Visual,
    Auditory,
    Kinesthetic,
    ReadingWriting,
    #[default]
    Undetermined,
}

impl LearningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Auditory => "auditory",
            Self::Kinesthetic => "kinesthetic",
            Self::ReadingWriting => "readingWriting",
            Self::Undetermined => "undetermined",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "visual" => Self::Visual,
            "auditory" => Self::Auditory,
            "kinesthetic" => Self::Kinesthetic,
            "readingWriting" | "reading-writing" => Self::ReadingWriting,
            _ => Self::Undetermined,
        }
    }
}

// ==================== ActivityType ====================

/// One of the four interactive exercises used to elicit behavioral signal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    MemoryChallenge,
    ProblemSolving,
    AudioVisual,
    ReadingWriting,
}

impl ActivityType {
    /// Fixed presentation order; also the recommended-next tie-break order.
    pub const ALL: [ActivityType; 4] = [
        Self::MemoryChallenge,
        Self::ProblemSolving,
        Self::AudioVisual,
        Self::ReadingWriting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemoryChallenge => "memoryChallenge",
            Self::ProblemSolving => "problemSolving",
            Self::AudioVisual => "audioVisual",
            Self::ReadingWriting => "readingWriting",
        }
    }

    /// The modality this activity primarily probes. Results still distribute
    /// fractional weight to other modalities during scoring.
    pub fn dominant_type(&self) -> LearningType {
        match self {
            Self::MemoryChallenge => LearningType::Visual,
            Self::ProblemSolving => LearningType::Kinesthetic,
            Self::AudioVisual => LearningType::Auditory,
            Self::ReadingWriting => LearningType::ReadingWriting,
        }
    }
}

// ==================== ActivityResult ====================

/// Fields shared by every activity result variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultCommon {
    pub activity_id: String,
    pub user_id: String,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    /// `end_time_ms - start_time_ms`.
    pub completion_time_ms: i64,
    /// When the result was handed off for persistence. Provisionally the end
    /// time at construction; re-stamped at the persistence handoff.
    pub timestamp_ms: i64,
}

impl ResultCommon {
    pub fn new(user_id: &str, start_time_ms: i64, end_time_ms: i64) -> Self {
        Self {
            activity_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            start_time_ms,
            end_time_ms,
            completion_time_ms: end_time_ms - start_time_ms,
            timestamp_ms: end_time_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryChallengeResult {
    #[serde(flatten)]
    pub common: ResultCommon,
    /// Aggregate true positives over aggregate shown items, 0-100.
    pub recall_accuracy: f64,
    /// Mean recall-phase duration across rounds, milliseconds.
    pub response_time_ms: f64,
    /// 0-10, scales with per-round accuracy.
    pub engagement_level: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub visual_elements_recalled: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSolvingResult {
    #[serde(flatten)]
    pub common: ResultCommon,
    pub interaction_count: u32,
    pub steps_to_complete: u32,
    /// `max(1, 100 - steps)` when every puzzle finished, else 0.
    pub efficiency: f64,
    pub drag_drop_actions: u32,
    pub click_actions: u32,
    pub task_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioVisualResult {
    #[serde(flatten)]
    pub common: ResultCommon,
    /// 0-10 step function of toggle frequency.
    pub audio_preference: f64,
    pub answer_accuracy: f64,
    pub time_listening_ms: i64,
    pub time_viewing_ms: i64,
    /// Final toggle state.
    pub video_muted: bool,
    /// listening / (listening + viewing), 0-1.
    pub audio_focus_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingWritingResult {
    #[serde(flatten)]
    pub common: ResultCommon,
    /// Words per minute over the reading phase.
    pub reading_speed: f64,
    /// Selections + highlights + note edits.
    pub text_interactions: u32,
    pub response_accuracy: f64,
    /// 0-10: length tier plus keyword coverage.
    pub summary_quality: f64,
    pub words_written: u32,
    pub time_spent_reading_ms: i64,
}

/// Tagged union of activity outcomes, keyed by `activityType` on the wire so
/// the scoring aggregator can pattern-match exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "activityType", rename_all = "camelCase")]
pub enum ActivityResult {
    MemoryChallenge(MemoryChallengeResult),
    ProblemSolving(ProblemSolvingResult),
    AudioVisual(AudioVisualResult),
    ReadingWriting(ReadingWritingResult),
}

impl ActivityResult {
    pub fn activity_type(&self) -> ActivityType {
        match self {
            Self::MemoryChallenge(_) => ActivityType::MemoryChallenge,
            Self::ProblemSolving(_) => ActivityType::ProblemSolving,
            Self::AudioVisual(_) => ActivityType::AudioVisual,
            Self::ReadingWriting(_) => ActivityType::ReadingWriting,
        }
    }

    pub fn common(&self) -> &ResultCommon {
        match self {
            Self::MemoryChallenge(r) => &r.common,
            Self::ProblemSolving(r) => &r.common,
            Self::AudioVisual(r) => &r.common,
            Self::ReadingWriting(r) => &r.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut ResultCommon {
        match self {
            Self::MemoryChallenge(r) => &mut r.common,
            Self::ProblemSolving(r) => &mut r.common,
            Self::AudioVisual(r) => &mut r.common,
            Self::ReadingWriting(r) => &mut r.common,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.common().user_id
    }
}

// ==================== LearningTypeScores ====================

/// Accumulated per-modality scores. Keys are fixed; values never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LearningTypeScores {
    pub visual: f64,
    pub auditory: f64,
    pub kinesthetic: f64,
    pub reading_writing: f64,
}

impl LearningTypeScores {
    pub fn get(&self, ty: LearningType) -> f64 {
        match ty {
            LearningType::Visual => self.visual,
            LearningType::Auditory => self.auditory,
            LearningType::Kinesthetic => self.kinesthetic,
            LearningType::ReadingWriting => self.reading_writing,
            LearningType::Undetermined => 0.0,
        }
    }

    pub fn add(&mut self, ty: LearningType, amount: f64) {
        match ty {
            LearningType::Visual => self.visual += amount,
            LearningType::Auditory => self.auditory += amount,
            LearningType::Kinesthetic => self.kinesthetic += amount,
            LearningType::ReadingWriting => self.reading_writing += amount,
            LearningType::Undetermined => {}
        }
    }

    /// Element-wise `self += other`.
    pub fn add_all(&mut self, other: &LearningTypeScores) {
        self.visual += other.visual;
        self.auditory += other.auditory;
        self.kinesthetic += other.kinesthetic;
        self.reading_writing += other.reading_writing;
    }

    /// Element-wise `self -= other`, floored at zero to preserve the
    /// non-negativity invariant against float drift.
    pub fn saturating_sub_all(&mut self, other: &LearningTypeScores) {
        self.visual = (self.visual - other.visual).max(0.0);
        self.auditory = (self.auditory - other.auditory).max(0.0);
        self.kinesthetic = (self.kinesthetic - other.kinesthetic).max(0.0);
        self.reading_writing = (self.reading_writing - other.reading_writing).max(0.0);
    }

    pub fn total(&self) -> f64 {
        self.visual + self.auditory + self.kinesthetic + self.reading_writing
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0.0
    }

    /// Scores rescaled to sum to 1. All-zero vectors come back unchanged.
    pub fn normalized(&self) -> LearningTypeScores {
        let total = self.total();
        if total <= 0.0 {
            return *self;
        }
        LearningTypeScores {
            visual: self.visual / total,
            auditory: self.auditory / total,
            kinesthetic: self.kinesthetic / total,
            reading_writing: self.reading_writing / total,
        }
    }

    /// Variance of the normalized shares around the uniform 0.25.
    pub fn variance(&self) -> f64 {
        let n = self.normalized();
        let mean = 0.25;
        ((n.visual - mean).powi(2)
            + (n.auditory - mean).powi(2)
            + (n.kinesthetic - mean).powi(2)
            + (n.reading_writing - mean).powi(2))
            / 4.0
    }

    /// Near-uniform score vectors indicate no single dominant modality.
    pub fn is_multimodal(&self) -> bool {
        !self.is_zero() && self.variance() < 0.01
    }
}

// ==================== UserLearningProfile ====================

/// Durable per-user record of scores, classification, and completion state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLearningProfile {
    pub user_id: String,
    pub learning_type_scores: LearningTypeScores,
    pub primary_learning_type: LearningType,
    /// Normalized margin between top and runner-up modality, 0-1. Advisory
    /// until `assessment_complete`.
    pub confidence: f64,
    pub activities_completed: BTreeSet<ActivityType>,
    /// Last scored contribution per activity type. Persisted with the profile
    /// so a resumed session can replace a stale contribution instead of
    /// stacking a new one on top of it.
    #[serde(default)]
    pub score_contributions: BTreeMap<ActivityType, LearningTypeScores>,
    pub total_activities: u32,
    /// Derived: true iff all four distinct activity types are completed.
    pub assessment_complete: bool,
    pub last_updated_ms: i64,
}

impl UserLearningProfile {
    /// Fresh profile: all scores zero, nothing completed, undetermined type.
    pub fn new(user_id: &str, now_ms: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            learning_type_scores: LearningTypeScores::default(),
            primary_learning_type: LearningType::Undetermined,
            confidence: 0.0,
            activities_completed: BTreeSet::new(),
            score_contributions: BTreeMap::new(),
            total_activities: TOTAL_ACTIVITIES,
            assessment_complete: false,
            last_updated_ms: now_ms,
        }
    }

    /// Re-derive `assessment_complete` from the completion-count rule. The
    /// flag is never set independently of this.
    pub fn refresh_completion(&mut self) {
        self.assessment_complete =
            self.activities_completed.len() as u32 == self.total_activities;
    }

    pub fn progress_percent(&self) -> f64 {
        100.0 * self.activities_completed.len() as f64 / self.total_activities as f64
    }

    /// Retake: clear scores, completions, and classification; keep `user_id`.
    pub fn reset(&mut self, now_ms: i64) {
        self.learning_type_scores = LearningTypeScores::default();
        self.primary_learning_type = LearningType::Undetermined;
        self.confidence = 0.0;
        self.activities_completed.clear();
        self.score_contributions.clear();
        self.assessment_complete = false;
        self.last_updated_ms = now_ms;
    }
}
