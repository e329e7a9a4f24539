//! Assessment configuration.
//!
//! All numeric constants that shape scoring and classification are tunables
//! with sensible defaults, not reverse-engineered ground truth. Everything is
//! serializable so a config snapshot can be logged or persisted.

use serde::{Deserialize, Serialize};

/// Scoring aggregator tunables (see `scoring.rs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Divisor mapping 0-100 accuracy metrics onto the 0-10 score scale.
    pub accuracy_divisor: f64,
    /// Magnitude distributed between auditory and visual by the audio focus
    /// ratio before accuracy scaling.
    pub audio_split_scale: f64,
    /// Reading speed (words per minute) that earns the full 10-point reading
    /// contribution; slower reads earn a linear fraction.
    pub reading_speed_full_marks: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            accuracy_divisor: 10.0,
            audio_split_scale: 10.0,
            reading_speed_full_marks: 250.0,
        }
    }
}

/// Classifier tunables (see `classifier.rs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierParams {
    /// Floor for the confidence denominator.
    pub epsilon: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self { epsilon: 1e-6 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryChallengeParams {
    pub rounds: u32,
    /// Round `n` (1-based) shows `base_items + n` items.
    pub base_items: u32,
    /// How long the item grid stays visible per round.
    pub study_window_ms: i64,
    /// Distractors mixed into each recall grid.
    pub distractors_per_round: u32,
}

impl Default for MemoryChallengeParams {
    fn default() -> Self {
        Self {
            rounds: 3,
            base_items: 4,
            study_window_ms: 5_000,
            distractors_per_round: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemSolvingParams {
    /// Piece counts for the successive puzzles.
    pub puzzle_sizes: Vec<u32>,
}

impl Default for ProblemSolvingParams {
    fn default() -> Self {
        Self {
            puzzle_sizes: vec![3, 4, 5],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioVisualParams {
    pub segments: u32,
    pub questions: u32,
    /// Toggle counts above these thresholds map to audio preference 8 and 5;
    /// anything else maps to 2.
    pub high_toggle_threshold: u32,
    pub low_toggle_threshold: u32,
    /// Accrual granularity for the watch/listen counters.
    pub tick_interval_ms: u64,
}

impl Default for AudioVisualParams {
    fn default() -> Self {
        Self {
            segments: 3,
            questions: 4,
            high_toggle_threshold: 2,
            low_toggle_threshold: 0,
            tick_interval_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingWritingParams {
    pub questions: u32,
    /// Selections at or below this length are ignored as accidental.
    pub min_highlight_len: usize,
    /// Summary word-count tiers worth 3/2/1 points.
    pub summary_tier_words: [u32; 3],
    /// Points available from keyword coverage, linear in fraction present.
    pub keyword_points: f64,
}

impl Default for ReadingWritingParams {
    fn default() -> Self {
        Self {
            questions: 4,
            min_highlight_len: 5,
            summary_tier_words: [50, 25, 10],
            keyword_points: 7.0,
        }
    }
}

/// Logging knobs consumed by `logging::init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingParams {
    /// `EnvFilter` directive, e.g. `info` or `vark_assessment=debug`.
    pub level: String,
    /// When true a daily-rolling file layer is added next to stdout.
    pub file_output: bool,
    pub log_dir: String,
}

impl Default for LoggingParams {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_output: false,
            log_dir: "./logs".to_string(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssessmentConfig {
    pub scoring: ScoringParams,
    pub classifier: ClassifierParams,
    pub memory_challenge: MemoryChallengeParams,
    pub problem_solving: ProblemSolvingParams,
    pub audio_visual: AudioVisualParams,
    pub reading_writing: ReadingWritingParams,
    pub logging: LoggingParams,
}

/// `true`/`1` toggles, anything else is off.
pub(crate) fn flag_enabled(value: &str) -> bool {
    value == "true" || value == "1"
}

impl AssessmentConfig {
    /// Defaults with environment overrides for the externally tunable knobs.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ASSESSMENT_READING_SPEED_FULL_MARKS") {
            if let Ok(parsed) = val.parse::<f64>() {
                if parsed > 0.0 {
                    config.scoring.reading_speed_full_marks = parsed;
                }
            }
        }
        if let Ok(val) = std::env::var("ASSESSMENT_CLASSIFIER_EPSILON") {
            if let Ok(parsed) = val.parse::<f64>() {
                if parsed > 0.0 {
                    config.classifier.epsilon = parsed;
                }
            }
        }
        if let Ok(val) = std::env::var("ASSESSMENT_STUDY_WINDOW_MS") {
            if let Ok(parsed) = val.parse::<i64>() {
                if parsed > 0 {
                    config.memory_challenge.study_window_ms = parsed;
                }
            }
        }
        if let Ok(val) = std::env::var("ASSESSMENT_LOG_LEVEL") {
            if !val.is_empty() {
                config.logging.level = val;
            }
        }
        if let Ok(val) = std::env::var("ASSESSMENT_FILE_LOGS") {
            config.logging.file_output = flag_enabled(&val);
        }
        if let Ok(val) = std::env::var("ASSESSMENT_LOG_DIR") {
            if !val.is_empty() {
                config.logging.log_dir = val;
            }
        }

        config
    }
}
