//! Scoring aggregator: maps activity results onto per-modality score
//! contributions and folds them into the running score vector.
//!
//! Everything here is pure. Idempotence across re-completions is achieved by
//! keeping the previous contribution per activity type and replacing it
//! (subtract old, add new) rather than accumulating.

use crate::config::ScoringParams;
use crate::types::{ActivityResult, LearningType, LearningTypeScores};

/// Per-modality contribution of a single activity result, on the 0-10 scale.
pub fn contribution(params: &ScoringParams, result: &ActivityResult) -> LearningTypeScores {
    let mut delta = LearningTypeScores::default();

    match result {
        ActivityResult::MemoryChallenge(r) => {
            delta.add(
                LearningType::Visual,
                (r.recall_accuracy / params.accuracy_divisor).max(0.0),
            );
        }
        ActivityResult::ProblemSolving(r) => {
            delta.add(
                LearningType::Kinesthetic,
                (r.efficiency / params.accuracy_divisor).max(0.0),
            );
        }
        ActivityResult::AudioVisual(r) => {
            // Split between auditory and visual by focus ratio, then scale by
            // comprehension accuracy so an inattentive run scores low on both.
            let ratio = r.audio_focus_ratio.clamp(0.0, 1.0);
            let accuracy_scale = (r.answer_accuracy / 100.0).clamp(0.0, 1.0);
            delta.add(
                LearningType::Auditory,
                ratio * params.audio_split_scale * accuracy_scale,
            );
            delta.add(
                LearningType::Visual,
                (1.0 - ratio) * params.audio_split_scale * accuracy_scale,
            );
        }
        ActivityResult::ReadingWriting(r) => {
            let speed_points = normalized_reading_speed(params, r.reading_speed);
            let quality_points = r.summary_quality.clamp(0.0, 10.0);
            let accuracy_points = (r.response_accuracy / params.accuracy_divisor).clamp(0.0, 10.0);
            delta.add(
                LearningType::ReadingWriting,
                (speed_points + quality_points + accuracy_points) / 3.0,
            );
        }
    }

    delta
}

/// Reading speed mapped linearly onto 0-10, saturating at the configured
/// full-marks speed.
pub fn normalized_reading_speed(params: &ScoringParams, words_per_minute: f64) -> f64 {
    if params.reading_speed_full_marks <= 0.0 {
        return 0.0;
    }
    (words_per_minute.max(0.0) / params.reading_speed_full_marks * 10.0).min(10.0)
}

/// Fold a new contribution into the score vector, replacing the previous
/// contribution for the same activity type when one exists.
pub fn replace_contribution(
    scores: &mut LearningTypeScores,
    previous: Option<&LearningTypeScores>,
    new: &LearningTypeScores,
) {
    if let Some(old) = previous {
        scores.saturating_sub_all(old);
    }
    scores.add_all(new);
}
