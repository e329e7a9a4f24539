//! Classifier: reduces the accumulated score vector to a primary learning
//! type plus a confidence margin.

use serde::{Deserialize, Serialize};

use crate::config::ClassifierParams;
use crate::types::{LearningType, LearningTypeScores};

/// Fixed tie-break order when several modalities share the top score.
const PRIORITY: [LearningType; 4] = [
    LearningType::Visual,
    LearningType::Auditory,
    LearningType::Kinesthetic,
    LearningType::ReadingWriting,
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub primary: LearningType,
    /// Normalized margin between top and runner-up score, clamped to [0, 1].
    pub confidence: f64,
    /// True when the normalized score shares are near uniform.
    pub multimodal: bool,
}

impl Classification {
    pub fn undetermined() -> Self {
        Self {
            primary: LearningType::Undetermined,
            confidence: 0.0,
            multimodal: false,
        }
    }
}

/// `argmax` with fixed priority tie-break; confidence is the top-two margin
/// relative to the top score. An all-zero vector classifies as undetermined.
pub fn classify(params: &ClassifierParams, scores: &LearningTypeScores) -> Classification {
    let mut primary = LearningType::Undetermined;
    let mut top = 0.0f64;
    for ty in PRIORITY {
        let value = scores.get(ty);
        if value > top {
            top = value;
            primary = ty;
        }
    }

    if primary == LearningType::Undetermined {
        return Classification::undetermined();
    }

    let second = PRIORITY
        .iter()
        .filter(|ty| **ty != primary)
        .map(|ty| scores.get(*ty))
        .fold(0.0f64, f64::max);

    let confidence = ((top - second) / top.max(params.epsilon)).clamp(0.0, 1.0);

    Classification {
        primary,
        confidence,
        multimodal: scores.is_multimodal(),
    }
}
