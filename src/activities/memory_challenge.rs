//! Memory challenge: three escalating recall rounds probing visual memory.
//!
//! Round `n` shows `base_items + n` items for a fixed study window; the user
//! then picks the shown items out of a grid padded with distractors. Accuracy
//! is true positives over items shown, aggregated across rounds.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;

use crate::activities::ActivityEvent;
use crate::config::MemoryChallengeParams;
use crate::error::{AssessmentError, AssessmentResult};
use crate::types::{ActivityResult, MemoryChallengeResult, ResultCommon};

/// Pool the per-round item sets are drawn from. Large enough for the biggest
/// round plus its distractors.
const ITEM_POOL: [&str; 16] = [
    "sun", "tree", "house", "car", "fish", "star", "cloud", "flower", "book", "clock", "apple",
    "moon", "bridge", "candle", "guitar", "mountain",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Intro,
    Study,
    Recall,
    Done,
}

pub struct MemoryChallenge {
    params: MemoryChallengeParams,
    user_id: String,
    started_at_ms: i64,
    phase: Phase,
    /// 1-based current round.
    round: u32,
    shown: Vec<String>,
    grid: Vec<String>,
    selected: BTreeSet<String>,
    study_started_ms: i64,
    recall_started_ms: i64,
    total_shown: u32,
    total_correct: u32,
    round_accuracies: Vec<f64>,
    recall_times_ms: Vec<i64>,
}

impl MemoryChallenge {
    pub fn new(params: MemoryChallengeParams, user_id: &str, now_ms: i64) -> Self {
        Self {
            params,
            user_id: user_id.to_string(),
            started_at_ms: now_ms,
            phase: Phase::Intro,
            round: 0,
            shown: Vec::new(),
            grid: Vec::new(),
            selected: BTreeSet::new(),
            study_started_ms: 0,
            recall_started_ms: 0,
            total_shown: 0,
            total_correct: 0,
            round_accuracies: Vec::new(),
            recall_times_ms: Vec::new(),
        }
    }

    /// Items currently on display (study phase) or to be recalled.
    pub fn shown_items(&self) -> &[String] {
        &self.shown
    }

    /// Recall grid: shown items mixed with distractors.
    pub fn recall_grid(&self) -> &[String] {
        &self.grid
    }

    pub fn current_round(&self) -> u32 {
        self.round
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn handle(
        &mut self,
        event: &ActivityEvent,
        now_ms: i64,
    ) -> AssessmentResult<Option<ActivityResult>> {
        match event {
            ActivityEvent::BeginStudy => {
                if self.phase != Phase::Intro {
                    return Err(AssessmentError::EventNotApplicable(
                        "study already started",
                    ));
                }
                self.start_round(now_ms);
                Ok(None)
            }
            ActivityEvent::Tick => {
                if self.phase == Phase::Study
                    && now_ms - self.study_started_ms >= self.params.study_window_ms
                {
                    self.begin_recall(now_ms);
                }
                Ok(None)
            }
            ActivityEvent::ToggleSelection(item) => {
                if self.phase != Phase::Recall {
                    return Err(AssessmentError::EventNotApplicable(
                        "selection only allowed during recall",
                    ));
                }
                if !self.grid.iter().any(|g| g == item) {
                    return Err(AssessmentError::EventNotApplicable(
                        "item is not on the recall grid",
                    ));
                }
                if !self.selected.remove(item) {
                    self.selected.insert(item.clone());
                }
                Ok(None)
            }
            ActivityEvent::SubmitRound => self.submit_round(now_ms),
            _ => Err(AssessmentError::EventNotApplicable(
                "event is not part of the memory challenge",
            )),
        }
    }

    fn start_round(&mut self, now_ms: i64) {
        self.round += 1;
        let item_count = (self.params.base_items + self.round) as usize;

        let mut rng = rand::rng();
        let mut pool: Vec<&str> = ITEM_POOL.to_vec();
        pool.shuffle(&mut rng);

        self.shown = pool
            .iter()
            .take(item_count)
            .map(|s| s.to_string())
            .collect();
        self.grid = pool
            .iter()
            .take(item_count + self.params.distractors_per_round as usize)
            .map(|s| s.to_string())
            .collect();
        self.grid.shuffle(&mut rng);

        self.selected.clear();
        self.study_started_ms = now_ms;
        self.phase = Phase::Study;
    }

    fn begin_recall(&mut self, now_ms: i64) {
        self.recall_started_ms = now_ms;
        self.phase = Phase::Recall;
    }

    fn submit_round(&mut self, now_ms: i64) -> AssessmentResult<Option<ActivityResult>> {
        if self.phase != Phase::Recall {
            return Err(AssessmentError::ActivityIncomplete(
                "study window has not expired yet",
            ));
        }

        let shown_count = self.shown.len() as u32;
        let correct = self
            .selected
            .iter()
            .filter(|item| self.shown.contains(item))
            .count() as u32;

        self.total_shown += shown_count;
        self.total_correct += correct;
        self.round_accuracies
            .push(correct as f64 / shown_count.max(1) as f64);
        self.recall_times_ms
            .push((now_ms - self.recall_started_ms).max(0));

        if self.round < self.params.rounds {
            self.start_round(now_ms);
            return Ok(None);
        }

        self.phase = Phase::Done;
        Ok(Some(self.finish(now_ms)))
    }

    fn finish(&self, now_ms: i64) -> ActivityResult {
        let recall_accuracy = if self.total_shown > 0 {
            self.total_correct as f64 / self.total_shown as f64 * 100.0
        } else {
            0.0
        };
        let mean_round_accuracy = if self.round_accuracies.is_empty() {
            0.0
        } else {
            self.round_accuracies.iter().sum::<f64>() / self.round_accuracies.len() as f64
        };
        let response_time_ms = if self.recall_times_ms.is_empty() {
            0.0
        } else {
            self.recall_times_ms.iter().sum::<i64>() as f64 / self.recall_times_ms.len() as f64
        };

        ActivityResult::MemoryChallenge(MemoryChallengeResult {
            common: ResultCommon::new(&self.user_id, self.started_at_ms, now_ms),
            recall_accuracy,
            response_time_ms,
            engagement_level: (mean_round_accuracy * 10.0).clamp(0.0, 10.0),
            correct_answers: self.total_correct,
            total_questions: self.total_shown,
            visual_elements_recalled: self.total_correct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MemoryChallengeParams {
        MemoryChallengeParams::default()
    }

    /// Drive one round: expire the study window, select the given fraction of
    /// shown items correctly, submit.
    fn play_round(
        activity: &mut MemoryChallenge,
        now_ms: &mut i64,
        correct_fraction: f64,
    ) -> Option<ActivityResult> {
        *now_ms += activity.params.study_window_ms;
        activity.handle(&ActivityEvent::Tick, *now_ms).unwrap();

        let shown: Vec<String> = activity.shown_items().to_vec();
        let take = (shown.len() as f64 * correct_fraction).round() as usize;
        for item in shown.iter().take(take) {
            activity
                .handle(&ActivityEvent::ToggleSelection(item.clone()), *now_ms)
                .unwrap();
        }

        *now_ms += 2_000;
        activity
            .handle(&ActivityEvent::SubmitRound, *now_ms)
            .unwrap()
    }

    #[test]
    fn rounds_escalate_item_counts() {
        let mut activity = MemoryChallenge::new(params(), "u1", 0);
        let mut now = 0i64;
        activity.handle(&ActivityEvent::BeginStudy, now).unwrap();
        assert_eq!(activity.shown_items().len(), 5);

        assert!(play_round(&mut activity, &mut now, 1.0).is_none());
        assert_eq!(activity.shown_items().len(), 6);

        assert!(play_round(&mut activity, &mut now, 1.0).is_none());
        assert_eq!(activity.shown_items().len(), 7);
    }

    #[test]
    fn perfect_recall_scores_full_accuracy() {
        let mut activity = MemoryChallenge::new(params(), "u1", 0);
        let mut now = 0i64;
        activity.handle(&ActivityEvent::BeginStudy, now).unwrap();

        play_round(&mut activity, &mut now, 1.0);
        play_round(&mut activity, &mut now, 1.0);
        let result = play_round(&mut activity, &mut now, 1.0).expect("final round emits result");

        match result {
            ActivityResult::MemoryChallenge(r) => {
                assert_eq!(r.recall_accuracy, 100.0);
                assert_eq!(r.engagement_level, 10.0);
                assert_eq!(r.total_questions, 18);
                assert_eq!(r.correct_answers, 18);
                assert_eq!(r.visual_elements_recalled, 18);
                assert_eq!(r.response_time_ms, 2_000.0);
                assert_eq!(r.common.completion_time_ms, now);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn selecting_nothing_scores_zero() {
        let mut activity = MemoryChallenge::new(params(), "u1", 0);
        let mut now = 0i64;
        activity.handle(&ActivityEvent::BeginStudy, now).unwrap();

        play_round(&mut activity, &mut now, 0.0);
        play_round(&mut activity, &mut now, 0.0);
        let result = play_round(&mut activity, &mut now, 0.0).unwrap();

        match result {
            ActivityResult::MemoryChallenge(r) => {
                assert_eq!(r.recall_accuracy, 0.0);
                assert_eq!(r.engagement_level, 0.0);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn submit_before_study_window_expires_is_rejected() {
        let mut activity = MemoryChallenge::new(params(), "u1", 0);
        activity.handle(&ActivityEvent::BeginStudy, 0).unwrap();

        // Window not expired: tick does not move to recall, submit fails.
        activity.handle(&ActivityEvent::Tick, 1_000).unwrap();
        let err = activity
            .handle(&ActivityEvent::SubmitRound, 1_000)
            .unwrap_err();
        assert!(matches!(err, AssessmentError::ActivityIncomplete(_)));
    }

    #[test]
    fn toggle_deselects_on_second_press() {
        let mut activity = MemoryChallenge::new(params(), "u1", 0);
        let mut now = 0i64;
        activity.handle(&ActivityEvent::BeginStudy, now).unwrap();
        now += activity.params.study_window_ms;
        activity.handle(&ActivityEvent::Tick, now).unwrap();

        let item = activity.shown_items()[0].clone();
        activity
            .handle(&ActivityEvent::ToggleSelection(item.clone()), now)
            .unwrap();
        activity
            .handle(&ActivityEvent::ToggleSelection(item), now)
            .unwrap();

        play_round(&mut activity, &mut now, 0.0);
        play_round(&mut activity, &mut now, 0.0);
        // Round 1 selections were toggled off, so nothing counted.
        assert_eq!(activity.total_correct, 0);
    }

    #[test]
    fn grid_contains_distractors() {
        let mut activity = MemoryChallenge::new(params(), "u1", 0);
        activity.handle(&ActivityEvent::BeginStudy, 0).unwrap();
        activity
            .handle(&ActivityEvent::Tick, params().study_window_ms)
            .unwrap();
        assert_eq!(
            activity.recall_grid().len(),
            activity.shown_items().len() + params().distractors_per_round as usize
        );
    }
}
