//! Audio-visual activity: content segments toggleable between video and
//! audio-only playback, followed by comprehension questions.
//!
//! Watch/listen time accrues once per tick depending on the current mode;
//! toggle frequency drives the audio preference signal.

use crate::activities::ActivityEvent;
use crate::config::AudioVisualParams;
use crate::error::{AssessmentError, AssessmentResult};
use crate::types::{ActivityResult, AudioVisualResult, ResultCommon};

pub struct Question {
    pub prompt: &'static str,
    pub choices: &'static [&'static str],
    correct: usize,
}

/// Comprehension questions over the three content segments.
const QUESTIONS: [Question; 4] = [
    Question {
        prompt: "What does the hippocampus consolidate during sleep?",
        choices: &["Muscle memory", "New memories", "Vocabulary only", "Nothing"],
        correct: 1,
    },
    Question {
        prompt: "Which practice schedule improves long-term retention most?",
        choices: &["Massed", "Random", "Spaced", "None"],
        correct: 2,
    },
    Question {
        prompt: "What effect does retrieval practice have?",
        choices: &[
            "Weakens memories",
            "Strengthens memories",
            "No effect",
            "Only helps recognition",
        ],
        correct: 1,
    },
    Question {
        prompt: "Feedback is most useful when it is…",
        choices: &["Delayed by weeks", "Vague", "Immediate and specific", "Avoided"],
        correct: 2,
    },
];

const SEGMENT_TITLES: [&str; 3] = [
    "How memories form",
    "The spacing effect",
    "Retrieval and feedback",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Content,
    Questions,
    Done,
}

pub struct AudioVisualSession {
    params: AudioVisualParams,
    user_id: String,
    started_at_ms: i64,
    phase: Phase,
    segment: u32,
    /// True while the segment plays audio-only.
    audio_mode: bool,
    time_listening_ms: i64,
    time_viewing_ms: i64,
    toggle_count: u32,
    answers: Vec<Option<usize>>,
}

impl AudioVisualSession {
    pub fn new(params: AudioVisualParams, user_id: &str, now_ms: i64) -> Self {
        let questions = params.questions as usize;
        Self {
            params,
            user_id: user_id.to_string(),
            started_at_ms: now_ms,
            phase: Phase::Content,
            segment: 0,
            audio_mode: false,
            time_listening_ms: 0,
            time_viewing_ms: 0,
            toggle_count: 0,
            answers: vec![None; questions],
        }
    }

    pub fn current_segment_title(&self) -> &'static str {
        SEGMENT_TITLES[(self.segment as usize).min(SEGMENT_TITLES.len() - 1)]
    }

    pub fn questions(&self) -> &'static [Question] {
        &QUESTIONS
    }

    pub fn in_questions(&self) -> bool {
        self.phase == Phase::Questions
    }

    pub fn all_answered(&self) -> bool {
        self.answers.iter().all(Option::is_some)
    }

    pub fn handle(
        &mut self,
        event: &ActivityEvent,
        now_ms: i64,
    ) -> AssessmentResult<Option<ActivityResult>> {
        match event {
            ActivityEvent::Tick => {
                if self.phase == Phase::Content {
                    let step = self.params.tick_interval_ms as i64;
                    if self.audio_mode {
                        self.time_listening_ms += step;
                    } else {
                        self.time_viewing_ms += step;
                    }
                }
                Ok(None)
            }
            ActivityEvent::ToggleAudio => {
                if self.phase != Phase::Content {
                    return Err(AssessmentError::EventNotApplicable(
                        "content playback is over",
                    ));
                }
                self.audio_mode = !self.audio_mode;
                self.toggle_count += 1;
                Ok(None)
            }
            ActivityEvent::NextSegment => {
                if self.phase != Phase::Content {
                    return Err(AssessmentError::EventNotApplicable(
                        "content playback is over",
                    ));
                }
                self.segment += 1;
                if self.segment >= self.params.segments {
                    self.phase = Phase::Questions;
                }
                Ok(None)
            }
            ActivityEvent::Answer { index, choice } => {
                if self.phase != Phase::Questions {
                    return Err(AssessmentError::EventNotApplicable(
                        "questions are not open yet",
                    ));
                }
                if *index >= self.answers.len() {
                    return Err(AssessmentError::AnswerOutOfRange {
                        index: *index,
                        total: self.answers.len(),
                    });
                }
                self.answers[*index] = Some(*choice);
                Ok(None)
            }
            ActivityEvent::Submit => self.submit(now_ms),
            _ => Err(AssessmentError::EventNotApplicable(
                "event is not part of the audio-visual activity",
            )),
        }
    }

    fn submit(&mut self, now_ms: i64) -> AssessmentResult<Option<ActivityResult>> {
        if self.phase != Phase::Questions || !self.all_answered() {
            return Err(AssessmentError::ActivityIncomplete(
                "all questions must be answered before submitting",
            ));
        }

        let correct = self
            .answers
            .iter()
            .zip(QUESTIONS.iter())
            .filter(|(answer, q)| **answer == Some(q.correct))
            .count();
        let answer_accuracy = correct as f64 / self.answers.len().max(1) as f64 * 100.0;

        // Step function of toggle frequency.
        let audio_preference = if self.toggle_count > self.params.high_toggle_threshold {
            8.0
        } else if self.toggle_count > self.params.low_toggle_threshold {
            5.0
        } else {
            2.0
        };

        let tracked = self.time_listening_ms + self.time_viewing_ms;
        let audio_focus_ratio = if tracked > 0 {
            self.time_listening_ms as f64 / tracked as f64
        } else {
            0.0
        };

        self.phase = Phase::Done;
        Ok(Some(ActivityResult::AudioVisual(AudioVisualResult {
            common: ResultCommon::new(&self.user_id, self.started_at_ms, now_ms),
            audio_preference,
            answer_accuracy,
            time_listening_ms: self.time_listening_ms,
            time_viewing_ms: self.time_viewing_ms,
            video_muted: self.audio_mode,
            audio_focus_ratio,
        })))
    }
}
