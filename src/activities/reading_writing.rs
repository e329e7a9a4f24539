//! Reading/writing activity: a fixed article read under free time, text
//! highlighting, a free-form summary, and comprehension questions.

use std::collections::BTreeSet;

use crate::activities::ActivityEvent;
use crate::config::ReadingWritingParams;
use crate::error::{AssessmentError, AssessmentResult};
use crate::types::{ActivityResult, ReadingWritingResult, ResultCommon};

/// The article every user reads. Word count drives the reading-speed metric.
pub const ARTICLE: &str = "\
Learning is not a single skill but a collection of habits that compound over \
time. Research on memory shows that attention is the gatekeeper: material that \
is never attended to is never encoded, no matter how long a learner stares at \
the page. Once encoded, memories strengthen through retrieval, the act of \
pulling an idea back out of storage rather than re-reading it. Each successful \
retrieval makes the next one easier, which is why testing yourself beats \
highlighting alone. Spacing matters just as much. Cramming concentrates \
practice into a single burst, and the resulting knowledge evaporates within \
days. Distributing the same amount of practice across a week or a month \
produces slower gains that last far longer, an effect replicated across \
hundreds of studies. Feedback closes the loop. A learner who answers and never \
discovers whether the answer was right practices errors as readily as truths. \
Immediate, specific feedback converts mistakes into information. Finally, \
deliberate practice targets weaknesses instead of rehearsing comfortable \
strengths. Combining focused attention, spaced retrieval, honest feedback, and \
deliberate practice turns ordinary study time into durable learning.";

/// Keywords a good summary should touch; coverage feeds summary quality.
const KEYWORDS: [&str; 7] = [
    "attention",
    "retrieval",
    "spacing",
    "practice",
    "feedback",
    "memory",
    "learning",
];

pub struct Question {
    pub prompt: &'static str,
    pub choices: &'static [&'static str],
    correct: usize,
}

const QUESTIONS: [Question; 4] = [
    Question {
        prompt: "According to the article, what is the gatekeeper of encoding?",
        choices: &["Repetition", "Attention", "Sleep", "Motivation"],
        correct: 1,
    },
    Question {
        prompt: "Which study habit beats highlighting alone?",
        choices: &["Re-reading", "Copying notes", "Testing yourself", "Skimming"],
        correct: 2,
    },
    Question {
        prompt: "What happens to crammed knowledge?",
        choices: &[
            "It lasts for years",
            "It evaporates within days",
            "It improves with stress",
            "It transfers to new domains",
        ],
        correct: 1,
    },
    Question {
        prompt: "Deliberate practice targets…",
        choices: &["Strengths", "Weaknesses", "Speed", "Comfort"],
        correct: 1,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Reading,
    Response,
    Done,
}

pub struct ReadingWritingSession {
    params: ReadingWritingParams,
    user_id: String,
    started_at_ms: i64,
    phase: Phase,
    reading_finished_ms: i64,
    selection_events: u32,
    highlights: BTreeSet<String>,
    note_edits: u32,
    summary: String,
    answers: Vec<Option<usize>>,
}

impl ReadingWritingSession {
    pub fn new(params: ReadingWritingParams, user_id: &str, now_ms: i64) -> Self {
        let questions = params.questions as usize;
        Self {
            params,
            user_id: user_id.to_string(),
            started_at_ms: now_ms,
            phase: Phase::Reading,
            reading_finished_ms: 0,
            selection_events: 0,
            highlights: BTreeSet::new(),
            note_edits: 0,
            summary: String::new(),
            answers: vec![None; questions],
        }
    }

    pub fn article(&self) -> &'static str {
        ARTICLE
    }

    pub fn questions(&self) -> &'static [Question] {
        &QUESTIONS
    }

    pub fn highlight_count(&self) -> usize {
        self.highlights.len()
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
            ActivityEvent::Tick => Ok(None),
            ActivityEvent::TextSelected(text) => {
                if self.phase == Phase::Done {
                    return Err(AssessmentError::EventNotApplicable("activity finished"));
                }
                self.selection_events += 1;
                // Short selections are treated as accidental; longer ones are
                // captured as highlights, deduplicated.
                if text.trim().len() > self.params.min_highlight_len {
                    self.highlights.insert(text.trim().to_string());
                }
                Ok(None)
            }
            ActivityEvent::NoteEdited => {
                if self.phase == Phase::Done {
                    return Err(AssessmentError::EventNotApplicable("activity finished"));
                }
                self.note_edits += 1;
                Ok(None)
            }
            ActivityEvent::FinishReading => {
                if self.phase != Phase::Reading {
                    return Err(AssessmentError::EventNotApplicable(
                        "reading already finished",
                    ));
                }
                self.reading_finished_ms = now_ms;
                self.phase = Phase::Response;
                Ok(None)
            }
            ActivityEvent::SummaryChanged(text) => {
                if self.phase != Phase::Response {
                    return Err(AssessmentError::EventNotApplicable(
                        "summary opens after reading",
                    ));
                }
                self.summary = text.clone();
                Ok(None)
            }
            ActivityEvent::Answer { index, choice } => {
                if self.phase != Phase::Response {
                    return Err(AssessmentError::EventNotApplicable(
                        "questions open after reading",
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
                "event is not part of the reading/writing activity",
            )),
        }
    }

    fn submit(&mut self, now_ms: i64) -> AssessmentResult<Option<ActivityResult>> {
        if self.phase != Phase::Response || !self.all_answered() {
            return Err(AssessmentError::ActivityIncomplete(
                "all questions must be answered before submitting",
            ));
        }

        let time_spent_reading_ms = (self.reading_finished_ms - self.started_at_ms).max(0);
        let article_words = ARTICLE.split_whitespace().count() as f64;
        let reading_minutes = time_spent_reading_ms as f64 / 60_000.0;
        let reading_speed = if reading_minutes > 0.0 {
            article_words / reading_minutes
        } else {
            0.0
        };

        let correct = self
            .answers
            .iter()
            .zip(QUESTIONS.iter())
            .filter(|(answer, q)| **answer == Some(q.correct))
            .count();
        let response_accuracy = correct as f64 / self.answers.len().max(1) as f64 * 100.0;

        let words_written = self.summary.split_whitespace().count() as u32;
        let summary_quality = self.summary_quality(words_written);

        let text_interactions =
            self.selection_events + self.highlights.len() as u32 + self.note_edits;

        self.phase = Phase::Done;
        Ok(Some(ActivityResult::ReadingWriting(ReadingWritingResult {
            common: ResultCommon::new(&self.user_id, self.started_at_ms, now_ms),
            reading_speed,
            text_interactions,
            response_accuracy,
            summary_quality,
            words_written,
            time_spent_reading_ms,
        })))
    }

    /// Length tier (3/2/1 points) plus linear keyword coverage, capped at 10.
    fn summary_quality(&self, words_written: u32) -> f64 {
        let [high, mid, low] = self.params.summary_tier_words;
        let length_points = if words_written >= high {
            3.0
        } else if words_written >= mid {
            2.0
        } else if words_written >= low {
            1.0
        } else {
            0.0
        };

        let lower = self.summary.to_lowercase();
        let covered = KEYWORDS.iter().filter(|k| lower.contains(**k)).count();
        let keyword_points =
            covered as f64 / KEYWORDS.len() as f64 * self.params.keyword_points;

        (length_points + keyword_points).min(10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_session() -> ReadingWritingSession {
        ReadingWritingSession::new(ReadingWritingParams::default(), "u1", 0)
    }

    fn answer_all_correct(session: &mut ReadingWritingSession, now_ms: i64) {
        for (i, q) in QUESTIONS.iter().enumerate() {
            session
                .handle(
                    &ActivityEvent::Answer {
                        index: i,
                        choice: q.correct,
                    },
                    now_ms,
                )
                .unwrap();
        }
    }

    #[test]
    fn reading_speed_from_elapsed_time() {
        let mut session = new_session();
        let article_words = ARTICLE.split_whitespace().count() as f64;
        // Finish reading after exactly one minute.
        session
            .handle(&ActivityEvent::FinishReading, 60_000)
            .unwrap();
        answer_all_correct(&mut session, 61_000);

        match session.handle(&ActivityEvent::Submit, 62_000).unwrap() {
            Some(ActivityResult::ReadingWriting(r)) => {
                assert!((r.reading_speed - article_words).abs() < 1e-9);
                assert_eq!(r.time_spent_reading_ms, 60_000);
                assert_eq!(r.response_accuracy, 100.0);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn short_selections_are_not_highlights() {
        let mut session = new_session();
        session
            .handle(&ActivityEvent::TextSelected("hi".into()), 0)
            .unwrap();
        session
            .handle(
                &ActivityEvent::TextSelected("spaced retrieval".into()),
                0,
            )
            .unwrap();
        // Duplicate highlight is deduplicated.
        session
            .handle(
                &ActivityEvent::TextSelected("spaced retrieval".into()),
                0,
            )
            .unwrap();

        assert_eq!(session.highlight_count(), 1);
        assert_eq!(session.selection_events, 3);
    }

    #[test]
    fn summary_quality_rewards_length_and_keywords() {
        let mut session = new_session();
        session.handle(&ActivityEvent::FinishReading, 60_000).unwrap();

        // 50+ words covering every keyword: 3 + 7 = 10, capped.
        let rich: String = "attention retrieval spacing practice feedback memory learning "
            .repeat(8);
        session
            .handle(&ActivityEvent::SummaryChanged(rich), 61_000)
            .unwrap();
        answer_all_correct(&mut session, 61_000);

        match session.handle(&ActivityEvent::Submit, 62_000).unwrap() {
            Some(ActivityResult::ReadingWriting(r)) => {
                assert_eq!(r.summary_quality, 10.0);
                assert_eq!(r.words_written, 56);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn empty_summary_scores_zero_quality() {
        let mut session = new_session();
        session.handle(&ActivityEvent::FinishReading, 60_000).unwrap();
        answer_all_correct(&mut session, 61_000);

        match session.handle(&ActivityEvent::Submit, 62_000).unwrap() {
            Some(ActivityResult::ReadingWriting(r)) => {
                assert_eq!(r.summary_quality, 0.0);
                assert_eq!(r.words_written, 0);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn mid_tier_summary_without_keywords() {
        let mut session = new_session();
        session.handle(&ActivityEvent::FinishReading, 60_000).unwrap();

        // 30 filler words, no keywords: tier 2 + 0 coverage.
        let summary = "word ".repeat(30);
        session
            .handle(&ActivityEvent::SummaryChanged(summary), 61_000)
            .unwrap();
        answer_all_correct(&mut session, 61_000);

        match session.handle(&ActivityEvent::Submit, 62_000).unwrap() {
            Some(ActivityResult::ReadingWriting(r)) => assert_eq!(r.summary_quality, 2.0),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn submit_requires_all_answers() {
        let mut session = new_session();
        session.handle(&ActivityEvent::FinishReading, 1_000).unwrap();
        let err = session.handle(&ActivityEvent::Submit, 2_000).unwrap_err();
        assert!(matches!(err, AssessmentError::ActivityIncomplete(_)));
    }

    #[test]
    fn summary_rejected_before_reading_finishes() {
        let mut session = new_session();
        let err = session
            .handle(&ActivityEvent::SummaryChanged("too early".into()), 0)
            .unwrap_err();
        assert!(matches!(err, AssessmentError::EventNotApplicable(_)));
    }

    #[test]
    fn text_interactions_sum_selections_highlights_and_notes() {
        let mut session = new_session();
        session
            .handle(&ActivityEvent::TextSelected("spaced practice".into()), 0)
            .unwrap();
        session.handle(&ActivityEvent::NoteEdited, 0).unwrap();
        session.handle(&ActivityEvent::NoteEdited, 0).unwrap();
        session.handle(&ActivityEvent::FinishReading, 60_000).unwrap();
        answer_all_correct(&mut session, 61_000);

        match session.handle(&ActivityEvent::Submit, 62_000).unwrap() {
            Some(ActivityResult::ReadingWriting(r)) => {
                // 1 selection + 1 highlight + 2 note edits.
                assert_eq!(r.text_interactions, 4);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }
}
