//! The four interactive activity modules.
//!
//! Each module is a self-contained state machine: an internal phase enum,
//! event methods, a completeness predicate, and a single-shot finish that
//! produces its `ActivityResult` variant. Modules never talk to persistence
//! and never see each other; the engine owns the running module and routes
//! [`ActivityEvent`]s into it.

pub mod audio_visual;
pub mod memory_challenge;
pub mod problem_solving;
pub mod reading_writing;
pub mod timer;

pub use audio_visual::AudioVisualSession;
pub use memory_challenge::MemoryChallenge;
pub use problem_solving::ProblemSolving;
pub use reading_writing::ReadingWritingSession;
pub use timer::ActivityTicker;

/// Interaction events routed from the host UI into the running activity.
/// Events that do not apply to the current module or phase are rejected with
/// `AssessmentError::EventNotApplicable`.
#[derive(Debug, Clone)]
pub enum ActivityEvent {
    /// Periodic timer event (per-second accrual, study-window countdown).
    Tick,
    /// Final submission; only valid once the module's completeness predicate
    /// holds.
    Submit,

    // Memory challenge
    BeginStudy,
    ToggleSelection(String),
    SubmitRound,

    // Problem solving
    DragStart { piece: usize },
    DropPiece { piece: usize, slot: usize },
    Click,

    // Audio-visual
    ToggleAudio,
    NextSegment,

    // Comprehension questions (audio-visual and reading/writing)
    Answer { index: usize, choice: usize },

    // Reading/writing
    FinishReading,
    TextSelected(String),
    NoteEdited,
    SummaryChanged(String),
}
