//! Problem solving: a sequence of shape-matching puzzles probing kinesthetic
//! interaction.
//!
//! A piece drops into a slot only when both shape and size match exactly.
//! Every drag-start, drop, and plain click counts as an interaction;
//! efficiency decays with the number of steps taken.

use rand::seq::SliceRandom;

use crate::activities::ActivityEvent;
use crate::config::ProblemSolvingParams;
use crate::error::{AssessmentError, AssessmentResult};
use crate::types::{ActivityResult, ProblemSolvingResult, ResultCommon};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Star,
    Hexagon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceSize {
    Small,
    Medium,
    Large,
}

const SHAPES: [Shape; 5] = [
    Shape::Circle,
    Shape::Square,
    Shape::Triangle,
    Shape::Star,
    Shape::Hexagon,
];
const SIZES: [PieceSize; 3] = [PieceSize::Small, PieceSize::Medium, PieceSize::Large];

#[derive(Debug, Clone, Copy)]
pub struct Piece {
    pub shape: Shape,
    pub size: PieceSize,
    pub placed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub shape: Shape,
    pub size: PieceSize,
    pub filled: bool,
}

struct Puzzle {
    pieces: Vec<Piece>,
    slots: Vec<Slot>,
}

impl Puzzle {
    fn generate(piece_count: usize) -> Self {
        let mut combos: Vec<(Shape, PieceSize)> = SHAPES
            .iter()
            .flat_map(|shape| SIZES.iter().map(move |size| (*shape, *size)))
            .collect();
        let mut rng = rand::rng();
        combos.shuffle(&mut rng);

        let chosen: Vec<(Shape, PieceSize)> =
            combos.into_iter().take(piece_count).collect();

        let pieces: Vec<Piece> = chosen
            .iter()
            .map(|(shape, size)| Piece {
                shape: *shape,
                size: *size,
                placed: false,
            })
            .collect();

        let mut slot_order = chosen;
        slot_order.shuffle(&mut rng);
        let slots: Vec<Slot> = slot_order
            .into_iter()
            .map(|(shape, size)| Slot {
                shape,
                size,
                filled: false,
            })
            .collect();

        Self { pieces, slots }
    }

    fn is_complete(&self) -> bool {
        self.pieces.iter().all(|p| p.placed)
    }
}

pub struct ProblemSolving {
    user_id: String,
    started_at_ms: i64,
    sizes: Vec<u32>,
    current: usize,
    puzzle: Puzzle,
    interaction_count: u32,
    steps: u32,
    drag_drop_actions: u32,
    click_actions: u32,
    completed: bool,
}

impl ProblemSolving {
    pub fn new(params: ProblemSolvingParams, user_id: &str, now_ms: i64) -> Self {
        let sizes = if params.puzzle_sizes.is_empty() {
            vec![3]
        } else {
            params.puzzle_sizes.clone()
        };
        let first = Puzzle::generate(sizes[0] as usize);
        Self {
            user_id: user_id.to_string(),
            started_at_ms: now_ms,
            sizes,
            current: 0,
            puzzle: first,
            interaction_count: 0,
            steps: 0,
            drag_drop_actions: 0,
            click_actions: 0,
            completed: false,
        }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.puzzle.pieces
    }

    pub fn slots(&self) -> &[Slot] {
        &self.puzzle.slots
    }

    pub fn current_puzzle(&self) -> usize {
        self.current
    }

    pub fn all_puzzles_complete(&self) -> bool {
        self.completed
    }

    pub fn handle(
        &mut self,
        event: &ActivityEvent,
        now_ms: i64,
    ) -> AssessmentResult<Option<ActivityResult>> {
        match event {
            ActivityEvent::DragStart { piece } => {
                self.check_piece(*piece)?;
                self.interaction_count += 1;
                Ok(None)
            }
            ActivityEvent::DropPiece { piece, slot } => {
                self.check_piece(*piece)?;
                if *slot >= self.puzzle.slots.len() {
                    return Err(AssessmentError::EventNotApplicable("slot out of range"));
                }
                self.interaction_count += 1;
                self.drag_drop_actions += 1;
                self.steps += 1;
                self.try_place(*piece, *slot);
                Ok(None)
            }
            ActivityEvent::Click => {
                self.interaction_count += 1;
                self.click_actions += 1;
                Ok(None)
            }
            ActivityEvent::Tick => Ok(None),
            ActivityEvent::Submit => self.submit(now_ms),
            _ => Err(AssessmentError::EventNotApplicable(
                "event is not part of the problem-solving activity",
            )),
        }
    }

    fn check_piece(&self, piece: usize) -> AssessmentResult<()> {
        if self.completed {
            return Err(AssessmentError::EventNotApplicable(
                "all puzzles already complete",
            ));
        }
        if piece >= self.puzzle.pieces.len() {
            return Err(AssessmentError::EventNotApplicable("piece out of range"));
        }
        Ok(())
    }

    /// Exact shape + size match, no partial credit. A successful final
    /// placement advances to the next puzzle.
    fn try_place(&mut self, piece_idx: usize, slot_idx: usize) {
        let piece = self.puzzle.pieces[piece_idx];
        let slot = self.puzzle.slots[slot_idx];
        if piece.placed || slot.filled || piece.shape != slot.shape || piece.size != slot.size {
            return;
        }

        self.puzzle.pieces[piece_idx].placed = true;
        self.puzzle.slots[slot_idx].filled = true;

        if self.puzzle.is_complete() {
            self.current += 1;
            if self.current >= self.sizes.len() {
                self.completed = true;
            } else {
                self.puzzle = Puzzle::generate(self.sizes[self.current] as usize);
            }
        }
    }

    fn submit(&mut self, now_ms: i64) -> AssessmentResult<Option<ActivityResult>> {
        if !self.completed {
            return Err(AssessmentError::ActivityIncomplete(
                "all pieces must be placed before submitting",
            ));
        }

        let efficiency = (100.0 - self.steps as f64).max(1.0);

        Ok(Some(ActivityResult::ProblemSolving(ProblemSolvingResult {
            common: ResultCommon::new(&self.user_id, self.started_at_ms, now_ms),
            interaction_count: self.interaction_count,
            steps_to_complete: self.steps,
            efficiency,
            drag_drop_actions: self.drag_drop_actions,
            click_actions: self.click_actions,
            task_completed: true,
        })))
    }
}
