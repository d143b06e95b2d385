#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic cascade system that resolves merges triggered by a placement.
//!
//! The engine is stepped explicitly by its host. Each call to
//! [`CascadeEngine::advance`] emits at most one world mutation, and the FIFO
//! queue of cells awaiting examination persists between calls. After the host
//! applies the emitted command it feeds the resulting events back through
//! [`CascadeEngine::observe`], which turns them into presentation effects and
//! computes how long the next step should be held back.

use std::collections::VecDeque;
use std::time::Duration;

use hexstack_core::{CascadeConfig, CellId, ColorCategory, Command, Effect, Event};
use hexstack_world::query::FieldView;
use thiserror::Error;
use tracing::{debug, error, trace};

/// Errors raised when driving the engine outside its contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CascadeError {
    /// A cascade is still resolving, so another cannot start.
    #[error("a cascade is already resolving from cell {0:?}")]
    AlreadyCascading(CellId),
}

/// Tallies describing a fully resolved cascade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    /// Cell the triggering stack was placed on.
    pub origin: Option<CellId>,
    /// Number of merge rounds performed.
    pub merges: u32,
    /// Number of completion clears performed.
    pub clears: u32,
    /// Pieces moved across all merges.
    pub pieces_moved: u32,
    /// Pieces destroyed across all clears.
    pub pieces_cleared: u32,
}

/// Result of a single [`CascadeEngine::advance`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// No cascade is in flight.
    Idle,
    /// A command was emitted; apply it and observe its events before advancing again.
    Pending,
    /// The queue drained; the cascade is complete.
    Resolved(CascadeSummary),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Exploring,
    Merging {
        target: CellId,
        color: ColorCategory,
    },
    Clearing,
}

/// Queue-driven cascade resolver.
#[derive(Debug)]
pub struct CascadeEngine {
    config: CascadeConfig,
    queue: VecDeque<CellId>,
    phase: Phase,
    speed: f32,
    hold: Duration,
    summary: CascadeSummary,
    completed: u64,
}

impl CascadeEngine {
    /// Creates an idle engine using the supplied tuning.
    #[must_use]
    pub fn new(config: CascadeConfig) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
            phase: Phase::Idle,
            speed: 1.0,
            hold: Duration::ZERO,
            summary: CascadeSummary::default(),
            completed: 0,
        }
    }

    /// Reports whether a cascade is resolving.
    #[must_use]
    pub fn is_cascading(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Number of cascades resolved since construction.
    #[must_use]
    pub fn cascades_completed(&self) -> u64 {
        self.completed
    }

    /// Current pacing multiplier; starts at one and grows after every round.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Minimum wait before the next [`advance`](Self::advance) so effects stay legible.
    #[must_use]
    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// Starts a cascade seeded with the cell a stack was just placed on.
    pub fn begin(&mut self, cell: CellId) -> Result<(), CascadeError> {
        if self.is_cascading() {
            let origin = self.summary.origin.unwrap_or(cell);
            return Err(CascadeError::AlreadyCascading(origin));
        }

        self.queue.clear();
        self.queue.push_back(cell);
        self.phase = Phase::Exploring;
        self.speed = 1.0;
        self.hold = Duration::ZERO;
        self.summary = CascadeSummary {
            origin: Some(cell),
            ..CascadeSummary::default()
        };
        debug!(cell = cell.get(), "cascade started");
        Ok(())
    }

    /// Consumes world events, starting cascades and emitting presentation effects.
    pub fn observe(&mut self, events: &[Event], out: &mut Vec<Effect>) {
        for event in events {
            match event {
                Event::StackPlaced { cell, .. } => {
                    if let Err(err) = self.begin(*cell) {
                        error!(%err, "placement accepted while cascading");
                        debug_assert!(false, "{err}");
                    }
                }
                Event::PiecesMoved {
                    from,
                    to,
                    pieces,
                    landed_at,
                } => {
                    let duration = self.round_duration();
                    let stagger = self.config.piece_stagger();
                    self.summary.pieces_moved += pieces.len() as u32;
                    self.hold = self
                        .hold
                        .max(duration)
                        .saturating_add(stagger.saturating_mul(pieces.len() as u32));
                    out.push(Effect::Transition {
                        pieces: pieces.clone(),
                        source: *from,
                        target: *to,
                        duration,
                        delay_offset: stagger.saturating_mul(*landed_at),
                    });
                }
                Event::PiecesCleared { pieces, .. } => {
                    let duration = self.round_duration();
                    let delay = self.config.piece_stagger().div_f32(self.speed);
                    self.summary.pieces_cleared += pieces.len() as u32;
                    self.hold = self
                        .hold
                        .max(duration)
                        .saturating_add(delay.saturating_mul(pieces.len() as u32));
                    out.push(Effect::Clear {
                        pieces: pieces.clone(),
                        delay,
                        duration,
                    });
                }
                _ => {}
            }
        }
    }

    /// Performs the next step of the cascade, emitting at most one command.
    pub fn advance(&mut self, field: FieldView<'_>, out: &mut Vec<Command>) -> Progress {
        self.hold = Duration::ZERO;
        match self.phase {
            Phase::Idle => return Progress::Idle,
            Phase::Merging { target, color } => {
                if self.check_completion(target, color, field, out) {
                    return Progress::Pending;
                }
                self.finish_round();
            }
            Phase::Clearing => self.finish_round(),
            Phase::Exploring => {}
        }

        while let Some(cell) = self.queue.pop_front() {
            if let Some(command) = self.examine(cell, field) {
                out.push(command);
                return Progress::Pending;
            }
        }

        self.phase = Phase::Idle;
        self.completed += 1;
        debug!(
            merges = self.summary.merges,
            clears = self.summary.clears,
            pieces_cleared = self.summary.pieces_cleared,
            "cascade resolved"
        );
        Progress::Resolved(self.summary)
    }

    fn round_duration(&self) -> Duration {
        self.config.base_duration().div_f32(self.speed)
    }

    fn finish_round(&mut self) {
        self.speed *= self.config.acceleration;
        self.phase = Phase::Exploring;
    }

    fn examine(&mut self, cell: CellId, field: FieldView<'_>) -> Option<Command> {
        let stack = field.stack_at(cell)?;
        let color = stack.top_color()?;

        let mut occupied = field.occupied_neighbors(cell).peekable();
        if occupied.peek().is_none() {
            trace!(cell = cell.get(), "no occupied neighbours");
            return None;
        }

        let similar: Vec<CellId> = occupied
            .filter(|neighbor| {
                field
                    .stack_at(*neighbor)
                    .and_then(|stack| stack.top_color())
                    == Some(color)
            })
            .collect();

        let (target, sources) = match similar.as_slice() {
            [] => {
                trace!(cell = cell.get(), ?color, "no similar neighbours");
                return None;
            }
            [neighbor] => (*neighbor, vec![cell]),
            _ => (cell, similar.clone()),
        };

        self.queue.extend(similar.iter().copied());
        self.queue.push_back(cell);
        self.phase = Phase::Merging { target, color };
        self.summary.merges += 1;
        trace!(
            cell = cell.get(),
            target = target.get(),
            sources = sources.len(),
            ?color,
            "merge scheduled"
        );
        Some(Command::MergeTopRuns {
            target,
            sources,
            color,
        })
    }

    fn check_completion(
        &mut self,
        target: CellId,
        color: ColorCategory,
        field: FieldView<'_>,
        out: &mut Vec<Command>,
    ) -> bool {
        let threshold = self.config.completion_threshold as usize;
        let Some(stack) = field.stack_at(target) else {
            return false;
        };
        if stack.len() < threshold || stack.top_color() != Some(color) {
            return false;
        }
        if stack.top_run_len() < threshold {
            return false;
        }

        out.push(Command::ClearTopRun { cell: target });
        self.queue.push_back(target);
        self.phase = Phase::Clearing;
        self.summary.clears += 1;
        true
    }
}

impl Default for CascadeEngine {
    fn default() -> Self {
        Self::new(CascadeConfig::default())
    }
}
