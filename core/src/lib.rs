#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hexstack engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Presentation layers never touch the world;
//! they receive [`Effect`] requests describing what to animate and for how
//! long.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod config;
mod palette;

pub use config::{
    CascadeConfig, CellPreset, FieldConfig, SessionConfig, SpawnConfig, DEFAULT_NEIGHBOR_DISTANCE,
};
pub use palette::{ColorPalette, DisplayColor, PaletteEntry, FALLBACK_DISPLAY_COLOR};

/// Color categories a piece may carry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ColorCategory {
    /// White pieces.
    White,
    /// Blue pieces.
    Blue,
    /// Red pieces.
    Red,
    /// Green pieces.
    Green,
    /// Pink pieces.
    Pink,
    /// Yellow pieces.
    Yellow,
    /// Black pieces.
    Black,
}

impl ColorCategory {
    /// Every category in declaration order.
    pub const ALL: [ColorCategory; 7] = [
        ColorCategory::White,
        ColorCategory::Blue,
        ColorCategory::Red,
        ColorCategory::Green,
        ColorCategory::Pink,
        ColorCategory::Yellow,
        ColorCategory::Black,
    ];
}

/// Identifier of a cell within the field graph.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellId(u32);

impl CellId {
    /// Creates a new cell identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Dense index of the cell inside field storage.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Identifier allocated to a stack by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct StackId(u32);

impl StackId {
    /// Creates a new stack identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier allocated to a piece when it is spawned.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PieceId(u32);

impl PieceId {
    /// Creates a new piece identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of an off-field spawn slot that holds stacks waiting for placement.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a new slot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Sequence number of a spawned wave, starting at zero.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WaveId(u32);

impl WaveId {
    /// Creates a new wave identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Single colored unit owned by exactly one stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    /// Identifier allocated when the piece was spawned.
    pub id: PieceId,
    /// Color category carried by the piece.
    pub color: ColorCategory,
}

/// Shape of the field graph built at setup time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum FieldLayout {
    /// Cells of a unit-spaced hex lattice whose centres lie within `radius` of the origin.
    Hexagon {
        /// Radius of the field measured in cell spacings.
        radius: u32,
    },
    /// Explicit cell centres, enabling irregular adjacency graphs.
    Custom {
        /// Centre of every cell, in cell id order.
        positions: Vec<[f32; 2]>,
    },
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self::Hexagon { radius: 2 }
    }
}

/// Composition requested for a single spawn slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackBlueprint {
    /// Slot that will hold the stack until it is placed.
    pub slot: SlotId,
    /// Piece colors from bottom to top.
    pub colors: Vec<ColorCategory>,
}

/// Stack created by a wave, as reported to observers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedStack {
    /// Identifier allocated to the stack.
    pub stack: StackId,
    /// Slot the stack waits in.
    pub slot: SlotId,
    /// Piece colors from bottom to top.
    pub colors: Vec<ColorCategory>,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the field graph and spawn slots, discarding every stack.
    ConfigureField {
        /// Geometry used to lay out cells.
        layout: FieldLayout,
        /// Maximum centre distance at which two cells are neighbours.
        neighbor_distance: f32,
        /// Number of off-field spawn slots.
        spawn_slots: u32,
    },
    /// Places an authored stack directly onto an empty cell.
    SeedStack {
        /// Cell receiving the stack.
        cell: CellId,
        /// Piece colors from bottom to top.
        colors: Vec<ColorCategory>,
    },
    /// Creates one waiting stack per blueprint.
    SpawnWave {
        /// Compositions to create, one per slot.
        stacks: Vec<StackBlueprint>,
    },
    /// Moves a waiting stack onto an empty cell.
    PlaceStack {
        /// Stack being placed.
        stack: StackId,
        /// Cell receiving the stack.
        cell: CellId,
    },
    /// Transfers the top run of `color` from every source onto the target.
    MergeTopRuns {
        /// Cell whose stack receives the pieces.
        target: CellId,
        /// Cells whose top runs are detached, in transfer order.
        sources: Vec<CellId>,
        /// Color of the runs being moved.
        color: ColorCategory,
    },
    /// Destroys the top-colour run of the stack occupying the cell.
    ClearTopRun {
        /// Cell whose top run is cleared.
        cell: CellId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the field graph was rebuilt.
    FieldConfigured {
        /// Number of cells in the new field.
        cells: u32,
        /// Number of spawn slots available.
        spawn_slots: u32,
    },
    /// Confirms that an authored stack was seeded onto a cell.
    StackSeeded {
        /// Identifier allocated to the stack.
        stack: StackId,
        /// Cell the stack occupies.
        cell: CellId,
    },
    /// Announces a freshly spawned wave of waiting stacks.
    WaveSpawned {
        /// Sequence number of the wave.
        wave: WaveId,
        /// Stacks created by the wave.
        stacks: Vec<SpawnedStack>,
    },
    /// Confirms that a waiting stack landed on a cell.
    StackPlaced {
        /// Stack that was placed.
        stack: StackId,
        /// Slot the stack left.
        slot: SlotId,
        /// Cell the stack now occupies.
        cell: CellId,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Stack requested for placement.
        stack: StackId,
        /// Cell provided in the request.
        cell: CellId,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that pieces changed owner between two cells.
    PiecesMoved {
        /// Cell the pieces left.
        from: CellId,
        /// Cell the pieces joined.
        to: CellId,
        /// Pieces in the order they were appended to the target.
        pieces: Vec<PieceId>,
        /// Height of the target stack before the batch landed.
        landed_at: u32,
    },
    /// Confirms that pieces were destroyed by a completion clear.
    PiecesCleared {
        /// Cell whose stack lost the pieces.
        cell: CellId,
        /// Destroyed pieces, oldest first.
        pieces: Vec<PieceId>,
    },
    /// Reports that a stack lost its last piece and vacated its cell.
    StackEmptied {
        /// Stack that ceased to exist.
        stack: StackId,
        /// Cell that became unoccupied.
        cell: CellId,
    },
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The target cell already holds a stack.
    #[error("cell is already occupied")]
    CellOccupied,
    /// The target cell does not exist in the field graph.
    #[error("cell does not exist")]
    UnknownCell,
    /// The stack is not waiting in a spawn slot.
    #[error("stack is not waiting for placement")]
    StackNotWaiting,
}

/// Presentation request emitted by the cascade; never read back by the simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Pieces travel from one cell onto another.
    Transition {
        /// Pieces moving, bottom-up in landing order.
        pieces: Vec<PieceId>,
        /// Cell the pieces leave.
        source: CellId,
        /// Cell the pieces join.
        target: CellId,
        /// Travel time of each piece.
        duration: Duration,
        /// Delay before the first piece starts moving.
        delay_offset: Duration,
    },
    /// Pieces vanish after a completion clear.
    Clear {
        /// Pieces vanishing, oldest first.
        pieces: Vec<PieceId>,
        /// Stagger between successive pieces starting to vanish.
        delay: Duration,
        /// Vanish time of each piece.
        duration: Duration,
    },
}

/// Final result of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// Every stack on the field was cleared.
    Win,
    /// No further progress is possible.
    Loss,
}

#[cfg(test)]
mod tests {
    use super::{CellId, ColorCategory, PlacementError, SessionOutcome, StackId};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn cell_id_indexes_densely() {
        assert_eq!(CellId::new(7).index(), 7);
    }

    #[test]
    fn stack_id_round_trips_through_bincode() {
        assert_round_trip(&StackId::new(42));
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::CellOccupied);
    }

    #[test]
    fn session_outcome_round_trips_through_bincode() {
        assert_round_trip(&SessionOutcome::Loss);
    }

    #[test]
    fn color_categories_are_distinct_and_ordered() {
        let mut sorted = ColorCategory::ALL.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, ColorCategory::ALL.to_vec());
    }

    #[test]
    fn placement_error_displays_reason() {
        assert_eq!(
            PlacementError::CellOccupied.to_string(),
            "cell is already occupied"
        );
    }
}
