#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative field state management for Hexstack.

use std::collections::BTreeMap;

use hexstack_core::{
    CellId, ColorCategory, Command, Event, FieldLayout, Piece, PieceId, PlacementError, SlotId,
    SpawnedStack, StackBlueprint, StackId, WaveId, DEFAULT_NEIGHBOR_DISTANCE,
};
use tracing::{debug, trace, warn};

mod field;
mod stack;

pub use field::{CellPosition, FieldGraph};
pub use stack::Stack;
use stack::StackLocation;

const DEFAULT_SPAWN_SLOTS: u32 = 3;

/// Represents the authoritative Hexstack world state.
#[derive(Clone, Debug)]
pub struct World {
    field: FieldGraph,
    stacks: BTreeMap<StackId, Stack>,
    slots: Vec<Option<StackId>>,
    next_stack_id: u32,
    next_piece_id: u32,
    waves_spawned: u32,
}

impl World {
    /// Creates a new world with the default hexagonal field and no stacks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            field: FieldGraph::build(&FieldLayout::default(), DEFAULT_NEIGHBOR_DISTANCE),
            stacks: BTreeMap::new(),
            slots: vec![None; DEFAULT_SPAWN_SLOTS as usize],
            next_stack_id: 0,
            next_piece_id: 0,
            waves_spawned: 0,
        }
    }

    fn allocate_stack(&mut self, colors: &[ColorCategory], location: StackLocation) -> StackId {
        let id = StackId::new(self.next_stack_id);
        self.next_stack_id += 1;
        let pieces = colors
            .iter()
            .map(|color| {
                let piece = Piece {
                    id: PieceId::new(self.next_piece_id),
                    color: *color,
                };
                self.next_piece_id += 1;
                piece
            })
            .collect();
        let _ = self.stacks.insert(id, Stack::new(id, pieces, location));
        id
    }

    /// Destroys the stack occupying `cell` if it ran out of pieces.
    fn release_if_empty(&mut self, cell: CellId, out_events: &mut Vec<Event>) {
        let Some(stack_id) = self.field.stack_at(cell) else {
            return;
        };
        let empty = self.stacks.get(&stack_id).map_or(true, Stack::is_empty);
        if !empty {
            return;
        }

        let _ = self.stacks.remove(&stack_id);
        self.field.clear(cell);
        trace!(stack = stack_id.get(), cell = cell.get(), "stack emptied");
        out_events.push(Event::StackEmptied {
            stack: stack_id,
            cell,
        });
    }

    fn occupant_mut(&mut self, cell: CellId) -> Option<&mut Stack> {
        let stack_id = self.field.stack_at(cell)?;
        self.stacks.get_mut(&stack_id)
    }

    fn place(&mut self, stack_id: StackId, cell: CellId, out_events: &mut Vec<Event>) {
        let rejection = if !self.field.contains(cell) {
            Some(PlacementError::UnknownCell)
        } else if self.waiting_slot(stack_id).is_none() {
            Some(PlacementError::StackNotWaiting)
        } else if self.field.is_occupied(cell) {
            Some(PlacementError::CellOccupied)
        } else {
            None
        };

        if let Some(reason) = rejection {
            warn!(stack = stack_id.get(), cell = cell.get(), %reason, "placement rejected");
            out_events.push(Event::PlacementRejected {
                stack: stack_id,
                cell,
                reason,
            });
            return;
        }

        let Some(slot) = self.waiting_slot(stack_id) else {
            return;
        };
        self.slots[slot.get() as usize] = None;
        if let Some(stack) = self.stacks.get_mut(&stack_id) {
            stack.place(cell);
        }
        self.field.assign(cell, stack_id);
        debug!(stack = stack_id.get(), cell = cell.get(), "stack placed");
        out_events.push(Event::StackPlaced {
            stack: stack_id,
            slot,
            cell,
        });
    }

    fn waiting_slot(&self, stack_id: StackId) -> Option<SlotId> {
        self.stacks.get(&stack_id).and_then(Stack::slot)
    }

    fn spawn_wave(&mut self, blueprints: Vec<StackBlueprint>, out_events: &mut Vec<Event>) {
        let mut spawned = Vec::with_capacity(blueprints.len());
        for blueprint in blueprints {
            let index = blueprint.slot.get() as usize;
            match self.slots.get(index) {
                None => {
                    warn!(slot = blueprint.slot.get(), "spawn slot does not exist");
                    continue;
                }
                Some(Some(_)) => {
                    warn!(slot = blueprint.slot.get(), "spawn slot already holds a stack");
                    continue;
                }
                Some(None) => {}
            }
            if blueprint.colors.is_empty() {
                warn!(slot = blueprint.slot.get(), "refusing to spawn an empty stack");
                continue;
            }

            let stack = self.allocate_stack(&blueprint.colors, StackLocation::Slot(blueprint.slot));
            self.slots[index] = Some(stack);
            spawned.push(SpawnedStack {
                stack,
                slot: blueprint.slot,
                colors: blueprint.colors,
            });
        }

        let wave = WaveId::new(self.waves_spawned);
        self.waves_spawned += 1;
        debug!(wave = wave.get(), stacks = spawned.len(), "wave spawned");
        out_events.push(Event::WaveSpawned {
            wave,
            stacks: spawned,
        });
    }

    fn merge_top_runs(
        &mut self,
        target: CellId,
        sources: &[CellId],
        color: ColorCategory,
        out_events: &mut Vec<Event>,
    ) {
        if self.field.stack_at(target).is_none() {
            debug_assert!(false, "merge target {target:?} is unoccupied");
            warn!(cell = target.get(), "merge target is unoccupied");
            return;
        }

        let mut batches: Vec<(CellId, Vec<Piece>)> = Vec::with_capacity(sources.len());
        for source in sources.iter().copied() {
            if source == target {
                continue;
            }
            let Some(stack) = self.occupant_mut(source) else {
                debug_assert!(false, "merge source {source:?} is unoccupied");
                continue;
            };
            let run = stack.detach_top_run(color);
            debug_assert!(!run.is_empty(), "merge source {source:?} lacks a {color:?} run");
            if !run.is_empty() {
                batches.push((source, run));
            }
        }

        let Some(target_stack) = self.occupant_mut(target) else {
            return;
        };
        let mut moved = Vec::with_capacity(batches.len());
        for (source, run) in batches {
            let landed_at = target_stack.len() as u32;
            let pieces = run.iter().map(|piece| piece.id).collect();
            target_stack.append(run);
            moved.push(Event::PiecesMoved {
                from: source,
                to: target,
                pieces,
                landed_at,
            });
        }

        let drained: Vec<CellId> = moved
            .iter()
            .filter_map(|event| match event {
                Event::PiecesMoved { from, .. } => Some(*from),
                _ => None,
            })
            .collect();
        out_events.extend(moved);
        for source in drained {
            self.release_if_empty(source, out_events);
        }
    }

    fn clear_top_run(&mut self, cell: CellId, out_events: &mut Vec<Event>) {
        let Some(stack) = self.occupant_mut(cell) else {
            debug_assert!(false, "clear target {cell:?} is unoccupied");
            return;
        };
        let Some(color) = stack.top_color() else {
            return;
        };
        let run = stack.detach_top_run(color);
        debug!(cell = cell.get(), ?color, pieces = run.len(), "top run cleared");
        out_events.push(Event::PiecesCleared {
            cell,
            pieces: run.iter().map(|piece| piece.id).collect(),
        });
        self.release_if_empty(cell, out_events);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureField {
            layout,
            neighbor_distance,
            spawn_slots,
        } => {
            world.field = FieldGraph::build(&layout, neighbor_distance);
            world.stacks.clear();
            world.slots = vec![None; spawn_slots as usize];
            world.waves_spawned = 0;
            debug!(cells = world.field.len(), spawn_slots, "field configured");
            out_events.push(Event::FieldConfigured {
                cells: world.field.len() as u32,
                spawn_slots,
            });
        }
        Command::SeedStack { cell, colors } => {
            if !world.field.contains(cell) || world.field.is_occupied(cell) || colors.is_empty() {
                warn!(cell = cell.get(), "preset stack ignored");
                return;
            }
            let stack = world.allocate_stack(&colors, StackLocation::Cell(cell));
            world.field.assign(cell, stack);
            out_events.push(Event::StackSeeded { stack, cell });
        }
        Command::SpawnWave { stacks } => world.spawn_wave(stacks, out_events),
        Command::PlaceStack { stack, cell } => world.place(stack, cell, out_events),
        Command::MergeTopRuns {
            target,
            sources,
            color,
        } => world.merge_top_runs(target, &sources, color, out_events),
        Command::ClearTopRun { cell } => world.clear_top_run(cell, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeMap;

    use hexstack_core::{CellId, SlotId, StackId};

    use super::{CellPosition, FieldGraph, Stack, World};

    /// Provides read-only access to the field graph.
    #[must_use]
    pub fn field(world: &World) -> &FieldGraph {
        &world.field
    }

    /// Captures a read-only view of the field and the stacks occupying it.
    #[must_use]
    pub fn field_view(world: &World) -> FieldView<'_> {
        FieldView {
            field: &world.field,
            stacks: &world.stacks,
        }
    }

    /// Looks up a stack by identifier, wherever it lives.
    #[must_use]
    pub fn stack(world: &World, stack: StackId) -> Option<&Stack> {
        world.stacks.get(&stack)
    }

    /// Stacks waiting in spawn slots, ordered by slot.
    #[must_use]
    pub fn waiting_stacks(world: &World) -> Vec<&Stack> {
        world
            .slots
            .iter()
            .flatten()
            .filter_map(|stack| world.stacks.get(stack))
            .collect()
    }

    /// Spawn slots that currently hold no stack.
    #[must_use]
    pub fn empty_spawn_slots(world: &World) -> Vec<SlotId> {
        world
            .slots
            .iter()
            .enumerate()
            .filter(|(_, occupant)| occupant.is_none())
            .map(|(index, _)| SlotId::new(index as u32))
            .collect()
    }

    /// Number of waves spawned since the field was configured.
    #[must_use]
    pub fn waves_spawned(world: &World) -> u32 {
        world.waves_spawned
    }

    /// Read-only view over cells, adjacency, and occupying stacks.
    #[derive(Clone, Copy, Debug)]
    pub struct FieldView<'a> {
        field: &'a FieldGraph,
        stacks: &'a BTreeMap<StackId, Stack>,
    }

    impl<'a> FieldView<'a> {
        /// Iterator over every cell identifier in ascending order.
        pub fn cells(&self) -> impl Iterator<Item = CellId> + 'a {
            let field = self.field;
            field.cells()
        }

        /// Number of cells in the field.
        #[must_use]
        pub fn cell_count(&self) -> usize {
            self.field.len()
        }

        /// Neighbours of the cell, sorted by identifier.
        #[must_use]
        pub fn neighbors(&self, cell: CellId) -> &'a [CellId] {
            self.field.neighbors(cell)
        }

        /// Centre of the cell.
        #[must_use]
        pub fn position(&self, cell: CellId) -> CellPosition {
            self.field.position(cell)
        }

        /// Reports whether a stack occupies the cell.
        #[must_use]
        pub fn is_occupied(&self, cell: CellId) -> bool {
            self.field.is_occupied(cell)
        }

        /// Stack occupying the cell, if any.
        #[must_use]
        pub fn stack_at(&self, cell: CellId) -> Option<&'a Stack> {
            let stacks = self.stacks;
            self.field
                .stack_at(cell)
                .and_then(|stack| stacks.get(&stack))
        }

        /// Neighbours of the cell that hold a stack.
        pub fn occupied_neighbors(&self, cell: CellId) -> impl Iterator<Item = CellId> + 'a {
            let field = self.field;
            field
                .neighbors(cell)
                .iter()
                .copied()
                .filter(move |neighbor| field.is_occupied(*neighbor))
        }

        /// Reports whether no stack remains on the field.
        #[must_use]
        pub fn is_cleared(&self) -> bool {
            self.field.occupied_count() == 0
        }

        /// Total number of pieces owned by stacks on the field.
        #[must_use]
        pub fn piece_count(&self) -> usize {
            self.cells()
                .filter_map(|cell| self.stack_at(cell))
                .map(Stack::len)
                .sum()
        }
    }
}
