//! Field graph: cells, fixed adjacency, and occupancy.

use hexstack_core::{CellId, FieldLayout, StackId};

const ROW_HEIGHT: f32 = 0.866_025_4;
const POSITION_EPSILON: f32 = 1.0e-3;

/// Centre of a cell expressed in cell spacings relative to the field origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellPosition {
    /// Horizontal offset from the origin.
    pub x: f32,
    /// Vertical offset from the origin.
    pub y: f32,
}

impl CellPosition {
    /// Creates a new position from its components.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to the origin.
    #[must_use]
    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(&self, other: CellPosition) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Debug)]
struct Cell {
    position: CellPosition,
    occupant: Option<StackId>,
    neighbors: Vec<CellId>,
}

/// Set of cells with adjacency computed once at setup time.
///
/// Cell identifiers are dense indices. Passing an identifier that does not
/// belong to the graph is a programming error and panics.
#[derive(Clone, Debug)]
pub struct FieldGraph {
    cells: Vec<Cell>,
}

impl FieldGraph {
    /// Lays out cells for the provided geometry and bakes neighbour lists.
    #[must_use]
    pub fn build(layout: &FieldLayout, neighbor_distance: f32) -> Self {
        let positions = match layout {
            FieldLayout::Hexagon { radius } => hexagon_positions(*radius),
            FieldLayout::Custom { positions } => positions
                .iter()
                .map(|[x, y]| CellPosition::new(*x, *y))
                .collect(),
        };
        Self::from_positions(positions, neighbor_distance)
    }

    fn from_positions(positions: Vec<CellPosition>, neighbor_distance: f32) -> Self {
        let mut cells: Vec<Cell> = positions
            .iter()
            .map(|position| Cell {
                position: *position,
                occupant: None,
                neighbors: Vec::new(),
            })
            .collect();

        for (index, cell) in cells.iter_mut().enumerate() {
            cell.neighbors = positions
                .iter()
                .enumerate()
                .filter(|(other, position)| {
                    *other != index && cell.position.distance(**position) <= neighbor_distance
                })
                .map(|(other, _)| CellId::new(other as u32))
                .collect();
        }

        Self { cells }
    }

    /// Number of cells in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the graph contains no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether the identifier belongs to this graph.
    #[must_use]
    pub fn contains(&self, cell: CellId) -> bool {
        cell.index() < self.cells.len()
    }

    /// Iterator over every cell identifier in ascending order.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        (0..self.cells.len()).map(|index| CellId::new(index as u32))
    }

    /// Neighbours of the cell, sorted by identifier.
    #[must_use]
    pub fn neighbors(&self, cell: CellId) -> &[CellId] {
        &self.cells[cell.index()].neighbors
    }

    /// Centre of the cell.
    #[must_use]
    pub fn position(&self, cell: CellId) -> CellPosition {
        self.cells[cell.index()].position
    }

    /// Reports whether a stack occupies the cell.
    #[must_use]
    pub fn is_occupied(&self, cell: CellId) -> bool {
        self.cells[cell.index()].occupant.is_some()
    }

    /// Stack occupying the cell, if any.
    #[must_use]
    pub fn stack_at(&self, cell: CellId) -> Option<StackId> {
        self.cells[cell.index()].occupant
    }

    pub(crate) fn assign(&mut self, cell: CellId, stack: StackId) {
        let slot = &mut self.cells[cell.index()].occupant;
        debug_assert!(slot.is_none(), "cell {cell:?} is already occupied");
        *slot = Some(stack);
    }

    pub(crate) fn clear(&mut self, cell: CellId) {
        self.cells[cell.index()].occupant = None;
    }

    pub(crate) fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.occupant.is_some())
            .count()
    }
}

fn hexagon_positions(radius: u32) -> Vec<CellPosition> {
    let span = i64::from(radius) * 2;
    let limit = radius as f32 + POSITION_EPSILON;
    let mut positions = Vec::new();
    for row in -span..=span {
        for column in -span..=span {
            let position = CellPosition::new(
                column as f32 + row as f32 * 0.5,
                row as f32 * ROW_HEIGHT,
            );
            if position.magnitude_squared().sqrt() <= limit {
                positions.push(position);
            }
        }
    }
    positions
}
