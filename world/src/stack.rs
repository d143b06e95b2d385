//! Stack ownership of pieces.

use hexstack_core::{CellId, ColorCategory, Piece, SlotId, StackId};

/// Where a stack currently lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum StackLocation {
    /// Waiting in an off-field spawn slot.
    Slot(SlotId),
    /// Occupying a field cell.
    Cell(CellId),
}

/// Ordered pile of pieces, bottom to top.
///
/// A stack is never empty while it exists: the world destroys it as soon as
/// its last piece leaves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stack {
    id: StackId,
    pieces: Vec<Piece>,
    location: StackLocation,
}

impl Stack {
    pub(crate) fn new(id: StackId, pieces: Vec<Piece>, location: StackLocation) -> Self {
        debug_assert!(!pieces.is_empty(), "stacks are created with pieces");
        Self {
            id,
            pieces,
            location,
        }
    }

    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> StackId {
        self.id
    }

    /// Number of pieces owned by the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// Reports whether the stack owns no pieces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Cell occupied by the stack, if it has been placed.
    #[must_use]
    pub const fn cell(&self) -> Option<CellId> {
        match self.location {
            StackLocation::Cell(cell) => Some(cell),
            StackLocation::Slot(_) => None,
        }
    }

    /// Slot holding the stack, if it is waiting for placement.
    #[must_use]
    pub const fn slot(&self) -> Option<SlotId> {
        match self.location {
            StackLocation::Slot(slot) => Some(slot),
            StackLocation::Cell(_) => None,
        }
    }

    /// Color of the most recently added piece.
    #[must_use]
    pub fn top_color(&self) -> Option<ColorCategory> {
        self.pieces.last().map(|piece| piece.color)
    }

    /// Length of the maximal same-color suffix.
    #[must_use]
    pub fn top_run_len(&self) -> usize {
        match self.top_color() {
            Some(color) => self.run_len(color),
            None => 0,
        }
    }

    /// Piece colors from bottom to top.
    #[must_use]
    pub fn colors(&self) -> Vec<ColorCategory> {
        self.pieces.iter().map(|piece| piece.color).collect()
    }

    fn run_len(&self, color: ColorCategory) -> usize {
        self.pieces
            .iter()
            .rev()
            .take_while(|piece| piece.color == color)
            .count()
    }

    pub(crate) fn place(&mut self, cell: CellId) {
        self.location = StackLocation::Cell(cell);
    }

    /// Detaches the maximal top run of `color`; pieces beneath stay in place.
    pub(crate) fn detach_top_run(&mut self, color: ColorCategory) -> Vec<Piece> {
        let run = self.run_len(color);
        let split = self.pieces.len() - run;
        self.pieces.split_off(split)
    }

    pub(crate) fn append(&mut self, pieces: Vec<Piece>) {
        self.pieces.extend(pieces);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexstack_core::PieceId;

    fn stack_of(colors: &[ColorCategory]) -> Stack {
        let pieces = colors
            .iter()
            .enumerate()
            .map(|(index, color)| Piece {
                id: PieceId::new(index as u32),
                color: *color,
            })
            .collect();
        Stack::new(
            StackId::new(1),
            pieces,
            StackLocation::Slot(SlotId::new(0)),
        )
    }

    #[test]
    fn top_run_counts_only_contiguous_suffix() {
        use ColorCategory::{Blue, Red};
        let stack = stack_of(&[Red, Red, Blue, Red, Red, Red]);
        assert_eq!(stack.top_color(), Some(Red));
        assert_eq!(stack.top_run_len(), 3);
    }

    #[test]
    fn detach_leaves_deeper_pieces_bound() {
        use ColorCategory::{Blue, Green};
        let mut stack = stack_of(&[Blue, Green, Green]);
        let run = stack.detach_top_run(Green);
        assert_eq!(run.len(), 2);
        assert_eq!(run[0].id, PieceId::new(1));
        assert_eq!(stack.colors(), vec![Blue]);
    }

    #[test]
    fn detach_of_non_matching_color_moves_nothing() {
        use ColorCategory::{Blue, Green};
        let mut stack = stack_of(&[Blue, Green]);
        assert!(stack.detach_top_run(Blue).is_empty());
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn placement_updates_location() {
        let mut stack = stack_of(&[ColorCategory::White]);
        assert_eq!(stack.slot(), Some(SlotId::new(0)));
        stack.place(CellId::new(4));
        assert_eq!(stack.cell(), Some(CellId::new(4)));
        assert_eq!(stack.slot(), None);
    }
}
