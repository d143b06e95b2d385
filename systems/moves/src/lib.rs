#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Move availability oracle and placement advisor.
//!
//! Both functions are pure reads over a [`FieldView`] and never mutate the
//! world.

use hexstack_core::{CellId, StackId};
use hexstack_world::{query::FieldView, Stack};

/// Suggested placement of a waiting stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementHint {
    /// Stack to pick up.
    pub stack: StackId,
    /// Empty cell to drop it on.
    pub cell: CellId,
}

/// Reports whether the player can still make progress on the field.
///
/// A move exists when any cell is empty, or when two neighbouring stacks
/// share a top color.
#[must_use]
pub fn has_legal_move(field: FieldView<'_>) -> bool {
    field.cells().any(|cell| {
        let Some(stack) = field.stack_at(cell) else {
            return true;
        };
        let color = stack.top_color();
        field.occupied_neighbors(cell).any(|neighbor| {
            field
                .stack_at(neighbor)
                .map_or(false, |other| other.top_color() == color)
        })
    })
}

/// Picks the middle waiting stack and the free cell closest to the field origin.
///
/// `active` must be ordered by spawn slot. Ties between equally distant cells
/// go to the lower cell identifier.
#[must_use]
pub fn suggest_placement(field: FieldView<'_>, active: &[&Stack]) -> Option<PlacementHint> {
    let stack = active.get(active.len() / 2)?;
    let cell = field
        .cells()
        .filter(|cell| !field.is_occupied(*cell))
        .min_by(|a, b| {
            let da = field.position(*a).magnitude_squared();
            let db = field.position(*b).magnitude_squared();
            da.total_cmp(&db).then(a.cmp(b))
        })?;

    Some(PlacementHint {
        stack: stack.id(),
        cell,
    })
}
