use hexstack_core::ColorCategory::{Blue, Green, Red};
use hexstack_core::{
    CellId, ColorCategory, Command, FieldLayout, SlotId, StackBlueprint, DEFAULT_NEIGHBOR_DISTANCE,
};
use hexstack_system_moves::{has_legal_move, suggest_placement, PlacementHint};
use hexstack_world::{self as world, query, World};

fn configured(layout: FieldLayout, spawn_slots: u32) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureField {
            layout,
            neighbor_distance: DEFAULT_NEIGHBOR_DISTANCE,
            spawn_slots,
        },
        &mut events,
    );
    world
}

fn line(cells: usize) -> World {
    configured(
        FieldLayout::Custom {
            positions: (0..cells).map(|index| [index as f32, 0.0]).collect(),
        },
        3,
    )
}

fn seed(world: &mut World, cell: u32, colors: &[ColorCategory]) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SeedStack {
            cell: CellId::new(cell),
            colors: colors.to_vec(),
        },
        &mut events,
    );
}

#[test]
fn empty_cell_is_a_legal_move() {
    let mut world = line(3);
    seed(&mut world, 0, &[Red]);
    seed(&mut world, 2, &[Blue]);
    assert!(has_legal_move(query::field_view(&world)));
}

#[test]
fn matching_neighbours_are_a_legal_move_on_a_full_field() {
    let mut world = line(3);
    seed(&mut world, 0, &[Red]);
    seed(&mut world, 1, &[Blue, Green]);
    seed(&mut world, 2, &[Green]);
    assert!(has_legal_move(query::field_view(&world)));
}

#[test]
fn full_field_without_matches_has_no_move() {
    let mut world = line(3);
    seed(&mut world, 0, &[Red]);
    seed(&mut world, 1, &[Green, Blue]);
    seed(&mut world, 2, &[Red]);
    assert!(!has_legal_move(query::field_view(&world)));
}

#[test]
fn matching_colors_that_are_not_adjacent_do_not_count() {
    let mut world = configured(
        FieldLayout::Custom {
            positions: vec![[0.0, 0.0], [5.0, 0.0]],
        },
        1,
    );
    seed(&mut world, 0, &[Red]);
    seed(&mut world, 1, &[Red]);
    assert!(!has_legal_move(query::field_view(&world)));
}

#[test]
fn hint_picks_middle_stack_and_central_cell() {
    let mut world = configured(FieldLayout::Hexagon { radius: 1 }, 3);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnWave {
            stacks: (0..3)
                .map(|slot| StackBlueprint {
                    slot: SlotId::new(slot),
                    colors: vec![Red],
                })
                .collect(),
        },
        &mut events,
    );

    let waiting = query::waiting_stacks(&world);
    let hint = suggest_placement(query::field_view(&world), &waiting).expect("hint");
    let centre = query::field(&world)
        .cells()
        .find(|cell| query::field(&world).position(*cell).magnitude_squared() < 1.0e-3)
        .expect("centre");
    assert_eq!(
        hint,
        PlacementHint {
            stack: waiting[1].id(),
            cell: centre,
        }
    );
}

#[test]
fn hint_skips_occupied_cells_and_breaks_ties_by_id() {
    let mut world = configured(
        FieldLayout::Custom {
            positions: vec![[0.0, 0.0], [1.0, 0.0], [-1.0, 0.0]],
        },
        1,
    );
    seed(&mut world, 0, &[Blue]);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnWave {
            stacks: vec![StackBlueprint {
                slot: SlotId::new(0),
                colors: vec![Green],
            }],
        },
        &mut events,
    );
    let waiting = query::waiting_stacks(&world);
    let hint = suggest_placement(query::field_view(&world), &waiting).expect("hint");
    assert_eq!(hint.cell, CellId::new(1));
}

#[test]
fn no_hint_without_waiting_stacks_or_free_cells() {
    let mut world = line(1);
    assert_eq!(suggest_placement(query::field_view(&world), &[]), None);

    seed(&mut world, 0, &[Red]);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnWave {
            stacks: vec![StackBlueprint {
                slot: SlotId::new(0),
                colors: vec![Red],
            }],
        },
        &mut events,
    );
    let waiting = query::waiting_stacks(&world);
    assert_eq!(suggest_placement(query::field_view(&world), &waiting), None);
}
