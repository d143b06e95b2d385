use std::time::Duration;

use hexstack_core::ColorCategory::{Blue, Green, Red};
use hexstack_core::{
    CellId, CellPreset, ColorCategory, Effect, FieldConfig, FieldLayout, PlacementError,
    SessionConfig, SessionOutcome, SpawnConfig,
};
use hexstack_system_session::{Notification, Session, SessionError};

fn line_config(cells: usize, presets: &[(u32, &[ColorCategory])]) -> SessionConfig {
    SessionConfig {
        field: FieldConfig {
            layout: FieldLayout::Custom {
                positions: (0..cells).map(|index| [index as f32, 0.0]).collect(),
            },
            spawn_slots: 1,
            presets: presets
                .iter()
                .map(|(cell, colors)| CellPreset {
                    cell: CellId::new(*cell),
                    colors: colors.to_vec(),
                })
                .collect(),
            ..FieldConfig::default()
        },
        ..SessionConfig::default()
    }
}

fn scripted(config: &mut SessionConfig, stacks: &[&[ColorCategory]]) {
    config.spawning.scripted = stacks.iter().map(|colors| colors.to_vec()).collect();
}

fn place_first(session: &mut Session, cell: u32) -> Result<(), SessionError> {
    let stack = session.active_stacks()[0].id();
    session.place_stack(stack, CellId::new(cell))
}

fn endings(notifications: &[Notification]) -> Vec<SessionOutcome> {
    notifications
        .iter()
        .filter_map(|notification| match notification {
            Notification::SessionEnded(outcome) => Some(*outcome),
            _ => None,
        })
        .collect()
}

#[test]
fn initial_wave_fills_every_slot() {
    let mut session = Session::new(SessionConfig::default());
    assert_eq!(session.active_stacks().len(), 3);
    assert_eq!(session.waves_spawned(), 1);
    assert_eq!(session.field().cell_count(), 19);

    let notifications = session.drain_notifications();
    assert!(matches!(
        notifications.as_slice(),
        [Notification::WaveSpawned { stacks, .. }] if stacks.len() == 3
    ));
    assert!(session.drain_notifications().is_empty());
}

#[test]
fn placement_onto_occupied_cell_is_rejected() {
    let mut session = Session::new(line_config(3, &[(1, &[Blue])]));
    assert_eq!(
        place_first(&mut session, 1),
        Err(SessionError::Rejected(PlacementError::CellOccupied))
    );
    assert_eq!(session.active_stacks().len(), 1);
    assert!(!session.is_cascading());
}

#[test]
fn placement_is_refused_while_cascading() {
    let mut config = line_config(3, &[(1, &[Red])]);
    config.field.spawn_slots = 2;
    scripted(&mut config, &[&[Red], &[Blue]]);
    let mut session = Session::new(config);

    place_first(&mut session, 0).expect("first placement");
    assert!(session.is_cascading());
    assert_eq!(
        place_first(&mut session, 2),
        Err(SessionError::CascadeInFlight)
    );

    session.resolve_cascade();
    assert!(!session.is_cascading());
    place_first(&mut session, 2).expect("placement after the cascade");
}

#[test]
fn single_neighbour_merge_moves_placed_piece() {
    let mut config = line_config(3, &[(1, &[Red])]);
    scripted(&mut config, &[&[Red]]);
    let mut session = Session::new(config);

    place_first(&mut session, 0).expect("placement");
    session.resolve_cascade();

    let field = session.field();
    assert!(!field.is_occupied(CellId::new(0)));
    assert_eq!(
        field.stack_at(CellId::new(1)).map(|stack| stack.colors()),
        Some(vec![Red, Red])
    );
    assert_eq!(session.last_cascade().map(|summary| summary.merges), Some(1));
    assert_eq!(session.outcome(), None);
}

#[test]
fn clearing_the_last_stack_wins() {
    let mut config = line_config(2, &[(1, &[Red; 9])]);
    scripted(&mut config, &[&[Red]]);
    let mut session = Session::new(config);
    let _ = session.drain_notifications();

    place_first(&mut session, 0).expect("placement");
    session.resolve_cascade();

    assert_eq!(session.outcome(), Some(SessionOutcome::Win));
    assert!(session.field().is_cleared());
    let notifications = session.drain_notifications();
    assert_eq!(endings(&notifications), vec![SessionOutcome::Win]);
    assert!(notifications
        .iter()
        .any(|notification| matches!(notification, Notification::Effect(Effect::Clear { pieces, .. }) if pieces.len() == 10)));

    assert_eq!(
        place_first(&mut session, 0),
        Err(SessionError::SessionEnded)
    );
}

#[test]
fn exhausted_budget_without_waiting_stacks_loses() {
    let mut config = line_config(3, &[(2, &[Green])]);
    config.spawning = SpawnConfig {
        wave_budget: 2,
        placements_per_wave: 1,
        ..SpawnConfig::default()
    };
    scripted(&mut config, &[&[Red], &[Blue]]);
    let mut session = Session::new(config);

    place_first(&mut session, 0).expect("first placement");
    session.resolve_cascade();
    assert_eq!(session.outcome(), None);
    assert_eq!(session.waves_spawned(), 2);

    place_first(&mut session, 1).expect("second placement");
    session.resolve_cascade();
    assert!(session.active_stacks().is_empty());
    assert_eq!(session.outcome(), Some(SessionOutcome::Loss));
    assert_eq!(
        endings(&session.drain_notifications()),
        vec![SessionOutcome::Loss]
    );
}

#[test]
fn full_field_without_matches_loses_despite_remaining_budget() {
    let mut config = line_config(2, &[(1, &[Red])]);
    scripted(&mut config, &[&[Blue]]);
    let mut session = Session::new(config);

    place_first(&mut session, 0).expect("placement");
    session.resolve_cascade();

    assert_eq!(session.outcome(), Some(SessionOutcome::Loss));
    assert_eq!(session.active_stacks().len(), 1);
}

#[test]
fn authored_complete_runs_never_reach_the_field() {
    let mut preset = vec![Red; 10];
    preset.extend([Blue; 9]);
    let mut config = line_config(2, &[(1, &preset)]);
    scripted(&mut config, &[&[Blue]]);
    let mut session = Session::new(config);
    assert!(!session.field().is_occupied(CellId::new(1)));

    place_first(&mut session, 0).expect("placement");
    session.resolve_cascade();

    let field = session.field();
    for cell in field.cells() {
        if let Some(stack) = field.stack_at(cell) {
            assert!(stack.top_run_len() < 10, "complete run left on {cell:?}");
        }
    }
    assert_eq!(session.outcome(), None);
}

#[test]
fn tick_waits_out_effect_holds() {
    let mut config = line_config(3, &[(1, &[Red]), (2, &[Red])]);
    scripted(&mut config, &[&[Red]]);
    let mut session = Session::new(config);
    let _ = session.drain_notifications();

    place_first(&mut session, 0).expect("placement");
    session.tick(Duration::ZERO);
    assert!(session.is_cascading());
    assert_eq!(session.drain_notifications().len(), 1);

    session.tick(Duration::from_millis(100));
    assert!(session.is_cascading());
    assert!(session.drain_notifications().is_empty());

    session.tick(Duration::from_secs(5));
    assert!(!session.is_cascading());
    assert_eq!(
        session
            .field()
            .stack_at(CellId::new(2))
            .map(|stack| stack.len()),
        Some(3)
    );
}

#[test]
fn identical_seeds_replay_identically() {
    let first = autoplay(SessionConfig::default(), 30);
    let second = autoplay(SessionConfig::default(), 30);
    assert_eq!(first, second);

    let other = autoplay(
        SessionConfig {
            seed: 99,
            ..SessionConfig::default()
        },
        30,
    );
    assert_ne!(first, other);
}

#[test]
fn waves_follow_the_placement_cadence() {
    let mut session = Session::new(SessionConfig::default());
    for _ in 0..2 {
        let hint = session.hint().expect("hint");
        session.place_stack(hint.stack, hint.cell).expect("placement");
        session.resolve_cascade();
        if session.outcome().is_some() {
            return;
        }
    }
    assert_eq!(session.waves_spawned(), 1);

    let hint = session.hint().expect("hint");
    session.place_stack(hint.stack, hint.cell).expect("placement");
    session.resolve_cascade();
    if session.outcome().is_none() {
        assert_eq!(session.waves_spawned(), 2);
        assert_eq!(session.active_stacks().len(), 3);
    }
}

fn autoplay(config: SessionConfig, placements: usize) -> Vec<Notification> {
    let mut session = Session::new(config);
    let mut log = session.drain_notifications();
    for _ in 0..placements {
        if session.outcome().is_some() {
            break;
        }
        let Some(hint) = session.hint() else {
            break;
        };
        session
            .place_stack(hint.stack, hint.cell)
            .expect("hinted placement is legal");
        session.resolve_cascade();
        log.extend(session.drain_notifications());
    }
    log
}
