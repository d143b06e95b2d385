#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Play session controller that wires placements through the cascade,
//! spawning, and end-of-session detection.
//!
//! The session owns the world and every system. Hosts drive it with
//! [`Session::place_stack`] and either [`Session::tick`] (honouring effect
//! holds) or [`Session::resolve_cascade`] (no waiting), then drain
//! [`Notification`]s for presentation. Notifications about waves and the
//! session end are only produced once a cascade settled.

use std::time::Duration;

use hexstack_core::{
    CellId, ColorPalette, Command, Effect, Event, PlacementError, SessionConfig, SessionOutcome,
    SpawnedStack, StackId, WaveId,
};
use hexstack_system_cascade::{CascadeEngine, CascadeSummary, Progress};
use hexstack_system_moves::{has_legal_move, suggest_placement, PlacementHint};
use hexstack_system_spawning::WaveSpawner;
use hexstack_world::{self as world, query, query::FieldView, Stack, World};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

const RNG_STREAM_SPAWNING: &str = "hexstack.spawning";

/// Reasons a placement request is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A cascade is still resolving; input must wait until it settles.
    #[error("a cascade is still resolving")]
    CascadeInFlight,
    /// The session already reported its outcome.
    #[error("the session has ended")]
    SessionEnded,
    /// The world refused the placement.
    #[error("placement rejected: {0}")]
    Rejected(#[from] PlacementError),
}

/// Ordered messages for presentation layers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// Fire-and-forget transition or clear request.
    Effect(Effect),
    /// A batch of freshly spawned stacks entered the spawn slots.
    WaveSpawned {
        /// Sequence number of the wave.
        wave: WaveId,
        /// Stacks created by the wave.
        stacks: Vec<SpawnedStack>,
    },
    /// The session finished; emitted exactly once.
    SessionEnded(SessionOutcome),
}

/// Single play session over one field.
#[derive(Debug)]
pub struct Session {
    world: World,
    cascade: CascadeEngine,
    spawner: WaveSpawner,
    palette: ColorPalette,
    notifications: Vec<Notification>,
    outcome: Option<SessionOutcome>,
    wait: Duration,
    last_cascade: Option<CascadeSummary>,
}

impl Session {
    /// Builds the field, seeds authored stacks, and spawns the initial wave.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let config = config.sanitized();
        let palette = config.color_palette();
        let spawner = WaveSpawner::new(
            config.spawning.clone(),
            &palette.categories(),
            derive_stream_seed(config.seed, RNG_STREAM_SPAWNING),
        );

        let mut session = Self {
            world: World::new(),
            cascade: CascadeEngine::new(config.cascade),
            spawner,
            palette,
            notifications: Vec::new(),
            outcome: None,
            wait: Duration::ZERO,
            last_cascade: None,
        };

        let mut setup = vec![Command::ConfigureField {
            layout: config.field.layout.clone(),
            neighbor_distance: config.field.neighbor_distance,
            spawn_slots: config.field.spawn_slots,
        }];
        setup.extend(config.field.presets.iter().map(|preset| Command::SeedStack {
            cell: preset.cell,
            colors: preset.colors.clone(),
        }));
        let mut events = Vec::new();
        for command in setup {
            world::apply(&mut session.world, command, &mut events);
        }

        let slots = query::empty_spawn_slots(&session.world);
        if let Some(stacks) = session.spawner.generate_wave(&slots) {
            session.execute(vec![Command::SpawnWave { stacks }]);
        }
        info!(
            seed = config.seed,
            cells = query::field(&session.world).len(),
            "session started"
        );
        session
    }

    /// Drops a waiting stack onto an empty cell and starts its cascade.
    pub fn place_stack(&mut self, stack: StackId, cell: CellId) -> Result<(), SessionError> {
        if self.outcome.is_some() {
            return Err(SessionError::SessionEnded);
        }
        if self.cascade.is_cascading() {
            return Err(SessionError::CascadeInFlight);
        }

        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::PlaceStack { stack, cell },
            &mut events,
        );
        if let Some(reason) = events.iter().find_map(|event| match event {
            Event::PlacementRejected { reason, .. } => Some(*reason),
            _ => None,
        }) {
            return Err(SessionError::Rejected(reason));
        }

        self.observe(&events);
        self.wait = Duration::ZERO;
        Ok(())
    }

    /// Advances the in-flight cascade by `dt`, waiting out effect holds between steps.
    pub fn tick(&mut self, dt: Duration) {
        let mut budget = dt;
        while self.cascade.is_cascading() {
            if self.wait > budget {
                self.wait -= budget;
                return;
            }
            budget -= self.wait;
            self.step();
            self.wait = self.cascade.hold();
        }
        self.wait = Duration::ZERO;
    }

    /// Runs the in-flight cascade to quiescence without honouring holds.
    pub fn resolve_cascade(&mut self) {
        while self.cascade.is_cascading() {
            self.step();
        }
        self.wait = Duration::ZERO;
    }

    /// Removes and returns every notification produced so far.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Reports whether a cascade is resolving; placements are refused meanwhile.
    #[must_use]
    pub fn is_cascading(&self) -> bool {
        self.cascade.is_cascading()
    }

    /// Outcome of the session once it ended.
    #[must_use]
    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    /// Stacks waiting in spawn slots, ordered by slot.
    #[must_use]
    pub fn active_stacks(&self) -> Vec<&Stack> {
        query::waiting_stacks(&self.world)
    }

    /// Suggested next placement, if any.
    #[must_use]
    pub fn hint(&self) -> Option<PlacementHint> {
        suggest_placement(self.field(), &self.active_stacks())
    }

    /// Read-only view over the field.
    #[must_use]
    pub fn field(&self) -> FieldView<'_> {
        query::field_view(&self.world)
    }

    /// Display mapping for piece colors.
    #[must_use]
    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// Number of waves spawned, including the initial one.
    #[must_use]
    pub fn waves_spawned(&self) -> u32 {
        self.spawner.waves_spawned()
    }

    /// Tallies of the most recently resolved cascade.
    #[must_use]
    pub fn last_cascade(&self) -> Option<CascadeSummary> {
        self.last_cascade
    }

    fn step(&mut self) {
        let mut commands = Vec::new();
        let progress = self
            .cascade
            .advance(query::field_view(&self.world), &mut commands);
        self.execute(commands);

        match progress {
            Progress::Resolved(summary) => self.settle(summary),
            Progress::Pending => {}
            Progress::Idle => warn!("stepped an idle cascade"),
        }
    }

    fn execute(&mut self, commands: Vec<Command>) {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.observe(&events);
    }

    fn observe(&mut self, events: &[Event]) {
        let mut effects = Vec::new();
        self.cascade.observe(events, &mut effects);
        self.notifications
            .extend(effects.into_iter().map(Notification::Effect));

        let mut commands = Vec::new();
        self.spawner.handle(
            events,
            self.cascade.is_cascading(),
            query::waiting_stacks(&self.world).len(),
            &query::empty_spawn_slots(&self.world),
            &mut commands,
        );

        for event in events {
            if let Event::WaveSpawned { wave, stacks } = event {
                self.notifications.push(Notification::WaveSpawned {
                    wave: *wave,
                    stacks: stacks.clone(),
                });
            }
        }

        if !commands.is_empty() {
            self.execute(commands);
        }
    }

    fn settle(&mut self, summary: CascadeSummary) {
        self.last_cascade = Some(summary);

        let field = query::field_view(&self.world);
        let outcome = if field.is_cleared() {
            Some(SessionOutcome::Win)
        } else if query::waiting_stacks(&self.world).is_empty() && self.spawner.budget_exhausted()
        {
            Some(SessionOutcome::Loss)
        } else if !has_legal_move(field) {
            Some(SessionOutcome::Loss)
        } else {
            None
        };

        if let Some(outcome) = outcome {
            self.finish(outcome);
        }
    }

    fn finish(&mut self, outcome: SessionOutcome) {
        if self.outcome.is_some() {
            debug!(?outcome, "session already ended");
            return;
        }
        self.outcome = Some(outcome);
        info!(?outcome, waves = self.spawner.waves_spawned(), "session ended");
        self.notifications.push(Notification::SessionEnded(outcome));
    }
}

fn derive_stream_seed(seed: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
