#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for refilling the spawn slots.

use hexstack_core::{ColorCategory, Command, Event, SlotId, SpawnConfig, StackBlueprint};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, trace, warn};

const FALLBACK_COLORS: [ColorCategory; 2] = [ColorCategory::White, ColorCategory::Blue];

/// Pure system that decides when waves spawn and what they contain.
#[derive(Debug)]
pub struct WaveSpawner {
    config: SpawnConfig,
    palette: Vec<ColorCategory>,
    rng: ChaCha8Rng,
    scripted_index: usize,
    waves_spawned: u32,
    placements: u32,
    pending: bool,
}

impl WaveSpawner {
    /// Creates a spawner drawing random colors from `palette` with the provided seed.
    #[must_use]
    pub fn new(config: SpawnConfig, palette: &[ColorCategory], seed: u64) -> Self {
        Self {
            config,
            palette: palette.to_vec(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            scripted_index: 0,
            waves_spawned: 0,
            placements: 0,
            pending: false,
        }
    }

    /// Number of waves generated so far.
    #[must_use]
    pub fn waves_spawned(&self) -> u32 {
        self.waves_spawned
    }

    /// Reports whether the wave budget forbids any further wave.
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.config
            .wave_limit()
            .map_or(false, |limit| self.waves_spawned >= limit)
    }

    /// Reports whether a wave has been requested but not yet emitted.
    #[must_use]
    pub fn wave_pending(&self) -> bool {
        self.pending
    }

    /// Produces one blueprint per slot, or `None` once the wave budget is spent.
    pub fn generate_wave(&mut self, slots: &[SlotId]) -> Option<Vec<StackBlueprint>> {
        if self.budget_exhausted() {
            debug!(waves = self.waves_spawned, "wave budget exhausted");
            return None;
        }

        let stacks = slots
            .iter()
            .map(|slot| StackBlueprint {
                slot: *slot,
                colors: self.next_composition(),
            })
            .collect();
        self.waves_spawned += 1;
        Some(stacks)
    }

    /// Counts placements and emits a spawn command once a requested wave may land.
    ///
    /// Waves are held back while `cascading` so observers only ever see the
    /// field after a cascade settled. A wave is also requested when no stack
    /// is waiting, so a slot count smaller than the placement cadence cannot
    /// starve the player.
    pub fn handle(
        &mut self,
        events: &[Event],
        cascading: bool,
        waiting: usize,
        empty_slots: &[SlotId],
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::StackPlaced { .. } = event {
                self.placements += 1;
                if self.placements >= self.config.placements_per_wave {
                    self.placements = 0;
                    self.pending = true;
                }
            }
        }

        if cascading {
            return;
        }
        if waiting == 0 && !self.budget_exhausted() {
            self.pending = true;
        }
        if !self.pending {
            return;
        }
        self.pending = false;

        if empty_slots.is_empty() {
            trace!("every spawn slot is occupied, skipping wave");
            return;
        }
        if let Some(stacks) = self.generate_wave(empty_slots) {
            out.push(Command::SpawnWave { stacks });
        }
    }

    fn next_composition(&mut self) -> Vec<ColorCategory> {
        let index = self.scripted_index;
        self.scripted_index += 1;

        if let Some(scripted) = self.config.scripted.get(index) {
            if !scripted.is_empty() {
                return scripted.clone();
            }
            warn!(index, "scripted stack is empty, generating a random one");
        }
        self.random_composition()
    }

    fn random_composition(&mut self) -> Vec<ColorCategory> {
        let min = self.config.min_pieces.max(1);
        let amount = if self.config.max_pieces > min {
            self.rng.gen_range(min..self.config.max_pieces)
        } else {
            min
        };
        let first_run = self.rng.gen_range(0..amount);
        let [first, second] = self.random_color_pair();

        (0..amount)
            .map(|index| if index < first_run { first } else { second })
            .collect()
    }

    fn random_color_pair(&mut self) -> [ColorCategory; 2] {
        if self.palette.len() < 2 {
            error!(
                available = self.palette.len(),
                "not enough colors for random stacks, using fallback pair"
            );
            return FALLBACK_COLORS;
        }

        let mut remaining = self.palette.clone();
        let first = remaining.remove(self.rng.gen_range(0..remaining.len()));
        let second = remaining[self.rng.gen_range(0..remaining.len())];
        [first, second]
    }
}
