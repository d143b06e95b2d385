//! Setup-time configuration surface loaded by adapters.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{CellId, ColorCategory, ColorPalette, FieldLayout, PaletteEntry};

/// Centre distance under which two unit-spaced hex cells are neighbours.
pub const DEFAULT_NEIGHBOR_DISTANCE: f32 = 1.4;

const DEFAULT_COMPLETION_THRESHOLD: u32 = 10;
const DEFAULT_BASE_DURATION_MS: u64 = 250;
const DEFAULT_ACCELERATION: f32 = 1.3;
const DEFAULT_PIECE_STAGGER_MS: u64 = 10;
const DEFAULT_MIN_PIECES: u32 = 2;
const DEFAULT_MAX_PIECES: u32 = 8;
const DEFAULT_PLACEMENTS_PER_WAVE: u32 = 3;
const DEFAULT_SPAWN_SLOTS: u32 = 3;
const MAX_HEXAGON_RADIUS: u32 = 32;
const MAX_SPAWN_SLOTS: u32 = 16;

/// Complete configuration of a play session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Global seed from which every random stream is derived.
    pub seed: u64,
    /// Field geometry and authored presets.
    pub field: FieldConfig,
    /// Cascade tuning.
    pub cascade: CascadeConfig,
    /// Wave composition and cadence.
    pub spawning: SpawnConfig,
    /// Category to display value mappings.
    pub palette: Vec<PaletteEntry>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_4e78_57ac_0001,
            field: FieldConfig::default(),
            cascade: CascadeConfig::default(),
            spawning: SpawnConfig::default(),
            palette: ColorPalette::default_entries(),
        }
    }
}

impl SessionConfig {
    /// Replaces authoring mistakes with safe values, logging every substitution.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let cascade = &mut self.cascade;
        if cascade.completion_threshold == 0 {
            warn!("completion threshold must be positive, using default");
            cascade.completion_threshold = DEFAULT_COMPLETION_THRESHOLD;
        }
        if !cascade.acceleration.is_finite() || cascade.acceleration <= 1.0 {
            warn!(
                acceleration = cascade.acceleration,
                "acceleration must exceed one, using default"
            );
            cascade.acceleration = DEFAULT_ACCELERATION;
        }
        let threshold_pieces = cascade.completion_threshold;
        let threshold = threshold_pieces as usize;

        let field = &mut self.field;
        if let FieldLayout::Hexagon { radius } = &mut field.layout {
            if *radius > MAX_HEXAGON_RADIUS {
                warn!(
                    radius = *radius,
                    max = MAX_HEXAGON_RADIUS,
                    "hexagon radius too large, clamping"
                );
                *radius = MAX_HEXAGON_RADIUS;
            }
        }
        if !field.neighbor_distance.is_finite() || field.neighbor_distance <= 0.0 {
            warn!(
                neighbor_distance = field.neighbor_distance,
                "invalid neighbor distance, using default"
            );
            field.neighbor_distance = DEFAULT_NEIGHBOR_DISTANCE;
        }
        if field.spawn_slots == 0 {
            warn!("spawn slot count must be positive, using one slot");
            field.spawn_slots = 1;
        } else if field.spawn_slots > MAX_SPAWN_SLOTS {
            warn!(
                spawn_slots = field.spawn_slots,
                max = MAX_SPAWN_SLOTS,
                "too many spawn slots, clamping"
            );
            field.spawn_slots = MAX_SPAWN_SLOTS;
        }
        field.presets.retain(|preset| {
            if preset.colors.is_empty() {
                warn!(cell = preset.cell.get(), "empty preset stack ignored");
                false
            } else if longest_run(&preset.colors) >= threshold {
                warn!(
                    cell = preset.cell.get(),
                    threshold, "preset stack already holds a complete run, ignored"
                );
                false
            } else {
                true
            }
        });

        let spawning = &mut self.spawning;
        if spawning.min_pieces == 0 {
            warn!("stacks cannot spawn empty, raising minimum length to one");
            spawning.min_pieces = 1;
        }
        if spawning.max_pieces <= spawning.min_pieces {
            warn!(
                min = spawning.min_pieces,
                max = spawning.max_pieces,
                "empty spawn length range, spawning minimum length only"
            );
            spawning.max_pieces = spawning.min_pieces + 1;
        }
        // Random stacks may be a single colour, so their length bounds the run.
        let longest_random = spawning.max_pieces.saturating_sub(1).max(spawning.min_pieces);
        if longest_random >= threshold_pieces {
            warn!(
                min = spawning.min_pieces,
                max = spawning.max_pieces,
                threshold = threshold_pieces,
                "random stacks could spawn complete, shrinking length range"
            );
            spawning.max_pieces = threshold_pieces;
            spawning.min_pieces = spawning
                .min_pieces
                .min(threshold_pieces.saturating_sub(1))
                .max(1);
        }
        for (index, colors) in spawning.scripted.iter_mut().enumerate() {
            if longest_run(colors) >= threshold {
                warn!(
                    index,
                    threshold, "scripted stack already holds a complete run, spawning a random one"
                );
                colors.clear();
            }
        }
        if spawning.placements_per_wave == 0 {
            warn!("placements per wave must be positive, using default");
            spawning.placements_per_wave = DEFAULT_PLACEMENTS_PER_WAVE;
        }

        self
    }

    /// Builds the palette lookup table from the authored entries.
    #[must_use]
    pub fn color_palette(&self) -> ColorPalette {
        ColorPalette::from_entries(&self.palette)
    }
}

/// Field geometry and authored initial stacks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Geometry used to lay out cells.
    pub layout: FieldLayout,
    /// Maximum centre distance at which two cells are neighbours.
    pub neighbor_distance: f32,
    /// Number of off-field spawn slots.
    pub spawn_slots: u32,
    /// Stacks present on the field before the first placement.
    pub presets: Vec<CellPreset>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            layout: FieldLayout::default(),
            neighbor_distance: DEFAULT_NEIGHBOR_DISTANCE,
            spawn_slots: DEFAULT_SPAWN_SLOTS,
            presets: Vec::new(),
        }
    }
}

/// Authored stack seeded onto a cell at setup time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPreset {
    /// Cell receiving the stack.
    pub cell: CellId,
    /// Piece colors from bottom to top.
    pub colors: Vec<ColorCategory>,
}

/// Cascade tuning knobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Run length that triggers a clear.
    pub completion_threshold: u32,
    /// Duration of the first merge in a cascade, in milliseconds.
    pub base_duration_ms: u64,
    /// Speed multiplier applied after every merge round; must exceed one.
    pub acceleration: f32,
    /// Per-piece stagger used for holds and effect offsets, in milliseconds.
    pub piece_stagger_ms: u64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
            base_duration_ms: DEFAULT_BASE_DURATION_MS,
            acceleration: DEFAULT_ACCELERATION,
            piece_stagger_ms: DEFAULT_PIECE_STAGGER_MS,
        }
    }
}

impl CascadeConfig {
    /// Duration of the first merge in a cascade.
    #[must_use]
    pub const fn base_duration(&self) -> Duration {
        Duration::from_millis(self.base_duration_ms)
    }

    /// Per-piece stagger at normal speed.
    #[must_use]
    pub const fn piece_stagger(&self) -> Duration {
        Duration::from_millis(self.piece_stagger_ms)
    }
}

/// Wave composition and cadence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Inclusive lower bound of random stack length.
    pub min_pieces: u32,
    /// Exclusive upper bound of random stack length.
    pub max_pieces: u32,
    /// Authored compositions consumed one per spawned stack before random generation.
    pub scripted: Vec<Vec<ColorCategory>>,
    /// Maximum number of waves; zero or negative means unlimited.
    pub wave_budget: i32,
    /// Placements required before the next wave spawns.
    pub placements_per_wave: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            min_pieces: DEFAULT_MIN_PIECES,
            max_pieces: DEFAULT_MAX_PIECES,
            scripted: Vec::new(),
            wave_budget: 0,
            placements_per_wave: DEFAULT_PLACEMENTS_PER_WAVE,
        }
    }
}

impl SpawnConfig {
    /// Finite wave cap, if one is configured.
    #[must_use]
    pub fn wave_limit(&self) -> Option<u32> {
        u32::try_from(self.wave_budget).ok().filter(|limit| *limit > 0)
    }
}

/// Length of the longest contiguous same-colour run anywhere in `colors`.
fn longest_run(colors: &[ColorCategory]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;
    for color in colors {
        current = if previous == Some(color) { current + 1 } else { 1 };
        longest = longest.max(current);
        previous = Some(color);
    }
    longest
}
