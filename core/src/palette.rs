//! Mapping from color categories to display values.

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::ColorCategory;

/// Display value returned when a category has no mapping.
pub const FALLBACK_DISPLAY_COLOR: DisplayColor = DisplayColor::from_rgb(0xff, 0x00, 0xff);

/// RGB value used by presentation layers to tint a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl DisplayColor {
    /// Creates a new display color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Single authored palette mapping as it appears in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// Category being mapped.
    pub category: ColorCategory,
    /// Display value as `[red, green, blue]`.
    pub rgb: [u8; 3],
}

impl PaletteEntry {
    /// Creates a new palette entry.
    #[must_use]
    pub const fn new(category: ColorCategory, rgb: [u8; 3]) -> Self {
        Self { category, rgb }
    }
}

/// Lookup table from [`ColorCategory`] to [`DisplayColor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorPalette {
    entries: Vec<(ColorCategory, DisplayColor)>,
}

impl ColorPalette {
    /// Builds a palette from authored entries. Duplicate categories keep their first mapping.
    #[must_use]
    pub fn from_entries(entries: &[PaletteEntry]) -> Self {
        let mut mapped: Vec<(ColorCategory, DisplayColor)> = Vec::with_capacity(entries.len());
        for entry in entries {
            if mapped.iter().any(|(category, _)| *category == entry.category) {
                warn!(category = ?entry.category, "duplicate palette entry ignored");
                continue;
            }
            let [red, green, blue] = entry.rgb;
            mapped.push((entry.category, DisplayColor::from_rgb(red, green, blue)));
        }
        mapped.sort_by_key(|(category, _)| *category);
        Self { entries: mapped }
    }

    /// Resolves the display value for a category, falling back to magenta when unmapped.
    #[must_use]
    pub fn color(&self, category: ColorCategory) -> DisplayColor {
        match self.lookup(category) {
            Some(color) => color,
            None => {
                error!(?category, "color for category not found");
                FALLBACK_DISPLAY_COLOR
            }
        }
    }

    /// Resolves the display value for a category without falling back.
    #[must_use]
    pub fn lookup(&self, category: ColorCategory) -> Option<DisplayColor> {
        self.entries
            .iter()
            .find(|(mapped, _)| *mapped == category)
            .map(|(_, color)| *color)
    }

    /// Categories present in the palette, in declaration order.
    #[must_use]
    pub fn categories(&self) -> Vec<ColorCategory> {
        self.entries.iter().map(|(category, _)| *category).collect()
    }

    /// Number of mapped categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the palette maps no category at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries matching the built-in palette.
    #[must_use]
    pub fn default_entries() -> Vec<PaletteEntry> {
        vec![
            PaletteEntry::new(ColorCategory::White, [0xf2, 0xf2, 0xf2]),
            PaletteEntry::new(ColorCategory::Blue, [0x3a, 0x7b, 0xd5]),
            PaletteEntry::new(ColorCategory::Red, [0xd9, 0x3a, 0x3a]),
            PaletteEntry::new(ColorCategory::Green, [0x4c, 0xaf, 0x50]),
            PaletteEntry::new(ColorCategory::Pink, [0xf0, 0x7c, 0xc0]),
            PaletteEntry::new(ColorCategory::Yellow, [0xf5, 0xc5, 0x18]),
            PaletteEntry::new(ColorCategory::Black, [0x26, 0x26, 0x26]),
        ]
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::from_entries(&Self::default_entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_maps_every_category() {
        let palette = ColorPalette::default();
        assert_eq!(palette.categories(), ColorCategory::ALL.to_vec());
    }

    #[test]
    fn unmapped_category_falls_back_to_magenta() {
        let palette =
            ColorPalette::from_entries(&[PaletteEntry::new(ColorCategory::Red, [1, 2, 3])]);
        assert_eq!(palette.color(ColorCategory::Blue), FALLBACK_DISPLAY_COLOR);
        assert_eq!(
            palette.color(ColorCategory::Red),
            DisplayColor::from_rgb(1, 2, 3)
        );
    }

    #[test]
    fn duplicate_entries_keep_first_mapping() {
        let palette = ColorPalette::from_entries(&[
            PaletteEntry::new(ColorCategory::Green, [0, 10, 0]),
            PaletteEntry::new(ColorCategory::Green, [0, 99, 0]),
        ]);
        assert_eq!(palette.len(), 1);
        assert_eq!(
            palette.lookup(ColorCategory::Green),
            Some(DisplayColor::from_rgb(0, 10, 0))
        );
    }

    #[test]
    fn categories_follow_declaration_order() {
        let palette = ColorPalette::from_entries(&[
            PaletteEntry::new(ColorCategory::Black, [0, 0, 0]),
            PaletteEntry::new(ColorCategory::White, [255, 255, 255]),
        ]);
        assert_eq!(
            palette.categories(),
            vec![ColorCategory::White, ColorCategory::Black]
        );
    }
}
