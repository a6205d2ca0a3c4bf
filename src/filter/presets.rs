use crate::filter::table::{LookupTable, TableFilter};

/// Mirrors each channel around mid-gray: dark and bright samples both map high.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Solarize;

impl TableFilter for Solarize {
    fn table(&self) -> LookupTable {
        LookupTable::from_fn(|i| {
            let x = f64::from(i) / 255.0;
            let v = if x > 0.5 { 2.0 * (x - 0.5) } else { 2.0 * (0.5 - x) };
            v * 255.0
        })
    }
}

/// Negative image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Invert;

impl TableFilter for Invert {
    fn table(&self) -> LookupTable {
        LookupTable::from_fn(|i| f64::from(255 - i))
    }
}

/// Reduces each channel to `levels` evenly spaced values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Posterize {
    levels: u16,
}

impl Default for Posterize {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Posterize {
    /// `levels` is clamped to 2..=256.
    pub fn new(levels: u16) -> Self {
        Self {
            levels: levels.clamp(2, 256),
        }
    }

    pub fn levels(self) -> u16 {
        self.levels
    }

    pub fn set_levels(&mut self, levels: u16) {
        self.levels = levels.clamp(2, 256);
    }
}

impl TableFilter for Posterize {
    fn table(&self) -> LookupTable {
        let steps = f64::from(self.levels - 1);
        LookupTable::from_fn(|i| {
            let bucket = (f64::from(i) * steps / 255.0).round();
            // nudge so truncation lands on the exact step value
            bucket * 255.0 / steps + 1e-9
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/presets.rs"]
mod tests;
