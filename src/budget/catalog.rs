//! Read-only reference data: typical market ranges and the splitter catalog.

use serde::{Deserialize, Serialize};

use super::params::LinkField;

// ============================================================================
// Typical Ranges
// ============================================================================

/// Inclusive typical range for one link quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypicalRange {
    pub min: f64,
    pub max: f64,
}

impl TypicalRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `min <= value <= max`. NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Typical-range table indexed by field.
///
/// Only transmit power, receiver sensitivity, attenuation, connector loss and
/// safety margin carry a range. Length, connector count and splitter loss are
/// never range-checked.
#[derive(Debug, Clone, PartialEq)]
pub struct TypicalRanges {
    ranges: [Option<TypicalRange>; 8],
}

impl Default for TypicalRanges {
    fn default() -> Self {
        let mut table = Self { ranges: [None; 8] };
        table.ranges[LinkField::TransmitPower as usize] = Some(TypicalRange::new(1.0, 7.0));
        table.ranges[LinkField::ReceiverSensitivity as usize] = Some(TypicalRange::new(-30.0, -25.0));
        table.ranges[LinkField::FiberAttenuation as usize] = Some(TypicalRange::new(0.20, 0.50));
        table.ranges[LinkField::ConnectorLoss as usize] = Some(TypicalRange::new(0.20, 0.75));
        table.ranges[LinkField::SafetyMargin as usize] = Some(TypicalRange::new(1.5, 3.0));
        table
    }
}

impl TypicalRanges {
    /// Whether a field has a defined typical range at all.
    pub const fn supports(field: LinkField) -> bool {
        !matches!(
            field,
            LinkField::FiberLength | LinkField::ConnectorCount | LinkField::SplitterLoss
        )
    }

    pub fn get(&self, field: LinkField) -> Option<TypicalRange> {
        self.ranges[field as usize]
    }

    /// Replace the range of a supported field. Returns `false` (and changes
    /// nothing) for fields that are never range-checked.
    pub fn set(&mut self, field: LinkField, range: TypicalRange) -> bool {
        if !Self::supports(field) {
            return false;
        }
        self.ranges[field as usize] = Some(range);
        true
    }

    /// Ranged fields in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (LinkField, TypicalRange)> + '_ {
        LinkField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|range| (field, range)))
    }
}

// ============================================================================
// Splitter Catalog
// ============================================================================

/// A standard split ratio and its typical insertion loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitterEntry {
    /// Ratio label, e.g. "1:32"
    pub ratio: String,
    /// Typical insertion loss (dB)
    pub loss_db: f64,
}

impl SplitterEntry {
    pub fn new(ratio: impl Into<String>, loss_db: f64) -> Self {
        Self {
            ratio: ratio.into(),
            loss_db,
        }
    }

    /// Number of output ports parsed from a "1:N" label.
    pub fn ports(&self) -> Option<u32> {
        let (head, tail) = self.ratio.split_once(':')?;
        if head.trim() != "1" {
            return None;
        }
        tail.trim().parse().ok()
    }
}

/// Splitter catalog, always held in ascending loss order.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitterCatalog {
    entries: Vec<SplitterEntry>,
}

impl Default for SplitterCatalog {
    fn default() -> Self {
        Self::new(default_splitters())
    }
}

/// Typical insertion losses of standard PLC splitters.
pub fn default_splitters() -> Vec<SplitterEntry> {
    vec![
        SplitterEntry::new("1:2", 3.8),
        SplitterEntry::new("1:4", 7.3),
        SplitterEntry::new("1:8", 10.7),
        SplitterEntry::new("1:16", 14.1),
        SplitterEntry::new("1:32", 17.5),
        SplitterEntry::new("1:64", 21.0),
    ]
}

impl SplitterCatalog {
    /// Build a catalog, sorting by loss. Equal losses keep their input order.
    pub fn new(mut entries: Vec<SplitterEntry>) -> Self {
        entries.sort_by(|a, b| a.loss_db.total_cmp(&b.loss_db));
        Self { entries }
    }

    pub fn entries(&self) -> &[SplitterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest-loss entry whose loss still fits within `max_loss_db`.
    ///
    /// Returns the entry together with its rank in ascending-loss order, or
    /// `None` when even the smallest splitter exceeds the budget.
    pub fn best_fit(&self, max_loss_db: f64) -> Option<(usize, &SplitterEntry)> {
        let mut best = None;
        for (rank, entry) in self.entries.iter().enumerate() {
            if entry.loss_db <= max_loss_db {
                best = Some((rank, entry));
            }
        }
        best
    }
}
