//! Normalization and aggregation of occurrence records.
//!
//! Normalization validates every record's period code and applies the unit
//! sentinel; aggregation is then a pure function from the cleaned records to
//! five count tables.  The original relied on incidental grouping order for
//! charts and tables; here the order is explicit: periods are chronological,
//! categorical keys (type, company, unit) are alphabetical.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ReportError;
use crate::model::{clean_unit_name, CleanRecord, OccurrenceRecord, OccurrenceType, PeriodCode};

/// Per-unit occurrence counts, keyed by type.
///
/// The six canonical categories always have a counter, even when zero, so the
/// report table keeps its fixed width.  Labels outside the canonical set are
/// counted apart instead of being spliced into the fixed schema.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeCounts {
    known: [u64; 6],
    other: BTreeMap<String, u64>,
}

impl TypeCounts {
    /// Returns the count for the given type (zero when never observed).
    pub fn get(&self, occurrence_type: &OccurrenceType) -> u64 {
        match known_index(occurrence_type) {
            Some(index) => self.known[index],
            None => self
                .other
                .get(occurrence_type.label())
                .copied()
                .unwrap_or(0),
        }
    }

    /// Returns the counts that fell outside the canonical categories.
    pub fn other(&self) -> &BTreeMap<String, u64> {
        &self.other
    }

    /// Sum over all categories, canonical and otherwise.
    pub fn total(&self) -> u64 {
        self.known.iter().sum::<u64>() + self.other.values().sum::<u64>()
    }

    fn increment(&mut self, occurrence_type: &OccurrenceType) {
        match known_index(occurrence_type) {
            Some(index) => self.known[index] += 1,
            None => {
                *self
                    .other
                    .entry(occurrence_type.label().to_owned())
                    .or_insert(0) += 1;
            }
        }
    }
}

fn known_index(occurrence_type: &OccurrenceType) -> Option<usize> {
    OccurrenceType::KNOWN
        .iter()
        .position(|known| known == occurrence_type)
}

/// The five count tables driving the charts and the report tables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Records per period, in chronological order.
    pub by_period: BTreeMap<PeriodCode, u64>,
    /// Records per occurrence type label, in alphabetical order.
    pub by_type: BTreeMap<String, u64>,
    /// Records per company, in alphabetical order.
    pub by_company: BTreeMap<String, u64>,
    /// Records per cleaned unit name, in alphabetical order.
    pub by_unit: BTreeMap<String, u64>,
    /// Per-unit type breakdown; key set matches `by_unit` exactly.
    pub by_unit_type: BTreeMap<String, TypeCounts>,
    /// Non-canonical type labels observed anywhere in the record set.
    pub unknown_types: BTreeSet<String>,
}

impl Aggregation {
    /// Total number of aggregated records.
    pub fn total_records(&self) -> u64 {
        self.by_period.values().sum()
    }
}

/// Validates and cleans the raw record set.
///
/// A single malformed period code aborts the run; silently skipping records
/// would produce a report that understates the period totals.
pub fn normalize(records: Vec<OccurrenceRecord>) -> Result<Vec<CleanRecord>, ReportError> {
    records
        .into_iter()
        .map(|record| {
            let period: PeriodCode = record.period.parse()?;
            Ok(CleanRecord {
                contract: record.contract,
                period,
                occurrence_type: record.occurrence_type,
                company: record.company,
                unit: clean_unit_name(record.unit.as_deref()),
            })
        })
        .collect()
}

/// Builds the five count tables from the cleaned records.
///
/// An empty input produces empty tables, not an error.
pub fn aggregate(records: &[CleanRecord]) -> Aggregation {
    let mut aggregation = Aggregation::default();

    for record in records {
        *aggregation
            .by_period
            .entry(record.period.clone())
            .or_insert(0) += 1;
        *aggregation
            .by_type
            .entry(record.occurrence_type.label().to_owned())
            .or_insert(0) += 1;
        *aggregation
            .by_company
            .entry(record.company.clone())
            .or_insert(0) += 1;
        *aggregation.by_unit.entry(record.unit.clone()).or_insert(0) += 1;

        aggregation
            .by_unit_type
            .entry(record.unit.clone())
            .or_default()
            .increment(&record.occurrence_type);

        if !record.occurrence_type.is_known() {
            aggregation
                .unknown_types
                .insert(record.occurrence_type.label().to_owned());
        }
    }

    aggregation
}
