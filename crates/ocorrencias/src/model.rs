//! Domain types for occurrence records and reporting periods.
//!
//! The types in this module form the value model shared by the query, aggregation
//! and rendering stages.  They intentionally avoid referencing the store or the
//! rendering crates so the values can be produced by any frontend (remote fetch,
//! canned fixtures in tests) without pulling in heavy dependencies.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Placeholder used when a record carries no usable unit name.
pub const UNIT_NOT_INFORMED: &str = "NÃO INFORMADO";

/// Error produced when a compact period code cannot be parsed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid period code {code:?}: {reason}")]
pub struct PeriodCodeError {
    /// The raw input that was rejected.
    pub code: String,
    /// Human-readable description of the rejection.
    pub reason: String,
}

impl PeriodCodeError {
    fn new(code: &str, reason: impl Into<String>) -> Self {
        Self {
            code: code.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Compact `YYMM` identifier for a calendar month.
///
/// Parsing requires exactly four ASCII digits with a month between `01` and
/// `12`; two-digit years are anchored to the 2000s.  Ordering is chronological
/// (year first, then month), which fixes the bar-chart axis order and the
/// period table order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodCode {
    year: u16,
    month: u8,
}

impl PeriodCode {
    /// Creates a period from a full year and a month.
    pub fn new(year: u16, month: u8) -> Result<Self, PeriodCodeError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodCodeError::new(
                &format!("{:02}{:02}", year % 100, month),
                format!("month {} is outside 01-12", month),
            ));
        }
        Ok(Self { year, month })
    }

    /// Returns the full calendar year (e.g. `2024`).
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Returns the month number (`1..=12`).
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Returns the compact wire form used as the query filter value, e.g. `"2406"`.
    pub fn code(&self) -> String {
        format!("{:02}{:02}", self.year % 100, self.month)
    }

    /// Returns the human-readable label used on charts and tables, e.g. `"06-2024"`.
    pub fn label(&self) -> String {
        format!("{:02}-{}", self.month, self.year)
    }
}

impl FromStr for PeriodCode {
    type Err = PeriodCodeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.len() != 4 || !input.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(PeriodCodeError::new(
                input,
                "expected exactly four digits (YYMM)",
            ));
        }
        // The split cannot fail after the digit check above.
        let year: u16 = input[..2].parse().map_err(|_| {
            PeriodCodeError::new(input, "unparseable year digits")
        })?;
        let month: u8 = input[2..].parse().map_err(|_| {
            PeriodCodeError::new(input, "unparseable month digits")
        })?;
        if !(1..=12).contains(&month) {
            return Err(PeriodCodeError::new(
                input,
                format!("month {:02} is outside 01-12", month),
            ));
        }
        Ok(Self {
            year: 2000 + year,
            month,
        })
    }
}

impl fmt::Display for PeriodCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.code())
    }
}

/// Classification of an occurrence.
///
/// The six canonical categories come with fixed columns in the per-unit report
/// table.  Labels observed in the store that match none of them are preserved
/// verbatim in [`OccurrenceType::Other`] instead of being spliced into the
/// fixed table schema; the aggregation stage surfaces them as validation
/// warnings.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OccurrenceType {
    /// Abandonment of post.
    AbandonoDePosto,
    /// Justified delay (with certificate).
    AtrasoJustificado,
    /// Unjustified delay.
    AtrasoInjustificado,
    /// Justified absence (with certificate).
    FaltaJustificada,
    /// Unjustified absence.
    FaltaInjustificada,
    /// Early departure.
    SaidaAntecipada,
    /// Any label outside the canonical set, kept verbatim.
    Other(String),
}

impl OccurrenceType {
    /// The canonical categories in report column order.
    pub const KNOWN: [OccurrenceType; 6] = [
        OccurrenceType::AbandonoDePosto,
        OccurrenceType::AtrasoJustificado,
        OccurrenceType::AtrasoInjustificado,
        OccurrenceType::FaltaJustificada,
        OccurrenceType::FaltaInjustificada,
        OccurrenceType::SaidaAntecipada,
    ];

    /// Maps a raw store label onto a type, falling back to [`OccurrenceType::Other`].
    ///
    /// Matching is exact (case- and diacritic-sensitive), mirroring the store's
    /// own vocabulary.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Abandono de posto" => Self::AbandonoDePosto,
            "Atraso (Atestado/Justificado)" => Self::AtrasoJustificado,
            "Atraso (Injustificado)" => Self::AtrasoInjustificado,
            "Falta (Atestada/Justificada)" => Self::FaltaJustificada,
            "Falta (Injustificada)" => Self::FaltaInjustificada,
            "Saída antecipada" => Self::SaidaAntecipada,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the full label as stored in the document database.
    pub fn label(&self) -> &str {
        match self {
            Self::AbandonoDePosto => "Abandono de posto",
            Self::AtrasoJustificado => "Atraso (Atestado/Justificado)",
            Self::AtrasoInjustificado => "Atraso (Injustificado)",
            Self::FaltaJustificada => "Falta (Atestada/Justificada)",
            Self::FaltaInjustificada => "Falta (Injustificada)",
            Self::SaidaAntecipada => "Saída antecipada",
            Self::Other(label) => label,
        }
    }

    /// Returns the abbreviated column header used in the per-unit PDF table.
    pub fn short_label(&self) -> &str {
        match self {
            Self::AbandonoDePosto => "Ab. Posto",
            Self::AtrasoJustificado => "Atraso (A/J)",
            Self::AtrasoInjustificado => "Atraso (I)",
            Self::FaltaJustificada => "Falta (A/J)",
            Self::FaltaInjustificada => "Falta (I)",
            Self::SaidaAntecipada => "Saída Ant.",
            Self::Other(label) => label,
        }
    }

    /// Indicates whether the type belongs to the canonical six-category set.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for OccurrenceType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// One flattened occurrence document as returned by the store.
///
/// The period is kept in its raw wire form here; deriving a [`PeriodCode`] (and
/// rejecting malformed codes) is the normalization stage's job.
#[derive(Clone, Debug, PartialEq)]
pub struct OccurrenceRecord {
    /// Contract the occurrence belongs to.
    pub contract: i64,
    /// Raw `YYMM` period code as stored.
    pub period: String,
    /// Occurrence classification.
    pub occurrence_type: OccurrenceType,
    /// Company the employee belongs to.
    pub company: String,
    /// Organizational unit; may be absent or blank in the store.
    pub unit: Option<String>,
}

/// A record after normalization: validated period, sentinel-filled unit.
#[derive(Clone, Debug, PartialEq)]
pub struct CleanRecord {
    /// Contract the occurrence belongs to.
    pub contract: i64,
    /// Parsed period code.
    pub period: PeriodCode,
    /// Occurrence classification.
    pub occurrence_type: OccurrenceType,
    /// Company the employee belongs to.
    pub company: String,
    /// Unit name, with the sentinel substituted for blank or absent values.
    pub unit: String,
}

/// Trims a raw unit name and substitutes the sentinel for blank or absent values.
///
/// Trimming happens before blank detection so whitespace-only values are also
/// replaced.  The function is idempotent.
pub fn clean_unit_name(raw: Option<&str>) -> String {
    match raw {
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                UNIT_NOT_INFORMED.to_owned()
            } else {
                trimmed.to_owned()
            }
        }
        None => UNIT_NOT_INFORMED.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_unit_name, OccurrenceType, PeriodCode, UNIT_NOT_INFORMED};

    #[test]
    fn period_code_derives_label() {
        let june: PeriodCode = "2406".parse().unwrap();
        assert_eq!(june.label(), "06-2024");
        let december: PeriodCode = "2412".parse().unwrap();
        assert_eq!(december.label(), "12-2024");
    }

    #[test]
    fn period_code_round_trips_wire_form() {
        let code: PeriodCode = "2407".parse().unwrap();
        assert_eq!(code.code(), "2407");
        assert_eq!(code.year(), 2024);
        assert_eq!(code.month(), 7);
    }

    #[test]
    fn period_code_rejects_bad_input() {
        assert!("240".parse::<PeriodCode>().is_err());
        assert!("24067".parse::<PeriodCode>().is_err());
        assert!("24ab".parse::<PeriodCode>().is_err());
        assert!("2400".parse::<PeriodCode>().is_err());
        assert!("2413".parse::<PeriodCode>().is_err());
    }

    #[test]
    fn period_code_orders_chronologically() {
        let mut codes: Vec<PeriodCode> = ["2501", "2412", "2406"]
            .iter()
            .map(|code| code.parse().unwrap())
            .collect();
        codes.sort();
        let labels: Vec<String> = codes.iter().map(PeriodCode::label).collect();
        assert_eq!(labels, ["06-2024", "12-2024", "01-2025"]);
    }

    #[test]
    fn known_labels_round_trip() {
        for occurrence_type in OccurrenceType::KNOWN {
            let parsed = OccurrenceType::from_label(occurrence_type.label());
            assert_eq!(parsed, occurrence_type);
            assert!(parsed.is_known());
        }
    }

    #[test]
    fn unexpected_label_becomes_other() {
        let parsed = OccurrenceType::from_label("Hora extra");
        assert_eq!(parsed, OccurrenceType::Other("Hora extra".to_owned()));
        assert!(!parsed.is_known());
    }

    #[test]
    fn unit_cleanup_substitutes_sentinel() {
        assert_eq!(clean_unit_name(None), UNIT_NOT_INFORMED);
        assert_eq!(clean_unit_name(Some("")), UNIT_NOT_INFORMED);
        assert_eq!(clean_unit_name(Some("   ")), UNIT_NOT_INFORMED);
        assert_eq!(clean_unit_name(Some("  Portaria Norte ")), "Portaria Norte");
    }

    #[test]
    fn unit_cleanup_is_idempotent() {
        for raw in [None, Some(""), Some("  "), Some(" Recepção ")] {
            let once = clean_unit_name(raw);
            let twice = clean_unit_name(Some(&once));
            assert_eq!(once, twice);
        }
    }
}
