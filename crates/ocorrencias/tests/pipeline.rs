use ocorrencias::aggregate::{aggregate, normalize};
use ocorrencias::config::ReportConfig;
use ocorrencias::error::ReportError;
use ocorrencias::fonts;
use ocorrencias::model::{OccurrenceRecord, OccurrenceType, PeriodCode, UNIT_NOT_INFORMED};
use ocorrencias::pipeline;
use ocorrencias::store::{MemoryStore, OccurrenceStore};

const CONTRACT: i64 = 20041754;

fn record(period: &str, type_label: &str, company: &str, unit: Option<&str>) -> OccurrenceRecord {
    OccurrenceRecord {
        contract: CONTRACT,
        period: period.to_owned(),
        occurrence_type: OccurrenceType::from_label(type_label),
        company: company.to_owned(),
        unit: unit.map(str::to_owned),
    }
}

/// Ten records across three periods, five units (one blank), six types and
/// three companies, plus one out-of-range record the queries must not pick up.
fn canned_store() -> MemoryStore {
    MemoryStore::new(vec![
        record("2406", "Abandono de posto", "Alfa", Some("Portaria Norte")),
        record("2406", "Atraso (Atestado/Justificado)", "Alfa", Some("Portaria Sul")),
        record("2406", "Falta (Injustificada)", "Bravo", Some("Recepção")),
        record("2407", "Atraso (Injustificado)", "Bravo", Some("Recepção")),
        record("2407", "Falta (Atestada/Justificada)", "Bravo", Some("Almoxarifado")),
        record("2407", "Falta (Injustificada)", "Charlie", Some("Portaria Norte")),
        record("2407", "Saída antecipada", "Charlie", Some("Garagem")),
        record("2408", "Falta (Injustificada)", "Alfa", Some("  ")),
        record("2408", "Abandono de posto", "Charlie", Some("Garagem")),
        record("2408", "Saída antecipada", "Alfa", Some("Portaria Sul")),
        // Different period; excluded by the period filters.
        record("2409", "Abandono de posto", "Alfa", Some("Portaria Norte")),
    ])
}

fn periods() -> Vec<PeriodCode> {
    ["2406", "2407", "2408"]
        .iter()
        .map(|code| code.parse().unwrap())
        .collect()
}

fn fetch_all(store: &MemoryStore) -> Vec<OccurrenceRecord> {
    periods()
        .iter()
        .flat_map(|period| store.fetch_period(period, Some(CONTRACT)).unwrap())
        .collect()
}

#[test]
fn canned_scenario_aggregates_as_specified() {
    let store = canned_store();
    let aggregation = aggregate(&normalize(fetch_all(&store)).unwrap());

    assert_eq!(aggregation.total_records(), 10);
    assert_eq!(aggregation.by_period.len(), 3);
    assert_eq!(aggregation.by_company.len(), 3);
    assert_eq!(aggregation.by_unit.len(), 5);
    assert_eq!(aggregation.by_unit.get(UNIT_NOT_INFORMED), Some(&1));
    assert!(aggregation.unknown_types.is_empty());

    // Count sums agree across every table.
    for sum in [
        aggregation.by_period.values().sum::<u64>(),
        aggregation.by_type.values().sum::<u64>(),
        aggregation.by_company.values().sum::<u64>(),
        aggregation.by_unit.values().sum::<u64>(),
    ] {
        assert_eq!(sum, 10);
    }

    // Every unit has a nested row and the row totals match the flat counts.
    for (unit, count) in &aggregation.by_unit {
        let row = aggregation.by_unit_type.get(unit).expect("nested row");
        assert_eq!(row.total(), *count);
    }
    assert_eq!(aggregation.by_unit.len(), aggregation.by_unit_type.len());
}

#[test]
fn full_run_writes_all_artifacts() {
    let store = canned_store();
    let scratch = tempfile::tempdir().unwrap();
    let config = ReportConfig::new(periods(), "Junho/24 - Agosto/24")
        .with_contract(CONTRACT)
        .with_assets_dir(scratch.path().join("assets"))
        .with_output_dir(scratch.path().join("out"));

    let genpdf_fonts = fonts::default_fonts_available();
    match pipeline::run(&config, &store) {
        Ok(artifacts) => {
            assert_eq!(artifacts.total_records, 10);
            assert!(artifacts.pdf_path.metadata().unwrap().len() > 0);
            assert!(artifacts.bar_chart_path.metadata().unwrap().len() > 0);
            assert!(artifacts.pie_chart_path.metadata().unwrap().len() > 0);
            assert!(artifacts.unknown_types.is_empty());
            let name = artifacts.pdf_path.file_name().unwrap().to_string_lossy();
            assert!(name.starts_with("relatorio_ocorrencias_"));
            assert!(name.ends_with(".pdf"));
        }
        // Chart text needs a system font; skip on machines without one.
        Err(ReportError::Render(message)) => {
            eprintln!("skipping full-run assertions: {}", message);
        }
        // The PDF stage needs the bundled Roboto family.
        Err(ReportError::Pdf(err)) if !genpdf_fonts => {
            eprintln!("skipping full-run assertions: {}", err);
        }
        Err(other) => panic!("pipeline failed: {}", other),
    }
}

#[test]
fn run_without_breakdown_renders_the_totals_only_table() {
    let store = canned_store();
    let scratch = tempfile::tempdir().unwrap();
    let config = ReportConfig::new(vec!["2406".parse().unwrap()], "Junho/24")
        .with_contract(CONTRACT)
        .with_breakdown(false)
        .with_assets_dir(scratch.path().join("assets"))
        .with_output_dir(scratch.path().join("out"));

    let genpdf_fonts = fonts::default_fonts_available();
    match pipeline::run(&config, &store) {
        Ok(artifacts) => {
            assert_eq!(artifacts.total_records, 3);
            assert!(artifacts.pdf_path.metadata().unwrap().len() > 0);
        }
        Err(ReportError::Render(message)) => {
            eprintln!("skipping no-breakdown assertions: {}", message);
        }
        Err(ReportError::Pdf(err)) if !genpdf_fonts => {
            eprintln!("skipping no-breakdown assertions: {}", err);
        }
        Err(other) => panic!("pipeline failed without breakdown: {}", other),
    }
}

#[test]
fn empty_result_set_is_not_an_error() {
    let store = MemoryStore::default();
    let scratch = tempfile::tempdir().unwrap();
    let config = ReportConfig::new(periods(), "Junho/24 - Agosto/24")
        .with_contract(CONTRACT)
        .with_assets_dir(scratch.path().join("assets"))
        .with_output_dir(scratch.path().join("out"));

    let genpdf_fonts = fonts::default_fonts_available();
    match pipeline::run(&config, &store) {
        Ok(artifacts) => {
            assert_eq!(artifacts.total_records, 0);
            assert!(artifacts.pdf_path.metadata().unwrap().len() > 0);
        }
        Err(ReportError::Render(message)) => {
            eprintln!("skipping empty-run assertions: {}", message);
        }
        Err(ReportError::Pdf(err)) if !genpdf_fonts => {
            eprintln!("skipping empty-run assertions: {}", err);
        }
        Err(other) => panic!("pipeline failed on empty input: {}", other),
    }
}

#[test]
fn malformed_period_in_store_aborts_the_run() {
    // The store filter matches on the query side; the malformed stored code
    // only surfaces during normalization.
    let mut bad = record("2406", "Abandono de posto", "Alfa", None);
    bad.period = "24AB".to_owned();
    let store = BadPeriodStore { bad };

    let scratch = tempfile::tempdir().unwrap();
    let config = ReportConfig::new(vec!["2406".parse().unwrap()], "Junho/24")
        .with_assets_dir(scratch.path().join("assets"))
        .with_output_dir(scratch.path().join("out"));

    let error = pipeline::run(&config, &store).unwrap_err();
    assert!(matches!(error, ReportError::MalformedPeriod(_)));
}

struct BadPeriodStore {
    bad: OccurrenceRecord,
}

impl OccurrenceStore for BadPeriodStore {
    fn fetch_period(
        &self,
        _period: &PeriodCode,
        _contract: Option<i64>,
    ) -> Result<Vec<OccurrenceRecord>, ocorrencias::store::StoreError> {
        Ok(vec![self.bad.clone()])
    }
}
