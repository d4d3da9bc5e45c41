//! Access to the remote occurrence document store.
//!
//! The report consumes the store through the [`OccurrenceStore`] trait: one
//! equality-filtered query per period, optionally AND-composed with a contract
//! filter.  [`FirestoreStore`] talks to the Firestore REST API with a blocking
//! HTTP client; [`MemoryStore`] serves canned records with the same filter
//! semantics for tests and dry runs.

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::FirestoreConfig;
use crate::model::{OccurrenceRecord, OccurrenceType, PeriodCode};

/// Errors surfaced by store queries.  Any of them aborts the run.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store client could not be constructed from its configuration.
    #[error("invalid store configuration: {0}")]
    Config(String),

    /// The HTTP request could not be completed (network, TLS, timeout).
    #[error("transport error talking to the document store")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("document store returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code of the response.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed response from the document store: {0}")]
    MalformedResponse(String),

    /// A returned document lacks a required field.
    #[error("document {name} is missing field {field:?}")]
    MissingField {
        /// Resource name of the offending document.
        name: String,
        /// Field that was absent or of the wrong kind.
        field: &'static str,
    },
}

/// Longest error body carried in a [`StoreError::Status`], in bytes.
const STATUS_BODY_LIMIT: usize = 512;

/// Shortens an error body to [`STATUS_BODY_LIMIT`] without splitting a
/// multi-byte character.
fn truncate_status_body(body: &mut String) {
    let mut cut = STATUS_BODY_LIMIT.min(body.len());
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    body.truncate(cut);
}

/// Query capability consumed by the pipeline.
///
/// Implementations return every document matching the period (and, when given,
/// the contract) with no pagination limit and no guaranteed order.  An empty
/// result set is valid.
pub trait OccurrenceStore {
    /// Fetches all records for one period, optionally filtered by contract.
    fn fetch_period(
        &self,
        period: &PeriodCode,
        contract: Option<i64>,
    ) -> Result<Vec<OccurrenceRecord>, StoreError>;
}

/// Store implementation backed by the Firestore REST `runQuery` endpoint.
pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreStore {
    /// Builds a store client from the given configuration.
    ///
    /// The per-query timeout from the configuration is applied to the
    /// underlying HTTP client, so a hung store cannot block the run forever.
    pub fn new(config: FirestoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| StoreError::Config("token is not a valid header value".to_owned()))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { client, config })
    }

    fn query_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents:runQuery",
            self.config.base_url, self.config.project_id, self.config.database
        )
    }

    fn query_body(&self, period: &PeriodCode, contract: Option<i64>) -> Value {
        let mut filters = vec![json!({
            "fieldFilter": {
                "field": { "fieldPath": "ocPeriodo" },
                "op": "EQUAL",
                "value": { "stringValue": period.code() },
            }
        })];
        if let Some(contract) = contract {
            filters.push(json!({
                "fieldFilter": {
                    "field": { "fieldPath": "contrato" },
                    "op": "EQUAL",
                    "value": { "integerValue": contract.to_string() },
                }
            }));
        }
        let filter = if filters.len() == 1 {
            filters.remove(0)
        } else {
            json!({ "compositeFilter": { "op": "AND", "filters": filters } })
        };
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.config.collection }],
                "where": filter,
            }
        })
    }
}

impl OccurrenceStore for FirestoreStore {
    fn fetch_period(
        &self,
        period: &PeriodCode,
        contract: Option<i64>,
    ) -> Result<Vec<OccurrenceRecord>, StoreError> {
        let body = self.query_body(period, contract);
        debug!("running store query for period {}", period.code());

        let response = self.client.post(self.query_url()).json(&body).send()?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().unwrap_or_default();
            truncate_status_body(&mut body);
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json()?;
        let entries = payload
            .as_array()
            .ok_or_else(|| StoreError::MalformedResponse("expected a JSON array".to_owned()))?;

        let mut records = Vec::new();
        for entry in entries {
            // runQuery interleaves read-time markers with document entries.
            if let Some(document) = entry.get("document") {
                records.push(decode_document(document)?);
            }
        }
        debug!(
            "store returned {} records for period {}",
            records.len(),
            period.code()
        );
        Ok(records)
    }
}

fn document_name(document: &Value) -> String {
    document
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_owned()
}

fn string_field(fields: &Value, field: &str) -> Option<String> {
    fields
        .get(field)?
        .get("stringValue")?
        .as_str()
        .map(str::to_owned)
}

fn integer_field(fields: &Value, field: &str) -> Option<i64> {
    let value = fields.get(field)?.get("integerValue")?;
    // Firestore encodes 64-bit integers as JSON strings.
    match value {
        Value::String(text) => text.parse().ok(),
        Value::Number(number) => number.as_i64(),
        _ => None,
    }
}

/// Flattens one Firestore document into an [`OccurrenceRecord`].
///
/// `funcUni` stays optional so the normalization stage can substitute the
/// sentinel; every other field is required.
fn decode_document(document: &Value) -> Result<OccurrenceRecord, StoreError> {
    let fields = document
        .get("fields")
        .ok_or_else(|| StoreError::MalformedResponse("document without fields".to_owned()))?;

    let missing = |field: &'static str| StoreError::MissingField {
        name: document_name(document),
        field,
    };

    let contract = integer_field(fields, "contrato").ok_or_else(|| missing("contrato"))?;
    let period = string_field(fields, "ocPeriodo").ok_or_else(|| missing("ocPeriodo"))?;
    let type_label = string_field(fields, "ocTipo").ok_or_else(|| missing("ocTipo"))?;
    let company = string_field(fields, "funcEmp").ok_or_else(|| missing("funcEmp"))?;
    let unit = string_field(fields, "funcUni");

    Ok(OccurrenceRecord {
        contract,
        period,
        occurrence_type: OccurrenceType::from_label(&type_label),
        company,
        unit,
    })
}

/// In-memory store with the same filter semantics as the remote one.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Vec<OccurrenceRecord>,
}

impl MemoryStore {
    /// Creates a store serving the given records.
    pub fn new(records: Vec<OccurrenceRecord>) -> Self {
        Self { records }
    }
}

impl OccurrenceStore for MemoryStore {
    fn fetch_period(
        &self,
        period: &PeriodCode,
        contract: Option<i64>,
    ) -> Result<Vec<OccurrenceRecord>, StoreError> {
        let code = period.code();
        Ok(self
            .records
            .iter()
            .filter(|record| record.period == code)
            .filter(|record| contract.map_or(true, |contract| record.contract == contract))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Value {
        json!({
            "name": "projects/p/databases/(default)/documents/dbAusencias/abc123",
            "fields": {
                "contrato": { "integerValue": "20041754" },
                "ocPeriodo": { "stringValue": "2406" },
                "ocTipo": { "stringValue": "Falta (Injustificada)" },
                "funcEmp": { "stringValue": "Vigilância Alfa" },
                "funcUni": { "stringValue": "  Portaria Norte " },
            }
        })
    }

    #[test]
    fn decodes_complete_document() {
        let record = decode_document(&sample_document()).unwrap();
        assert_eq!(record.contract, 20041754);
        assert_eq!(record.period, "2406");
        assert_eq!(record.occurrence_type, OccurrenceType::FaltaInjustificada);
        assert_eq!(record.company, "Vigilância Alfa");
        assert_eq!(record.unit.as_deref(), Some("  Portaria Norte "));
    }

    #[test]
    fn missing_unit_stays_none() {
        let mut document = sample_document();
        document["fields"]
            .as_object_mut()
            .unwrap()
            .remove("funcUni");
        let record = decode_document(&document).unwrap();
        assert_eq!(record.unit, None);
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let mut document = sample_document();
        document["fields"].as_object_mut().unwrap().remove("ocTipo");
        let error = decode_document(&document).unwrap_err();
        assert!(matches!(
            error,
            StoreError::MissingField { field: "ocTipo", .. }
        ));
    }

    #[test]
    fn memory_store_filters_by_period_and_contract() {
        let record = |contract: i64, period: &str| OccurrenceRecord {
            contract,
            period: period.to_owned(),
            occurrence_type: OccurrenceType::AbandonoDePosto,
            company: "Alfa".to_owned(),
            unit: None,
        };
        let store = MemoryStore::new(vec![
            record(1, "2406"),
            record(1, "2407"),
            record(2, "2406"),
        ]);
        let june: PeriodCode = "2406".parse().unwrap();

        assert_eq!(store.fetch_period(&june, Some(1)).unwrap().len(), 1);
        assert_eq!(store.fetch_period(&june, None).unwrap().len(), 2);
        let march: PeriodCode = "2403".parse().unwrap();
        assert!(store.fetch_period(&march, None).unwrap().is_empty());
    }

    #[test]
    fn status_body_truncation_respects_char_boundaries() {
        // 'x' puts every two-byte 'á' on an odd offset, so the byte limit
        // falls inside a character.
        let mut body = String::from("x");
        body.push_str(&"á".repeat(300));
        truncate_status_body(&mut body);
        assert!(body.len() <= STATUS_BODY_LIMIT);
        assert!(body.ends_with('á'));

        let mut short = String::from("não autorizado");
        truncate_status_body(&mut short);
        assert_eq!(short, "não autorizado");
    }

    #[test]
    fn composite_filter_only_with_contract() {
        let store = FirestoreStore::new(FirestoreConfig::new("demo")).unwrap();
        let period: PeriodCode = "2406".parse().unwrap();

        let single = store.query_body(&period, None);
        assert!(single["structuredQuery"]["where"]["fieldFilter"].is_object());

        let composite = store.query_body(&period, Some(20041754));
        let filters = &composite["structuredQuery"]["where"]["compositeFilter"]["filters"];
        assert_eq!(filters.as_array().unwrap().len(), 2);
    }
}
