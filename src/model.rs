//! Request-scoped data model for one import: decoded rows, validated
//! listings, row-level errors, and the summary/response shapes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::ImportError;

/// One decoded, not-yet-validated data row as a column -> value view.
///
/// Headers are parsed once per file and shared across every record of that
/// import; values are the row's own fields. Serializes to a JSON object in
/// file column order so error reports echo the row as uploaded.
#[derive(Debug, Clone)]
pub struct RawRecord {
    headers: Arc<[String]>,
    fields: Vec<String>,
}

impl RawRecord {
    pub(crate) fn new(headers: Arc<[String]>, fields: Vec<String>) -> Self {
        Self { headers, fields }
    }

    /// Build a record from literal column/value pairs. Intended for fixtures
    /// and gateway adapter tests; the decoder is the production constructor.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (headers, fields): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .unzip();
        Self {
            headers: Arc::from(headers),
            fields,
        }
    }

    /// Value under `name`, or `None` when the row has no such column.
    pub fn get(&self, name: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == name)?;
        self.fields.get(idx).map(String::as_str)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl Serialize for RawRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (i, value) in self.fields.iter().enumerate() {
            // Flexible parsing can yield more fields than headers; keep the
            // extras under positional keys rather than dropping them.
            match self.headers.get(i) {
                Some(name) => map.serialize_entry(name, value)?,
                None => map.serialize_entry(&format!("column{}", i + 1), value)?,
            }
        }
        map.end()
    }
}

/// A row that passed schema validation, normalized to typed fields.
///
/// Only the validator constructs these; a draft is either fully valid or was
/// never created.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    title: String,
    price: f64,
    project_id: String,
}

impl ListingDraft {
    pub(crate) fn new(title: String, price: f64, project_id: String) -> Self {
        Self {
            title,
            price,
            project_id,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Enrich with the caller identity and creation timestamp ahead of batch
    /// submission.
    pub fn into_record(self, owner: &str, created_at: DateTime<Utc>) -> NewListing {
        NewListing {
            title: self.title,
            price: self.price,
            project_id: self.project_id,
            owner: owner.to_string(),
            created_at,
        }
    }
}

/// A validated listing ready for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub title: String,
    pub price: f64,
    pub project_id: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

/// Gateway echo of a persisted listing with its generated identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredListing {
    pub id: String,
    #[serde(flatten)]
    pub listing: NewListing,
}

/// One rejected row: its 1-based position among data rows (the header line is
/// never counted), the row as uploaded, and the first rule violation.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub row: u64,
    pub data: RawRecord,
    pub error: String,
}

/// Counts for one completed import. `total_processed` is always
/// `successful + failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub total_processed: u64,
    pub successful: u64,
    pub failed: u64,
    pub processing_time_ms: u64,
}

/// Coordinator result: the summary plus row errors in file order.
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub summary: ImportSummary,
    pub validation_errors: Vec<RowError>,
}

/// Wire shape handed back to the upload caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ImportSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<RowError>>,
}

impl ImportResponse {
    /// Response for an import that ran to completion, with or without
    /// rejected rows.
    pub fn completed(report: ImportReport) -> Self {
        let failed = report.summary.failed;
        let message = if failed == 0 {
            "Import completed successfully".to_string()
        } else {
            format!("Import completed with {failed} invalid row(s)")
        };
        Self {
            success: true,
            message,
            summary: Some(report.summary),
            validation_errors: (!report.validation_errors.is_empty())
                .then_some(report.validation_errors),
        }
    }

    /// Client-error rejection: no summary is produced.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            summary: None,
            validation_errors: None,
        }
    }
}

impl From<ImportError> for ImportResponse {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::EmptyFile => Self::rejected("Empty CSV file provided"),
            ImportError::NoValidRows { errors } => Self {
                success: false,
                message: "No valid records found in CSV file".to_string(),
                summary: None,
                validation_errors: (!errors.is_empty()).then_some(errors),
            },
            // Framing problems are user-actionable; say what broke.
            ImportError::Decode(e) => {
                Self::rejected(format!("CSV file is structurally invalid: {e}"))
            }
            // Persistence detail stays in the log; the caller only learns
            // that success is undetermined.
            ImportError::Gateway(_) => Self::rejected("Import failed due to an internal error"),
        }
    }
}
