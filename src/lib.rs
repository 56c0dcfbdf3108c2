//! Streaming bulk import of property listings from uploaded CSV files.
//!
//! - Intake: size/content-type constraints, gzip/zstd decompression, charset
//!   transcoding to UTF-8.
//! - Pipeline: pull-based decode, per-row schema validation, batched
//!   persistence (1000 records per gateway call), partial-failure report.
//!
//! Data shape:
//! - `ImportReport { summary: ImportSummary, validation_errors: Vec<RowError> }`
//! - Wire response: `ImportResponse` (camelCase, per-row errors only when
//!   some rows failed)
//!
//! Row-level validation failures never abort an import; framing and
//! persistence failures always do.

mod decode;
mod gateway;
mod import;
mod intake;
mod model;
mod transcode;
mod validate;

pub use crate::decode::{DecodeError, RecordStream};
pub use crate::gateway::{GatewayError, JsonLinesGateway, ListingGateway};
pub use crate::import::{import_records, run_import, BATCH_SIZE};
pub use crate::intake::{
    build_upload_reader, check_upload, IntakeError, UploadMeta, MAX_UPLOAD_BYTES,
};
pub use crate::model::{
    ImportReport, ImportResponse, ImportSummary, ListingDraft, NewListing, RawRecord, RowError,
    StoredListing,
};
pub use crate::validate::validate_row;

use thiserror::Error;

/// Fatal outcome of one import invocation. Row-level validation failures are
/// data (see [`RowError`]), never an `Err`.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Empty CSV file provided")]
    EmptyFile,
    /// Every processed row failed validation; the gateway was never called.
    #[error("No valid records found in CSV file")]
    NoValidRows { errors: Vec<RowError> },
    #[error("CSV file is structurally invalid: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;
