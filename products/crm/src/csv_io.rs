//! CSV preflight for bulk import and CSV rendering for export.
//!
//! Preflight mirrors the backend's row checks closely enough to catch missing
//! columns and blank required cells before anything is uploaded.

use entity::Resource;
use platform_api::RowError;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("bulk import is not supported for `{0}`")]
    UnknownEntity(String),
    #[error("file has no header row")]
    Empty,
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("record is not a flat object")]
    NotTabular,
}

/// Column requirements for one importable collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportSchema {
    pub entity: &'static str,
    pub required: &'static [&'static str],
}

const SCHEMAS: &[ImportSchema] = &[
    ImportSchema { entity: "accounts", required: &["name"] },
    ImportSchema { entity: "contacts", required: &["first_name", "last_name"] },
    ImportSchema { entity: "leads", required: &["name"] },
    ImportSchema { entity: "deals", required: &["title"] },
    ImportSchema { entity: "carepacks", required: &["name", "start_date", "end_date"] },
    ImportSchema { entity: "products", required: &["name", "price_cents"] },
    ImportSchema { entity: "partners", required: &["name"] },
    ImportSchema { entity: "tasks", required: &["title"] },
];

pub fn schema_for(entity: &str) -> Result<&'static ImportSchema, ImportError> {
    SCHEMAS
        .iter()
        .find(|s| s.entity == entity)
        .ok_or_else(|| ImportError::UnknownEntity(entity.to_string()))
}

pub fn importable() -> impl Iterator<Item = &'static str> {
    SCHEMAS.iter().map(|s| s.entity)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preflight {
    pub rows: u32,
    pub errors: Vec<RowError>,
}

impl Preflight {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check `data` for the columns `entity` requires and report every row with a
/// blank required cell. Headers match case-insensitively after trimming.
pub fn preflight(entity: &str, data: &str) -> Result<Preflight, ImportError> {
    let schema = schema_for(entity)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data.as_bytes());
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(ImportError::Empty);
    }

    let mut columns = Vec::with_capacity(schema.required.len());
    let mut missing = Vec::new();
    for field in schema.required {
        match headers.iter().position(|h| h == field) {
            Some(index) => columns.push((*field, index)),
            None => missing.push(field.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    let mut report = Preflight::default();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index as u32 + 1;
        report.rows = row;
        for (field, column) in &columns {
            if record.get(*column).is_none_or(str::is_empty) {
                report.errors.push(RowError {
                    row,
                    field: Some(field.to_string()),
                    message: format!("{field} is required"),
                });
            }
        }
    }
    Ok(report)
}

/// Render records as CSV. Columns follow the first record's field names;
/// list values are joined with `;` and absent values are left blank.
pub fn to_csv<R: Resource>(records: &[R]) -> Result<String, ImportError> {
    let rows = records
        .iter()
        .map(|record| match serde_json::to_value(record) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(ImportError::NotTabular),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut writer = csv::Writer::from_writer(Vec::new());
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&String> = first.keys().collect();
    writer.write_record(&headers)?;
    for row in &rows {
        writer.write_record(headers.iter().map(|h| cell(row.get(*h))))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ImportError::Csv(err.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| cell(Some(item)))
            .collect::<Vec<_>>()
            .join(";"),
        Some(other) => other.to_string(),
    }
}
