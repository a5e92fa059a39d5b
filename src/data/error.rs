use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort loading a dataset.
///
/// The first four variants are the ones callers are expected to tell apart
/// (missing file, empty file, wrong sheet, malformed content); the rest wrap
/// the underlying reader failures.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Source file is empty: {}", .0.display())]
    SourceEmpty(PathBuf),

    #[error("Sheet '{sheet}' not found in {} (available: {})", .path.display(), .available.join(", "))]
    SheetNotFound {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    #[error("Column {column}, row {row}: {message}")]
    Parse {
        column: String,
        row: usize,
        message: String,
    },

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("{0}")]
    Other(String),
}

impl LoadError {
    /// Column-level parse failure.
    pub fn parse(column: &str, row: usize, message: impl Into<String>) -> Self {
        LoadError::Parse {
            column: column.to_string(),
            row,
            message: message.into(),
        }
    }

    /// Whether this is one of the content errors (as opposed to the source
    /// being absent, empty or pointing at the wrong sheet).
    pub fn is_parse_error(&self) -> bool {
        !matches!(
            self,
            LoadError::SourceNotFound(_)
                | LoadError::SourceEmpty(_)
                | LoadError::SheetNotFound { .. }
                | LoadError::UnsupportedFormat(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_cause() {
        let e = LoadError::SheetNotFound {
            path: PathBuf::from("datos.xlsx"),
            sheet: "DINAMIZADO".into(),
            available: vec!["Hoja1".into(), "Hoja2".into()],
        };
        assert_eq!(
            e.to_string(),
            "Sheet 'DINAMIZADO' not found in datos.xlsx (available: Hoja1, Hoja2)"
        );

        let e = LoadError::parse("FECHA", 7, "'31/02/2024' is not a date");
        assert_eq!(e.to_string(), "Column FECHA, row 7: '31/02/2024' is not a date");
        assert!(e.is_parse_error());
        assert!(!LoadError::SourceEmpty(PathBuf::from("x.csv")).is_parse_error());
    }
}
