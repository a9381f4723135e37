use std::path::PathBuf;
use thiserror::Error;

/// Domain errors with stable machine codes. Codes and exit-code categories
/// are part of the CLI contract; renaming one is a breaking change.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read stdin: {0}")]
    Stdin(std::io::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{message}")]
    JsonParse { message: String },

    #[error("{message}")]
    CsvParse { message: String },

    #[error("could not detect schema type from input data")]
    SchemaDetect,

    #[error("no name field detected in input data")]
    NoNameField,

    #[error("{message}")]
    EmptyInput { message: String },

    #[error("cycle detected in parent references: {path}")]
    Cycle { path: String },

    #[error("duplicate node id: \"{id}\"")]
    DuplicateId { id: String },

    #[error("invalid option value: {message}")]
    InvalidOption { message: String },

    #[error("export failed: {message}")]
    Export { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

enum Category {
    Io,
    Validation,
    Export,
    Internal,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::FileNotFound { .. } => "ERR_IO_FILE_NOT_FOUND",
            AppError::Read { .. } | AppError::Stdin(_) => "ERR_IO_READ",
            AppError::Write { .. } => "ERR_IO_WRITE",
            AppError::JsonParse { .. } => "ERR_VALIDATION_JSON_PARSE",
            AppError::CsvParse { .. } => "ERR_VALIDATION_CSV_PARSE",
            AppError::SchemaDetect => "ERR_VALIDATION_SCHEMA_DETECT",
            AppError::NoNameField => "ERR_VALIDATION_NO_NAME_FIELD",
            AppError::EmptyInput { .. } => "ERR_VALIDATION_EMPTY_INPUT",
            AppError::Cycle { .. } => "ERR_VALIDATION_CYCLE",
            AppError::DuplicateId { .. } => "ERR_VALIDATION_DUPLICATE_ID",
            AppError::InvalidOption { .. } => "ERR_VALIDATION_OPTION",
            AppError::Export { .. } => "ERR_EXPORT",
            AppError::Internal { .. } => "ERR_INTERNAL",
        }
    }

    fn category(&self) -> Category {
        match self {
            AppError::FileNotFound { .. }
            | AppError::Read { .. }
            | AppError::Stdin(_)
            | AppError::Write { .. } => Category::Io,
            AppError::JsonParse { .. }
            | AppError::CsvParse { .. }
            | AppError::SchemaDetect
            | AppError::NoNameField
            | AppError::EmptyInput { .. }
            | AppError::Cycle { .. }
            | AppError::DuplicateId { .. }
            | AppError::InvalidOption { .. } => Category::Validation,
            AppError::Export { .. } => Category::Export,
            AppError::Internal { .. } => Category::Internal,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            Category::Validation => 10,
            Category::Export => 30,
            Category::Io => 50,
            Category::Internal => 90,
        }
    }

    pub fn retryable(&self) -> bool {
        matches!(
            self,
            AppError::Read { .. }
                | AppError::Stdin(_)
                | AppError::Write { .. }
                | AppError::Export { .. }
        )
    }

    pub fn suggested_action(&self) -> &'static str {
        if self.retryable() {
            return "retry";
        }
        match self.category() {
            Category::Io | Category::Validation => "fix_input",
            _ => "escalate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_exit_codes_are_stable() {
        let err = AppError::Cycle {
            path: "a -> b -> a".to_string(),
        };
        assert_eq!(err.code(), "ERR_VALIDATION_CYCLE");
        assert_eq!(err.exit_code(), 10);
        assert!(!err.retryable());
        assert_eq!(err.suggested_action(), "fix_input");

        let err = AppError::FileNotFound {
            path: PathBuf::from("missing.json"),
        };
        assert_eq!(err.code(), "ERR_IO_FILE_NOT_FOUND");
        assert_eq!(err.exit_code(), 50);
        assert_eq!(err.suggested_action(), "fix_input");

        let err = AppError::Export {
            message: "png encode".to_string(),
        };
        assert_eq!(err.exit_code(), 30);
        assert_eq!(err.suggested_action(), "retry");
    }
}
