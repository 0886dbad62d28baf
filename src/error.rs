//! Run-terminating errors.
//!
//! Every failure in the extract is fatal for the run. An `AppError` carries a
//! human-readable message, the category it belongs to and the process exit
//! code `main` should return.

/// Failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad command-line or environment configuration.
    Config,
    /// The variable catalog could not be loaded for the vintage/product.
    MetadataUnavailable,
    /// A table or boundary download failed or returned unusable data.
    ProviderFetch,
    /// A value column's code has no catalog entry (or no display name).
    UnknownVariableCode,
    /// Two value columns renamed to the same header.
    DuplicateColumnName,
    /// A CSV, shapefile or cache file could not be written.
    OutputWrite,
    /// A previously written topic CSV could not be read back.
    InputRead,
    /// A column an indicator depends on is absent from its topic table.
    MissingColumn,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config | ErrorKind::InputRead => 2,
            ErrorKind::MetadataUnavailable => 3,
            ErrorKind::ProviderFetch => 4,
            ErrorKind::UnknownVariableCode | ErrorKind::DuplicateColumnName | ErrorKind::MissingColumn => 5,
            ErrorKind::OutputWrite => 6,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn metadata_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MetadataUnavailable, message)
    }

    pub fn provider_fetch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProviderFetch, message)
    }

    pub fn unknown_variable_code(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownVariableCode, message)
    }

    pub fn duplicate_column_name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateColumnName, message)
    }

    pub fn output_write(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutputWrite, message)
    }

    pub fn input_read(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputRead, message)
    }

    pub fn missing_column(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingColumn, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
