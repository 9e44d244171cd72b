use thiserror::Error;

/// Machine-readable error code for external boundaries (§6), independent of
/// the human-readable message carried by [`LcaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    SingularMatrix,
    CyclicSubsystems,
    MissingProvider,
    InvalidDqEntry,
    FormulaEvalFailed,
    UnknownFlow,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum LcaError {
    #[error("reference product for system {0} was not found in the tech index")]
    ReferenceProductNotFound(u64),

    #[error("process {0} has no quantitative reference exchange")]
    ProcessNotDefined(u64),

    #[error("exchange ({process_id}, {exchange_id}) is required to link but no provider was found")]
    MissingProvider { process_id: u64, exchange_id: u64 },

    #[error("sub-system relations form a cycle and cannot be topologically ordered")]
    CyclicSubsystems,

    #[error("technology matrix is singular at column {0}")]
    SingularMatrix(usize),

    #[error("non-finite value produced in result at index {0}")]
    NonFiniteResult(usize),

    #[error("invalid data-quality entry: {0}")]
    InvalidDqEntry(String),

    #[error("formula evaluation failed for '{formula}': {reason}")]
    FormulaEvalFailed { formula: String, reason: String },

    #[error("unknown flow id {0}")]
    UnknownFlow(u64),

    #[error("calculation was cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("data source error: {0}")]
    DataSource(#[from] lca_schemas::data_source::DataSourceError),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("an error occurred during logging: {0}")]
    LoggingError(#[from] anyhow::Error),
}

impl LcaError {
    /// Maps this error onto the stable external-boundary code from §6, when
    /// applicable. Configuration/IO/parsing errors that only occur while
    /// wiring a calculation together have no §6 code.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            LcaError::MissingProvider { .. } => Some(ErrorCode::MissingProvider),
            LcaError::CyclicSubsystems => Some(ErrorCode::CyclicSubsystems),
            LcaError::SingularMatrix(_) => Some(ErrorCode::SingularMatrix),
            LcaError::InvalidDqEntry(_) => Some(ErrorCode::InvalidDqEntry),
            LcaError::FormulaEvalFailed { .. } => Some(ErrorCode::FormulaEvalFailed),
            LcaError::UnknownFlow(_) => Some(ErrorCode::UnknownFlow),
            LcaError::Cancelled => Some(ErrorCode::Cancelled),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LcaError>;