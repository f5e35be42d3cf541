use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("schema mismatch in {path}: expected column {column:?} not found")]
    SchemaMismatch { path: String, column: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("malformed record data: {0}")]
    Malformed(String),
}
