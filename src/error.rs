//! Error type shared by the loader, aggregator and clipper.

use std::path::PathBuf;

use thiserror::Error;

use crate::crs::Crs;

/// Every variant is fatal to a pipeline run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("unsupported format for {}: {reason}", path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("projection error: {0}")]
    Projection(String),

    #[error("CRS mismatch: {left} vs {right}")]
    CrsMismatch { left: String, right: String },

    #[error("{operation} produced no features")]
    EmptyGeometryResult { operation: &'static str },

    #[error("missing attribute {0:?}")]
    MissingAttribute(String),

    #[error("attribute table error: {0}")]
    Data(#[from] polars::prelude::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a `CrsMismatch` from the two collection CRSs.
    pub(crate) fn crs_mismatch(left: Option<&Crs>, right: Option<&Crs>) -> Self {
        let show = |crs: Option<&Crs>| crs.map_or_else(|| "<none>".to_string(), |c| c.to_string());
        Error::CrsMismatch { left: show(left), right: show(right) }
    }

    pub(crate) fn unsupported(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::UnsupportedFormat { path: path.into(), reason: reason.to_string() }
    }
}
