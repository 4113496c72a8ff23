use siteforge_domain::DomainValidationError;
use siteforge_engine::{LoadError, ProvisionError, SiteProvisionError, StateFileError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    ArgumentParse(#[from] clap::Error),
    #[error("invalid --web value \"{web}\"")]
    InvalidWeb {
        web: String,
        #[source]
        source: DomainValidationError,
    },
    #[error(transparent)]
    StateFile(#[from] StateFileError),
    #[error(transparent)]
    Report(#[from] siteforge_report::ReportError),
}

/// Failures that end a run but still produce a report.
#[derive(Debug, Error)]
pub(crate) enum RunError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Manifest(#[from] ProvisionError),
    #[error(transparent)]
    Site(#[from] SiteProvisionError),
}

/// Flatten an error and its sources into one line.
pub(crate) fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
