use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum PlanobsError {
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("No coordinates available for target {0}: pass them explicitly or choose an alert source")]
    MissingCoordinates(String),

    #[error("Invalid target name for alert source {source_name}: {name}")]
    InvalidTargetName { source_name: String, name: String },

    #[error("Unknown alert source: {0}")]
    UnknownAlertSource(String),

    #[error("Error during the nom parsing: {0}")]
    NomParsingError(String),

    #[error("GCN circular is missing the field: {0}")]
    MissingGcnField(String),

    #[error("No GCN circular found for event: {0}")]
    GcnCircularNotFound(String),

    #[error("No GCN notice found at: {0}")]
    GcnNoticeNotFound(String),

    #[error("No alert found in the ZTF archive for: {0}")]
    ZtfObjectNotFound(String),

    #[error("Invalid field grid line {line}: {content}")]
    InvalidFieldGrid { line: usize, content: String },

    #[error("Field grid file not found at: {0}")]
    FieldGridNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unable to parse configuration file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP ureq error: {0}")]
    UreqHttpError(#[from] ureq::Error),

    #[cfg(feature = "grid-download")]
    #[error("HTTP reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON decoding error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV writing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("ROOTS finding error: {0}")]
    RootFindingError(#[from] roots::SearchError),

    #[error("Queue API error: {0}")]
    Api(#[from] ApiError),
}

impl PartialEq for PlanobsError {
    fn eq(&self, other: &Self) -> bool {
        use PlanobsError::*;
        match (self, other) {
            (InvalidDate(a), InvalidDate(b)) => a == b,
            (InvalidCoordinate(a), InvalidCoordinate(b)) => a == b,
            (MissingCoordinates(a), MissingCoordinates(b)) => a == b,
            (
                InvalidTargetName {
                    source_name: s1,
                    name: n1,
                },
                InvalidTargetName {
                    source_name: s2,
                    name: n2,
                },
            ) => s1 == s2 && n1 == n2,
            (UnknownAlertSource(a), UnknownAlertSource(b)) => a == b,
            (NomParsingError(a), NomParsingError(b)) => a == b,
            (MissingGcnField(a), MissingGcnField(b)) => a == b,
            (GcnCircularNotFound(a), GcnCircularNotFound(b)) => a == b,
            (GcnNoticeNotFound(a), GcnNoticeNotFound(b)) => a == b,
            (ZtfObjectNotFound(a), ZtfObjectNotFound(b)) => a == b,
            (
                InvalidFieldGrid {
                    line: l1,
                    content: c1,
                },
                InvalidFieldGrid {
                    line: l2,
                    content: c2,
                },
            ) => l1 == l2 && c1 == c2,
            (FieldGridNotFound(a), FieldGridNotFound(b)) => a == b,
            (InvalidConfig(a), InvalidConfig(b)) => a == b,
            (RootFindingError(a), RootFindingError(b)) => a == b,

            // Wrapped foreign errors are not comparable: same variant means equal
            (ConfigParseError(_), ConfigParseError(_)) => true,
            (IoError(_), IoError(_)) => true,
            (UreqHttpError(_), UreqHttpError(_)) => true,
            #[cfg(feature = "grid-download")]
            (ReqwestError(_), ReqwestError(_)) => true,
            (JsonError(_), JsonError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (Api(a), Api(b)) => a == b,

            _ => false,
        }
    }
}
