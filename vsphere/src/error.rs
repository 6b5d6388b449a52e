/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt;

use crate::codec::ParseError;
use crate::soap::{SoapError, SoapFault};
use crate::types::{ApiType, ManagedObjectReference};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error during SOAP requests: {0}")]
    SoapError(#[from] SoapError),
    #[error("Server returned a fault: {0}")]
    Fault(SoapFault),
    #[error("Unable to log in: {0}")]
    Login(Box<Error>),
    #[error("No password given for user {0}")]
    MissingPassword(String),
    #[error("Expected a {expected} endpoint, got {actual}")]
    WrongApiType { expected: ApiType, actual: ApiType },
    #[error("Selection spec {0} is not defined in the traversal graph")]
    UnresolvedSelection(String),
    #[error("Server has no {0}")]
    MissingManager(&'static str),
    #[error("failed to generate request: {0}")]
    GenerateRequest(xml::writer::Error),
    #[error("Template could not be filled: {0}")]
    Template(Box<handlebars::RenderError>),
    #[error("failed to parse response (invalid xml): {0}")]
    ParseResponseXml(xml::reader::Error),
    #[error("failed to parse response: {0}")]
    ParseResponse(ParseError),
    #[error("failed to deserialize response: {0}")]
    Deserialize(#[from] serde_xml_rs::Error),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(&'static str),
    #[error("No update received for {task} after {attempts} attempts")]
    Timeout {
        task: ManagedObjectReference,
        attempts: u32,
    },
    #[error("WaitForUpdatesEx failed after {attempts} attempts: {source}")]
    WaitForUpdates { attempts: u32, source: Box<Error> },
    #[error("{0}")]
    TaskFailed(TaskFailure),
    #[error("No Ip found for hostname: {0}")]
    NoIpFound(String),
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Details of a task that ended in the error state.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TaskFailure {
    pub task_name: String,
    pub target: Option<String>,
    pub fault_type: Option<String>,
    pub message: String,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task {} failed", self.task_name)?;
        if let Some(target) = &self.target {
            write!(f, " on {}", target)?;
        }
        match &self.fault_type {
            Some(typ) => write!(f, ": {} ({})", self.message, typ),
            None => write!(f, ": {}", self.message),
        }
    }
}

impl Error {
    /// The server fault behind this error, if any.
    pub fn fault(&self) -> Option<&SoapFault> {
        match self {
            Self::Fault(fault) => Some(fault),
            Self::Login(err) => err.fault(),
            Self::WaitForUpdates { source, .. } => source.fault(),
            _ => None,
        }
    }

    pub fn is_invalid_property(&self) -> bool {
        self.fault().map_or(false, SoapFault::is_invalid_property)
    }
}

impl From<handlebars::RenderError> for Error {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(Box::new(err))
    }
}
