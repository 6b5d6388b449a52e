/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use colored::Colorize;
use log::{info, warn};
use thiserror::Error;

use vsphere::{ManagedObjectReference, TaskInfo};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("A required argument was not set: {0}")]
    RequiredArg(String),
    #[error("{0}")]
    Vsphere(#[from] vsphere::Error),
    #[error("Unable to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} of {1} tasks failed")]
    TasksFailed(usize, usize),
}

/// Outcome of waiting for one task.
pub struct TaskResult {
    task: ManagedObjectReference,
    result: vsphere::Result<TaskInfo>,
}

impl TaskResult {
    pub fn new(
        task: ManagedObjectReference,
        result: vsphere::Result<TaskInfo>,
    ) -> Self {
        TaskResult { task, result }
    }

    pub fn log_outcome(&self) {
        match &self.result {
            Ok(info) => info!(
                "Task '{}' ({}) has {}",
                self.task.value,
                info.display_name(),
                "succeeded".green()
            ),
            Err(e) => {
                warn!("Task '{}' {}: {}", self.task.value, "failed".red(), e)
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
