/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use log::{debug, error, info, warn};

use crate::config::TaskOptions;
use crate::constants::TASK_INFO_PROPERTY;
use crate::error::{Error, Result, TaskFailure};
use crate::property_collector::PropertyCollector;
use crate::requests::DestroyTask;
use crate::session::VimClient;
use crate::spec::WaitOptions;
use crate::types::{
    ManagedObjectReference, PropertyChange, TaskInfo, TaskInfoState,
    UpdateSet, Value,
};

type ProgressFn<'a> = Box<dyn Fn(&TaskInfo) + Send + Sync + 'a>;

/// Follows server-side tasks through property collector updates until
/// they reach a terminal state.
pub struct TaskMonitor<'a> {
    client: &'a VimClient,
    options: TaskOptions,
    progress: Option<ProgressFn<'a>>,
}

/// What was last reported for a task, to log changes only.
#[derive(Default)]
struct Reported {
    state: Option<TaskInfoState>,
    progress: Option<i32>,
}

impl<'a> TaskMonitor<'a> {
    pub fn new(client: &'a VimClient) -> Self {
        Self {
            client,
            options: *client.task_options(),
            progress: None,
        }
    }

    pub fn options(mut self, options: TaskOptions) -> Self {
        self.options = options;
        self
    }

    /// Call `f` with every task info snapshot seen while monitoring.
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(&TaskInfo) + Send + Sync + 'a,
    {
        self.progress = Some(Box::new(f));
        self
    }

    fn property_collector(&self) -> PropertyCollector<'a> {
        self.client.property_collector()
    }

    /// The current info of a task, or `None` when the server has none.
    pub async fn task_info(
        &self,
        task: &ManagedObjectReference,
    ) -> Result<Option<TaskInfo>> {
        let info = match self
            .property_collector()
            .dynamic_property(task, TASK_INFO_PROPERTY)
            .await?
        {
            Some(Value::TaskInfo(info)) => *info,
            _ => return Ok(None),
        };
        if let (TaskInfoState::Error, Some(fault)) = (info.state, &info.error)
        {
            error!(
                "{} | task {} failed: {} ({})",
                info.entity_name.as_deref().unwrap_or("-"),
                info.display_name(),
                fault,
                fault.fault_type.as_deref().unwrap_or("unknown fault type")
            );
            for msg in &fault.fault_messages {
                error!("{} | {}", info.display_name(), msg);
            }
        }
        Ok(Some(info))
    }

    /// Wait for the task to finish. Returns whether it succeeded; a task
    /// without info counts as failed.
    pub async fn monitor_task(
        &self,
        task: &ManagedObjectReference,
    ) -> Result<bool> {
        Ok(matches!(
            self.watch(task).await?,
            Some(TaskInfo {
                state: TaskInfoState::Success,
                ..
            })
        ))
    }

    /// Wait for the task to finish, turning the error state into
    /// `Error::TaskFailed`.
    pub async fn wait_for_task(
        &self,
        task: &ManagedObjectReference,
    ) -> Result<TaskInfo> {
        match self.watch(task).await? {
            Some(info) if info.state == TaskInfoState::Success => Ok(info),
            Some(info) => Err(Error::TaskFailed(failure(&info))),
            None => Err(Error::TaskFailed(TaskFailure {
                task_name: task.value.clone(),
                target: None,
                fault_type: None,
                message: String::from("task info unavailable"),
            })),
        }
    }

    /// Destroy a managed entity and wait for the removal to finish.
    pub async fn destroy(
        &self,
        entity: &ManagedObjectReference,
    ) -> Result<TaskInfo> {
        info!("destroying {}", entity);
        let task = self.client.call(&DestroyTask { entity }).await?;
        self.wait_for_task(&task).await
    }

    async fn watch(
        &self,
        task: &ManagedObjectReference,
    ) -> Result<Option<TaskInfo>> {
        let mut info = match self.task_info(task).await? {
            Some(info) => info,
            None => {
                error!("no info available for task {}", task);
                return Ok(None);
            }
        };

        if let Some(entity) = &info.entity {
            let name = match self.property_collector().name(entity).await {
                Ok(Some(name)) => name,
                Ok(None) => entity.value.clone(),
                Err(e) => {
                    warn!("failed to look up the name of {}: {}", entity, e);
                    entity.value.clone()
                }
            };
            info!(
                "{} {} | task {} ({}, {})",
                entity.r#type,
                name,
                info.display_name(),
                info.key,
                info.description_id.as_deref().unwrap_or("-")
            );
            if info.entity_name.is_none() {
                info.entity_name = Some(name);
            }
        }
        self.report_progress(&info);

        let pc = self.property_collector();
        let filter = pc.create_filter(task, TASK_INFO_PROPERTY).await?;
        debug!("monitoring task {} with filter {}", task, filter);

        let res = self.poll(task, info).await;

        if let Err(e) = pc.destroy_property_filter(&filter).await {
            warn!("failed to destroy property filter {}: {}", filter, e);
        }
        res.map(Some)
    }

    async fn poll(
        &self,
        task: &ManagedObjectReference,
        mut info: TaskInfo,
    ) -> Result<TaskInfo> {
        let mut version = String::new();
        let mut reported = Reported::default();
        let mut no_update = 0;

        loop {
            match self.wait_for_update(&version, &info).await? {
                Some(update) => {
                    no_update = 0;
                    self.apply_update(task, &update, &mut info, &mut reported);
                    version = update.version;
                    if info.state.is_terminal() {
                        return Ok(info);
                    }
                }
                None => {
                    no_update += 1;
                    if no_update >= self.options.max_wait_attempts {
                        return Err(Error::Timeout {
                            task: task.clone(),
                            attempts: no_update,
                        });
                    }
                    info!("{} | No update happened", info.display_name());
                }
            }

            if self.options.poll_interval_ms > 0 {
                tokio::time::sleep(self.options.poll_interval()).await;
            }
        }
    }

    /// One `WaitForUpdatesEx` call. Transport failures are retried after
    /// the poll interval, server faults are returned as is.
    async fn wait_for_update(
        &self,
        version: &str,
        info: &TaskInfo,
    ) -> Result<Option<UpdateSet>> {
        let attempts = self.options.max_wait_attempts + 1;
        let options =
            WaitOptions::max_wait_seconds(self.options.max_wait_seconds);
        let pc = self.property_collector();
        let mut attempt = 1;
        loop {
            match pc.wait_for_updates_ex(version, options).await {
                Ok(update) => return Ok(update),
                Err(e @ Error::Fault(_)) => return Err(e),
                Err(e) if attempt >= attempts => {
                    return Err(Error::WaitForUpdates {
                        attempts,
                        source: Box::new(e),
                    })
                }
                Err(e) => {
                    error!("{} | WaitForUpdatesEx failed: {}", info.key, e);
                    warn!(
                        "{} | waiting for updates again (attempt {}/{})",
                        info.display_name(),
                        attempt + 1,
                        attempts
                    );
                    attempt += 1;
                    if self.options.poll_interval_ms > 0 {
                        tokio::time::sleep(self.options.poll_interval()).await;
                    }
                }
            }
        }
    }

    fn apply_update(
        &self,
        task: &ManagedObjectReference,
        update: &UpdateSet,
        info: &mut TaskInfo,
        reported: &mut Reported,
    ) {
        let mut changed = false;
        for object in update.updates_for(task) {
            for change in &object.change_set {
                changed |= merge_change(info, change);
            }
        }
        if !changed {
            return;
        }

        if info.state != TaskInfoState::Queued
            && info.progress.is_some()
            && info.progress != reported.progress
        {
            info!(
                "{} | Task Progress {}",
                info.display_name(),
                info.progress.unwrap_or_default()
            );
            reported.progress = info.progress;
        }

        if reported.state != Some(info.state) {
            info!(
                "{} | State = {} | Error = {} | Result = {}",
                info.display_name(),
                info.state,
                info.error
                    .as_ref()
                    .map_or_else(|| String::from("-"), |e| e.to_string()),
                info.result
                    .as_ref()
                    .map_or_else(|| String::from("-"), |r| format!("{:?}", r))
            );
            reported.state = Some(info.state);
        }

        self.report_progress(info);
    }

    fn report_progress(&self, info: &TaskInfo) {
        if let Some(progress) = &self.progress {
            progress(info);
        }
    }
}

fn failure(info: &TaskInfo) -> TaskFailure {
    TaskFailure {
        task_name: info.display_name().to_string(),
        target: info
            .entity_name
            .clone()
            .or_else(|| info.entity.as_ref().map(|e| e.value.clone())),
        fault_type: info.error.as_ref().and_then(|e| e.fault_type.clone()),
        message: match &info.error {
            Some(fault) => fault.to_string(),
            None => String::from("unknown error"),
        },
    }
}

/// Merge a change of the `info` property, or one of its paths, into the
/// snapshot. Returns whether the change applied.
fn merge_change(info: &mut TaskInfo, change: &PropertyChange) -> bool {
    let val = change.val.as_ref();
    match change.name.as_str() {
        "info" => match val.and_then(Value::as_task_info) {
            Some(new) => {
                let entity_name = info.entity_name.take();
                *info = new.clone();
                if info.entity_name.is_none() {
                    info.entity_name = entity_name;
                }
                true
            }
            None => {
                warn!("{}: info change without task info", info.key);
                false
            }
        },
        "info.state" => {
            match val.and_then(Value::as_str).map(str::parse::<TaskInfoState>)
            {
                Some(Ok(state)) => {
                    info.state = state;
                    true
                }
                _ => {
                    warn!("{}: invalid task state {:?}", info.key, val);
                    false
                }
            }
        }
        "info.progress" => {
            info.progress = val
                .and_then(Value::as_i64)
                .and_then(|p| i32::try_from(p).ok());
            true
        }
        "info.error" => {
            info.error = val.and_then(Value::as_fault).cloned();
            true
        }
        "info.result" => {
            info.result = val.cloned();
            true
        }
        name => {
            debug!("{}: ignoring change of {}", info.key, name);
            false
        }
    }
}
