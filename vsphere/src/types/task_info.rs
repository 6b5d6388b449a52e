/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xml::{attribute::OwnedAttribute, name::OwnedName};

use crate::codec::{
    bool_text, elements, parse_text, text, xsi_type, FromElement, ParseError,
    ParseResult, XmlInput,
};

use super::{value::property_value, ManagedObjectReference, Value};

#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskInfoState {
    Queued,
    Running,
    Success,
    Error,
}

impl TaskInfoState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl fmt::Display for TaskInfoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl FromStr for TaskInfoState {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            _ => Err(ParseError::InvalidValue("TaskInfoState", s.to_string())),
        }
    }
}

/// The fault attached to a failed task or to a missing property.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Default, Debug)]
pub struct LocalizedMethodFault {
    pub fault_type: Option<String>,
    pub fault_messages: Vec<String>,
    pub localized_message: Option<String>,
}

impl fmt::Display for LocalizedMethodFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.localized_message, &self.fault_type) {
            (Some(msg), _) if !msg.is_empty() => write!(f, "{}", msg),
            (_, Some(typ)) => write!(f, "{}", typ),
            _ => write!(f, "unknown fault"),
        }
    }
}

impl FromElement for LocalizedMethodFault {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut fault = LocalizedMethodFault::default();
        let (_, xml) = elements(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "fault" => {
                    fault.fault_type = xsi_type(attrs).map(str::to_string);
                    let (_, xml) = elements(xml, name, |name, _, xml| {
                        match name.local_name.as_str() {
                            "faultMessage" => {
                                let (_, xml) =
                                    elements(xml, name, |name, _, xml| {
                                        match name.local_name.as_str() {
                                            "message" => {
                                                let (msg, xml) =
                                                    text(xml, name)?;
                                                fault.fault_messages.push(msg);
                                                Ok(Some(xml))
                                            }
                                            _ => Ok(None),
                                        }
                                    })?;
                                Ok(Some(xml))
                            }
                            _ => Ok(None),
                        }
                    })?;
                    Ok(Some(xml))
                }
                "localizedMessage" => {
                    let (msg, xml) = text(xml, name)?;
                    fault.localized_message = Some(msg);
                    Ok(Some(xml))
                }
                _ => Ok(None),
            }
        })?;
        Ok((fault, xml))
    }
}

/// The `info` property of a `Task` managed object.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct TaskInfo {
    pub key: String,
    pub task: ManagedObjectReference,
    pub name: Option<String>,
    pub description_id: Option<String>,
    pub entity: Option<ManagedObjectReference>,
    pub entity_name: Option<String>,
    pub state: TaskInfoState,
    pub cancelled: bool,
    pub cancelable: bool,
    pub error: Option<LocalizedMethodFault>,
    pub result: Option<Value>,
    pub progress: Option<i32>,
    pub queue_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub complete_time: Option<DateTime<Utc>>,
    pub event_chain_id: Option<i32>,
}

impl TaskInfo {
    /// Name used in log lines: the method name, or the task key.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }
}

fn date_time<'a>(
    xml: XmlInput<'a>,
    tag: &OwnedName,
) -> ParseResult<'a, DateTime<Utc>> {
    let (s, xml) = text(xml, tag)?;
    match DateTime::parse_from_rfc3339(s.trim()) {
        Ok(dt) => Ok((dt.into(), xml)),
        Err(_) => Err(ParseError::InvalidValue("dateTime", s)),
    }
}

impl FromElement for TaskInfo {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut key = None;
        let mut task = None;
        let mut name = None;
        let mut description_id = None;
        let mut entity = None;
        let mut entity_name = None;
        let mut state: Option<TaskInfoState> = None;
        let mut cancelled = false;
        let mut cancelable = false;
        let mut error = None;
        let mut result = None;
        let mut progress: Option<i32> = None;
        let mut queue_time = None;
        let mut start_time = None;
        let mut complete_time = None;
        let mut event_chain_id: Option<i32> = None;

        let (_, xml) = elements(xml, tag, |elem, attrs, xml| {
            let xml = match elem.local_name.as_str() {
                "key" => {
                    let (v, xml) = text(xml, elem)?;
                    key = Some(v);
                    xml
                }
                "task" => {
                    let (v, xml) =
                        ManagedObjectReference::from_element(xml, elem, attrs)?;
                    task = Some(v);
                    xml
                }
                "name" => {
                    let (v, xml) = text(xml, elem)?;
                    name = Some(v);
                    xml
                }
                "descriptionId" => {
                    let (v, xml) = text(xml, elem)?;
                    description_id = Some(v);
                    xml
                }
                "entity" => {
                    let (v, xml) =
                        ManagedObjectReference::from_element(xml, elem, attrs)?;
                    entity = Some(v);
                    xml
                }
                "entityName" => {
                    let (v, xml) = text(xml, elem)?;
                    entity_name = Some(v);
                    xml
                }
                "state" => {
                    let (v, xml) = parse_text(xml, elem, "TaskInfoState")?;
                    state = Some(v);
                    xml
                }
                "cancelled" => {
                    let (v, xml) = bool_text(xml, elem)?;
                    cancelled = v;
                    xml
                }
                "cancelable" => {
                    let (v, xml) = bool_text(xml, elem)?;
                    cancelable = v;
                    xml
                }
                "error" => {
                    let (v, xml) =
                        LocalizedMethodFault::from_element(xml, elem, attrs)?;
                    error = Some(v);
                    xml
                }
                "result" => {
                    let (v, xml) = property_value(xml, elem, attrs)?;
                    result = Some(v);
                    xml
                }
                "progress" => {
                    let (v, xml) = parse_text(xml, elem, "progress")?;
                    progress = Some(v);
                    xml
                }
                "queueTime" => {
                    let (v, xml) = date_time(xml, elem)?;
                    queue_time = Some(v);
                    xml
                }
                "startTime" => {
                    let (v, xml) = date_time(xml, elem)?;
                    start_time = Some(v);
                    xml
                }
                "completeTime" => {
                    let (v, xml) = date_time(xml, elem)?;
                    complete_time = Some(v);
                    xml
                }
                "eventChainId" => {
                    let (v, xml) = parse_text(xml, elem, "eventChainId")?;
                    event_chain_id = Some(v);
                    xml
                }
                _ => return Ok(None),
            };
            Ok(Some(xml))
        })?;

        Ok((
            TaskInfo {
                key: key.ok_or(ParseError::Syntax("missing TaskInfo key"))?,
                task: task.ok_or(ParseError::Syntax("missing TaskInfo task"))?,
                name,
                description_id,
                entity,
                entity_name,
                state: state
                    .ok_or(ParseError::Syntax("missing TaskInfo state"))?,
                cancelled,
                cancelable,
                error,
                result,
                progress,
                queue_time,
                start_time,
                complete_time,
                event_chain_id,
            },
            xml,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{any_start_tag, read_events, start_document};

    #[test]
    fn failed_task_info() {
        let data = r#"<val xmlns="urn:vim25" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="TaskInfo">
  <key>task-101</key>
  <task type="Task">task-101</task>
  <name>CreateClusterEx</name>
  <descriptionId>Folder.createClusterEx</descriptionId>
  <entity type="Folder">group-h4</entity>
  <entityName>host</entityName>
  <state>error</state>
  <cancelled>false</cancelled>
  <cancelable>false</cancelable>
  <error>
    <fault xsi:type="DuplicateName">
      <faultMessage><key>msg.duplicate</key><message>duplicate</message></faultMessage>
      <name>Cluster1</name>
    </fault>
    <localizedMessage>The name 'Cluster1' already exists.</localizedMessage>
  </error>
  <reason xsi:type="TaskReasonUser"><userName>root</userName></reason>
  <queueTime>2020-01-01T10:00:00.000Z</queueTime>
  <startTime>2020-01-01T10:00:01.000Z</startTime>
  <completeTime>2020-01-01T10:00:02.000Z</completeTime>
  <eventChainId>345</eventChainId>
</val>"#;
        let xml = read_events(xml::reader::EventReader::from_str(data))
            .unwrap();
        let (_, xml) = start_document(&xml).unwrap();
        let ((tag, attrs), xml) = any_start_tag(xml).unwrap();
        let (info, _) = TaskInfo::from_element(xml, tag, attrs).unwrap();

        assert_eq!(info.key, "task-101");
        assert_eq!(info.task, ManagedObjectReference::new("Task", "task-101"));
        assert_eq!(info.display_name(), "CreateClusterEx");
        assert_eq!(info.state, TaskInfoState::Error);
        assert!(info.state.is_terminal());
        assert_eq!(
            info.entity,
            Some(ManagedObjectReference::new("Folder", "group-h4"))
        );
        let error = info.error.unwrap();
        assert_eq!(error.fault_type.as_deref(), Some("DuplicateName"));
        assert_eq!(error.fault_messages, vec![String::from("duplicate")]);
        assert_eq!(
            error.to_string(),
            "The name 'Cluster1' already exists."
        );
        assert_eq!(info.event_chain_id, Some(345));
        assert!(info.complete_time.is_some());
    }

    #[test]
    fn state_names() {
        assert_eq!(
            "running".parse::<TaskInfoState>().unwrap(),
            TaskInfoState::Running
        );
        assert!("done".parse::<TaskInfoState>().is_err());
        assert!(!TaskInfoState::Queued.is_terminal());
    }
}
