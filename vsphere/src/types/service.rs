/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{HOST_API_TYPE, VCENTER_API_TYPE};

use super::ManagedObjectReference;

/// The singleton managers of a vSphere endpoint, as returned by
/// `RetrieveServiceContent`.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct ServiceContent {
    pub root_folder: ManagedObjectReference,
    pub property_collector: ManagedObjectReference,
    pub view_manager: Option<ManagedObjectReference>,
    pub session_manager: Option<ManagedObjectReference>,
    pub search_index: Option<ManagedObjectReference>,
    pub task_manager: Option<ManagedObjectReference>,
    pub event_manager: Option<ManagedObjectReference>,
    pub perf_manager: Option<ManagedObjectReference>,
    pub license_manager: Option<ManagedObjectReference>,
    pub dv_switch_manager: Option<ManagedObjectReference>,
    pub about: AboutInfo,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct AboutInfo {
    pub name: String,
    pub full_name: String,
    pub vendor: String,
    pub version: String,
    pub build: String,
    pub os_type: Option<String>,
    pub product_line_id: Option<String>,
    pub api_type: ApiType,
    pub api_version: String,
    pub instance_uuid: Option<String>,
    pub license_product_name: Option<String>,
    pub license_product_version: Option<String>,
}

/// Kind of endpoint: a vCenter server or a standalone ESX host.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub enum ApiType {
    VirtualCenter,
    HostAgent,
    Other(String),
}

impl From<&str> for ApiType {
    fn from(s: &str) -> Self {
        match s {
            VCENTER_API_TYPE => Self::VirtualCenter,
            HOST_API_TYPE => Self::HostAgent,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VirtualCenter => write!(f, "{}", VCENTER_API_TYPE),
            Self::HostAgent => write!(f, "{}", HOST_API_TYPE),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct UserSession {
    pub key: String,
    pub user_name: String,
    pub full_name: Option<String>,
    pub login_time: DateTime<Utc>,
    pub last_active_time: DateTime<Utc>,
    pub locale: Option<String>,
    pub message_locale: Option<String>,
}
