/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! The vim25 methods used by the client. Each request renders its own
//! `SOAP-ENV:Body` and parses its own response.

mod filter;
mod login;
mod retrieve;
mod service_content;
mod task;
mod view;

pub use filter::{CreateFilter, DestroyPropertyFilter, WaitForUpdatesEx};
pub use login::{Login, Logout};
pub use retrieve::{ContinueRetrievePropertiesEx, RetrievePropertiesEx};
pub use service_content::RetrieveServiceContent;
pub use task::DestroyTask;
pub use view::{CreateContainerView, DestroyView};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub trait Request {
    type Response;

    /// The vim25 method name, as it appears in the body.
    fn method(&self) -> &'static str;
    fn body(&self) -> Result<String>;
    /// Whether the body may be written to the debug log.
    fn loggable(&self) -> bool {
        true
    }
    fn parse(data: &str) -> Result<Self::Response>;
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Value<T> {
    #[serde(rename = "$value")]
    pub data: T,
}

/// A managed object reference field, as seen by serde-xml-rs.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct MorField {
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(rename = "$value")]
    pub value: String,
}

impl From<MorField> for crate::types::ManagedObjectReference {
    fn from(field: MorField) -> Self {
        Self::new(field.r#type, field.value)
    }
}
