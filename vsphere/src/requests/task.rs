/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::response::{parse, Returnval};
use crate::types::ManagedObjectReference;

use super::Request;

/// `Destroy_Task` on any managed entity. Returns the task handle.
#[derive(Serialize, Debug)]
pub struct DestroyTask<'a> {
    pub entity: &'a ManagedObjectReference,
}

impl<'a> Request for DestroyTask<'a> {
    type Response = ManagedObjectReference;

    fn method(&self) -> &'static str {
        "Destroy_Task"
    }

    fn body(&self) -> Result<String> {
        let template = r#"<SOAP-ENV:Body xmlns:ns1="urn:vim25">
							<ns1:Destroy_Task xsi:type="ns1:Destroy_TaskRequestType">
								<ns1:_this type="{{entity.type}}">{{entity.value}}</ns1:_this>
							</ns1:Destroy_Task>
						</SOAP-ENV:Body>"#;
        Ok(Handlebars::new().render_template(template, self)?)
    }

    fn parse(data: &str) -> Result<ManagedObjectReference> {
        match parse::<Returnval<ManagedObjectReference>>(data)? {
            Returnval(Some(task)) => Ok(task),
            Returnval(None) => {
                Err(Error::UnexpectedResponse("Destroy_Task without task"))
            }
        }
    }
}
