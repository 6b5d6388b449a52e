/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use handlebars::Handlebars;
use serde::Serialize;

use crate::codec::writer::{end_method, render, start_method};
use crate::error::{Error, Result};
use crate::response::{parse, Returnval};
use crate::spec::{PropertyFilterSpec, RetrieveOptions};
use crate::types::{ManagedObjectReference, RetrieveResult};

use super::Request;

pub struct RetrievePropertiesEx<'a> {
    pub property_collector: &'a ManagedObjectReference,
    pub spec_set: &'a [PropertyFilterSpec],
    pub options: RetrieveOptions,
}

#[derive(Serialize, Debug)]
pub struct ContinueRetrievePropertiesEx<'a> {
    pub property_collector: &'a ManagedObjectReference,
    pub token: &'a str,
}

impl<'a> Request for RetrievePropertiesEx<'a> {
    /// `None` when no object matched.
    type Response = Option<RetrieveResult>;

    fn method(&self) -> &'static str {
        "RetrievePropertiesEx"
    }

    fn body(&self) -> Result<String> {
        render(|xml| {
            start_method(xml, self.method(), self.property_collector)?;
            for spec in self.spec_set {
                spec.write(xml, "ns1:specSet")?;
            }
            self.options.write(xml)?;
            end_method(xml)
        })
        .map_err(Error::GenerateRequest)
    }

    fn parse(data: &str) -> Result<Option<RetrieveResult>> {
        let Returnval(result) = parse::<Returnval<RetrieveResult>>(data)?;
        Ok(result)
    }
}

impl<'a> Request for ContinueRetrievePropertiesEx<'a> {
    type Response = Option<RetrieveResult>;

    fn method(&self) -> &'static str {
        "ContinueRetrievePropertiesEx"
    }

    fn body(&self) -> Result<String> {
        let template = r#"<SOAP-ENV:Body xmlns:ns1="urn:vim25">
							<ns1:ContinueRetrievePropertiesEx xsi:type="ns1:ContinueRetrievePropertiesExRequestType">
								<ns1:_this type="{{property_collector.type}}">{{property_collector.value}}</ns1:_this>
								<ns1:token>{{token}}</ns1:token>
							</ns1:ContinueRetrievePropertiesEx>
						</SOAP-ENV:Body>"#;
        Ok(Handlebars::new().render_template(template, self)?)
    }

    fn parse(data: &str) -> Result<Option<RetrieveResult>> {
        let Returnval(result) = parse::<Returnval<RetrieveResult>>(data)?;
        Ok(result)
    }
}
