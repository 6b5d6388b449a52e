/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use handlebars::Handlebars;
use serde::Serialize;

use xml::writer::XmlEvent;

use crate::codec::writer::{
    bool_elem, end_method, render, simple_elem, start_method,
};
use crate::error::{Error, Result};
use crate::response::{parse, Returnval, Void};
use crate::spec::{PropertyFilterSpec, WaitOptions};
use crate::types::{ManagedObjectReference, UpdateSet};

use super::Request;

pub struct CreateFilter<'a> {
    pub property_collector: &'a ManagedObjectReference,
    pub spec: &'a PropertyFilterSpec,
    pub partial_updates: bool,
}

#[derive(Serialize, Debug)]
pub struct DestroyPropertyFilter<'a> {
    pub filter: &'a ManagedObjectReference,
}

pub struct WaitForUpdatesEx<'a> {
    pub property_collector: &'a ManagedObjectReference,
    pub version: &'a str,
    pub options: WaitOptions,
}

impl<'a> Request for CreateFilter<'a> {
    type Response = ManagedObjectReference;

    fn method(&self) -> &'static str {
        "CreateFilter"
    }

    fn body(&self) -> Result<String> {
        render(|xml| {
            start_method(xml, self.method(), self.property_collector)?;
            self.spec.write(xml, "ns1:spec")?;
            bool_elem(xml, "ns1:partialUpdates", self.partial_updates)?;
            end_method(xml)
        })
        .map_err(Error::GenerateRequest)
    }

    fn parse(data: &str) -> Result<ManagedObjectReference> {
        match parse::<Returnval<ManagedObjectReference>>(data)? {
            Returnval(Some(filter)) => Ok(filter),
            Returnval(None) => {
                Err(Error::UnexpectedResponse("CreateFilter without filter"))
            }
        }
    }
}

impl<'a> Request for DestroyPropertyFilter<'a> {
    type Response = ();

    fn method(&self) -> &'static str {
        "DestroyPropertyFilter"
    }

    fn body(&self) -> Result<String> {
        let template = r#"<SOAP-ENV:Body xmlns:ns1="urn:vim25">
							<ns1:DestroyPropertyFilter xsi:type="ns1:DestroyPropertyFilterRequestType">
								<ns1:_this type="{{filter.type}}">{{filter.value}}</ns1:_this>
							</ns1:DestroyPropertyFilter>
						</SOAP-ENV:Body>"#;
        Ok(Handlebars::new().render_template(template, self)?)
    }

    fn parse(data: &str) -> Result<()> {
        parse::<Void>(data)?;
        Ok(())
    }
}

impl<'a> Request for WaitForUpdatesEx<'a> {
    /// `None` when the wait timed out without changes.
    type Response = Option<UpdateSet>;

    fn method(&self) -> &'static str {
        "WaitForUpdatesEx"
    }

    fn body(&self) -> Result<String> {
        render(|xml| {
            start_method(xml, self.method(), self.property_collector)?;
            simple_elem(xml, "ns1:version", self.version)?;
            xml.write(XmlEvent::start_element("ns1:options"))?;
            if let Some(secs) = self.options.max_wait_seconds {
                simple_elem(xml, "ns1:maxWaitSeconds", &secs.to_string())?;
            }
            if let Some(max) = self.options.max_object_updates {
                simple_elem(xml, "ns1:maxObjectUpdates", &max.to_string())?;
            }
            xml.write(XmlEvent::end_element())?; // ns1:options
            end_method(xml)
        })
        .map_err(Error::GenerateRequest)
    }

    fn parse(data: &str) -> Result<Option<UpdateSet>> {
        let Returnval(update) = parse::<Returnval<UpdateSet>>(data)?;
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_options() {
        let pc = ManagedObjectReference::new("PropertyCollector", "pc-1");
        let body = WaitForUpdatesEx {
            property_collector: &pc,
            version: "",
            options: WaitOptions::max_wait_seconds(3),
        }
        .body()
        .unwrap();
        assert!(body.contains("<ns1:version"));
        assert!(body.contains("<ns1:maxWaitSeconds>3</ns1:maxWaitSeconds>"));
        assert!(!body.contains("maxObjectUpdates"));

        let body = WaitForUpdatesEx {
            property_collector: &pc,
            version: "4",
            options: WaitOptions::max_wait_seconds(0),
        }
        .body()
        .unwrap();
        assert!(body.contains("<ns1:version>4</ns1:version>"));
        assert!(body.contains("<ns1:maxWaitSeconds>0</ns1:maxWaitSeconds>"));
    }
}
