/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::response::{parse, Returnval, Void};
use crate::types::ManagedObjectReference;

use super::Request;

#[derive(Serialize, Debug)]
pub struct CreateContainerView<'a> {
    pub view_manager: &'a ManagedObjectReference,
    pub container: &'a ManagedObjectReference,
    pub types: &'a [&'a str],
    pub recursive: bool,
}

#[derive(Serialize, Debug)]
pub struct DestroyView<'a> {
    pub view: &'a ManagedObjectReference,
}

impl<'a> Request for CreateContainerView<'a> {
    type Response = ManagedObjectReference;

    fn method(&self) -> &'static str {
        "CreateContainerView"
    }

    fn body(&self) -> Result<String> {
        let template = r#"<SOAP-ENV:Body xmlns:ns1="urn:vim25">
							<ns1:CreateContainerView xsi:type="ns1:CreateContainerViewRequestType">
								<ns1:_this type="{{view_manager.type}}">{{view_manager.value}}</ns1:_this>
								<ns1:container type="{{container.type}}">{{container.value}}</ns1:container>
								{{#each types}}<ns1:type>{{this}}</ns1:type>{{/each}}
								<ns1:recursive>{{recursive}}</ns1:recursive>
							</ns1:CreateContainerView>
						</SOAP-ENV:Body>"#;
        Ok(Handlebars::new().render_template(template, self)?)
    }

    fn parse(data: &str) -> Result<ManagedObjectReference> {
        match parse::<Returnval<ManagedObjectReference>>(data)? {
            Returnval(Some(view)) => Ok(view),
            Returnval(None) => Err(Error::UnexpectedResponse(
                "CreateContainerView without view",
            )),
        }
    }
}

impl<'a> Request for DestroyView<'a> {
    type Response = ();

    fn method(&self) -> &'static str {
        "DestroyView"
    }

    fn body(&self) -> Result<String> {
        let template = r#"<SOAP-ENV:Body xmlns:ns1="urn:vim25">
							<ns1:DestroyView xsi:type="ns1:DestroyViewRequestType">
								<ns1:_this type="{{view.type}}">{{view.value}}</ns1:_this>
							</ns1:DestroyView>
						</SOAP-ENV:Body>"#;
        Ok(Handlebars::new().render_template(template, self)?)
    }

    fn parse(data: &str) -> Result<()> {
        parse::<Void>(data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_view_body() {
        let body = CreateContainerView {
            view_manager: &ManagedObjectReference::new(
                "ViewManager",
                "ViewManager",
            ),
            container: &ManagedObjectReference::new("Folder", "group-d1"),
            types: &["HostSystem"],
            recursive: true,
        }
        .body()
        .unwrap();
        assert!(body.contains(
            r#"<ns1:container type="Folder">group-d1</ns1:container>"#
        ));
        assert!(body.contains("<ns1:type>HostSystem</ns1:type>"));
        assert!(body.contains("<ns1:recursive>true</ns1:recursive>"));
    }
}
