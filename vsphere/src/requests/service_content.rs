/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::response::deserialize;
use crate::types::{AboutInfo, ApiType, ServiceContent};

use super::{MorField, Request, Value};

pub struct RetrieveServiceContent;

impl Request for RetrieveServiceContent {
    type Response = ServiceContent;

    fn method(&self) -> &'static str {
        "RetrieveServiceContent"
    }

    fn body(&self) -> Result<String> {
        Ok(r#"<SOAP-ENV:Body xmlns:ns1="urn:vim25">
							<ns1:RetrieveServiceContent xsi:type="ns1:RetrieveServiceContentRequestType">
								<ns1:_this type="ServiceInstance">ServiceInstance</ns1:_this>
							</ns1:RetrieveServiceContent>
						</SOAP-ENV:Body>"#
            .to_string())
    }

    fn parse(data: &str) -> Result<ServiceContent> {
        let response: Envelope = deserialize(data)?;
        Ok(response.body.response.returnval.into())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Envelope {
    #[serde(rename = "Body")]
    body: Body,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Body {
    #[serde(rename = "RetrieveServiceContentResponse")]
    response: Response,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Response {
    returnval: ReturnValue,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ReturnValue {
    #[serde(rename = "rootFolder")]
    root_folder: MorField,
    #[serde(rename = "propertyCollector")]
    property_collector: MorField,
    #[serde(rename = "viewManager")]
    view_manager: Option<MorField>,
    about: About,
    #[serde(rename = "sessionManager")]
    session_manager: Option<MorField>,
    #[serde(rename = "searchIndex")]
    search_index: Option<MorField>,
    #[serde(rename = "taskManager")]
    task_manager: Option<MorField>,
    #[serde(rename = "eventManager")]
    event_manager: Option<MorField>,
    #[serde(rename = "perfManager")]
    perf_manager: Option<MorField>,
    #[serde(rename = "licenseManager")]
    license_manager: Option<MorField>,
    #[serde(rename = "dvSwitchManager")]
    dv_switch_manager: Option<MorField>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct About {
    name: Value<String>,
    #[serde(rename = "fullName")]
    full_name: Value<String>,
    vendor: Value<String>,
    version: Value<String>,
    build: Value<String>,
    #[serde(rename = "osType")]
    os_type: Option<Value<String>>,
    #[serde(rename = "productLineId")]
    product_line_id: Option<Value<String>>,
    #[serde(rename = "apiType")]
    api_type: Value<String>,
    #[serde(rename = "apiVersion")]
    api_version: Value<String>,
    #[serde(rename = "instanceUuid")]
    instance_uuid: Option<Value<String>>,
    #[serde(rename = "licenseProductName")]
    license_product_name: Option<Value<String>>,
    #[serde(rename = "licenseProductVersion")]
    license_product_version: Option<Value<String>>,
}

impl From<ReturnValue> for ServiceContent {
    fn from(val: ReturnValue) -> Self {
        ServiceContent {
            root_folder: val.root_folder.into(),
            property_collector: val.property_collector.into(),
            view_manager: val.view_manager.map(Into::into),
            session_manager: val.session_manager.map(Into::into),
            search_index: val.search_index.map(Into::into),
            task_manager: val.task_manager.map(Into::into),
            event_manager: val.event_manager.map(Into::into),
            perf_manager: val.perf_manager.map(Into::into),
            license_manager: val.license_manager.map(Into::into),
            dv_switch_manager: val.dv_switch_manager.map(Into::into),
            about: val.about.into(),
        }
    }
}

impl From<About> for AboutInfo {
    fn from(about: About) -> Self {
        AboutInfo {
            name: about.name.data,
            full_name: about.full_name.data,
            vendor: about.vendor.data,
            version: about.version.data,
            build: about.build.data,
            os_type: about.os_type.map(|v| v.data),
            product_line_id: about.product_line_id.map(|v| v.data),
            api_type: ApiType::from(about.api_type.data.as_str()),
            api_version: about.api_version.data,
            instance_uuid: about.instance_uuid.map(|v| v.data),
            license_product_name: about.license_product_name.map(|v| v.data),
            license_product_version: about
                .license_product_version
                .map(|v| v.data),
        }
    }
}
