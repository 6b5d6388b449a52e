/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::response::{deserialize, parse, Void};
use crate::types::{ManagedObjectReference, UserSession};

use super::{Request, Value};

#[derive(Serialize, Debug)]
pub struct Login {
    pub session_manager: ManagedObjectReference,
    pub username: String,
    pub password: String,
    pub locale: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct Logout {
    pub session_manager: ManagedObjectReference,
}

impl Request for Login {
    type Response = UserSession;

    fn method(&self) -> &'static str {
        "Login"
    }

    fn body(&self) -> Result<String> {
        let template = r#"<SOAP-ENV:Body xmlns:ns1="urn:vim25">
							<ns1:Login xsi:type="ns1:LoginRequestType">
								<ns1:_this type="{{session_manager.type}}">{{session_manager.value}}</ns1:_this>
								<ns1:userName>{{username}}</ns1:userName>
								<ns1:password>{{password}}</ns1:password>
								{{#if locale}}<ns1:locale>{{locale}}</ns1:locale>{{/if}}
							</ns1:Login>
						</SOAP-ENV:Body>"#;
        Ok(Handlebars::new().render_template(template, self)?)
    }

    fn loggable(&self) -> bool {
        false
    }

    fn parse(data: &str) -> Result<UserSession> {
        let response: Envelope = deserialize(data)?;
        Ok(response.body.response.returnval.into())
    }
}

impl Request for Logout {
    type Response = ();

    fn method(&self) -> &'static str {
        "Logout"
    }

    fn body(&self) -> Result<String> {
        let template = r#"<SOAP-ENV:Body xmlns:ns1="urn:vim25">
							<ns1:Logout xsi:type="ns1:LogoutRequestType">
								<ns1:_this type="{{session_manager.type}}">{{session_manager.value}}</ns1:_this>
							</ns1:Logout>
						</SOAP-ENV:Body>"#;
        Ok(Handlebars::new().render_template(template, self)?)
    }

    fn parse(data: &str) -> Result<()> {
        parse::<Void>(data)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Envelope {
    #[serde(rename = "Body")]
    body: Body,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Body {
    #[serde(rename = "LoginResponse")]
    response: Response,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Response {
    returnval: ReturnValue,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ReturnValue {
    key: Value<String>,
    #[serde(rename = "userName")]
    username: Value<String>,
    #[serde(rename = "fullName")]
    fullname: Option<Value<String>>,
    #[serde(rename = "loginTime")]
    login_time: Value<DateTime<Utc>>,
    #[serde(rename = "lastActiveTime")]
    last_active_time: Value<DateTime<Utc>>,
    locale: Option<Value<String>>,
    #[serde(rename = "messageLocale")]
    message_locale: Option<Value<String>>,
}

impl From<ReturnValue> for UserSession {
    fn from(val: ReturnValue) -> Self {
        UserSession {
            key: val.key.data,
            user_name: val.username.data,
            full_name: val.fullname.map(|v| v.data),
            login_time: val.login_time.data,
            last_active_time: val.last_active_time.data,
            locale: val.locale.map(|v| v.data),
            message_locale: val.message_locale.map(|v| v.data),
        }
    }
}
