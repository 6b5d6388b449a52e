/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;

use vsphere::{
    Config, Credentials, SoapError, TaskOptions, Transport, VimClient,
};

/// A transport answering each vim25 method from a queue of scripted
/// replies, recording every request it receives.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<(String, String)>>,
}

#[derive(Debug)]
pub enum Reply {
    Body(String),
    Status(StatusCode),
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, method: &str, body: String) {
        self.push(method, Reply::Body(body));
    }

    pub fn fail(&self, method: &str, status: StatusCode) {
        self.push(method, Reply::Status(status));
    }

    fn push(&self, method: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Methods called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|m| *m == method).count()
    }

    /// Request bodies sent for `method`, in order.
    pub fn bodies(&self, method: &str) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// Replies that were scripted but never consumed.
    pub fn pending(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, replies)| !replies.is_empty())
            .map(|(method, _)| method.clone())
            .collect()
    }
}

fn method_name(body: &str) -> String {
    let start = body.find("<ns1:").expect("no vim25 method in request") + 5;
    body[start..]
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, body: String) -> Result<String, SoapError> {
        let method = method_name(&body);
        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), body));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&method)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Status(status)) => Err(SoapError::Status(status)),
            None => panic!("unexpected call to {}", method),
        }
    }
}

/* Clients. */

pub fn config() -> Config {
    let mut config = Config::new("vcenter.lab.local");
    config.credentials = Some(Credentials {
        username: String::from("administrator@vsphere.local"),
        password: Some(String::from("secret")),
    });
    config.task = TaskOptions {
        max_wait_seconds: 3,
        max_wait_attempts: 3,
        poll_interval_ms: 0,
    };
    config
}

/// A client logged in to a vCenter server over `mock`.
pub async fn client(mock: &Arc<MockTransport>) -> VimClient {
    client_with(mock, &config()).await
}

pub async fn client_with(
    mock: &Arc<MockTransport>,
    config: &Config,
) -> VimClient {
    mock.reply(
        "RetrieveServiceContent",
        service_content("VirtualCenter"),
    );
    if config.credentials.is_some() {
        mock.reply("Login", login());
    }
    VimClient::with_transport(mock.clone(), config)
        .await
        .expect("connect")
}

/* Fixtures. */

pub fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenc="http://schemas.xmlsoap.org/soap/encoding/" xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<soapenv:Body>
{}
</soapenv:Body>
</soapenv:Envelope>"#,
        body
    )
}

pub fn response(method: &str, content: &str) -> String {
    envelope(&format!(
        r#"<{method}Response xmlns="urn:vim25">{content}</{method}Response>"#
    ))
}

pub fn void(method: &str) -> String {
    response(method, "")
}

pub fn fault(fault_type: &str, message: &str) -> String {
    envelope(&format!(
        r#"<soapenv:Fault><faultcode>ServerFaultCode</faultcode><faultstring>{message}</faultstring><detail><{fault_type}Fault xmlns="urn:vim25" xsi:type="{fault_type}"></{fault_type}Fault></detail></soapenv:Fault>"#
    ))
}

pub fn returnval_mor(method: &str, r#type: &str, value: &str) -> String {
    response(
        method,
        &format!(r#"<returnval type="{}">{}</returnval>"#, r#type, value),
    )
}

pub fn service_content(api_type: &str) -> String {
    response(
        "RetrieveServiceContent",
        &format!(
            r#"<returnval>
<rootFolder type="Folder">group-d1</rootFolder>
<propertyCollector type="PropertyCollector">propertyCollector</propertyCollector>
<viewManager type="ViewManager">ViewManager</viewManager>
<about>
<name>VMware vCenter Server</name>
<fullName>VMware vCenter Server 7.0.3 build-20150588</fullName>
<vendor>VMware, Inc.</vendor>
<version>7.0.3</version>
<build>20150588</build>
<localeVersion>INTL</localeVersion>
<localeBuild>000</localeBuild>
<osType>linux-x64</osType>
<productLineId>vpx</productLineId>
<apiType>{api_type}</apiType>
<apiVersion>7.0.3.0</apiVersion>
<instanceUuid>0b7c8e7f-6c1a-4f0e-9d1e-3f0a5b2c9d11</instanceUuid>
</about>
<setting type="OptionManager">VpxSettings</setting>
<sessionManager type="SessionManager">SessionManager</sessionManager>
<taskManager type="TaskManager">TaskManager</taskManager>
<searchIndex type="SearchIndex">SearchIndex</searchIndex>
</returnval>"#
        ),
    )
}

pub fn login() -> String {
    response(
        "Login",
        r#"<returnval>
<key>52b6f5e2-0f5e-7c1d-8e2e-1a9c3d4b5f60</key>
<userName>VSPHERE.LOCAL\Administrator</userName>
<fullName>Administrator vsphere.local</fullName>
<loginTime>2024-05-02T09:15:04.210371Z</loginTime>
<lastActiveTime>2024-05-02T09:15:04.210371Z</lastActiveTime>
<locale>en</locale>
<messageLocale>en</messageLocale>
<extensionSession>false</extensionSession>
<ipAddress>10.0.0.20</ipAddress>
<userAgent>SmartAgent</userAgent>
<callCount>0</callCount>
</returnval>"#,
    )
}

/// A `val` element with an xsi type.
pub fn val(r#type: &str, content: &str) -> String {
    format!(r#"<val xsi:type="{}">{}</val>"#, r#type, content)
}

pub fn string_val(s: &str) -> String {
    val("xsd:string", s)
}

pub fn mors_val(mors: &[(&str, &str)]) -> String {
    val(
        "ArrayOfManagedObjectReference",
        &mors
            .iter()
            .map(|(t, v)| {
                format!(
                    r#"<ManagedObjectReference type="{t}" xsi:type="ManagedObjectReference">{v}</ManagedObjectReference>"#
                )
            })
            .collect::<String>(),
    )
}

/// An `objects` element with the given (name, val element) properties.
pub fn object(r#type: &str, value: &str, props: &[(&str, String)]) -> String {
    let props = props
        .iter()
        .map(|(name, val)| {
            format!("<propSet><name>{}</name>{}</propSet>", name, val)
        })
        .collect::<String>();
    format!(
        r#"<objects><obj type="{}">{}</obj>{}</objects>"#,
        r#type, value, props
    )
}

/// An object with just its name.
pub fn named(r#type: &str, value: &str, name: &str) -> String {
    object(r#type, value, &[("name", string_val(name))])
}

pub fn retrieve_result(
    method: &str,
    token: Option<&str>,
    objects: &[String],
) -> String {
    let token = token
        .map(|t| format!("<token>{}</token>", t))
        .unwrap_or_default();
    response(
        method,
        &format!("<returnval>{}{}</returnval>", token, objects.concat()),
    )
}

pub fn empty_retrieve() -> String {
    void("RetrievePropertiesEx")
}

/// The content of a `TaskInfo` element.
pub fn task_info(task: &str, state: &str, extra: &str) -> String {
    format!(
        r#"<key>{task}</key><task type="Task">{task}</task><name>Destroy_Task</name><descriptionId>VirtualMachine.destroy</descriptionId><state>{state}</state><cancelled>false</cancelled><cancelable>true</cancelable>{extra}<queueTime>2024-05-02T09:16:00.000Z</queueTime><eventChainId>4211</eventChainId>"#
    )
}

pub fn task_info_val(task: &str, state: &str, extra: &str) -> String {
    val("TaskInfo", &task_info(task, state, extra))
}

/// The reply to reading a task's `info` property.
pub fn task_info_reply(task: &str, state: &str, extra: &str) -> String {
    retrieve_result(
        "RetrievePropertiesEx",
        None,
        &[object(
            "Task",
            task,
            &[("info", task_info_val(task, state, extra))],
        )],
    )
}

pub fn change(name: &str, val: &str) -> String {
    format!(
        "<changeSet><name>{}</name><op>assign</op>{}</changeSet>",
        name, val
    )
}

pub fn update_set(version: &str, task: &str, changes: &[String]) -> String {
    response(
        "WaitForUpdatesEx",
        &format!(
            r#"<returnval><version>{version}</version><filterSet><filter type="PropertyFilter">session[52b6f5e2]filter-1</filter><objectSet><kind>modify</kind><obj type="Task">{task}</obj>{}</objectSet></filterSet></returnval>"#,
            changes.concat()
        ),
    )
}

pub fn no_update() -> String {
    void("WaitForUpdatesEx")
}
