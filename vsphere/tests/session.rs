/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod common;

use common::*;
use vsphere::types::ApiType;
use vsphere::{Error, ManagedObjectReference, VimClient};

#[tokio::test]
async fn connect_logs_in() {
    let mock = MockTransport::new();
    let client = client(&mock).await;

    assert_eq!(mock.calls(), vec!["RetrieveServiceContent", "Login"]);
    let login = &mock.bodies("Login")[0];
    assert!(login.contains(
        "<ns1:userName>administrator@vsphere.local</ns1:userName>"
    ));
    assert!(login.contains("<ns1:password>secret</ns1:password>"));

    assert!(client.is_connected());
    let session = client.user_session().unwrap();
    assert_eq!(session.user_name, r"VSPHERE.LOCAL\Administrator");

    let content = client.service_content();
    assert_eq!(content.root_folder.value, "group-d1");
    assert_eq!(content.about.api_version, "7.0.3.0");
    assert_eq!(content.dv_switch_manager, None);
}

#[tokio::test]
async fn api_type_checks() {
    let mock = MockTransport::new();
    let client = client(&mock).await;

    assert_eq!(client.api_type(), &ApiType::VirtualCenter);
    assert!(client.assert_vcenter().is_ok());
    match client.assert_host() {
        Err(Error::WrongApiType { expected, actual }) => {
            assert_eq!(expected, ApiType::HostAgent);
            assert_eq!(actual, ApiType::VirtualCenter);
        }
        res => panic!("unexpected result: {:?}", res),
    }
}

#[tokio::test]
async fn host_agent_endpoint() {
    let mock = MockTransport::new();
    mock.reply("RetrieveServiceContent", service_content("HostAgent"));
    mock.reply("Login", login());

    let client = VimClient::with_transport(mock.clone(), &config())
        .await
        .unwrap();

    assert!(client.assert_host().is_ok());
    assert!(client.assert_vcenter().is_err());
}

#[tokio::test]
async fn login_fault() {
    let mock = MockTransport::new();
    mock.reply(
        "RetrieveServiceContent",
        service_content("VirtualCenter"),
    );
    mock.reply(
        "Login",
        fault(
            "InvalidLogin",
            "Cannot complete login due to an incorrect user name or password.",
        ),
    );

    let err = VimClient::with_transport(mock.clone(), &config())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Login(_)));
    assert_eq!(
        err.fault().and_then(|f| f.fault_type.as_deref()),
        Some("InvalidLogin")
    );
}

#[tokio::test]
async fn missing_password() {
    let mock = MockTransport::new();
    mock.reply(
        "RetrieveServiceContent",
        service_content("VirtualCenter"),
    );
    let mut config = config();
    if let Some(credentials) = &mut config.credentials {
        credentials.password = None;
    }

    let err = VimClient::with_transport(mock.clone(), &config)
        .await
        .unwrap_err();

    match err {
        Error::MissingPassword(user) => {
            assert_eq!(user, "administrator@vsphere.local")
        }
        e => panic!("unexpected error: {}", e),
    }
    assert_eq!(mock.count("Login"), 0);
}

#[tokio::test]
async fn disconnect_logs_out() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply("Logout", void("Logout"));

    client.disconnect().await.unwrap();

    assert!(!client.is_connected());
    assert!(client.user_session().is_none());
    assert_eq!(mock.count("Logout"), 1);

    // Already disconnected: nothing to send.
    client.disconnect().await.unwrap();
    assert_eq!(mock.count("Logout"), 1);
}

#[tokio::test]
async fn failed_logout_still_disconnects() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply(
        "Logout",
        fault("NotAuthenticated", "The session is not authenticated."),
    );

    let err = client.disconnect().await.unwrap_err();

    assert!(err.fault().unwrap().is_not_authenticated());
    assert!(!client.is_connected());
    assert!(client.user_session().is_none());
}

#[tokio::test]
async fn expired_session_is_not_connected() {
    let mock = MockTransport::new();
    let mut config = config();
    config.session_timeout = Some(0);
    let client = client_with(&mock, &config).await;

    assert!(client.user_session().is_some());
    assert!(!client.is_connected());

    // Expired sessions are dropped without logging out.
    client.disconnect().await.unwrap();
    assert_eq!(mock.count("Logout"), 0);
    assert!(client.user_session().is_none());
}

#[tokio::test]
async fn anonymous_client() {
    let mock = MockTransport::new();
    let mut config = config();
    config.credentials = None;
    let client = client_with(&mock, &config).await;

    assert_eq!(mock.calls(), vec!["RetrieveServiceContent"]);
    assert!(!client.is_connected());
    client.disconnect().await.unwrap();
    assert_eq!(mock.calls().len(), 1);
}

#[tokio::test]
async fn not_authenticated_fault_drops_session() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply(
        "RetrievePropertiesEx",
        fault("NotAuthenticated", "The session is not authenticated."),
    );

    let host = ManagedObjectReference::new("HostSystem", "host-10");
    let err = client
        .property_collector()
        .entity_props(&host, &["name"])
        .await
        .unwrap_err();

    assert!(err.fault().unwrap().is_not_authenticated());
    assert!(!client.is_connected());
    assert!(client.user_session().is_none());

    // Nothing left to log out of.
    client.disconnect().await.unwrap();
    assert_eq!(mock.count("Logout"), 0);
}

#[tokio::test]
async fn other_faults_keep_session() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply("RetrievePropertiesEx", fault("InvalidProperty", ""));

    let host = ManagedObjectReference::new("HostSystem", "host-10");
    client
        .property_collector()
        .entity_props(&host, &["summary.nosuchprop"])
        .await
        .unwrap_err();

    assert!(client.is_connected());
}
