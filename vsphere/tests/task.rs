/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod common;

use std::sync::Mutex;

use reqwest::StatusCode;

use common::*;
use vsphere::{Error, ManagedObjectReference, TaskInfoState, TaskOptions};

const FILTER: &str = "session[52b6f5e2]filter-1";

fn task(value: &str) -> ManagedObjectReference {
    ManagedObjectReference::new("Task", value)
}

fn script_filter(mock: &MockTransport) {
    mock.reply(
        "CreateFilter",
        returnval_mor("CreateFilter", "PropertyFilter", FILTER),
    );
    mock.reply("DestroyPropertyFilter", void("DestroyPropertyFilter"));
}

fn error_info(task: &str) -> String {
    task_info_val(
        task,
        "error",
        r#"<error><fault xsi:type="InvalidPowerState"><requestedState>poweredOff</requestedState></fault><localizedMessage>The attempted operation cannot be performed in the current state (Powered on).</localizedMessage></error>"#,
    )
}

#[tokio::test]
async fn task_runs_to_success() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply(
        "RetrievePropertiesEx",
        task_info_reply(
            "task-1",
            "running",
            r#"<entity type="VirtualMachine">vm-42</entity>"#,
        ),
    );
    mock.reply(
        "RetrievePropertiesEx",
        retrieve_result(
            "RetrievePropertiesEx",
            None,
            &[named("VirtualMachine", "vm-42", "web-01")],
        ),
    );
    script_filter(&mock);
    mock.reply(
        "WaitForUpdatesEx",
        update_set(
            "1",
            "task-1",
            &[change("info.progress", &val("xsd:int", "50"))],
        ),
    );
    mock.reply(
        "WaitForUpdatesEx",
        update_set(
            "2",
            "task-1",
            &[change("info.state", &val("TaskInfoState", "success"))],
        ),
    );

    let seen = Mutex::new(Vec::new());
    let done = client
        .task_monitor()
        .on_progress(|info| {
            seen.lock().unwrap().push((info.state, info.progress))
        })
        .monitor_task(&task("task-1"))
        .await
        .unwrap();

    assert!(done);
    assert_eq!(
        seen.into_inner().unwrap(),
        vec![
            (TaskInfoState::Running, None),
            (TaskInfoState::Running, Some(50)),
            (TaskInfoState::Success, Some(50)),
        ]
    );

    let created = &mock.bodies("CreateFilter")[0];
    assert!(created.contains("<ns1:pathSet>info</ns1:pathSet>"));
    assert!(created.contains("<ns1:partialUpdates>false</ns1:partialUpdates>"));
    let waits = mock.bodies("WaitForUpdatesEx");
    assert_eq!(waits.len(), 2);
    assert!(waits[1].contains("<ns1:version>1</ns1:version>"));
    assert!(waits[1].contains("<ns1:maxWaitSeconds>3</ns1:maxWaitSeconds>"));
    assert!(mock.bodies("DestroyPropertyFilter")[0].contains(FILTER));
    assert!(mock.pending().is_empty());
}

#[tokio::test]
async fn task_error_is_reported() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply(
        "RetrievePropertiesEx",
        task_info_reply("task-2", "queued", ""),
    );
    script_filter(&mock);
    mock.reply(
        "WaitForUpdatesEx",
        update_set("1", "task-2", &[change("info", &error_info("task-2"))]),
    );

    let err = client
        .task_monitor()
        .wait_for_task(&task("task-2"))
        .await
        .unwrap_err();

    match err {
        Error::TaskFailed(failure) => {
            assert_eq!(failure.task_name, "Destroy_Task");
            assert_eq!(
                failure.fault_type.as_deref(),
                Some("InvalidPowerState")
            );
            assert!(failure.message.contains("cannot be performed"));
        }
        e => panic!("unexpected error: {}", e),
    }
    assert_eq!(mock.count("DestroyPropertyFilter"), 1);
}

#[tokio::test]
async fn failed_task_monitors_false() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply(
        "RetrievePropertiesEx",
        task_info_reply("task-2", "running", ""),
    );
    script_filter(&mock);
    mock.reply(
        "WaitForUpdatesEx",
        update_set(
            "1",
            "task-2",
            &[change("info.state", &val("TaskInfoState", "error"))],
        ),
    );

    let done = client
        .task_monitor()
        .monitor_task(&task("task-2"))
        .await
        .unwrap();

    assert!(!done);
}

#[tokio::test]
async fn task_without_info_fails() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply("RetrievePropertiesEx", empty_retrieve());

    let done = client
        .task_monitor()
        .monitor_task(&task("task-9"))
        .await
        .unwrap();

    assert!(!done);
    assert_eq!(mock.count("CreateFilter"), 0);
}

#[tokio::test]
async fn no_updates_time_out() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply(
        "RetrievePropertiesEx",
        task_info_reply("task-3", "running", ""),
    );
    script_filter(&mock);
    mock.reply("WaitForUpdatesEx", no_update());
    mock.reply("WaitForUpdatesEx", no_update());

    let err = client
        .task_monitor()
        .options(TaskOptions {
            max_wait_seconds: 1,
            max_wait_attempts: 2,
            poll_interval_ms: 0,
        })
        .monitor_task(&task("task-3"))
        .await
        .unwrap_err();

    match err {
        Error::Timeout { task: t, attempts } => {
            assert_eq!(t, task("task-3"));
            assert_eq!(attempts, 2);
        }
        e => panic!("unexpected error: {}", e),
    }
    assert_eq!(mock.count("WaitForUpdatesEx"), 2);
    assert_eq!(mock.count("DestroyPropertyFilter"), 1);
}

#[tokio::test]
async fn update_resets_no_update_count() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply(
        "RetrievePropertiesEx",
        task_info_reply("task-4", "running", ""),
    );
    script_filter(&mock);
    mock.reply("WaitForUpdatesEx", no_update());
    mock.reply(
        "WaitForUpdatesEx",
        update_set(
            "1",
            "task-4",
            &[change("info.progress", &val("xsd:int", "10"))],
        ),
    );
    mock.reply("WaitForUpdatesEx", no_update());
    mock.reply(
        "WaitForUpdatesEx",
        update_set(
            "2",
            "task-4",
            &[change("info.state", &val("TaskInfoState", "success"))],
        ),
    );

    let done = client
        .task_monitor()
        .options(TaskOptions {
            max_wait_seconds: 1,
            max_wait_attempts: 2,
            poll_interval_ms: 0,
        })
        .monitor_task(&task("task-4"))
        .await
        .unwrap();

    assert!(done);
    assert_eq!(mock.count("WaitForUpdatesEx"), 4);
}

#[tokio::test]
async fn failing_wait_is_retried() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply(
        "RetrievePropertiesEx",
        task_info_reply("task-5", "running", ""),
    );
    script_filter(&mock);
    mock.fail("WaitForUpdatesEx", StatusCode::SERVICE_UNAVAILABLE);
    mock.fail("WaitForUpdatesEx", StatusCode::BAD_GATEWAY);
    mock.reply(
        "WaitForUpdatesEx",
        update_set(
            "1",
            "task-5",
            &[change("info.state", &val("TaskInfoState", "success"))],
        ),
    );

    let done = client
        .task_monitor()
        .monitor_task(&task("task-5"))
        .await
        .unwrap();

    assert!(done);
    assert_eq!(mock.count("WaitForUpdatesEx"), 3);
}

#[tokio::test]
async fn exhausted_wait_retries_fail() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply(
        "RetrievePropertiesEx",
        task_info_reply("task-6", "running", ""),
    );
    script_filter(&mock);
    mock.fail("WaitForUpdatesEx", StatusCode::SERVICE_UNAVAILABLE);
    mock.fail("WaitForUpdatesEx", StatusCode::SERVICE_UNAVAILABLE);

    let err = client
        .task_monitor()
        .options(TaskOptions {
            max_wait_seconds: 1,
            max_wait_attempts: 1,
            poll_interval_ms: 0,
        })
        .monitor_task(&task("task-6"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::WaitForUpdates { attempts: 2, .. }));
    assert_eq!(mock.count("DestroyPropertyFilter"), 1);
}

#[tokio::test]
async fn destroy_waits_for_the_task() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply(
        "Destroy_Task",
        returnval_mor("Destroy_Task", "Task", "task-7"),
    );
    mock.reply(
        "RetrievePropertiesEx",
        task_info_reply("task-7", "queued", ""),
    );
    script_filter(&mock);
    mock.reply(
        "WaitForUpdatesEx",
        update_set(
            "1",
            "task-7",
            &[change("info.state", &val("TaskInfoState", "success"))],
        ),
    );

    let vm = ManagedObjectReference::new("VirtualMachine", "vm-42");
    let info = client.task_monitor().destroy(&vm).await.unwrap();

    assert_eq!(info.state, TaskInfoState::Success);
    assert_eq!(info.task, task("task-7"));
    assert!(mock.bodies("Destroy_Task")[0]
        .contains(r#"<ns1:_this type="VirtualMachine">vm-42</ns1:_this>"#));
}

#[tokio::test]
async fn wait_fault_is_not_retried() {
    let mock = MockTransport::new();
    let client = client(&mock).await;
    mock.reply(
        "RetrievePropertiesEx",
        task_info_reply("task-8", "running", ""),
    );
    script_filter(&mock);
    mock.reply(
        "WaitForUpdatesEx",
        fault("InvalidCollectorVersion", "The collector version is invalid."),
    );

    let err = client
        .task_monitor()
        .monitor_task(&task("task-8"))
        .await
        .unwrap_err();

    assert_eq!(
        err.fault().and_then(|f| f.fault_type.as_deref()),
        Some("InvalidCollectorVersion")
    );
    assert_eq!(mock.count("WaitForUpdatesEx"), 1);
    assert_eq!(mock.count("DestroyPropertyFilter"), 1);
}
