//! AgentDriver against mock agents, and the full suite over TCP.

mod common;

use std::sync::Arc;

use common::{mock_agent, quiet_harness, simulated_agent};

use muzz_qa_core::agent_driver::AgentDriver;
use muzz_qa_core::driver::{AutomationDriver, DriverError, Selector};
use muzz_qa_core::harness::{select, AgentLauncher, Feature};
use muzz_qa_core::protocol::Response;
use muzz_qa_core::scenarios;
use muzz_qa_core::simulated::SimulatedOptions;

async fn connected_driver(responses: Vec<Response>) -> AgentDriver {
    let addr = mock_agent(responses).await;
    let mut driver = AgentDriver::direct(addr.ip().to_string(), addr.port());
    driver.connect().await.unwrap();
    driver
}

#[tokio::test]
async fn test_dump_tree_via_agent_driver() {
    let json = r#"[{"testTag":"profiles_screen","children":[
        {"testTag":"button_logout","text":"Logout"},
        {"testTag":"profile_card","children":[{"testTag":"profile_name","text":"Hana"}]}
    ]}]"#;
    let driver = connected_driver(vec![
        Response::Ok,
        Response::Tree { json: json.into() },
    ])
    .await;

    let tree = driver.dump_tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children.len(), 2);
    assert_eq!(tree[0].children[1].children[0].visible_text(), "Hana");
}

#[tokio::test]
async fn test_find_element_via_agent_driver() {
    let json = r#"{"testTag":"likes_count_text","text":"Liked: 4"}"#;
    let driver = connected_driver(vec![
        Response::Ok,
        Response::Element {
            json: Some(json.into()),
        },
    ])
    .await;

    let el = driver
        .find_element(&Selector::tag("likes_count_text"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(el.visible_text(), "Liked: 4");
}

#[tokio::test]
async fn test_malformed_tree_json_is_parse_error() {
    let driver = connected_driver(vec![
        Response::Ok,
        Response::Tree {
            json: "not json".into(),
        },
    ])
    .await;

    let err = driver.dump_tree().await.unwrap_err();
    assert!(matches!(err, DriverError::JsonParse(_)));
}

#[tokio::test]
async fn test_wait_for_idle_and_relaunch() {
    let driver = connected_driver(vec![Response::Ok, Response::Ok, Response::Ok]).await;
    driver.wait_for_idle(250).await.unwrap();
    driver.relaunch().await.unwrap();
}

#[tokio::test]
async fn test_unexpected_response_kind_is_command_failed() {
    let driver = connected_driver(vec![
        Response::Ok,
        Response::Tree { json: "[]".into() },
    ])
    .await;

    let err = driver.click(&Selector::tag("button_like")).await.unwrap_err();
    assert!(matches!(err, DriverError::CommandFailed(ref m) if m.contains("unexpected response")));
}

#[tokio::test]
async fn test_simulated_agent_round_trip() {
    let addr = simulated_agent(SimulatedOptions::default()).await;
    let mut driver = AgentDriver::direct(addr.ip().to_string(), addr.port());
    driver.connect().await.unwrap();

    driver
        .type_text(&Selector::tag("username_field"), "user")
        .await
        .unwrap();
    driver.click(&Selector::text("Login")).await.unwrap();
    let error = driver
        .find_element(&Selector::tag("error_message"))
        .await
        .unwrap();
    assert!(error.is_some(), "missing password must be rejected");

    let err = driver.click(&Selector::tag("button_like")).await.unwrap_err();
    assert!(matches!(err, DriverError::CommandFailed(ref m) if m.contains("button_like")));
}

#[tokio::test]
async fn test_full_suite_over_agent_protocol() {
    let addr = simulated_agent(SimulatedOptions::default()).await;
    let launcher = Arc::new(AgentLauncher::new(addr.ip().to_string(), addr.port()));
    let (harness, _reporter) = quiet_harness(launcher);
    harness.prepare().await.unwrap();

    let report = harness.run_all(&scenarios::all()).await;
    let failed: Vec<_> = report
        .scenarios
        .iter()
        .filter(|s| !s.passed())
        .map(|s| (s.name.clone(), s.error.clone()))
        .collect();
    assert!(failed.is_empty(), "failures: {failed:?}");
    assert_eq!(report.scenarios.len(), 20);
}

#[tokio::test]
async fn test_relaunch_isolates_scenarios() {
    let addr = simulated_agent(SimulatedOptions::default()).await;
    let launcher = Arc::new(AgentLauncher::new(addr.ip().to_string(), addr.port()));
    let (harness, _reporter) = quiet_harness(launcher);

    // Logging in leaves the shared app on the profiles screen; the next
    // scenario must still start on the login screen.
    let selected: Vec<_> = select(&scenarios::all(), None, Some("successful_login"))
        .into_iter()
        .chain(select(&scenarios::all(), Some(Feature::Login), Some("login_screen")))
        .collect();
    assert_eq!(selected.len(), 2);

    let report = harness.run_all(&selected).await;
    assert!(report.all_passed());
}
