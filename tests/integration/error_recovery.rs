//! Transport failures, policies and cancellation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use component_architect::controller::{
    AttemptResult, OutcomeStatus, TransportFailurePolicy, EMPTY_OUTPUT_RULE,
};
use component_architect::error::GenerationError;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{
    config_for, controller_for, message_body, mount_initial, received_prompts, VALID_COMPONENT,
};

async fn mount_failures(server: &MockServer, template: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(template)
        .up_to_n_times(times)
        .with_priority(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_server_error_consumes_attempt_then_recovers() {
    let server = MockServer::start().await;
    mount_failures(&server, ResponseTemplate::new(500), 1).await;
    mount_initial(&server, VALID_COMPONENT).await;
    let controller = controller_for(&config_for(&server));

    let outcome = controller
        .run("A login card", &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(outcome.attempts[0].findings[0].rule, EMPTY_OUTPUT_RULE);
    let prompts = received_prompts(&server).await;
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn test_empty_text_is_transport_failure() {
    let server = MockServer::start().await;
    mount_failures(
        &server,
        ResponseTemplate::new(200).set_body_json(message_body("   ")),
        1,
    )
    .await;
    mount_initial(&server, VALID_COMPONENT).await;
    let controller = controller_for(&config_for(&server));

    let outcome = controller
        .run("A login card", &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(matches!(
        outcome.attempts[0].result,
        AttemptResult::TransportFailure {
            error: GenerationError::EmptyResponse
        }
    ));
}

#[tokio::test]
async fn test_fatal_policy_aborts_on_overload() {
    let server = MockServer::start().await;
    mount_failures(&server, ResponseTemplate::new(529), 1).await;
    mount_initial(&server, VALID_COMPONENT).await;
    let mut config = config_for(&server);
    config.transport_failure_policy = TransportFailurePolicy::Fatal;
    let controller = controller_for(&config);

    let outcome = controller
        .run("A login card", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Aborted);
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(received_prompts(&server).await.len(), 1);
}

#[tokio::test]
async fn test_bad_api_key_aborts_immediately() {
    let server = MockServer::start().await;
    mount_failures(&server, ResponseTemplate::new(401), 10).await;
    let controller = controller_for(&config_for(&server));

    let outcome = controller
        .run("A login card", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Aborted);
    assert!(matches!(
        outcome.attempts[0].result,
        AttemptResult::TransportFailure {
            error: GenerationError::AuthenticationFailed
        }
    ));
    assert_eq!(received_prompts(&server).await.len(), 1);
}

#[tokio::test]
async fn test_cancel_during_slow_response() {
    let server = MockServer::start().await;
    mount_failures(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(message_body(VALID_COMPONENT))
            .set_delay(Duration::from_secs(3)),
        1,
    )
    .await;
    let controller = controller_for(&config_for(&server));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let outcome = controller.run("A login card", &cancel).await.unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Cancelled);
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(outcome.attempts[0].result, AttemptResult::Cancelled);
    assert!(!outcome.success);
    assert_eq!(received_prompts(&server).await.len(), 1);
}

#[tokio::test]
async fn test_outcome_report_serializes() {
    let server = MockServer::start().await;
    mount_failures(&server, ResponseTemplate::new(429), 1).await;
    mount_initial(&server, VALID_COMPONENT).await;
    let controller = controller_for(&config_for(&server));

    let outcome = controller
        .run("A login card", &CancellationToken::new())
        .await
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["status"], "accepted");
    assert_eq!(json["attempts"][0]["result"]["type"], "transport_failure");
    assert_eq!(json["attempts"][0]["result"]["error"]["type"], "rate_limited");
    assert_eq!(json["attempts"][1]["findings"], serde_json::json!([]));
}
