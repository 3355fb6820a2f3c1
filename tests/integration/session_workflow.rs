//! Multi-turn sessions over HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use component_architect::error::SessionError;
use component_architect::session::{ArtifactOrigin, ComponentSession, TurnKind};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{
    config_for, controller_for, message_body, mount_initial, received_prompts, VALID_COMPONENT,
};

const DARK_BUTTON: &str = r"import { Component } from '@angular/core';

@Component({
  selector: 'app-login-card',
  template: `<button class='bg-[#4f46e5] text-[#f8fafc]'>Sign In</button>`,
  styles: []
})
export class LoginCardComponent {}";

async fn mount_edit(server: &MockServer, instruction: &str, text: &str) {
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_string_contains(instruction))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_body(text)))
        .with_priority(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_edit_and_save_history() {
    let server = MockServer::start().await;
    mount_initial(&server, VALID_COMPONENT).await;
    mount_edit(&server, "darker button", DARK_BUTTON).await;
    let mut session = ComponentSession::new(controller_for(&config_for(&server)));
    let cancel = CancellationToken::new();

    let created = session.create("A login card", &cancel).await.unwrap();
    assert!(created.success);

    let edited = session
        .edit("Use a darker button", None, &cancel)
        .await
        .unwrap();
    assert!(edited.success);
    assert_eq!(session.current_code(), Some(DARK_BUTTON));
    assert_eq!(session.current().unwrap().origin, ArtifactOrigin::Edit);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert!(body["system"].as_str().unwrap().contains("MULTI-TURN"));
    assert!(body["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains(VALID_COMPONENT));

    let dir = TempDir::new().unwrap();
    let history_path = dir.path().join("history.json");
    session.save_history(&history_path).await.unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&history_path).unwrap()).unwrap();
    assert_eq!(saved[0]["type"], "create");
    assert_eq!(saved[1]["type"], "edit");
    assert_eq!(saved[1]["prompt"], "Use a darker button");
    assert_eq!(saved[1]["valid"], true);
    assert_eq!(session.history()[1].kind, TurnKind::Edit);
}

#[tokio::test]
async fn test_edit_targets_named_artifact() {
    let server = MockServer::start().await;
    mount_initial(&server, VALID_COMPONENT).await;
    mount_edit(&server, "darker button", DARK_BUTTON).await;
    let mut session = ComponentSession::new(controller_for(&config_for(&server)));
    let cancel = CancellationToken::new();

    session.create("A login card", &cancel).await.unwrap();
    session.edit("darker button", None, &cancel).await.unwrap();
    session.edit("darker button again", Some("v1"), &cancel).await.unwrap();

    let prompts = received_prompts(&server).await;
    assert!(prompts[2].contains(VALID_COMPONENT));
    assert_eq!(session.current().unwrap().id, "v3");
    assert_eq!(session.current().unwrap().parent.as_deref(), Some("v1"));
}

#[tokio::test]
async fn test_edit_errors_make_no_request() {
    let server = MockServer::start().await;
    mount_initial(&server, VALID_COMPONENT).await;
    let mut session = ComponentSession::new(controller_for(&config_for(&server)));
    let cancel = CancellationToken::new();

    let err = session.edit("Anything", None, &cancel).await.unwrap_err();
    assert_eq!(err, SessionError::NoComponent);

    session.create("A login card", &cancel).await.unwrap();
    let err = session
        .edit("Anything", Some("v7"), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::UnknownArtifact { id: "v7".into() });

    assert_eq!(received_prompts(&server).await.len(), 1);
}
