//! Shared fixtures for the workflow tests.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::sync::Arc;

use component_architect::anthropic::AnthropicClient;
use component_architect::config::{Config, SecretString};
use component_architect::controller::RetryController;
use component_architect::tokens::DesignSystem;
use component_architect::validator::Validator;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKENS_JSON: &str = r##"{
  "tokens": {
    "colors": {
      "primary": "#6366f1",
      "primary-dark": "#4f46e5",
      "surface": "#1e293b",
      "text-primary": "#f8fafc"
    },
    "effects": { "glass-bg": "rgba(255, 255, 255, 0.08)" }
  },
  "tailwind_classes": { "primary-button": "bg-[#6366f1] hover:bg-[#4f46e5]" }
}"##;

pub const VALID_COMPONENT: &str = r"import { Component } from '@angular/core';

@Component({
  selector: 'app-login-card',
  template: `
    <div class='bg-[#1e293b] text-[#f8fafc]'>
      <button class='bg-[#6366f1] hover:bg-[#4f46e5]'>Sign In</button>
    </div>
  `,
  styles: []
})
export class LoginCardComponent {}";

pub const OFF_PALETTE_COMPONENT: &str = r"import { Component } from '@angular/core';

@Component({
  selector: 'app-login-card',
  template: `<div style='color: #ff0000'>Login</div>`,
  styles: []
})
export class LoginCardComponent {}";

pub const UNBALANCED_COMPONENT: &str = r"import { Component } from '@angular/core';

@Component({
  selector: 'app-broken',
  template: `<div>broken</div>`,
  styles: []
})
export class BrokenComponent {
  render() {";

/// Marker present only in correction prompts.
pub const CORRECTION_MARKER: &str = "PREVIOUS ATTEMPT HAD VALIDATION ERRORS";

pub fn tokens() -> Arc<DesignSystem> {
    Arc::new(DesignSystem::from_json_str(TOKENS_JSON).expect("valid tokens"))
}

pub fn message_body(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_test",
        "content": [{"type": "text", "text": text}],
        "model": "claude-test",
        "usage": {"input_tokens": 100, "output_tokens": 200},
        "stop_reason": "end_turn"
    })
}

/// Configuration pointing at `server`.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::with_api_key(SecretString::new("test-api-key"));
    config.base_url = server.uri();
    config.model = "claude-test".to_string();
    config.request_timeout_ms = 5_000;
    config
}

/// Controller wired the way the binary wires it.
pub fn controller_for(config: &Config) -> RetryController<AnthropicClient> {
    let client = AnthropicClient::new(config.api_key.clone(), config.client_config())
        .expect("client builds");
    RetryController::new(
        client,
        Arc::new(Validator::from_config(config)),
        tokens(),
        config.controller_config(),
    )
}

/// Answer every first-attempt prompt with `text`.
pub async fn mount_initial(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_body(text)))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Answer correction prompts with `text`.
pub async fn mount_correction(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_string_contains(CORRECTION_MARKER))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_body(text)))
        .with_priority(1)
        .mount(server)
        .await;
}

/// Prompts the server received, in order.
pub async fn received_prompts(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["messages"][0]["content"]
                .as_str()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}
