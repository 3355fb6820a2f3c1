//! Test utilities and mock factories.
//!
//! This module provides shared testing infrastructure:
//! - Component fixtures (valid, broken syntax, off-palette, markdown leak)
//! - The reference design system used across validator tests
//! - Mock generation clients that replay scripted responses
//!
//! Only compiled for tests (`#[cfg(test)]`).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::GenerationError;
use crate::tokens::DesignSystem;
use crate::traits::MockGenerationClient;

pub const VALID_COMPONENT: &str = r#"import { Component } from '@angular/core';

@Component({
  selector: 'app-login-card',
  template: `
    <div class="bg-[#1e293b] rounded-[8px] p-8 text-[#f8fafc]">
      <h2 class="text-[#6366f1]">Login</h2>
      <button class="bg-[#6366f1] hover:bg-[#4f46e5]">Sign In</button>
    </div>
  `,
  styles: []
})
export class LoginCardComponent {
  onSubmit() {}
}"#;

pub const INVALID_SYNTAX_COMPONENT: &str = r#"import { Component } from '@angular/core';

@Component({
  selector: 'app-broken',
  template: `<div>broken</div>`,
  styles: []
})
export class BrokenComponent {
  // missing closing brace
"#;

pub const INVALID_TOKEN_COMPONENT: &str = r#"import { Component } from '@angular/core';

@Component({
  selector: 'app-bad-colors',
  template: `
    <div style="background: #ff0000; color: #123456">
      Bad colors
    </div>
  `,
  styles: []
})
export class BadColorsComponent {}"#;

pub const MARKDOWN_LEAKED_COMPONENT: &str = r#"Here is the component:
```typescript
import { Component } from '@angular/core';

@Component({
  selector: 'app-test',
  template: `<div>test</div>`,
  styles: []
})
export class TestComponent {}
```"#;

/// The reference design system.
#[must_use]
pub fn sample_tokens() -> DesignSystem {
    DesignSystem::default()
        .with_token("colors", "primary", "#6366f1")
        .with_token("colors", "primary-dark", "#4f46e5")
        .with_token("colors", "primary-light", "#a5b4fc")
        .with_token("colors", "background", "#0f172a")
        .with_token("colors", "surface", "#1e293b")
        .with_token("colors", "text-primary", "#f8fafc")
        .with_token("colors", "text-secondary", "#94a3b8")
        .with_token("colors", "error", "#ef4444")
        .with_token("effects", "glass-bg", "rgba(255, 255, 255, 0.08)")
        .with_token("effects", "shadow-glow", "0 0 20px rgba(99,102,241,0.4)")
        .with_tailwind_class("primary-button", "bg-[#6366f1] hover:bg-[#4f46e5]")
}

/// Shared view of the prompts a mock received, as `(system, prompt)`.
pub type PromptLog = Arc<Mutex<Vec<(String, String)>>>;

/// Create a mock client that replays `responses` in order and records every
/// prompt it is sent.
///
/// Panics (failing the test) if called more times than there are responses.
///
/// # Example
///
/// ```ignore
/// let (mock, prompts) = mock_generation_sequence(vec![Ok(VALID_COMPONENT.into())]);
/// ```
#[must_use]
pub fn mock_generation_sequence(
    responses: Vec<Result<String, GenerationError>>,
) -> (MockGenerationClient, PromptLog) {
    let calls = responses.len();
    let queue = Arc::new(Mutex::new(VecDeque::from(responses)));
    let log: PromptLog = Arc::default();
    let log_clone = Arc::clone(&log);

    let mut mock = MockGenerationClient::new();
    mock.expect_generate()
        .times(calls)
        .returning(move |system, prompt| {
            log_clone.lock().unwrap().push((system, prompt));
            queue
                .lock()
                .unwrap()
                .pop_front()
                .expect("mock called more often than scripted")
        });
    (mock, log)
}

/// Create a mock client that always answers with `response`.
#[must_use]
pub fn mock_generation_success(response: impl Into<String>) -> MockGenerationClient {
    let response = response.into();
    let mut mock = MockGenerationClient::new();
    mock.expect_generate()
        .returning(move |_system, _prompt| Ok(response.clone()));
    mock
}

/// Create a mock client that always fails with `error`.
#[must_use]
pub fn mock_generation_error(error: GenerationError) -> MockGenerationClient {
    let mut mock = MockGenerationClient::new();
    mock.expect_generate()
        .returning(move |_system, _prompt| Err(error.clone()));
    mock
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::GenerationClient;

    #[tokio::test]
    async fn test_mock_generation_sequence_replays_in_order() {
        let (mock, log) = mock_generation_sequence(vec![
            Ok("first".to_string()),
            Err(GenerationError::EmptyResponse),
        ]);

        assert_eq!(mock.generate("s".into(), "p1".into()).await.unwrap(), "first");
        assert!(mock.generate("s".into(), "p2".into()).await.is_err());

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].1, "p2");
    }

    #[test]
    fn test_mock_generation_success() {
        let mock = mock_generation_success("code");
        let first = tokio_test::block_on(mock.generate(String::new(), String::new()));
        let second = tokio_test::block_on(mock.generate(String::new(), String::new()));
        assert_eq!(first.unwrap(), "code");
        assert_eq!(second.unwrap(), "code");
    }

    #[tokio::test]
    async fn test_mock_generation_error() {
        let mock = mock_generation_error(GenerationError::AuthenticationFailed);
        let result = mock.generate(String::new(), String::new()).await;
        assert!(matches!(result, Err(GenerationError::AuthenticationFailed)));
    }

    #[test]
    fn test_sample_tokens_shape() {
        let tokens = sample_tokens();
        assert_eq!(tokens.len(), 10);
        assert_eq!(tokens.lookup("colors.primary"), Some("#6366f1"));
    }
}
