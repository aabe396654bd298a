//! Test assertion helpers - fluent API for verifying responses
#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::http::{header::SET_COOKIE, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use clinic::session::SESSION_COOKIE;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl ApiResponse {
    /// Assert the status code, printing the body on mismatch
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status, expected,
            "unexpected status, body: {}",
            self.body
        );
        self
    }

    /// Assert the `{message}` error body
    pub fn assert_message(self, expected: &str) -> Self {
        assert_eq!(self.body["message"], expected);
        self
    }

    pub fn parse<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.body.clone()).unwrap()
    }

    pub fn id(&self) -> String {
        self.body["id"].as_str().unwrap().to_string()
    }

    /// The session token from `Set-Cookie`, if one was issued
    pub fn session_token(&self) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|cookie| cookie.split(';').next())
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
            .map(|(_, value)| value.to_string())
    }

    /// Assert no field anywhere in the body carries password material
    pub fn assert_no_password(self, plain_text: &str) -> Self {
        let text = self.body.to_string();
        assert!(!text.contains("password"), "body exposes a password field: {}", text);
        assert!(!text.contains("$2b$"), "body exposes a bcrypt hash: {}", text);
        assert!(!text.contains(plain_text), "body exposes the password: {}", text);
        self
    }
}
