#![allow(dead_code)] // Not every test binary uses every helper

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        Method, Request, StatusCode,
    },
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use clinic::session::SESSION_COOKIE;

use super::{
    assertions::ApiResponse,
    setup::{Account, TestSetup},
};

// ============================================================================
// Action Helpers
// ============================================================================

/// How a request authenticates
#[derive(Clone, Copy)]
pub enum Auth<'a> {
    Anonymous,
    Cookie(&'a str),
    Bearer(&'a str),
}

impl TestSetup {
    /// Send one request through the full router
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Auth<'_>,
        body: Option<Value>,
    ) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        builder = match auth {
            Auth::Anonymous => builder,
            Auth::Cookie(token) => builder.header(COOKIE, format!("{}={}", SESSION_COOKIE, token)),
            Auth::Bearer(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
        };

        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        ApiResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> ApiResponse {
        self.send(Method::GET, uri, Auth::Cookie(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> ApiResponse {
        self.send(Method::POST, uri, Auth::Cookie(token), Some(body))
            .await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> ApiResponse {
        self.send(Method::PATCH, uri, Auth::Cookie(token), Some(body))
            .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> ApiResponse {
        self.send(Method::DELETE, uri, Auth::Cookie(token), None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResponse {
        self.send(
            Method::POST,
            "/api/auth/login",
            Auth::Anonymous,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Log in and return the session token
    pub async fn token_for(&self, account: &Account) -> String {
        self.login(&account.email, &account.password)
            .await
            .assert_status(StatusCode::OK)
            .session_token()
            .unwrap()
    }

    pub async fn register(&self, body: Value) -> ApiResponse {
        self.send(Method::POST, "/api/auth/register", Auth::Anonymous, Some(body))
            .await
    }

    /// Register a patient through the public endpoint and log them in
    pub async fn register_patient(&self, email: &str, name: &str) -> (Account, String) {
        let response = self
            .register(json!({
                "email": email,
                "password": "secret1",
                "name": name,
                "role": "patient"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let account = Account {
            id: response.id(),
            email: email.to_string(),
            password: "secret1".to_string(),
        };
        let token = self.token_for(&account).await;
        (account, token)
    }

    /// Book an appointment with the setup's doctor
    pub async fn book_appointment(&self, token: &str, patient_id: &str) -> ApiResponse {
        self.post(
            "/api/appointments",
            token,
            json!({
                "patientId": patient_id,
                "doctorId": self.doctor.id,
                "specialtyId": self.specialty.id,
                "appointmentDate": "2030-05-01T09:30:00Z",
                "notes": "Recurring headaches"
            }),
        )
        .await
    }
}
