#![allow(dead_code)]

use konvite::{
    api::router::create_router,
    state::AppState,
    config::Config,
    domain::models::notification::{Channel, OutboundMessage},
    domain::ports::NotificationGateway,
    infra::factory::{assemble_state, Repositories},
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use parking_lot::Mutex;
use tower::ServiceExt;
use serde_json::{json, Value};

/// Records every outbound message. Channels listed in `failing` return an error.
#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<OutboundMessage>>,
    pub failing: Mutex<Vec<Channel>>,
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send(&self, message: &OutboundMessage) -> Result<String, AppError> {
        if self.failing.lock().contains(&message.channel) {
            return Err(AppError::InternalWithMsg("gateway unavailable".into()));
        }
        let mut sent = self.sent.lock();
        sent.push(message.clone());
        Ok(format!("msg-{}", sent.len()))
    }
}

pub struct AuthHeaders {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub csrf_token: String,
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub gateway: Arc<RecordingGateway>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            public_base_url: "https://konvite.test".to_string(),
            notify_service_url: "http://localhost".to_string(),
            notify_service_token: "token".to_string(),
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            stats_cache_ttl: Duration::from_secs(300),
            worker_poll_interval: Duration::from_secs(1),
        };

        let gateway = Arc::new(RecordingGateway::default());
        let state = assemble_state(&config, Repositories::sqlite(pool.clone()), gateway.clone())
            .expect("Failed to assemble state");
        let state = Arc::new(state);

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            gateway,
        }
    }

    pub async fn signup(&self, email: &str, display_name: &str) -> AuthHeaders {
        let payload = json!({ "email": email, "password": "correct-horse", "display_name": display_name });
        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/signup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if response.status() != StatusCode::CREATED {
            panic!("Signup failed in test helper: status {}", response.status());
        }
        auth_from_response(response).await
    }

    /// Sends a JSON request. Auth adds the session cookie and the CSRF header.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        auth: Option<&AuthHeaders>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request_as_client(method, uri, auth, None, body).await
    }

    pub async fn request_as_client(
        &self,
        method: &str,
        uri: &str,
        auth: Option<&AuthHeaders>,
        client_id: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .header("X-CSRF-Token", &auth.csrf_token);
        }
        if let Some(client_id) = client_id {
            builder = builder.header("X-Client-Id", client_id);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    /// Runs the wizard end to end and returns the finalized event.
    pub async fn create_event(&self, auth: &AuthHeaders, title: &str) -> Value {
        let client_id = format!("client-{}", Uuid::new_v4());
        let (status, draft) = self.request_as_client(
            "POST", "/api/v1/wizard/drafts", Some(auth), Some(&client_id),
            Some(json!({ "draft_token": Uuid::new_v4().to_string() })),
        ).await;
        assert_eq!(status, StatusCode::OK, "begin draft failed: {}", draft);

        let (status, body) = self.request_as_client(
            "POST", "/api/v1/wizard/finalize", Some(auth), Some(&client_id),
            Some(json!({ "data": wizard_data(title, 30) })),
        ).await;
        assert_eq!(status, StatusCode::OK, "finalize failed: {}", body);
        body["event"].clone()
    }
}

/// Wizard payload for an event `days_ahead` days from today.
pub fn wizard_data(title: &str, days_ahead: i64) -> Value {
    let date = (chrono::Utc::now() + chrono::Duration::days(days_ahead)).date_naive();
    json!({
        "eventType": "birthday",
        "basicDetails": {
            "title": title,
            "description": "Cake and music",
            "date": date.to_string(),
            "startTime": "19:00",
            "location": "Rua Augusta 100",
            "maxCapacity": 40
        }
    })
}

pub async fn auth_from_response(response: axum::response::Response) -> AuthHeaders {
    let cookies: Vec<String> = response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|h| h.to_str().unwrap().to_string())
        .collect();

    let access_token = cookie_value(&cookies, "access_token").expect("No access_token cookie returned");
    let refresh_token = cookie_value(&cookies, "refresh_token").expect("No refresh_token cookie returned");

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body_json: Value = serde_json::from_slice(&body_bytes).unwrap();
    let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();
    let user_id = body_json["user"]["id"].as_str().expect("No user id in body").to_string();

    AuthHeaders { user_id, access_token, refresh_token, csrf_token }
}

fn cookie_value(cookies: &[String], name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    cookies.iter()
        .find(|c| c.starts_with(&prefix))
        .map(|c| c[prefix.len()..].split(';').next().unwrap_or_default().to_string())
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
