//! Test harness: a router over a temp-dir database and upload directory

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use helpdesk_server::services::identities;
use helpdesk_server::{AppState, Config, create_router};

pub const BOUNDARY: &str = "helpdesk-test-boundary";
pub const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn code(&self) -> u64 {
        self.body["code"].as_u64().unwrap_or(u64::MAX)
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// `name=value` of the session cookie set by this response
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("helpdesk_session="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(tweak: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config {
            database_path: dir.path().join("tickets.db").to_string_lossy().into_owned(),
            upload_dir: dir.path().join("uploads"),
            ..Config::default()
        };
        tweak(&mut config);

        let state = AppState::new(&config).await.unwrap();
        identities::ensure_bootstrap_superuser(&state).await.unwrap();
        let app = create_router(state.clone());

        Self { app, state, dir }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, image)))
            .unwrap();
        self.send(request).await
    }

    /// Log in and return the `Cookie` header value
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .post_json(
                "/api/auth/login",
                None,
                serde_json::json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.session_cookie().unwrap()
    }

    pub async fn login_admin(&self) -> String {
        self.login("admin", "admin123").await
    }

    /// Submit a vehicle ticket for Marco Ferrari and return its id
    pub async fn submit_vehicle(&self, description: &str) -> i64 {
        let response = self
            .post_multipart(
                "/api/tickets/vehicle",
                &[
                    ("requester_name", "Marco Ferrari"),
                    ("vehicle_type", "Forklift"),
                    ("vehicle_number", "FL-07"),
                    ("anomaly_category", "Spie/Allarmi"),
                    ("description", description),
                ],
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.data()["id"].as_i64().unwrap()
    }

    pub async fn submit_technical(&self, title: &str, priority: Option<&str>) -> i64 {
        let mut fields = vec![
            ("requester_name", "Anna Bianchi"),
            ("title", title),
            ("department", "Logistics"),
            ("description", "Needs a look"),
        ];
        if let Some(priority) = priority {
            fields.push(("priority", priority));
        }
        let response = self
            .post_multipart("/api/tickets/technical", &fields, None)
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.data()["id"].as_i64().unwrap()
    }

    pub async fn ticket_action(&self, cookie: &str, id: i64, action: Value) -> TestResponse {
        self.post_json(&format!("/api/admin/tickets/{id}"), Some(cookie), action)
            .await
    }
}

pub fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn png_bytes() -> Vec<u8> {
    let mut data = PNG_MAGIC.to_vec();
    data.extend_from_slice(&[0u8; 64]);
    data
}
