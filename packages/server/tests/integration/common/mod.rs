use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::common::StorageConfig;
use ::common::storage::filesystem::FilesystemMediaStore;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use tempfile::TempDir;

use arena_server::config::{AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig};
use arena_server::state::AppState;

/// Image size cap used by the test server.
pub const MAX_IMAGE_SIZE: u64 = 64 * 1024;

pub mod routes {
    pub const VENUES: &str = "/venues";
    pub const ACTIVITIES: &str = "/activities";
    pub const REGISTER: &str = "/api/register";
    pub const LOGIN: &str = "/api/login";
    pub const ME: &str = "/api/me";
    pub const USERS: &str = "/api/users";

    pub fn venue(id: i64) -> String {
        format!("/venues/{id}")
    }

    pub fn activity(id: i64) -> String {
        format!("/activities/{id}")
    }

    pub fn user(id: i64) -> String {
        format!("/api/users/{id}")
    }
}

/// A running test server backed by its own SQLite file and media root.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub public_root: PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// A multipart image part.
pub struct TestImage {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl TestImage {
    pub fn png() -> Self {
        Self {
            file_name: "photo.png",
            mime: "image/png",
            bytes: b"\x89PNG\r\n\x1a\nnot really a png".to_vec(),
        }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let public_root = dir.path().join("public");

        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let mut opts = ConnectOptions::new(&db_url);
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts)
            .await
            .expect("Failed to connect to test database");
        arena_server::database::sync_schema(&db)
            .await
            .expect("Failed to create schema");

        let media = FilesystemMediaStore::new(public_root.clone(), MAX_IMAGE_SIZE)
            .await
            .expect("Failed to create media store");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
            },
            storage: StorageConfig {
                public_root: public_root.clone(),
                max_image_size: MAX_IMAGE_SIZE,
            },
        };

        let state = AppState {
            db: db.clone(),
            media: Arc::new(media),
            config: app_config,
        };

        let app = arena_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            public_root,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Whether a stored reference exists on disk.
    pub fn file_exists(&self, reference: &str) -> bool {
        self.public_root
            .join(reference.trim_start_matches('/'))
            .is_file()
    }

    /// Number of files stored for a media kind directory (`stades`, `activities`).
    pub fn stored_files(&self, dir: &str) -> usize {
        count_files(&self.public_root.join("uploads").join(dir))
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn put_json_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// POST a multipart form with text fields and an optional image part.
    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        image: Option<TestImage>,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form(fields, image))
            .send()
            .await
            .expect("Failed to send multipart POST request");

        TestResponse::from_response(res).await
    }

    /// PUT a multipart form with text fields and an optional image part.
    pub async fn put_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        image: Option<TestImage>,
    ) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .multipart(form(fields, image))
            .send()
            .await
            .expect("Failed to send multipart PUT request");

        TestResponse::from_response(res).await
    }

    /// Create a venue via the API and return its `id`.
    pub async fn create_venue(&self, name: &str, image: Option<TestImage>) -> i64 {
        let res = self
            .post_form(
                routes::VENUES,
                &[("name", name), ("city", "Casablanca"), ("capacity", "45000")],
                image,
            )
            .await;
        assert_eq!(res.status, 201, "create_venue failed: {}", res.text);
        res.id()
    }

    /// Create an activity via the API and return its `id`.
    pub async fn create_activity(&self, venue_id: i64, image: Option<TestImage>) -> i64 {
        let venue_id = venue_id.to_string();
        let res = self
            .post_form(
                routes::ACTIVITIES,
                &[
                    ("name", "Stadium tour"),
                    ("venue_id", &venue_id),
                    ("category", "tour"),
                    ("price", "50"),
                    ("address", "Bd Ghandi"),
                ],
                image,
            )
            .await;
        assert_eq!(res.status, 201, "create_activity failed: {}", res.text);
        res.id()
    }

    /// Register a user and log in, returning the auth token.
    pub async fn create_authenticated_user(&self, email: &str, role: &str) -> String {
        let reg = self
            .post_json(
                routes::REGISTER,
                &serde_json::json!({
                    "name": "Test User",
                    "email": email,
                    "password": "securepass",
                    "role": role,
                }),
            )
            .await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        let res = self
            .post_json(
                routes::LOGIN,
                &serde_json::json!({"email": email, "password": "securepass"}),
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["data"]["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    /// `data.id` of an enveloped response.
    pub fn id(&self) -> i64 {
        self.body["data"]["id"]
            .as_i64()
            .expect("response body should contain 'data.id'")
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

fn form(fields: &[(&str, &str)], image: Option<TestImage>) -> Form {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name.to_string(), value.to_string());
    }
    if let Some(image) = image {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(image.mime)
            .expect("Failed to set MIME type");
        form = form.part("image", part);
    }
    form
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(0)
}
