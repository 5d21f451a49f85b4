#![allow(dead_code)]

use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use estately::auth::password;
use estately::config::Config;
use estately::models::Role;

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";
pub const PASSWORD: &str = "123456";

pub fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        log_level: "warn".to_string(),
        access_token_minutes: 60,
        refresh_token_days: 30,
        max_body_size: 1_048_576,
        cors_origins: vec![],
        admin_seed: None,
    }
}

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> (Value, StatusCode) {
        self.post("/v1/register", None, &json!({ "email": email, "password": password, "name": name }))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post("/v1/login", None, &json!({ "email": email, "password": password }))
            .await
    }

    /// Insert a user straight into the database and log them in.
    /// Returns (user id, access token).
    pub async fn seed_user(&self, email: &str, name: &str, role: Role) -> (String, String) {
        let hash = password::hash(PASSWORD).unwrap();
        let user = estately::db::users::create(&self.pool, email, &hash, name, role)
            .await
            .expect("seed user failed");
        let (body, status) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login for seeded user failed: {body}");
        (
            user.id.to_string(),
            body["token"]["accessToken"].as_str().unwrap().to_string(),
        )
    }

    /// Create an apartment through the API, return the apartment JSON.
    pub async fn create_apartment(&self, token: &str, name: &str, price: f64, size: f64, rooms: i64) -> Value {
        let (body, status) = self
            .post(
                "/v1/apartments",
                Some(token),
                &json!({
                    "name": name,
                    "description": format!("{name} description"),
                    "size": size,
                    "price": price,
                    "rooms": rooms,
                    "location": { "lat": 35.358243, "lng": -119.1207586 },
                    "address": "10300-10498 Hinderhill Dr, Bakersfield, CA 93312, USA",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create apartment failed: {body}");
        body
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (Value, StatusCode) {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.expect("get request failed")).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> (Value, StatusCode) {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.expect("post request failed")).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let req = self.client.patch(self.url(path)).bearer_auth(token).json(body);
        read(req.send().await.expect("patch request failed")).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let req = self.client.delete(self.url(path)).bearer_auth(token);
        read(req.send().await.expect("delete request failed")).await
    }
}

async fn read(resp: reqwest::Response) -> (Value, StatusCode) {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(json!(null));
    (body, status)
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("estately_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let app = estately::build_app(pool.clone(), test_config(&test_url));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        client: Client::new(),
        db_name,
    }
}

/// Drop the test database after the test completes.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
