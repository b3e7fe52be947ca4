//! Shared helpers: spawn the app on an ephemeral port with an in-memory
//! store and a manual clock.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::Value;

use petpond_gateway::app_state::AppState;
use petpond_gateway::build_app;
use petpond_gateway::config::PondConfig;
use petpond_gateway::domain::ManualClock;
use petpond_gateway::persistence::InMemoryStore;

pub struct TestServer {
    pub base: String,
    pub ws_url: String,
    pub clock: Arc<ManualClock>,
    pub client: reqwest::Client,
}

pub async fn spawn() -> TestServer {
    let Some(start) = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).single() else {
        panic!("bad start instant");
    };
    let clock = Arc::new(ManualClock::new(start));
    let clock_handle = Arc::clone(&clock);
    let state = AppState::new(
        &PondConfig::default(),
        Arc::new(InMemoryStore::new()),
        clock_handle,
    );
    let app = build_app(state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestServer {
        base: format!("http://{addr}"),
        ws_url: format!("ws://{addr}/ws"),
        clock,
        client: reqwest::Client::new(),
    }
}

impl TestServer {
    pub async fn get(&self, path: &str) -> (u16, Value) {
        let Ok(resp) = self.client.get(format!("{}{path}", self.base)).send().await else {
            panic!("GET {path} failed");
        };
        read(resp).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> (u16, Value) {
        let Ok(resp) = self
            .client
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
        else {
            panic!("POST {path} failed");
        };
        read(resp).await
    }

    pub async fn delete(&self, path: &str) -> u16 {
        let Ok(resp) = self.client.delete(format!("{}{path}", self.base)).send().await else {
            panic!("DELETE {path} failed");
        };
        resp.status().as_u16()
    }

    /// Creates a profile and returns its id as a string.
    pub async fn profile(&self, username: &str, balance: i64) -> String {
        let (status, body) = self
            .post(
                "/api/v1/profiles",
                &serde_json::json!({"username": username, "starting_balance": balance}),
            )
            .await;
        assert_eq!(status, 201, "profile {username}: {body}");
        id_of(&body)
    }

    /// Adopts a pet and returns its id as a string.
    pub async fn adopt(&self, owner: &str, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/pets",
                &serde_json::json!({"owner_id": owner, "name": name}),
            )
            .await;
        assert_eq!(status, 201, "adopt {name}: {body}");
        id_of(&body)
    }
}

pub fn id_of(body: &Value) -> String {
    let Some(id) = body.get("id").and_then(Value::as_str) else {
        panic!("no id in {body}");
    };
    id.to_string()
}

async fn read(resp: reqwest::Response) -> (u16, Value) {
    let status = resp.status().as_u16();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}
