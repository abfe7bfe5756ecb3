//! HTTP routes exercised through the router without a socket.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rosistat_core::store::SimStore;
use rosistat_server::{router, AppState, ServerConfig};
use serde_json::{json, Value};
use std::{path::Path, sync::Arc};
use tower::ServiceExt;

fn app_with(config: ServerConfig) -> Router {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../database");
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate(&root.join("migrations")).expect("migrations");
    store.apply_seeds(&root.join("seed")).expect("seeds");
    let state = Arc::new(AppState::new(store, "test"));
    state.mark_ready();
    router(state, &config)
}

fn app() -> Router {
    app_with(ServerConfig::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    post_raw(app, uri, body.to_string()).await
}

async fn post_raw(app: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

fn simulation_body(user_id: &str, results: Value) -> Value {
    json!({
        "userId": user_id,
        "strategy": "standard_martingale",
        "startingInvestment": 10000,
        "finalEarnings": 60,
        "finalPortfolio": 10060,
        "totalSpins": 3,
        "settings": { "standardMartingaleBaseBet": 10 },
        "results": results,
    })
}

#[tokio::test]
async fn banner_and_health() {
    let app = app();
    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "service": "rosistat-backend", "status": "ok" }));

    let (status, body) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "env": "test", "dbReady": true }));
}

#[tokio::test]
async fn post_then_fetch_with_ten_spins() {
    let app = app();
    let results: Vec<Value> = (1..=10)
        .map(|n| {
            json!({
                "spin": n,
                "drawnNumber": n + 10,
                "spinNetResult": 10,
                "cumulativeEarnings": 10 * n,
                "strategyType": "standard_martingale",
            })
        })
        .collect();
    let mut body = simulation_body("alice", json!(results));
    body["totalSpins"] = json!(10);

    let (status, created) = post(&app, "/api/simulations", &body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["ok"], true);
    let id = created["id"].as_i64().expect("numeric id");

    let (status, fetched) = get(&app, &format!("/api/simulations/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["simulation"]["id"], id);
    assert_eq!(fetched["simulation"]["userId"], "alice");
    assert_eq!(fetched["simulation"]["totalSpins"], 10);
    assert_eq!(fetched["simulation"]["settings"]["standardMartingaleBaseBet"], 10);

    let spins = fetched["spins"].as_array().expect("spins array");
    assert_eq!(spins.len(), 10);
    for (i, spin) in spins.iter().enumerate() {
        let n = i as i64 + 1;
        assert_eq!(spin["spinNumber"], n);
        assert_eq!(spin["drawnNumber"], n + 10);
        assert_eq!(spin["raw"]["strategyType"], "standard_martingale");
    }
}

#[tokio::test]
async fn stats_over_posted_spins() {
    let app = app();
    let results = json!([
        { "spin": 1, "drawnNumber": 2, "spinNetResult": 50, "cumulativeEarnings": 50 },
        { "spin": 2, "drawnNumber": 3, "spinNetResult": -20, "cumulativeEarnings": 30 },
        { "spin": 3, "drawnNumber": 4, "spinNetResult": 30, "cumulativeEarnings": 60 },
    ]);
    let (_, created) = post(&app, "/api/simulations", &simulation_body("bob", results)).await;
    let id = created["id"].as_i64().unwrap();

    let (status, stats) = get(&app, &format!("/api/simulations/{id}/spins/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalSpins"], 3);
    assert_eq!(stats["firstSpin"], 1);
    assert_eq!(stats["lastSpin"], 3);
    assert_eq!(stats["minEarnings"], 30.0);
    assert_eq!(stats["maxEarnings"], 60.0);
    assert_eq!(stats["avgNetResult"], 20.0);
}

#[tokio::test]
async fn results_without_spin_numbers_use_their_position() {
    let app = app();
    let results = json!([{ "spinNetResult": 10 }, { "drawnNumber": 5 }]);
    let (_, created) = post(&app, "/api/simulations", &simulation_body("carol", results)).await;
    let id = created["id"].as_i64().unwrap();

    let (_, spins) = get(&app, &format!("/api/simulations/{id}/spins")).await;
    let spins = spins.as_array().unwrap();
    assert_eq!(spins.len(), 2);
    assert_eq!(spins[0]["spinNumber"], 1);
    assert_eq!(spins[0]["drawnNumber"], 0);
    assert_eq!(spins[1]["spinNumber"], 2);
    assert_eq!(spins[1]["drawnNumber"], 5);
    assert_eq!(spins[1]["cumulativeEarnings"], 0.0);
}

#[tokio::test]
async fn spins_paginate() {
    let app = app();
    let results: Vec<Value> = (1..=8).map(|n| json!({ "spin": n })).collect();
    let (_, created) = post(&app, "/api/simulations", &simulation_body("dave", json!(results))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, page) = get(&app, &format!("/api/simulations/{id}/spins?limit=3&offset=2")).await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<i64> = page
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["spinNumber"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![3, 4, 5]);

    let (_, all) = get(&app, &format!("/api/simulations/{id}/spins?limit=abc")).await;
    assert_eq!(all.as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn simulations_filter_by_user() {
    let app = app();
    post(&app, "/api/simulations", &simulation_body("erin", json!([]))).await;
    post(&app, "/api/simulations", &simulation_body("frank", json!([]))).await;
    post(&app, "/api/simulations", &simulation_body("erin", json!([]))).await;

    let (status, erin) = get(&app, "/api/simulations?userId=erin").await;
    assert_eq!(status, StatusCode::OK);
    let erin = erin.as_array().unwrap();
    assert_eq!(erin.len(), 2);
    assert!(erin[0]["id"].as_i64() > erin[1]["id"].as_i64());

    let (_, all) = get(&app, "/api/simulations").await;
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn missing_things_are_404() {
    let app = app();
    let (status, body) = get(&app, "/api/simulations/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));

    let (status, _) = get(&app, "/api/simulations/not-a-number").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/api/nothing/here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));

    let (status, body) = get(&app, "/api/users/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "User not found" }));
}

#[tokio::test]
async fn seeded_user_is_served() {
    let app = app();
    let (status, user) = get(&app, "/api/users/demo-user").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["uid"], "demo-user");
    assert_eq!(user["displayName"], "Demo Player");
}

#[tokio::test]
async fn stats_for_unknown_simulation_are_empty() {
    let app = app();
    let (status, stats) = get(&app, "/api/simulations/31337/spins/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalSpins"], 0);
    assert_eq!(stats["avgNetResult"], Value::Null);
}

#[tokio::test]
async fn bad_bodies_are_server_errors() {
    let app = app();
    let (status, body) = post(&app, "/api/simulations", &json!({ "userId": "x" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (status, _) = post_raw(&app, "/api/simulations", "{not json".into()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // drawnNumber outside the wheel fails the spin insert.
    let results = json!([{ "spin": 1, "drawnNumber": 99 }]);
    let (status, body) = post(&app, "/api/simulations", &simulation_body("gina", results)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("CHECK"));

    // The simulation row goes with its rejected spins.
    let (status, listed) = get(&app, "/api/simulations?userId=gina").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = ServerConfig { json_limit: 64, ..ServerConfig::default() };
    let app = app_with(config);
    let results: Vec<Value> = (1..=50).map(|n| json!({ "spin": n })).collect();
    let (status, _) = post(&app, "/api/simulations", &simulation_body("hank", json!(results))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
