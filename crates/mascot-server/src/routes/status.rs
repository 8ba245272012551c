use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

// Liveness probe; says nothing about upstream provider reachability
async fn status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn routes() -> Router {
    Router::new().route("/status", get(status))
}
