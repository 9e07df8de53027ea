use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::server::CallbackSlot;

pub async fn health(Extension(slot): Extension<CallbackSlot>) -> Json<Value> {
    let awaiting_callback = slot.lock().await.is_some();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "awaiting_callback": awaiting_callback
    }))
}
