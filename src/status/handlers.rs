use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::evaluator::{AlertView, StatusHandle, StatusSnapshot};

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    /// True when the last fetch failed.
    pub stale: bool,
}

#[derive(Serialize)]
pub struct AlertDetail {
    pub name: String,
    #[serde(flatten)]
    pub view: AlertView,
    pub stale: bool,
}

pub async fn get_health(State(status): State<StatusHandle>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        stale: status.load().stale,
    })
}

pub async fn get_status(State(status): State<StatusHandle>) -> Json<StatusSnapshot> {
    Json(status.load().as_ref().clone())
}

pub async fn get_alert(
    State(status): State<StatusHandle>,
    Path(name): Path<String>,
) -> Result<Json<AlertDetail>, (StatusCode, Json<serde_json::Value>)> {
    let snapshot = status.load();
    match snapshot.alerts.get(&name) {
        Some(view) => Ok(Json(AlertDetail {
            name,
            view: view.clone(),
            stale: snapshot.stale,
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("unknown alert {}", name) })),
        )),
    }
}
