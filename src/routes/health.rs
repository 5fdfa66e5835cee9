//! Service readiness endpoint.
//!
//! Deployments probe this before pushing a catalog feed; it confirms the
//! server is accepting requests without touching the database or the
//! listing cache.

use rocket::serde::json::Json;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

/// Readiness payload for the catalog service.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// Fixed `"ok"` once the server is up.
    pub status: String,
    /// Name of the service answering the probe.
    pub service: String,
}

/// Report that the catalog server is ready to accept feeds and listing reads.
#[openapi(tag = "Health")]
#[get("/health")]
pub fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "catalog-server".to_string(),
    })
}
