//! Heartbeat endpoint handler.
//!
//! Returns server status: uptime, memory, loaded data and cache counters.

use axum::{extract::State, Json};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::CacheStats;
use crate::schema::RegionType;
use crate::state::AppState;

/// Unique per server process
static SERVER_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Heartbeat response structure
#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub server_id: String,
    /// Current timestamp (RFC 3339)
    pub timestamp: String,
    pub uptime_seconds: u64,
    /// Resident memory of this process, where the platform reports it
    pub memory_usage_bytes: Option<u64>,
    pub dataset: DatasetInfo,
    pub layer_cache: CacheStats,
    pub image_cache: CacheStats,
    pub status: String,
}

/// What was loaded at startup
#[derive(Debug, Serialize)]
pub struct DatasetInfo {
    pub region_type: RegionType,
    pub area_count: usize,
    pub value_rows: usize,
    pub columns: Vec<String>,
}

/// Handle GET /heartbeat requests
pub async fn heartbeat_handler(State(state): State<Arc<AppState>>) -> Json<HeartbeatResponse> {
    Json(heartbeat(&state))
}

fn heartbeat(state: &AppState) -> HeartbeatResponse {
    let timestamp =
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    HeartbeatResponse {
        server_id: SERVER_ID.clone(),
        timestamp,
        uptime_seconds: state.started.elapsed().as_secs(),
        memory_usage_bytes: get_memory_usage(),
        dataset: DatasetInfo {
            region_type: state.boundaries.region_type,
            area_count: state.boundaries.len(),
            value_rows: state.values.len(),
            columns: state.values.columns.keys().cloned().collect(),
        },
        layer_cache: state.layer_cache.stats(),
        image_cache: state.image_cache.stats(),
        status: "healthy".to_string(),
    }
}

/// Resident set size from `/proc/self/statm`
fn get_memory_usage() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(pages * 4096)
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
