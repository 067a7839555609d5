use serde::Deserialize;

/// Largest page the engine serves from a single scroll request without raising
/// `index.max_result_window`.
pub const MAX_PAGE_SIZE: u32 = 10_000;

#[derive(Debug, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	pub engine: Engine,
	#[serde(default)]
	pub scan: Scan,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Engine {
	pub url: String,
	/// Optional. Per-request HTTP timeout; requests are otherwise bounded only by the scroll
	/// keep-alive on the engine side.
	pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Scan {
	pub page_size: u32,
	/// Engine time unit string, e.g. "2m" or "90s".
	pub keep_alive: String,
	pub timestamp_field: String,
}
impl Default for Scan {
	fn default() -> Self {
		Self {
			page_size: MAX_PAGE_SIZE,
			keep_alive: "2m".to_string(),
			timestamp_field: "@timestamp".to_string(),
		}
	}
}
