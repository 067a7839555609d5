mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Engine, MAX_PAGE_SIZE, Scan, Service};

use std::{fs, path::Path};

use regex::Regex;

const KEEP_ALIVE_PATTERN: &str = r"^[1-9][0-9]*(d|h|m|s|ms|micros|nanos)$";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.engine.url.is_empty() {
		return Err(Error::Validation { message: "engine.url must be non-empty.".to_string() });
	}
	if !cfg.engine.url.starts_with("http://") && !cfg.engine.url.starts_with("https://") {
		return Err(Error::Validation {
			message: "engine.url must start with http:// or https://.".to_string(),
		});
	}
	if let Some(timeout_ms) = cfg.engine.timeout_ms
		&& timeout_ms == 0
	{
		return Err(Error::Validation {
			message: "engine.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.scan.page_size == 0 {
		return Err(Error::Validation {
			message: "scan.page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.scan.page_size > MAX_PAGE_SIZE {
		return Err(Error::Validation {
			message: format!("scan.page_size must be {MAX_PAGE_SIZE} or less."),
		});
	}

	let keep_alive = Regex::new(KEEP_ALIVE_PATTERN).map_err(|err| Error::Validation {
		message: format!("Failed to compile keep-alive pattern: {err}."),
	})?;

	if !keep_alive.is_match(&cfg.scan.keep_alive) {
		return Err(Error::Validation {
			message: "scan.keep_alive must be a positive duration such as 2m or 90s.".to_string(),
		});
	}
	if cfg.scan.timestamp_field.is_empty() {
		return Err(Error::Validation {
			message: "scan.timestamp_field must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
	cfg.engine.url = cfg.engine.url.trim().trim_end_matches('/').to_string();
	cfg.scan.keep_alive = cfg.scan.keep_alive.trim().to_string();
	cfg.scan.timestamp_field = cfg.scan.timestamp_field.trim().to_string();
}
