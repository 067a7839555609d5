use std::{
	io::{self, Write},
	path::PathBuf,
};

use clap::Parser;
use color_eyre::eyre;
use serde_json::Value;
use time::{
	Date, OffsetDateTime, Time,
	format_description::well_known::Rfc3339,
	macros::format_description,
};
use tracing_subscriber::EnvFilter;

use trawl_domain::{LowerBound, TermsFilter};
use trawl_service::{Completion, ScanRequest, TrawlService};

#[derive(Debug, Parser)]
#[command(
	version = trawl_cli::VERSION,
	rename_all = "kebab",
	styles = trawl_cli::styles(),
	about = "Scan every monthly index of a document type and print the matches as JSON lines."
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Document type; indices are named `<type>_<year>.<month>`.
	#[arg(long = "type", short = 't', value_name = "TYPE")]
	pub doc_type: String,
	/// Inclusive start, RFC 3339 or YYYY-MM-DD (UTC midnight).
	#[arg(long, value_name = "TIME", value_parser = parse_instant)]
	pub start: OffsetDateTime,
	/// Exclusive end, RFC 3339 or YYYY-MM-DD (UTC midnight).
	#[arg(long, value_name = "TIME", value_parser = parse_instant)]
	pub end: OffsetDateTime,
	/// Restrict FIELD to the listed values. Repeatable.
	#[arg(long = "term", value_name = "FIELD=V1,V2", value_parser = parse_terms)]
	pub terms: Vec<TermsFilter>,
	/// Keep documents whose FIELD is at least N.
	#[arg(long, value_name = "FIELD=N", value_parser = parse_lower_bound)]
	pub lower_bound: Option<LowerBound>,
}
impl Args {
	pub fn scan_request(&self) -> ScanRequest {
		ScanRequest {
			terms: self.terms.clone(),
			lower_bound: self.lower_bound.clone(),
			..ScanRequest::new(self.doc_type.clone(), self.start, self.end)
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = trawl_config::load(&args.config)?;

	init_tracing(&config)?;

	let service = TrawlService::from_config(&config)?;
	let Some(result) = service.search_with::<Value>(&args.scan_request()).await? else {
		tracing::info!("Nothing to scan for the given type and time range.");

		return Ok(());
	};
	let mut stdout = io::stdout().lock();

	for document in &result.documents {
		writeln!(stdout, "{}", serde_json::to_string(document)?)?;
	}

	stdout.flush()?;

	if let Completion::Truncated { reason } = result.completion {
		return Err(eyre::eyre!(
			"Scan ended early after {} documents: {reason}",
			result.documents.len()
		));
	}

	Ok(())
}

fn init_tracing(config: &trawl_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

	Ok(())
}

fn parse_instant(raw: &str) -> Result<OffsetDateTime, String> {
	if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Ok(at);
	}

	let date = Date::parse(raw, format_description!("[year]-[month]-[day]"))
		.map_err(|err| format!("expected RFC 3339 or YYYY-MM-DD: {err}"))?;

	Ok(date.with_time(Time::MIDNIGHT).assume_utc())
}

fn parse_terms(raw: &str) -> Result<TermsFilter, String> {
	let (field, values) =
		raw.split_once('=').ok_or_else(|| "expected FIELD=V1,V2".to_string())?;
	let field = field.trim();

	if field.is_empty() {
		return Err("term field must be non-empty".to_string());
	}

	let values = values
		.split(',')
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.collect::<Vec<_>>();

	if values.is_empty() {
		return Err(format!("term {field} needs at least one value"));
	}

	Ok(TermsFilter::new(field, values))
}

fn parse_lower_bound(raw: &str) -> Result<LowerBound, String> {
	let (field, value) = raw.split_once('=').ok_or_else(|| "expected FIELD=N".to_string())?;
	let field = field.trim();

	if field.is_empty() {
		return Err("lower bound field must be non-empty".to_string());
	}

	let gte = value
		.trim()
		.parse::<f64>()
		.map_err(|err| format!("lower bound on {field} must be a number: {err}"))?;

	if !gte.is_finite() {
		return Err(format!("lower bound on {field} must be finite"));
	}

	Ok(LowerBound::new(field, gte))
}
