pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Query rejected by engine: {reason}")]
	Query { reason: String },
	#[error("Engine error: {message}")]
	Engine { message: String },
	#[error("Failed to decode document: {message}")]
	Decode { message: String },
}
impl From<trawl_engine::Error> for Error {
	fn from(err: trawl_engine::Error) -> Self {
		Self::Engine { message: err.to_string() }
	}
}
