pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<crop_storage::Error> for Error {
	fn from(err: crop_storage::Error) -> Self {
		match err {
			crop_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			crop_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
