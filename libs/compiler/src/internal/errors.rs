use std::fmt::Display;

use thiserror::Error as ThisError;

/// Canonical error type used by the Rust-facing API surface.
///
/// Only failures that abort a whole invocation live here. Import and compilation problems are
/// reported as diagnostics inside the compilation result instead.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
  /// The request is malformed and no compilation was attempted.
  #[error("Invalid compilation request: {0}")]
  InvalidRequest(String),
  #[error("{0}")]
  Config(String),
  #[error("{0}")]
  Solc(String),
  #[error("{0}")]
  Io(String),
}

impl Error {
  pub fn invalid_request(message: impl Into<String>) -> Self {
    Error::InvalidRequest(message.into())
  }

  pub fn config(context: impl AsRef<str>, cause: impl Display) -> Self {
    Error::Config(with_context(context, cause))
  }

  pub fn solc(context: impl AsRef<str>, cause: impl Display) -> Self {
    Error::Solc(with_context(context, cause))
  }

  pub fn io(context: impl AsRef<str>, cause: impl Display) -> Self {
    Error::Io(with_context(context, cause))
  }

  pub fn is_invalid_request(&self) -> bool {
    matches!(self, Error::InvalidRequest(_))
  }
}

/// Result alias bound to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

fn with_context(context: impl AsRef<str>, cause: impl Display) -> String {
  let mut message = context.as_ref().to_owned();
  if !message.ends_with(':') {
    message.push(':');
  }
  message.push(' ');
  message.push_str(&cause.to_string());
  message
}

#[cfg(feature = "napi")]
impl From<Error> for napi::Error {
  fn from(err: Error) -> Self {
    napi::Error::new(napi::Status::GenericFailure, err.to_string())
  }
}
