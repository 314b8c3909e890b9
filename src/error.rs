use std::fmt::Display;

use thiserror::Error as ThisError;

#[derive(ThisError, Debug, PartialEq, Eq)]
pub enum Error {
  #[error("unsupported type: {kind}")]
  UnsupportedType { kind: String },
  #[error("the decode target cannot be populated: {message}")]
  TargetNotWritable { message: String },

  #[error("truncated input: {required} bytes required, {remaining} remaining")]
  TruncatedInput { required: usize, remaining: usize },
  #[error("declared length {declared} exceeds the input size of {available} bytes")]
  SequenceLengthOverflow { declared: u64, available: usize },
  #[error("text at offset {position} is not valid UTF-8")]
  InvalidText { position: usize },

  #[error("nesting depth exceeds the limit of {limit}")]
  DepthLimitExceeded { limit: usize },
  #[error("{count} bytes remain after the decoded value")]
  TrailingBytes { count: usize },
}

impl serde::ser::Error for Error {
  fn custom<T: Display>(msg: T) -> Self {
    Error::UnsupportedType { kind: msg.to_string() }
  }
}

impl serde::de::Error for Error {
  fn custom<T: Display>(msg: T) -> Self {
    Error::TargetNotWritable { message: msg.to_string() }
  }
}
