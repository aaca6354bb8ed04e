//! Detector error types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectorError {
    #[error("Division by zero: previous price is zero")]
    DivisionByZero,
}

pub type DetectorResult<T> = Result<T, DetectorError>;
