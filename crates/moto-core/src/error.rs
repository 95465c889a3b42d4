//! Error taxonomy shared by the oracle clients and the correction engine.

use thiserror::Error;

use crate::models::RouteCandidate;

/// Violation of the polyline6 encoding. Never retried: it means the oracle
/// broke its contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("shape truncated inside a value starting at byte {offset}")]
    Truncated { offset: usize },
    #[error("invalid shape byte 0x{byte:02x} at offset {offset}")]
    InvalidByte { offset: usize, byte: u8 },
    #[error("shape value starting at byte {offset} overflows 64 bits")]
    Overflow { offset: usize },
}

/// Failure of a single oracle call. All variants are retryable.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("oracle returned HTTP {0}")]
    Status(u16),
    #[error("oracle response has no trip")]
    MissingTrip,
    #[error("oracle response could not be decoded: {0}")]
    Decode(String),
    #[error("no oracle endpoint configured")]
    NotConfigured,
}

/// Outcomes surfaced past the engine boundary.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Every attempt in the budget failed to get any response.
    #[error("routing oracle unavailable after {attempts} attempt(s)")]
    OracleUnavailable { attempts: u32 },
    /// Responses arrived but none fit the constraints. `closest` holds the
    /// response nearest to the band, for callers willing to present it.
    #[error("no route within constraints after {attempts} attempt(s)")]
    CannotMeetConstraints {
        attempts: u32,
        closest: Option<Box<RouteCandidate>>,
    },
    #[error("malformed shape from routing oracle: {0}")]
    MalformedShape(#[from] ShapeError),
    #[error("input rejected: {0}")]
    InputRejected(String),
}

pub type Result<T> = std::result::Result<T, RouteError>;
