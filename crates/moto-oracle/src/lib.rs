//! reqwest-backed implementations of the `moto-core` oracle traits.

pub mod elevation;
pub mod retry;
pub mod valhalla;

pub use elevation::{ElevationClient, OPENTOPODATA_EUDEM25M_URL, OPEN_ELEVATION_URL};
pub use retry::Backoff;
pub use valhalla::{ValhallaClient, ValhallaConfig};

use moto_core::OracleError;

pub(crate) fn transport_error(err: reqwest::Error) -> OracleError {
    OracleError::Transport(err.to_string())
}
