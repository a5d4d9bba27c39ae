//! Setup errors for the bridge runtime.
//!
//! Bridged calls never fail; everything here comes from configuring the
//! process or starting its host executors.

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A setting failed validation or could not be parsed.
    #[error("Invalid bridge configuration: {0}")]
    Config(String),

    /// The host has not provided something the bridge cannot run without.
    #[error("Missing host capability '{capability}': {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A process-wide value was set after it had been fixed.
    #[error("{0} is already initialized")]
    AlreadyInitialized(String),

    /// A host executor could not be started.
    #[error("Host executor failed: {0}")]
    Host(#[from] BridgeError),

    #[error("Internal bridge error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
