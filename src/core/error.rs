//! Error types for the CFDP dispatch core.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from the transport dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The persisted `type_of_network` tag maps to no known transport.
    #[error("transport tag {0} not recognized")]
    UnrecognizedTransport(u8),
}

/// Crate-wide errors.
///
/// Every multi-step constructor (application context, client session)
/// treats any of these as terminal for that call: resources acquired in
/// earlier steps are released and the error is returned. There is no retry
/// at this layer.
#[derive(Debug, Error)]
pub enum CfdpError {
    /// A required directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreation {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: io::Error,
    },

    /// I/O failure while reading or writing the descriptor store.
    #[error("descriptor store i/o failure: {0}")]
    Io(#[from] io::Error),

    /// A descriptor file exists but does not parse as a descriptor.
    #[error("malformed descriptor {path}: {source}")]
    MalformedDescriptor {
        /// The offending file.
        path: PathBuf,
        /// The underlying (de)serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// No persisted descriptor matches the requested entity id.
    #[error("no descriptor found for entity {entity_id}")]
    DescriptorLookup {
        /// The entity id that was looked up.
        entity_id: u32,
    },

    /// The transport dispatcher could not produce a worker.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// The local entity id must be non-zero.
    #[error("local entity id must be non-zero")]
    InvalidEntityId,
}

/// Convenience alias used throughout the crate.
pub type CfdpResult<T> = Result<T, CfdpError>;
