//! Outgoing transfer (put) requests.

use crate::mib::TransmissionMode;

/// A queued request to deliver one file to a peer entity.
///
/// Requests wait in a session's pending-request registry until the PDU
/// layer picks them up and opens a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// The peer that should receive the file.
    pub destination_id: u32,
    /// Path of the file on the local filesystem.
    pub source_file: String,
    /// Path the peer should store the file under.
    pub destination_file: String,
    /// Transmission mode for this transfer.
    pub mode: TransmissionMode,
    /// Transaction sequence number, unique per application context.
    pub sequence_number: u32,
}

impl TransferRequest {
    /// Build a request with an already-assigned sequence number.
    pub fn new(
        destination_id: u32,
        source_file: impl Into<String>,
        destination_file: impl Into<String>,
        mode: TransmissionMode,
        sequence_number: u32,
    ) -> Self {
        Self {
            destination_id,
            source_file: source_file.into(),
            destination_file: destination_file.into(),
            mode,
            sequence_number,
        }
    }
}
