//! Fixed values used across the dispatch core.
//!
//! Directory names match the persisted layout every CFDP entity produces on
//! first start; changing them invalidates existing descriptor stores.

use std::time::Duration;

/// Directory holding partially received transfers.
pub const STAGING_DIR: &str = "incomplete_requests";

/// Directory holding one persisted descriptor file per known peer.
pub const MIB_DIR: &str = "mib";

/// Bootstrap descriptor file written into [`MIB_DIR`] when the store is
/// first initialized.
pub const BOOTSTRAP_PEER_FILE: &str = "peer_0.json";

/// How often an outbound worker checks its pending-request registry.
pub const REQUEST_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Entity ids on the wire are 32-bit values.
pub const ENTITY_ID_LENGTH: u8 = 4;

/// Transaction sequence numbers on the wire are 32-bit values.
pub const SEQUENCE_NUMBER_LENGTH: u8 = 4;

/// CFDP protocol version carried in every PDU header.
pub const PROTOCOL_VERSION: u8 = 1;
