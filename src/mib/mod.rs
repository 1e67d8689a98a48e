//! Persisted remote-entity descriptors (the CFDP MIB).
//!
//! Every entity the local node can talk to is described by one JSON file in
//! the store directory, `mib/peer_<n>.json`. A descriptor carries the
//! peer's transport coordinates (address, port, transport tag, MTU) and its
//! CFDP timing parameters. Descriptors are immutable once loaded.
//!
//! Lookup matches on the `cfdp_id` *field* of each file, not on the file
//! name: the bootstrap file `peer_0.json` describes entity 7 and a lookup
//! for id 7 on a fresh store resolves through it.

use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{BOOTSTRAP_PEER_FILE, CfdpError, CfdpResult, MIB_DIR, STAGING_DIR};

/// The five transport variants a descriptor can select.
///
/// The persisted `type_of_network` field stays a raw `u8` on the
/// descriptor itself so an unrecognized tag survives until dispatch, where
/// it is rejected with a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Connectionless BSD sockets (UDP).
    PosixConnectionless,
    /// Connection-oriented BSD sockets (TCP).
    PosixConnected,
    /// Connectionless CubeSat Space Protocol link.
    CspConnectionless,
    /// Connection-oriented CubeSat Space Protocol link.
    CspConnected,
    /// Fallback for integrator-supplied link layers.
    Generic,
}

impl TransportKind {
    /// Decode a persisted `type_of_network` tag.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::PosixConnectionless),
            1 => Some(Self::PosixConnected),
            2 => Some(Self::CspConnectionless),
            3 => Some(Self::CspConnected),
            4 => Some(Self::Generic),
            _ => None,
        }
    }

    /// The persisted tag value for this transport.
    pub fn as_raw(self) -> u8 {
        match self {
            Self::PosixConnectionless => 0,
            Self::PosixConnected => 1,
            Self::CspConnectionless => 2,
            Self::CspConnected => 3,
            Self::Generic => 4,
        }
    }
}

/// CFDP transmission mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionMode {
    /// Reliable transfer with acknowledgments and retransmission.
    Acknowledged,
    /// Best-effort transfer without acknowledgments.
    Unacknowledged,
}

impl TransmissionMode {
    /// Decode a persisted `default_transmission_mode` value.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Acknowledged),
            1 => Some(Self::Unacknowledged),
            _ => None,
        }
    }

    /// The persisted value for this mode.
    pub fn as_raw(self) -> u8 {
        match self {
            Self::Acknowledged => 0,
            Self::Unacknowledged => 1,
        }
    }
}

/// One persisted entity descriptor.
///
/// Field names mirror the JSON schema of the store exactly; the serde
/// renames keep the persisted capitalization (`UT_address`, `MTU`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntity {
    /// The entity's CFDP id.
    pub cfdp_id: u32,
    /// Unitdata-transfer address (IPv4 as a host-order integer).
    #[serde(rename = "UT_address")]
    pub ut_address: u32,
    /// Unitdata-transfer port.
    #[serde(rename = "UT_port")]
    pub ut_port: u16,
    /// Raw transport tag; see [`TransportKind::from_raw`].
    pub type_of_network: u8,
    /// Raw default mode; see [`TransmissionMode::from_raw`].
    pub default_transmission_mode: u8,
    /// Maximum transmission unit; bounds every buffer sized for this peer.
    #[serde(rename = "MTU")]
    pub mtu: u32,
    /// One-way light time to the peer, in seconds.
    pub one_way_light_time: u32,
    /// Total allowance for a round trip, in seconds.
    pub total_round_trip_allowance: u32,
    /// Interval between asynchronous NAKs, in seconds.
    #[serde(rename = "async_NAK_interval")]
    pub async_nak_interval: u32,
    /// Interval between keep-alive PDUs, in seconds.
    pub async_keep_alive_interval: u32,
    /// Interval between report PDUs, in seconds.
    pub async_report_interval: u32,
    /// Non-zero if immediate NAK mode is enabled.
    pub immediate_nak_mode_enabled: u32,
    /// Interval between prompt transmissions, in seconds.
    pub prompt_transmission_interval: u32,
    /// Disposition policy for incomplete received files.
    pub disposition_of_incomplete: u32,
    /// Non-zero if PDUs to this peer must carry a CRC.
    #[serde(rename = "CRC_required")]
    pub crc_required: u8,
    /// Allowed discrepancy before a keep-alive is considered stale.
    pub keep_alive_discrepancy_limit: u32,
    /// Expirations of the positive-ack timer before the transaction is abandoned.
    pub positive_ack_timer_expiration_limit: u32,
    /// Expirations of the NAK timer before the transaction is abandoned.
    pub nak_timer_expiration_limit: u32,
    /// Seconds of inactivity before a transaction is abandoned.
    pub transaction_inactivity_limit: u32,
}

impl RemoteEntity {
    /// The fixed default body written to the bootstrap descriptor file.
    pub fn bootstrap_defaults() -> Self {
        Self {
            cfdp_id: 7,
            ut_address: 0,
            ut_port: 1,
            type_of_network: 3,
            default_transmission_mode: 1,
            mtu: 250,
            one_way_light_time: 123,
            total_round_trip_allowance: 123,
            async_nak_interval: 123,
            async_keep_alive_interval: 123,
            async_report_interval: 123,
            immediate_nak_mode_enabled: 123,
            prompt_transmission_interval: 123,
            disposition_of_incomplete: 123,
            crc_required: 0,
            keep_alive_discrepancy_limit: 8,
            positive_ack_timer_expiration_limit: 123,
            nak_timer_expiration_limit: 123,
            transaction_inactivity_limit: 123,
        }
    }

    /// The decoded transport tag, or `None` if the raw value is unknown.
    pub fn transport(&self) -> Option<TransportKind> {
        TransportKind::from_raw(self.type_of_network)
    }

    /// The peer's socket address for posix transports.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::from(self.ut_address), self.ut_port))
    }
}

/// Filesystem-backed descriptor store.
///
/// The store owns two directories beneath its root: [`STAGING_DIR`] for
/// partially received transfers and [`MIB_DIR`] for descriptor files.
#[derive(Debug, Clone)]
pub struct MibStore {
    root: PathBuf,
}

impl MibStore {
    /// Open a store rooted at `root`. No filesystem access happens here;
    /// call [`ensure_layout`](Self::ensure_layout) before the first lookup.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory for partially received transfers.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Directory holding the descriptor files.
    pub fn mib_dir(&self) -> PathBuf {
        self.root.join(MIB_DIR)
    }

    /// Create the staging and descriptor directories if absent.
    pub fn ensure_layout(&self) -> CfdpResult<()> {
        for dir in [self.staging_dir(), self.mib_dir()] {
            fs::create_dir_all(&dir).map_err(|source| CfdpError::DirectoryCreation {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Write the bootstrap descriptor file with its fixed default body,
    /// only if it does not already exist.
    pub fn ensure_bootstrap(&self) -> CfdpResult<()> {
        let path = self.mib_dir().join(BOOTSTRAP_PEER_FILE);
        if path.exists() {
            debug!(path = %path.display(), "bootstrap descriptor already present");
            return Ok(());
        }
        write_descriptor(&path, &RemoteEntity::bootstrap_defaults())?;
        info!(path = %path.display(), "wrote bootstrap descriptor");
        Ok(())
    }

    /// Resolve an entity id to its descriptor.
    ///
    /// Scans every descriptor file in the store and returns the first whose
    /// `cfdp_id` field matches. Files are visited in name order so the
    /// result is deterministic when several files describe the same id.
    pub fn lookup(&self, entity_id: u32) -> CfdpResult<RemoteEntity> {
        let mut paths: Vec<PathBuf> = fs::read_dir(self.mib_dir())?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            let descriptor = read_descriptor(&path)?;
            if descriptor.cfdp_id == entity_id {
                debug!(entity = entity_id, path = %path.display(), "descriptor resolved");
                return Ok(descriptor);
            }
        }
        Err(CfdpError::DescriptorLookup { entity_id })
    }

    /// Persist a descriptor as `mib/peer_<id>.json`, overwriting any
    /// previous descriptor for that id.
    pub fn save(&self, descriptor: &RemoteEntity) -> CfdpResult<()> {
        let path = self
            .mib_dir()
            .join(format!("peer_{}.json", descriptor.cfdp_id));
        write_descriptor(&path, descriptor)?;
        debug!(entity = descriptor.cfdp_id, path = %path.display(), "descriptor saved");
        Ok(())
    }
}

fn read_descriptor(path: &Path) -> CfdpResult<RemoteEntity> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| CfdpError::MalformedDescriptor {
        path: path.to_path_buf(),
        source,
    })
}

fn write_descriptor(path: &Path, descriptor: &RemoteEntity) -> CfdpResult<()> {
    let text =
        serde_json::to_string_pretty(descriptor).map_err(|source| CfdpError::MalformedDescriptor {
            path: path.to_path_buf(),
            source,
        })?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fresh_store() -> (TempDir, MibStore) {
        let dir = TempDir::new().unwrap();
        let store = MibStore::open(dir.path());
        store.ensure_layout().unwrap();
        (dir, store)
    }

    #[test]
    fn test_layout_creates_both_directories() {
        let (_dir, store) = fresh_store();
        assert!(store.staging_dir().is_dir());
        assert!(store.mib_dir().is_dir());
    }

    #[test]
    fn test_bootstrap_written_when_absent() {
        let (_dir, store) = fresh_store();
        store.ensure_bootstrap().unwrap();

        let path = store.mib_dir().join(BOOTSTRAP_PEER_FILE);
        assert!(path.is_file());
        let written: RemoteEntity =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, RemoteEntity::bootstrap_defaults());
    }

    #[test]
    fn test_bootstrap_preserved_when_present() {
        let (_dir, store) = fresh_store();
        let mut custom = RemoteEntity::bootstrap_defaults();
        custom.mtu = 9000;
        let path = store.mib_dir().join(BOOTSTRAP_PEER_FILE);
        fs::write(&path, serde_json::to_string(&custom).unwrap()).unwrap();

        store.ensure_bootstrap().unwrap();

        let kept: RemoteEntity =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(kept.mtu, 9000);
    }

    #[test]
    fn test_lookup_matches_on_cfdp_id_field_not_file_name() {
        let (_dir, store) = fresh_store();
        let mut descriptor = RemoteEntity::bootstrap_defaults();
        descriptor.cfdp_id = 42;
        fs::write(
            store.mib_dir().join("peer_5.json"),
            serde_json::to_string(&descriptor).unwrap(),
        )
        .unwrap();

        assert_eq!(store.lookup(42).unwrap().cfdp_id, 42);
        assert!(matches!(
            store.lookup(5),
            Err(CfdpError::DescriptorLookup { entity_id: 5 })
        ));
    }

    #[test]
    fn test_fresh_store_resolves_entity_seven_through_bootstrap() {
        let (_dir, store) = fresh_store();
        store.ensure_bootstrap().unwrap();

        let descriptor = store.lookup(7).unwrap();
        assert_eq!(descriptor, RemoteEntity::bootstrap_defaults());
    }

    #[test]
    fn test_save_then_lookup_round_trips() {
        let (_dir, store) = fresh_store();
        let mut descriptor = RemoteEntity::bootstrap_defaults();
        descriptor.cfdp_id = 9;
        descriptor.mtu = 512;
        descriptor.type_of_network = TransportKind::Generic.as_raw();

        store.save(&descriptor).unwrap();
        assert_eq!(store.lookup(9).unwrap(), descriptor);
    }

    #[test]
    fn test_persisted_field_names_keep_store_capitalization() {
        let json = serde_json::to_string(&RemoteEntity::bootstrap_defaults()).unwrap();
        for field in ["\"UT_address\"", "\"UT_port\"", "\"MTU\"", "\"CRC_required\"",
            "\"async_NAK_interval\""]
        {
            assert!(json.contains(field), "missing field {field}");
        }
    }

    #[test]
    fn test_transport_tags_decode() {
        assert_eq!(
            TransportKind::from_raw(0),
            Some(TransportKind::PosixConnectionless)
        );
        assert_eq!(TransportKind::from_raw(3), Some(TransportKind::CspConnected));
        assert_eq!(TransportKind::from_raw(4), Some(TransportKind::Generic));
        assert_eq!(TransportKind::from_raw(5), None);

        for raw in 0..5u8 {
            let kind = TransportKind::from_raw(raw).unwrap();
            assert_eq!(kind.as_raw(), raw);
        }
    }

    #[test]
    fn test_malformed_descriptor_surfaces_as_error() {
        let (_dir, store) = fresh_store();
        fs::write(store.mib_dir().join("peer_1.json"), "not json").unwrap();

        assert!(matches!(
            store.lookup(1),
            Err(CfdpError::MalformedDescriptor { .. })
        ));
    }
}
