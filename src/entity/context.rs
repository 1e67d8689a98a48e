//! The local entity's application context.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{CfdpError, CfdpResult};
use crate::mib::{MibStore, RemoteEntity, TransmissionMode};
use crate::registry::{Criterion, Registry};
use crate::transport::{PacketBuffer, SharedRegistry, WorkerContext, WorkerRole, dispatch};

use super::request::TransferRequest;
use super::session::ClientSession;

/// Startup parameters for the local entity.
#[derive(Debug, Clone)]
pub struct EntityConfig {
    /// The local entity's id; must be non-zero.
    pub entity_id: u32,
    /// Directory beneath which the staging and descriptor directories live.
    pub root: PathBuf,
}

impl EntityConfig {
    /// Configuration with the store rooted in the working directory.
    pub fn new(entity_id: u32) -> Self {
        Self {
            entity_id,
            root: PathBuf::from("."),
        }
    }

    /// Root the descriptor store somewhere else.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}

/// State shared between the context, its sessions, and their workers.
#[derive(Debug)]
pub struct ContextShared {
    /// The local entity's id.
    pub entity_id: u32,
    /// The descriptor store every lookup goes through.
    pub store: MibStore,
    /// Sessions currently running, keyed by peer id.
    pub active_sessions: SharedRegistry<ClientSession>,
    /// Requests not yet bound to a session.
    pub pending_requests: SharedRegistry<TransferRequest>,
    /// Process-wide shutdown intent; cancelled exactly once at teardown.
    pub shutdown: CancellationToken,
    next_sequence: AtomicU32,
}

impl ContextShared {
    /// Allocate the next transaction sequence number.
    pub fn next_sequence(&self) -> u32 {
        self.next_sequence.fetch_add(1, Ordering::Relaxed)
    }
}

/// The local entity's runtime state.
///
/// Owns the inbound buffer (sized to the own descriptor's MTU), the
/// active-session and pending-request registries, and the inbound worker
/// handle. Built once at startup by [`init`](Self::init); torn down by
/// [`shutdown`](Self::shutdown) after all sessions are joined.
#[derive(Debug)]
pub struct EntityContext {
    shared: Arc<ContextShared>,
    own_entity: RemoteEntity,
    inbound_buffer: PacketBuffer,
    server_handle: JoinHandle<()>,
}

impl EntityContext {
    /// Build the application context.
    ///
    /// Steps, in order: ensure the staging and descriptor directories,
    /// ensure the bootstrap descriptor file (write-if-absent), resolve the
    /// own descriptor by the configured id, allocate the inbound buffer,
    /// create the registries, dispatch the inbound worker. Any step's
    /// failure returns the error; everything acquired by earlier steps is
    /// still a plain local then and drops in reverse order, so a failed
    /// call leaves no buffer, registry, or worker behind.
    pub async fn init(config: EntityConfig) -> CfdpResult<Self> {
        if config.entity_id == 0 {
            return Err(CfdpError::InvalidEntityId);
        }

        let store = MibStore::open(config.root.clone());
        store.ensure_layout()?;
        store.ensure_bootstrap()?;

        let own_entity = store.lookup(config.entity_id)?;

        let inbound_buffer: PacketBuffer =
            Arc::new(Mutex::new(vec![0u8; own_entity.mtu as usize]));
        let shared = Arc::new(ContextShared {
            entity_id: config.entity_id,
            store,
            active_sessions: Arc::new(Mutex::new(Registry::new())),
            pending_requests: Arc::new(Mutex::new(Registry::new())),
            shutdown: CancellationToken::new(),
            next_sequence: AtomicU32::new(1),
        });

        let worker_ctx = WorkerContext {
            entity_id: config.entity_id,
            remote: own_entity.clone(),
            buffer: Arc::clone(&inbound_buffer),
            requests: Arc::clone(&shared.pending_requests),
            shutdown: shared.shutdown.clone(),
        };
        let server_handle = dispatch(own_entity.type_of_network, WorkerRole::Server, worker_ctx)?;

        info!(
            entity = config.entity_id,
            transport = own_entity.type_of_network,
            mtu = own_entity.mtu,
            "application context running"
        );
        Ok(Self {
            shared,
            own_entity,
            inbound_buffer,
            server_handle,
        })
    }

    /// The local entity's id.
    pub fn entity_id(&self) -> u32 {
        self.shared.entity_id
    }

    /// The local entity's own descriptor.
    pub fn own_entity(&self) -> &RemoteEntity {
        &self.own_entity
    }

    /// Handle to the inbound packet buffer.
    pub fn inbound_buffer(&self) -> PacketBuffer {
        Arc::clone(&self.inbound_buffer)
    }

    /// Number of active client sessions.
    pub async fn session_count(&self) -> usize {
        self.shared.active_sessions.lock().await.len()
    }

    /// Number of requests not yet bound to a session.
    pub async fn pending_count(&self) -> usize {
        self.shared.pending_requests.lock().await.len()
    }

    /// Run a closure against the active session for `peer_id`, if any.
    pub async fn with_session<R>(
        &self,
        peer_id: u32,
        f: impl FnOnce(&ClientSession) -> R,
    ) -> Option<R> {
        let sessions = self.shared.active_sessions.lock().await;
        sessions.find(&Criterion::Key(peer_id)).map(f)
    }

    /// Start a client session toward `peer_id` and register it.
    ///
    /// Fails without side effects if the peer has no persisted descriptor
    /// or its transport tag cannot be dispatched.
    pub async fn start_session(&self, peer_id: u32) -> CfdpResult<()> {
        self.ensure_session(peer_id).await.map(|_| ())
    }

    /// Queue a file-delivery request toward `peer_id`.
    ///
    /// Starts a session on first use of a peer and reuses it afterwards;
    /// the request lands in that session's pending-request registry.
    pub async fn put(
        &self,
        peer_id: u32,
        source_file: &str,
        destination_file: &str,
        mode: TransmissionMode,
    ) -> CfdpResult<()> {
        let requests = self.ensure_session(peer_id).await?;
        let request = TransferRequest::new(
            peer_id,
            source_file,
            destination_file,
            mode,
            self.shared.next_sequence(),
        );
        debug!(
            peer = peer_id,
            sequence = request.sequence_number,
            source = source_file,
            "transfer request queued"
        );
        requests.lock().await.append(peer_id, request);
        Ok(())
    }

    /// Find the session for `peer_id` or start one, returning its
    /// pending-request registry.
    ///
    /// The registry lock is held across the whole find-or-start so two
    /// concurrent callers for a brand-new peer cannot both start a worker.
    async fn ensure_session(&self, peer_id: u32) -> CfdpResult<SharedRegistry<TransferRequest>> {
        let mut sessions = self.shared.active_sessions.lock().await;
        if let Some(session) = sessions.find(&Criterion::Key(peer_id)) {
            return Ok(session.pending_requests());
        }
        let session = ClientSession::start(&self.shared, peer_id).await?;
        let requests = session.pending_requests();
        sessions.append(peer_id, session);
        Ok(requests)
    }

    /// Tear the context down.
    ///
    /// Cancels the shutdown token, joins every client session's outbound
    /// worker, and only then joins the inbound worker, so no session can
    /// still be mutating the registries when the context goes away.
    pub async fn shutdown(self) {
        info!(entity = self.shared.entity_id, "shutting down");
        self.shared.shutdown.cancel();

        loop {
            let session = self.shared.active_sessions.lock().await.remove_last();
            match session {
                Some(session) => session.join().await,
                None => break,
            }
        }

        if let Err(e) = self.server_handle.await {
            warn!(error = %e, "inbound worker ended abnormally");
        }
        info!(entity = self.shared.entity_id, "application context stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::core::BOOTSTRAP_PEER_FILE;
    use crate::mib::TransportKind;

    async fn shutdown_within(context: EntityContext) {
        tokio::time::timeout(Duration::from_secs(5), context.shutdown())
            .await
            .expect("shutdown did not complete");
    }

    fn save_generic_peer(root: &std::path::Path, peer_id: u32, mtu: u32) {
        let store = MibStore::open(root);
        store.ensure_layout().unwrap();
        let mut peer = RemoteEntity::bootstrap_defaults();
        peer.cfdp_id = peer_id;
        peer.mtu = mtu;
        peer.type_of_network = TransportKind::Generic.as_raw();
        store.save(&peer).unwrap();
    }

    #[tokio::test]
    async fn test_init_fresh_store_for_entity_seven() {
        let dir = TempDir::new().unwrap();
        let context = EntityContext::init(EntityConfig::new(7).root(dir.path()))
            .await
            .unwrap();

        // Directories and the bootstrap descriptor exist.
        assert!(dir.path().join("incomplete_requests").is_dir());
        assert!(dir.path().join("mib").is_dir());
        let bootstrap = dir.path().join("mib").join(BOOTSTRAP_PEER_FILE);
        let written: RemoteEntity =
            serde_json::from_str(&std::fs::read_to_string(bootstrap).unwrap()).unwrap();
        assert_eq!(written, RemoteEntity::bootstrap_defaults());

        // One inbound worker, empty registries, buffer sized to the MTU.
        assert_eq!(context.entity_id(), 7);
        assert_eq!(context.session_count().await, 0);
        assert_eq!(context.pending_count().await, 0);
        assert_eq!(context.inbound_buffer().lock().await.len(), 250);

        shutdown_within(context).await;
    }

    #[tokio::test]
    async fn test_init_rejects_zero_entity_id() {
        let dir = TempDir::new().unwrap();
        let result = EntityContext::init(EntityConfig::new(0).root(dir.path())).await;
        assert!(matches!(result, Err(CfdpError::InvalidEntityId)));
    }

    #[tokio::test]
    async fn test_init_fails_when_own_descriptor_is_absent() {
        let dir = TempDir::new().unwrap();
        let result = EntityContext::init(EntityConfig::new(99).root(dir.path())).await;
        assert!(matches!(
            result,
            Err(CfdpError::DescriptorLookup { entity_id: 99 })
        ));
    }

    #[tokio::test]
    async fn test_init_fails_when_directories_cannot_be_created() {
        let dir = TempDir::new().unwrap();
        let blocking_file = dir.path().join("occupied");
        std::fs::write(&blocking_file, b"not a directory").unwrap();

        let result = EntityContext::init(EntityConfig::new(7).root(&blocking_file)).await;
        assert!(matches!(result, Err(CfdpError::DirectoryCreation { .. })));
    }

    #[tokio::test]
    async fn test_session_for_absent_peer_fails_without_side_effects() {
        let dir = TempDir::new().unwrap();
        let context = EntityContext::init(EntityConfig::new(7).root(dir.path()))
            .await
            .unwrap();

        let result = context.start_session(99).await;
        assert!(matches!(
            result,
            Err(CfdpError::DescriptorLookup { entity_id: 99 })
        ));
        assert_eq!(context.session_count().await, 0);

        shutdown_within(context).await;
    }

    #[tokio::test]
    async fn test_session_buffer_matches_peer_mtu() {
        let dir = TempDir::new().unwrap();
        save_generic_peer(dir.path(), 9, 512);
        let context = EntityContext::init(EntityConfig::new(7).root(dir.path()))
            .await
            .unwrap();

        context.start_session(9).await.unwrap();
        assert_eq!(context.session_count().await, 1);

        let buffer = context
            .with_session(9, |session| session.outbound_buffer())
            .await
            .unwrap();
        assert_eq!(buffer.lock().await.len(), 512);

        let header = context
            .with_session(9, |session| session.header().clone())
            .await
            .unwrap();
        assert_eq!(header.source_entity_id, 7);
        assert_eq!(header.destination_entity_id, 9);

        shutdown_within(context).await;
    }

    #[tokio::test]
    async fn test_put_starts_one_session_and_reuses_it() {
        let dir = TempDir::new().unwrap();
        save_generic_peer(dir.path(), 9, 250);
        let context = EntityContext::init(EntityConfig::new(7).root(dir.path()))
            .await
            .unwrap();

        context
            .put(9, "pic.jpeg", "remote_pic1.jpeg", TransmissionMode::Acknowledged)
            .await
            .unwrap();
        context
            .put(9, "pic.jpeg", "remote_pic2.jpeg", TransmissionMode::Acknowledged)
            .await
            .unwrap();

        assert_eq!(context.session_count().await, 1);
        let requests = context
            .with_session(9, |session| session.pending_requests())
            .await
            .unwrap();
        let queued = requests.lock().await;
        assert_eq!(queued.len(), 2);
        let sequences: Vec<u32> = queued.iter().map(|(_, request)| request.sequence_number).collect();
        assert_ne!(sequences[0], sequences[1]);
        drop(queued);

        shutdown_within(context).await;
    }

    #[tokio::test]
    async fn test_concurrent_puts_to_new_peer_share_one_session() {
        let dir = TempDir::new().unwrap();
        save_generic_peer(dir.path(), 9, 250);
        let context = EntityContext::init(EntityConfig::new(7).root(dir.path()))
            .await
            .unwrap();

        let (first, second) = tokio::join!(
            context.put(9, "a.bin", "remote_a.bin", TransmissionMode::Acknowledged),
            context.put(9, "b.bin", "remote_b.bin", TransmissionMode::Acknowledged),
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(context.session_count().await, 1);
        let requests = context
            .with_session(9, |session| session.pending_requests())
            .await
            .unwrap();
        assert_eq!(requests.lock().await.len(), 2);

        shutdown_within(context).await;
    }

    #[tokio::test]
    async fn test_session_back_reference_reaches_the_context() {
        let dir = TempDir::new().unwrap();
        save_generic_peer(dir.path(), 9, 250);
        let context = EntityContext::init(EntityConfig::new(7).root(dir.path()))
            .await
            .unwrap();

        context.start_session(9).await.unwrap();
        let owner_id = context
            .with_session(9, |session| {
                session.context().map(|shared| shared.entity_id)
            })
            .await
            .unwrap();
        assert_eq!(owner_id, Some(7));

        shutdown_within(context).await;
    }
}
