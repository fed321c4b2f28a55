use crate::error::{ConfigError, RelayError};
use crate::media::LocalStream;
use crate::signaling::{
    ConnectOptions, ControlChannel, HandleId, MediaSession, RemoteStream, SignalingRelay,
};
use crate::transport::TransportEvent;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::{DashMap, DashSet};
use dashmap::mapref::entry::Entry;
use huddle_core::PeerId;
use std::env;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

/// Settings of the in-process relay.
#[derive(Debug, Clone)]
pub struct MemoryRelayConfig {
    /// How long a vanished peer's channels and sessions stay up before the
    /// relay reports them closed.
    pub liveness_timeout: Duration,
}

impl MemoryRelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(value) = env::var("HUDDLE_LIVENESS_TIMEOUT_MS") {
            let millis = value.parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "HUDDLE_LIVENESS_TIMEOUT_MS",
                value,
            })?;
            config.liveness_timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

impl Default for MemoryRelayConfig {
    fn default() -> Self {
        Self {
            liveness_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Channel,
    Media,
}

/// One end of a channel or media session.
struct Link {
    kind: LinkKind,
    owner: PeerId,
    remote: PeerId,
    counterpart: HandleId,
    live: bool,
}

struct RelayInner {
    config: MemoryRelayConfig,
    next_handle: AtomicU64,
    registrants: DashMap<PeerId, mpsc::UnboundedSender<TransportEvent>>,
    links: DashMap<HandleId, Link>,
    calls: Mutex<Vec<(PeerId, PeerId)>>,
    directory_available: AtomicBool,
    accepting_registrations: AtomicBool,
    refused_callees: DashSet<PeerId>,
    /// Completion events go to both owners under this lock, so every client
    /// sees competing completions in the same order.
    sequence: std::sync::Mutex<()>,
}

/// Relay living inside the process. Every client gets its own
/// [`MemoryEndpoint`]; all endpoints of one relay see each other.
#[derive(Clone)]
pub struct MemoryRelay {
    inner: Arc<RelayInner>,
}

impl MemoryRelay {
    pub fn new(config: MemoryRelayConfig) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                config,
                next_handle: AtomicU64::new(1),
                registrants: DashMap::new(),
                links: DashMap::new(),
                calls: Mutex::new(Vec::new()),
                directory_available: AtomicBool::new(true),
                accepting_registrations: AtomicBool::new(true),
                refused_callees: DashSet::new(),
                sequence: std::sync::Mutex::new(()),
            }),
        }
    }

    pub fn endpoint(&self) -> MemoryEndpoint {
        MemoryEndpoint {
            inner: Arc::clone(&self.inner),
            me: OnceLock::new(),
        }
    }

    pub fn set_directory_available(&self, available: bool) {
        self.inner
            .directory_available
            .store(available, Ordering::SeqCst);
    }

    pub fn set_accepting_registrations(&self, accepting: bool) {
        self.inner
            .accepting_registrations
            .store(accepting, Ordering::SeqCst);
    }

    /// Every later call to `peer_id` fails before reaching it.
    pub fn refuse_calls_to(&self, peer_id: &PeerId) {
        self.inner.refused_callees.insert(peer_id.clone());
    }

    /// Breaks every media session between `a` and `b`; both ends report
    /// `reason`.
    pub fn fail_media(&self, a: &PeerId, b: &PeerId, reason: &str) {
        let failing: Vec<HandleId> = self
            .inner
            .links
            .iter()
            .filter(|entry| {
                let link = entry.value();
                link.kind == LinkKind::Media && &link.owner == a && &link.remote == b
            })
            .map(|entry| *entry.key())
            .collect();

        warn!("Failing {} media session(s) between {} and {}", failing.len(), a, b);
        for id in failing {
            self.inner.fail_link(id, reason);
        }
    }

    pub fn is_registered(&self, peer_id: &PeerId) -> bool {
        self.inner.registrants.contains_key(peer_id)
    }

    /// Channel and session ends still held by `peer_id`.
    pub fn open_handles(&self, peer_id: &PeerId) -> usize {
        self.inner
            .links
            .iter()
            .filter(|entry| &entry.value().owner == peer_id)
            .count()
    }

    /// Every call placed so far, as (caller, callee).
    pub async fn calls(&self) -> Vec<(PeerId, PeerId)> {
        self.inner.calls.lock().await.clone()
    }

    /// Reports a relay-level failure to `peer_id` that belongs to no handle.
    pub fn report_error(&self, peer_id: &PeerId, reason: &str) {
        warn!("Reporting relay error to {}: {}", peer_id, reason);
        self.inner
            .emit(peer_id, TransportEvent::RelayError(reason.to_owned()));
    }

    /// Makes `peer_id` vanish without a goodbye: it disappears from the
    /// directory at once, its counterparts learn about it only after the
    /// liveness timeout.
    pub fn sever(&self, peer_id: &PeerId) {
        info!("Severing {} from the relay", peer_id);
        self.inner.registrants.remove(peer_id);

        let inner = Arc::clone(&self.inner);
        let peer_id = peer_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(inner.config.liveness_timeout).await;
            debug!("Liveness timeout expired for {}", peer_id);
            inner.close_owned_by(&peer_id);
        });
    }
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new(MemoryRelayConfig::default())
    }
}

impl RelayInner {
    fn allocate_handle(&self) -> HandleId {
        HandleId(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    fn emit(&self, to: &PeerId, event: TransportEvent) {
        if let Some(tx) = self.registrants.get(to) {
            if tx.send(event).is_err() {
                debug!("Event queue of {} is gone", to);
            }
        }
    }

    /// Creates both ends of a link; returns (local end, remote end).
    fn open_pair(&self, kind: LinkKind, local: &PeerId, remote: &PeerId) -> (HandleId, HandleId) {
        let local_id = self.allocate_handle();
        let remote_id = self.allocate_handle();

        self.links.insert(
            local_id,
            Link {
                kind,
                owner: local.clone(),
                remote: remote.clone(),
                counterpart: remote_id,
                live: false,
            },
        );
        self.links.insert(
            remote_id,
            Link {
                kind,
                owner: remote.clone(),
                remote: local.clone(),
                counterpart: local_id,
                live: false,
            },
        );

        (local_id, remote_id)
    }

    /// Opens a channel from `local` to `remote` and reports it open on both
    /// sides. Returns the local end.
    fn open_channel(self: &Arc<Self>, local: &PeerId, remote: &PeerId) -> HandleId {
        let (local_id, remote_id) = self.open_pair(LinkKind::Channel, local, remote);
        let _order = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);

        self.emit(
            remote,
            TransportEvent::IncomingConnection {
                peer_id: local.clone(),
                channel: Box::new(MemoryChannel {
                    id: remote_id,
                    remote: local.clone(),
                    inner: Arc::clone(self),
                }),
            },
        );

        self.mark_live(local_id);
        self.mark_live(remote_id);
        self.emit(
            local,
            TransportEvent::ChannelOpened {
                peer_id: remote.clone(),
                channel: local_id,
            },
        );
        self.emit(
            remote,
            TransportEvent::ChannelOpened {
                peer_id: local.clone(),
                channel: remote_id,
            },
        );
        local_id
    }

    fn mark_live(&self, id: HandleId) {
        if let Some(mut link) = self.links.get_mut(&id) {
            link.live = true;
        }
    }

    fn is_live(&self, id: HandleId) -> bool {
        self.links.get(&id).map(|link| link.live).unwrap_or(false)
    }

    /// Closes both ends of the link `id` belongs to and tells both owners.
    fn close_link(&self, id: HandleId) {
        let Some((_, link)) = self.links.remove(&id) else {
            return;
        };
        self.links.remove(&link.counterpart);

        let (own_event, remote_event) = match link.kind {
            LinkKind::Channel => (
                TransportEvent::ChannelClosed {
                    peer_id: link.remote.clone(),
                    channel: id,
                },
                TransportEvent::ChannelClosed {
                    peer_id: link.owner.clone(),
                    channel: link.counterpart,
                },
            ),
            LinkKind::Media => (
                TransportEvent::SessionClosed {
                    peer_id: link.remote.clone(),
                    session: id,
                },
                TransportEvent::SessionClosed {
                    peer_id: link.owner.clone(),
                    session: link.counterpart,
                },
            ),
        };
        self.emit(&link.owner, own_event);
        self.emit(&link.remote, remote_event);
    }

    fn fail_link(&self, id: HandleId, reason: &str) {
        let Some((_, link)) = self.links.remove(&id) else {
            return;
        };
        self.links.remove(&link.counterpart);

        self.emit(
            &link.owner,
            TransportEvent::SessionError {
                peer_id: link.remote.clone(),
                session: id,
                reason: reason.to_owned(),
            },
        );
        self.emit(
            &link.remote,
            TransportEvent::SessionError {
                peer_id: link.owner.clone(),
                session: link.counterpart,
                reason: reason.to_owned(),
            },
        );
    }

    /// Close requested by the owner of `id`. A severed owner cannot reach the
    /// relay any more; its links go away with the liveness timeout.
    fn close_by_owner(&self, id: HandleId) {
        let severed = self
            .links
            .get(&id)
            .is_some_and(|link| !self.registrants.contains_key(&link.owner));
        if severed {
            debug!("Ignoring close of {} from a severed peer", id);
            return;
        }
        self.close_link(id);
    }

    fn close_owned_by(&self, peer_id: &PeerId) {
        let owned: Vec<HandleId> = self
            .links
            .iter()
            .filter(|entry| &entry.value().owner == peer_id)
            .map(|entry| *entry.key())
            .collect();

        for id in owned {
            self.close_link(id);
        }
    }

    fn deliver(&self, id: HandleId, payload: Bytes) -> Result<(), RelayError> {
        let (from, to, counterpart) = match self.links.get(&id) {
            Some(link) if link.live => (link.owner.clone(), link.remote.clone(), link.counterpart),
            _ => return Err(RelayError::ChannelClosed),
        };
        self.emit(
            &to,
            TransportEvent::ChannelData {
                peer_id: from,
                channel: counterpart,
                payload,
            },
        );
        Ok(())
    }

    fn answer(&self, id: HandleId) -> Result<(), RelayError> {
        let (callee, caller, counterpart) = match self.links.get(&id) {
            Some(link) => (link.owner.clone(), link.remote.clone(), link.counterpart),
            None => return Err(RelayError::SessionClosed),
        };
        let _order = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);
        self.mark_live(id);
        self.mark_live(counterpart);

        self.emit(
            &callee,
            TransportEvent::StreamAvailable {
                peer_id: caller.clone(),
                session: id,
                stream: RemoteStream {
                    session: id,
                    from: caller.clone(),
                },
            },
        );
        self.emit(
            &caller,
            TransportEvent::StreamAvailable {
                peer_id: callee.clone(),
                session: counterpart,
                stream: RemoteStream {
                    session: counterpart,
                    from: callee,
                },
            },
        );
        Ok(())
    }
}

/// A single client's view of a [`MemoryRelay`].
pub struct MemoryEndpoint {
    inner: Arc<RelayInner>,
    me: OnceLock<PeerId>,
}

impl MemoryEndpoint {
    fn me(&self) -> Result<&PeerId, RelayError> {
        self.me.get().ok_or(RelayError::NotRegistered)
    }

    fn reachable(&self, peer_id: &PeerId) -> Result<(), RelayError> {
        if self.inner.registrants.contains_key(peer_id) {
            Ok(())
        } else {
            Err(RelayError::PeerUnavailable(peer_id.clone()))
        }
    }
}

#[async_trait]
impl SignalingRelay for MemoryEndpoint {
    async fn register(
        &self,
        peer_id: &PeerId,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<(), RelayError> {
        if !self.inner.accepting_registrations.load(Ordering::SeqCst) {
            return Err(RelayError::Unavailable("registration refused".to_owned()));
        }
        if let Some(existing) = self.me.get() {
            return Err(RelayError::AlreadyRegistered(existing.clone()));
        }

        match self.inner.registrants.entry(peer_id.clone()) {
            Entry::Occupied(_) => return Err(RelayError::IdTaken(peer_id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(events);
            }
        }
        let _ = self.me.set(peer_id.clone());

        info!("Registered {} with the relay", peer_id);
        Ok(())
    }

    async fn list_peers(&self) -> Result<Vec<PeerId>, RelayError> {
        if !self.inner.directory_available.load(Ordering::SeqCst) {
            return Err(RelayError::Unavailable("peer directory unreachable".to_owned()));
        }
        let mut peers: Vec<PeerId> = self
            .inner
            .registrants
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        peers.sort();
        Ok(peers)
    }

    async fn connect(
        &self,
        peer_id: &PeerId,
        options: ConnectOptions,
    ) -> Result<Box<dyn ControlChannel>, RelayError> {
        let me = self.me()?.clone();
        self.reachable(peer_id)?;
        debug!(
            "Opening control channel {} -> {} (reliable: {})",
            me, peer_id, options.reliable
        );

        let local_id = self.inner.open_channel(&me, peer_id);

        Ok(Box::new(MemoryChannel {
            id: local_id,
            remote: peer_id.clone(),
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn call(
        &self,
        peer_id: &PeerId,
        _stream: Arc<dyn LocalStream>,
    ) -> Result<Box<dyn MediaSession>, RelayError> {
        let me = self.me()?.clone();
        self.reachable(peer_id)?;
        if self.inner.refused_callees.contains(peer_id) {
            return Err(RelayError::CallRefused(peer_id.clone()));
        }
        debug!("Calling {} from {}", peer_id, me);

        self.inner
            .calls
            .lock()
            .await
            .push((me.clone(), peer_id.clone()));

        let (local_id, remote_id) = self.inner.open_pair(LinkKind::Media, &me, peer_id);
        self.inner.emit(
            peer_id,
            TransportEvent::IncomingCall {
                peer_id: me.clone(),
                session: Box::new(MemoryMedia {
                    id: remote_id,
                    remote: me,
                    inner: Arc::clone(&self.inner),
                }),
            },
        );

        Ok(Box::new(MemoryMedia {
            id: local_id,
            remote: peer_id.clone(),
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn unregister(&self) {
        let Some(me) = self.me.get() else {
            return;
        };
        if self.inner.registrants.remove(me).is_none() {
            warn!("{} was no longer registered", me);
            return;
        }
        self.inner.close_owned_by(me);
        info!("Unregistered {} from the relay", me);
    }
}

struct MemoryChannel {
    id: HandleId,
    remote: PeerId,
    inner: Arc<RelayInner>,
}

#[async_trait]
impl ControlChannel for MemoryChannel {
    fn id(&self) -> HandleId {
        self.id
    }

    fn remote(&self) -> &PeerId {
        &self.remote
    }

    fn is_open(&self) -> bool {
        self.inner.is_live(self.id)
    }

    async fn send(&self, payload: Bytes) -> Result<(), RelayError> {
        self.inner.deliver(self.id, payload)
    }

    async fn close(&self) {
        self.inner.close_by_owner(self.id);
    }
}

struct MemoryMedia {
    id: HandleId,
    remote: PeerId,
    inner: Arc<RelayInner>,
}

#[async_trait]
impl MediaSession for MemoryMedia {
    fn id(&self) -> HandleId {
        self.id
    }

    fn remote(&self) -> &PeerId {
        &self.remote
    }

    async fn answer(&self, _stream: Arc<dyn LocalStream>) -> Result<(), RelayError> {
        self.inner.answer(self.id)
    }

    async fn close(&self) {
        self.inner.close_by_owner(self.id);
    }
}
