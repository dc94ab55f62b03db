//! The renderer-proxy boundary.
//!
//! The scene never talks to a renderer directly. [`SyncEngine`](crate::SyncEngine)
//! writes into a [`ProxySink`]; the render phase reads the proxies back and
//! sweeps orphaned ones when no draw is in flight.
//!
//! [`RenderScene`] is the in-process sink: a concurrent map of
//! [`RenderProxy`] values that the update thread writes during sync and the
//! render thread reads between gate signals.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use engine_math::{Aabb, Mat4};
use engine_scene::{GeometryRef, MaterialId, ProxyId};
use tracing::debug;

use crate::error::ProxyError;

/// Visual state of one renderable component, captured during sync.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyUpdate {
    /// World matrix captured once for this frame.
    pub world_transform: Mat4,
    /// World-space bounds.
    pub world_bounds: Aabb,
    /// Materials in slot order.
    pub materials: Vec<MaterialId>,
    /// Geometry to draw.
    pub geometry: GeometryRef,
    /// Whether the component should be drawn.
    pub visible: bool,
}

/// What a [`ProxySink::create_or_update`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyWrite {
    /// A new proxy was materialized (or an orphaned one taken back).
    Created,
    /// An existing proxy was overwritten.
    Updated,
}

/// Receiver of proxy writes.
///
/// Implementations must tolerate `mark_orphaned` for unknown proxies and
/// must keep an orphaned proxy readable until `sweep_orphaned` runs.
pub trait ProxySink: Send + Sync {
    /// Create the proxy if it does not exist, then overwrite its state.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Rejected`] if the backend refuses the write.
    /// The caller leaves the component dirty so the write is retried.
    fn create_or_update(&self, proxy: ProxyId, update: ProxyUpdate)
    -> Result<ProxyWrite, ProxyError>;

    /// Mark a proxy for removal at the next [`ProxySink::sweep_orphaned`].
    fn mark_orphaned(&self, proxy: ProxyId);

    /// Remove every orphaned proxy. Returns how many were removed.
    ///
    /// Called by the render phase after its draw callback returns.
    fn sweep_orphaned(&self) -> usize;
}

/// The renderer-side mirror of a mesh component.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderProxy {
    id: ProxyId,
    state: ProxyUpdate,
    orphaned: bool,
    /// Number of writes since creation.
    revision: u64,
}

impl RenderProxy {
    fn new(id: ProxyId, state: ProxyUpdate) -> Self {
        Self {
            id,
            state,
            orphaned: false,
            revision: 0,
        }
    }

    /// Returns the proxy ID.
    #[must_use]
    pub fn id(&self) -> ProxyId {
        self.id
    }

    /// Returns the last synced state.
    #[must_use]
    pub fn state(&self) -> &ProxyUpdate {
        &self.state
    }

    /// Returns `true` if the proxy waits for the next sweep.
    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        self.orphaned
    }

    /// Returns how many times the proxy was overwritten after creation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn is_drawable(&self) -> bool {
        !self.orphaned && self.state.visible
    }
}

/// Concurrent proxy store shared by the update and render threads.
#[derive(Debug, Default)]
pub struct RenderScene {
    proxies: DashMap<ProxyId, RenderProxy>,
}

impl RenderScene {
    /// Create an empty render scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of a proxy, orphaned or not.
    #[must_use]
    pub fn get(&self, id: ProxyId) -> Option<RenderProxy> {
        self.proxies.get(&id).map(|proxy| proxy.value().clone())
    }

    /// Returns `true` if the proxy exists (orphaned or not).
    #[must_use]
    pub fn contains(&self, id: ProxyId) -> bool {
        self.proxies.contains_key(&id)
    }

    /// Returns the number of stored proxies, orphaned ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Returns `true` if no proxies are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Returns the number of proxies awaiting a sweep.
    #[must_use]
    pub fn orphaned_count(&self) -> usize {
        self.proxies.iter().filter(|p| p.orphaned).count()
    }

    /// Returns the drawable proxies (live and visible) ordered by ID.
    #[must_use]
    pub fn drawable(&self) -> Vec<RenderProxy> {
        let mut out: Vec<RenderProxy> = self
            .proxies
            .iter()
            .filter(|p| p.is_drawable())
            .map(|p| p.value().clone())
            .collect();
        out.sort_by_key(RenderProxy::id);
        out
    }
}

impl ProxySink for RenderScene {
    fn create_or_update(
        &self,
        proxy: ProxyId,
        update: ProxyUpdate,
    ) -> Result<ProxyWrite, ProxyError> {
        match self.proxies.entry(proxy) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                let revived = existing.orphaned;
                existing.state = update;
                existing.orphaned = false;
                existing.revision += 1;
                if revived {
                    debug!(proxy = %proxy, "orphaned proxy taken back");
                    Ok(ProxyWrite::Created)
                } else {
                    Ok(ProxyWrite::Updated)
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(RenderProxy::new(proxy, update));
                debug!(proxy = %proxy, "created proxy");
                Ok(ProxyWrite::Created)
            }
        }
    }

    fn mark_orphaned(&self, proxy: ProxyId) {
        if let Some(mut entry) = self.proxies.get_mut(&proxy) {
            entry.orphaned = true;
        }
    }

    fn sweep_orphaned(&self) -> usize {
        let mut swept = 0;
        self.proxies.retain(|_, proxy| {
            if proxy.orphaned {
                swept += 1;
                false
            } else {
                true
            }
        });
        if swept > 0 {
            debug!(swept, "swept orphaned proxies");
        }
        swept
    }
}
