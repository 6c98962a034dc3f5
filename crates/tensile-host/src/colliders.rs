use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use tensile_native::{ColliderShape, EngineApi, Pose, SimHandle};

use crate::error::HostError;

/// Native collider id meaning "not registered with the engine".
pub const UNREGISTERED: i32 = -1;

/// Host-side description of one shape mirrored into the engine as a
/// collider.
///
/// Shared as `Arc<ColliderProxy>`; identity is pointer identity. Scene
/// collaborators own the `Arc` and update the pose; dropping the last owner
/// is how a proxy is destroyed, and the registry notices on its next
/// reconciliation pass.
pub struct ColliderProxy {
    shape: ColliderShape,
    pose: Mutex<Pose>,
    native_id: AtomicI32,
}

impl ColliderProxy {
    pub fn new(shape: ColliderShape, pose: Pose) -> Arc<Self> {
        Arc::new(Self {
            shape,
            pose: Mutex::new(pose),
            native_id: AtomicI32::new(UNREGISTERED),
        })
    }

    #[inline]
    pub fn shape(&self) -> ColliderShape {
        self.shape
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        *self.pose.lock()
    }

    #[inline]
    pub fn set_pose(&self, pose: Pose) {
        *self.pose.lock() = pose;
    }

    /// Engine-assigned id, or [`UNREGISTERED`]. Valid only within the module
    /// generation that assigned it.
    #[inline]
    pub fn native_id(&self) -> i32 {
        self.native_id.load(Ordering::Relaxed)
    }

    #[inline]
    fn set_native_id(&self, id: i32) {
        self.native_id.store(id, Ordering::Relaxed);
    }
}

struct Tracked {
    proxy: Weak<ColliderProxy>,
    /// Last id the engine assigned. Kept here so a proxy that was dropped by
    /// the scene can still be removed engine-side during pruning.
    native_id: i32,
}

/// Reconciles the host's set of live collision proxies against engine-side
/// collider registrations.
///
/// All mutation happens on the host tick thread; no internal locking is
/// provided. No two tracked entries ever share a native id.
#[derive(Default)]
pub struct ColliderRegistry {
    tracked: Vec<Tracked>,
}

impl ColliderRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// One reconciliation pass: prune dead proxies (paired with an engine
    /// remove for every valid id), register live proxies that are not yet
    /// tracked, then push the current pose of every tracked proxy.
    ///
    /// A failed registration leaves the proxy untracked and is retried on
    /// the next pass. A failed pose update is logged and the proxy stays
    /// tracked; continuous sync is best-effort.
    pub fn reconcile(
        &mut self,
        api: &dyn EngineApi,
        handle: SimHandle,
        live: &[Arc<ColliderProxy>],
    ) {
        self.prune(api, handle);

        for proxy in live {
            if !self.is_tracked(proxy) {
                self.add(api, handle, proxy);
            }
        }

        for entry in &self.tracked {
            let Some(proxy) = entry.proxy.upgrade() else {
                continue;
            };
            if !api.update_collider(handle, entry.native_id, &proxy.pose().mirrored()) {
                log::debug!(
                    "colliders: pose update failed for {} id {}",
                    proxy.shape().name(),
                    entry.native_id
                );
            }
        }
    }

    /// Registers one proxy with the engine. Also exposed directly for
    /// collaborators that create proxies outside the per-tick scan.
    ///
    /// Returns `false` when the engine refuses the registration (negative
    /// id); the proxy is left untracked so a later pass can retry.
    pub fn add(&mut self, api: &dyn EngineApi, handle: SimHandle, proxy: &Arc<ColliderProxy>) -> bool {
        if self.is_tracked(proxy) {
            return true;
        }

        let id = api.add_collider(handle, proxy.shape(), &proxy.pose().mirrored());
        if id < 0 {
            let e = HostError::RegistrationFailure {
                shape: proxy.shape(),
            };
            log::warn!("colliders: {e} (engine returned {id})");
            return false;
        }

        proxy.set_native_id(id);
        self.tracked.push(Tracked {
            proxy: Arc::downgrade(proxy),
            native_id: id,
        });
        log::debug!("colliders: registered {} as id {id}", proxy.shape().name());
        true
    }

    /// Unregisters one proxy, pairing the removal with an engine call before
    /// the id is discarded.
    pub fn remove(&mut self, api: &dyn EngineApi, handle: SimHandle, proxy: &Arc<ColliderProxy>) {
        let Some(index) = self
            .tracked
            .iter()
            .position(|e| e.proxy.as_ptr() == Arc::as_ptr(proxy))
        else {
            return;
        };

        let entry = self.tracked.remove(index);
        if entry.native_id >= 0 && !api.remove_collider(handle, entry.native_id) {
            log::warn!("colliders: engine remove failed for id {}", entry.native_id);
        }
        proxy.set_native_id(UNREGISTERED);
    }

    /// Re-registers every surviving tracked proxy against a fresh module
    /// generation. Old ids are meaningless and are not removed engine-side;
    /// the engine instance that owned them is gone.
    pub fn rebind(&mut self, api: &dyn EngineApi, handle: SimHandle) {
        let survivors: Vec<Arc<ColliderProxy>> = self
            .tracked
            .drain(..)
            .filter_map(|e| e.proxy.upgrade())
            .collect();

        for proxy in &survivors {
            proxy.set_native_id(UNREGISTERED);
        }
        for proxy in &survivors {
            self.add(api, handle, proxy);
        }

        log::info!("colliders: re-registered {} proxies", self.tracked.len());
    }

    /// Forgets all tracking without engine calls; used on teardown when the
    /// module or handle backing the registrations is going away.
    pub fn reset(&mut self) {
        for entry in self.tracked.drain(..) {
            if let Some(proxy) = entry.proxy.upgrade() {
                proxy.set_native_id(UNREGISTERED);
            }
        }
    }

    fn prune(&mut self, api: &dyn EngineApi, handle: SimHandle) {
        self.tracked.retain(|entry| {
            if entry.proxy.strong_count() > 0 {
                return true;
            }
            if entry.native_id >= 0 && !api.remove_collider(handle, entry.native_id) {
                log::warn!(
                    "colliders: engine remove failed for pruned id {}",
                    entry.native_id
                );
            }
            false
        });
    }

    fn is_tracked(&self, proxy: &Arc<ColliderProxy>) -> bool {
        self.tracked
            .iter()
            .any(|e| e.proxy.as_ptr() == Arc::as_ptr(proxy))
    }
}
