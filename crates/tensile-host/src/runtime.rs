use std::sync::Arc;
use std::time::Duration;

use tensile_native::{EntryPointTable, NativeModule};

use crate::colliders::ColliderProxy;
use crate::config::HostConfig;
use crate::error::{HostError, HostResult};
use crate::host::SimulationHost;
use crate::queue::MainThreadQueue;
use crate::watcher::ChangeWatcher;

/// Ties the pieces together on the host tick thread: the module mapping, the
/// task queue, the optional file watcher, and the simulation host.
///
/// Data flow on reload: ChangeWatcher -> MainThreadQueue -> `reload_module`
/// -> fresh `EntryPointTable` -> `SimulationHost::on_reload`. The watcher
/// thread only ever posts; every mutation happens inside [`tick`](Self::tick).
pub struct HostRuntime {
    module: NativeModule,
    queue: MainThreadQueue<HostRuntime>,
    host: SimulationHost,
    _watcher: Option<ChangeWatcher>,
}

impl HostRuntime {
    /// Maps the module, binds its entry points, and prepares (but does not
    /// yet initialize) the simulation host.
    pub fn new(config: &HostConfig) -> HostResult<Self> {
        let mut module = NativeModule::new(config.module_path());
        module.load()?;
        let table = EntryPointTable::bind(&module)?;
        let host = SimulationHost::new(Box::new(table), config.ground_height, config.request_uvs);

        Ok(Self {
            module,
            queue: MainThreadQueue::new(),
            host,
            _watcher: None,
        })
    }

    /// Starts watching the module's backing file for replacement. Each
    /// debounced change posts one reload request onto the queue.
    pub fn watch(&mut self, debounce: Duration) -> HostResult<()> {
        let path = self.module.path();
        let dir = path.parent().ok_or_else(|| HostError::WatchFailure {
            path: path.to_path_buf(),
            message: "module path has no parent directory".to_owned(),
        })?;
        let file_name = path.file_name().ok_or_else(|| HostError::WatchFailure {
            path: path.to_path_buf(),
            message: "module path has no file name".to_owned(),
        })?;

        let sender = self.queue.sender();
        let watcher = ChangeWatcher::spawn(dir, file_name, debounce, move || {
            let posted = sender.post(|rt: &mut HostRuntime| rt.reload_module());
            if posted {
                log::info!("watcher: module change detected, reload queued");
            } else {
                log::warn!("watcher: reload request dropped, queue is gone");
            }
        })?;

        self._watcher = Some(watcher);
        Ok(())
    }

    /// First bring-up of the simulation with the given live collider set.
    pub fn start(&mut self, live: &[Arc<ColliderProxy>]) -> HostResult<()> {
        self.host.initialize(live)
    }

    /// One host tick: drain the queue (reloads run here, strictly before
    /// everything else), then run the simulation tick.
    pub fn tick(&mut self, live: &[Arc<ColliderProxy>]) {
        for task in self.queue.take_pending() {
            task(self);
        }
        self.host.tick(live);
    }

    #[inline]
    pub fn host(&self) -> &SimulationHost {
        &self.host
    }

    #[inline]
    pub fn host_mut(&mut self) -> &mut SimulationHost {
        &mut self.host
    }

    #[inline]
    pub fn module(&self) -> &NativeModule {
        &self.module
    }

    /// Swaps in the freshly written module and resynchronizes the host.
    ///
    /// Only ever invoked from a drained queue task. A missing backing file
    /// is detected before anything is discarded, so the host keeps its last
    /// successful configuration; once the old mapping has been unloaded any
    /// further failure is a double failure and the host is disabled — the
    /// stale entry points must never be called again.
    pub fn reload_module(&mut self) {
        let path = self.module.path().to_path_buf();
        if !path.is_file() {
            log::warn!(
                "reload: module file missing, keeping current module: '{}'",
                path.display()
            );
            return;
        }

        log::info!("reload: remapping '{}'", path.display());
        self.module.unload();

        if let Err(e) = self.module.load() {
            log::error!("reload: {e}");
            self.host.disable("module load failed during reload");
            return;
        }

        let table = match EntryPointTable::bind(&self.module) {
            Ok(table) => table,
            Err(e) => {
                log::error!("reload: {e}");
                self.host.disable("entry point binding failed during reload");
                return;
            }
        };

        if self.host.on_reload(Box::new(table), &[]).is_err() {
            // Host is already disabled; the failure was logged there.
            log::error!(
                "reload: re-initialization failed against generation {}",
                self.module.generation()
            );
        }
    }

    /// Tears down the host and unmaps the module.
    pub fn shutdown(&mut self) {
        self.host.release();
        self._watcher = None;
        self.module.unload();
    }
}
