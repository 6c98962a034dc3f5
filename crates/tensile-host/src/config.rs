use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{HostError, HostResult};

/// Platform file name for the engine module.
#[inline]
pub fn default_module_file() -> &'static str {
    if cfg!(target_os = "windows") {
        "tensile_engine.dll"
    } else if cfg!(target_os = "macos") {
        "libtensile_engine.dylib"
    } else {
        "libtensile_engine.so"
    }
}

/// Host startup configuration.
/// All fields have concrete defaults; a missing config file is not an error.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Well-known plugin directory holding the engine module.
    pub plugin_dir: PathBuf,
    /// Module file name, matched exactly by the change watcher.
    pub module_file: String,

    pub ground_height: f32,
    pub request_uvs: bool,

    pub tick_hz: u32,
    pub watch: bool,
    pub debounce_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            plugin_dir: PathBuf::from("plugins"),
            module_file: default_module_file().to_owned(),
            ground_height: 0.0,
            request_uvs: true,
            tick_hz: 60,
            watch: true,
            debounce_ms: 100,
        }
    }
}

impl HostConfig {
    #[inline]
    pub fn module_path(&self) -> PathBuf {
        self.plugin_dir.join(&self.module_file)
    }

    /// Loads the JSON config file, layering present fields over defaults.
    pub fn load_json(path: &Path) -> HostResult<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path).map_err(|e| HostError::Config {
            path: path.to_path_buf(),
            message: format!("read failed: {e}"),
        })?;

        Self::from_json_str(&data).map_err(|message| HostError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_json_str(data: &str) -> Result<Self, String> {
        let parsed: RootJson = serde_json::from_str(data).map_err(|e| format!("parse failed: {e}"))?;

        let mut cfg = Self::default();
        if let Some(module) = parsed.module {
            if let Some(dir) = module.dir {
                cfg.plugin_dir = PathBuf::from(dir);
            }
            if let Some(file) = module.file {
                cfg.module_file = file;
            }
            if let Some(watch) = module.watch {
                cfg.watch = watch;
            }
            if let Some(ms) = module.debounce_ms {
                cfg.debounce_ms = ms;
            }
        }
        if let Some(host) = parsed.host {
            if let Some(v) = host.ground_height {
                cfg.ground_height = v;
            }
            if let Some(v) = host.request_uvs {
                cfg.request_uvs = v;
            }
            if let Some(v) = host.tick_hz {
                cfg.tick_hz = v;
            }
        }
        Ok(cfg)
    }
}

#[derive(Deserialize)]
struct RootJson {
    module: Option<ModuleJson>,
    host: Option<HostJson>,
}

#[derive(Deserialize)]
struct ModuleJson {
    dir: Option<String>,
    file: Option<String>,
    watch: Option<bool>,
    debounce_ms: Option<u64>,
}

#[derive(Deserialize)]
struct HostJson {
    ground_height: Option<f32>,
    request_uvs: Option<bool>,
    tick_hz: Option<u32>,
}
