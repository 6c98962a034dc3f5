#![forbid(unsafe_op_in_unsafe_fn)]

use std::path::{Path, PathBuf};

use libloading::Library;

use crate::error::{NativeError, NativeResult};

/// Owns the lifetime of one mapped native module.
///
/// Load/unload form an idempotent state machine. Unloading invalidates every
/// pointer resolved from the current mapping; holders of an
/// [`EntryPointTable`](crate::EntryPointTable) must drop it (and never call
/// through it) once the module that produced it is unloaded. That contract,
/// not the loader, is what prevents use-after-unload.
pub struct NativeModule {
    path: PathBuf,
    lib: Option<Library>,
    generation: u64,
}

impl NativeModule {
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lib: None,
            generation: 0,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.lib.is_some()
    }

    /// Number of successful loads so far. Symbols resolved under one
    /// generation are invalid in every later one.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Maps the module. Calling while already loaded is a no-op success.
    pub fn load(&mut self) -> NativeResult<()> {
        if self.lib.is_some() {
            return Ok(());
        }

        if !self.path.is_file() {
            return Err(NativeError::NotFound {
                path: self.path.clone(),
            });
        }

        let lib = unsafe { Library::new(&self.path) }.map_err(|e| NativeError::LoadFailure {
            path: self.path.clone(),
            source: e,
        })?;

        self.lib = Some(lib);
        self.generation += 1;
        log::info!(
            "module: loaded '{}' (generation {})",
            self.path.display(),
            self.generation
        );
        Ok(())
    }

    /// Releases the OS mapping. Safe to call when already unloaded.
    pub fn unload(&mut self) {
        if self.lib.take().is_some() {
            log::info!("module: unloaded '{}'", self.path.display());
        }
    }

    /// Resolves one exported symbol from the currently loaded mapping.
    ///
    /// `symbol` must be a null-terminated byte literal. The returned pointer
    /// is only valid for the current generation.
    pub fn resolve<T: Copy>(&self, symbol: &'static [u8]) -> NativeResult<T> {
        let Some(lib) = self.lib.as_ref() else {
            return Err(NativeError::SymbolNotFound {
                symbol: symbol_name(symbol),
            });
        };

        let sym = unsafe { lib.get::<T>(symbol) }.map_err(|_| NativeError::SymbolNotFound {
            symbol: symbol_name(symbol),
        })?;

        Ok(*sym)
    }
}

impl Drop for NativeModule {
    fn drop(&mut self) {
        self.unload();
    }
}

/// Strips the trailing NUL for diagnostics.
pub(crate) fn symbol_name(symbol: &'static [u8]) -> &'static str {
    let bytes = symbol.strip_suffix(b"\0").unwrap_or(symbol);
    std::str::from_utf8(bytes).unwrap_or("<non-utf8 symbol>")
}
