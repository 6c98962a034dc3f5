use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NativeError {
    #[error("module not found: {path:?}")]
    NotFound { path: PathBuf },

    #[error("module load failed: {path:?}: {source}")]
    LoadFailure {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("symbol not found: '{symbol}'")]
    SymbolNotFound { symbol: &'static str },

    #[error("entry point binding failed: missing '{symbol}'")]
    BindingFailure { symbol: &'static str },
}

pub type NativeResult<T> = Result<T, NativeError>;
