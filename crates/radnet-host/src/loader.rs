//! Dynamic loading of the runtime hosting library.

use crate::abi::{
    RuntimeCreateDelegateFn, RuntimeInitializeFn, RuntimeShutdownFn, CREATE_DELEGATE_SYMBOL,
    INITIALIZE_SYMBOL, SHUTDOWN_SYMBOL,
};
use crate::error::{HostError, Result};
use chrono::{DateTime, Utc};
use libloading::Library;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The resolved hosting entry points. Each is independently optional:
/// a symbol the library does not export stays `None` and fails only
/// when something actually needs it.
#[derive(Debug, Default)]
pub(crate) struct RuntimeApi {
    pub initialize: Option<RuntimeInitializeFn>,
    pub create_delegate: Option<RuntimeCreateDelegateFn>,
    pub shutdown: Option<RuntimeShutdownFn>,
}

/// A runtime hosting library, held mapped for the lifetime of the
/// bridge instance that loaded it.
#[derive(Debug)]
pub struct LoadedRuntime {
    api: RuntimeApi,
    path: PathBuf,
    loaded_at: DateTime<Utc>,
    /// Keeps the library mapped; the pointers in `api` stay valid
    /// exactly as long as this field lives.
    _library: Library,
}

impl LoadedRuntime {
    /// Opens the runtime library and resolves the hosting symbols.
    ///
    /// The path may be a bare library name, in which case the system
    /// loader's search path applies. Unix loads use immediate,
    /// process-global resolution: runtime libraries expect their own
    /// exports visible to code they load later.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading runtime library");

        let library = open_library(path).map_err(|e| HostError::LibraryLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let api = RuntimeApi {
            initialize: resolve_symbol::<RuntimeInitializeFn>(&library, INITIALIZE_SYMBOL),
            create_delegate: resolve_symbol::<RuntimeCreateDelegateFn>(
                &library,
                CREATE_DELEGATE_SYMBOL,
            ),
            shutdown: resolve_symbol::<RuntimeShutdownFn>(&library, SHUTDOWN_SYMBOL),
        };

        info!(path = %path.display(), "runtime library loaded");
        Ok(Self {
            api,
            path: path.to_path_buf(),
            loaded_at: Utc::now(),
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub(crate) fn api(&self) -> &RuntimeApi {
        &self.api
    }
}

fn resolve_symbol<T: Copy>(library: &Library, name: &'static str) -> Option<T> {
    // SAFETY: T is one of the hosting function pointer aliases and the
    // resolved symbol is only ever called through that signature.
    let symbol = unsafe { library.get::<T>(name.as_bytes()) };
    match symbol {
        Ok(symbol) => {
            debug!(symbol = name, "resolved hosting symbol");
            Some(*symbol)
        }
        Err(e) => {
            warn!(symbol = name, error = %e, "hosting symbol not found");
            None
        }
    }
}

#[cfg(unix)]
fn open_library(path: &Path) -> std::result::Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};
    // SAFETY: loading a library runs its initializers; the path comes
    // from configuration the operator controls.
    unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_GLOBAL) }.map(Library::from)
}

#[cfg(not(unix))]
fn open_library(path: &Path) -> std::result::Result<Library, libloading::Error> {
    // SAFETY: as above.
    unsafe { Library::new(path) }
}
