//! The process-wide asset store
//!
//! The engine shell installs one store at startup, loads it once, reads from it
//! every frame, and shuts it down on exit. The slot is thread-local: only the
//! thread that installed the store (the main/render thread) can reach it, and
//! any other thread sees an empty slot. Sharing across threads needs explicit
//! synchronization by the caller.
//!
//! The closures passed to [`with_store`] and [`with_store_mut`] must not call
//! back into this module.

use crate::backend::NativeBackend;
use crate::store::AssetStore;
use log::info;
use std::cell::RefCell;

/// Store type held in the process-wide slot
pub type SharedStore = AssetStore<Box<dyn NativeBackend>>;

thread_local! {
    static STORE: RefCell<Option<SharedStore>> = const { RefCell::new(None) };
}

/// Install `store` as the process-wide store, returning the one it replaces.
pub fn install(store: SharedStore) -> Option<SharedStore> {
    STORE.with(|slot| slot.borrow_mut().replace(store))
}

pub fn is_installed() -> bool {
    STORE.with(|slot| slot.borrow().is_some())
}

/// Run `f` against the installed store. `None` if nothing is installed.
pub fn with_store<R>(f: impl FnOnce(&SharedStore) -> R) -> Option<R> {
    STORE.with(|slot| slot.borrow().as_ref().map(f))
}

/// Run `f` against the installed store mutably. `None` if nothing is installed.
pub fn with_store_mut<R>(f: impl FnOnce(&mut SharedStore) -> R) -> Option<R> {
    STORE.with(|slot| slot.borrow_mut().as_mut().map(f))
}

/// Dispose and remove the installed store. Returns false if none was installed.
pub fn shutdown() -> bool {
    let store = STORE.with(|slot| slot.borrow_mut().take());
    match store {
        Some(mut store) => {
            store.dispose();
            info!("Asset store shut down");
            true
        }
        None => false,
    }
}
