//! Offline detection, queried once per attempt.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Reports whether the host currently has network connectivity.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Default for hosts without a connectivity signal.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Shareable online/offline switch driven by the host.
///
/// Clones observe the same state.
#[derive(Clone, Debug)]
pub struct ConnectivityFlag {
    online: Arc<AtomicBool>,
}

impl ConnectivityFlag {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for ConnectivityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
