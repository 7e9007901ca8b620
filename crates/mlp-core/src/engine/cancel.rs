//! Token de cancelación compartido entre coordinador y executor.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        let mut flag = lock.lock().unwrap_or_else(|p| p.into_inner());
        *flag = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Espera hasta `timeout` o hasta que se cancele. Devuelve `true` si se
    /// canceló.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(|p| p.into_inner());
        let (guard, _) = cvar.wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
                             .unwrap_or_else(|p| p.into_inner());
        *guard
    }
}
