use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set from the signal handler; only async-signal-safe work happens there.
static SIGNALLED: AtomicBool = AtomicBool::new(false);

/// Cooperative stop request, checked by the tick loop between ticks and by
/// sources while they wait for samples.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
    watch_signals: bool,
}

impl ShutdownFlag {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also trips on SIGINT, SIGTERM and SIGQUIT.
    pub fn with_signal_handlers() -> Self {
        install_handlers();
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            watch_signals: true,
        }
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst) || (self.watch_signals && SIGNALLED.load(Ordering::SeqCst))
    }
}

#[cfg(unix)]
fn install_handlers() {
    extern "C" fn handle_signal(_: libc::c_int) {
        SIGNALLED.store(true, Ordering::SeqCst);
    }

    for signal in [libc::SIGINT, libc::SIGTERM, libc::SIGQUIT] {
        // SAFETY: the handler only stores to an atomic.
        let installed = unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = handle_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(signal, &action, std::ptr::null_mut()) == 0
        };
        if !installed {
            log::warn!("Failed to install handler for signal {}", signal);
        }
    }
}

#[cfg(not(unix))]
fn install_handlers() {
    log::debug!("Signal handlers are not installed on this platform");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_shared_between_clones() {
        let flag = ShutdownFlag::new();
        let seen_by_loop = flag.clone();
        assert!(!seen_by_loop.is_requested());
        flag.request();
        assert!(seen_by_loop.is_requested());
    }
}
