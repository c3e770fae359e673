//! Process-wide engine runtime guard.
//!
//! The engine runtime can only exist once per process, while several
//! bridges may be alive at the same time. Holding a [`RuntimeGuard`]
//! keeps the runtime up; it is brought up when the first guard is
//! acquired and torn down when the last one drops.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct RuntimeState {
    active: usize,
    initializations: u64,
}

static STATE: Lazy<Mutex<RuntimeState>> = Lazy::new(Mutex::default);

/// Shared hold on the engine runtime.
#[derive(Debug)]
pub struct RuntimeGuard(());

impl RuntimeGuard {
    pub fn acquire() -> Self {
        let mut state = STATE.lock();
        if state.active == 0 {
            state.initializations += 1;
            log::debug!("engine runtime up");
        }
        state.active += 1;
        Self(())
    }

    /// Number of guards currently alive in this process.
    pub fn active() -> usize {
        STATE.lock().active
    }

    /// Times the runtime has been brought up over the process lifetime.
    pub fn initializations() -> u64 {
        STATE.lock().initializations
    }
}

impl Drop for RuntimeGuard {
    fn drop(&mut self) {
        let mut state = STATE.lock();
        state.active -= 1;
        if state.active == 0 {
            log::debug!("engine runtime down");
        }
    }
}
