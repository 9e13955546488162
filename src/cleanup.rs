//! Process-wide LIFO registry of signal-triggered teardown closures.
//!
//! Grounded on `original_source/cli/wat/cleanup.go`'s `createCleanup`: the
//! SIGINT/SIGTERM handler is installed lazily on first registration and
//! runs every registered closure, most-recently-registered first, before
//! the process exits with status 1.

use std::sync::{Mutex, OnceLock};

type CleanupFn = Box<dyn FnOnce() + Send + 'static>;

static REGISTRY: OnceLock<Mutex<Vec<CleanupFn>>> = OnceLock::new();
static HANDLER_INSTALLED: OnceLock<()> = OnceLock::new();

fn registry() -> &'static Mutex<Vec<CleanupFn>> {
    REGISTRY.get_or_init(|| Mutex::new(Vec::new()))
}

/// A handle whose `teardown` runs `f` and removes it from the LIFO list.
/// Running the same handle's teardown twice is a no-op the second time.
pub struct Cleanup {
    ran: bool,
    id: usize,
}

impl Cleanup {
    /// Runs the registered closure now (normal exit path) instead of
    /// waiting for a signal.
    pub fn teardown(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if self.ran {
            return;
        }
        self.ran = true;
        let mut guard = registry().lock().unwrap();
        if self.id < guard.len() {
            let f = std::mem::replace(&mut guard[self.id], Box::new(|| {}));
            drop(guard);
            f();
        }
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        self.run();
    }
}

/// Registers `f` to run on SIGINT/SIGTERM (LIFO relative to other
/// registrations) or when the returned handle's `teardown` runs, whichever
/// happens first. Installs the process-wide signal handler on first call.
pub fn register<F: FnOnce() + Send + 'static>(f: F) -> Cleanup {
    HANDLER_INSTALLED.get_or_init(|| {
        let _ = ctrlc::set_handler(|| {
            run_all_on_signal();
            std::process::exit(1);
        });
    });

    let mut guard = registry().lock().unwrap();
    let id = guard.len();
    guard.push(Box::new(f));
    Cleanup { ran: false, id }
}

fn run_all_on_signal() {
    let mut guard = registry().lock().unwrap();
    for f in guard.drain(..).rev() {
        f();
    }
}
