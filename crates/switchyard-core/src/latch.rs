use crate::LifecycleError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;
use switchyard_config::keys;
use switchyard_engine::{EngineError, Message, Processor};
use tracing::{debug, info};

/// One-shot, cross-thread shutdown trigger.
///
/// The latch starts armed and moves to triggered exactly once, on the first
/// recognized terminate signal. It never re-arms. Any number of threads may
/// wait on it; all of them are released by the trigger.
#[derive(Debug)]
pub struct ShutdownLatch {
    count: AtomicUsize,
    terminate: String,
    parked: Mutex<()>,
    released: Condvar,
}

impl ShutdownLatch {
    pub fn new(terminate: impl Into<String>) -> Self {
        Self {
            count: AtomicUsize::new(1),
            terminate: terminate.into(),
            parked: Mutex::new(()),
            released: Condvar::new(),
        }
    }

    pub fn terminate_tag(&self) -> &str {
        &self.terminate
    }

    /// Trigger the latch if `tag` is the terminate signal.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn signal(&self, tag: &str) -> bool {
        if !tag.eq_ignore_ascii_case(&self.terminate) {
            debug!("ignoring signal '{tag}'");
            return false;
        }
        if self
            .count
            .compare_exchange(1, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        info!("termination signal received");
        // Taking the lock orders the store above against waiters that have
        // checked the count but not yet parked.
        let _guard = self
            .parked
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.released.notify_all();
        true
    }

    pub fn is_shutdown(&self) -> bool {
        self.count.load(Ordering::SeqCst) == 0
    }

    /// Block until the latch is triggered.
    pub fn wait(&self) -> Result<(), LifecycleError> {
        if self.is_shutdown() {
            return Ok(());
        }
        let guard = self.parked.lock().map_err(|_| interrupted())?;
        let _guard = self
            .released
            .wait_while(guard, |()| !self.is_shutdown())
            .map_err(|_| interrupted())?;
        Ok(())
    }

    /// Block for at most `millis` milliseconds. Returns whether the latch was
    /// triggered; a timeout leaves it armed.
    pub fn wait_timeout(&self, millis: u64) -> Result<bool, LifecycleError> {
        if self.is_shutdown() {
            return Ok(true);
        }
        if millis == 0 {
            return Ok(false);
        }
        let guard = self.parked.lock().map_err(|_| interrupted())?;
        let (_guard, _result) = self
            .released
            .wait_timeout_while(guard, Duration::from_millis(millis), |()| {
                !self.is_shutdown()
            })
            .map_err(|_| interrupted())?;
        Ok(self.is_shutdown())
    }
}

impl Default for ShutdownLatch {
    fn default() -> Self {
        Self::new(keys::DEFAULT_SIG_TERMINATE)
    }
}

fn interrupted() -> LifecycleError {
    LifecycleError::Interrupted("shutdown latch waiter lock poisoned".to_owned())
}

impl Processor for ShutdownLatch {
    fn process(&self, message: &Message) -> Result<(), EngineError> {
        if let Some(tag) = message.header(keys::SIGNAL_HEADER) {
            self.signal(tag);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn starts_armed() {
        let latch = ShutdownLatch::new("terminate");
        assert!(!latch.is_shutdown());
        assert!(!latch.wait_timeout(0).unwrap());
    }

    #[test]
    fn only_terminate_triggers() {
        let latch = ShutdownLatch::new("terminate");
        assert!(!latch.signal("configure"));
        assert!(!latch.signal(""));
        assert!(!latch.is_shutdown());
        assert!(latch.signal("TERMINATE"));
        assert!(latch.is_shutdown());
    }

    #[test]
    fn trigger_is_idempotent() {
        let latch = ShutdownLatch::new("terminate");
        assert!(latch.signal("terminate"));
        assert!(!latch.signal("terminate"));
        assert!(latch.is_shutdown());
        assert!(latch.wait_timeout(0).unwrap());
    }

    #[test]
    fn timeout_leaves_latch_armed() {
        let latch = ShutdownLatch::new("terminate");
        let start = Instant::now();
        assert!(!latch.wait_timeout(50).unwrap());
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(!latch.is_shutdown());
    }

    #[test]
    fn concurrent_senders_trigger_once() {
        let latch = Arc::new(ShutdownLatch::new("terminate"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let latch = Arc::clone(&latch);
                thread::spawn(move || latch.signal("terminate"))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert!(latch.is_shutdown());
    }

    #[test]
    fn waiters_are_released() {
        let latch = Arc::new(ShutdownLatch::new("terminate"));
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let latch = Arc::clone(&latch);
                thread::spawn(move || latch.wait_timeout(5_000).unwrap())
            })
            .collect();
        let blocking = {
            let latch = Arc::clone(&latch);
            thread::spawn(move || latch.wait())
        };

        thread::sleep(Duration::from_millis(20));
        latch.signal("terminate");

        for w in waiters {
            assert!(w.join().unwrap());
        }
        blocking.join().unwrap().unwrap();
    }

    #[test]
    fn poisoned_waiter_lock_interrupts_waits() {
        let latch = Arc::new(ShutdownLatch::new("terminate"));
        let holder = Arc::clone(&latch);
        let panicked = thread::spawn(move || {
            let _guard = holder.parked.lock().unwrap();
            panic!("waiter lock holder died");
        })
        .join();
        assert!(panicked.is_err());

        assert!(matches!(latch.wait(), Err(LifecycleError::Interrupted(_))));
        assert!(matches!(
            latch.wait_timeout(10),
            Err(LifecycleError::Interrupted(_))
        ));
        assert!(!latch.is_shutdown());

        // Triggering still works and releases later waiters.
        assert!(latch.signal("terminate"));
        latch.wait().unwrap();
        assert!(latch.wait_timeout(10).unwrap());
    }

    #[test]
    fn processor_reads_signal_header() {
        let latch = ShutdownLatch::default();
        latch
            .process(&Message::empty().with_header("signal", "configure"))
            .unwrap();
        assert!(!latch.is_shutdown());
        latch.process(&Message::empty()).unwrap();
        assert!(!latch.is_shutdown());
        latch
            .process(&Message::empty().with_header("signal", "terminate"))
            .unwrap();
        assert!(latch.is_shutdown());
    }
}
