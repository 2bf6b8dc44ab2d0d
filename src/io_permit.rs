use std::sync::{Condvar, Mutex};

/// Counting semaphore shared by the split phase's reader and writer.
///
/// In HDD mode it is constructed with a single permit so reads and writes
/// never overlap, preserving sequential head motion. In SSD mode it is
/// constructed with a large permit count, which is equivalent to no
/// serialization at all.
pub(crate) struct IoPermit {
    available: Mutex<usize>,
    condvar: Condvar,
}

impl IoPermit {
    pub(crate) fn new(permits: usize) -> IoPermit {
        IoPermit {
            available: Mutex::new(permits),
            condvar: Condvar::new(),
        }
    }

    pub(crate) fn acquire(&self) {
        let mut guard = self.available.lock().unwrap();
        while *guard == 0 {
            guard = self.condvar.wait(guard).unwrap();
        }
        *guard -= 1;
    }

    pub(crate) fn release(&self) {
        let mut guard = self.available.lock().unwrap();
        *guard += 1;
        self.condvar.notify_one();
    }

    /// Acquires a permit and hands back an RAII guard that releases it on
    /// drop. Callers that hold a permit across a region with fallible `?`
    /// exits (cancellation checks, I/O) should hold the guard rather than
    /// calling `acquire`/`release` directly, so an early return can never
    /// strand the permit.
    pub(crate) fn acquire_guard(&self) -> IoPermitGuard<'_> {
        self.acquire();
        IoPermitGuard { permit: self, released: false }
    }
}

/// RAII handle for one [`IoPermit`] permit. Releases on drop unless
/// [`IoPermitGuard::release`] was already called.
pub(crate) struct IoPermitGuard<'a> {
    permit: &'a IoPermit,
    released: bool,
}

impl<'a> IoPermitGuard<'a> {
    /// Releases the permit now, e.g. before blocking on a channel send that
    /// should not hold up other I/O-permit waiters.
    pub(crate) fn release(mut self) {
        self.permit.release();
        self.released = true;
    }
}

impl Drop for IoPermitGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.permit.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn hdd_permit_serializes_two_threads() {
        let permit = Arc::new(IoPermit::new(1));
        let order = Arc::new(Mutex::new(Vec::new()));

        let p1 = Arc::clone(&permit);
        let o1 = Arc::clone(&order);
        let t1 = thread::spawn(move || {
            p1.acquire();
            o1.lock().unwrap().push(1);
            thread::sleep(Duration::from_millis(30));
            o1.lock().unwrap().push(2);
            p1.release();
        });

        thread::sleep(Duration::from_millis(10));
        permit.acquire();
        order.lock().unwrap().push(3);
        permit.release();

        t1.join().unwrap();
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn ssd_permit_allows_concurrency() {
        let permit = IoPermit::new(100);
        permit.acquire();
        permit.acquire();
        permit.release();
        permit.release();
    }

    #[test]
    fn guard_releases_on_drop_without_explicit_release() {
        let permit = IoPermit::new(1);
        {
            let _guard = permit.acquire_guard();
            // Dropped here without calling `release()`, simulating an early
            // return via `?` out of a guarded region.
        }
        // The permit must already be back, so this does not block.
        permit.acquire();
        permit.release();
    }

    #[test]
    fn guard_release_hands_the_permit_back_immediately() {
        let permit = IoPermit::new(1);
        let guard = permit.acquire_guard();
        guard.release();
        permit.acquire();
        permit.release();
    }
}
