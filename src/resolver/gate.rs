//! Single-flight gate for expensive extractions.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A capacity-one permit that is never waited on.
///
/// `try_acquire` either hands out the permit or reports that it is held.
/// The permit is released when the returned guard is dropped, which happens
/// exactly once on every exit path of the guarded code.
#[derive(Clone)]
pub struct SingleFlightGate {
    permits: Arc<Semaphore>,
}

/// Proof of holding the gate. Dropping it releases the gate.
#[derive(Debug)]
pub struct SingleFlightPermit {
    _permit: OwnedSemaphorePermit,
}

impl SingleFlightGate {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Take the permit if nobody holds it. Never blocks.
    pub fn try_acquire(&self) -> Option<SingleFlightPermit> {
        self.permits
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| SingleFlightPermit { _permit: permit })
    }

    /// Whether the permit is currently held.
    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

impl Default for SingleFlightGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let gate = SingleFlightGate::new();
        let first = gate.try_acquire();
        let second = gate.try_acquire();

        assert!(first.is_some());
        assert!(second.is_none());
        assert!(gate.is_busy());
    }

    #[test]
    fn drop_releases() {
        let gate = SingleFlightGate::new();
        {
            let _permit = gate.try_acquire().unwrap();
            assert!(gate.is_busy());
        }
        assert!(!gate.is_busy());
        assert!(gate.try_acquire().is_some());
    }

    #[tokio::test]
    async fn concurrent_acquires_succeed_once() {
        let gate = SingleFlightGate::new();
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let gate = gate.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                let permit = gate.try_acquire();
                // Hold whatever we got until both tasks have tried.
                barrier.wait().await;
                permit.is_some()
            }));
        }

        let mut acquired = 0;
        for handle in handles {
            if handle.await.unwrap() {
                acquired += 1;
            }
        }
        assert_eq!(acquired, 1);
        assert!(!gate.is_busy());
    }

    #[tokio::test]
    async fn released_when_guarded_task_panics() {
        let gate = SingleFlightGate::new();
        let task_gate = gate.clone();

        let result = tokio::spawn(async move {
            let _permit = task_gate.try_acquire().unwrap();
            panic!("extraction blew up");
        })
        .await;

        assert!(result.is_err());
        assert!(!gate.is_busy());
    }
}
