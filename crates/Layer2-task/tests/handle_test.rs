//! Handle integration tests - waiters, progress and failure fidelity
//!
//! `cargo test -p gfe-task --test handle_test`

use gfe_foundation::{Placement, ProgressCounter};
use gfe_task::{AsyncTaskHandle, TaskError, TaskOutcome, WorkError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("region {region} needs {needed} bytes, {available} left")]
struct RegionTooLarge {
    region: u32,
    needed: u32,
    available: u32,
}

fn reserve(region: u32, needed: u32) -> Result<(), RegionTooLarge> {
    Err(RegionTooLarge {
        region,
        needed,
        available: 100,
    })
}

#[test]
fn test_counter_scenario() {
    let progress = Arc::new(ProgressCounter::new("dsg", 1));
    let shared = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&shared);

    let handle = AsyncTaskHandle::new(Placement::new(0, 0, 1), progress.clone(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    handle.start().unwrap();
    handle.wait().unwrap();

    assert_eq!(shared.load(Ordering::SeqCst), 1);
    assert_eq!(progress.count(), 1);
    assert!(progress.is_complete());
}

#[test]
fn test_bad_region_scenario() {
    let progress = Arc::new(ProgressCounter::new("dsg", 1));

    let expected_line = line!() + 2;
    let handle = AsyncTaskHandle::new(Placement::new(0, 0, 2), progress.clone(), || {
        Err(WorkError::msg("bad region"))
    });

    handle.start().unwrap();
    let err = handle.wait().unwrap_err();

    assert_eq!(err.to_string(), "bad region");
    let origin = err.origin().unwrap();
    assert_eq!(origin.file, file!());
    assert_eq!(origin.line, expected_line);
    assert_eq!(progress.count(), 0);
}

#[test]
fn test_error_value_survives_question_mark() {
    let progress = Arc::new(ProgressCounter::unbounded("dsg"));

    let expected_line = line!() + 2;
    let handle = AsyncTaskHandle::new(Placement::new(1, 1, 1), progress, || {
        reserve(2, 5000)?;
        Ok(())
    });

    handle.start().unwrap();
    let err = handle.wait().unwrap_err();
    let failure = err.failure().unwrap();

    assert_eq!(
        failure.downcast_ref::<RegionTooLarge>(),
        Some(&RegionTooLarge {
            region: 2,
            needed: 5000,
            available: 100,
        })
    );
    assert_eq!(failure.to_string(), "region 2 needs 5000 bytes, 100 left");
    assert_eq!(failure.origin().line, expected_line);
    assert!(!failure.is_panic());
}

#[test]
fn test_waiters_parked_before_completion() {
    let progress = Arc::new(ProgressCounter::unbounded("dsg"));
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let handle = AsyncTaskHandle::new(Placement::new(0, 1, 1), progress.clone(), move || {
        release_rx
            .recv()
            .map_err(|e| WorkError::msg(format!("release channel closed: {}", e)))?;
        Ok(())
    });
    handle.start().unwrap();

    thread::scope(|s| {
        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                s.spawn(move || handle.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());
        release_tx.send(()).unwrap();

        for waiter in waiters {
            assert!(waiter.join().unwrap().is_ok());
        }
    });

    assert_eq!(progress.count(), 1);
}

#[test]
fn test_waiters_share_one_failure() {
    let progress = Arc::new(ProgressCounter::unbounded("dsg"));
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let handle = AsyncTaskHandle::new(Placement::new(0, 1, 2), progress.clone(), move || {
        let _ = release_rx.recv();
        Err(WorkError::msg("bad region"))
    });
    handle.start().unwrap();

    let errors: Vec<TaskError> = thread::scope(|s| {
        let early: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                s.spawn(move || handle.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        release_tx.send(()).unwrap();

        let mut results: Vec<_> = early.into_iter().map(|w| w.join().unwrap()).collect();
        // Late waiters arrive after the outcome is recorded
        results.push(handle.wait());
        results.push(handle.wait());
        results.into_iter().map(|r| r.unwrap_err()).collect()
    });

    let first = errors[0].failure().unwrap();
    for err in &errors {
        let failure = err.failure().unwrap();
        assert!(failure.same_cause(first));
        assert_eq!(failure.to_string(), "bad region");
        assert_eq!(failure.origin(), first.origin());
    }
    assert_eq!(progress.count(), 0);
}

#[test]
fn test_failing_work_never_completes() {
    for round in 0..50 {
        let progress = Arc::new(ProgressCounter::unbounded("dsg"));
        let handle = AsyncTaskHandle::new(Placement::new(0, 0, round), progress.clone(), || {
            Err(WorkError::msg("bad region"))
        });

        thread::scope(|s| {
            handle.start().unwrap();
            let waiters: Vec<_> = (0..4)
                .map(|_| {
                    let handle = handle.clone();
                    s.spawn(move || handle.wait())
                })
                .collect();

            for waiter in waiters {
                assert!(matches!(waiter.join().unwrap(), Err(TaskError::Work(_))));
            }
        });

        assert!(matches!(handle.outcome(), TaskOutcome::Failed(_)));
        assert_eq!(progress.count(), 0);
    }
}

#[test]
fn test_progress_counts_only_successes() {
    let progress = Arc::new(ProgressCounter::new("dsg", 32));

    let handles: Vec<_> = (0..64u32)
        .map(|p| {
            AsyncTaskHandle::new(Placement::new(0, 0, p), progress.clone(), move || {
                if p % 2 == 0 {
                    Ok(())
                } else {
                    Err(WorkError::msg(format!("bad region on core {}", p)))
                }
            })
        })
        .collect();

    for handle in &handles {
        handle.start().unwrap();
    }

    // Extra waiters must not change the count
    for handle in &handles {
        let first = handle.wait().is_ok();
        let second = handle.wait().is_ok();
        assert_eq!(first, second);
        assert_eq!(first, handle.context().p % 2 == 0);
    }

    assert_eq!(progress.count(), 32);
    assert!(progress.is_complete());
}

#[test]
fn test_terminal_outcome_is_stable() {
    let progress = Arc::new(ProgressCounter::unbounded("dsg"));
    let handle = AsyncTaskHandle::new(Placement::new(3, 3, 3), progress.clone(), || Ok(()));

    assert!(handle.outcome().is_pending());
    handle.start().unwrap();
    handle.wait().unwrap();
    let finished_at = handle.finished_at();

    for _ in 0..10 {
        assert!(handle.outcome().is_success());
        assert!(handle.wait().is_ok());
    }
    assert_eq!(handle.finished_at(), finished_at);
    assert_eq!(progress.count(), 1);
    assert!(handle.start().unwrap_err().is_misuse());
}
