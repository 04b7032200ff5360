//! Panic origin capture
//!
//! A panic payload carries the message but not the location. A process-wide
//! hook, chained in front of whatever hook was installed before, stores the
//! location of the latest panic on the panicking thread so the worker can
//! attach it to the failure.

use crate::failure::{Origin, WorkError};
use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

thread_local! {
    static LAST_PANIC: RefCell<Option<Origin>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// Install the origin-recording hook. Idempotent.
///
/// The hook only records locations while it stays installed: a hook set
/// later with [`std::panic::set_hook`] replaces it and failures from panics
/// get [`Origin::unknown`]. `resume_unwind` does not run the hook either, so
/// a work item that re-raises a payload it caught itself is reported at
/// the original panic, or at an unknown origin if that panic was outside
/// the work item.
pub fn install_origin_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if let Some(location) = info.location() {
                let origin = Origin::from_location(location);
                let _ = LAST_PANIC.try_with(|slot| *slot.borrow_mut() = Some(origin));
            }
            previous(info);
        }));
    });
}

fn take_panic_origin() -> Option<Origin> {
    LAST_PANIC.try_with(|slot| slot.borrow_mut().take()).ok().flatten()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "work item panicked".to_string()
    }
}

/// Run `work`, turning a panic into a `WorkError` located at the panic site
pub(crate) fn run_caught<F>(work: F) -> Result<(), WorkError>
where
    F: FnOnce() -> Result<(), WorkError>,
{
    install_origin_hook();
    let _ = take_panic_origin();

    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => result,
        Err(payload) => {
            let origin = take_panic_origin().unwrap_or_else(Origin::unknown);
            Err(WorkError::from_panic(panic_message(payload.as_ref()), origin))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_and_err_pass_through() {
        assert!(run_caught(|| Ok(())).is_ok());

        let error = run_caught(|| Err(WorkError::msg("bad region"))).unwrap_err();
        assert_eq!(error.to_string(), "bad region");
        assert!(!error.is_panic());
    }

    #[test]
    fn test_panic_is_located() {
        let expected = line!() + 1;
        let error = run_caught(|| panic!("bad region {}", 3)).unwrap_err();

        assert!(error.is_panic());
        assert_eq!(error.to_string(), "bad region 3");
        assert_eq!(error.origin().file, file!());
        assert_eq!(error.origin().line, expected);
    }

    #[test]
    fn test_resume_unwind_has_unknown_origin() {
        let error = run_caught(|| std::panic::resume_unwind(Box::new("region lost"))).unwrap_err();

        assert!(error.is_panic());
        assert_eq!(error.to_string(), "region lost");
        assert!(!error.origin().is_known());
    }

    #[test]
    fn test_non_string_payload() {
        let error = run_caught(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(error.to_string(), "work item panicked");
    }
}
