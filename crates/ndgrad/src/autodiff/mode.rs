//! Differentiation mode flags.
//!
//! Reverse-mode (graph recording) and forward-mode (tangent propagation) are
//! switched independently. The switches are global to everything running on
//! one thread: the current [`GradMode`] lives in a thread-local, so toggling
//! it on one thread has no effect on another. Code that needs a fixed mode
//! regardless of the calling thread passes one explicitly through
//! [`pass_to_graph_with`](crate::autodiff::pass_to_graph_with).
//!
//! Both modes start enabled on each thread unless overridden through the
//! `NDGRAD_GRAD_ENABLED` / `NDGRAD_FORWARD_AD_ENABLED` environment variables.
//! With forward mode on, every operation output carries a tangent (zeros
//! when no input was seeded).
//!
//! # Example
//!
//! ```
//! use ndgrad::autodiff::{GradMode, is_grad_enabled, no_grad, set_grad_enabled};
//!
//! assert!(is_grad_enabled());
//! no_grad(|| assert!(!is_grad_enabled()));
//!
//! {
//!     let _guard = set_grad_enabled(false);
//!     assert!(!GradMode::current().reverse);
//! }
//! assert!(is_grad_enabled());
//! ```

use std::cell::Cell;

/// Environment variable overriding the initial reverse-mode flag.
pub const GRAD_ENABLED_ENV: &str = "NDGRAD_GRAD_ENABLED";
/// Environment variable overriding the initial forward-mode flag.
pub const FORWARD_AD_ENABLED_ENV: &str = "NDGRAD_FORWARD_AD_ENABLED";

/// Which differentiation modes record state during an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradMode {
    /// Attach graph nodes to outputs of inputs that require gradients.
    pub reverse: bool,
    /// Propagate tangents through every operation.
    pub forward: bool,
}

impl GradMode {
    /// Both modes enabled.
    pub const ENABLED: GradMode = GradMode {
        reverse: true,
        forward: true,
    };

    /// Both modes disabled.
    pub const DISABLED: GradMode = GradMode {
        reverse: false,
        forward: false,
    };

    /// Defaults read from the environment; unset variables mean enabled.
    pub fn from_env() -> Self {
        GradMode {
            reverse: flag_from_env(GRAD_ENABLED_ENV),
            forward: flag_from_env(FORWARD_AD_ENABLED_ENV),
        }
    }

    /// Mode in effect on the current thread.
    pub fn current() -> Self {
        MODE.with(Cell::get)
    }

    /// Run `f` with this mode in effect, restoring the previous one after.
    pub fn scoped<R>(self, f: impl FnOnce() -> R) -> R {
        let _guard = set_mode(self);
        f()
    }
}

impl Default for GradMode {
    fn default() -> Self {
        GradMode::ENABLED
    }
}

thread_local! {
    static MODE: Cell<GradMode> = Cell::new(GradMode::from_env());
}

/// Restores the previous [`GradMode`] when dropped.
#[derive(Debug)]
#[must_use = "the mode is restored as soon as the guard is dropped"]
pub struct ModeGuard {
    previous: GradMode,
}

impl Drop for ModeGuard {
    fn drop(&mut self) {
        MODE.with(|m| m.set(self.previous));
    }
}

/// Replace the whole mode until the guard drops.
pub fn set_mode(mode: GradMode) -> ModeGuard {
    let previous = MODE.with(|m| m.replace(mode));
    ModeGuard { previous }
}

/// Enable or disable reverse-mode recording until the guard drops.
pub fn set_grad_enabled(enabled: bool) -> ModeGuard {
    set_mode(GradMode {
        reverse: enabled,
        ..GradMode::current()
    })
}

/// Enable or disable forward-mode propagation until the guard drops.
pub fn set_forward_ad_enabled(enabled: bool) -> ModeGuard {
    set_mode(GradMode {
        forward: enabled,
        ..GradMode::current()
    })
}

/// Whether reverse-mode recording is enabled on this thread.
pub fn is_grad_enabled() -> bool {
    GradMode::current().reverse
}

/// Whether forward-mode propagation is enabled on this thread.
pub fn is_forward_ad_enabled() -> bool {
    GradMode::current().forward
}

/// Run `f` without recording reverse-mode graph nodes.
pub fn no_grad<R>(f: impl FnOnce() -> R) -> R {
    let _guard = set_grad_enabled(false);
    f()
}

/// Run `f` with reverse-mode recording enabled.
pub fn enable_grad<R>(f: impl FnOnce() -> R) -> R {
    let _guard = set_grad_enabled(true);
    f()
}

/// Run `f` without propagating tangents.
pub fn no_forward_ad<R>(f: impl FnOnce() -> R) -> R {
    let _guard = set_forward_ad_enabled(false);
    f()
}

fn flag_from_env(name: &str) -> bool {
    match std::env::var(name) {
        Ok(value) => !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "off"
        ),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards_nest() {
        let _reset = set_mode(GradMode::ENABLED);
        {
            let _outer = set_grad_enabled(false);
            assert!(!is_grad_enabled());
            {
                let _inner = set_grad_enabled(true);
                assert!(is_grad_enabled());
            }
            assert!(!is_grad_enabled());
        }
        assert!(is_grad_enabled());
    }

    #[test]
    fn test_flags_are_independent() {
        let _reset = set_mode(GradMode::ENABLED);
        no_forward_ad(|| {
            assert!(is_grad_enabled());
            assert!(!is_forward_ad_enabled());
        });
        no_grad(|| {
            assert!(!is_grad_enabled());
            assert!(is_forward_ad_enabled());
        });
    }

    #[test]
    fn test_scoped_returns_value() {
        let mode = GradMode::DISABLED.scoped(GradMode::current);
        assert_eq!(mode, GradMode::DISABLED);
    }

    #[test]
    fn test_modes_are_thread_local() {
        let _guard = set_mode(GradMode::DISABLED);
        let other = std::thread::spawn(GradMode::current).join().unwrap();
        assert_eq!(other, GradMode::from_env());
        assert_eq!(GradMode::current(), GradMode::DISABLED);
    }
}
