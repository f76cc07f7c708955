//! Open file descriptor limit handling.
//!
//! The walker keeps the handles of every directory between the root and the
//! current position open, so RLIMIT_NOFILE bounds how deep a tree can be
//! processed.

use std::io;

/// Descriptors assumed to be in use outside the walk (stdin, stdout, stderr).
pub const RESERVED_DESCRIPTORS: u64 = 3;

/// Descriptors the walker holds per open directory level: the directory
/// handle and its enumeration stream.
pub const HANDLES_PER_LEVEL: u64 = 2;

/// Soft and hard descriptor limits; `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorLimit {
    pub current: Option<u64>,
    pub maximum: Option<u64>,
}

impl DescriptorLimit {
    pub const UNLIMITED: Self = Self {
        current: None,
        maximum: None,
    };
}

/// Access to the process descriptor limit.
pub trait LimitControl {
    fn get(&self) -> io::Result<DescriptorLimit>;
    fn set(&self, limit: DescriptorLimit) -> io::Result<()>;
}

/// RLIMIT_NOFILE of the running process.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLimits;

#[cfg(unix)]
impl LimitControl for ProcessLimits {
    fn get(&self) -> io::Result<DescriptorLimit> {
        let limit = rustix::process::getrlimit(rustix::process::Resource::Nofile);
        Ok(DescriptorLimit {
            current: limit.current,
            maximum: limit.maximum,
        })
    }

    fn set(&self, limit: DescriptorLimit) -> io::Result<()> {
        rustix::process::setrlimit(
            rustix::process::Resource::Nofile,
            rustix::process::Rlimit {
                current: limit.current,
                maximum: limit.maximum,
            },
        )
        .map_err(io::Error::from)
    }
}

/// Result of [`raise_descriptor_limit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitOutcome {
    /// Both limits are now unlimited.
    Unlimited,
    /// The soft limit ended up at `effective`; `raised` tells whether it
    /// moved at all.
    Capped { effective: Option<u64>, raised: bool },
    /// The limits could not even be read.
    Unknown { reason: String },
}

impl LimitOutcome {
    /// Deepest directory level that can be walked without running out of
    /// descriptors, `None` when unbounded or unknown.
    #[must_use]
    pub fn max_safe_depth(&self) -> Option<u16> {
        match self {
            LimitOutcome::Capped {
                effective: Some(limit),
                ..
            } => {
                let levels = limit.saturating_sub(RESERVED_DESCRIPTORS) / HANDLES_PER_LEVEL;
                // The root itself takes a level.
                Some(u16::try_from(levels.saturating_sub(1)).unwrap_or(u16::MAX))
            }
            _ => None,
        }
    }
}

/// Raise the descriptor limit as far as permissions allow.
///
/// Tries to lift both limits entirely, then falls back to raising the soft
/// limit up to the hard one. Never fails; the resulting depth ceiling is
/// logged as a warning when it is bounded or unknown.
pub fn raise_descriptor_limit<L: LimitControl>(control: &L) -> LimitOutcome {
    if control.set(DescriptorLimit::UNLIMITED).is_ok() {
        log::debug!("RLIMIT_NOFILE raised to unlimited");
        return LimitOutcome::Unlimited;
    }

    let limit = match control.get() {
        Ok(limit) => limit,
        Err(err) => {
            log::warn!(
                "The maximum directory tree depth that will be processed without errors is: <unknown>"
            );
            log::warn!("It depends on RLIMIT_NOFILE that we can't fetch: {err}");
            return LimitOutcome::Unknown {
                reason: err.to_string(),
            };
        }
    };

    // Lifting the hard limit needs privileges we apparently lack; match the
    // soft limit to the hard one instead.
    let raised_to = DescriptorLimit {
        current: limit.maximum,
        maximum: limit.maximum,
    };
    let outcome = if limit.current != limit.maximum && control.set(raised_to).is_ok() {
        LimitOutcome::Capped {
            effective: limit.maximum,
            raised: true,
        }
    } else {
        LimitOutcome::Capped {
            effective: limit.current,
            raised: false,
        }
    };

    match outcome.max_safe_depth() {
        Some(depth) => log::warn!(
            "The maximum directory tree depth that will be processed without errors is: {depth}"
        ),
        None => log::debug!("RLIMIT_NOFILE soft limit is unlimited"),
    }
    outcome
}
