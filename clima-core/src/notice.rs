//! Transient, non-blocking user notices.

use std::{fmt::Debug, time::Duration};

use crate::error::ClimaError;

pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    NoGps,
    PermissionDenied,
    FetchFailed,
    NoLocation,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::NoGps => "Gps not available.",
            Notice::PermissionDenied => {
                "You won't be able to see location.. Go to settings and change location preferences."
            }
            Notice::FetchFailed => "Network or server error.",
            Notice::NoLocation => "No location yet.",
        }
    }
}

impl From<&ClimaError> for Notice {
    fn from(err: &ClimaError) -> Self {
        match err {
            ClimaError::PermissionDenied => Notice::PermissionDenied,
            ClimaError::FetchFailed(_) => Notice::FetchFailed,
            ClimaError::NoLocation => Notice::NoLocation,
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Host-side channel that shows a notice for `duration` and then dismisses it.
pub trait Notifier: Send + Debug {
    fn notify(&mut self, notice: Notice, duration: Duration);
}
