//! Error types used throughout the `dsp_loader` library.
//!
//! Per-record relocation problems are reported through the diagnostics sink
//! and counted on the loader state; they never abort a load on their own.
//! The variants here cover the library-level failures that a caller must
//! handle through `Result`.

use alloc::borrow::Cow;
use core::fmt::{Debug, Display};

#[derive(Debug)]
pub enum Error {
    /// Relocation of an object image failed.
    ///
    /// Returned by [`LoaderState::finish`](crate::LoaderState::finish) when
    /// one or more relocation records were reported as bad during the load.
    Relocation {
        /// A descriptive message about the relocation failure.
        msg: Cow<'static, str>,
    },

    /// A section reference was invalid.
    ///
    /// This error typically indicates that the upstream section directory and
    /// the relocation stream disagree, e.g. a section index out of range.
    Section {
        /// A descriptive message about the section error.
        msg: Cow<'static, str>,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Relocation { msg } => write!(f, "relocation error: {msg}"),
            Error::Section { msg } => write!(f, "section error: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

/// Creates a relocation error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn relocate_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Relocation { msg: msg.into() }
}

/// Creates a section error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn section_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Section { msg: msg.into() }
}
