//! Error plumbing shared by the `tsdbput` crates.
//!
//! Library crates expose typed errors (built with `snafu`) at their boundaries. Anything above that, such as wiring
//! an encoder together from configuration or driving it from the command line, deals in [`GenericError`].
#![deny(warnings)]
#![deny(missing_docs)]

use std::fmt::Display;

/// An opaque, type-erased error.
pub type GenericError = anyhow::Error;

pub(crate) mod private {
    pub trait Sealed {}

    impl<T, E> Sealed for Result<T, E> {}
}

// `anyhow::Context` is wrapped so its extension methods don't collide with `snafu::ResultExt` in modules that use both.
/// Extension methods for attaching context to fallible results.
pub trait ErrorContext<T, E>: private::Sealed {
    /// Wraps the error with the given context.
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static;

    /// Wraps the error with context that is only built if an error actually occurred.
    fn with_error_context<C, F>(self, f: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T, E> for Result<T, E>
where
    Result<T, E>: anyhow::Context<T, E>,
{
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
    {
        <Self as anyhow::Context<T, E>>::context(self, context)
    }

    fn with_error_context<C, F>(self, f: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        <Self as anyhow::Context<T, E>>::with_context(self, f)
    }
}
