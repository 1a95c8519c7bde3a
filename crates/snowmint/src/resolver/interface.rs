use core::fmt;

/// A strategy that hands out sequence numbers for a millisecond.
///
/// Given the current time unit (milliseconds since the Unix epoch), a
/// resolver returns a sequence number that no other caller observing the same
/// time unit receives. Returning a value at or above the layout's maximum
/// sequence tells the generator the millisecond is exhausted; it then waits
/// for the clock to advance and asks again.
///
/// Custom resolvers can back the sequence with an external counter service.
/// Their errors reach the generator's caller unchanged, wrapped in
/// [`Error::Resolver`].
///
/// [`Error::Resolver`]: crate::Error::Resolver
pub trait SequenceResolver {
    /// The error type returned by [`SequenceResolver::resolve`].
    type Err: core::error::Error + 'static;

    /// Returns the sequence number for `millis`.
    ///
    /// # Errors
    ///
    /// Implementation specific. The built-in [`AtomicResolver`] never fails.
    ///
    /// [`AtomicResolver`]: crate::AtomicResolver
    fn resolve(&self, millis: u64) -> Result<u64, Self::Err>;
}

impl<R: SequenceResolver + ?Sized> SequenceResolver for std::sync::Arc<R> {
    type Err = R::Err;

    fn resolve(&self, millis: u64) -> Result<u64, Self::Err> {
        (**self).resolve(millis)
    }
}

/// A [`SequenceResolver`] built from a closure. See [`resolver_fn`].
#[derive(Clone, Copy)]
pub struct FnResolver<F> {
    f: F,
}

impl<F> fmt::Debug for FnResolver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}

impl<F, E> SequenceResolver for FnResolver<F>
where
    F: Fn(u64) -> Result<u64, E>,
    E: core::error::Error + 'static,
{
    type Err = E;

    fn resolve(&self, millis: u64) -> Result<u64, Self::Err> {
        (self.f)(millis)
    }
}

/// Wraps a closure as a [`SequenceResolver`].
///
/// # Example
///
/// ```
/// use snowmint::{EpochConfig, Error, SnowflakeGenerator, resolver_fn};
///
/// #[derive(Debug, PartialEq, thiserror::Error)]
/// #[error("counter service unavailable")]
/// struct Unavailable;
///
/// let generator = SnowflakeGenerator::new(EpochConfig::default())?
///     .with_resolver(resolver_fn(|_millis| Err(Unavailable)));
///
/// assert_eq!(generator.try_next_id(), Err(Error::Resolver(Unavailable)));
/// # Ok::<(), snowmint::ConfigError>(())
/// ```
pub fn resolver_fn<F, E>(f: F) -> FnResolver<F>
where
    F: Fn(u64) -> Result<u64, E>,
    E: core::error::Error + 'static,
{
    FnResolver { f }
}
