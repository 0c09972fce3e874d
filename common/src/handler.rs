//! [`Handler`] abstractions.

use std::{future::Future, sync::Arc};

/// Executable handler.
///
/// Commands, queries, storage operations and remote API calls are all
/// expressed as a [`Handler`] of their arguments.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

impl<T, Args> Handler<Args> for Arc<T>
where
    T: Handler<Args> + ?Sized,
{
    type Ok = T::Ok;
    type Err = T::Err;

    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>> {
        (**self).execute(args)
    }
}
