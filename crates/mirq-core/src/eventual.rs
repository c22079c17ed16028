//! Possibly-async values.
//!
//! The interpreter must accept both plain values and deferred values at
//! every interior step: attribute reads, method returns, authorizer
//! answers, collection elements. [`Eventual`] is the sum of the two.
//! Combinators stay in the `Ready` branch until the first suspension, so a
//! fully synchronous walk never allocates a future; once a step suspends,
//! the rest of the computation continues inside a then-chain.
//!
//! Everything here is single-threaded cooperative: futures are
//! [`LocalBoxFuture`]s, there are no `Send` bounds and no executors.

use crate::error::InvokeError;
use futures::future::{join_all, LocalBoxFuture};
use std::collections::VecDeque;
use std::future::Future;

/// Outcome of a computation that may suspend.
pub enum Eventual<T> {
    /// The computation finished without suspending.
    Ready(Result<T, InvokeError>),
    /// The rest of the computation, boxed at the first suspension point.
    Later(LocalBoxFuture<'static, Result<T, InvokeError>>),
}

impl<T: std::fmt::Debug> std::fmt::Debug for Eventual<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Eventual::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Eventual::Later(_) => f.debug_tuple("Later").field(&"<future>").finish(),
        }
    }
}

impl<T: 'static> Eventual<T> {
    /// A settled success.
    pub fn ready(value: T) -> Self {
        Eventual::Ready(Ok(value))
    }

    /// A settled failure.
    pub fn fail(error: InvokeError) -> Self {
        Eventual::Ready(Err(error))
    }

    /// A settled result of either kind.
    pub fn of(result: Result<T, InvokeError>) -> Self {
        Eventual::Ready(result)
    }

    /// Defer the computation into a boxed single-threaded future.
    pub fn later<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, InvokeError>> + 'static,
    {
        Eventual::Later(Box::pin(future))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Eventual::Ready(_))
    }

    /// The settled result, if the computation never suspended.
    pub fn into_ready(self) -> Option<Result<T, InvokeError>> {
        match self {
            Eventual::Ready(result) => Some(result),
            Eventual::Later(_) => None,
        }
    }

    /// Await the result, settled or not.
    pub async fn resolve(self) -> Result<T, InvokeError> {
        match self {
            Eventual::Ready(result) => result,
            Eventual::Later(future) => future.await,
        }
    }

    /// Continue with `f` once this value settles, errors included.
    ///
    /// On the `Ready` branch `f` runs immediately and the result keeps its
    /// value kind; on the `Later` branch the continuation is chained onto
    /// the pending future.
    pub fn then<U, F>(self, f: F) -> Eventual<U>
    where
        U: 'static,
        F: FnOnce(Result<T, InvokeError>) -> Eventual<U> + 'static,
    {
        match self {
            Eventual::Ready(result) => f(result),
            Eventual::Later(future) => {
                Eventual::later(async move { f(future.await).resolve().await })
            }
        }
    }

    /// Continue with `f` on success; failures short-circuit.
    pub fn and_then<U, F>(self, f: F) -> Eventual<U>
    where
        U: 'static,
        F: FnOnce(T) -> Eventual<U> + 'static,
    {
        self.then(|result| match result {
            Ok(value) => f(value),
            Err(error) => Eventual::fail(error),
        })
    }

    /// Transform a successful value in place.
    pub fn map<U, F>(self, f: F) -> Eventual<U>
    where
        U: 'static,
        F: FnOnce(T) -> U + 'static,
    {
        self.and_then(|value| Eventual::ready(f(value)))
    }

    /// Join many eventuals, preserving positional order.
    ///
    /// An all-settled input stays settled. Otherwise the deferred members
    /// are polled concurrently and their suspension points interleave; the
    /// output order still matches the input order. Every member runs to
    /// completion before the first failure (if any) is reported.
    pub fn all(items: Vec<Eventual<T>>) -> Eventual<Vec<T>> {
        if items.iter().any(|item| !item.is_ready()) {
            return Eventual::later(async move {
                join_all(items.into_iter().map(Eventual::resolve))
                    .await
                    .into_iter()
                    .collect()
            });
        }
        let results: Result<Vec<T>, InvokeError> = items
            .into_iter()
            .filter_map(Eventual::into_ready)
            .collect();
        Eventual::Ready(results)
    }

    /// Map items strictly in order: each invocation of `f` starts only
    /// after the previous result settled. A failure stops the fold.
    pub fn map_in_order<S, F>(items: Vec<S>, f: F) -> Eventual<Vec<T>>
    where
        S: 'static,
        F: FnMut(S) -> Eventual<T> + 'static,
    {
        map_in_order_step(items.into(), Vec::new(), f)
    }
}

fn map_in_order_step<S, T, F>(
    mut queue: VecDeque<S>,
    mut done: Vec<T>,
    mut f: F,
) -> Eventual<Vec<T>>
where
    S: 'static,
    T: 'static,
    F: FnMut(S) -> Eventual<T> + 'static,
{
    let Some(item) = queue.pop_front() else {
        return Eventual::ready(done);
    };
    f(item).and_then(move |value| {
        done.push(value);
        map_in_order_step(queue, done, f)
    })
}
