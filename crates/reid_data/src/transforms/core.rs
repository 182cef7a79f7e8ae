use anyhow::{Context, Result};
use std::marker::PhantomData;
use std::sync::Arc;

/// Defines the core `Transform` trait for composable preprocessing pipelines.
///
/// The `Transform<I, O>` trait represents an operation converting an input of
/// type `I` to an output of type `O`. Steps are chained via `.then(...)` into a
/// single statically-typed pipeline.
///
/// Note: `then()` works only when:
/// 1. **Types align**: `self: Transform<I, O>`, `next: Transform<O, M>`
/// 2. **Owned**: `Self::Sized` (no trait objects, must be concrete)
/// 3. **Thread-safe**: intermediate and output types must be `Send`
///
/// Random transforms draw from the batch RNG (see `dataloader::init_batch_rng`),
/// so `apply` only needs `&self` and a pipeline can be shared across workers.
pub trait Transform<I, O>: Send + Sync {
    /// Applies the transformation to the input
    fn apply(&self, input: I) -> Result<O>;

    #[inline]
    fn then<T, M>(self, next: T) -> Chain<Self, T, O>
    where
        Self: Sized,
        T: Transform<O, M>,
        O: Send,
        M: Send,
    {
        Chain {
            first: self,
            second: next,
            _marker: PhantomData,
        }
    }
}

/// A chain of two transforms (`A` -> `B`)
/// - `PhantomData<M>` enforces intermediate type alignment.
#[derive(Debug)]
pub struct Chain<A, B, M> {
    first: A,
    second: B,
    _marker: PhantomData<fn() -> M>,
}

impl<A, B, M> Chain<A, B, M> {
    /// Creates a new transform chain.
    /// Use [`Transform::then`] for better ergonomics.
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            _marker: PhantomData,
        }
    }
}

impl<I, M, O, A, B> Transform<I, O> for Chain<A, B, M>
where
    A: Transform<I, M>,
    B: Transform<M, O>,
    M: Send,
{
    fn apply(&self, input: I) -> Result<O> {
        let mid = self.first.apply(input)?;
        self.second.apply(mid).with_context(|| {
            format!(
                "Transform step failed: {}",
                short_type_name(std::any::type_name::<B>())
            )
        })
    }
}

/// An optional step: `None` passes the input through untouched.
///
/// Lets a pipeline switch augmentations on or off from configuration while
/// keeping a single concrete type.
impl<X, T> Transform<X, X> for Option<T>
where
    T: Transform<X, X>,
    X: Send,
{
    fn apply(&self, input: X) -> Result<X> {
        match self {
            Some(transform) => transform.apply(input),
            None => Ok(input),
        }
    }
}

impl<I, O, T> Transform<I, O> for Box<T>
where
    T: Transform<I, O> + ?Sized,
{
    fn apply(&self, input: I) -> Result<O> {
        (**self).apply(input)
    }
}

impl<I, O, T> Transform<I, O> for Arc<T>
where
    T: Transform<I, O> + ?Sized,
{
    fn apply(&self, input: I) -> Result<O> {
        (**self).apply(input)
    }
}

/// `reid_data::transforms::vision::io::LoadImage` -> `LoadImage`
fn short_type_name(full: &str) -> &str {
    let head = full.split('<').next().unwrap_or(full);
    head.rsplit("::").next().unwrap_or(head)
}
