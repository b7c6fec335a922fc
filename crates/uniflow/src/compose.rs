//! Right-to-left function composition.

/// A single composition stage.
pub type ComposeFn<T> = Box<dyn Fn(T) -> T + Send>;

/// Compose single-argument functions from right to left.
///
/// The rightmost function runs first on the seed value; each preceding stage
/// receives the return value of the one to its right. An empty list yields
/// the identity function; a single function is returned as-is, unwrapped.
/// Nothing is cached between invocations.
pub fn compose<T: 'static>(fns: Vec<ComposeFn<T>>) -> ComposeFn<T> {
    let mut fns = fns.into_iter();
    let Some(first) = fns.next() else {
        return Box::new(|value| value);
    };
    fns.fold(first, |outer, inner| Box::new(move |value| outer(inner(value))))
}
