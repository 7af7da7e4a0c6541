//! The draw generator: uniform integers for calls, cards, and pacing.
//!
//! Determinism is intentionally absent: the draws exist for game fairness,
//! not reproducibility, and production paths always use the thread-local
//! CSPRNG. Each function has a `_with` twin taking an explicit RNG so tests
//! can pass a seeded `StdRng`; nothing outside tests should.
//!
//! # Caller contract
//!
//! `unique` and `excluding` use rejection sampling and therefore do not
//! terminate if the caller asks for more distinct values than the range
//! holds (`count > max - min + 1`, or an exclusion list covering the whole
//! range). That precondition is the caller's to guarantee; these functions
//! do not check it at runtime.

use rand::Rng;

/// Draws one integer uniformly from the inclusive range `[min, max]`.
pub fn in_range(min: u8, max: u8) -> u8 {
    in_range_with(&mut rand::rng(), min, max)
}

/// [`in_range`] with an explicit RNG.
pub fn in_range_with<R: Rng + ?Sized>(rng: &mut R, min: u8, max: u8) -> u8 {
    rng.random_range(min..=max)
}

/// Draws `count` distinct integers from `[min, max]`, in draw order.
///
/// Rejection sampling: duplicates are redrawn until `count` distinct values
/// have been collected. See the module docs for the range-size contract.
pub fn unique(min: u8, max: u8, count: usize) -> Vec<u8> {
    unique_with(&mut rand::rng(), min, max, count)
}

/// [`unique`] with an explicit RNG.
pub fn unique_with<R: Rng + ?Sized>(rng: &mut R, min: u8, max: u8, count: usize) -> Vec<u8> {
    let mut picked = Vec::with_capacity(count);
    while picked.len() < count {
        let n = rng.random_range(min..=max);
        if !picked.contains(&n) {
            picked.push(n);
        }
    }
    picked
}

/// Draws one integer from `[min, max]` that is not in `excluded`.
///
/// Same rejection sampling and the same caller contract: `excluded` must
/// not cover the entire range.
pub fn excluding(min: u8, max: u8, excluded: &[u8]) -> u8 {
    excluding_with(&mut rand::rng(), min, max, excluded)
}

/// [`excluding`] with an explicit RNG.
pub fn excluding_with<R: Rng + ?Sized>(rng: &mut R, min: u8, max: u8, excluded: &[u8]) -> u8 {
    loop {
        let n = rng.random_range(min..=max);
        if !excluded.contains(&n) {
            return n;
        }
    }
}
