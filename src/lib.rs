//! # quofilter
//!
//! `quofilter` is a quotient filter: a space-efficient probabilistic data structure for
//! approximate membership queries in a set. Like a Bloom filter it admits false positives but
//! never false negatives; unlike a Bloom filter it additionally supports deletion, resizing, and
//! ordered iteration over the stored fingerprints, and each logical entry occupies one contiguous
//! open-addressed slot which makes it considerably more cache-friendly.
//!
//! The crate is split into two layers. [`fingerprint::FingerprintFilter`] is the low-level
//! engine: a bit-packed table keyed by integer fingerprints with the classical
//! `is_occupied`/`is_continuation`/`is_shifted` metadata scheme. [`quotient::QuotientFilter`] is
//! the typed wrapper that hashes keys down to fingerprints and rebuilds the engine when the
//! maximum load factor is exceeded.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! quofilter = "*"
//! ```
//!
//! ```
//! use quofilter::quotient::QuotientFilter;
//!
//! let mut filter = QuotientFilter::<String>::new(100);
//!
//! filter.insert("foo").unwrap();
//! assert!(filter.contains("foo"));
//!
//! filter.remove("foo");
//! assert!(!filter.contains("foo"));
//! ```
//!
//! ## References
//!
//!  - [Don't Thrash: How to Cache Your Hash on Flash](https://dl.acm.org/doi/10.14778/2350229.2350275)
//!  > Bender, Michael A., Martin Farach-Colton, Rob Johnson, Russell Kraner, Bradley C. Kuszmaul,
//!  > Dzejla Medjedovic, Pablo Montes, Pradeep Shetty, Richard P. Spillane, and Erez Zadok. 2012.
//!  > "Don't Thrash: How to Cache Your Hash on Flash." *Proc. VLDB Endow.* 5 (11): 1627–37.
//!  - [Compact Hash Tables Using Bidirectional Linear Probing](https://ieeexplore.ieee.org/document/1676499)
//!  > Cleary, John G. 1984. "Compact Hash Tables Using Bidirectional Linear Probing." *IEEE
//!  > Trans. Computers* 33 (9): 828–34.

#![warn(missing_docs)]

pub mod bit_vec;
pub mod fingerprint;
pub mod packed_vec;
pub mod quotient;
mod util;

use rand::Rng;
use siphasher::sip::SipHasher;
use std::fmt;
use std::hash::BuildHasher;

/// The error type for filter operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// Every slot of the filter is in use and the fingerprint to insert is not already present.
    Full,
    /// Reaching the requested capacity would leave no bits for the remainder; the fingerprint
    /// width is too small for the filter to grow any further.
    CapacityOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Full => write!(f, "filter is full"),
            Error::CapacityOverflow => write!(
                f,
                "fingerprint bits cannot accommodate the requested capacity"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A hasher builder that builds `SipHasher`s with the given keys.
///
/// # Examples
///
/// ```
/// use quofilter::quotient::QuotientFilter;
/// use quofilter::SipHasherBuilder;
///
/// let filter = QuotientFilter::<String>::with_hasher(100, SipHasherBuilder::from_entropy());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SipHasherBuilder {
    k0: u64,
    k1: u64,
}

impl SipHasherBuilder {
    /// Constructs a `SipHasherBuilder` with keys drawn from the thread-local RNG.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::SipHasherBuilder;
    ///
    /// let hasher_builder = SipHasherBuilder::from_entropy();
    /// ```
    pub fn from_entropy() -> Self {
        let mut rng = rand::thread_rng();
        Self::from_seed(rng.gen(), rng.gen())
    }

    /// Constructs a `SipHasherBuilder` with the given keys. Two builders constructed from the
    /// same keys produce identical fingerprints, which is useful for deterministic tests and for
    /// comparing filters.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::SipHasherBuilder;
    ///
    /// let hasher_builder = SipHasherBuilder::from_seed(0, 0);
    /// ```
    pub fn from_seed(k0: u64, k1: u64) -> Self {
        SipHasherBuilder { k0, k1 }
    }
}

impl BuildHasher for SipHasherBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new_with_keys(self.k0, self.k1)
    }
}
