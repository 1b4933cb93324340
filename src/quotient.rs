//! Space-efficient probabilistic data structure for approximate membership queries in a set.

use crate::fingerprint::{FingerprintFilter, FingerprintIter};
use crate::util;
use crate::{Error, SipHasherBuilder};
use std::borrow::Borrow;
use std::cmp;
use std::f64::consts;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::mem;

const DEFAULT_FINGERPRINT_BIT_COUNT: u8 = 64;
const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.8;
const MIN_MAX_LOAD_FACTOR: f64 = 0.05;
const MAX_MAX_LOAD_FACTOR: f64 = 1.0;

/// A space-efficient probabilistic data structure to test for membership in a set.
///
/// A quotient filter hashes each item to a fingerprint of a fixed number of bits and stores the
/// fingerprints in a [`FingerprintFilter`]. Because fingerprints are truncated hashes, distinct
/// items can collide: the filter reports false positives but never false negatives. Unlike a
/// Bloom filter it supports removal, and the table regrows automatically when the configured
/// maximum load factor would be exceeded: the fingerprint is resplit with one more quotient bit
/// and one fewer remainder bit, and every stored fingerprint is moved to a fresh table. The
/// number of fingerprint bits therefore bounds the filter at `2^(fingerprint_bits - 1)` items.
///
/// # Examples
///
/// ```
/// use quofilter::quotient::QuotientFilter;
///
/// let mut filter = QuotientFilter::<String>::new(100);
///
/// assert!(!filter.contains("foo"));
/// filter.insert("foo").unwrap();
/// assert!(filter.contains("foo"));
///
/// filter.remove("foo");
/// assert!(!filter.contains("foo"));
///
/// filter.clear();
/// assert!(filter.is_empty());
/// ```
#[derive(Clone)]
pub struct QuotientFilter<T, B = SipHasherBuilder> {
    filter: FingerprintFilter,
    fingerprint_bits: u8,
    fingerprint_mask: u64,
    max_load_factor: f64,
    hash_builder: B,
    _marker: PhantomData<T>,
}

impl<T> QuotientFilter<T> {
    /// Constructs a new, empty `QuotientFilter` that can hold at least `capacity` items before
    /// growing, using 64-bit fingerprints.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::<String>::new(100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self::with_hasher(capacity, SipHasherBuilder::from_entropy())
    }

    /// Constructs a new, empty `QuotientFilter` that can hold at least `capacity` items before
    /// growing, storing fingerprints of `fingerprint_bits` bits.
    ///
    /// # Panics
    ///
    /// Panics if `fingerprint_bits` is 0 or greater than 64, or if `capacity` cannot be reached
    /// with `fingerprint_bits`-bit fingerprints.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::<String>::with_fingerprint_bits(100, 16);
    /// ```
    pub fn with_fingerprint_bits(capacity: usize, fingerprint_bits: u8) -> Self {
        Self::with_fingerprint_bits_and_hasher(
            capacity,
            fingerprint_bits,
            SipHasherBuilder::from_entropy(),
        )
    }
}

impl<T, B> QuotientFilter<T, B>
where
    B: BuildHasher,
{
    fn get_mask(size: u8) -> u64 {
        if size == 64 {
            !0
        } else {
            (1u64 << size) - 1
        }
    }

    fn required_quotient_bits(capacity: usize) -> u8 {
        let mut quotient_bits = 0;
        while quotient_bits < 64 && (1usize << quotient_bits) < capacity {
            quotient_bits += 1;
        }
        quotient_bits
    }

    /// Constructs a new, empty `QuotientFilter` with the specified hasher builder that can hold
    /// at least `capacity` items before growing, using 64-bit fingerprints.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    /// use quofilter::SipHasherBuilder;
    ///
    /// let filter = QuotientFilter::<String>::with_hasher(100, SipHasherBuilder::from_entropy());
    /// ```
    pub fn with_hasher(capacity: usize, hash_builder: B) -> Self {
        Self::with_fingerprint_bits_and_hasher(capacity, DEFAULT_FINGERPRINT_BIT_COUNT, hash_builder)
    }

    /// Constructs a new, empty `QuotientFilter` with the specified fingerprint width and hasher
    /// builder that can hold at least `capacity` items before growing.
    ///
    /// # Panics
    ///
    /// Panics if `fingerprint_bits` is 0 or greater than 64, or if `capacity` cannot be reached
    /// with `fingerprint_bits`-bit fingerprints.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    /// use quofilter::SipHasherBuilder;
    ///
    /// let filter = QuotientFilter::<String>::with_fingerprint_bits_and_hasher(
    ///     100,
    ///     16,
    ///     SipHasherBuilder::from_entropy(),
    /// );
    /// ```
    pub fn with_fingerprint_bits_and_hasher(
        capacity: usize,
        fingerprint_bits: u8,
        hash_builder: B,
    ) -> Self {
        assert!(fingerprint_bits > 0);
        assert!(fingerprint_bits <= 64);
        let mut ret = QuotientFilter {
            filter: FingerprintFilter::default(),
            fingerprint_bits,
            fingerprint_mask: Self::get_mask(fingerprint_bits),
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            hash_builder,
            _marker: PhantomData,
        };
        if ret.reserve(capacity).is_err() {
            panic!("fingerprint bits cannot accommodate the requested capacity");
        }
        ret
    }

    fn fingerprint<U>(&self, item: &U) -> u64
    where
        T: Borrow<U>,
        U: Hash + ?Sized,
    {
        util::hash(&self.hash_builder, item) & self.fingerprint_mask
    }

    /// Inserts an item into the quotient filter. Returns `true` if its fingerprint was not
    /// already present.
    ///
    /// If the insertion would push the filter past its maximum load factor and the fingerprint
    /// is absent, the filter first regrows to the smallest valid slot count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityOverflow`](crate::Error::CapacityOverflow) if the required
    /// growth would leave no remainder bits. The filter is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::new(100);
    ///
    /// assert_eq!(filter.insert("foo"), Ok(true));
    /// assert_eq!(filter.insert("foo"), Ok(false));
    /// ```
    pub fn insert<U>(&mut self, item: &U) -> Result<bool, Error>
    where
        T: Borrow<U>,
        U: Hash + ?Sized,
    {
        let fingerprint = self.fingerprint(item);

        if self.len() + 1 > self.capacity() || self.filter.is_full() {
            // an item that is already present never triggers a regrowth
            if self.filter.contains(fingerprint) {
                return Ok(false);
            }
            self.reserve(self.len() + 1)?;
        }

        self.filter.insert(fingerprint)
    }

    /// Removes an item from the quotient filter. Returns `true` if its fingerprint was present.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// assert!(filter.remove("foo"));
    /// assert!(!filter.remove("foo"));
    /// ```
    pub fn remove<U>(&mut self, item: &U) -> bool
    where
        T: Borrow<U>,
        U: Hash + ?Sized,
    {
        let fingerprint = self.fingerprint(item);
        self.filter.erase(fingerprint)
    }

    /// Checks if an item is possibly in the quotient filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::new(100);
    ///
    /// assert!(!filter.contains("foo"));
    /// filter.insert("foo").unwrap();
    /// assert!(filter.contains("foo"));
    /// ```
    pub fn contains<U>(&self, item: &U) -> bool
    where
        T: Borrow<U>,
        U: Hash + ?Sized,
    {
        self.filter.contains(self.fingerprint(item))
    }

    /// Returns the number of times the item's fingerprint is stored, effectively 0 or 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// assert_eq!(filter.count("foo"), 1);
    /// assert_eq!(filter.count("bar"), 0);
    /// ```
    pub fn count<U>(&self, item: &U) -> usize
    where
        T: Borrow<U>,
        U: Hash + ?Sized,
    {
        self.filter.count(self.fingerprint(item))
    }

    /// Returns an ordered iterator positioned at the item's fingerprint, or `None` if the
    /// fingerprint is not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// assert!(filter.find("foo").is_some());
    /// assert!(filter.find("bar").is_none());
    /// ```
    pub fn find<U>(&self, item: &U) -> Option<FingerprintIter<'_>>
    where
        T: Borrow<U>,
        U: Hash + ?Sized,
    {
        self.filter.find(self.fingerprint(item))
    }

    /// Clears the quotient filter, removing all items. The slot count is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// filter.clear();
    ///
    /// assert!(!filter.contains("foo"));
    /// ```
    pub fn clear(&mut self) {
        self.filter.clear();
    }

    /// Returns the number of items in the quotient filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// assert_eq!(filter.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.filter.len()
    }

    /// Returns `true` if the quotient filter is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::<String>::new(100);
    ///
    /// assert!(filter.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
    }

    /// Returns the number of slots in the underlying table.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::<String>::new(100);
    ///
    /// assert_eq!(filter.slot_count(), 128);
    /// ```
    pub fn slot_count(&self) -> usize {
        self.filter.capacity()
    }

    /// Returns the number of items the quotient filter can hold before growing, given its
    /// maximum load factor.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::<String>::new(100);
    ///
    /// assert_eq!(filter.capacity(), 102);
    /// ```
    pub fn capacity(&self) -> usize {
        cmp::min(
            (self.slot_count() as f64 * self.max_load_factor) as usize,
            self.slot_count(),
        )
    }

    /// Returns the largest number of items the quotient filter can ever hold. At least one
    /// remainder bit must remain, so the bound is `2^(fingerprint_bits - 1)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::<String>::with_fingerprint_bits(100, 16);
    ///
    /// assert_eq!(filter.max_size(), 32768);
    /// ```
    pub fn max_size(&self) -> usize {
        1usize << (self.fingerprint_bits - 1)
    }

    /// Returns the current load factor of the quotient filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// assert_eq!(filter.load_factor(), 1.0 / 128.0);
    /// ```
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.slot_count() as f64
    }

    /// Returns the maximum load factor of the quotient filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::<String>::new(100);
    ///
    /// assert_eq!(filter.max_load_factor(), 0.8);
    /// ```
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Sets the maximum load factor of the quotient filter, clamped to `[0.05, 1.0]`. If the
    /// new policy leaves the filter over-subscribed, the table is regenerated with the smallest
    /// valid slot count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityOverflow`](crate::Error::CapacityOverflow) if the regeneration
    /// would leave no remainder bits. The previous policy is restored.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::new(100);
    ///
    /// filter.set_max_load_factor(0.5).unwrap();
    /// assert_eq!(filter.max_load_factor(), 0.5);
    ///
    /// filter.set_max_load_factor(0.01).unwrap();
    /// assert_eq!(filter.max_load_factor(), 0.05);
    /// ```
    pub fn set_max_load_factor(&mut self, max_load_factor: f64) -> Result<(), Error> {
        let clamped = max_load_factor
            .max(MIN_MAX_LOAD_FACTOR)
            .min(MAX_MAX_LOAD_FACTOR);
        let prev = mem::replace(&mut self.max_load_factor, clamped);
        if self.len() > self.capacity() {
            if let Err(err) = self.reserve(self.len()) {
                self.max_load_factor = prev;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Resizes the quotient filter so it can hold at least `capacity` items before growing.
    /// The target slot count is recomputed from scratch, so reserving fewer items than the
    /// current capacity shrinks the table. If the resulting quotient and remainder widths equal
    /// the current ones, nothing happens; otherwise every stored fingerprint is reinserted into
    /// a fresh table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityOverflow`](crate::Error::CapacityOverflow) if holding
    /// `capacity` items would leave no remainder bits. The filter is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::new(100);
    /// assert_eq!(filter.slot_count(), 128);
    ///
    /// filter.reserve(1000).unwrap();
    /// assert_eq!(filter.slot_count(), 2048);
    /// ```
    pub fn reserve(&mut self, capacity: usize) -> Result<(), Error> {
        let capacity = cmp::max(capacity, self.len());
        let min_valid_capacity = (capacity as f64 / self.max_load_factor).ceil() as usize;
        let quotient_bits = Self::required_quotient_bits(min_valid_capacity);

        if quotient_bits >= self.fingerprint_bits {
            return Err(Error::CapacityOverflow);
        }
        let remainder_bits = self.fingerprint_bits - quotient_bits;

        if quotient_bits == self.filter.quotient_bits()
            && remainder_bits == self.filter.remainder_bits()
        {
            return Ok(());
        }

        let mut next = FingerprintFilter::new(quotient_bits, remainder_bits);
        for fingerprint in self.filter.iter() {
            next.insert(fingerprint)?;
        }
        self.filter = next;
        Ok(())
    }

    /// Returns an iterator over the stored fingerprints in increasing numeric order.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// filter.insert("bar").unwrap();
    ///
    /// assert_eq!(filter.iter().count(), 2);
    /// ```
    pub fn iter(&self) -> FingerprintIter<'_> {
        self.filter.iter()
    }

    /// Returns the width in bits of the stored fingerprints.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::<String>::with_fingerprint_bits(100, 16);
    ///
    /// assert_eq!(filter.fingerprint_bits(), 16);
    /// ```
    pub fn fingerprint_bits(&self) -> u8 {
        self.fingerprint_bits
    }

    /// Returns the number of quotient bits in a fingerprint.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::<String>::new(100);
    ///
    /// assert_eq!(filter.quotient_bits(), 7);
    /// ```
    pub fn quotient_bits(&self) -> u8 {
        self.filter.quotient_bits()
    }

    /// Returns the number of remainder bits in a fingerprint.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::<String>::new(100);
    ///
    /// assert_eq!(filter.remainder_bits(), 57);
    /// ```
    pub fn remainder_bits(&self) -> u8 {
        self.filter.remainder_bits()
    }

    /// Returns the estimated false positive probability of the quotient filter. This value will
    /// increase as more items are added.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::<String>::with_fingerprint_bits(100, 16);
    /// assert!(filter.estimated_fpp() < std::f64::EPSILON);
    ///
    /// filter.insert("foo").unwrap();
    /// assert!(filter.estimated_fpp() > std::f64::EPSILON);
    /// assert!(filter.estimated_fpp() < 0.01);
    /// ```
    pub fn estimated_fpp(&self) -> f64 {
        let fill_ratio = self.load_factor();
        1.0 - consts::E.powf(-fill_ratio / 2.0f64.powf(f64::from(self.remainder_bits())))
    }

    /// Returns a reference to the quotient filter's hasher builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::<String>::new(100);
    /// let hasher_builder = filter.hasher();
    /// ```
    pub fn hasher(&self) -> &B {
        &self.hash_builder
    }
}

impl<T, B> PartialEq for QuotientFilter<T, B>
where
    B: BuildHasher,
{
    /// Two quotient filters are equal when they store the same fingerprints. Slot counts,
    /// load-factor policies, and hasher state do not take part in the comparison, so comparing
    /// filters built with different hasher keys is rarely meaningful.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::QuotientFilter;
    use crate::util;
    use crate::{Error, SipHasherBuilder};
    use std::collections::BTreeSet;
    use std::hash::{BuildHasher, Hasher};

    // Hashes a `u64` key to itself, so tests control fingerprints exactly.
    #[derive(Clone, Copy)]
    struct IdentityHashBuilder;

    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, _bytes: &[u8]) {
            unimplemented!("identity hashing is only defined for u64 keys")
        }

        fn write_u64(&mut self, i: u64) {
            self.0 = i;
        }
    }

    impl BuildHasher for IdentityHashBuilder {
        type Hasher = IdentityHasher;

        fn build_hasher(&self) -> IdentityHasher {
            IdentityHasher(0)
        }
    }

    #[test]
    fn test_new() {
        let filter = QuotientFilter::<String>::new(100);

        assert!(filter.is_empty());
        assert_eq!(filter.slot_count(), 128);
        assert_eq!(filter.capacity(), 102);
        assert_eq!(filter.fingerprint_bits(), 64);
        assert_eq!(filter.quotient_bits(), 7);
        assert_eq!(filter.remainder_bits(), 57);
        assert_eq!(filter.max_size(), 1 << 63);
    }

    #[test]
    fn test_insert() {
        let mut filter = QuotientFilter::<String>::new(100);

        assert_eq!(filter.insert("foo"), Ok(true));
        assert_eq!(filter.len(), 1);
        assert!(!filter.is_empty());
        assert!(filter.contains("foo"));
        assert_eq!(filter.count("foo"), 1);
    }

    #[test]
    fn test_insert_existing_item() {
        let mut filter = QuotientFilter::<String>::new(100);

        assert_eq!(filter.insert("foo"), Ok(true));
        assert_eq!(filter.insert("foo"), Ok(false));
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut filter = QuotientFilter::<String>::new(100);

        filter.insert("foo").unwrap();
        assert!(filter.remove("foo"));
        assert!(!filter.remove("foo"));

        assert_eq!(filter.len(), 0);
        assert!(!filter.contains("foo"));
    }

    #[test]
    fn test_clear() {
        let mut filter = QuotientFilter::<String>::new(100);

        filter.insert("foobar").unwrap();
        filter.insert("barfoo").unwrap();
        filter.insert("baz").unwrap();
        filter.insert("qux").unwrap();

        filter.clear();

        assert!(filter.is_empty());
        assert!(!filter.contains("foobar"));
        assert!(!filter.contains("barfoo"));
        assert!(!filter.contains("baz"));
        assert!(!filter.contains("qux"));
        assert_eq!(filter.slot_count(), 128);
    }

    #[test]
    fn test_find() {
        let mut filter = QuotientFilter::<String>::with_hasher(100, SipHasherBuilder::from_seed(0, 0));

        filter.insert("foo").unwrap();
        let fingerprint = util::hash(filter.hasher(), "foo");

        let mut iter = filter.find("foo").unwrap();
        assert_eq!(iter.next(), Some(fingerprint));
        assert!(filter.find("bar").is_none());
    }

    #[test]
    fn test_growth_preserves_contents() {
        let hash_builder = SipHasherBuilder::from_seed(7, 11);
        let mut filter =
            QuotientFilter::<u32, _>::with_fingerprint_bits_and_hasher(2, 32, hash_builder);
        filter.set_max_load_factor(0.5).unwrap();

        let mut set = BTreeSet::new();
        let mut prev_slot_count = filter.slot_count();

        for key in 0u32..1000 {
            filter.insert(&key).unwrap();
            set.insert(util::hash(&hash_builder, &key) & 0xFFFF_FFFF);

            let slot_count = filter.slot_count();
            assert!(slot_count >= prev_slot_count);
            if slot_count > prev_slot_count {
                // regrowth reinserted every fingerprint in order
                assert_eq!(
                    filter.iter().collect::<Vec<u64>>(),
                    set.iter().cloned().collect::<Vec<u64>>()
                );
                prev_slot_count = slot_count;
            }
        }

        assert_eq!(filter.len(), set.len());
        assert_eq!(
            filter.iter().collect::<Vec<u64>>(),
            set.iter().cloned().collect::<Vec<u64>>()
        );
    }

    #[test]
    fn test_capacity_overflow() {
        let mut filter =
            QuotientFilter::<u64, _>::with_fingerprint_bits_and_hasher(256, 10, IdentityHashBuilder);
        filter.set_max_load_factor(1.0).unwrap();
        filter.reserve(512).unwrap();

        assert_eq!(filter.slot_count(), 512);
        assert_eq!(filter.capacity(), 512);
        assert_eq!(filter.max_size(), 512);

        for key in 0u64..512 {
            assert_eq!(filter.insert(&key), Ok(true));
        }

        assert_eq!(filter.insert(&512u64), Err(Error::CapacityOverflow));

        // the failed insertion left the filter untouched
        assert_eq!(filter.len(), 512);
        assert_eq!(filter.slot_count(), 512);
        assert!(filter.contains(&511u64));
        assert!(!filter.contains(&512u64));

        assert_eq!(filter.insert(&511u64), Ok(false));
    }

    #[test]
    fn test_equality_ignores_auxiliary_state() {
        let hash_builder = SipHasherBuilder::from_seed(0, 0);
        let mut a = QuotientFilter::<u32, _>::with_hasher(4, hash_builder);
        let mut b = QuotientFilter::<u32, _>::with_hasher(512, hash_builder);
        b.set_max_load_factor(0.25).unwrap();

        for key in 0u32..100 {
            a.insert(&key).unwrap();
        }
        for key in (0u32..100).rev() {
            b.insert(&key).unwrap();
        }

        assert_ne!(a.slot_count(), b.slot_count());
        assert_ne!(a.max_load_factor(), b.max_load_factor());
        assert!(a == b);

        a.insert(&100u32).unwrap();
        assert!(a != b);
    }

    #[test]
    fn test_max_load_factor_clamp() {
        let mut filter = QuotientFilter::<String>::new(100);

        filter.set_max_load_factor(0.01).unwrap();
        assert_eq!(filter.max_load_factor(), 0.05);

        filter.set_max_load_factor(7.0).unwrap();
        assert_eq!(filter.max_load_factor(), 1.0);
    }

    #[test]
    fn test_reserve_shrinks() {
        let mut filter = QuotientFilter::<u32, _>::with_hasher(100, SipHasherBuilder::from_seed(3, 5));
        assert_eq!(filter.slot_count(), 128);

        for key in 0u32..10 {
            filter.insert(&key).unwrap();
        }

        filter.reserve(10).unwrap();
        assert_eq!(filter.slot_count(), 16);
        assert_eq!(filter.len(), 10);
        for key in 0u32..10 {
            assert!(filter.contains(&key));
        }
    }

    #[test]
    fn test_oversubscribing_load_factor_regrows() {
        let mut filter =
            QuotientFilter::<u64, _>::with_fingerprint_bits_and_hasher(8, 32, IdentityHashBuilder);
        assert_eq!(filter.slot_count(), 16);

        for key in 0u64..10 {
            filter.insert(&key).unwrap();
        }

        filter.set_max_load_factor(0.05).unwrap();
        assert!(filter.len() <= filter.capacity());
        assert_eq!(filter.slot_count(), 256);
        assert_eq!(filter.len(), 10);
    }
}
