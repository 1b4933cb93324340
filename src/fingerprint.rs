//! Bit-packed table of fingerprints for approximate membership queries.

use crate::bit_vec::BitVec;
use crate::packed_vec::PackedVec;
use crate::Error;
use std::fmt;

/// A bit-packed table storing integer fingerprints keyed by their quotient.
///
/// A fingerprint of `quotient_bits + remainder_bits` bits decomposes into a quotient (the top
/// `quotient_bits` bits) and a remainder (the bottom `remainder_bits` bits). The quotient defines
/// the index of the table where the remainder should be stored. This index is called the
/// "canonical slot" of the fingerprint. When multiple fingerprints map to the same canonical
/// slot, they are stored in contiguous slots called a run, and the filter maintains that
/// remainders in the same run are sorted in increasing order. Additionally, all runs are sorted
/// by their canonical slot: if run `r1` has a canonical slot at index `i1` and run `r2` has a
/// canonical slot at index `i2` where `i1 < i2`, then `r1` occurs to the left of `r2`. Note that
/// a run's first fingerprint may not occupy its canonical slot if the run has been forced right
/// by some run to its left. These invariants are maintained with three bits of metadata per slot:
/// `is_occupied`, `is_continuation`, and `is_shifted`, stored as three independent bit vectors
/// next to a packed array of remainders.
///
/// Inserting a fingerprint wider than `quotient_bits + remainder_bits` truncates it, so distinct
/// fingerprints may collide; the filter then reports false positives but never false negatives.
///
/// # Examples
///
/// ```
/// use quofilter::fingerprint::FingerprintFilter;
///
/// let mut filter = FingerprintFilter::new(4, 4);
///
/// filter.insert(0x35).unwrap();
/// assert!(filter.contains(0x35));
/// assert_eq!(filter.count(0x36), 0);
///
/// filter.erase(0x35);
/// assert!(!filter.contains(0x35));
///
/// assert_eq!(filter.quotient_bits(), 4);
/// assert_eq!(filter.remainder_bits(), 4);
/// assert_eq!(filter.capacity(), 16);
/// ```
#[derive(Clone)]
pub struct FingerprintFilter {
    quotient_bits: u8,
    remainder_bits: u8,
    num_slots: usize,
    quotient_mask: u64,
    remainder_mask: u64,
    // is_occupied: some stored fingerprint has this slot as its canonical slot
    // is_continuation: this slot holds a non-first remainder of a run
    // is_shifted: the remainder in this slot is not in its canonical slot
    is_occupied: BitVec,
    is_continuation: BitVec,
    is_shifted: BitVec,
    remainders: PackedVec,
    len: usize,
}

fn low_mask(bits: u8) -> u64 {
    if bits == 64 {
        !0
    } else {
        (1u64 << bits) - 1
    }
}

impl FingerprintFilter {
    /// Constructs a new, empty `FingerprintFilter` with the specified number of quotient and
    /// remainder bits. The filter has `2^quotient_bits` slots and uses approximately
    /// `(remainder_bits + 3) * 2^quotient_bits` bits of memory.
    ///
    /// # Panics
    ///
    /// Panics if `remainder_bits` is 0, or if `quotient_bits + remainder_bits` is greater
    /// than 64.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let filter = FingerprintFilter::new(8, 4);
    /// ```
    pub fn new(quotient_bits: u8, remainder_bits: u8) -> Self {
        assert!(remainder_bits > 0);
        assert!(quotient_bits + remainder_bits <= 64);
        let num_slots = 1usize << quotient_bits;
        FingerprintFilter {
            quotient_bits,
            remainder_bits,
            num_slots,
            quotient_mask: low_mask(quotient_bits),
            remainder_mask: low_mask(remainder_bits),
            is_occupied: BitVec::new(num_slots),
            is_continuation: BitVec::new(num_slots),
            is_shifted: BitVec::new(num_slots),
            remainders: PackedVec::new(remainder_bits as usize, num_slots),
            len: 0,
        }
    }

    fn extract_quotient(&self, fingerprint: u64) -> usize {
        if self.quotient_bits == 0 {
            0
        } else {
            ((fingerprint >> self.remainder_bits) & self.quotient_mask) as usize
        }
    }

    fn extract_remainder(&self, fingerprint: u64) -> u64 {
        fingerprint & self.remainder_mask
    }

    fn incr_pos(&self, pos: usize) -> usize {
        (pos + 1) & (self.num_slots - 1)
    }

    fn decr_pos(&self, pos: usize) -> usize {
        pos.wrapping_sub(1) & (self.num_slots - 1)
    }

    fn is_empty_slot(&self, pos: usize) -> bool {
        !self.is_occupied[pos] && !self.is_continuation[pos] && !self.is_shifted[pos]
    }

    fn is_run_start(&self, pos: usize) -> bool {
        !self.is_continuation[pos] && (self.is_shifted[pos] || self.is_occupied[pos])
    }

    // Smallest position after `pos` whose canonical slot holds a run.
    fn find_next_occupied(&self, pos: usize) -> usize {
        debug_assert!(self.is_occupied[pos]);
        let mut pos = self.incr_pos(pos);
        while !self.is_occupied[pos] {
            pos = self.incr_pos(pos);
        }
        pos
    }

    // Position of the first slot of the next run in the cluster.
    fn find_next_run(&self, run_pos: usize) -> usize {
        debug_assert!(self.is_run_start(run_pos));
        let mut pos = self.incr_pos(run_pos);
        while self.is_continuation[pos] {
            pos = self.incr_pos(pos);
        }
        pos
    }

    // Position of the first slot of the run with canonical slot `quotient`. The run must exist.
    fn find_run_start(&self, quotient: usize) -> usize {
        debug_assert!(self.is_occupied[quotient]);
        let mut pos = quotient;

        if !self.is_shifted[pos] {
            return pos;
        }

        // Walk left to the start of the enclosing cluster, counting the runs that start between
        // it and the canonical slot.
        let mut running_count = 0;
        loop {
            pos = self.decr_pos(pos);
            if self.is_occupied[pos] {
                running_count += 1;
            }
            if !self.is_shifted[pos] {
                break;
            }
        }

        // Walk right across that many run boundaries.
        while running_count > 0 {
            pos = self.find_next_run(pos);
            running_count -= 1;
        }
        pos
    }

    fn find_slot(&self, fingerprint: u64) -> Option<(usize, usize)> {
        if self.is_empty() {
            return None;
        }

        let quotient = self.extract_quotient(fingerprint);
        let remainder = self.extract_remainder(fingerprint);

        // no run exists for this canonical slot
        if !self.is_occupied[quotient] {
            return None;
        }

        let mut pos = self.find_run_start(quotient);
        loop {
            let stored = self.remainders.get(pos);
            if stored == remainder {
                return Some((pos, quotient));
            }
            // runs are sorted, so later remainders in the run are always larger
            if stored > remainder {
                return None;
            }
            pos = self.incr_pos(pos);
            if !self.is_continuation[pos] {
                return None;
            }
        }
    }

    // Inserts the remainder at `pos`, moving every slot from `pos` up to the first empty slot
    // one position to the right. All touched slots are marked as shifted; the inserted slot
    // might actually be canonical, which the caller corrects.
    fn insert_into(&mut self, pos: usize, remainder: u64, continuation: bool) {
        let mut pos = pos;
        let mut remainder = remainder;
        let mut continuation = continuation;

        loop {
            let was_empty_slot = self.is_empty_slot(pos);

            let prev_continuation = self.is_continuation[pos];
            self.is_continuation.set(pos, continuation);
            continuation = prev_continuation;

            remainder = self.remainders.exchange(pos, remainder);
            self.is_shifted.set(pos, true);
            pos = self.incr_pos(pos);

            if was_empty_slot {
                break;
            }
        }
    }

    /// Inserts a fingerprint into the filter. Returns `true` if the fingerprint was not already
    /// present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Full`](crate::Error::Full) if every slot is in use and the fingerprint
    /// is not already present. The filter is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let mut filter = FingerprintFilter::new(8, 4);
    ///
    /// assert_eq!(filter.insert(0x35), Ok(true));
    /// assert_eq!(filter.insert(0x35), Ok(false));
    /// assert_eq!(filter.len(), 1);
    /// ```
    pub fn insert(&mut self, fingerprint: u64) -> Result<bool, Error> {
        if self.is_full() {
            if self.contains(fingerprint) {
                return Ok(false);
            }
            return Err(Error::Full);
        }

        let quotient = self.extract_quotient(fingerprint);
        let remainder = self.extract_remainder(fingerprint);

        if self.is_empty_slot(quotient) {
            self.is_occupied.set(quotient, true);
            self.remainders.set(quotient, remainder);
            self.len += 1;
            return Ok(true);
        }

        // The canonical slot is in use. If no run exists for it yet, setting the occupied bit
        // first makes `find_run_start` land on the position where the new run belongs.
        let run_was_empty = !self.is_occupied[quotient];
        if run_was_empty {
            self.is_occupied.set(quotient, true);
        }

        let run_start = self.find_run_start(quotient);
        let mut pos = run_start;

        if !run_was_empty {
            // search the sorted run for the insertion point
            loop {
                let stored = self.remainders.get(pos);
                if stored == remainder {
                    return Ok(false);
                }
                if stored > remainder {
                    break;
                }
                pos = self.incr_pos(pos);
                if !self.is_continuation[pos] {
                    break;
                }
            }

            // inserting a new minimum demotes the old run head to a continuation
            if pos == run_start {
                self.is_continuation.set(run_start, true);
            }
        }

        self.insert_into(pos, remainder, pos != run_start);
        if pos == quotient {
            self.is_shifted.set(pos, false);
        }

        self.len += 1;
        Ok(true)
    }

    /// Returns an ordered iterator positioned at the given fingerprint, or `None` if the
    /// fingerprint is not present. The iterator yields the fingerprint itself followed by every
    /// stored fingerprint greater than it, in increasing order.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let mut filter = FingerprintFilter::new(8, 4);
    ///
    /// filter.insert(0x35).unwrap();
    /// filter.insert(0x47).unwrap();
    ///
    /// let iter = filter.find(0x35).unwrap();
    /// assert_eq!(iter.collect::<Vec<u64>>(), vec![0x35, 0x47]);
    /// assert!(filter.find(0x36).is_none());
    /// ```
    pub fn find(&self, fingerprint: u64) -> Option<FingerprintIter<'_>> {
        self.find_slot(fingerprint)
            .map(|(pos, canonical_pos)| FingerprintIter {
                filter: self,
                pos,
                canonical_pos,
                exhausted: false,
            })
    }

    /// Checks if a fingerprint is present in the filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let mut filter = FingerprintFilter::new(8, 4);
    ///
    /// assert!(!filter.contains(0x35));
    /// filter.insert(0x35).unwrap();
    /// assert!(filter.contains(0x35));
    /// ```
    pub fn contains(&self, fingerprint: u64) -> bool {
        self.find_slot(fingerprint).is_some()
    }

    /// Returns the number of times the fingerprint is stored, effectively 0 or 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let mut filter = FingerprintFilter::new(8, 4);
    ///
    /// filter.insert(0x35).unwrap();
    /// assert_eq!(filter.count(0x35), 1);
    /// assert_eq!(filter.count(0x36), 0);
    /// ```
    pub fn count(&self, fingerprint: u64) -> usize {
        self.contains(fingerprint) as usize
    }

    // Removes the entry at `remove_pos`, shifting the rest of the cluster one slot to the left.
    // `canonical_pos` is the canonical slot of the removed entry.
    fn remove_entry(&mut self, remove_pos: usize, canonical_pos: usize) {
        debug_assert!(!self.is_empty_slot(remove_pos));
        debug_assert!(self.is_occupied[canonical_pos]);

        let was_head = !self.is_continuation[remove_pos];

        let mut current_pos = remove_pos;
        // canonical slot of the entry being copied into `current_pos`
        let mut quotient_pos = canonical_pos;

        loop {
            let next_pos = self.incr_pos(current_pos);
            if !self.is_shifted[next_pos] {
                break;
            }

            let remainder = self.remainders.get(next_pos);
            self.remainders.set(current_pos, remainder);
            let continuation = self.is_continuation[next_pos];
            self.is_continuation.set(current_pos, continuation);

            // when a run head moves down, it may land on its canonical slot
            if !continuation {
                quotient_pos = self.find_next_occupied(quotient_pos);
                debug_assert!(quotient_pos != next_pos);
                if quotient_pos == current_pos {
                    self.is_shifted.set(current_pos, false);
                }
            }

            current_pos = next_pos;
        }

        // the freed tail slot of the cluster becomes empty
        self.is_shifted.set(current_pos, false);
        self.is_continuation.set(current_pos, false);
        self.remainders.set(current_pos, 0);

        if was_head {
            if self.is_continuation[remove_pos] {
                // the run survives, merely shortened at the head
                self.is_continuation.set(remove_pos, false);
            } else {
                // the entire run vanished
                self.is_occupied.set(canonical_pos, false);
            }
        }
    }

    /// Erases a fingerprint from the filter. Returns `true` if the fingerprint was present.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let mut filter = FingerprintFilter::new(8, 4);
    ///
    /// filter.insert(0x35).unwrap();
    /// assert!(filter.erase(0x35));
    /// assert!(!filter.erase(0x35));
    /// ```
    pub fn erase(&mut self, fingerprint: u64) -> bool {
        match self.find_slot(fingerprint) {
            Some((pos, canonical_pos)) => {
                self.remove_entry(pos, canonical_pos);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Clears the filter, removing all fingerprints. The underlying storage is retained.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let mut filter = FingerprintFilter::new(8, 4);
    ///
    /// filter.insert(0x35).unwrap();
    /// filter.clear();
    ///
    /// assert!(filter.is_empty());
    /// assert!(!filter.contains(0x35));
    /// ```
    pub fn clear(&mut self) {
        self.is_occupied.set_all(false);
        self.is_continuation.set_all(false);
        self.is_shifted.set_all(false);
        self.remainders.clear();
        self.len = 0;
    }

    /// Returns the number of fingerprints in the filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let mut filter = FingerprintFilter::new(8, 4);
    ///
    /// filter.insert(0x35).unwrap();
    /// assert_eq!(filter.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the filter holds no fingerprints.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let filter = FingerprintFilter::new(8, 4);
    ///
    /// assert!(filter.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if every slot of the filter is in use.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let filter = FingerprintFilter::new(8, 4);
    ///
    /// assert!(!filter.is_full());
    /// ```
    pub fn is_full(&self) -> bool {
        self.len == self.num_slots
    }

    /// Returns the number of slots in the filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let filter = FingerprintFilter::new(8, 4);
    ///
    /// assert_eq!(filter.capacity(), 256);
    /// ```
    pub fn capacity(&self) -> usize {
        self.num_slots
    }

    /// Returns the number of quotient bits in a fingerprint.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let filter = FingerprintFilter::new(8, 4);
    ///
    /// assert_eq!(filter.quotient_bits(), 8);
    /// ```
    pub fn quotient_bits(&self) -> u8 {
        self.quotient_bits
    }

    /// Returns the number of remainder bits in a fingerprint.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let filter = FingerprintFilter::new(8, 4);
    ///
    /// assert_eq!(filter.remainder_bits(), 4);
    /// ```
    pub fn remainder_bits(&self) -> u8 {
        self.remainder_bits
    }

    /// Returns the width in bits of the fingerprints stored by the filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let filter = FingerprintFilter::new(8, 4);
    ///
    /// assert_eq!(filter.fingerprint_bits(), 12);
    /// ```
    pub fn fingerprint_bits(&self) -> u8 {
        self.quotient_bits + self.remainder_bits
    }

    /// Returns an iterator over the stored fingerprints in increasing numeric order.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::fingerprint::FingerprintFilter;
    ///
    /// let mut filter = FingerprintFilter::new(8, 4);
    ///
    /// filter.insert(0x47).unwrap();
    /// filter.insert(0x35).unwrap();
    ///
    /// assert_eq!(filter.iter().collect::<Vec<u64>>(), vec![0x35, 0x47]);
    /// ```
    pub fn iter(&self) -> FingerprintIter<'_> {
        if self.is_empty() {
            return FingerprintIter {
                filter: self,
                pos: 0,
                canonical_pos: 0,
                exhausted: true,
            };
        }

        let mut canonical_pos = 0;
        while !self.is_occupied[canonical_pos] {
            canonical_pos += 1;
        }

        FingerprintIter {
            filter: self,
            pos: self.find_run_start(canonical_pos),
            canonical_pos,
            exhausted: false,
        }
    }
}

impl Default for FingerprintFilter {
    /// Constructs a filter with zero slots. Lookups and erasures trivially find nothing, and any
    /// insertion fails with [`Error::Full`](crate::Error::Full).
    fn default() -> Self {
        FingerprintFilter {
            quotient_bits: 0,
            remainder_bits: 0,
            num_slots: 0,
            quotient_mask: 0,
            remainder_mask: 0,
            is_occupied: BitVec::new(0),
            is_continuation: BitVec::new(0),
            is_shifted: BitVec::new(0),
            remainders: PackedVec::new(0, 0),
            len: 0,
        }
    }
}

impl fmt::Debug for FingerprintFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pos in 0..self.num_slots {
            let metadata = (self.is_occupied[pos] as u8) << 2
                | (self.is_continuation[pos] as u8) << 1
                | self.is_shifted[pos] as u8;
            write!(f, "{}|{}:{:03b} ", pos, self.remainders.get(pos), metadata)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FingerprintFilter {
    type IntoIter = FingerprintIter<'a>;
    type Item = u64;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the fingerprints of a `FingerprintFilter` in increasing numeric order.
///
/// The iterator tracks both the physical slot of the current fingerprint and its canonical slot,
/// so each step costs amortized constant time despite runs being physically displaced.
#[derive(Clone)]
pub struct FingerprintIter<'a> {
    filter: &'a FingerprintFilter,
    // physical slot of the current fingerprint
    pos: usize,
    // canonical slot of the current fingerprint
    canonical_pos: usize,
    exhausted: bool,
}

impl<'a> FingerprintIter<'a> {
    fn advance(&mut self) {
        let filter = self.filter;
        self.pos = filter.incr_pos(self.pos);

        // still inside the same run
        if filter.is_continuation[self.pos] {
            return;
        }

        // Canonical slots only grow along the iteration, so scanning forward from the previous
        // one keeps the whole traversal linear.
        let mut canonical_pos = self.canonical_pos;
        loop {
            canonical_pos += 1;
            if canonical_pos == filter.num_slots {
                self.exhausted = true;
                return;
            }
            if filter.is_occupied[canonical_pos] {
                break;
            }
        }
        self.canonical_pos = canonical_pos;

        // skip the gap between clusters, if any
        while !filter.is_run_start(self.pos) {
            self.pos = filter.incr_pos(self.pos);
        }
    }
}

impl<'a> Iterator for FingerprintIter<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.exhausted {
            return None;
        }
        let fingerprint = ((self.canonical_pos as u64) << self.filter.remainder_bits)
            | self.filter.remainders.get(self.pos);
        self.advance();
        Some(fingerprint)
    }
}

impl<'a> PartialEq for FingerprintIter<'a> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.filter, other.filter)
            && self.exhausted == other.exhausted
            && (self.exhausted || (self.pos == other.pos && self.canonical_pos == other.canonical_pos))
    }
}

#[cfg(test)]
mod tests {
    use super::FingerprintFilter;
    use crate::Error;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use std::collections::BTreeSet;

    fn flags(filter: &FingerprintFilter, pos: usize) -> (bool, bool, bool) {
        (
            filter.is_occupied[pos],
            filter.is_continuation[pos],
            filter.is_shifted[pos],
        )
    }

    fn check_invariants(filter: &FingerprintFilter) {
        let mut non_empty_count = 0;
        let mut run_start_count = 0;
        let mut continuation_count = 0;

        for pos in 0..filter.capacity() {
            let (_, continuation, shifted) = flags(filter, pos);
            assert!(
                !continuation || shifted,
                "continuation without shift at slot {}",
                pos
            );
            if !filter.is_empty_slot(pos) {
                non_empty_count += 1;
                if filter.is_run_start(pos) {
                    run_start_count += 1;
                }
                if continuation {
                    continuation_count += 1;
                }
            }
        }

        assert_eq!(filter.len(), non_empty_count);
        assert_eq!(filter.len(), run_start_count + continuation_count);
        assert_eq!(run_start_count, filter.is_occupied.count_ones());

        for quotient in 0..filter.capacity() {
            if !filter.is_occupied[quotient] {
                continue;
            }
            let run_start = filter.find_run_start(quotient);

            // every slot between the canonical slot and the run start is shifted
            let mut pos = quotient;
            while pos != run_start {
                pos = filter.incr_pos(pos);
                assert!(filter.is_shifted[pos], "gap inside cluster at slot {}", pos);
            }

            // remainders in a run increase strictly
            let mut pos = run_start;
            let mut prev = filter.remainders.get(pos);
            loop {
                pos = filter.incr_pos(pos);
                if !filter.is_continuation[pos] || pos == run_start {
                    break;
                }
                let stored = filter.remainders.get(pos);
                assert!(stored > prev, "unsorted run at slot {}", pos);
                prev = stored;
            }
        }
    }

    #[test]
    fn test_insert_into_empty_slot() {
        let mut filter = FingerprintFilter::new(4, 4);

        assert_eq!(filter.insert(0x35), Ok(true));

        assert_eq!(flags(&filter, 3), (true, false, false));
        assert_eq!(filter.remainders.get(3), 5);
        for pos in (0..16).filter(|pos| *pos != 3) {
            assert_eq!(flags(&filter, pos), (false, false, false));
        }

        assert_eq!(filter.len(), 1);
        assert!(filter.find(0x35).is_some());
        assert_eq!(filter.count(0x36), 0);
        check_invariants(&filter);
    }

    #[test]
    fn test_insert_extends_run() {
        let mut filter = FingerprintFilter::new(4, 4);

        filter.insert(0x35).unwrap();
        assert_eq!(filter.insert(0x37), Ok(true));

        assert_eq!(flags(&filter, 3), (true, false, false));
        assert_eq!(filter.remainders.get(3), 5);
        assert_eq!(flags(&filter, 4), (false, true, true));
        assert_eq!(filter.remainders.get(4), 7);

        assert_eq!(filter.len(), 2);
        assert_eq!(filter.iter().collect::<Vec<u64>>(), vec![0x35, 0x37]);
        check_invariants(&filter);
    }

    #[test]
    fn test_insert_new_run_head() {
        let mut filter = FingerprintFilter::new(4, 4);

        filter.insert(0x35).unwrap();
        filter.insert(0x37).unwrap();
        assert_eq!(filter.insert(0x33), Ok(true));

        assert_eq!(flags(&filter, 3), (true, false, false));
        assert_eq!(filter.remainders.get(3), 3);
        assert_eq!(flags(&filter, 4), (false, true, true));
        assert_eq!(filter.remainders.get(4), 5);
        assert_eq!(flags(&filter, 5), (false, true, true));
        assert_eq!(filter.remainders.get(5), 7);

        assert_eq!(
            filter.iter().collect::<Vec<u64>>(),
            vec![0x33, 0x35, 0x37]
        );
        check_invariants(&filter);
    }

    #[test]
    fn test_insert_second_quotient_into_cluster() {
        let mut filter = FingerprintFilter::new(4, 4);

        filter.insert(0x35).unwrap();
        filter.insert(0x37).unwrap();
        filter.insert(0x33).unwrap();
        assert_eq!(filter.insert(0x42), Ok(true));

        assert!(filter.is_occupied[4]);
        assert_eq!(flags(&filter, 6), (false, false, true));
        assert_eq!(filter.remainders.get(6), 2);

        assert_eq!(
            filter.iter().collect::<Vec<u64>>(),
            vec![0x33, 0x35, 0x37, 0x42]
        );
        check_invariants(&filter);
    }

    #[test]
    fn test_erase_head_of_shifted_run() {
        let mut filter = FingerprintFilter::new(4, 4);

        filter.insert(0x35).unwrap();
        filter.insert(0x37).unwrap();
        filter.insert(0x33).unwrap();
        filter.insert(0x42).unwrap();
        assert!(filter.erase(0x33));

        assert_eq!(flags(&filter, 3), (true, false, false));
        assert_eq!(filter.remainders.get(3), 5);
        assert_eq!(flags(&filter, 4), (true, true, true));
        assert_eq!(filter.remainders.get(4), 7);
        assert_eq!(flags(&filter, 5), (false, false, true));
        assert_eq!(filter.remainders.get(5), 2);
        assert_eq!(flags(&filter, 6), (false, false, false));

        assert_eq!(
            filter.iter().collect::<Vec<u64>>(),
            vec![0x35, 0x37, 0x42]
        );
        check_invariants(&filter);
    }

    #[test]
    fn test_insert_when_full() {
        let mut filter = FingerprintFilter::new(3, 3);

        for fingerprint in 0..8 {
            assert_eq!(filter.insert(fingerprint), Ok(true));
        }
        assert!(filter.is_full());
        check_invariants(&filter);

        assert_eq!(filter.insert(0x08), Err(Error::Full));
        assert_eq!(filter.insert(0x03), Ok(false));
        assert_eq!(filter.len(), 8);
    }

    #[test]
    fn test_iter_wrap_around() {
        let mut filter = FingerprintFilter::new(3, 4);

        filter.insert(0x7A).unwrap();
        filter.insert(0x72).unwrap();
        filter.insert(0x75).unwrap();

        // the run starts at its canonical slot and wraps past the last slot
        assert_eq!(flags(&filter, 7), (true, false, false));
        assert_eq!(filter.remainders.get(7), 0x2);
        assert_eq!(flags(&filter, 0), (false, true, true));
        assert_eq!(filter.remainders.get(0), 0x5);
        assert_eq!(flags(&filter, 1), (false, true, true));
        assert_eq!(filter.remainders.get(1), 0xA);

        assert_eq!(
            filter.iter().collect::<Vec<u64>>(),
            vec![0x72, 0x75, 0x7A]
        );
        check_invariants(&filter);
    }

    #[test]
    fn test_find_position_is_stable() {
        let mut filter = FingerprintFilter::new(4, 4);

        for fingerprint in &[0x35, 0x37, 0x33, 0x42, 0xA1] {
            filter.insert(*fingerprint).unwrap();
        }

        for fingerprint in &[0x35, 0x37, 0x33, 0x42, 0xA1] {
            let first = filter.find(*fingerprint).unwrap();
            let second = filter.find(*fingerprint).unwrap();
            assert!(first == second);
            assert_eq!(first.clone().next(), Some(*fingerprint));
        }
    }

    #[test]
    fn test_erase_restores_state() {
        let mut filter = FingerprintFilter::new(4, 4);

        for fingerprint in &[0x35, 0x37, 0x33, 0x42, 0x41, 0xA1, 0xFF] {
            filter.insert(*fingerprint).unwrap();
        }

        let snapshot = filter.clone();
        for fingerprint in 0..=0xFF {
            if snapshot.contains(fingerprint) {
                continue;
            }
            filter.insert(fingerprint).unwrap();
            assert!(filter.erase(fingerprint));

            assert_eq!(filter.len, snapshot.len);
            assert_eq!(filter.is_occupied, snapshot.is_occupied);
            assert_eq!(filter.is_continuation, snapshot.is_continuation);
            assert_eq!(filter.is_shifted, snapshot.is_shifted);
            assert_eq!(filter.remainders, snapshot.remainders);
        }
    }

    #[test]
    fn test_default() {
        let mut filter = FingerprintFilter::default();

        assert_eq!(filter.capacity(), 0);
        assert_eq!(filter.len(), 0);
        assert!(filter.is_empty());
        assert!(filter.find(0x35).is_none());
        assert_eq!(filter.count(0x35), 0);
        assert!(!filter.erase(0x35));
        filter.clear();
        assert_eq!(filter.insert(0x35), Err(Error::Full));
        assert_eq!(filter.iter().next(), None);
    }

    #[test]
    fn test_clear() {
        let mut filter = FingerprintFilter::new(4, 4);

        for fingerprint in &[0x35, 0x37, 0x33, 0x42] {
            filter.insert(*fingerprint).unwrap();
        }
        filter.clear();

        assert!(filter.is_empty());
        assert!(!filter.is_full());
        assert_eq!(filter.capacity(), 16);
        assert_eq!(filter.quotient_bits(), 4);
        assert_eq!(filter.remainder_bits(), 4);
        assert_eq!(filter.iter().next(), None);
        for pos in 0..16 {
            assert_eq!(flags(&filter, pos), (false, false, false));
        }

        assert_eq!(filter.insert(0x35), Ok(true));
        assert!(filter.contains(0x35));
    }

    #[test]
    fn test_single_slot() {
        let mut filter = FingerprintFilter::new(0, 8);

        assert_eq!(filter.capacity(), 1);
        assert_eq!(filter.insert(0xAB), Ok(true));
        assert!(filter.is_full());
        assert_eq!(filter.insert(0xAB), Ok(false));
        assert_eq!(filter.insert(0xCD), Err(Error::Full));
        assert_eq!(filter.iter().collect::<Vec<u64>>(), vec![0xAB]);
        assert!(filter.erase(0xAB));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_stress() {
        let mut rng = XorShiftRng::from_entropy();
        let quotient_bits = 8;
        let remainder_bits = 8;

        let mut filter = FingerprintFilter::new(quotient_bits, remainder_bits);
        let mut set = BTreeSet::new();
        let fingerprint_mask = (1u64 << 16) - 1;

        for iteration in 0..20_000 {
            let fingerprint = rng.gen::<u64>() & fingerprint_mask;
            let load = filter.len() as f64 / filter.capacity() as f64;

            if !filter.is_full() && rng.gen::<f64>() > load {
                assert_eq!(filter.insert(fingerprint), Ok(set.insert(fingerprint)));
            } else {
                assert_eq!(filter.erase(fingerprint), set.remove(&fingerprint));
            }

            assert_eq!(filter.len(), set.len());
            if iteration % 1000 == 0 {
                check_invariants(&filter);
                assert_eq!(
                    filter.iter().collect::<Vec<u64>>(),
                    set.iter().cloned().collect::<Vec<u64>>()
                );
            }
        }

        check_invariants(&filter);
        assert_eq!(
            filter.iter().collect::<Vec<u64>>(),
            set.iter().cloned().collect::<Vec<u64>>()
        );

        for fingerprint in &set {
            assert!(filter.contains(*fingerprint));
            assert!(filter.erase(*fingerprint));
        }
        assert!(filter.is_empty());
        check_invariants(&filter);
    }
}
