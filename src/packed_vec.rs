//! Fixed-size array of bit-packed values.

use std::mem;

/// A fixed-size array of `bit_count`-wide values packed contiguously into `u64` words.
///
/// Entry `i` lives at bit offset `i * bit_count` and may straddle a word boundary when
/// `bit_count` does not divide 64. The buffer holds `ceil(len * bit_count / 64)` words and is
/// zero-initialized.
///
/// # Examples
///
/// ```
/// use quofilter::packed_vec::PackedVec;
///
/// let mut pv = PackedVec::new(5, 4);
///
/// pv.set(0, 31);
/// pv.set(3, 17);
///
/// assert_eq!(pv.get(0), 31);
/// assert_eq!(pv.get(1), 0);
/// assert_eq!(pv.exchange(3, 2), 17);
/// assert_eq!(pv.get(3), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PackedVec {
    blocks: Vec<u64>,
    bit_count: usize,
    len: usize,
}

const BLOCK_BIT_COUNT: usize = mem::size_of::<u64>() * 8;

impl PackedVec {
    fn get_block_count(bit_count: usize, len: usize) -> usize {
        (bit_count * len + BLOCK_BIT_COUNT - 1) / BLOCK_BIT_COUNT
    }

    fn get_mask(size: usize) -> u64 {
        if size == BLOCK_BIT_COUNT {
            !0
        } else {
            (1u64 << size) - 1
        }
    }

    /// Constructs a new `PackedVec` holding `len` values of `bit_count` bits each, all
    /// initialized to zero. `bit_count` cannot exceed 64.
    ///
    /// # Panics
    ///
    /// Panics if `bit_count` is greater than 64.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::packed_vec::PackedVec;
    ///
    /// let pv = PackedVec::new(5, 4);
    /// assert_eq!(pv.iter().collect::<Vec<u64>>(), vec![0, 0, 0, 0]);
    /// ```
    pub fn new(bit_count: usize, len: usize) -> Self {
        assert!(bit_count <= BLOCK_BIT_COUNT);
        PackedVec {
            blocks: vec![0; Self::get_block_count(bit_count, len)],
            bit_count,
            len,
        }
    }

    /// Sets the value at index `index` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if attempt to set an index out-of-bounds, or if `value` does not fit in
    /// `bit_count` bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::packed_vec::PackedVec;
    ///
    /// let mut pv = PackedVec::new(5, 4);
    /// pv.set(1, 9);
    ///
    /// assert_eq!(pv.get(1), 9);
    /// ```
    pub fn set(&mut self, index: usize, value: u64) {
        assert!(index < self.len);
        assert!(value & Self::get_mask(self.bit_count) == value);
        let bit_offset = index * self.bit_count;
        let block_index = bit_offset / BLOCK_BIT_COUNT;
        let bit_index = bit_offset % BLOCK_BIT_COUNT;
        // bits that spill into the next block when the entry straddles a boundary
        let spilled_bits = (self.bit_count + bit_index).saturating_sub(BLOCK_BIT_COUNT);
        self.blocks[block_index] &= !(Self::get_mask(self.bit_count) << bit_index);
        self.blocks[block_index] |= value << bit_index;
        if spilled_bits > 0 {
            let written_bits = self.bit_count - spilled_bits;
            self.blocks[block_index + 1] &= !Self::get_mask(spilled_bits);
            self.blocks[block_index + 1] |= value >> written_bits;
        }
    }

    /// Returns the value at index `index`.
    ///
    /// # Panics
    ///
    /// Panics if attempt to get an index out-of-bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::packed_vec::PackedVec;
    ///
    /// let mut pv = PackedVec::new(5, 4);
    /// pv.set(1, 9);
    ///
    /// assert_eq!(pv.get(0), 0);
    /// assert_eq!(pv.get(1), 9);
    /// ```
    pub fn get(&self, index: usize) -> u64 {
        assert!(index < self.len);
        let bit_offset = index * self.bit_count;
        let block_index = bit_offset / BLOCK_BIT_COUNT;
        let bit_index = bit_offset % BLOCK_BIT_COUNT;
        let spilled_bits = (self.bit_count + bit_index).saturating_sub(BLOCK_BIT_COUNT);
        let mut value = (self.blocks[block_index] >> bit_index)
            & Self::get_mask(self.bit_count - spilled_bits);
        if spilled_bits > 0 {
            let written_bits = self.bit_count - spilled_bits;
            value |= (self.blocks[block_index + 1] & Self::get_mask(spilled_bits)) << written_bits;
        }
        value
    }

    /// Replaces the value at index `index` with `value`, returning the previous value.
    ///
    /// # Panics
    ///
    /// Panics if attempt to exchange an index out-of-bounds, or if `value` does not fit in
    /// `bit_count` bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::packed_vec::PackedVec;
    ///
    /// let mut pv = PackedVec::new(5, 4);
    /// pv.set(1, 9);
    ///
    /// assert_eq!(pv.exchange(1, 4), 9);
    /// assert_eq!(pv.get(1), 4);
    /// ```
    pub fn exchange(&mut self, index: usize, value: u64) -> u64 {
        let old_value = self.get(index);
        self.set(index, value);
        old_value
    }

    /// Resets every value to zero. The underlying storage is retained.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::packed_vec::PackedVec;
    ///
    /// let mut pv = PackedVec::new(5, 4);
    ///
    /// pv.set(2, 20);
    /// pv.clear();
    /// assert_eq!(pv.get(2), 0);
    /// ```
    pub fn clear(&mut self) {
        for block in &mut self.blocks {
            *block = 0;
        }
    }

    /// Returns an iterator over the values of the vector in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::packed_vec::PackedVec;
    ///
    /// let mut pv = PackedVec::new(5, 3);
    ///
    /// pv.set(1, 30);
    /// assert_eq!(pv.iter().collect::<Vec<u64>>(), vec![0, 30, 0]);
    /// ```
    pub fn iter(&self) -> PackedVecIter<'_> {
        PackedVecIter {
            packed_vec: self,
            index: 0,
        }
    }

    /// Returns `true` if the `PackedVec` has no values.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::packed_vec::PackedVec;
    ///
    /// assert!(PackedVec::new(5, 0).is_empty());
    /// assert!(!PackedVec::new(5, 4).is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of values in the `PackedVec`.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::packed_vec::PackedVec;
    ///
    /// let pv = PackedVec::new(5, 4);
    ///
    /// assert_eq!(pv.len(), 4);
    /// ```
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the width in bits of each value.
    ///
    /// # Examples
    ///
    /// ```
    /// use quofilter::packed_vec::PackedVec;
    ///
    /// let pv = PackedVec::new(5, 4);
    ///
    /// assert_eq!(pv.bit_count(), 5);
    /// ```
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }
}

/// An iterator for `PackedVec`.
///
/// This iterator yields values in order.
pub struct PackedVecIter<'a> {
    packed_vec: &'a PackedVec,
    index: usize,
}

impl<'a> Iterator for PackedVecIter<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.index >= self.packed_vec.len {
            return None;
        }
        let value = self.packed_vec.get(self.index);
        self.index += 1;
        Some(value)
    }
}

impl<'a> IntoIterator for &'a PackedVec {
    type IntoIter = PackedVecIter<'a>;
    type Item = u64;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
