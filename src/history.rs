//! Branch history registers.

use bitvec::prelude::*;
use crate::branch::Outcome;

/// Returns a mask with the low 'bits' bits set.
pub fn width_mask(bits: u32) -> usize {
    1usize.checked_shl(bits).map_or(usize::MAX, |x| x - 1)
}

/// A packed history register holding the most recent 'bits' outcomes.
///
/// The newest outcome is bit 0. The value is masked to the register width
/// after every shift, so it never holds more than 'bits' bits of history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ShiftRegister {
    data: usize,
    bits: u32,
}
impl ShiftRegister {
    /// Create an empty register with the specified width.
    pub fn new(bits: u32) -> Self {
        Self { data: 0, bits }
    }

    pub fn bits(&self) -> u32 { self.bits }
    pub fn mask(&self) -> usize { width_mask(self.bits) }
    pub fn value(&self) -> usize { self.data }

    /// Shift an outcome into the register.
    pub fn push(&mut self, outcome: Outcome) {
        self.data = ((self.data << 1) | outcome.bit()) & self.mask();
    }

    pub fn clear(&mut self) { self.data = 0; }
}

/// A global history register kept as an explicit array of bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRegister {
    data: BitVec<usize, Lsb0>,
    len: usize,
}

// NOTE: This *reverses* the all of the bits and presents them in a format
// where the leftmost bit is the oldest (index n) and the rightmost bit is
// the newest (index 0).
impl std::fmt::Display for HistoryRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let x: String = self.data.as_bitslice().iter().by_vals()
            .map(|b| if b { '1' } else { '0' })
            .rev()
            .collect();
        write!(f, "{}", x)
    }
}

impl HistoryRegister {
    /// Create a register with the specified length in bits.
    /// All bits in the register are initialized to zero.
    pub fn new(len: usize) -> Self {
        Self {
            data: bitvec![usize, Lsb0; 0; len],
            len,
        }
    }

    pub fn len(&self) -> usize { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }
    pub fn data(&self) -> &BitSlice<usize, Lsb0> { self.data.as_bitslice() }

    /// Shift the register by 'n' bits.
    /// The bottom 'n' bits become zero, and the top 'n' bits are discarded.
    pub fn shift_by(&mut self, n: usize) {
        self.data.shift_right(n);
    }

    /// Shift an outcome into the register. The oldest bit is discarded.
    pub fn push(&mut self, outcome: Outcome) {
        if self.is_empty() {
            return;
        }
        self.shift_by(1);
        self.data.set(0, outcome.into());
    }

    /// Return the newest 32 bits of history as an integer, where the newest
    /// outcome is the least-significant bit.
    pub fn first_word(&self) -> u32 {
        let n = self.len.min(u32::BITS as usize);
        if n == 0 {
            return 0;
        }
        self.data[..n].load_le::<u32>()
    }

    /// Set all bits to zero.
    pub fn clear(&mut self) {
        self.data.fill(false);
    }
}
