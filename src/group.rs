//! Per-bucket metadata bytes and word-at-a-time group scans.
//!
//! Each bucket owns one metadata byte: `EMPTY` (0x00) for a free bucket, or
//! `0x80 | fragment` for an occupied one, where the fragment is the top
//! seven bits of the record's hash. Scans load eight bytes into a `u64` and
//! test every lane at once, so probing and iteration touch records only
//! for lanes that can matter.

pub(crate) const EMPTY: u8 = 0x00;
const OCCUPIED_BIT: u8 = 0x80;

pub(crate) const GROUP_WIDTH: usize = 8;

const LSB: u64 = 0x0101_0101_0101_0101;
const MSB: u64 = 0x8080_8080_8080_8080;

/// Metadata byte for an occupied bucket holding a record with `hash`.
#[inline]
pub(crate) fn tag(hash: u64) -> u8 {
    OCCUPIED_BIT | (hash >> 57) as u8
}

#[inline]
pub(crate) fn is_full(ctrl: u8) -> bool {
    ctrl & OCCUPIED_BIT != 0
}

/// Eight consecutive metadata bytes, lane `i` in bits `8*i..8*i+8`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Group(u64);

impl Group {
    /// Load the group starting at `pos`. Lanes past the end of `ctrl` read
    /// as `EMPTY`, so a scan never needs to special-case the tail.
    #[inline]
    pub(crate) fn load(ctrl: &[u8], pos: usize) -> Self {
        let mut bytes = [EMPTY; GROUP_WIDTH];
        if let Some(rest) = ctrl.get(pos..) {
            let n = rest.len().min(GROUP_WIDTH);
            bytes[..n].copy_from_slice(&rest[..n]);
        }
        Group(u64::from_le_bytes(bytes))
    }

    /// Lanes whose byte equals `tag`. May report a false positive in a lane
    /// directly above a true match; callers confirm against the record.
    #[inline]
    pub(crate) fn match_tag(self, tag: u8) -> BitMask {
        let cmp = self.0 ^ (LSB * tag as u64);
        BitMask(cmp.wrapping_sub(LSB) & !cmp & MSB)
    }

    /// Lanes that are empty. Exact.
    #[inline]
    pub(crate) fn match_empty(self) -> BitMask {
        BitMask(!self.0 & MSB)
    }

    /// Lanes that are occupied. Exact.
    #[inline]
    pub(crate) fn match_full(self) -> BitMask {
        BitMask(self.0 & MSB)
    }
}

/// Set of lanes, one high bit per lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BitMask(u64);

impl BitMask {
    #[inline]
    pub(crate) fn any(self) -> bool {
        self.0 != 0
    }

    #[inline]
    pub(crate) fn lowest(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize / 8)
        }
    }

    /// Keep only lanes strictly below `lane`.
    #[inline]
    pub(crate) fn below(self, lane: usize) -> BitMask {
        if lane >= GROUP_WIDTH {
            self
        } else {
            BitMask(self.0 & ((1u64 << (lane * 8)) - 1))
        }
    }
}

impl Iterator for BitMask {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        let lane = self.lowest()?;
        self.0 &= self.0 - 1;
        Some(lane)
    }
}
