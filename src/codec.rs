//! Bitfield codec for target memory images.
//!
//! Relocation fields are arbitrary-width, arbitrarily-aligned runs of bits
//! embedded in a sequence of target addressable units. [`BitCursor`] wraps the
//! byte window containing one field and reads ([`BitCursor::unpack`]) or
//! rewrites ([`BitCursor::repack`]) the field while honoring the target byte
//! order and preserving every bit outside the field.

use crate::{Rvalue, Urvalue};
use core::fmt::{self, Display};

/// Byte order of the target memory image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Bit geometry of a relocation field inside its containing window.
///
/// `offset` counts from the least significant bit of the window; `size` is the
/// field width in bits, at most 32.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub size: u16,
    pub offset: u16,
}

/// Overflow classification applied when a value is packed into a field.
///
/// The two tolerance classes accept values that exceed the exact signed range
/// by a fixed number of extra magnitude bits. They reproduce the graduated
/// thresholds of the `OVF_LIMIT` table used by scaled relocations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldSign {
    /// Zero-extended field; any bit above the field width overflows.
    Unsigned,
    /// Exact two's-complement fit.
    Signed,
    /// Signed fit with one extra magnitude bit of headroom.
    SignedTol1,
    /// Signed fit with two extra magnitude bits of headroom.
    SignedTol2,
}

/// Headroom multipliers for the three signed overflow classes, indexed by
/// [`FieldSign::ovf_class`]. A `w`-bit field with headroom `h` accepts values
/// in `-h * 2^(w-1) .. h * 2^(w-1)`.
const OVF_LIMIT: [i64; 3] = [1, 2, 4];

impl FieldSign {
    fn ovf_class(self) -> Option<usize> {
        match self {
            FieldSign::Unsigned => None,
            FieldSign::Signed => Some(0),
            FieldSign::SignedTol1 => Some(1),
            FieldSign::SignedTol2 => Some(2),
        }
    }
}

/// A value did not fit the field it was packed into.
///
/// The clipped bits are written regardless; the caller decides whether the
/// condition is fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldOverflow {
    /// The unclipped value that was packed.
    pub value: Rvalue,
    /// Width of the field in bits.
    pub size: u16,
}

impl Display for FieldOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "value 0x{:x} overflows {} bit field",
            self.value as Urvalue, self.size
        )
    }
}

/// Cursor over the byte window of one relocation field.
///
/// The window must start at the lowest host address containing the field's
/// bits and may span at most eight bytes. For little-endian targets the bytes
/// gain significance in ascending address order, for big-endian targets in
/// descending order; `offset` always counts from the least significant bit of
/// the assembled window.
pub struct BitCursor<'a> {
    window: &'a mut [u8],
    endian: Endian,
}

impl<'a> BitCursor<'a> {
    pub fn new(window: &'a mut [u8], endian: Endian) -> Self {
        debug_assert!(
            window.len() <= 8,
            "field window wider than the 64-bit accumulator"
        );
        Self { window, endian }
    }

    /// Assembles the window into a single accumulator.
    fn load(&self) -> u64 {
        let mut acc = 0u64;
        match self.endian {
            Endian::Little => {
                for (i, byte) in self.window.iter().enumerate() {
                    acc |= (*byte as u64) << (8 * i);
                }
            }
            Endian::Big => {
                for byte in self.window.iter() {
                    acc = (acc << 8) | *byte as u64;
                }
            }
        }
        acc
    }

    /// Scatters the accumulator back into the window.
    fn store(&mut self, acc: u64) {
        let len = self.window.len();
        match self.endian {
            Endian::Little => {
                for (i, byte) in self.window.iter_mut().enumerate() {
                    *byte = (acc >> (8 * i)) as u8;
                }
            }
            Endian::Big => {
                for (i, byte) in self.window.iter_mut().enumerate() {
                    *byte = (acc >> (8 * (len - 1 - i))) as u8;
                }
            }
        }
    }

    /// Extracts a `size`-bit field `offset` bits into the window.
    ///
    /// The result is sign-extended for every signed class and zero-extended
    /// for [`FieldSign::Unsigned`].
    pub fn unpack(&self, size: u16, offset: u16, sign: FieldSign) -> Rvalue {
        debug_assert!(size >= 1 && size <= 32);
        debug_assert!(offset as usize + size as usize <= 8 * self.window.len());
        let raw = ((self.load() >> offset) & mask(size)) as Urvalue;
        match sign {
            FieldSign::Unsigned => raw as Rvalue,
            _ => {
                let shift = 32 - size as u32;
                ((raw << shift) as Rvalue) >> shift
            }
        }
    }

    /// Packs `value` into a `size`-bit field `offset` bits into the window.
    ///
    /// Bits outside the field are preserved. The value is clipped to the field
    /// mask and written even when it overflows; overflow is judged on the
    /// unclipped value and returned for the caller to classify.
    pub fn repack(
        &mut self,
        value: Rvalue,
        size: u16,
        offset: u16,
        sign: FieldSign,
    ) -> Result<(), FieldOverflow> {
        debug_assert!(size >= 1 && size <= 32);
        debug_assert!(offset as usize + size as usize <= 8 * self.window.len());
        let field_mask = mask(size) << offset;
        let mut acc = self.load();
        acc &= !field_mask;
        acc |= ((value as Urvalue as u64) << offset) & field_mask;
        self.store(acc);
        if fits(value, size, sign) {
            Ok(())
        } else {
            Err(FieldOverflow { value, size })
        }
    }
}

fn mask(size: u16) -> u64 {
    if size >= 64 { u64::MAX } else { (1u64 << size) - 1 }
}

/// Whether `value` is representable in a `size`-bit field of the given class.
fn fits(value: Rvalue, size: u16, sign: FieldSign) -> bool {
    if size >= 32 {
        return true;
    }
    match sign.ovf_class() {
        None => (value as Urvalue) >> size == 0,
        Some(class) => {
            let bound = OVF_LIMIT[class] << (size - 1);
            let value = value as i64;
            value >= -bound && value < bound
        }
    }
}
