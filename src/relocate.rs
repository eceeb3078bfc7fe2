//! The relocation dispatcher.
//!
//! [`LoaderState::relocate`] processes one relocation record against the
//! in-memory image of the section being relocated: it resolves the record's
//! table entry, computes the relocation amount and the field geometry, applies
//! the entry's action, and writes the result back into the image or onto the
//! expression stack. Bad records are reported through the diagnostics sink and
//! counted; processing always continues with the next record so one pass
//! surfaces every problem in a section.

use crate::codec::{BitCursor, Endian};
use crate::error::section_error;
use crate::state::LoaderState;
use crate::symbol::CURRENT_SECTION;
use crate::table::{Lookup, RelocAction, RelocEntry, RelocFlags, StackOp, SymbolUse};
use crate::{Result, Rvalue, Urvalue};
use alloc::borrow::Cow;
use alloc::format;

#[cfg(feature = "log")]
use crate::state::LoadOptions;

/// One relocation entry of a section's relocation table.
///
/// Records are consumed transiently in file order; nothing is retained between
/// records except the expression stack.
#[derive(Clone, Copy, Debug, Default)]
pub struct RelocationRecord {
    /// Address of the patch site, in target addressable units from the start
    /// of the section image.
    pub target_vaddr: u32,
    /// Relocation-type code, resolved through the target's operation table.
    pub reloc_type: u16,
    /// Symbol table index, or [`CURRENT_SECTION`], or out of range when the
    /// record carries no symbol reference.
    pub symbol_index: i32,
    /// Extra displacement of displacement-carrying relocations.
    pub disp: i32,
    /// Field width in bits; consulted only when the table entry defines no
    /// geometry of its own.
    pub field_size: u16,
    /// Field bit offset; consulted only when the table entry defines no
    /// geometry of its own.
    pub field_offset: u16,
    /// Width in bits of the target word containing the field; 0 means the
    /// architecture default.
    pub word_size: u16,
    /// Raw relocation constant, the amount of symbol-less records.
    pub unsigned_value: u32,
}

/// Host-byte window of one relocation field.
struct FieldWindow {
    start: usize,
    len: usize,
    size: u16,
    offset: u16,
}

impl LoaderState {
    /// Processes one relocation record against `image`, the in-memory data of
    /// the current section.
    ///
    /// Returns `Err` only when the caller broke the protocol (no section was
    /// selected). Everything wrong with the record itself is reported through
    /// the diagnostics sink, counted, and swallowed so the caller can keep
    /// feeding records.
    pub fn relocate(&mut self, image: &mut [u8], record: &RelocationRecord) -> Result<()> {
        let run_addr = self
            .current_section()
            .ok_or_else(|| section_error("no section selected for relocation"))?
            .run_addr as Rvalue;

        let entry = match self.arch.lookup(record.reloc_type) {
            Lookup::Entry(entry) => entry,
            Lookup::Ignored => return Ok(()),
            Lookup::Unknown => {
                self.report(
                    record.target_vaddr,
                    Cow::Owned(format!(
                        "bad relocation operator 0x{:04x}",
                        record.reloc_type
                    )),
                    None,
                );
                return Ok(());
            }
        };

        #[cfg(feature = "log")]
        log::trace!(
            "reloc type 0x{:04x} at vaddr 0x{:08x} sym {}",
            record.reloc_type,
            record.target_vaddr,
            record.symbol_index
        );

        // Relocation amount for the referenced symbol, if any. An index that
        // is neither a real symbol nor the current-section sentinel leaves the
        // record's raw constant in place.
        let mut amount = record.unsigned_value as Rvalue;
        if entry.symbol != SymbolUse::None {
            if record.symbol_index >= 0 {
                if let Some(symbol) = self.symbols.get(record.symbol_index as usize) {
                    amount = match entry.symbol {
                        SymbolUse::Delta => symbol.delta,
                        _ => symbol.value,
                    };
                }
            } else if record.symbol_index == CURRENT_SECTION {
                amount = match entry.symbol {
                    SymbolUse::Delta => self.delta_run_addr,
                    _ => run_addr,
                };
            }
        }

        let window = if entry.flags.intersects(RelocFlags::RW) {
            match self.field_window(image.len(), entry, record) {
                Ok(window) => Some(window),
                Err(message) => {
                    self.report(record.target_vaddr, message, None);
                    return Ok(());
                }
            }
        } else {
            None
        };

        let mut value: Rvalue = 0;
        if entry.flags.contains(RelocFlags::READS_FIELD)
            && let Some(w) = &window
        {
            let cursor = BitCursor::new(&mut image[w.start..w.start + w.len], self.endian);
            value = cursor.unpack(w.size, w.offset, entry.sign);
            if entry.scale > 0 {
                value = value.wrapping_shl(entry.scale as u32);
            }
        }

        // Expression operators pop the prior top of stack; their right operand
        // is the record's own value, which is the unpacked field for entries
        // that read one and the resolved amount otherwise.
        use RelocAction::*;
        let operand = if entry.flags.contains(RelocFlags::READS_FIELD) {
            value
        } else {
            amount
        };
        let mut left: Rvalue = 0;
        if matches!(
            entry.action,
            Plus | Sub | Neg | Mul | Div | Mod | Shr | Ashr | Shl | And | Or | Xor | Not
        ) {
            match self.stack.pop() {
                Some(popped) => left = popped,
                None => {
                    self.report(
                        record.target_vaddr,
                        Cow::Borrowed("expression stack underflow"),
                        None,
                    );
                    return Ok(());
                }
            }
        }

        let mut value = match entry.action {
            Value => value,
            Assign => amount,
            Add => value.wrapping_add(amount),
            PcRelative => {
                // A jump to an absolute destination relocates by the move of
                // this section alone.
                let amount = if record.symbol_index == CURRENT_SECTION {
                    0
                } else {
                    amount
                };
                value.wrapping_add(amount).wrapping_sub(self.delta_run_addr)
            }
            AddDisp => value.wrapping_add(record.disp).wrapping_add(amount),
            AssignPc => run_addr.wrapping_add(amount),
            Plus => left.wrapping_add(operand),
            Sub => left.wrapping_sub(operand),
            Neg => left.wrapping_neg(),
            Mul => left.wrapping_mul(operand),
            Div | Mod => {
                if operand == 0 {
                    self.report(
                        record.target_vaddr,
                        Cow::Borrowed("relocation divides by zero"),
                        None,
                    );
                    return Ok(());
                }
                if entry.action == Div {
                    left.wrapping_div(operand)
                } else {
                    left.wrapping_rem(operand)
                }
            }
            Shr => {
                if (operand as Urvalue) >= 32 {
                    0
                } else {
                    ((left as Urvalue) >> operand) as Rvalue
                }
            }
            Ashr => {
                if (operand as Urvalue) >= 32 {
                    left >> 31
                } else {
                    left >> operand
                }
            }
            Shl => {
                if (operand as Urvalue) >= 32 {
                    0
                } else {
                    left.wrapping_shl(operand as u32)
                }
            }
            And => left & operand,
            Or => left | operand,
            Xor => left ^ operand,
            Not => !left,
            BaseRelative => {
                let Some(base) = self.base_symbol_value() else {
                    self.report(
                        record.target_vaddr,
                        Cow::Owned(format!("undefined base symbol {}", self.arch.base_symbol)),
                        None,
                    );
                    return Ok(());
                };
                value.wrapping_add(amount).wrapping_sub(base)
            }
            ScaledAdd => {
                let sum = value.wrapping_add(record.disp).wrapping_add(amount);
                if sum & ((1 << entry.scale) - 1) != 0 {
                    self.report(
                        record.target_vaddr,
                        Cow::Owned(format!(
                            "relocation result not {}-aligned",
                            1u32 << entry.scale
                        )),
                        Some(sum as i64),
                    );
                    return Ok(());
                }
                sum
            }
            Lo16 => value.wrapping_add(amount) & 0xffff,
        };

        match entry.stack {
            StackOp::Pop => match self.stack.pop() {
                Some(popped) => value = popped,
                None => {
                    self.report(
                        record.target_vaddr,
                        Cow::Borrowed("expression stack underflow"),
                        None,
                    );
                    return Ok(());
                }
            },
            StackOp::Clear => self.stack.clear(),
            _ => {}
        }

        if entry.flags.contains(RelocFlags::WRITES_FIELD) {
            if let Some(w) = &window {
                let mut out = value;
                if entry.scale > 0 {
                    out = out.wrapping_shr(entry.scale as u32);
                }
                let mut cursor = BitCursor::new(&mut image[w.start..w.start + w.len], self.endian);
                if let Err(overflow) = cursor.repack(out, w.size, w.offset, entry.sign) {
                    // The clipped bits were written anyway; report and go on.
                    self.report(
                        record.target_vaddr,
                        Cow::Owned(format!(
                            "relocation value 0x{:x} overflows {} bit field",
                            overflow.value as Urvalue, overflow.size
                        )),
                        Some(value as i64),
                    );
                }
            }
        } else if matches!(entry.stack, StackOp::Push | StackOp::Binary | StackOp::Unary)
            && self.stack.push(value).is_err()
        {
            self.report(
                record.target_vaddr,
                Cow::Borrowed("expression stack overflow"),
                None,
            );
            return Ok(());
        }

        #[cfg(feature = "log")]
        if self.options.contains(LoadOptions::TRACE_RELOCS) {
            log::debug!(
                "{}: type 0x{:04x} vaddr 0x{:08x} -> 0x{:08x}",
                self.current_section().map(|s| &*s.name).unwrap_or("?"),
                record.reloc_type,
                record.target_vaddr,
                value as Urvalue
            );
        }

        Ok(())
    }

    /// Computes the host-byte window holding the record's field.
    ///
    /// Geometry comes from the table entry when it defines one, else from the
    /// record. The target address counts addressable units; when those are
    /// narrower than a host byte the division remainder folds into the bit
    /// offset. Little-endian windows span exactly the field's bytes;
    /// big-endian windows span the containing target word so that the window
    /// always starts at the lowest host address containing the field's bits.
    fn field_window(
        &self,
        image_len: usize,
        entry: &RelocEntry,
        record: &RelocationRecord,
    ) -> core::result::Result<FieldWindow, Cow<'static, str>> {
        let (size, field_offset) = match entry.field {
            Some(field) => (field.size, field.offset),
            None => (record.field_size, record.field_offset),
        };
        if size == 0 || size > 32 {
            return Err(Cow::Borrowed("bad relocation field size"));
        }
        let bit_addr = record.target_vaddr as u64 * self.arch.tau_bits as u64;
        let start = (bit_addr / 8) as usize;
        let offset = field_offset as u32 + (bit_addr % 8) as u32;
        let len = match self.endian {
            Endian::Little => (offset as usize + size as usize).div_ceil(8),
            Endian::Big => {
                let word_bits = if record.word_size != 0 {
                    record.word_size as u32
                } else {
                    self.arch.word_bits
                };
                if offset + size as u32 > word_bits {
                    return Err(Cow::Borrowed("relocation field exceeds its target word"));
                }
                (word_bits as usize).div_ceil(8)
            }
        };
        if len > 8 {
            return Err(Cow::Borrowed("bad relocation field size"));
        }
        if start + len > image_len {
            return Err(Cow::Borrowed("relocation outside section image"));
        }
        Ok(FieldWindow {
            start,
            len,
            size,
            offset: offset as u16,
        })
    }
}
