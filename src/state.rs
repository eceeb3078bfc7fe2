//! Per-load state of the relocation engine.
//!
//! One [`LoaderState`] exists per load operation and is exclusively owned by
//! the thread performing it; concurrent loads use independent instances. The
//! diagnostics configuration is passed in at construction instead of living in
//! process-wide state, so independent loads can report independently.

use crate::arch::TargetArch;
use crate::codec::Endian;
use crate::error::{relocate_error, section_error};
use crate::section::SectionInfo;
use crate::stack::ExprStack;
use crate::symbol::SymbolTable;
use crate::{Result, Rvalue};
use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use bitflags::bitflags;
use delegate::delegate;

bitflags! {
    /// Option flags of one load operation.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct LoadOptions: u32 {
        /// Treat target memory as big-endian regardless of the architecture
        /// default. Set from the input file's byte-order mark.
        const BIG_ENDIAN = 1 << 0;
        /// Emit one debug log line per processed relocation record.
        const TRACE_RELOCS = 1 << 1;
    }
}

/// One diagnostic reported through the sink.
///
/// `file_offset` locates the record in the input file (the current section's
/// file offset plus the record's target address), which is how the
/// conventional tooling around this loader identifies bad records.
pub struct Diagnostic<'a> {
    pub section: &'a str,
    pub file_offset: u32,
    pub message: Cow<'static, str>,
    /// The computed value involved, when one exists.
    pub detail: Option<i64>,
}

/// State of one load operation.
///
/// The upstream parser feeds in the section directory and the resolved local
/// symbols, then drives [`LoaderState::relocate`](crate::LoaderState::relocate)
/// once per relocation record of each section, in file order. Errors are
/// reported through the sink and counted; the engine never aborts the load on
/// its own.
pub struct LoaderState {
    pub(crate) arch: &'static TargetArch,
    pub(crate) options: LoadOptions,
    pub(crate) endian: Endian,
    pub(crate) symbols: SymbolTable,
    pub(crate) sections: Box<[SectionInfo]>,
    /// Section currently being relocated.
    pub(crate) current: Option<usize>,
    /// Run-address delta of the current section.
    pub(crate) delta_run_addr: Rvalue,
    /// File offset of the current section's data, for diagnostics.
    pub(crate) image_offset: u32,
    pub(crate) stack: ExprStack,
    pub(crate) error_count: u32,
    /// Memoized value of the architecture's base symbol.
    pub(crate) base_symbol: Option<Rvalue>,
    sink: Box<dyn FnMut(&Diagnostic)>,
}

impl LoaderState {
    /// Creates the state for one load operation.
    ///
    /// `sink` receives every diagnostic the engine reports; the caller decides
    /// whether a non-zero [`error_count`](Self::error_count) fails the load.
    pub fn new(
        arch: &'static TargetArch,
        options: LoadOptions,
        sink: impl FnMut(&Diagnostic) + 'static,
    ) -> Self {
        let endian = if options.contains(LoadOptions::BIG_ENDIAN) {
            Endian::Big
        } else {
            arch.endian
        };
        Self {
            arch,
            options,
            endian,
            symbols: SymbolTable::empty(),
            sections: Box::new([]),
            current: None,
            delta_run_addr: 0,
            image_offset: 0,
            stack: ExprStack::new(),
            error_count: 0,
            base_symbol: None,
            sink: Box::new(sink),
        }
    }

    /// Installs the resolved local symbols of the input object.
    pub fn set_symbols(&mut self, symbols: SymbolTable) {
        self.symbols = symbols;
        self.base_symbol = None;
    }

    /// Installs the parsed section directory of the input object.
    pub fn set_sections(&mut self, sections: Vec<SectionInfo>) {
        self.sections = sections.into_boxed_slice();
        self.current = None;
    }

    /// Selects the section whose relocation records follow.
    ///
    /// `image_offset` is the file offset of the section's data; it only feeds
    /// diagnostics. The expression stack is reset, since composite expressions
    /// never span sections.
    pub fn begin_section(&mut self, index: usize, image_offset: u32) -> Result<()> {
        let section = self
            .sections
            .get(index)
            .ok_or_else(|| section_error(format!("section index {index} out of range")))?;
        self.delta_run_addr = section.run_delta();
        self.image_offset = image_offset;
        self.current = Some(index);
        self.stack.clear();
        Ok(())
    }

    /// The section selected by [`begin_section`](Self::begin_section).
    #[inline]
    pub fn current_section(&self) -> Option<&SectionInfo> {
        self.current.map(|idx| &self.sections[idx])
    }

    /// The architecture this load targets.
    #[inline]
    pub fn arch(&self) -> &'static TargetArch {
        self.arch
    }

    /// Byte order the load operates in.
    #[inline]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Number of relocation errors reported so far.
    #[inline]
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    delegate! {
        to self.symbols {
            /// Number of resolved local symbols owned by this load.
            #[call(len)]
            pub fn symbol_count(&self) -> usize;
        }
    }

    /// Applies the conventional end-of-load policy: any reported relocation
    /// error fails the load.
    pub fn finish(self) -> Result<()> {
        match self.error_count {
            0 => Ok(()),
            n => Err(relocate_error(format!("{n} relocation errors reported"))),
        }
    }

    /// Value of the architecture's base symbol, resolved on first use and
    /// memoized for the rest of the load.
    pub(crate) fn base_symbol_value(&mut self) -> Option<Rvalue> {
        if let Some(base) = self.base_symbol {
            return Some(base);
        }
        let base = self.symbols.lookup_by_name(self.arch.base_symbol)?.value;
        self.base_symbol = Some(base);
        Some(base)
    }

    /// Reports one diagnostic and bumps the error counter.
    pub(crate) fn report(&mut self, vaddr: u32, message: Cow<'static, str>, detail: Option<i64>) {
        self.error_count += 1;
        let section = match self.current {
            Some(idx) => &*self.sections[idx].name,
            None => "",
        };
        let diagnostic = Diagnostic {
            section,
            file_offset: self.image_offset.wrapping_add(vaddr),
            message,
            detail,
        };
        (self.sink)(&diagnostic);
    }
}
