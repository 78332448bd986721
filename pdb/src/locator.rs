//! Maps IL byte offsets to instructions

use crate::cil::{InstructionId, MethodBody};

/// Finds the instruction that starts at a byte offset.
///
/// Returns `None` for offsets that do not start an instruction, including offsets at or past the
/// end of the body.
pub trait InstructionMapper {
    /// Maps one offset.
    fn map(&self, offset: u32) -> Option<InstructionId>;
}

impl<F: Fn(u32) -> Option<InstructionId>> InstructionMapper for F {
    fn map(&self, offset: u32) -> Option<InstructionId> {
        self(offset)
    }
}

/// An [`InstructionMapper`] built from the offsets of a method body.
///
/// The map owns a copy of the offsets, so the body can be modified while the map is in use.
#[derive(Clone, Debug, Default)]
pub struct OffsetMap {
    /// Sorted by offset.
    offsets: Vec<(u32, InstructionId)>,
}

impl OffsetMap {
    /// Captures the instruction offsets of `body`.
    pub fn for_body(body: &MethodBody) -> Self {
        let mut offsets: Vec<(u32, InstructionId)> = body
            .instructions()
            .iter()
            .enumerate()
            .map(|(i, instr)| (instr.offset, InstructionId(i as u32)))
            .collect();
        offsets.sort_by_key(|&(offset, _)| offset);
        Self { offsets }
    }
}

impl InstructionMapper for OffsetMap {
    fn map(&self, offset: u32) -> Option<InstructionId> {
        let i = self
            .offsets
            .binary_search_by_key(&offset, |&(o, _)| o)
            .ok()?;
        Some(self.offsets[i].1)
    }
}

/// A range of instructions, both ends inclusive.
///
/// Either end may be absent when the store describes a range that does not line up with the
/// instruction stream.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct InstructionRange {
    /// First instruction in the range.
    pub start: Option<InstructionId>,
    /// Last instruction in the range.
    pub end: Option<InstructionId>,
}

/// Converts the byte range `[offset, offset + length)` to an [`InstructionRange`].
///
/// `end` is the instruction before the one at `offset + length`. If nothing starts at
/// `offset + length` (usually because the range runs to the end of the body) then `end` is the
/// last instruction.
pub fn resolve_range(
    mapper: &dyn InstructionMapper,
    instruction_count: usize,
    offset: u32,
    length: u32,
) -> InstructionRange {
    let start = mapper.map(offset);
    let next = offset.checked_add(length).and_then(|end| mapper.map(end));
    let end = match next {
        Some(next) => next.previous(),
        None => instruction_count
            .checked_sub(1)
            .map(|last| InstructionId(last as u32)),
    };
    InstructionRange { start, end }
}

/// A range of raw byte offsets, `[start, end)`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct OffsetRange {
    #[allow(missing_docs)]
    pub start: u32,
    #[allow(missing_docs)]
    pub end: u32,
}

impl OffsetRange {
    /// The range `[offset, offset + length)`. The end is clamped to `u32::MAX`.
    pub fn new(offset: u32, length: u32) -> Self {
        Self {
            start: offset,
            end: offset.saturating_add(length),
        }
    }

    /// Zero if `end` is before `start`.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}
