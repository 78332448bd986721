//! Sequence points: source spans attached to instructions

use crate::cil::Instruction;
use crate::documents::{Document, DocumentRegistry};
use crate::function::{PdbLine, PdbLines};
use crate::locator::InstructionMapper;
use crate::symbols::InstructionSymbol;
use std::rc::Rc;
use tracing::trace;

/// Line number that marks a sequence point as hidden. Debuggers step over hidden code.
pub const HIDDEN_LINE: u32 = 0xfeefee;

/// Maps one instruction to a span of a source document.
#[derive(Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub struct SequencePoint {
    pub document: Rc<Document>,
    pub start_line: u32,
    pub start_column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

impl SequencePoint {
    /// Builds a sequence point from a line record.
    pub fn new(document: Rc<Document>, line: &PdbLine) -> Self {
        Self {
            document,
            start_line: line.line_begin,
            start_column: line.col_begin,
            end_line: line.line_end,
            end_column: line.col_end,
        }
    }

    /// True for compiler-generated code with no user-visible source.
    pub fn is_hidden(&self) -> bool {
        self.start_line == HIDDEN_LINE
    }

    /// Converts back to a line record at `offset`.
    pub fn to_line(&self, offset: u32) -> PdbLine {
        PdbLine {
            offset,
            line_begin: self.start_line,
            col_begin: self.start_column,
            line_end: self.end_line,
            col_end: self.end_column,
        }
    }
}

/// Attaches a sequence point to each instruction named by a line record.
///
/// Records whose offset does not map to an instruction are dropped. If two records map to the
/// same instruction, the later one wins. Returns the number of records attached.
pub fn assign_sequence_points(
    blocks: &[PdbLines],
    documents: &mut DocumentRegistry,
    mapper: &dyn InstructionMapper,
    instructions: &mut [Instruction],
) -> usize {
    let mut attached = 0;

    for block in blocks.iter() {
        let document = documents.get_or_insert(&block.file);

        for line in block.lines.iter() {
            let Some(instr) = mapper
                .map(line.offset)
                .and_then(|id| instructions.get_mut(id.index()))
            else {
                trace!(
                    "dropping line {} at offset 0x{:x}; no instruction starts there",
                    line.line_begin,
                    line.offset
                );
                continue;
            };

            let point = SequencePoint::new(Rc::clone(&document), line);
            if point.is_hidden() {
                trace!("offset 0x{:x} is hidden", line.offset);
            }
            instr.sequence_point = Some(point);
            attached += 1;
        }
    }

    attached
}

/// Appends one [`InstructionSymbol`] per line record, keyed by raw offset.
pub fn collect_instruction_symbols(
    blocks: &[PdbLines],
    documents: &mut DocumentRegistry,
    out: &mut Vec<InstructionSymbol>,
) {
    for block in blocks.iter() {
        let document = documents.get_or_insert(&block.file);
        out.extend(block.lines.iter().map(|line| InstructionSymbol {
            offset: line.offset,
            sequence_point: SequencePoint::new(Rc::clone(&document), line),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cil::InstructionId;
    use crate::function::PdbSource;

    fn block(file: &str, lines: &[(u32, u32)]) -> PdbLines {
        PdbLines {
            file: PdbSource {
                name: file.to_string(),
                ..Default::default()
            },
            lines: lines
                .iter()
                .map(|&(offset, line)| PdbLine {
                    offset,
                    line_begin: line,
                    col_begin: 5,
                    line_end: line,
                    col_end: 20,
                })
                .collect(),
        }
    }

    fn instructions(offsets: &[u32]) -> Vec<Instruction> {
        offsets
            .iter()
            .map(|&offset| Instruction {
                offset,
                sequence_point: None,
            })
            .collect()
    }

    fn mapper_for(offsets: &'static [u32]) -> impl Fn(u32) -> Option<InstructionId> {
        move |offset| {
            offsets
                .iter()
                .position(|&o| o == offset)
                .map(|i| InstructionId(i as u32))
        }
    }

    #[test]
    fn unmapped_offsets_are_dropped() {
        static OFFSETS: [u32; 3] = [0, 4, 8];
        let mut instrs = instructions(&OFFSETS);
        let mut docs = DocumentRegistry::new();
        let n = assign_sequence_points(
            &[block("a.cs", &[(0, 1), (6, 2), (8, 3), (100, 4)])],
            &mut docs,
            &mapper_for(&OFFSETS),
            &mut instrs,
        );
        assert_eq!(n, 2);
        assert_eq!(instrs[0].sequence_point.as_ref().unwrap().start_line, 1);
        assert!(instrs[1].sequence_point.is_none());
        assert_eq!(instrs[2].sequence_point.as_ref().unwrap().start_line, 3);
    }

    #[test]
    fn last_write_wins() {
        static OFFSETS: [u32; 2] = [0, 4];
        let mut instrs = instructions(&OFFSETS);
        let mut docs = DocumentRegistry::new();
        assign_sequence_points(
            &[block("a.cs", &[(4, 1)]), block("b.cs", &[(4, 9)])],
            &mut docs,
            &mapper_for(&OFFSETS),
            &mut instrs,
        );
        let sp = instrs[1].sequence_point.as_ref().unwrap();
        assert_eq!(sp.start_line, 9);
        assert_eq!(sp.document.url, "b.cs");
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn standalone_keeps_every_record() {
        let mut docs = DocumentRegistry::new();
        let mut out = Vec::new();
        collect_instruction_symbols(&[block("a.cs", &[(0, 1), (3, 2)])], &mut docs, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].offset, 3);
        assert_eq!(out[1].sequence_point.start_column, 5);
        assert_eq!(out[1].sequence_point.end_column, 20);
        assert!(Rc::ptr_eq(
            &out[0].sequence_point.document,
            &out[1].sequence_point.document
        ));
    }

    #[test]
    fn hidden() {
        let doc = Rc::new(Document::from_source(&PdbSource::default()));
        let line = PdbLine {
            offset: 2,
            line_begin: HIDDEN_LINE,
            line_end: HIDDEN_LINE,
            ..Default::default()
        };
        let sp = SequencePoint::new(doc, &line);
        assert!(sp.is_hidden());
        assert_eq!(sp.to_line(2), line);
    }

    #[test]
    fn hidden_lines_are_attached() {
        static OFFSETS: [u32; 2] = [0, 2];
        let mut instrs = instructions(&OFFSETS);
        let mut docs = DocumentRegistry::new();
        let n = assign_sequence_points(
            &[block("a.cs", &[(0, 7), (2, HIDDEN_LINE)])],
            &mut docs,
            &mapper_for(&OFFSETS),
            &mut instrs,
        );
        assert_eq!(n, 2);
        assert!(!instrs[0].sequence_point.as_ref().unwrap().is_hidden());
        assert!(instrs[1].sequence_point.as_ref().unwrap().is_hidden());
    }
}
