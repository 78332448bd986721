//! Projects debug information back into function records
//!
//! This is the inverse of [`PdbReader`](crate::PdbReader). The records it produces can be handed
//! to an encoder, or loaded straight back through a [`MemoryStore`](crate::MemoryStore).

use crate::cil::{InstructionId, MethodBody, VariableDefinition};
use crate::documents::Document;
use crate::function::{PdbFunction, PdbIteratorScope, PdbLine, PdbLines, PdbScope, PdbSlot};
use crate::header::BindingKey;
use crate::locator::{InstructionRange, OffsetRange};
use crate::scopes::{ScopeId, ScopeTree};
use crate::store::FunctionTable;
use crate::symbols::MethodSymbols;
use crate::token::Token;
use anyhow::bail;
use clrpdb_coff::IMAGE_DEBUG_DIRECTORY;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Writes debug information for the methods of one assembly.
pub trait SymbolWriter {
    /// The debug directory entry and CodeView header to embed in the assembly.
    fn get_debug_header(&self) -> (IMAGE_DEBUG_DIRECTORY, Vec<u8>);

    /// Records the debug information attached to `body`.
    fn write(&mut self, body: &MethodBody) -> anyhow::Result<()>;

    /// Records standalone method symbols.
    fn write_symbols(&mut self, symbols: &MethodSymbols) -> anyhow::Result<()>;
}

/// A [`SymbolWriter`] that collects [`PdbFunction`] records.
pub struct PdbWriter {
    key: BindingKey,
    pdb_path: String,
    time_date_stamp: u32,
    functions: Vec<PdbFunction>,
    written: HashSet<Token>,
}

impl PdbWriter {
    /// `pdb_path` is the path recorded in the CodeView header.
    pub fn new(key: BindingKey, pdb_path: &str) -> Self {
        Self {
            key,
            pdb_path: pdb_path.to_string(),
            time_date_stamp: 0,
            functions: Vec::new(),
            written: HashSet::new(),
        }
    }

    /// Sets the time stamp of the debug directory entry.
    pub fn set_time_date_stamp(&mut self, time_date_stamp: u32) {
        self.time_date_stamp = time_date_stamp;
    }

    /// Number of records written so far.
    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    /// Returns the collected records.
    pub fn finish(self) -> FunctionTable {
        debug!("finished symbol table with {} functions", self.functions.len());
        FunctionTable {
            guid: self.key.guid,
            age: self.key.age,
            functions: self.functions,
        }
    }

    fn push(&mut self, function: PdbFunction) -> anyhow::Result<()> {
        if !self.written.insert(function.token) {
            bail!("Debug information for method {} was already written", function.token);
        }

        if function.is_empty() {
            trace!("method {} has no debug information", function.token);
            return Ok(());
        }

        self.functions.push(function);
        Ok(())
    }
}

impl SymbolWriter for PdbWriter {
    fn get_debug_header(&self) -> (IMAGE_DEBUG_DIRECTORY, Vec<u8>) {
        let bytes = self.key.to_header_bytes(&self.pdb_path);
        let directory = IMAGE_DEBUG_DIRECTORY::codeview(self.time_date_stamp, bytes.len() as u32);
        (directory, bytes)
    }

    fn write(&mut self, body: &MethodBody) -> anyhow::Result<()> {
        let mut function = PdbFunction::new(body.method_token());

        let mut lines = LineGrouper::default();
        for (instr, sp) in body.sequence_points() {
            lines.add(&sp.document, sp.to_line(instr.offset));
        }
        function.lines = lines.finish();

        if let Some(info) = body.debug_information() {
            let offsets = |r: &InstructionRange| instruction_range_offsets(body, r);
            let mut namespaces = NamespaceDealer::default();
            function.scopes = scope_records(&info.scopes, &offsets, body.variables(), &mut namespaces);

            function.iterator_class = info.iterator_type.as_ref().map(|t| t.name.clone());
            function.iterator_scopes = info
                .iterator_scopes
                .iter()
                .map(|r| {
                    let (offset, length) = offsets(r);
                    PdbIteratorScope { offset, length }
                })
                .collect();
            function.synchronization = info.synchronization.as_ref().map(|s| s.to_record());
        }

        self.push(function)
    }

    fn write_symbols(&mut self, symbols: &MethodSymbols) -> anyhow::Result<()> {
        let mut function = PdbFunction::new(symbols.method_token);

        let mut lines = LineGrouper::default();
        for i in symbols.instructions.iter() {
            lines.add(&i.sequence_point.document, i.sequence_point.to_line(i.offset));
        }
        function.lines = lines.finish();

        let offsets = |r: &OffsetRange| (r.start, r.len());
        let mut namespaces = NamespaceDealer {
            namespaces: &symbols.used_namespaces,
            counts: &symbols.using_counts,
            next: 0,
            scope_index: 0,
        };
        function.scopes = scope_records(&symbols.scopes, &offsets, &symbols.variables, &mut namespaces);
        let leftover = namespaces.rest();
        if !leftover.is_empty() {
            match function.scopes.first_mut() {
                Some(root) => root.used_namespaces.extend(leftover.iter().cloned()),
                None => trace!(
                    "method {}: dropping {} namespaces with no scope to hold them",
                    symbols.method_token,
                    leftover.len()
                ),
            }
        }

        function.iterator_class = symbols.iterator_type.clone();
        function.iterator_scopes = symbols
            .iterator_scopes
            .iter()
            .map(|r| PdbIteratorScope {
                offset: r.start,
                length: r.len(),
            })
            .collect();
        function.synchronization = symbols.synchronization.as_ref().map(|s| s.to_record());
        function.using_counts = symbols.using_counts.clone();
        function.using_info_forward = symbols
            .method_whose_using_info_applies
            .as_ref()
            .map(|m| m.token);

        self.push(function)
    }
}

/// Groups line records by document, keeping documents in order of first use.
#[derive(Default)]
struct LineGrouper {
    blocks: Vec<PdbLines>,
    index: HashMap<String, usize>,
}

impl LineGrouper {
    fn add(&mut self, document: &Document, line: PdbLine) {
        let i = *self.index.entry(document.url.clone()).or_insert_with(|| {
            self.blocks.push(PdbLines {
                file: document.to_source(),
                lines: Vec::new(),
            });
            self.blocks.len() - 1
        });
        self.blocks[i].lines.push(line);
    }

    fn finish(self) -> Vec<PdbLines> {
        self.blocks
    }
}

/// Hands out namespaces to scopes in pre-order, `counts[i]` to the `i`-th scope.
#[derive(Default)]
struct NamespaceDealer<'a> {
    namespaces: &'a [String],
    counts: &'a [u16],
    next: usize,
    scope_index: usize,
}

impl<'a> NamespaceDealer<'a> {
    fn next_scope(&mut self) -> Vec<String> {
        let count = self.counts.get(self.scope_index).copied().unwrap_or(0) as usize;
        self.scope_index += 1;
        let end = (self.next + count).min(self.namespaces.len());
        let taken = self.namespaces[self.next..end].to_vec();
        self.next = end;
        taken
    }

    fn rest(&self) -> &'a [String] {
        &self.namespaces[self.next..]
    }
}

/// `(offset, length)` of an instruction range. Missing ends collapse the range.
fn instruction_range_offsets(body: &MethodBody, range: &InstructionRange) -> (u32, u32) {
    let offset_of = |id: InstructionId| body.instruction(id).map(|i| i.offset);
    let start = range.start.and_then(offset_of).unwrap_or(0);
    let end = match range.end {
        Some(end) => body.offset_after(end),
        None => start,
    };
    (start, end.saturating_sub(start))
}

fn scope_records<R>(
    tree: &ScopeTree<R>,
    offsets: &dyn Fn(&R) -> (u32, u32),
    variables: &[VariableDefinition],
    namespaces: &mut NamespaceDealer<'_>,
) -> Vec<PdbScope> {
    fn convert<R>(
        tree: &ScopeTree<R>,
        id: ScopeId,
        offsets: &dyn Fn(&R) -> (u32, u32),
        variables: &[VariableDefinition],
        namespaces: &mut NamespaceDealer<'_>,
    ) -> PdbScope {
        let scope = &tree[id];
        let (offset, length) = offsets(&scope.range);
        let slots = scope
            .variables
            .iter()
            .filter_map(|&index| {
                let name = variables.get(index as usize)?.name.as_ref()?;
                Some(PdbSlot {
                    slot: index,
                    name: name.clone(),
                })
            })
            .collect();
        let used_namespaces = namespaces.next_scope();
        let scopes = scope
            .children
            .iter()
            .map(|&child| convert(tree, child, offsets, variables, namespaces))
            .collect();

        PdbScope {
            offset,
            length,
            scopes,
            slots,
            used_namespaces,
        }
    }

    match tree.root() {
        Some(root) => vec![convert(tree, root, offsets, variables, namespaces)],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests;
