//! Reads debug information from a symbol store into method bodies

use crate::cil::MethodBody;
use crate::documents::DocumentRegistry;
use crate::function::PdbFunction;
use crate::header::{BindingKey, DebugHeaderError, parse_debug_header};
use crate::locator::{InstructionMapper, InstructionRange, OffsetRange, resolve_range};
use crate::resolver::SymbolReaderResolver;
use crate::scopes::ScopeBuilder;
use crate::sequence_points::{assign_sequence_points, collect_instruction_symbols};
use crate::state_machine::{
    SynchronizationInformation, iterator_class, resolve_iterator_type, used_namespaces,
};
use crate::store::SymbolStore;
use crate::symbols::MethodSymbols;
use crate::token::Token;
use anyhow::{Context, bail};
use clrpdb_coff::IMAGE_DEBUG_DIRECTORY;
use std::collections::HashMap;
use tracing::{debug, trace, trace_span, warn};

/// Options for [`PdbReader`].
#[derive(Clone, Debug)]
pub struct ReaderOptions {
    /// Reject methods whose scopes name variable slots the body does not have. If this is
    /// `false`, such slots are ignored.
    pub strict_variable_slots: bool,
    /// Read iterator classes, iterator scopes and async stepping information.
    pub load_iterator_metadata: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            strict_variable_slots: false,
            load_iterator_metadata: true,
        }
    }
}

/// Reads debug information for the methods of one assembly.
pub trait SymbolReader {
    /// Checks the CodeView header of the assembly against the symbol store, loading the store on
    /// first use. Returns `false` if the header is malformed, names a different store, or the
    /// store cannot be loaded. Reads do nothing until this has returned `true`.
    fn process_debug_header(&mut self, directory: &IMAGE_DEBUG_DIRECTORY, header: &[u8]) -> bool;

    /// Creates an empty [`MethodSymbols`] for `body`.
    fn create(&self, body: &MethodBody) -> MethodSymbols;

    /// Attaches scopes, variable names, sequence points and iterator metadata to `body`.
    ///
    /// Methods that the store does not describe are left alone.
    fn read(
        &mut self,
        body: &mut MethodBody,
        mapper: &dyn InstructionMapper,
        resolver: &SymbolReaderResolver<'_>,
    ) -> anyhow::Result<()>;

    /// Reads the debug information for `symbols.method_token` into `symbols`.
    fn read_symbols(
        &mut self,
        symbols: &mut MethodSymbols,
        resolver: &SymbolReaderResolver<'_>,
    ) -> anyhow::Result<()>;
}

enum LoadState {
    Pending,
    Loaded(BindingKey),
    Failed,
}

/// A [`SymbolReader`] over a [`SymbolStore`].
///
/// The store is loaded at most once, by the first well-formed call to `process_debug_header`.
pub struct PdbReader<S> {
    store: S,
    options: ReaderOptions,
    state: LoadState,
    /// True if the most recent well-formed header matched the store.
    matched: bool,
    documents: DocumentRegistry,
    functions: HashMap<Token, PdbFunction>,
}

impl<S: SymbolStore> PdbReader<S> {
    /// Creates a reader with default options. Nothing is loaded yet.
    pub fn new(store: S) -> Self {
        Self::with_options(store, ReaderOptions::default())
    }

    #[allow(missing_docs)]
    pub fn with_options(store: S, options: ReaderOptions) -> Self {
        Self {
            store,
            options,
            state: LoadState::Pending,
            matched: false,
            documents: DocumentRegistry::new(),
            functions: HashMap::new(),
        }
    }

    /// The identity of the loaded store.
    pub fn binding_key(&self) -> Option<BindingKey> {
        match self.state {
            LoadState::Loaded(key) => Some(key),
            _ => None,
        }
    }

    /// The record for `token`, if the store has been loaded and has one.
    pub fn function(&self, token: Token) -> Option<&PdbFunction> {
        self.functions.get(&token)
    }

    /// Number of function records loaded.
    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    /// Documents referenced so far.
    pub fn documents(&self) -> &DocumentRegistry {
        &self.documents
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Like [`SymbolReader::process_debug_header`], but says why a header was rejected.
    pub fn check_debug_header(&mut self, header: &[u8]) -> Result<BindingKey, DebugHeaderError> {
        let key = parse_debug_header(header)?;

        let store_key = match self.state {
            LoadState::Loaded(store_key) => store_key,
            LoadState::Failed => {
                return Err(DebugHeaderError::LoadFailed(
                    "a previous load of this store failed".to_string(),
                ));
            }
            LoadState::Pending => match self.load() {
                Ok(store_key) => {
                    self.state = LoadState::Loaded(store_key);
                    store_key
                }
                Err(e) => {
                    self.state = LoadState::Failed;
                    return Err(DebugHeaderError::LoadFailed(format!("{e:#}")));
                }
            },
        };

        self.matched = store_key.guid == key.guid;
        if !self.matched {
            return Err(DebugHeaderError::IdentityMismatch {
                header: key.guid,
                store: store_key.guid,
            });
        }

        if store_key.age != key.age {
            debug!(
                "symbol store age {} differs from assembly age {}",
                store_key.age, key.age
            );
        }

        Ok(key)
    }

    fn load(&mut self) -> anyhow::Result<BindingKey> {
        let _span = trace_span!("PdbReader::load").entered();

        let table = self
            .store
            .load_functions()
            .context("Failed to load the function table of the symbol store")?;

        let mut functions = HashMap::with_capacity(table.functions.len());
        for function in table.functions {
            let token = function.token;
            if functions.insert(token, function).is_some() {
                bail!("The symbol store contains more than one record for method {token}");
            }
        }

        let key = BindingKey {
            guid: table.guid,
            age: table.age,
        };
        debug!("loaded {} function records, {key:?}", functions.len());
        self.functions = functions;
        Ok(key)
    }
}

impl<S: SymbolStore> SymbolReader for PdbReader<S> {
    fn process_debug_header(&mut self, directory: &IMAGE_DEBUG_DIRECTORY, header: &[u8]) -> bool {
        if !directory.is_codeview() {
            debug!("debug directory entry has type {:?}", directory.debug_type);
        }

        match self.check_debug_header(header) {
            Ok(key) => {
                debug!("debug header accepted: {key:?}");
                true
            }
            Err(e @ (DebugHeaderError::TooShort(_) | DebugHeaderError::BadMagic(_))) => {
                debug!("{e}");
                false
            }
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }

    fn create(&self, body: &MethodBody) -> MethodSymbols {
        MethodSymbols::from_body(body)
    }

    fn read(
        &mut self,
        body: &mut MethodBody,
        mapper: &dyn InstructionMapper,
        resolver: &SymbolReaderResolver<'_>,
    ) -> anyhow::Result<()> {
        let token = body.method_token();
        if !self.matched {
            return Ok(());
        }
        let Some(function) = self.functions.get(&token) else {
            trace!("no debug information for method {token}");
            return Ok(());
        };
        let _span = trace_span!("PdbReader::read", method = %token).entered();

        let instruction_count = body.instructions().len();
        let whole = InstructionRange {
            start: body.first_instruction(),
            end: body.last_instruction(),
        };
        let make_range = |offset: u32, length: u32| {
            resolve_range(mapper, instruction_count, offset, length)
        };

        // Scopes first. If the method is rejected, nothing has been modified yet.
        let build = ScopeBuilder::new(token, body.variables().len(), &make_range)
            .strict_slots(self.options.strict_variable_slots)
            .build(&function.scopes, || whole)?;

        let mut iterator_type = None;
        let mut iterator_scopes = Vec::new();
        let mut synchronization = None;
        if self.options.load_iterator_metadata {
            iterator_type = resolve_iterator_type(function, &body.method.declaring_type);
            iterator_scopes = function
                .iterator_scopes
                .iter()
                .map(|s| make_range(s.offset, s.length))
                .collect();
            synchronization = function
                .synchronization
                .as_ref()
                .and_then(|s| SynchronizationInformation::resolve(s, resolver));
        }

        let (instructions, variables, debug_information) = body.parts_mut();
        let attached =
            assign_sequence_points(&function.lines, &mut self.documents, mapper, instructions);
        build.apply_renames(variables);

        let info = debug_information.get_or_insert_with(Default::default);
        info.scopes = build.tree;
        info.iterator_type = iterator_type;
        info.iterator_scopes = iterator_scopes;
        info.synchronization = synchronization;

        trace!(
            "attached {attached} sequence points, {} scopes",
            info.scopes.len()
        );
        Ok(())
    }

    fn read_symbols(
        &mut self,
        symbols: &mut MethodSymbols,
        resolver: &SymbolReaderResolver<'_>,
    ) -> anyhow::Result<()> {
        let token = symbols.method_token;
        if !self.matched {
            return Ok(());
        }
        let Some(function) = self.functions.get(&token) else {
            trace!("no debug information for method {token}");
            return Ok(());
        };
        let _span = trace_span!("PdbReader::read_symbols", method = %token).entered();

        let code_size = symbols.code_size;
        let build = ScopeBuilder::new(token, symbols.variables.len(), &OffsetRange::new)
            .strict_slots(self.options.strict_variable_slots)
            .build(&function.scopes, || OffsetRange::new(0, code_size))?;

        collect_instruction_symbols(&function.lines, &mut self.documents, &mut symbols.instructions);
        build.apply_renames(&mut symbols.variables);
        symbols.scopes = build.tree;

        symbols.used_namespaces = used_namespaces(&function.scopes);
        symbols.using_counts = function.using_counts.clone();
        symbols.method_whose_using_info_applies = function
            .using_info_forward
            .and_then(|t| resolver.lookup_method(t));

        if self.options.load_iterator_metadata {
            symbols.iterator_type = iterator_class(function).map(str::to_string);
            symbols.iterator_scopes = function
                .iterator_scopes
                .iter()
                .map(|s| OffsetRange::new(s.offset, s.length))
                .collect();
            symbols.synchronization = function
                .synchronization
                .as_ref()
                .and_then(|s| SynchronizationInformation::resolve(s, resolver));
        }

        Ok(())
    }
}
