//! Chooses a symbol reader for an assembly
//!
//! Hosts register one [`SymbolReaderProvider`] per symbol format in a [`ProviderRegistry`] at
//! startup, then ask the registry for the format they want. Nothing is discovered at run time.

use crate::reader::{PdbReader, ReaderOptions, SymbolReader};
use crate::store::SymbolStore;
use anyhow::{Context, bail};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use sync_file::RandomAccessFile;
use tracing::debug;

/// Symbol store formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SymbolKind {
    /// Windows PDB, stored next to the assembly as `<name>.pdb`.
    Pdb,
    /// Mono MDB, stored as `<assembly>.mdb`.
    Mdb,
}

/// Creates symbol readers for one format.
pub trait SymbolReaderProvider {
    /// Opens the symbol store that belongs to the assembly at `assembly_path`.
    fn get_symbol_reader(&self, assembly_path: &Path) -> anyhow::Result<Box<dyn SymbolReader>>;

    /// Opens a symbol store from an already-open file.
    fn get_symbol_reader_from_file(&self, file: File) -> anyhow::Result<Box<dyn SymbolReader>>;
}

/// Maps each [`SymbolKind`] to its provider.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<SymbolKind, Box<dyn SymbolReaderProvider>>,
}

impl ProviderRegistry {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the provider for `kind`, replacing any earlier one.
    pub fn register(&mut self, kind: SymbolKind, provider: Box<dyn SymbolReaderProvider>) {
        debug!("registered symbol reader provider for {kind:?}");
        self.providers.insert(kind, provider);
    }

    /// The provider for `kind`.
    pub fn resolve(&self, kind: SymbolKind) -> anyhow::Result<&dyn SymbolReaderProvider> {
        match self.providers.get(&kind) {
            Some(p) => Ok(p.as_ref()),
            None => bail!("No symbol reader provider is registered for {kind:?}"),
        }
    }

    /// Shorthand for `resolve(kind)?.get_symbol_reader(assembly_path)`.
    pub fn get_symbol_reader(
        &self,
        kind: SymbolKind,
        assembly_path: &Path,
    ) -> anyhow::Result<Box<dyn SymbolReader>> {
        self.resolve(kind)?.get_symbol_reader(assembly_path)
    }
}

/// Decodes a symbol store from a file.
pub type StoreDecoder = Box<dyn Fn(RandomAccessFile) -> anyhow::Result<Box<dyn SymbolStore>>>;

/// Provides [`PdbReader`]s. Decoding the file is delegated to a [`StoreDecoder`].
pub struct PdbReaderProvider {
    decoder: StoreDecoder,
    options: ReaderOptions,
}

impl PdbReaderProvider {
    /// Creates a provider that uses `decoder` on each file it opens.
    pub fn new(decoder: StoreDecoder) -> Self {
        Self {
            decoder,
            options: ReaderOptions::default(),
        }
    }

    /// Sets the options of the readers this provider creates.
    pub fn with_options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }
}

impl SymbolReaderProvider for PdbReaderProvider {
    fn get_symbol_reader(&self, assembly_path: &Path) -> anyhow::Result<Box<dyn SymbolReader>> {
        let pdb_path = assembly_path.with_extension("pdb");
        let file = File::open(&pdb_path)
            .with_context(|| format!("Failed to open symbol store {}", pdb_path.display()))?;
        debug!("opened symbol store {}", pdb_path.display());
        self.get_symbol_reader_from_file(file)
    }

    fn get_symbol_reader_from_file(&self, file: File) -> anyhow::Result<Box<dyn SymbolReader>> {
        let store = (self.decoder)(RandomAccessFile::from(file))?;
        Ok(Box::new(PdbReader::with_options(store, self.options.clone())))
    }
}
