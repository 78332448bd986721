//! Resolves method tokens found in a symbol store
//!
//! Tokens stored in a symbol store were assigned by the compiler that produced the original
//! assembly. When an assembly is rewritten, its metadata tables are rebuilt and methods can get
//! new tokens. [`SymbolReaderResolver`] looks an old token up in the original metadata and, when
//! it is bound to a [`MetadataBuilder`], rebinds the result to the token the method has in the
//! metadata being built.

use crate::cil::MethodReference;
use crate::token::{Token, TokenType};
use std::collections::HashMap;
use tracing::trace;

/// Something a token can name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MetadataEntity {
    /// A method definition, member reference to a method, or method instantiation.
    Method(MethodReference),
    /// A type definition or reference.
    Type {
        #[allow(missing_docs)]
        token: Token,
        /// Namespace-qualified name.
        full_name: String,
    },
    /// A field definition or reference.
    Field {
        #[allow(missing_docs)]
        token: Token,
        #[allow(missing_docs)]
        name: String,
    },
    /// Any other row.
    Other(Token),
}

impl MetadataEntity {
    /// The token of this entity.
    pub fn token(&self) -> Token {
        match self {
            Self::Method(m) => m.token,
            Self::Type { token, .. } | Self::Field { token, .. } | Self::Other(token) => *token,
        }
    }
}

/// Looks up tokens in the metadata of the assembly as it was originally read.
pub trait TokenLookup {
    /// Finds the entity named by `token`.
    fn lookup_token(&self, token: Token) -> Option<MetadataEntity>;
}

/// The token table of a loaded assembly.
#[derive(Clone, Debug, Default)]
pub struct MetadataReader {
    entities: HashMap<Token, MetadataEntity>,
}

impl MetadataReader {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity, replacing any previous entity with the same token.
    pub fn insert(&mut self, entity: MetadataEntity) {
        self.entities.insert(entity.token(), entity);
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl TokenLookup for MetadataReader {
    fn lookup_token(&self, token: Token) -> Option<MetadataEntity> {
        self.entities.get(&token).cloned()
    }
}

/// Assigns tokens in the metadata tables of an assembly being written.
///
/// Rows are numbered from 1 in each table, in the order they are added.
#[derive(Clone, Debug, Default)]
pub struct MetadataBuilder {
    next_rid: HashMap<TokenType, u32>,
    new_tokens: HashMap<Token, Token>,
}

impl MetadataBuilder {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next row of `table` for the entity that had `old` in the original metadata.
    pub fn add_row(&mut self, table: TokenType, old: Token) -> Token {
        let rid = self.next_rid.entry(table).or_insert(0);
        *rid += 1;
        let new = Token::new(table, *rid);
        trace!("metadata builder: {old} -> {new}");
        self.new_tokens.insert(old, new);
        new
    }

    /// The token that `old` was given in the new metadata, if it has one yet.
    pub fn lookup_new_token(&self, old: Token) -> Option<Token> {
        self.new_tokens.get(&old).copied()
    }
}

/// Resolves old method tokens during a read or a rewrite.
#[derive(Copy, Clone)]
pub struct SymbolReaderResolver<'a> {
    reader: &'a dyn TokenLookup,
    metadata: Option<&'a MetadataBuilder>,
}

impl<'a> SymbolReaderResolver<'a> {
    /// A resolver for a rewrite. Methods that `metadata` has already given a new token are
    /// returned with that token.
    pub fn new(metadata: &'a MetadataBuilder, reader: &'a dyn TokenLookup) -> Self {
        Self {
            reader,
            metadata: Some(metadata),
        }
    }

    /// A resolver that returns methods exactly as the original metadata describes them.
    pub fn reader_only(reader: &'a dyn TokenLookup) -> Self {
        Self {
            reader,
            metadata: None,
        }
    }

    /// Finds the method named by `old_token`. Returns `None` if the token is unknown or names
    /// something other than a method.
    pub fn lookup_method(&self, old_token: Token) -> Option<MethodReference> {
        if !old_token.may_be_method() {
            trace!("token {old_token} is not in a method table");
            return None;
        }

        let MetadataEntity::Method(mut method) = self.reader.lookup_token(old_token)? else {
            trace!("token {old_token} does not name a method");
            return None;
        };

        if let Some(new) = self.metadata.and_then(|m| m.lookup_new_token(old_token)) {
            method.token = new;
        }

        Some(method)
    }
}
