//! Metadata tokens
//!
//! A token names one row of one metadata table, within one specific version of an assembly's
//! metadata. The high byte selects the table and the low 24 bits are the row id (1-based).
//! Tokens taken from different versions of the same assembly are not comparable without going
//! through a [`SymbolReaderResolver`](crate::resolver::SymbolReaderResolver).

use std::fmt::{Debug, Display};

/// A 32-bit metadata token.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Token(pub u32);

impl Token {
    /// Builds a token from a table and a row id. Only the low 24 bits of `rid` are kept.
    pub const fn new(table: TokenType, rid: u32) -> Self {
        Self(((table.0 as u32) << 24) | (rid & 0x00ff_ffff))
    }

    /// The table this token points into.
    pub fn token_type(self) -> TokenType {
        TokenType((self.0 >> 24) as u8)
    }

    /// The row id within the table.
    pub fn rid(self) -> u32 {
        self.0 & 0x00ff_ffff
    }

    /// A token with a row id of zero does not point at anything.
    pub fn is_nil(self) -> bool {
        self.rid() == 0
    }

    /// True for tokens that can name a method: `MethodDef`, `MemberRef` and `MethodSpec`.
    pub fn may_be_method(self) -> bool {
        matches!(
            self.token_type(),
            TokenType::METHOD_DEF | TokenType::MEMBER_REF | TokenType::METHOD_SPEC
        )
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.token_type(), self.rid())
    }
}

/// Identifies a metadata table. This is the high byte of a [`Token`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TokenType(pub u8);

macro_rules! token_types {
    ($( $(#[$a:meta])* $name:ident = $value:expr;)*) => {
        impl TokenType {
            $(
                $(#[$a])*
                #[allow(missing_docs)]
                pub const $name: TokenType = TokenType($value);
            )*
        }

        impl Debug for TokenType {
            fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
                let s: &str = match *self {
                    $( TokenType::$name => stringify!($name), )*
                    _ => return write!(fmt, "??(0x{:02x})", self.0),
                };
                fmt.write_str(s)
            }
        }
    }
}

token_types! {
    MODULE = 0x00;
    TYPE_REF = 0x01;
    TYPE_DEF = 0x02;
    FIELD = 0x04;
    METHOD_DEF = 0x06;
    PARAM = 0x08;
    INTERFACE_IMPL = 0x09;
    MEMBER_REF = 0x0a;
    CUSTOM_ATTRIBUTE = 0x0c;
    PERMISSION = 0x0e;
    /// Holds local variable signatures, among others.
    STANDALONE_SIG = 0x11;
    EVENT = 0x14;
    PROPERTY = 0x17;
    MODULE_REF = 0x1a;
    TYPE_SPEC = 0x1b;
    ASSEMBLY = 0x20;
    ASSEMBLY_REF = 0x23;
    FILE = 0x26;
    EXPORTED_TYPE = 0x27;
    MANIFEST_RESOURCE = 0x28;
    GENERIC_PARAM = 0x2a;
    METHOD_SPEC = 0x2b;
    GENERIC_PARAM_CONSTRAINT = 0x2c;
    /// Not a table. Tokens of this type are offsets into the `#Strings` heap.
    STRING = 0x70;
}
