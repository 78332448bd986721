//! The CodeView debug header that binds an assembly to its symbol store
//!
//! An assembly's debug directory contains an `IMAGE_DEBUG_TYPE_CODEVIEW` entry whose data starts
//! with this header:
//!
//! ```text
//! 0   magic   u32     "RSDS" (0x53445352)
//! 4   guid    [u8;16] GUID in mixed-endian layout
//! 20  age     u32
//! 24  path    strz    path of the PDB (ignored when reading)
//! ```
//!
//! # References
//! * <https://github.com/dotnet/runtime/blob/main/docs/design/specs/PE-COFF.md#codeview-debug-directory-entry-type-2>

use pretty_hex::PrettyHex;
use static_assertions::const_assert_eq;
use std::fmt::{Debug, Display};
use std::mem::size_of;
use tracing::debug;
use uuid::Uuid;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, LE, U32, Unaligned};

/// Magic value of a CodeView 7.0 header, `"RSDS"` read as a little-endian `u32`.
pub const CV_SIGNATURE_RSDS: u32 = 0x5344_5352;

/// The fixed-size part of the CodeView header.
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone)]
#[repr(C)]
#[allow(missing_docs)]
pub struct CodeViewHeader {
    pub magic: U32<LE>,
    pub guid: [u8; 16],
    pub age: U32<LE>,
}

const_assert_eq!(size_of::<CodeViewHeader>(), 24);

/// The identity shared by an assembly and its symbol store.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct BindingKey {
    /// Chosen by the compiler; the same value is stored in the assembly and the symbol store.
    pub guid: Uuid,
    /// Incremented each time the assembly and store are rewritten together.
    pub age: u32,
}

impl Debug for BindingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.age > 0x1000 {
            write!(f, "{:?} age 0x{:x}", self.guid, self.age)
        } else {
            write!(f, "{:?} age {}", self.guid, self.age)
        }
    }
}

impl BindingKey {
    /// Encodes the header for this key, followed by the NUL-terminated `pdb_path`.
    pub fn to_header_bytes(&self, pdb_path: &str) -> Vec<u8> {
        let header = CodeViewHeader {
            magic: U32::new(CV_SIGNATURE_RSDS),
            guid: self.guid.to_bytes_le(),
            age: U32::new(self.age),
        };
        let mut out = Vec::with_capacity(size_of::<CodeViewHeader>() + pdb_path.len() + 1);
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(pdb_path.as_bytes());
        out.push(0);
        out
    }
}

/// Reasons a debug header was not accepted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DebugHeaderError {
    /// The header is shorter than 24 bytes. Holds the actual length.
    TooShort(usize),
    /// The magic value is not `RSDS`. Holds the value found.
    BadMagic(u32),
    /// The header is well-formed but names a different symbol store.
    IdentityMismatch {
        /// The GUID in the assembly.
        header: Uuid,
        /// The GUID in the symbol store.
        store: Uuid,
    },
    /// The symbol store could not be decoded.
    LoadFailed(String),
}

impl std::error::Error for DebugHeaderError {}

impl Display for DebugHeaderError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::TooShort(len) => write!(
                fmt,
                "The debug header is too short ({len} bytes, need {}).",
                size_of::<CodeViewHeader>()
            ),
            Self::BadMagic(magic) => write!(
                fmt,
                "The debug header has the wrong magic value (0x{magic:08x}, expected 0x{CV_SIGNATURE_RSDS:08x})."
            ),
            Self::IdentityMismatch { header, store } => write!(
                fmt,
                "The debug header names GUID {header}, but the symbol store has GUID {store}."
            ),
            Self::LoadFailed(e) => write!(fmt, "The symbol store could not be loaded: {e}"),
        }
    }
}

/// Decodes the fixed-size part of a CodeView header. Bytes after the first 24 are ignored.
pub fn parse_debug_header(bytes: &[u8]) -> Result<BindingKey, DebugHeaderError> {
    let Ok((header, _rest)) = CodeViewHeader::ref_from_prefix(bytes) else {
        debug!(
            "debug header is too short ({} bytes):\n{:?}",
            bytes.len(),
            bytes.hex_dump()
        );
        return Err(DebugHeaderError::TooShort(bytes.len()));
    };

    let magic = header.magic.get();
    if magic != CV_SIGNATURE_RSDS {
        debug!(
            "debug header has bad magic 0x{magic:08x}:\n{:?}",
            header.as_bytes().hex_dump()
        );
        return Err(DebugHeaderError::BadMagic(magic));
    }

    Ok(BindingKey {
        guid: Uuid::from_bytes_le(header.guid),
        age: header.age.get(),
    })
}
