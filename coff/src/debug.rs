//! Image debug directory
//!
//! # References
//! * <https://learn.microsoft.com/en-us/windows/win32/api/winnt/ns-winnt-image_debug_directory>
//! * <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#debug-directory-image-only>

use core::fmt::Debug;
use core::mem::size_of;
use static_assertions::const_assert_eq;
use zerocopy_derive::*;

/// One entry of the debug directory of a PE image.
///
/// The raw data that the entry points to (`address_of_raw_data` / `pointer_to_raw_data`) is not
/// part of this record. For `IMAGE_DEBUG_TYPE_CODEVIEW` entries it is the CodeView header that
/// binds the image to its PDB.
#[allow(non_camel_case_types)]
#[repr(C)]
#[derive(
    Clone,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    FromBytes,
    IntoBytes,
    Immutable,
    KnownLayout,
)]
pub struct IMAGE_DEBUG_DIRECTORY {
    pub characteristics: u32,
    pub time_date_stamp: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub debug_type: IMAGE_DEBUG_TYPE,
    pub size_of_data: u32,
    pub address_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
}

const_assert_eq!(size_of::<IMAGE_DEBUG_DIRECTORY>(), 28);

impl IMAGE_DEBUG_DIRECTORY {
    /// Builds a CodeView entry describing `size_of_data` bytes of CodeView data.
    pub fn codeview(time_date_stamp: u32, size_of_data: u32) -> Self {
        Self {
            time_date_stamp,
            debug_type: IMAGE_DEBUG_TYPE::IMAGE_DEBUG_TYPE_CODEVIEW,
            size_of_data,
            ..Default::default()
        }
    }

    /// True if this entry points to CodeView data.
    pub fn is_codeview(&self) -> bool {
        self.debug_type == IMAGE_DEBUG_TYPE::IMAGE_DEBUG_TYPE_CODEVIEW
    }
}

/// Identifies the format of the data that an [`IMAGE_DEBUG_DIRECTORY`] points to.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Default,
    Hash,
    Ord,
    PartialOrd,
    IntoBytes,
    FromBytes,
    Immutable,
    KnownLayout,
)]
#[repr(transparent)]
#[allow(non_camel_case_types)]
pub struct IMAGE_DEBUG_TYPE(pub u32);

macro_rules! debug_types {
    ($( $(#[$a:meta])* $name:ident = $value:expr;)*) => {
        impl IMAGE_DEBUG_TYPE {
            $(
                $(#[$a])*
                pub const $name: IMAGE_DEBUG_TYPE = IMAGE_DEBUG_TYPE($value);
            )*
        }

        impl Debug for IMAGE_DEBUG_TYPE {
            fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let s: &str = match *self {
                    $( IMAGE_DEBUG_TYPE::$name => stringify!($name), )*
                    _ => return write!(fmt, "IMAGE_DEBUG_TYPE(0x{:x})", self.0),
                };
                fmt.write_str(s)
            }
        }
    }
}

debug_types! {
    IMAGE_DEBUG_TYPE_UNKNOWN = 0;
    IMAGE_DEBUG_TYPE_COFF = 1;
    /// Visual C++ / CLR debug information. Points to an `RSDS` header.
    IMAGE_DEBUG_TYPE_CODEVIEW = 2;
    IMAGE_DEBUG_TYPE_FPO = 3;
    IMAGE_DEBUG_TYPE_MISC = 4;
    IMAGE_DEBUG_TYPE_EXCEPTION = 5;
    IMAGE_DEBUG_TYPE_FIXUP = 6;
    IMAGE_DEBUG_TYPE_OMAP_TO_SRC = 7;
    IMAGE_DEBUG_TYPE_OMAP_FROM_SRC = 8;
    IMAGE_DEBUG_TYPE_BORLAND = 9;
    IMAGE_DEBUG_TYPE_CLSID = 11;
    IMAGE_DEBUG_TYPE_REPRO = 16;
    /// Embedded Portable PDB.
    IMAGE_DEBUG_TYPE_EMBEDDED_PORTABLE_PDB = 17;
    IMAGE_DEBUG_TYPE_PDB_CHECKSUM = 19;
}
