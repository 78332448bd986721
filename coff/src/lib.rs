//! Definitions for the debug directory of Portable Executable (PE) images

#![allow(non_camel_case_types)]
#![forbid(unsafe_code)]

mod debug;

pub use debug::*;
