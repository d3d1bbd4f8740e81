//! Smali (apktool's Dalvik disassembly) handling
//!
//! - [`locator`]: choose the entry-point class and find its smali file
//! - [`method`]: method boundaries and register usage
//! - [`patcher`]: inject the library-loading call

pub mod locator;
pub mod method;
pub mod patcher;

pub use locator::{EntrySource, disassembly_roots, locate_class, select_entry_point};
pub use patcher::{Injection, library_name_from_file, patch_file};
