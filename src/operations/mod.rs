//! High-level operations
//!
//! - PatchOperation: the decode, patch, rebuild pipeline over one APK
//!
//! The operations coordinate with:
//! - Workspace: the decoded tree (from workspace module)
//! - Assets: gadget and signer downloads (from assets module)
//! - Smali: entry-point lookup and injection (from smali module)
//! - UI: progress reporting (from ui module)

pub mod patch;

pub use patch::{PatchOperation, PatchOptions};
