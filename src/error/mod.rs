//! Error types and handling for gadgetize
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`asset`]: Release index, download and integrity errors
//! - [`fs`]: File system errors
//! - [`patch`]: Manifest and smali patching errors
//!
//! Every error is fatal to a run. The orchestrator wraps failures in
//! [`GadgetError::PhaseFailed`] so the message names the pipeline phase.

pub mod asset;
pub mod fs;
pub mod patch;

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Pipeline phase a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Decompile,
    Manifest,
    Locate,
    Fetch,
    Patch,
    Place,
    Recompile,
    Sign,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Decompile => "decompile",
            Phase::Manifest => "manifest",
            Phase::Locate => "locate entry point",
            Phase::Fetch => "fetch gadget",
            Phase::Patch => "patch smali",
            Phase::Place => "place library",
            Phase::Recompile => "recompile",
            Phase::Sign => "sign",
        };
        f.write_str(name)
    }
}

/// Main error type for gadgetize operations
#[derive(Error, Diagnostic, Debug)]
pub enum GadgetError {
    // Configuration errors
    #[error("Required tool '{tool}' was not found")]
    #[diagnostic(code(gadgetize::config::tool_not_found), help("{hint}"))]
    ToolNotFound { tool: String, hint: String },

    #[error("Cache operation failed: {message}")]
    #[diagnostic(code(gadgetize::cache::operation_failed))]
    CacheOperationFailed { message: String },

    // Input errors
    #[error("Can't find the target APK '{path}'")]
    #[diagnostic(code(gadgetize::input::apk_not_found))]
    ApkNotFound { path: String },

    #[error("Not an APK file: '{path}'")]
    #[diagnostic(
        code(gadgetize::input::invalid_apk),
        help("The input package must have the .apk extension")
    )]
    InvalidApk { path: String },

    #[error("Unsupported architecture: {arch}")]
    #[diagnostic(
        code(gadgetize::input::unsupported_arch),
        help("Supported architectures: arm, arm64, x86, x86_64")
    )]
    UnsupportedArch { arch: String },

    #[error("Unknown shell: {shell}")]
    #[diagnostic(
        code(gadgetize::input::unsupported_shell),
        help("Supported shells: bash, elvish, fish, powershell, zsh")
    )]
    UnsupportedShell { shell: String },

    #[error("Invalid gadget version: '{version}'")]
    #[diagnostic(code(gadgetize::input::invalid_version))]
    InvalidVersion { version: String },

    #[error("Decompiled directory not found: {path}")]
    #[diagnostic(
        code(gadgetize::input::work_dir_missing),
        help("Run once without --skip-decompile to create it")
    )]
    WorkDirMissing { path: String },

    // Not found errors
    #[error("Release '{tag}' not found in {repository}")]
    #[diagnostic(
        code(gadgetize::asset::release_not_found),
        help("Are you sure this version is available on GitHub?")
    )]
    ReleaseNotFound { repository: String, tag: String },

    #[error("'{name}' not found in the assets of release {version}")]
    #[diagnostic(
        code(gadgetize::asset::not_found),
        help("The release does not ship a gadget for this architecture")
    )]
    AssetNotFound { name: String, version: String },

    #[error("Entry point class '{class}' not found, expected '{path}' in: {roots}")]
    #[diagnostic(
        code(gadgetize::locate::not_found),
        help("The class name may be obfuscated; pass --main-activity to override it")
    )]
    EntryPointNotFound {
        class: String,
        path: String,
        roots: String,
    },

    #[error("No launchable activity is declared in the manifest")]
    #[diagnostic(
        code(gadgetize::locate::no_candidates),
        help("Pass the entry point class with --main-activity")
    )]
    NoEntryPointCandidates,

    #[error("Multiple activities and no launcher declared: {candidates}")]
    #[diagnostic(
        code(gadgetize::locate::ambiguous),
        help("Pick one with --main-activity")
    )]
    AmbiguousEntryPoint { candidates: String },

    #[error("Closing </manifest> tag not found in {path}")]
    #[diagnostic(code(gadgetize::manifest::malformed))]
    ManifestClosingTagMissing { path: String },

    #[error("Failed to parse manifest {path}: {reason}")]
    #[diagnostic(code(gadgetize::manifest::parse_failed))]
    ManifestParseFailed { path: String, reason: String },

    // Integrity errors
    #[error("Checksum mismatch for '{file}': expected {expected}, got {actual}")]
    #[diagnostic(
        code(gadgetize::asset::checksum_mismatch),
        help("The corrupt download was removed; run the command again")
    )]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Release {version} of {repository} does not publish a checksum for '{name}'")]
    #[diagnostic(code(gadgetize::asset::checksum_missing))]
    ChecksumMissing {
        repository: String,
        version: String,
        name: String,
    },

    // Patch errors
    #[error("Cannot find an injectable onCreate or constructor method in '{class}'")]
    #[diagnostic(
        code(gadgetize::patch::no_entry_method),
        help(
            "Please report the issue at https://github.com/ksg97031/frida-gadget/issues \
             with the APK name, APK version, device OS and Frida version"
        )
    )]
    NoInjectableMethod { class: String },

    #[error("Method '{method}' references v{register} but declares only {locals} locals")]
    #[diagnostic(
        code(gadgetize::patch::register_collision),
        help("The smali looks corrupt or uses an unexpected register convention")
    )]
    RegisterCollision {
        method: String,
        register: u32,
        locals: u32,
    },

    #[error("Method '{method}' already uses {locals} locals; v{locals} cannot hold a string")]
    #[diagnostic(code(gadgetize::patch::register_out_of_range))]
    RegisterOutOfRange { method: String, locals: u32 },

    #[error("'{class}' already loads '{library}'")]
    #[diagnostic(
        code(gadgetize::patch::already_injected),
        help("The package has already been patched; start from the original APK")
    )]
    AlreadyInjected { class: String, library: String },

    // External tool errors
    #[error("{tool} {action} failed{}", exit_suffix(.code))]
    #[diagnostic(code(gadgetize::tool::failed), help("{hint}"))]
    ToolFailed {
        tool: String,
        action: String,
        code: Option<i32>,
        hint: String,
    },

    // Network and parsing
    #[error("HTTP request failed: {message}")]
    #[diagnostic(
        code(gadgetize::net::http),
        help("Network errors are not retried; run the command again")
    )]
    Http { message: String },

    #[error("Failed to parse JSON: {message}")]
    #[diagnostic(code(gadgetize::net::json))]
    Json { message: String },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(gadgetize::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(gadgetize::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(gadgetize::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(gadgetize::fs::io_error))]
    IoError { message: String },

    #[error("{phase} phase failed: {source}")]
    #[diagnostic(code(gadgetize::phase_failed))]
    PhaseFailed {
        phase: Phase,
        #[source]
        source: Box<GadgetError>,
    },
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => " (terminated by signal)".to_string(),
    }
}

impl GadgetError {
    /// Wrap the error with the pipeline phase it happened in
    pub fn in_phase(self, phase: Phase) -> Self {
        GadgetError::PhaseFailed {
            phase,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping phase wrappers
    pub fn root(&self) -> &GadgetError {
        match self {
            GadgetError::PhaseFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<std::io::Error> for GadgetError {
    fn from(err: std::io::Error) -> Self {
        GadgetError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for GadgetError {
    fn from(err: reqwest::Error) -> Self {
        let message = match err.url() {
            Some(url) => format!("{url}: {err}"),
            None => err.to_string(),
        };
        GadgetError::Http { message }
    }
}

impl From<serde_json::Error> for GadgetError {
    fn from(err: serde_json::Error) -> Self {
        GadgetError::Json {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, GadgetError>;

/// Attach a pipeline phase to a result's error
pub trait PhaseExt<T> {
    fn phase(self, phase: Phase) -> Result<T>;
}

impl<T> PhaseExt<T> for Result<T> {
    fn phase(self, phase: Phase) -> Result<T> {
        self.map_err(|e| e.in_phase(phase))
    }
}
