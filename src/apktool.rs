//! External tool wrappers
//!
//! `apktool` decodes an APK into an editable tree and builds it back. It is
//! either a launcher on `PATH`, an explicit binary, or `apktool.jar` run
//! through `java -jar`. Child output is inherited so the tool's own progress
//! streams straight to the terminal.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{GadgetError, Result};

const APKTOOL_HINT: &str = "Install apktool (https://apktool.org) or pass --apktool-path";
const JAVA_HINT: &str = "Install a Java runtime and make sure `java` is on PATH";

/// How to invoke apktool
#[derive(Debug, Clone)]
pub struct Apktool {
    program: PathBuf,
    prefix: Vec<OsString>,
}

impl Apktool {
    /// Find apktool, preferring an explicit path over `PATH`
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        let Some(path) = explicit else {
            let program = which::which("apktool").map_err(|_| GadgetError::ToolNotFound {
                tool: "apktool".to_string(),
                hint: APKTOOL_HINT.to_string(),
            })?;
            debug!("Using apktool at {}", program.display());
            return Ok(Self {
                program,
                prefix: Vec::new(),
            });
        };

        if !path.is_file() {
            return Err(GadgetError::ToolNotFound {
                tool: path.display().to_string(),
                hint: APKTOOL_HINT.to_string(),
            });
        }

        let is_jar = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"));
        if is_jar {
            Ok(Self {
                program: java()?,
                prefix: vec!["-jar".into(), path.as_os_str().to_owned()],
            })
        } else {
            Ok(Self {
                program: path.to_path_buf(),
                prefix: Vec::new(),
            })
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.prefix);
        command
    }

    /// Decode `apk` into `out`, overwriting it
    pub fn decode(&self, apk: &Path, out: &Path, no_res: bool) -> Result<()> {
        let mut command = self.command();
        command.args(decode_args(apk, out, no_res));
        run(
            command,
            "apktool",
            "decode",
            "Check that the input is a valid APK; --no-res skips resource decoding",
        )
    }

    /// Build the decoded tree at `dir`; the package lands in `<dir>/dist/`
    pub fn build(&self, dir: &Path, use_aapt2: bool) -> Result<()> {
        let mut command = self.command();
        command.args(build_args(dir, use_aapt2));
        run(
            command,
            "apktool",
            "build",
            "Resource compilation often fails on newer APKs; retry with --use-aapt2, \
             or decode with --no-res",
        )
    }
}

fn decode_args(apk: &Path, out: &Path, no_res: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["d".into(), "-o".into(), out.into(), "-f".into()];
    if no_res {
        args.push("-r".into());
    }
    args.push(apk.into());
    args
}

fn build_args(dir: &Path, use_aapt2: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["b".into()];
    if use_aapt2 {
        args.push("--use-aapt2".into());
    }
    args.push(dir.into());
    args
}

/// Locate the Java runtime
pub fn java() -> Result<PathBuf> {
    which::which("java").map_err(|_| GadgetError::ToolNotFound {
        tool: "java".to_string(),
        hint: JAVA_HINT.to_string(),
    })
}

/// Re-sign `apk` in place with an uber-apk-signer jar
pub fn sign(signer_jar: &Path, apk: &Path) -> Result<()> {
    let mut command = Command::new(java()?);
    command
        .arg("-jar")
        .arg(signer_jar)
        .args(["--allowResign", "--overwrite", "-a"])
        .arg(apk);
    run(command, "uber-apk-signer", "sign", JAVA_HINT)
}

fn run(mut command: Command, tool: &str, action: &str, hint: &str) -> Result<()> {
    debug!("Running {command:?}");
    let status = command.status().map_err(|e| GadgetError::IoError {
        message: format!("Failed to run {tool}: {e}"),
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(GadgetError::ToolFailed {
            tool: tool.to_string(),
            action: action.to_string(),
            code: status.code(),
            hint: hint.to_string(),
        })
    }
}
