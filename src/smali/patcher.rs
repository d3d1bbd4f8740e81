//! Entry-point bytecode patcher
//!
//! Rewrites one method of a smali class so that its first instructions load
//! the gadget library:
//!
//! ```text
//! .method protected onCreate(Landroid/os/Bundle;)V
//!     .locals 3                                    # was 2
//!     const-string v2, "frida-gadget"
//!     invoke-static {v2}, Ljava/lang/System;->loadLibrary(Ljava/lang/String;)V
//! ```
//!
//! The new string lives in register `vN` where `N` is the old `.locals` count,
//! so no register the method already uses is touched.

use std::path::Path;

use tracing::{debug, warn};

use super::method::MethodBody;
use crate::error::{Result, patch};

const LOAD_LIBRARY: &str = "Ljava/lang/System;->loadLibrary(Ljava/lang/String;)V";
const RUNTIME_EXIT: &str = "Ljava/lang/Runtime;->exit(I)V";

/// Highest register the non-range invoke form can encode
const MAX_INVOKE_REGISTER: u32 = 15;

/// Highest register `const-string` can address
const MAX_CONST_STRING_REGISTER: u32 = 255;

/// Method conventions the patcher injects into, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryConvention {
    /// Activity lifecycle `onCreate(...)`
    OnCreate,
    /// Instance constructor `<init>(...)`
    Constructor,
}

impl EntryConvention {
    pub const PRIORITY: [EntryConvention; 2] =
        [EntryConvention::OnCreate, EntryConvention::Constructor];

    fn method_name(self) -> &'static str {
        match self {
            EntryConvention::OnCreate => "onCreate",
            EntryConvention::Constructor => "<init>",
        }
    }

    fn matches(self, method: &MethodBody) -> bool {
        method.name() == self.method_name()
    }
}

/// Where and how a class was patched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub convention: EntryConvention,
    pub method: String,
    /// Register holding the library name
    pub register: u32,
    /// `Runtime.exit` calls removed from the class
    pub removed_exit_calls: usize,
}

/// Inject a `System.loadLibrary(library)` call into smali text
///
/// `class` names the class in errors. Returns the rewritten text; apart
/// from removed `Runtime.exit` calls only the patched method differs.
pub fn inject_load_library(
    text: &str,
    class: &str,
    library: &str,
) -> Result<(String, Injection)> {
    if already_loads(text, library) {
        return Err(patch::already_injected(class, library));
    }

    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();

    let before = lines.len();
    lines.retain(|line| !is_exit_call(line));
    let removed_exit_calls = before - lines.len();
    if removed_exit_calls > 0 {
        debug!("Removed {removed_exit_calls} Runtime.exit call(s) from {class}");
    }

    let methods = MethodBody::scan(&lines);
    for convention in EntryConvention::PRIORITY {
        for method in methods.iter().filter(|m| convention.matches(m)) {
            let Some(locals) = method.locals else {
                debug!(
                    "Skipping {} in {class}: no .locals directive after the header",
                    method.signature
                );
                continue;
            };

            let register = allocate_register(method, locals, &lines)?;
            if let Some(highest) = highest_parameter_register(method, register + 1) {
                warn!(
                    "{} parameters now start past v15 (up to v{highest}); \
                     non-range invokes on p registers will not reassemble",
                    method.signature
                );
            }
            rewrite(&mut lines, method, register, library);

            let injection = Injection {
                convention,
                method: method.signature.clone(),
                register,
                removed_exit_calls,
            };
            return Ok((lines.join("\n"), injection));
        }
    }

    Err(patch::no_injectable_method(class))
}

/// Patch a smali file in place
pub fn patch_file(path: &Path, class: &str, library: &str) -> Result<Injection> {
    let text = crate::error::fs::read_to_string(path)?;
    let (patched, injection) = inject_load_library(&text, class, library)?;
    crate::error::fs::write(path, &patched)?;
    Ok(injection)
}

/// Library name `System.loadLibrary` expects for a library file name
///
/// `libfrida-gadget.so` and `frida-gadget.so` both load as `frida-gadget`.
pub fn library_name_from_file(file_name: &str) -> &str {
    let stem = file_name.strip_suffix(".so").unwrap_or(file_name);
    stem.strip_prefix("lib").unwrap_or(stem)
}

fn allocate_register<S: AsRef<str>>(
    method: &MethodBody,
    locals: u32,
    lines: &[S],
) -> Result<u32> {
    if let Some(highest) = method.highest_register(lines) {
        if highest >= locals {
            return Err(patch::register_collision(
                &method.signature,
                highest,
                locals,
            ));
        }
    }

    if locals > MAX_CONST_STRING_REGISTER {
        return Err(patch::register_out_of_range(&method.signature, locals));
    }

    Ok(locals)
}

fn rewrite(lines: &mut Vec<String>, method: &MethodBody, register: u32, library: &str) {
    let locals_line = method.header + 1;
    let indent: String = lines[locals_line]
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect();
    let line_ending = if lines[locals_line].ends_with('\r') { "\r" } else { "" };

    lines[locals_line] = format!("{indent}.locals {}{line_ending}", register + 1);

    let invoke = if register > MAX_INVOKE_REGISTER {
        warn!(
            "{} already uses {register} locals, using invoke-static/range",
            method.signature
        );
        format!("invoke-static/range {{v{register} .. v{register}}}, {LOAD_LIBRARY}")
    } else {
        format!("invoke-static {{v{register}}}, {LOAD_LIBRARY}")
    };

    lines.splice(
        locals_line + 1..locals_line + 1,
        [
            format!("{indent}const-string v{register}, \"{library}\"{line_ending}"),
            format!("{indent}{invoke}{line_ending}"),
        ],
    );
}

/// Highest register a parameter maps to with `locals` locals, when past v15
fn highest_parameter_register(method: &MethodBody, locals: u32) -> Option<u32> {
    let params = method.parameter_registers();
    let highest = (locals + params).checked_sub(1)?;
    (params > 0 && highest > MAX_INVOKE_REGISTER).then_some(highest)
}

fn is_exit_call(line: &str) -> bool {
    let code = line.trim_start();
    code.starts_with("invoke-") && code.contains(RUNTIME_EXIT)
}

fn already_loads(text: &str, library: &str) -> bool {
    let literal = format!("\"{library}\"");
    let mut has_literal = false;
    let mut has_load = false;

    for line in text.lines().map(str::trim_start) {
        has_literal |= line.starts_with("const-string") && line.contains(&literal);
        has_load |= line.starts_with("invoke-static") && line.contains(LOAD_LIBRARY);
    }

    has_literal && has_load
}
