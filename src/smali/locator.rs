//! Entry-point selection and smali file lookup

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{GadgetError, Result};
use crate::manifest::LaunchTargets;

/// Name of the primary disassembly root
const PRIMARY_ROOT: &str = "smali";

/// How the entry-point class was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    /// `--main-activity` on the command line
    Override,
    /// The manifest's MAIN/LAUNCHER activity
    Launcher,
    /// The only activity the manifest declares
    SoleActivity,
}

/// Pick the class to inject into
///
/// An explicit override wins, then the declared launcher. Without a launcher
/// a single declared activity is accepted; several are ambiguous.
pub fn select_entry_point(
    override_class: Option<&str>,
    targets: &LaunchTargets,
) -> Result<(String, EntrySource)> {
    if let Some(class) = override_class.map(str::trim).filter(|c| !c.is_empty()) {
        let class = crate::manifest::qualify_class(targets.package.as_deref(), class);
        return Ok((class, EntrySource::Override));
    }

    if let Some(launcher) = &targets.launcher {
        return Ok((launcher.clone(), EntrySource::Launcher));
    }

    match targets.activities.as_slice() {
        [] => Err(GadgetError::NoEntryPointCandidates),
        [only] => {
            warn!("No launcher activity declared, using the only activity {only}");
            Ok((only.clone(), EntrySource::SoleActivity))
        }
        many => Err(GadgetError::AmbiguousEntryPoint {
            candidates: many.join(", "),
        }),
    }
}

/// Relative smali path of a class (`a.b.C` -> `a/b/C.smali`)
pub fn class_relative_path(class: &str) -> PathBuf {
    let mut path: PathBuf = class.split('.').collect();
    path.set_extension("smali");
    path
}

/// Disassembly roots under a decoded tree, in probe order
///
/// `smali` first, then `smali_classesN` by ascending N, then any other
/// `smali_*` directory by name.
pub fn disassembly_roots(tree: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(tree).map_err(|e| crate::error::fs::read_failed(tree, &e))?;

    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name == PRIMARY_ROOT || name.starts_with("smali_"))
        .collect();
    names.sort_by(|a, b| compare_roots(a, b));

    Ok(names.into_iter().map(|name| tree.join(name)).collect())
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum RootRank<'a> {
    Primary,
    Classes(u32),
    Other(&'a str),
}

fn rank(name: &str) -> RootRank<'_> {
    if name == PRIMARY_ROOT {
        return RootRank::Primary;
    }
    match name
        .strip_prefix("smali_classes")
        .and_then(|n| n.parse::<u32>().ok())
    {
        Some(n) => RootRank::Classes(n),
        None => RootRank::Other(name),
    }
}

fn compare_roots(a: &str, b: &str) -> Ordering {
    rank(a).cmp(&rank(b))
}

/// Find the smali file implementing `class`; the first root holding it wins
pub fn locate_class(roots: &[PathBuf], class: &str) -> Result<PathBuf> {
    let relative = class_relative_path(class);

    for root in roots {
        let candidate = root.join(&relative);
        if candidate.is_file() {
            debug!("Found {class} at {}", candidate.display());
            return Ok(candidate);
        }
    }

    let searched: Vec<String> = roots
        .iter()
        .map(|root| {
            root.file_name()
                .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().to_string())
        })
        .collect();
    Err(GadgetError::EntryPointNotFound {
        class: class.to_string(),
        path: relative.display().to_string(),
        roots: if searched.is_empty() {
            "(no smali directories)".to_string()
        } else {
            searched.join(", ")
        },
    })
}
