//! AndroidManifest.xml editing and launcher discovery
//!
//! Edits are plain text substitutions on the decoded manifest, each guarded by
//! a presence check so running them twice changes nothing. Launcher discovery
//! parses the same text with `quick-xml`.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use crate::error::{GadgetError, Result};

pub const MANIFEST_FILE: &str = "AndroidManifest.xml";

const INTERNET_PERMISSION: &str = "android.permission.INTERNET";
const CLOSING_TAG: &str = "</manifest>";
const EXTRACT_DISABLED: &str = ":extractNativeLibs=\"false\"";
const EXTRACT_ENABLED: &str = ":extractNativeLibs=\"true\"";

const ACTION_MAIN: &str = "android.intent.action.MAIN";
const CATEGORY_LAUNCHER: &str = "android.intent.category.LAUNCHER";

/// What a manifest patch changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestEdits {
    pub added_internet_permission: bool,
    pub enabled_extract_native_libs: bool,
}

impl ManifestEdits {
    pub fn changed(&self) -> bool {
        self.added_internet_permission || self.enabled_extract_native_libs
    }
}

/// Apply both edits to manifest text
///
/// `origin` only names the manifest in errors.
pub fn patch_manifest_text(text: &str, origin: &str) -> Result<(String, ManifestEdits)> {
    if !text.contains(CLOSING_TAG) {
        return Err(GadgetError::ManifestClosingTagMissing {
            path: origin.to_string(),
        });
    }

    let mut edits = ManifestEdits::default();
    let mut patched = text.to_string();

    if !patched.contains(INTERNET_PERMISSION) {
        if let Some(at) = patched.rfind(CLOSING_TAG) {
            patched.insert_str(
                at,
                &format!("<uses-permission android:name=\"{INTERNET_PERMISSION}\"/>\n"),
            );
            edits.added_internet_permission = true;
        }
    }

    if patched.contains(EXTRACT_DISABLED) {
        patched = patched.replace(EXTRACT_DISABLED, EXTRACT_ENABLED);
        edits.enabled_extract_native_libs = true;
    }

    Ok((patched, edits))
}

/// Patch the manifest file in place, writing only when something changed
pub fn patch_manifest(path: &Path) -> Result<ManifestEdits> {
    let text = read_manifest(path)?;
    let (patched, edits) = patch_manifest_text(&text, &path.display().to_string())?;

    if edits.added_internet_permission {
        debug!("Added {INTERNET_PERMISSION} permission");
    }
    if edits.enabled_extract_native_libs {
        debug!("Enabled extractNativeLibs");
    }
    if edits.changed() {
        crate::error::fs::write(path, &patched)?;
    }
    Ok(edits)
}

fn read_manifest(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(crate::error::fs::not_found(path));
    }
    crate::error::fs::read_to_string(path)
}

/// Activities a manifest declares, and which one launches the app
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchTargets {
    pub package: Option<String>,
    /// Fully qualified launcher activity
    pub launcher: Option<String>,
    /// Every declared activity, fully qualified, in document order
    pub activities: Vec<String>,
}

impl LaunchTargets {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = read_manifest(path)?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parse decoded manifest text
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let parse_error = |reason: String| GadgetError::ManifestParseFailed {
            path: origin.to_string(),
            reason,
        };

        let mut targets = LaunchTargets::default();
        let mut component: Option<Component> = None;
        let mut filter = IntentFilter::default();

        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        loop {
            let event = reader.read_event().map_err(|e| {
                parse_error(format!("error at position {}: {e}", reader.error_position()))
            })?;

            match event {
                Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"manifest" => {
                    targets.package = attribute(&e, b"package").map_err(&parse_error)?;
                }
                Event::Start(e) => match e.name().as_ref() {
                    b"activity" | b"activity-alias" => {
                        component = Some(Component::from_element(&e).map_err(&parse_error)?);
                    }
                    b"intent-filter" => filter = IntentFilter::default(),
                    b"action" | b"category" => filter.record(&e).map_err(&parse_error)?,
                    _ => {}
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"activity" | b"activity-alias" => {
                        let empty = Component::from_element(&e).map_err(&parse_error)?;
                        targets.add(empty);
                    }
                    b"action" | b"category" => filter.record(&e).map_err(&parse_error)?,
                    _ => {}
                },
                Event::End(e) => match e.name().as_ref() {
                    b"intent-filter" => {
                        if let Some(component) = component.as_mut() {
                            component.launcher |= filter.is_launcher();
                        }
                    }
                    b"activity" | b"activity-alias" => {
                        if let Some(done) = component.take() {
                            targets.add(done);
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        targets.qualify_names();
        debug!(
            "Manifest declares {} activities, launcher: {:?}",
            targets.activities.len(),
            targets.launcher
        );
        Ok(targets)
    }

    fn add(&mut self, component: Component) {
        if component.launcher && self.launcher.is_none() {
            self.launcher = Some(component.target.clone().unwrap_or(component.name.clone()));
        }
        if !component.alias {
            self.activities.push(component.name);
        }
    }

    fn qualify_names(&mut self) {
        let package = self.package.clone();
        let qualify = |name: &str| qualify_class(package.as_deref(), name);

        self.launcher = self.launcher.as_deref().map(qualify);
        self.activities = self.activities.iter().map(|n| qualify(n)).collect();
    }
}

/// Qualify a manifest class name with the package (`.Main` -> `com.app.Main`)
pub fn qualify_class(package: Option<&str>, name: &str) -> String {
    match package {
        Some(package) if name.starts_with('.') => format!("{package}{name}"),
        Some(package) if !name.contains('.') => format!("{package}.{name}"),
        _ => name.to_string(),
    }
}

#[derive(Debug)]
struct Component {
    name: String,
    target: Option<String>,
    alias: bool,
    launcher: bool,
}

impl Component {
    fn from_element(e: &BytesStart<'_>) -> std::result::Result<Self, String> {
        Ok(Self {
            name: attribute(e, b"android:name")?.unwrap_or_default(),
            target: attribute(e, b"android:targetActivity")?,
            alias: e.name().as_ref() == b"activity-alias",
            launcher: false,
        })
    }
}

#[derive(Debug, Default)]
struct IntentFilter {
    main: bool,
    launcher: bool,
}

impl IntentFilter {
    fn record(&mut self, e: &BytesStart<'_>) -> std::result::Result<(), String> {
        let name = attribute(e, b"android:name")?;
        match (e.name().as_ref(), name.as_deref()) {
            (b"action", Some(ACTION_MAIN)) => self.main = true,
            (b"category", Some(CATEGORY_LAUNCHER)) => self.launcher = true,
            _ => {}
        }
        Ok(())
    }

    fn is_launcher(&self) -> bool {
        self.main && self.launcher
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> std::result::Result<Option<String>, String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(|err| err.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
