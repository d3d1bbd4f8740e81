//! Test fixtures and utilities for reducing test setup duplication.
//!
//! Provides an in-memory [`ReleaseSource`], sample smali and manifest text,
//! and helpers to lay out a decoded APK tree.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{StubReleases, create_temp_dir, frida_release};
//!
//! let temp = create_temp_dir();
//! let source = StubReleases::new().with_release("frida/frida", frida_release("16.1.4", &["arm64"]));
//! ```

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{GadgetError, Result};
use crate::release::{Release, ReleaseAsset, ReleaseRef, ReleaseSource};

/// Create a temp directory in the system temp location.
///
/// Uses `crate::temp::absolute_temp_dir()` to ensure temp dirs are never
/// created under the current working directory.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new_in(crate::temp::absolute_temp_dir()).expect("Failed to create temp directory")
}

/// In-memory release index that records every call
#[derive(Default)]
pub struct StubReleases {
    releases: HashMap<(String, String), Release>,
    files: HashMap<String, Vec<u8>>,
    pub calls: RefCell<Vec<String>>,
}

impl StubReleases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `release` for its tag, and for `latest`
    #[must_use]
    pub fn with_release(mut self, repository: &str, release: Release) -> Self {
        self.releases.insert(
            (repository.to_string(), release.tag_name.clone()),
            release.clone(),
        );
        self.releases
            .insert((repository.to_string(), "latest".to_string()), release);
        self
    }

    /// Serve `bytes` at `url`
    #[must_use]
    pub fn with_file(mut self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(url.to_string(), bytes.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn download_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with("download "))
            .count()
    }
}

impl ReleaseSource for StubReleases {
    fn release(&self, repository: &str, release: ReleaseRef<'_>) -> Result<Release> {
        let tag = match release {
            ReleaseRef::Latest => "latest",
            ReleaseRef::Tag(tag) => tag,
        };
        self.calls
            .borrow_mut()
            .push(format!("release {repository} {tag}"));
        self.releases
            .get(&(repository.to_string(), tag.to_string()))
            .cloned()
            .ok_or_else(|| GadgetError::ReleaseNotFound {
                repository: repository.to_string(),
                tag: tag.to_string(),
            })
    }

    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        self.calls.borrow_mut().push(format!("download {url}"));
        let bytes = self.files.get(url).ok_or_else(|| GadgetError::Http {
            message: format!("{url}: 404 Not Found"),
        })?;
        dest.write_all(bytes)?;
        Ok(bytes.len() as u64)
    }
}

/// Download URL the stub uses for an asset name
pub fn asset_url(name: &str) -> String {
    format!("https://downloads.invalid/{name}")
}

/// A release with the given asset names
pub fn release_with_assets(tag: &str, names: &[String]) -> Release {
    Release {
        tag_name: tag.to_string(),
        assets: names
            .iter()
            .map(|name| ReleaseAsset {
                name: name.clone(),
                browser_download_url: asset_url(name),
            })
            .collect(),
    }
}

/// A Frida release shipping gadgets for the given architecture names
pub fn frida_release(version: &str, arches: &[&str]) -> Release {
    let names: Vec<String> = arches
        .iter()
        .map(|arch| format!("frida-gadget-{version}-android-{arch}.so.xz"))
        .collect();
    release_with_assets(version, &names)
}

/// xz-compress bytes the way release assets are published
pub fn xz_compress(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = liblzma::write::XzEncoder::new(Vec::new(), 6);
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Main activity smali with two locals and an anti-instrumentation exit call
pub const MAIN_ACTIVITY_SMALI: &str = r#".class public Lcom/example/app/MainActivity;
.super Landroid/app/Activity;
.source "MainActivity.java"


# direct methods
.method public constructor <init>()V
    .locals 0

    invoke-direct {p0}, Landroid/app/Activity;-><init>()V

    return-void
.end method


# virtual methods
.method protected onCreate(Landroid/os/Bundle;)V
    .locals 2

    invoke-super {p0, p1}, Landroid/app/Activity;->onCreate(Landroid/os/Bundle;)V

    invoke-static {}, Ljava/lang/Runtime;->getRuntime()Ljava/lang/Runtime;

    move-result-object v0

    const/4 v1, 0x0

    invoke-virtual {v0, v1}, Ljava/lang/Runtime;->exit(I)V

    return-void
.end method
"#;

/// Decoded manifest declaring one launcher activity
pub const MANIFEST_XML: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?><manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <application android:extractNativeLibs="false" android:label="@string/app_name">
        <activity android:name=".SettingsActivity"/>
        <activity android:exported="true" android:name="com.example.app.MainActivity">
            <intent-filter>
                <action android:name="android.intent.action.MAIN"/>
                <category android:name="android.intent.category.LAUNCHER"/>
            </intent-filter>
        </activity>
    </application>
</manifest>"#;

/// Lay out a decoded APK tree with the sample manifest and main activity
pub fn create_decoded_tree(root: &Path) -> PathBuf {
    let smali = root.join("smali/com/example/app");
    std::fs::create_dir_all(&smali).unwrap();
    std::fs::write(smali.join("MainActivity.smali"), MAIN_ACTIVITY_SMALI).unwrap();
    std::fs::write(root.join("AndroidManifest.xml"), MANIFEST_XML).unwrap();
    root.to_path_buf()
}

/// Write an executable stand-in for apktool into `dir`
///
/// `d -o OUT ... APK` copies `decoded` into OUT; `b ... DIR` writes
/// `DIR/dist/<apk name>`. Every invocation is appended to `apktool.log`
/// next to the script.
#[cfg(unix)]
pub fn write_fake_apktool(dir: &Path, decoded: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
set -e
echo "$@" >> '{log}'
cmd="$1"; shift
for last in "$@"; do :; done
if [ "$cmd" = "d" ]; then
  out=""
  while [ $# -gt 0 ]; do
    case "$1" in
      -o) out="$2"; shift 2 ;;
      *) shift ;;
    esac
  done
  mkdir -p "$out"
  cp -R '{decoded}'/. "$out"
  basename "$last" > "$out/.apk-name"
elif [ "$cmd" = "b" ]; then
  mkdir -p "$last/dist"
  echo rebuilt > "$last/dist/$(cat "$last/.apk-name")"
fi
"#,
        log = dir.join("apktool.log").display(),
        decoded = decoded.display(),
    );

    let path = dir.join("apktool");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_records_calls() {
        let stub = StubReleases::new()
            .with_release("frida/frida", frida_release("16.1.4", &["arm64"]))
            .with_file(&asset_url("a"), b"abc".to_vec());

        assert!(stub.release("frida/frida", ReleaseRef::Tag("16.1.4")).is_ok());
        assert!(stub.release("frida/frida", ReleaseRef::Latest).is_ok());
        assert!(stub.release("frida/frida", ReleaseRef::Tag("1.0")).is_err());

        let mut out = Vec::new();
        assert_eq!(stub.download(&asset_url("a"), &mut out).unwrap(), 3);
        assert_eq!(out, b"abc");

        assert_eq!(stub.call_count(), 4);
        assert_eq!(stub.download_count(), 1);
    }

    #[test]
    fn test_create_decoded_tree() {
        let temp = create_temp_dir();
        let root = create_decoded_tree(temp.path());
        assert!(root.join("AndroidManifest.xml").is_file());
        assert!(root.join("smali/com/example/app/MainActivity.smali").is_file());
    }
}
