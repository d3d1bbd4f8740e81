//! Common test utilities for gadgetize integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Launcher activity whose `onCreate` terminates the process
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

pub const MANIFEST_XML: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?><manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <application android:extractNativeLibs="false" android:label="@string/app_name">
        <activity android:exported="true" android:name=".MainActivity">
            <intent-filter>
                <action android:name="android.intent.action.MAIN"/>
                <category android:name="android.intent.category.LAUNCHER"/>
            </intent-filter>
        </activity>
    </application>
</manifest>"#;

/// Isolated cache, work base and input directory for one test
pub struct TestWorkspace {
    pub temp: TempDir,
    pub path: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.path.join("cache")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.path.join("work")
    }

    /// The gadgetize binary, pointed at this workspace
    ///
    /// The release index points at a closed local port so an unexpected
    /// network access fails instead of reaching GitHub.
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("gadgetize").expect("Failed to find gadgetize binary");
        cmd.current_dir(&self.path)
            .env("GADGETIZE_CACHE_DIR", self.cache_dir())
            .env("GADGETIZE_WORK_DIR", self.work_dir())
            .env("GADGETIZE_GITHUB_API", "http://127.0.0.1:9")
            .env_remove("GITHUB_TOKEN")
            .env_remove("FRIDA_GADGET_VERSION")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Write a file relative to the workspace
    pub fn write_file(&self, path: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Put a decompressed gadget into the cache so no download happens
    pub fn seed_gadget(&self, version: &str, arch: &str) -> PathBuf {
        let path = self
            .cache_dir()
            .join("gadgets")
            .join(version)
            .join(format!("frida-gadget-{version}-android-{arch}.so"));
        std::fs::create_dir_all(path.parent().unwrap()).expect("Failed to create cache dir");
        std::fs::write(&path, b"\x7fELF gadget").expect("Failed to seed gadget");
        path
    }

    /// Lay out what apktool would decode the sample APK into
    pub fn decoded_fixture(&self) -> PathBuf {
        let root = self.path.join("decoded");
        let smali = root.join("smali/com/example/app");
        std::fs::create_dir_all(&smali).expect("Failed to create smali dir");
        std::fs::write(smali.join("MainActivity.smali"), MAIN_ACTIVITY_SMALI)
            .expect("Failed to write smali");
        std::fs::write(root.join("AndroidManifest.xml"), MANIFEST_XML)
            .expect("Failed to write manifest");
        root
    }

    /// The single work tree created under the work base
    pub fn work_tree(&self) -> PathBuf {
        let base = self.work_dir().join("gadgetize");
        let mut trees: Vec<PathBuf> = std::fs::read_dir(&base)
            .expect("Failed to read work base")
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(trees.len(), 1, "expected one work tree in {}", base.display());
        trees.remove(0)
    }

    /// Write an executable stand-in for apktool
    ///
    /// `d -o OUT ... APK` copies `decoded` into OUT; `b ... DIR` writes
    /// `DIR/dist/<apk name>`. Arguments are appended to `apktool.log`.
    #[cfg(unix)]
    pub fn fake_apktool(&self, decoded: &Path) -> PathBuf {
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
            log = self.path.join("apktool.log").display(),
            decoded = decoded.display(),
        );

        let path = self.path.join("bin").join("apktool");
        std::fs::create_dir_all(path.parent().unwrap()).expect("Failed to create bin dir");
        std::fs::write(&path, script).expect("Failed to write fake apktool");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to mark fake apktool executable");
        path
    }

    pub fn apktool_log(&self) -> String {
        std::fs::read_to_string(self.path.join("apktool.log")).unwrap_or_default()
    }
}
