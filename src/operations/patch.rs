//! Patch operation
//!
//! Runs the pipeline over one APK:
//!
//! 1. decode with apktool into the work tree
//! 2. patch the manifest (INTERNET permission, extractNativeLibs)
//! 3. choose the entry-point class and find its smali file
//! 4. fetch the gadget for the requested version and architecture
//! 5. inject the `loadLibrary` call
//! 6. copy the gadget into `lib/<abi>/`
//! 7. rebuild with apktool
//! 8. optionally re-sign with uber-apk-signer
//!
//! Every failure is wrapped with its phase and ends the run. The work tree is
//! left in place so it can be inspected or reused with `--skip-decompile`.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::apktool::{self, Apktool};
use crate::arch::Arch;
use crate::assets::{AssetProvider, GadgetAsset};
use crate::cache::Cache;
use crate::cli::PatchArgs;
use crate::config::Config;
use crate::error::{GadgetError, Phase, PhaseExt, Result};
use crate::manifest::{self, LaunchTargets, ManifestEdits};
use crate::placement;
use crate::release::{FRIDA_REPOSITORY, ReleaseSource};
use crate::smali::{self, EntrySource, Injection};
use crate::ui;
use crate::workspace::UnpackedTree;

/// Options for one patch run
#[derive(Debug, Clone)]
pub struct PatchOptions {
    pub apk: PathBuf,
    pub arch: Arch,
    pub gadget_version: Option<String>,
    pub main_activity: Option<String>,
    pub skip_decompile: bool,
    pub skip_recompile: bool,
    pub no_res: bool,
    pub use_aapt2: bool,
    pub sign: bool,
    pub apktool_path: Option<PathBuf>,
}

impl From<&PatchArgs> for PatchOptions {
    fn from(args: &PatchArgs) -> Self {
        Self {
            apk: args.apk.clone(),
            arch: args.arch,
            gadget_version: args.gadget_version.clone(),
            main_activity: args.main_activity.clone(),
            skip_decompile: args.skip_decompile,
            skip_recompile: args.skip_recompile,
            no_res: args.no_res,
            use_aapt2: args.use_aapt2,
            sign: args.sign,
            apktool_path: args.apktool_path.clone(),
        }
    }
}

/// What to inject where, decided once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPlan {
    /// Fully qualified entry-point class
    pub class: String,
    pub entry_source: EntrySource,
    /// Smali file implementing the class
    pub smali_file: PathBuf,
    pub gadget: GadgetAsset,
    /// Name passed to `System.loadLibrary`
    pub library: String,
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct PatchReport {
    pub tree: PathBuf,
    pub manifest: ManifestEdits,
    pub plan: PatchPlan,
    pub injection: Injection,
    pub placed_library: PathBuf,
    /// Rebuilt package, unless recompilation was skipped
    pub output: Option<PathBuf>,
    pub signed: bool,
}

/// High-level patch operation
pub struct PatchOperation<'a> {
    config: &'a Config,
    source: &'a dyn ReleaseSource,
    options: PatchOptions,
}

impl<'a> PatchOperation<'a> {
    pub fn new(config: &'a Config, source: &'a dyn ReleaseSource, options: PatchOptions) -> Self {
        Self {
            config,
            source,
            options,
        }
    }

    /// Run the whole pipeline
    pub fn execute(&self) -> Result<PatchReport> {
        let apk_name = validate_apk(&self.options.apk)?;
        let apktool = self.locate_apktool()?;
        let tree = UnpackedTree::for_apk(&self.config.work_base, &self.options.apk)?;
        let provider = AssetProvider::new(Cache::new(&self.config.cache_dir), self.source);

        ui::field("APK:", self.options.apk.display());
        ui::field("Architecture:", self.options.arch);
        debug!("Work tree: {}", tree.root().display());

        self.decompile(apktool.as_ref(), &tree).phase(Phase::Decompile)?;

        ui::step("Patching AndroidManifest.xml");
        let manifest = manifest::patch_manifest(&tree.manifest_path()).phase(Phase::Manifest)?;

        ui::step("Locating the entry point");
        let (class, entry_source, smali_file) = self.locate(&tree).phase(Phase::Locate)?;
        info!("Entry point: {class} ({})", smali_file.display());

        ui::step("Fetching the gadget");
        let gadget = self.fetch(&provider).phase(Phase::Fetch)?;

        let library = smali::library_name_from_file(&gadget.file_name()).to_string();
        let plan = PatchPlan {
            class,
            entry_source,
            smali_file,
            gadget,
            library,
        };

        ui::step(&format!("Injecting loadLibrary(\"{}\")", plan.library));
        let injection =
            smali::patch_file(&plan.smali_file, &plan.class, &plan.library).phase(Phase::Patch)?;
        info!(
            "Patched {} using register v{}",
            injection.method, injection.register
        );

        let placed_library =
            placement::place_library(tree.root(), self.options.arch, &plan.gadget.path)
                .phase(Phase::Place)?;

        let mut report = PatchReport {
            tree: tree.root().to_path_buf(),
            manifest,
            plan,
            injection,
            placed_library,
            output: None,
            signed: false,
        };

        let Some(apktool) = apktool.filter(|_| !self.options.skip_recompile) else {
            return Ok(report);
        };

        ui::step("Recompiling with apktool");
        let output = self
            .recompile(&apktool, &tree, &apk_name)
            .phase(Phase::Recompile)?;

        if self.options.sign {
            ui::step("Signing with uber-apk-signer");
            self.sign(&provider, &output).phase(Phase::Sign)?;
            report.signed = true;
        }

        report.output = Some(output);
        Ok(report)
    }

    /// apktool is needed unless both decoding and building are skipped
    fn locate_apktool(&self) -> Result<Option<Apktool>> {
        if self.options.skip_decompile && self.options.skip_recompile {
            return Ok(None);
        }
        Apktool::locate(self.options.apktool_path.as_deref()).map(Some)
    }

    fn decompile(&self, apktool: Option<&Apktool>, tree: &UnpackedTree) -> Result<()> {
        match apktool.filter(|_| !self.options.skip_decompile) {
            Some(apktool) => {
                ui::step("Decompiling with apktool");
                tree.recreate()?;
                apktool.decode(&self.options.apk, tree.root(), self.options.no_res)?;
                tree.require_existing()
            }
            None => {
                info!("Reusing decoded tree {}", tree.root().display());
                tree.require_existing()
            }
        }
    }

    fn locate(&self, tree: &UnpackedTree) -> Result<(String, EntrySource, PathBuf)> {
        let targets = LaunchTargets::from_file(&tree.manifest_path())?;
        let (class, source) =
            smali::select_entry_point(self.options.main_activity.as_deref(), &targets)?;
        let roots = tree.smali_roots()?;
        let file = smali::locate_class(&roots, &class)?;
        Ok((class, source, file))
    }

    fn fetch(&self, provider: &AssetProvider<'_>) -> Result<GadgetAsset> {
        let version =
            provider.resolve_version(FRIDA_REPOSITORY, self.options.gadget_version.as_deref())?;
        ui::field("Gadget version:", &version);
        provider.gadget(&version, self.options.arch)
    }

    fn recompile(&self, apktool: &Apktool, tree: &UnpackedTree, apk_name: &str) -> Result<PathBuf> {
        apktool.build(tree.root(), self.options.use_aapt2)?;
        let output = tree.output_apk(apk_name);
        if output.is_file() {
            Ok(output)
        } else {
            Err(crate::error::fs::not_found(&output))
        }
    }

    fn sign(&self, provider: &AssetProvider<'_>, apk: &Path) -> Result<()> {
        let signer = provider.signer()?;
        apktool::sign(&signer, apk)
    }
}

/// Check the input exists and is an `.apk`; returns its file name
pub fn validate_apk(apk: &Path) -> Result<String> {
    let is_apk = apk
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("apk"));
    if !is_apk {
        return Err(GadgetError::InvalidApk {
            path: apk.display().to_string(),
        });
    }
    if !apk.is_file() {
        return Err(GadgetError::ApkNotFound {
            path: apk.display().to_string(),
        });
    }

    apk.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| GadgetError::InvalidApk {
            path: apk.display().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{
        StubReleases, create_decoded_tree, create_temp_dir, frida_release,
    };
    use std::fs;
    use tempfile::TempDir;

    const VERSION: &str = "16.1.4";

    struct Fixture {
        temp: TempDir,
        config: Config,
        apk: PathBuf,
    }

    impl Fixture {
        /// Config with a private cache and work base, plus a cached arm64 gadget
        fn new() -> Self {
            let temp = create_temp_dir();
            let mut config = Config::with_cache_dir(temp.path().join("cache"));
            config.work_base = temp.path().join("work");

            let gadget = Cache::new(&config.cache_dir).gadget_path(VERSION, Arch::Arm64);
            fs::create_dir_all(gadget.parent().unwrap()).unwrap();
            fs::write(&gadget, b"\x7fELF gadget").unwrap();

            let apk = temp.path().join("app.apk");
            fs::write(&apk, b"PK\x03\x04").unwrap();

            Self { temp, config, apk }
        }

        fn options(&self) -> PatchOptions {
            PatchOptions {
                apk: self.apk.clone(),
                arch: Arch::Arm64,
                gadget_version: Some(VERSION.to_string()),
                main_activity: None,
                skip_decompile: false,
                skip_recompile: false,
                no_res: false,
                use_aapt2: false,
                sign: false,
                apktool_path: None,
            }
        }

        /// Decode the fixture tree where the operation expects it
        fn predecode(&self) -> UnpackedTree {
            let tree = UnpackedTree::for_apk(&self.config.work_base, &self.apk).unwrap();
            create_decoded_tree(tree.root());
            tree
        }
    }

    #[test]
    fn test_validate_apk() {
        let temp = create_temp_dir();
        let apk = temp.path().join("App.APK");
        fs::write(&apk, b"PK").unwrap();
        assert_eq!(validate_apk(&apk).unwrap(), "App.APK");

        assert!(matches!(
            validate_apk(&temp.path().join("missing.apk")),
            Err(GadgetError::ApkNotFound { .. })
        ));

        let zip = temp.path().join("app.zip");
        fs::write(&zip, b"PK").unwrap();
        assert!(matches!(
            validate_apk(&zip),
            Err(GadgetError::InvalidApk { .. })
        ));
    }

    #[test]
    fn test_skip_both_phases_patches_existing_tree() {
        let fixture = Fixture::new();
        let tree = fixture.predecode();
        let stub = StubReleases::new();

        let mut options = fixture.options();
        options.skip_decompile = true;
        options.skip_recompile = true;

        let report = PatchOperation::new(&fixture.config, &stub, options)
            .execute()
            .unwrap();

        assert_eq!(stub.call_count(), 0);
        assert_eq!(report.output, None);
        assert_eq!(report.plan.class, "com.example.app.MainActivity");
        assert_eq!(report.plan.entry_source, EntrySource::Launcher);
        assert_eq!(report.plan.library, "frida-gadget-16.1.4-android-arm64");
        assert_eq!(report.injection.register, 2);
        assert!(report.manifest.added_internet_permission);

        let smali =
            fs::read_to_string(tree.root().join("smali/com/example/app/MainActivity.smali"))
                .unwrap();
        assert!(smali.contains("    .locals 3\n"));
        assert!(smali.contains("const-string v2, \"frida-gadget-16.1.4-android-arm64\""));
        assert!(!smali.contains("Ljava/lang/Runtime;->exit(I)V"));

        assert!(
            tree.root()
                .join("lib/arm64-v8a/libfrida-gadget-16.1.4-android-arm64.so")
                .is_file()
        );
    }

    #[test]
    fn test_skip_decompile_requires_tree() {
        let fixture = Fixture::new();
        let stub = StubReleases::new();

        let mut options = fixture.options();
        options.skip_decompile = true;
        options.skip_recompile = true;

        let err = PatchOperation::new(&fixture.config, &stub, options)
            .execute()
            .unwrap_err();
        assert!(matches!(
            err,
            GadgetError::PhaseFailed {
                phase: Phase::Decompile,
                ..
            }
        ));
        assert!(matches!(err.root(), GadgetError::WorkDirMissing { .. }));
    }

    #[test]
    fn test_missing_arch_fails_in_fetch_phase() {
        let fixture = Fixture::new();
        fixture.predecode();
        let stub = StubReleases::new()
            .with_release(FRIDA_REPOSITORY, frida_release(VERSION, &["arm", "arm64"]));

        let mut options = fixture.options();
        options.arch = Arch::X86;
        options.skip_decompile = true;
        options.skip_recompile = true;

        let err = PatchOperation::new(&fixture.config, &stub, options)
            .execute()
            .unwrap_err();
        assert!(err.to_string().starts_with("fetch gadget phase failed"));
        assert!(matches!(
            err.root(),
            GadgetError::AssetNotFound { name, .. } if name == "frida-gadget-16.1.4-android-x86.so.xz"
        ));
    }

    #[test]
    fn test_main_activity_override_not_found() {
        let fixture = Fixture::new();
        fixture.predecode();
        let stub = StubReleases::new();

        let mut options = fixture.options();
        options.main_activity = Some("com.example.app.Missing".to_string());
        options.skip_decompile = true;
        options.skip_recompile = true;

        let err = PatchOperation::new(&fixture.config, &stub, options)
            .execute()
            .unwrap_err();
        assert!(matches!(
            err,
            GadgetError::PhaseFailed {
                phase: Phase::Locate,
                ..
            }
        ));
        assert!(matches!(err.root(), GadgetError::EntryPointNotFound { .. }));
    }

    #[test]
    fn test_second_run_reports_already_injected() {
        let fixture = Fixture::new();
        fixture.predecode();
        let stub = StubReleases::new();

        let mut options = fixture.options();
        options.skip_decompile = true;
        options.skip_recompile = true;

        let operation = PatchOperation::new(&fixture.config, &stub, options);
        operation.execute().unwrap();
        let err = operation.execute().unwrap_err();
        assert!(matches!(err.root(), GadgetError::AlreadyInjected { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_full_pipeline_with_fake_apktool() {
        let fixture = Fixture::new();
        let decoded = create_decoded_tree(&fixture.temp.path().join("decoded"));
        let bin = fixture.temp.path().join("bin");
        fs::create_dir(&bin).unwrap();
        let tool = crate::test_fixtures::write_fake_apktool(&bin, &decoded);

        let mut options = fixture.options();
        options.apktool_path = Some(tool);
        options.use_aapt2 = true;

        let stub = StubReleases::new();
        let report = PatchOperation::new(&fixture.config, &stub, options)
            .execute()
            .unwrap();

        let output = report.output.unwrap();
        assert_eq!(output, report.tree.join("dist/app.apk"));
        assert!(output.is_file());
        assert!(!report.signed);

        let log = fs::read_to_string(bin.join("apktool.log")).unwrap();
        let calls: Vec<&str> = log.lines().collect();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("d -o "));
        assert!(calls[1].starts_with("b --use-aapt2 "));
    }
}
