use std::path::PathBuf;

use clap::Parser;

use crate::arch::Arch;

/// Arguments for the patch command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Inject the latest gadget for arm64:\n    gadgetize patch app.apk\n\n\
                  Pin the gadget version:\n    gadgetize patch app.apk --gadget-version 16.1.4\n\n\
                  Choose the activity to inject into:\n    gadgetize patch app.apk --main-activity com.example.SplashActivity\n\n\
                  Edit the decoded tree by hand, then rebuild it:\n    gadgetize patch app.apk --skip-recompile\n    gadgetize patch app.apk --skip-decompile\n\n\
                  Use apktool.jar and re-sign the result:\n    gadgetize patch app.apk --apktool-path ~/bin/apktool.jar --sign")]
pub struct PatchArgs {
    /// APK to patch
    pub apk: PathBuf,

    /// Target CPU architecture
    #[arg(long, short = 'a', value_enum, ignore_case = true, default_value_t = Arch::Arm64)]
    pub arch: Arch,

    /// Frida gadget version (defaults to the latest release)
    #[arg(long, value_name = "VERSION", env = "FRIDA_GADGET_VERSION")]
    pub gadget_version: Option<String>,

    /// Entry-point class to inject into, instead of the manifest's launcher
    #[arg(long, short = 'm', value_name = "CLASS")]
    pub main_activity: Option<String>,

    /// Reuse the tree decoded by a previous run
    #[arg(long)]
    pub skip_decompile: bool,

    /// Stop after patching and leave the decoded tree in place
    #[arg(long)]
    pub skip_recompile: bool,

    /// Do not decode resources (apktool -r)
    #[arg(long)]
    pub no_res: bool,

    /// Build resources with aapt2 (apktool --use-aapt2)
    #[arg(long)]
    pub use_aapt2: bool,

    /// Re-sign the rebuilt APK with uber-apk-signer (needs java)
    #[arg(long)]
    pub sign: bool,

    /// apktool binary or apktool.jar to use instead of the one on PATH
    #[arg(long, value_name = "PATH")]
    pub apktool_path: Option<PathBuf>,
}
