//! Target CPU architectures and their Android naming conventions

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::GadgetError;

/// CPU architecture a gadget is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Arch {
    Arm,
    #[default]
    Arm64,
    X86,
    #[value(name = "x86_64")]
    X86_64,
}

impl Arch {
    pub const ALL: [Arch; 4] = [Arch::Arm, Arch::Arm64, Arch::X86, Arch::X86_64];

    /// Name used in release asset file names (`frida-gadget-<v>-android-<name>.so.xz`)
    pub fn asset_name(self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
        }
    }

    /// Directory under `lib/` the platform loads native code from
    pub fn abi_dir(self) -> &'static str {
        match self {
            Arch::Arm => "armeabi-v7a",
            Arch::Arm64 => "arm64-v8a",
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.asset_name())
    }
}

impl FromStr for Arch {
    type Err = GadgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Arch::ALL
            .into_iter()
            .find(|arch| arch.asset_name() == wanted)
            .ok_or_else(|| GadgetError::UnsupportedArch {
                arch: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("ARM64".parse::<Arch>().unwrap(), Arch::Arm64);
        assert_eq!("x86_64".parse::<Arch>().unwrap(), Arch::X86_64);
        assert_eq!(" Arm ".parse::<Arch>().unwrap(), Arch::Arm);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "mips".parse::<Arch>().unwrap_err();
        assert!(matches!(err, GadgetError::UnsupportedArch { ref arch } if arch == "mips"));
    }

    #[test]
    fn test_abi_dirs() {
        assert_eq!(Arch::Arm.abi_dir(), "armeabi-v7a");
        assert_eq!(Arch::Arm64.abi_dir(), "arm64-v8a");
        assert_eq!(Arch::X86.abi_dir(), "x86");
        assert_eq!(Arch::X86_64.abi_dir(), "x86_64");
    }

    #[test]
    fn test_default_is_arm64() {
        assert_eq!(Arch::default(), Arch::Arm64);
    }

    #[test]
    fn test_value_enum_names_match_asset_names() {
        for arch in Arch::ALL {
            let value = arch.to_possible_value().unwrap();
            assert_eq!(value.get_name(), arch.asset_name());
        }
    }
}
