//! Host platform detection and download-kind selection.
//!
//! The JetBrains release feed publishes one download per platform key
//! (`linux`, `linuxARM64`, `mac`, `macM1`, `windowsZip`, `windows`). Each
//! host maps to an ordered list of keys it can install from.

use std::fmt;

/// Packaging of a downloaded distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Gzip-compressed tarball with a single top-level directory.
    TarGz,
    /// Zip archive laid out relative to the installation root.
    Zip,
    /// Self-extracting Windows installer.
    WindowsInstaller,
    /// macOS disk image containing an application bundle.
    DiskImage,
}

impl ArchiveFormat {
    /// Infer the packaging from a release-feed download key.
    #[must_use]
    pub fn for_download_key(key: &str) -> Option<Self> {
        match key {
            "linux" | "linuxARM64" => Some(Self::TarGz),
            "windowsZip" => Some(Self::Zip),
            "windows" => Some(Self::WindowsInstaller),
            "mac" | "macM1" => Some(Self::DiskImage),
            _ => None,
        }
    }
}

/// Host operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    /// Linux distributions.
    Linux,
    /// macOS.
    MacOs,
    /// Windows.
    Windows,
}

/// Host CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostArch {
    /// 64-bit x86.
    X86_64,
    /// 64-bit ARM.
    Aarch64,
}

/// The platform an installation is performed for.
///
/// # Examples
///
/// ```
/// use qodana_prep_installer::platform::{HostArch, HostOs, HostPlatform};
///
/// let platform = HostPlatform::new(HostOs::Windows, HostArch::X86_64);
/// assert_eq!(platform.download_keys(), &["windowsZip", "windows"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPlatform {
    os: HostOs,
    arch: HostArch,
}

/// Error returned when the running host has no published distribution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no distribution is published for {os}/{arch}")]
pub struct UnsupportedPlatform {
    /// The operating system reported by the standard library.
    pub os: String,
    /// The architecture reported by the standard library.
    pub arch: String,
}

impl HostPlatform {
    /// Build a platform from its parts.
    #[must_use]
    pub const fn new(os: HostOs, arch: HostArch) -> Self {
        Self { os, arch }
    }

    /// Detect the platform this binary runs on.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedPlatform`] for hosts outside the published matrix.
    pub fn current() -> Result<Self, UnsupportedPlatform> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map standard-library OS and architecture names to a platform.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedPlatform`] for unknown combinations.
    pub fn from_parts(os: &str, arch: &str) -> Result<Self, UnsupportedPlatform> {
        let unsupported = || UnsupportedPlatform {
            os: os.to_owned(),
            arch: arch.to_owned(),
        };
        let os_kind = match os {
            "linux" => HostOs::Linux,
            "macos" => HostOs::MacOs,
            "windows" => HostOs::Windows,
            _ => return Err(unsupported()),
        };
        let arch_kind = match arch {
            "x86_64" => HostArch::X86_64,
            "aarch64" => HostArch::Aarch64,
            _ => return Err(unsupported()),
        };
        Ok(Self::new(os_kind, arch_kind))
    }

    /// The operating system family.
    #[must_use]
    pub fn os(self) -> HostOs {
        self.os
    }

    /// Release-feed download keys usable on this host, most preferred first.
    ///
    /// Windows prefers the portable zip and falls back to the installer,
    /// which some products publish exclusively.
    #[must_use]
    pub fn download_keys(self) -> &'static [&'static str] {
        match (self.os, self.arch) {
            (HostOs::Linux, HostArch::X86_64) => &["linux"],
            (HostOs::Linux, HostArch::Aarch64) => &["linuxARM64"],
            (HostOs::MacOs, HostArch::X86_64) => &["mac"],
            (HostOs::MacOs, HostArch::Aarch64) => &["macM1"],
            (HostOs::Windows, _) => &["windowsZip", "windows"],
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let os = match self.os {
            HostOs::Linux => "linux",
            HostOs::MacOs => "macos",
            HostOs::Windows => "windows",
        };
        let arch = match self.arch {
            HostArch::X86_64 => "x86_64",
            HostArch::Aarch64 => "aarch64",
        };
        write!(f, "{os}/{arch}")
    }
}
