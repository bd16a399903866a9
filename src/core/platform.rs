//! Platform naming and linking conventions
//!
//! A [`PlatformProfile`] is selected once from the host OS and consumed by
//! both the module builder and the linker, so no other code branches on
//! the operating system.

use std::fmt;
use std::path::Path;

/// Operating system family the profile targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// Linux and other ELF-based Unix systems
    Linux,
    /// macOS (Mach-O, dylib)
    MacOs,
    /// Windows (PE, DLL)
    Windows,
}

impl OsFamily {
    /// Key used for per-module `platform_libs` tables
    pub fn key(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Detect the OS family of the current host
pub fn detect_os_family() -> OsFamily {
    match std::env::consts::OS {
        "windows" => OsFamily::Windows,
        "macos" | "ios" => OsFamily::MacOs,
        _ => OsFamily::Linux,
    }
}

/// OS-specific artifact naming and link conventions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    /// Target OS family
    pub os: OsFamily,
    /// Shared library file prefix (`lib` on Unix)
    pub lib_prefix: &'static str,
    /// Shared library file suffix including the dot
    pub lib_suffix: &'static str,
    /// Executable suffix including the dot, empty on Unix
    pub exe_suffix: &'static str,
    /// Libraries every executable links against
    pub system_libs: Vec<String>,
    /// Whether a runtime search path can be embedded in executables
    pub supports_rpath: bool,
}

impl PlatformProfile {
    /// Profile for the given OS family
    pub fn for_os(os: OsFamily) -> Self {
        match os {
            OsFamily::Linux => Self {
                os,
                lib_prefix: "lib",
                lib_suffix: ".so",
                exe_suffix: "",
                system_libs: vec!["pthread".into(), "m".into(), "dl".into()],
                supports_rpath: true,
            },
            OsFamily::MacOs => Self {
                os,
                lib_prefix: "lib",
                lib_suffix: ".dylib",
                exe_suffix: "",
                system_libs: vec!["pthread".into(), "m".into()],
                supports_rpath: true,
            },
            OsFamily::Windows => Self {
                os,
                lib_prefix: "",
                lib_suffix: ".dll",
                exe_suffix: ".exe",
                system_libs: vec!["ws2_32".into(), "advapi32".into()],
                supports_rpath: false,
            },
        }
    }

    /// Profile for the current host
    pub fn host() -> Self {
        Self::for_os(detect_os_family())
    }

    /// File name of the shared library for `module`
    pub fn library_file_name(&self, module: &str) -> String {
        format!("{}{module}{}", self.lib_prefix, self.lib_suffix)
    }

    /// File name of an executable with the given stem
    pub fn executable_file_name(&self, stem: &str) -> String {
        format!("{stem}{}", self.exe_suffix)
    }

    /// Flags that turn a compile into a shared library named `file_name`
    pub fn shared_library_flags(&self, file_name: &str) -> Vec<String> {
        match self.os {
            OsFamily::Linux => vec![
                "-shared".into(),
                "-fPIC".into(),
                format!("-Wl,-soname,{file_name}"),
            ],
            OsFamily::MacOs => vec![
                "-dynamiclib".into(),
                "-fPIC".into(),
                format!("-Wl,-install_name,@rpath/{file_name}"),
            ],
            OsFamily::Windows => vec!["-shared".into()],
        }
    }

    /// Flag embedding `dir` as a runtime library search path, if supported
    pub fn rpath_flag(&self, dir: &Path) -> Option<String> {
        self.supports_rpath
            .then(|| format!("-Wl,-rpath,{}", dir.display()))
    }

    /// Link flag naming the shared library of `module`
    pub fn link_flag(&self, module: &str) -> String {
        format!("-l{module}")
    }
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self::host()
    }
}
