// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Locating and loading `PerformanceAPI`.
//!
//! Unless an explicit path is given, the library is looked up where the
//! Superluminal installer puts it:
//!
//! ```notrust
//! <program files>/Superluminal/Performance/API/dll/<arch>/PerformanceAPI.dll
//! ```

use std::{
    fmt,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::api::raw;

/// Errors that abort [`initialize`](crate::initialize).
///
/// A missing or unusable library is *not* an error: the API just stays disabled.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum InitError {
    /// Superluminal does not ship a `PerformanceAPI` build for this CPU architecture.
    #[error("unsupported CPU architecture for Superluminal PerformanceAPI: {0}")]
    UnsupportedArchitecture(String),
}

/// Why the library could not be used. Logged, never returned to callers.
#[derive(Error, Debug)]
pub(crate) enum LoadError {
    #[error("PerformanceAPI not found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("error loading PerformanceAPI: {0}")]
    Library(#[from] libloading::Error),
    #[error("PerformanceAPI does not export PerformanceAPI_GetAPI: {0}")]
    MissingExport(#[source] libloading::Error),
    #[error("PerformanceAPI rejected every supported API version")]
    VersionRejected,
}

/// The CPU architectures Superluminal ships `PerformanceAPI` builds for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Architecture {
    /// 32-bit x86
    X86,
    /// x86-64
    X64,
    /// 32-bit ARM
    Arm,
    /// AArch64
    Arm64,
    /// WebAssembly
    Wasm,
    /// IBM Z
    S390x,
}

impl Architecture {
    /// The architecture this crate was compiled for.
    pub fn current() -> Result<Self, InitError> {
        if cfg!(target_arch = "x86") {
            Ok(Architecture::X86)
        } else if cfg!(target_arch = "x86_64") {
            Ok(Architecture::X64)
        } else if cfg!(target_arch = "arm") {
            Ok(Architecture::Arm)
        } else if cfg!(target_arch = "aarch64") {
            Ok(Architecture::Arm64)
        } else if cfg!(any(target_arch = "wasm32", target_arch = "wasm64")) {
            Ok(Architecture::Wasm)
        } else if cfg!(target_arch = "s390x") {
            Ok(Architecture::S390x)
        } else {
            Err(InitError::UnsupportedArchitecture(
                std::env::consts::ARCH.to_string(),
            ))
        }
    }

    /// Name of the directory holding the library for this architecture.
    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
            Architecture::Arm => "arm",
            Architecture::Arm64 => "arm64",
            Architecture::Wasm => "wasm",
            Architecture::S390x => "s390x",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `PerformanceAPI` generation negotiated with the library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ApiVersion {
    /// API 2.0: thread names and events.
    V2,
    /// API 3.0: adds fiber tracking.
    V3,
}

impl ApiVersion {
    fn raw(self) -> u32 {
        match self {
            ApiVersion::V2 => raw::PERFORMANCEAPI_VERSION_2,
            ApiVersion::V3 => raw::PERFORMANCEAPI_VERSION_3,
        }
    }
}

/// Root of the platform's program installation directory.
#[cfg(windows)]
pub fn program_files_dir() -> PathBuf {
    std::env::var_os("ProgramFiles")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"))
}

/// Root of the platform's program installation directory.
#[cfg(not(windows))]
pub fn program_files_dir() -> PathBuf {
    PathBuf::from("/opt")
}

/// File name of the `PerformanceAPI` shared library on this platform.
#[cfg(windows)]
pub fn library_file_name() -> std::ffi::OsString {
    "PerformanceAPI.dll".into()
}

/// File name of the `PerformanceAPI` shared library on this platform.
#[cfg(not(windows))]
pub fn library_file_name() -> std::ffi::OsString {
    libloading::library_filename("PerformanceAPI")
}

fn library_path_under(root: &Path) -> Result<PathBuf, InitError> {
    let arch = Architecture::current()?;
    Ok(root
        .join("Superluminal")
        .join("Performance")
        .join("API")
        .join("dll")
        .join(arch.as_str())
        .join(library_file_name()))
}

/// Where the Superluminal installer puts `PerformanceAPI` for this architecture.
pub fn default_library_path() -> Result<PathBuf, InitError> {
    library_path_under(&program_files_dir())
}

/// Options for [`initialize`](crate::initialize), for those needing more
/// control than an explicit library path.
#[derive(Debug, Default, Clone)]
pub struct InitOptions {
    library_path: Option<PathBuf>,
    program_files_dir: Option<PathBuf>,
}

impl InitOptions {
    /// Load `PerformanceAPI` from exactly this path.
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> InitOptions {
        self.library_path = Some(path.into());
        self
    }

    /// Look for the Superluminal installation under this directory instead
    /// of the platform's program files directory. Ignored if a library path
    /// was given.
    pub fn with_program_files_dir(mut self, dir: impl Into<PathBuf>) -> InitOptions {
        self.program_files_dir = Some(dir.into());
        self
    }

    /// The path `PerformanceAPI` will be loaded from.
    pub fn library_path(&self) -> Result<PathBuf, InitError> {
        match (&self.library_path, &self.program_files_dir) {
            (Some(path), _) => Ok(path.clone()),
            (None, Some(root)) => library_path_under(root),
            (None, None) => default_library_path(),
        }
    }

    /// Initialize the process-wide API with these options. Only the first
    /// initialization in a process has any effect.
    pub fn initialize(self) -> Result<(), InitError> {
        crate::api::global().initialize(&self)
    }
}

/// A loaded library together with its resolved entry point.
pub(crate) struct LoadedLibrary {
    // kept so the library is never unloaded, function pointers from the
    // table are used for the rest of the process
    _library: Option<libloading::Library>,
    get_api: raw::PerformanceAPI_GetAPI_Func,
}

impl LoadedLibrary {
    /// Wraps an entry point that does not come from a loaded library.
    #[cfg(test)]
    pub(crate) fn from_entry_point(get_api: raw::PerformanceAPI_GetAPI_Func) -> Self {
        LoadedLibrary {
            _library: None,
            get_api,
        }
    }

    /// Asks for the newest API version first, then falls back.
    pub(crate) fn negotiate(
        &self,
    ) -> Result<(ApiVersion, raw::PerformanceAPI_Functions), LoadError> {
        for version in [ApiVersion::V3, ApiVersion::V2] {
            let mut functions = raw::PerformanceAPI_Functions::default();
            // safety: get_api is PerformanceAPI_GetAPI, and the table is large
            // enough for every version we request
            if unsafe { (self.get_api)(version.raw(), &mut functions) } == 1 {
                let functions = match version {
                    ApiVersion::V2 => functions.truncate_to_v2(),
                    ApiVersion::V3 => functions,
                };
                return Ok((version, functions));
            }
            tracing::debug!(?version, "PerformanceAPI_GetAPI rejected version");
        }
        Err(LoadError::VersionRejected)
    }
}

/// Loads the native library. A seam so tests can stand in for it.
pub(crate) trait LibraryLoader: Send + Sync + 'static {
    fn load(&self, path: &Path) -> Result<LoadedLibrary, LoadError>;
}

/// Loads `PerformanceAPI` with [`libloading`].
#[derive(Debug, Default)]
pub(crate) struct DynamicLoader;

impl LibraryLoader for DynamicLoader {
    fn load(&self, path: &Path) -> Result<LoadedLibrary, LoadError> {
        if !path.is_file() {
            return Err(LoadError::NotFound(path.to_owned()));
        }
        // safety: PerformanceAPI has no initialization routines with
        // preconditions we need to uphold
        let library = unsafe { libloading::Library::new(path)? };
        let get_api = unsafe {
            *library
                .get::<raw::PerformanceAPI_GetAPI_Func>(raw::GET_API_SYMBOL)
                .map_err(LoadError::MissingExport)?
        };
        Ok(LoadedLibrary {
            _library: Some(library),
            get_api,
        })
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(Architecture::X86, "x86")]
    #[test_case(Architecture::X64, "x64")]
    #[test_case(Architecture::Arm, "arm")]
    #[test_case(Architecture::Arm64, "arm64")]
    #[test_case(Architecture::Wasm, "wasm")]
    #[test_case(Architecture::S390x, "s390x")]
    fn test_architecture_dir_name(arch: Architecture, name: &str) {
        assert_eq!(arch.as_str(), name);
        assert_eq!(arch.to_string(), name);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_current_architecture() {
        assert_eq!(Architecture::current().unwrap(), Architecture::X64);
    }

    #[cfg(target_arch = "aarch64")]
    #[test]
    fn test_current_architecture() {
        assert_eq!(Architecture::current().unwrap(), Architecture::Arm64);
    }

    #[test]
    fn test_library_path_under_program_files() {
        let options = InitOptions::default().with_program_files_dir("pf");
        let arch = Architecture::current().unwrap();
        let expected = Path::new("pf")
            .join("Superluminal")
            .join("Performance")
            .join("API")
            .join("dll")
            .join(arch.as_str())
            .join(library_file_name());
        assert_eq!(options.library_path().unwrap(), expected);
    }

    #[test]
    fn test_explicit_library_path_wins() {
        let options = InitOptions::default()
            .with_program_files_dir("pf")
            .with_library_path("custom/PerformanceAPI.dll");
        assert_eq!(
            options.library_path().unwrap(),
            PathBuf::from("custom/PerformanceAPI.dll")
        );
    }

    #[test]
    fn test_default_library_path() {
        let path = default_library_path().unwrap();
        assert!(path.starts_with(program_files_dir()));
        assert_eq!(path.file_name(), Some(library_file_name().as_os_str()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_library_file_name() {
        assert_eq!(library_file_name(), "libPerformanceAPI.so");
    }

    #[test]
    fn test_dynamic_loader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(library_file_name());
        match DynamicLoader.load(&path) {
            Err(LoadError::NotFound(missing)) => assert_eq!(missing, path),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("loaded a library that does not exist"),
        }
    }

    #[test]
    fn test_dynamic_loader_invalid_library() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(library_file_name());
        std::fs::write(&path, b"definitely not a shared library").unwrap();
        assert!(matches!(
            DynamicLoader.load(&path),
            Err(LoadError::Library(_))
        ));
    }
}
