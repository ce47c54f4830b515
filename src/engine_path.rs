//! Engine binary resolution
//!
//! Picks the Stockfish executable to launch: an explicit override, then a
//! system install on `PATH`, then a binary bundled for this platform, then
//! the expected bundled path so a missing engine fails loudly at launch.

use crate::host::{Arch, Host, Os};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable holding an explicit engine path.
pub const STOCKFISH_PATH_ENV: &str = "CHS_STOCKFISH_PATH";

/// Directory, next to the executable, that bundled binaries ship in.
pub const BUNDLE_DIR_NAME: &str = "engine";

/// Well-known Termux install locations searched after `PATH`.
const TERMUX_CANDIDATES: [&str; 3] = [
    "/data/data/com.termux/files/usr/bin/stockfish",
    "/data/data/com.termux/files/usr/games/stockfish",
    "/system/bin/stockfish",
];

/// Inputs for engine path resolution
#[derive(Debug, Clone)]
pub struct EngineLocator {
    host: Host,
    override_path: Option<PathBuf>,
    search_path: Option<OsString>,
    bundle_dir: PathBuf,
}

impl EngineLocator {
    /// Locator with no override, no search path and the given bundle directory.
    pub fn new(host: Host, bundle_dir: impl Into<PathBuf>) -> Self {
        Self {
            host,
            override_path: None,
            search_path: None,
            bundle_dir: bundle_dir.into(),
        }
    }

    /// Locator fed from the process environment.
    pub fn from_env(host: Host) -> Self {
        Self {
            host,
            override_path: env::var_os(STOCKFISH_PATH_ENV)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            search_path: env::var_os("PATH"),
            bundle_dir: default_bundle_dir(),
        }
    }

    pub fn with_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Resolve the engine path. Never fails; the last resort is a path that may not exist.
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.override_path {
            if path.exists() {
                log::debug!("Using {} from {}", path.display(), STOCKFISH_PATH_ENV);
                return path.clone();
            }
            log::warn!(
                "{} points at {}, which does not exist; ignoring it",
                STOCKFISH_PATH_ENV,
                path.display()
            );
        }

        if let Some(path) = self.system_stockfish() {
            log::debug!("Using system Stockfish at {}", path.display());
            return path;
        }

        match self.bundled_binary() {
            Some(path) => {
                if !path.exists() {
                    log::warn!("No Stockfish found; expected bundled binary at {}", path.display());
                }
                path
            }
            None => PathBuf::from(self.executable_name()),
        }
    }

    /// First executable Stockfish on the search path (plus Termux locations on Termux).
    pub fn system_stockfish(&self) -> Option<PathBuf> {
        let from_path = self.path_candidates().into_iter().find(|p| is_executable(p));

        from_path.or_else(|| {
            if !self.host.termux {
                return None;
            }
            TERMUX_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .find(|p| is_executable(p))
        })
    }

    /// `stockfish` in each search path entry. Empty entries are skipped so the
    /// working directory is never searched.
    fn path_candidates(&self) -> Vec<PathBuf> {
        let name = self.executable_name();
        self.search_path
            .as_ref()
            .map(|paths| {
                env::split_paths(paths)
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .map(|dir| dir.join(name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Expected location of the bundled binary for this host, whether or not it exists.
    pub fn bundled_binary(&self) -> Option<PathBuf> {
        bundled_binary_name(&self.host).map(|name| self.bundle_dir.join(name))
    }

    fn executable_name(&self) -> &'static str {
        if self.host.os == Os::Windows {
            "stockfish.exe"
        } else {
            "stockfish"
        }
    }
}

/// File name of the bundled binary for `host`, if one ships for it.
pub fn bundled_binary_name(host: &Host) -> Option<&'static str> {
    match (host.os, &host.arch) {
        (Os::Linux | Os::Android, Arch::Aarch64) => Some("stockfish_16_aarch64_linux"),
        (Os::Linux | Os::Android, Arch::OtherArm(name)) => {
            // TODO: ship a 32-bit ARM build; the aarch64 binary will not run on armv7 userlands.
            log::warn!(
                "No bundled Stockfish for {}; falling back to the aarch64 build, which may not run here",
                name
            );
            Some("stockfish_16_aarch64_linux")
        }
        (Os::Linux, _) => Some("stockfish_10_x64_linux"),
        (Os::MacOs, _) => Some("stockfish_13_x64_mac"),
        (Os::Windows, _) => Some("stockfish_10_x64_windows.exe"),
        _ => None,
    }
}

/// `engine/` next to the running executable, or relative to the working directory.
pub fn default_bundle_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(BUNDLE_DIR_NAME)))
        .unwrap_or_else(|| PathBuf::from(BUNDLE_DIR_NAME))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
