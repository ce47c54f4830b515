//! Host platform detection.

use std::env;
use std::path::Path;

/// Data directory Termux installs itself under.
pub const TERMUX_DATA_DIR: &str = "/data/data/com.termux";
const TERMUX_MARKER: &str = "com.termux";

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Android,
    MacOs,
    Windows,
    Other,
}

impl Os {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "linux" => Os::Linux,
            "android" => Os::Android,
            "macos" | "darwin" => Os::MacOs,
            "windows" | "win32" => Os::Windows,
            _ => Os::Other,
        }
    }
}

/// CPU architecture family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Aarch64,
    /// 32-bit or otherwise non-aarch64 ARM, keeps the reported name
    OtherArm(String),
    Other(String),
}

impl Arch {
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "x86_64" | "amd64" | "x64" => Arch::X86_64,
            "aarch64" | "arm64" => Arch::Aarch64,
            _ if lower.starts_with("arm") => Arch::OtherArm(lower),
            _ => Arch::Other(lower),
        }
    }

    pub fn is_arm(&self) -> bool {
        matches!(self, Arch::Aarch64 | Arch::OtherArm(_))
    }
}

/// What we know about the machine we run on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub os: Os,
    pub arch: Arch,
    pub termux: bool,
}

impl Host {
    pub fn new(os: Os, arch: Arch, termux: bool) -> Self {
        Self { os, arch, termux }
    }

    /// Detect the current host from compile-time consts and the Termux markers.
    pub fn detect() -> Self {
        let prefix = env::var("PREFIX").ok();
        let termux = is_termux(prefix.as_deref(), Path::new(TERMUX_DATA_DIR).exists());
        let host = Self {
            os: Os::from_name(env::consts::OS),
            arch: Arch::from_name(env::consts::ARCH),
            termux,
        };
        log::debug!("Detected host {:?}", host);
        host
    }

    /// Restricted mobile environment where the engine must run lean.
    pub fn is_constrained(&self) -> bool {
        self.termux || self.os == Os::Android
    }

    /// How to get Stockfish installed on this host.
    pub fn remediation(&self) -> String {
        if self.termux {
            [
                "It looks like you are running in Termux.",
                "Install Stockfish with:",
                "    pkg install stockfish",
                "or point CHS_STOCKFISH_PATH at a Stockfish binary built for Android.",
            ]
            .join("\n")
        } else {
            [
                "Make sure Stockfish is installed and on your PATH, for example:",
                "    apt install stockfish        (Debian/Ubuntu)",
                "    dnf install stockfish        (Fedora)",
                "    brew install stockfish       (macOS)",
                "or download it from https://stockfishchess.org/download/",
                "and set CHS_STOCKFISH_PATH to the binary.",
            ]
            .join("\n")
        }
    }
}

/// Termux sets `PREFIX` to its usr directory; its data directory is a fallback marker.
pub fn is_termux(prefix: Option<&str>, data_dir_exists: bool) -> bool {
    prefix.is_some_and(|p| p.contains(TERMUX_MARKER)) || data_dir_exists
}
