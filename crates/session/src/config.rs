//! Launch configuration and Chrome executable discovery.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for launching one automation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Entry URL of the target surface.
    pub target_url: String,
    /// Where intercepted downloads land. Created if missing.
    pub download_dir: PathBuf,
    /// Persistent Chrome profile directory. Created if missing; reused
    /// across runs so authentication can short-circuit.
    pub profile_dir: PathBuf,
    /// Explicit Chrome binary; when unset, discovery runs.
    pub chrome_executable: Option<PathBuf>,
    pub headless: bool,
    /// Bound on each page navigation.
    pub nav_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_url: "https://podcast.adobe.com/enhance".to_string(),
            download_dir: PathBuf::from("./downloads"),
            profile_dir: default_profile_dir(),
            chrome_executable: None,
            headless: resolve_headless_default(),
            nav_timeout: Duration::from_secs(30),
        }
    }
}

fn default_profile_dir() -> PathBuf {
    if let Ok(path) = env::var("ENHANCER_CHROME_PROFILE") {
        return PathBuf::from(path);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("enhancer")
        .join("chrome-profile")
}

fn resolve_headless_default() -> bool {
    match env::var("ENHANCER_HEADLESS") {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        // The target surface renders a login dance that is easier to
        // supervise headed, matching how operators run it.
        Err(_) => false,
    }
}

/// Locate an installed Chrome/Chromium binary: PATH lookup over the
/// usual names first, then OS-specific well-known install paths.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    for name in chrome_executable_names() {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }
    os_specific_chrome_paths().into_iter().find(|p| p.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(any(target_os = "macos", target_os = "linux", target_os = "freebsd"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
            "chrome",
        ]
    }

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "linux",
        target_os = "freebsd"
    )))]
    {
        &["chrome"]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
            if let Ok(value) = env::var(key) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    let root = PathBuf::from(trimmed);
                    paths.push(root.join("Google/Chrome/Application/chrome.exe"));
                    paths.push(root.join("Chromium/Application/chrome.exe"));
                }
            }
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/snap/bin/chromium"),
        ]
    }

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "linux",
        target_os = "freebsd"
    )))]
    {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_headed_with_persistent_profile() {
        let cfg = SessionConfig::default();
        assert!(cfg.profile_dir.ends_with("chrome-profile"));
        assert!(cfg.target_url.starts_with("https://"));
    }

    #[test]
    fn executable_names_are_nonempty() {
        assert!(!chrome_executable_names().is_empty());
    }
}
