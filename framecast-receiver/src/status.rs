//! Status text for the waiting placeholder.

use std::path::{Path, PathBuf};

use framecast_core::{StatusSource, TransportKind};

const HOSTNAME_FILE: &str = "/proc/sys/kernel/hostname";

/// Hostname, network identity and the listening endpoint.
///
/// The hostname is re-read on every refresh so a rename shows up
/// without a restart.
#[derive(Debug, Clone)]
pub struct SystemStatus {
    hostname_file: PathBuf,
    network_label: String,
    endpoint: String,
}

impl SystemStatus {
    pub fn new(network_label: impl Into<String>, transport: TransportKind, port: u16) -> Self {
        Self {
            hostname_file: PathBuf::from(HOSTNAME_FILE),
            network_label: network_label.into(),
            endpoint: format!("{transport} port {port}"),
        }
    }

    /// Read the hostname from `path` instead of the kernel.
    pub fn with_hostname_file(mut self, path: impl AsRef<Path>) -> Self {
        self.hostname_file = path.as_ref().to_path_buf();
        self
    }

    fn hostname(&self) -> String {
        std::fs::read_to_string(&self.hostname_file)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| std::env::var("HOSTNAME").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "unknown host".into())
    }
}

impl StatusSource for SystemStatus {
    fn status_lines(&mut self) -> Vec<String> {
        let mut lines = vec![self.hostname()];
        if !self.network_label.is_empty() {
            lines.push(self.network_label.clone());
        }
        lines.push(self.endpoint.clone());
        lines
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_from_hostname_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostname");
        std::fs::write(&path, "pi-display\n").unwrap();

        let mut status =
            SystemStatus::new("wlan0 10.0.0.7", TransportKind::Tcp, 5000).with_hostname_file(&path);
        assert_eq!(
            status.status_lines(),
            vec!["pi-display", "wlan0 10.0.0.7", "tcp port 5000"]
        );

        std::fs::write(&path, "renamed\n").unwrap();
        assert_eq!(status.status_lines()[0], "renamed");
    }

    #[test]
    fn empty_label_is_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostname");
        std::fs::write(&path, "box").unwrap();

        let mut status = SystemStatus::new("", TransportKind::Udp, 6000).with_hostname_file(&path);
        assert_eq!(status.status_lines(), vec!["box", "udp port 6000"]);
    }

    #[test]
    fn missing_hostname_file_still_yields_a_line() {
        let mut status = SystemStatus::new("", TransportKind::Tcp, 5000)
            .with_hostname_file("/nonexistent/hostname");
        let lines = status.status_lines();
        assert_eq!(lines.len(), 2);
        assert!(!lines[0].is_empty());
    }
}
