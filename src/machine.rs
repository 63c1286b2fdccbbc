//! Descriptor of the remote host running the container daemon.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::error::InstallerError;

/// File name of the CA certificate inside [`Machine::ca_path`].
pub const CA_CERT_FILE: &str = "ca.pem";
/// File name of the client certificate inside [`Machine::ca_path`].
pub const CLIENT_CERT_FILE: &str = "cert.pem";
/// File name of the client key inside [`Machine::ca_path`].
pub const CLIENT_KEY_FILE: &str = "key.pem";

/// A remote container daemon endpoint.
///
/// Built once per install run and only read afterwards. Components never
/// hold on to it past a single call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Machine {
    /// Daemon endpoint URL (e.g. `https://192.168.99.100:2376`).
    pub address: String,
    /// Host IP other components use to reach services on this machine.
    #[serde(default)]
    pub ip: String,
    /// Directory holding `ca.pem`, `cert.pem` and `key.pem`.
    pub ca_path: Utf8PathBuf,
}

/// Resolved paths of the mutual-TLS credentials of a [`Machine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub ca: Utf8PathBuf,
    pub cert: Utf8PathBuf,
    pub key: Utf8PathBuf,
}

impl Machine {
    pub fn new(
        address: impl Into<String>,
        ip: impl Into<String>,
        ca_path: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            address: address.into(),
            ip: ip.into(),
            ca_path: ca_path.into(),
        }
    }

    /// Returns the credential paths, checking that all three files exist.
    ///
    /// A missing file is a configuration error; nothing is retried.
    pub fn tls_files(&self) -> Result<TlsFiles, InstallerError> {
        if !self.ca_path.is_dir() {
            return Err(InstallerError::Config(format!(
                "TLS credential directory does not exist: {}",
                self.ca_path
            )));
        }
        let files = TlsFiles {
            ca: self.ca_path.join(CA_CERT_FILE),
            cert: self.ca_path.join(CLIENT_CERT_FILE),
            key: self.ca_path.join(CLIENT_KEY_FILE),
        };
        for path in [&files.ca, &files.cert, &files.key] {
            require_file(path)?;
        }
        Ok(files)
    }

    /// Resolves a relative `ca_path` against `base_dir`.
    pub(crate) fn resolve_paths(&mut self, base_dir: &Utf8Path) {
        if self.ca_path.is_relative() {
            self.ca_path = base_dir.join(&self.ca_path);
        }
    }
}

fn require_file(path: &Utf8Path) -> Result<(), InstallerError> {
    match path.metadata() {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(InstallerError::Config(format!("TLS credential is not a file: {}", path))),
        Err(_) => Err(InstallerError::Config(format!("missing TLS credential: {}", path))),
    }
}
