// ── Certificate staging ──
//
// The TLS stack is configured from file paths, so the three PEM blobs held
// in configuration are materialised as owner-only temp files for the
// lifetime of one connection. Files are removed on `cleanup()` or drop.

use std::io::Write;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use tempfile::TempPath;
use tracing::debug;

use crate::error::Error;

/// PEM material for a mutually-authenticated broker connection.
#[derive(Debug, Clone)]
pub struct CertificateBundle {
    /// CA certificate used to verify the broker.
    pub server_ca: String,
    /// Client certificate presented to the broker.
    pub client_cert: String,
    /// Client private key.
    pub client_key: SecretString,
}

/// Paths of a staged bundle, in fixed order: CA, client cert, client key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePaths {
    pub ca: PathBuf,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
}

impl CertificatePaths {
    pub fn all(&self) -> [&Path; 3] {
        [&self.ca, &self.client_cert, &self.client_key]
    }
}

/// Three temp files owned by one connection attempt.
///
/// Dropping the value deletes whatever files still exist, so an early
/// return or a panic between staging and cleanup never leaks key material.
#[derive(Debug)]
pub struct StagedCertificates {
    ca: TempPath,
    client_cert: TempPath,
    client_key: TempPath,
}

impl StagedCertificates {
    /// Write the bundle to disk. Blocking; see [`stage_blocking`](Self::stage_blocking).
    ///
    /// If a later file fails, the files already written are removed on drop
    /// before the error is returned.
    pub fn stage(bundle: &CertificateBundle) -> Result<Self, Error> {
        let ca = write_temp("eaton-ups-ca-", bundle.server_ca.as_bytes())?;
        let client_cert = write_temp("eaton-ups-cert-", bundle.client_cert.as_bytes())?;
        let client_key = write_temp(
            "eaton-ups-key-",
            bundle.client_key.expose_secret().as_bytes(),
        )?;

        debug!(ca = %ca.display(), "staged certificate files");
        Ok(Self {
            ca,
            client_cert,
            client_key,
        })
    }

    /// Stage on the blocking pool so disk I/O never stalls a runtime worker.
    pub async fn stage_blocking(bundle: CertificateBundle) -> Result<Self, Error> {
        tokio::task::spawn_blocking(move || Self::stage(&bundle))
            .await
            .map_err(|e| Error::Staging {
                source: std::io::Error::other(e),
            })?
    }

    pub fn paths(&self) -> CertificatePaths {
        CertificatePaths {
            ca: self.ca.to_path_buf(),
            client_cert: self.client_cert.to_path_buf(),
            client_key: self.client_key.to_path_buf(),
        }
    }

    /// Delete all three files. Files that are already gone are ignored;
    /// any other failure is logged and the remaining files are still removed.
    pub fn cleanup(self) {
        for file in [self.ca, self.client_cert, self.client_key] {
            let path = file.to_path_buf();
            match file.close() {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => debug!(path = %path.display(), error = %e, "certificate cleanup failed"),
            }
        }
    }
}

fn write_temp(prefix: &str, contents: &[u8]) -> Result<TempPath, Error> {
    let staging = |source| Error::Staging { source };

    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".pem")
        .tempfile()
        .map_err(staging)?;
    file.write_all(contents).map_err(staging)?;
    file.flush().map_err(staging)?;
    Ok(file.into_temp_path())
}

// ── Tests ────────────────────────────────────────────────────────────
