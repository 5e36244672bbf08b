//! Signing identity lifecycle and fingerprint extraction.
//!
//! A job's identity is either generated here (fresh keystore, random
//! high-entropy password) or imported byte-for-byte from caller-supplied
//! material. Fingerprints are derived on demand by scraping the signing
//! toolchain's human-readable report; they feed informational documents
//! only, so their absence never fails a build.

use std::path::{Path, PathBuf};

use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::process::Command;

use super::error::{Error, Result};
use super::request::{BuildRequest, KeystoreSource};

/// Default alias for generated keys.
const DEFAULT_ALIAS: &str = "key0";

/// Sentinel for a fingerprint the toolchain report did not contain.
pub const FINGERPRINT_NOT_FOUND: &str = "NOT_FOUND";

/// Resolved signing material for one job.
///
/// Generated identities use the same value for store and key password to
/// keep the custody notice simple for the user.
#[derive(Clone, Debug)]
pub struct SigningIdentity {
    /// Keystore file inside the workspace
    pub keystore_path: PathBuf,
    pub store_password: String,
    pub key_alias: String,
    pub key_password: String,
}

/// Certificate fingerprints scraped from the toolchain's report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fingerprints {
    pub sha1: String,
    pub sha256: String,
}

impl Fingerprints {
    fn not_found() -> Self {
        Self {
            sha1: FINGERPRINT_NOT_FOUND.to_string(),
            sha256: FINGERPRINT_NOT_FOUND.to_string(),
        }
    }
}

/// Generates a mixed-case alphanumeric password.
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Locates keytool, preferring a bundled JDK under `{tools_dir}/jdk/jdk-*`.
fn keytool_path(tools_dir: Option<&Path>) -> PathBuf {
    if let Some(tools) = tools_dir {
        if let Some(jdk) = bundled_jdk(tools) {
            let exe = if cfg!(windows) { "keytool.exe" } else { "keytool" };
            return jdk.join("bin").join(exe);
        }
    }
    which::which("keytool").unwrap_or_else(|_| PathBuf::from("keytool"))
}

/// First `jdk-*` directory under `{tools_dir}/jdk`, if any.
pub(super) fn bundled_jdk(tools_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(tools_dir.join("jdk")).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            p.is_dir()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("jdk-"))
        })
}

/// Resolves the job's signing identity into the workspace.
///
/// Imported keystores are copied as-is; otherwise a fresh 2048-bit RSA
/// keypair with a 100-year validity window is generated via keytool.
///
/// # Errors
///
/// [`Error::Credential`] when the import copy or the certificate
/// generation fails; either is fatal to the job.
pub async fn resolve(
    request: &BuildRequest,
    workspace_root: &Path,
    tools_dir: Option<&Path>,
) -> Result<SigningIdentity> {
    let keystore_path = workspace_root.join("release.keystore");

    match &request.keystore {
        KeystoreSource::Existing(existing) => {
            std::fs::copy(&existing.path, &keystore_path).map_err(|e| {
                Error::Credential(format!(
                    "failed to import keystore {}: {e}",
                    existing.path.display()
                ))
            })?;
            Ok(SigningIdentity {
                keystore_path,
                store_password: existing.store_password.clone(),
                key_alias: existing.key_alias.clone(),
                key_password: existing.key_password.clone(),
            })
        }
        KeystoreSource::Generate => {
            let password = generate_password(16);
            let identity = SigningIdentity {
                keystore_path,
                store_password: password.clone(),
                key_alias: DEFAULT_ALIAS.to_string(),
                key_password: password,
            };
            generate_keystore(&identity, &request.app_name, tools_dir).await?;
            Ok(identity)
        }
    }
}

/// Drives `keytool -genkeypair` for a fresh identity.
async fn generate_keystore(
    identity: &SigningIdentity,
    app_name: &str,
    tools_dir: Option<&Path>,
) -> Result<()> {
    let keytool = keytool_path(tools_dir);
    log::debug!("generating keystore with {}", keytool.display());

    let output = Command::new(&keytool)
        .arg("-genkeypair")
        .arg("-keystore")
        .arg(&identity.keystore_path)
        .args(["-alias", &identity.key_alias])
        .args(["-keyalg", "RSA"])
        .args(["-keysize", "2048"])
        // 100-year validity window
        .args(["-validity", "36500"])
        .args(["-storepass", &identity.store_password])
        .args(["-keypass", &identity.key_password])
        .args(["-dname", &distinguished_name(app_name)])
        .args(["-storetype", "PKCS12"])
        .output()
        .await
        .map_err(|e| Error::Credential(format!("failed to run {}: {e}", keytool.display())))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Credential(format!(
            "certificate generation failed: {}",
            stderr.trim()
        )));
    }
    Ok(())
}

fn distinguished_name(app_name: &str) -> String {
    format!("CN={app_name}, OU=App, O=App, L=City, ST=State, C=CN")
}

/// Extracts SHA-1/SHA-256 fingerprints from the keystore.
///
/// Idempotent and read-only with respect to the keystore. Any failure
/// (toolchain missing, bad exit, label absent from the report) resolves to
/// the [`FINGERPRINT_NOT_FOUND`] sentinel instead of an error, because the
/// values only feed optional informational documents.
pub async fn extract_fingerprints(
    identity: &SigningIdentity,
    tools_dir: Option<&Path>,
) -> Fingerprints {
    let keytool = keytool_path(tools_dir);
    let output = Command::new(&keytool)
        .arg("-list")
        .arg("-v")
        .arg("-keystore")
        .arg(&identity.keystore_path)
        .args(["-storepass", &identity.store_password])
        .args(["-alias", &identity.key_alias])
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            scrape_fingerprints(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            log::warn!(
                "keytool -list exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Fingerprints::not_found()
        }
        Err(e) => {
            log::warn!("failed to run {}: {e}", keytool.display());
            Fingerprints::not_found()
        }
    }
}

/// Scans a keytool report for the fingerprint labels.
fn scrape_fingerprints(report: &str) -> Fingerprints {
    let mut fingerprints = Fingerprints::not_found();
    for line in report.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("SHA1:") {
            fingerprints.sha1 = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("SHA256:") {
            fingerprints.sha256 = value.trim().to_string();
        }
    }
    fingerprints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_has_requested_length_and_charset() {
        let password = generate_password(16);
        assert_eq!(password.len(), 16);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_password(16));
    }

    #[test]
    fn scrapes_both_fingerprints() {
        let report = "\
Alias name: key0
Certificate fingerprints:
\t SHA1: AA:BB:CC:DD:EE:FF:00:11:22:33:44:55:66:77:88:99:AA:BB:CC:DD
\t SHA256: CC:DD:EE:FF:00:11:22:33:44:55:66:77:88:99:AA:BB:CC:DD:EE:FF:00:11:22:33:44:55:66:77:88:99:AA:BB
Signature algorithm name: SHA256withRSA
";
        let fingerprints = scrape_fingerprints(report);
        assert!(fingerprints.sha1.starts_with("AA:BB:CC"));
        assert!(fingerprints.sha256.starts_with("CC:DD:EE"));
    }

    #[test]
    fn missing_label_resolves_to_sentinel() {
        let report = "Certificate fingerprints:\n\t SHA1: AA:BB\n";
        let fingerprints = scrape_fingerprints(report);
        assert_eq!(fingerprints.sha1, "AA:BB");
        assert_eq!(fingerprints.sha256, FINGERPRINT_NOT_FOUND);

        let empty = scrape_fingerprints("no fingerprints here");
        assert_eq!(empty.sha1, FINGERPRINT_NOT_FOUND);
        assert_eq!(empty.sha256, FINGERPRINT_NOT_FOUND);
    }

    #[test]
    fn distinguished_name_embeds_app_name() {
        assert_eq!(
            distinguished_name("Demo"),
            "CN=Demo, OU=App, O=App, L=City, ST=State, C=CN"
        );
    }
}
