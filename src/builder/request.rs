//! Build request types and validation.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use super::error::{Error, Result};

/// Reverse-domain package identifier: at least two segments, each
/// lowercase-alphanumeric and starting with a letter.
static PACKAGE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(\.[a-z][a-z0-9]*)+$").expect("literal pattern"));

/// Screen orientation preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    /// Leave the template's default (rotation follows the device)
    #[default]
    Unspecified,
    Portrait,
    Landscape,
}

impl Orientation {
    /// Parses the wire form (`unspecified`, `portrait`, `landscape`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unspecified" => Some(Self::Unspecified),
            "portrait" => Some(Self::Portrait),
            "landscape" => Some(Self::Landscape),
            _ => None,
        }
    }

    /// Manifest attribute value, `None` for [`Orientation::Unspecified`].
    pub fn attribute_value(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Portrait => Some("portrait"),
            Self::Landscape => Some("landscape"),
        }
    }
}

/// Requested output artifact form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Installable package (.apk)
    #[default]
    Apk,
    /// Distribution bundle (.aab)
    Aab,
}

impl ArtifactKind {
    /// Parses the wire form (`apk` / `aab`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "apk" => Some(Self::Apk),
            "aab" => Some(Self::Aab),
            _ => None,
        }
    }

    /// Gradle task driving this artifact kind.
    pub fn gradle_task(self) -> &'static str {
        match self {
            Self::Apk => "assembleRelease",
            Self::Aab => "bundleRelease",
        }
    }

    /// Conventional artifact location relative to the workspace root.
    pub fn artifact_path(self) -> &'static str {
        match self {
            Self::Apk => "app/build/outputs/apk/release/app-release.apk",
            Self::Aab => "app/build/outputs/bundle/release/app-release.aab",
        }
    }

    /// File extension of the renamed artifact inside the bundle.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Apk => "apk",
            Self::Aab => "aab",
        }
    }
}

/// Caller-supplied signing identity material.
#[derive(Clone, Debug)]
pub struct ExistingKeystore {
    /// Keystore file to copy into the workspace byte-for-byte
    pub path: PathBuf,
    pub store_password: String,
    pub key_alias: String,
    pub key_password: String,
}

/// Where the job's signing identity comes from.
#[derive(Clone, Debug, Default)]
pub enum KeystoreSource {
    /// Generate a fresh keystore with a random high-entropy password
    #[default]
    Generate,
    /// Reuse material the caller uploaded
    Existing(ExistingKeystore),
}

/// Push-service configuration payload, copied verbatim into the project.
#[derive(Clone, Debug)]
pub struct PushConfig {
    /// Contents of the service configuration file (`google-services.json`)
    pub services_json: Vec<u8>,
}

/// Immutable input for one build job.
///
/// Toggles are fixed once the job starts; nothing mutates a request
/// mid-pipeline.
#[derive(Clone, Debug)]
pub struct BuildRequest {
    /// User-facing application name
    pub app_name: String,
    /// Reverse-domain package identifier
    pub package_id: String,
    /// Target URL the shell loads
    pub url: String,
    /// Source icon image bytes, any format the decoder understands
    pub icon: Vec<u8>,
    pub orientation: Orientation,
    /// Hide all system bars, transient reveal on swipe
    pub fullscreen: bool,
    /// Swipe-down reload inside the shell
    pub pull_to_refresh: bool,
    /// Push-notification integration, enabled by supplying the payload
    pub push: Option<PushConfig>,
    /// External-login client identifier; absence strips the login code paths
    pub login_client_id: Option<String>,
    /// Splash screen background, `#rrggbb`
    pub splash_color: String,
    /// Status bar color, `#rrggbb`
    pub status_bar_color: String,
    /// User-facing version label
    pub version_name: String,
    pub keystore: KeystoreSource,
    pub artifact: ArtifactKind,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            package_id: String::new(),
            url: String::new(),
            icon: Vec::new(),
            orientation: Orientation::Unspecified,
            fullscreen: false,
            pull_to_refresh: true,
            push: None,
            login_client_id: None,
            splash_color: "#f8f9fa".to_string(),
            status_bar_color: "#000000".to_string(),
            version_name: "1.0".to_string(),
            keystore: KeystoreSource::Generate,
            artifact: ArtifactKind::Apk,
        }
    }
}

impl BuildRequest {
    /// Validates the request before any workspace is created.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a malformed identifier, and
    /// [`Error::Credential`] for imported keystore material with empty
    /// secrets.
    pub fn validate(&self) -> Result<()> {
        if !PACKAGE_ID.is_match(&self.package_id) {
            return Err(Error::Validation(self.package_id.clone()));
        }

        if let KeystoreSource::Existing(existing) = &self.keystore {
            if existing.store_password.is_empty()
                || existing.key_alias.is_empty()
                || existing.key_password.is_empty()
            {
                return Err(Error::Credential(
                    "imported keystore requires store password, alias and key password".to_string(),
                ));
            }
        }

        Ok(())
    }
}
