//! Command line argument parsing and validation.

use clap::Parser;
use std::path::PathBuf;

/// Web-to-APK build pipeline driver
#[derive(Parser, Debug)]
#[command(
    name = "webapk_builder",
    version,
    about = "Builds a signed Android package from a WebView shell template",
    long_about = "Copies the application template into an isolated workspace, applies the
requested configuration and feature toggles, compiles a signed package via
Gradle, and writes a downloadable bundle (artifact + keystore + documents).

Progress is printed as JSON events, one per line.

Usage:
  webapk_builder --app-name Demo --package-id com.example.demo \\
      --url https://example.com/app --icon ./icon.png
  webapk_builder --app-name Shop --package-id com.example.shop \\
      --url https://shop.example --icon ./icon.png --artifact aab \\
      --keystore ./release.keystore --store-password s3cret

Exit code 0 = the bundle exists in the output directory."
)]
pub struct Args {
    /// Application display name
    #[arg(long, value_name = "NAME")]
    pub app_name: String,

    /// Reverse-domain package identifier (e.g. com.example.demo)
    #[arg(long, value_name = "ID")]
    pub package_id: String,

    /// Target URL the app loads
    #[arg(long, value_name = "URL")]
    pub url: String,

    /// Source icon image file
    #[arg(long, value_name = "PATH")]
    pub icon: PathBuf,

    /// Screen orientation: unspecified, portrait, landscape
    #[arg(long, value_name = "ORIENTATION", default_value = "unspecified")]
    pub orientation: String,

    /// Hide all system bars (immersive mode)
    #[arg(long)]
    pub fullscreen: bool,

    /// Disable swipe-down page reload
    #[arg(long)]
    pub no_pull_to_refresh: bool,

    /// Splash screen background color
    #[arg(long, value_name = "HEX", default_value = "#f8f9fa")]
    pub splash_color: String,

    /// Status bar color
    #[arg(long, value_name = "HEX", default_value = "#000000")]
    pub status_bar_color: String,

    /// User-facing version label
    #[arg(long, value_name = "VERSION", default_value = "1.0")]
    pub version_name: String,

    /// Output artifact kind: apk, aab
    #[arg(long, value_name = "KIND", default_value = "apk")]
    pub artifact: String,

    /// Existing keystore to sign with; omitted = generate a fresh one
    #[arg(long, value_name = "PATH")]
    pub keystore: Option<PathBuf>,

    /// Store password for --keystore
    #[arg(long, value_name = "SECRET")]
    pub store_password: Option<String>,

    /// Key alias for --keystore
    #[arg(long, value_name = "ALIAS", default_value = "key0")]
    pub key_alias: String,

    /// Key password for --keystore (defaults to the store password)
    #[arg(long, value_name = "SECRET")]
    pub key_password: Option<String>,

    /// Push-service configuration file; enables push integration
    #[arg(long, value_name = "PATH")]
    pub push_config: Option<PathBuf>,

    /// External-login client identifier; enables the login code paths
    #[arg(long, value_name = "CLIENT_ID")]
    pub login_client_id: Option<String>,

    /// Pristine application template directory
    #[arg(long, value_name = "DIR", default_value = "android-template")]
    pub template_dir: PathBuf,

    /// Directory for workspaces and finished bundles
    #[arg(long, value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Bundled toolchain directory (jdk/, android-sdk/)
    #[arg(long, value_name = "DIR")]
    pub tools_dir: Option<PathBuf>,

    /// Hard limit on the Gradle invocation, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub build_timeout: Option<u64>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if crate::builder::Orientation::parse(&self.orientation).is_none() {
            return Err(format!(
                "Invalid orientation: {} (expected unspecified, portrait or landscape)",
                self.orientation
            ));
        }

        if crate::builder::ArtifactKind::parse(&self.artifact).is_none() {
            return Err(format!(
                "Invalid artifact kind: {} (expected apk or aab)",
                self.artifact
            ));
        }

        if self.keystore.is_some() && self.store_password.as_deref().unwrap_or("").is_empty() {
            return Err("--keystore requires --store-password".to_string());
        }

        if self.keystore.is_none()
            && (self.store_password.is_some() || self.key_password.is_some())
        {
            return Err("--store-password/--key-password require --keystore".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from([
            "webapk_builder",
            "--app-name",
            "Demo",
            "--package-id",
            "com.example.demo",
            "--url",
            "https://example.com/app",
            "--icon",
            "icon.png",
        ])
    }

    #[test]
    fn defaults_validate() {
        assert!(base_args().validate().is_ok());
    }

    #[test]
    fn rejects_unknown_orientation_and_kind() {
        let mut args = base_args();
        args.orientation = "sideways".to_string();
        assert!(args.validate().is_err());

        let mut args = base_args();
        args.artifact = "ipa".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn keystore_requires_store_password() {
        let mut args = base_args();
        args.keystore = Some(PathBuf::from("release.keystore"));
        assert!(args.validate().is_err());
        args.store_password = Some("secret".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn secrets_without_keystore_conflict() {
        let mut args = base_args();
        args.store_password = Some("secret".to_string());
        assert!(args.validate().is_err());
    }
}
