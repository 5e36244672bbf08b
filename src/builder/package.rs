//! Download bundle assembly.
//!
//! Collects the compiled artifact, the keystore and the generated
//! documents into one compressed archive named
//! `{safe_app_name}_{job_token}.zip`. The token keeps concurrent jobs'
//! bundles from colliding in the shared output directory.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde_json::json;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use super::credentials::{FINGERPRINT_NOT_FOUND, Fingerprints, SigningIdentity};
use super::error::{Error, Result};
use super::request::BuildRequest;

const CREDENTIAL_NOTICE_TEMPLATE: &str = "\
===== {{app_name}} signing credential =====

Keep every file in this bundle somewhere safe!

Keystore file:  release.keystore
Store password: {{store_password}}
Key alias:      {{key_alias}}
Key password:   {{key_password}}

Important:
1. Every future update must be signed with this same keystore, or it
   cannot be installed over the published app.
2. If you lose the keystore you can never update the published app.
3. Back this bundle up in more than one place.

Certificate validity: 100 years
Generated: {{generated_at}}
";

const DEEPLINK_GUIDE_TEMPLATE: &str = "\
===== Deep-link verification for {{app_name}} =====

To let links on {{link_host}} open the app directly, publish the
assetlinks.json file from this bundle at:

    https://{{link_host}}/.well-known/assetlinks.json

It must be served over HTTPS with content type application/json. Once it
is live, Android verifies the association on install and links to
{{link_host}} open {{app_name}} instead of a browser.
{{#if fingerprint_missing}}
Note: the SHA-256 fingerprint could not be read from the keystore, so
assetlinks.json contains a placeholder. Re-run the fingerprint export
before publishing.
{{/if}}";

const LOGIN_GUIDE_CONFIGURED_TEMPLATE: &str = "\
===== Google sign-in for {{app_name}} =====

Sign-in is enabled with client id {{client_id}}.

Register this signing certificate in the credential console so token
requests from the app are accepted:

    SHA-1 fingerprint: {{sha1}}

Steps:
1. Open the OAuth client configuration for {{client_id}}.
2. Add an Android entry with package name {{package_id}} and the SHA-1
   fingerprint above.
3. Ship the app; no further change is needed in the web content.
";

const LOGIN_GUIDE_UNCONFIGURED_TEMPLATE: &str = "\
===== Google sign-in for {{app_name}} =====

Sign-in is not configured in this build; the app reports login as
unavailable to the web content.

To enable it later:
1. Create an OAuth client id of type Android for package {{package_id}}.
2. Rebuild the app with the client id supplied, using this same keystore.
3. Register the keystore's SHA-1 fingerprint with the OAuth client.
";

/// Filesystem-safe form of the application name: word characters and
/// dashes survive, everything else becomes an underscore. Alphanumeric is
/// Unicode-wide, so non-Latin names keep their letters in the filename.
pub fn safe_app_name(app_name: &str) -> String {
    app_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Everything the bundle assembly consumes.
pub struct BundleInputs<'a> {
    pub request: &'a BuildRequest,
    pub identity: &'a SigningIdentity,
    pub fingerprints: &'a Fingerprints,
    /// Compiled artifact inside the workspace
    pub artifact: &'a Path,
    pub job_token: &'a str,
}

/// Writes the downloadable archive and returns its filename.
///
/// # Errors
///
/// [`Error::Packaging`] on any assembly failure; no partial archive is
/// left behind for the caller to download.
pub fn assemble(inputs: &BundleInputs<'_>, output_dir: &Path) -> Result<String> {
    let safe_name = safe_app_name(&inputs.request.app_name);
    let filename = format!("{safe_name}_{}.zip", inputs.job_token);
    let archive_path = output_dir.join(&filename);

    match write_archive(inputs, &safe_name, &archive_path) {
        Ok(()) => Ok(filename),
        Err(e) => {
            if let Err(cleanup) = std::fs::remove_file(&archive_path) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    log::warn!(
                        "failed to remove partial archive {}: {cleanup}",
                        archive_path.display()
                    );
                }
            }
            Err(e)
        }
    }
}

fn write_archive(inputs: &BundleInputs<'_>, safe_name: &str, archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path).map_err(packaging)?;
    let mut archive = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let artifact_name = format!("{safe_name}.{}", inputs.request.artifact.extension());
    let artifact_bytes = std::fs::read(inputs.artifact).map_err(packaging)?;
    archive.start_file(artifact_name, options).map_err(packaging)?;
    archive.write_all(&artifact_bytes).map_err(packaging)?;

    let keystore_bytes = std::fs::read(&inputs.identity.keystore_path).map_err(packaging)?;
    archive.start_file("release.keystore", options).map_err(packaging)?;
    archive.write_all(&keystore_bytes).map_err(packaging)?;

    for (name, content) in generated_documents(inputs)? {
        archive.start_file(name, options).map_err(packaging)?;
        archive.write_all(content.as_bytes()).map_err(packaging)?;
    }

    archive.finish().map_err(packaging)?;
    Ok(())
}

/// Renders the generated documents: custody notice, deep-link assertion,
/// deep-link setup guide, and the login guide in configured or
/// not-configured form.
fn generated_documents(inputs: &BundleInputs<'_>) -> Result<Vec<(String, String)>> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let request = inputs.request;
    let link_host = super::compose::deep_link_host(&request.url);

    let notice = handlebars
        .render_template(
            CREDENTIAL_NOTICE_TEMPLATE,
            &json!({
                "app_name": request.app_name,
                "store_password": inputs.identity.store_password,
                "key_alias": inputs.identity.key_alias,
                "key_password": inputs.identity.key_password,
                "generated_at": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            }),
        )
        .map_err(template)?;

    let assetlinks = serde_json::to_string_pretty(&json!([
        {
            "relation": ["delegate_permission/common.handle_all_urls"],
            "target": {
                "namespace": "android_app",
                "package_name": request.package_id,
                "sha256_cert_fingerprints": [inputs.fingerprints.sha256],
            }
        }
    ]))
    .map_err(|e| Error::Packaging(format!("assertion document: {e}")))?;

    let deeplink_guide = handlebars
        .render_template(
            DEEPLINK_GUIDE_TEMPLATE,
            &json!({
                "app_name": request.app_name,
                "link_host": link_host,
                "fingerprint_missing": inputs.fingerprints.sha256 == FINGERPRINT_NOT_FOUND,
            }),
        )
        .map_err(template)?;

    let login_guide = match &request.login_client_id {
        Some(client_id) => handlebars
            .render_template(
                LOGIN_GUIDE_CONFIGURED_TEMPLATE,
                &json!({
                    "app_name": request.app_name,
                    "client_id": client_id,
                    "package_id": request.package_id,
                    "sha1": inputs.fingerprints.sha1,
                }),
            )
            .map_err(template)?,
        None => handlebars
            .render_template(
                LOGIN_GUIDE_UNCONFIGURED_TEMPLATE,
                &json!({
                    "app_name": request.app_name,
                    "package_id": request.package_id,
                }),
            )
            .map_err(template)?,
    };

    Ok(vec![
        ("KEYSTORE-README.txt".to_string(), notice),
        ("assetlinks.json".to_string(), assetlinks),
        ("DEEPLINK-SETUP.txt".to_string(), deeplink_guide),
        ("GOOGLE-LOGIN.txt".to_string(), login_guide),
    ])
}

fn packaging<E: std::fmt::Display>(e: E) -> Error {
    Error::Packaging(e.to_string())
}

fn template(e: handlebars::RenderError) -> Error {
    Error::Packaging(format!("document template: {e}"))
}
