//! Build-script parameterization.
//!
//! Rewrites the app module's build script with the real identifier,
//! a timestamp-derived build version, the user-facing version label, and
//! the signing configuration. Insertions anchor on unique literal marker
//! strings from the template; if the template's shape changes, the anchors
//! must change with it.

use std::path::Path;

use super::super::credentials::SigningIdentity;
use super::super::error::Result;
use super::super::request::BuildRequest;
use super::PLACEHOLDER_ID;
use super::edit::{insert_before, replace_all, replace_once, rewrite_file};

/// Literal anchor preceding the build-variant block in the template.
const BUILD_TYPES_ANCHOR: &str = "    buildTypes {";

/// Literal anchor inside the release variant.
const RELEASE_MINIFY_ANCHOR: &str = "release {\n            minifyEnabled false";

/// Parameterizes `app/build.gradle`.
pub fn apply(workspace_root: &Path, request: &BuildRequest, identity: &SigningIdentity) -> Result<()> {
    let version_code = build_version_code();
    let signing_block = signing_config_block(identity);
    let version_name = request.version_name.clone();
    let package_id = request.package_id.clone();

    rewrite_file(&workspace_root.join("app/build.gradle"), move |content| {
        let mut content = replace_all(content, PLACEHOLDER_ID, &package_id);
        content = replace_once(
            &content,
            "versionCode 1",
            &format!("versionCode {version_code}"),
        );
        content = replace_once(
            &content,
            "versionName \"1.0\"",
            &format!("versionName \"{version_name}\""),
        );
        // Signing config goes immediately before the build-variant block
        content = insert_before(&content, BUILD_TYPES_ANCHOR, &signing_block, "signingConfigs {");
        // The release variant then references it
        replace_once(
            &content,
            RELEASE_MINIFY_ANCHOR,
            "release {\n            signingConfig signingConfigs.release\n            minifyEnabled false",
        )
    })
}

/// Monotonically increasing numeric build version, `YYYYMMDDHH`.
fn build_version_code() -> String {
    chrono::Local::now().format("%Y%m%d%H").to_string()
}

fn signing_config_block(identity: &SigningIdentity) -> String {
    format!(
        "    signingConfigs {{
        release {{
            storeFile file('../release.keystore')
            storePassword '{store}'
            keyAlias '{alias}'
            keyPassword '{key}'
        }}
    }}
",
        store = identity.store_password,
        alias = identity.key_alias,
        key = identity.key_password,
    )
}
