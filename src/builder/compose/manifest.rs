//! Manifest identifier, deep-link host and orientation substitution.

use std::path::Path;

use url::Url;

use super::super::error::Result;
use super::super::request::BuildRequest;
use super::PLACEHOLDER_ID;
use super::edit::{insert_after, insert_before, replace_all, rewrite_file};
use super::features::orientation_attribute;

/// Deep-link host placeholder in the template manifest.
const LINK_HOST_PLACEHOLDER: &str = "webapk.example.com";

/// Orientation inserts directly after this attribute in the component
/// declaration.
const CONFIG_CHANGES_ANCHOR: &str =
    r#"android:configChanges="orientation|screenSize|keyboardHidden""#;

const APPLICATION_CLOSE: &str = "</application>";

/// Messaging service declaration, inserted only when push is enabled.
const PUSH_SERVICE_BLOCK: &str = r#"        <service
            android:name=".FCMService"
            android:exported="false">
            <intent-filter>
                <action android:name="com.google.firebase.MESSAGING_EVENT" />
            </intent-filter>
        </service>
"#;

/// Rewrites `AndroidManifest.xml` for the request.
pub fn apply(workspace_root: &Path, request: &BuildRequest, link_host: &str) -> Result<()> {
    let package_id = request.package_id.clone();
    let orientation = orientation_attribute(request.orientation);
    let push_enabled = request.push.is_some();
    let link_host = link_host.to_string();

    rewrite_file(
        &workspace_root.join("app/src/main/AndroidManifest.xml"),
        move |content| {
            let mut content = replace_all(content, PLACEHOLDER_ID, &package_id);
            content = replace_all(&content, LINK_HOST_PLACEHOLDER, &link_host);
            if let Some(attribute) = &orientation {
                // Guard on the insertion point itself: another activity may
                // legitimately carry its own screenOrientation attribute.
                let already_inserted =
                    format!("{CONFIG_CHANGES_ANCHOR}\n            android:screenOrientation");
                content = insert_after(&content, CONFIG_CHANGES_ANCHOR, attribute, &already_inserted);
            }
            if push_enabled {
                content = insert_before(
                    &content,
                    APPLICATION_CLOSE,
                    PUSH_SERVICE_BLOCK,
                    "com.google.firebase.MESSAGING_EVENT",
                );
            }
            content
        },
    )
}

/// Authority component of the target URL, falling back to the first path
/// segment when the URL has no authority.
pub fn deep_link_host(target: &str) -> String {
    if let Ok(parsed) = Url::parse(target) {
        if let Some(host) = parsed.host_str() {
            return host.to_string();
        }
        if let Some(segment) = parsed
            .path()
            .trim_start_matches('/')
            .split('/')
            .find(|s| !s.is_empty())
        {
            return segment.to_string();
        }
    }
    // Scheme-less input: take everything before the first slash
    target
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
