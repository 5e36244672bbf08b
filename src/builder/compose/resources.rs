//! Resource file regeneration.
//!
//! `strings.xml` and `colors.xml` are rendered whole from templates rather
//! than patched, so they never conflict with the ordering of the other
//! rules.

use std::path::Path;

use handlebars::Handlebars;
use serde_json::json;

use super::super::error::{Error, Result};
use super::super::request::BuildRequest;

const STRINGS_TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <string name="app_name">{{app_name}}</string>
    <string name="web_url">{{web_url}}</string>
    <bool name="pull_to_refresh_enabled">{{pull_to_refresh}}</bool>
{{#if login_client_id}}    <string name="server_client_id">{{login_client_id}}</string>
{{/if}}</resources>
"#;

const COLORS_TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <color name="splash_background">{{splash_color}}</color>
    <color name="status_bar_color">{{status_bar_color}}</color>
</resources>
"#;

/// Regenerates the value resources from the request.
pub fn apply(workspace_root: &Path, request: &BuildRequest) -> Result<()> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let strings = handlebars
        .render_template(
            STRINGS_TEMPLATE,
            &json!({
                "app_name": request.app_name,
                "web_url": request.url,
                "pull_to_refresh": request.pull_to_refresh,
                "login_client_id": request.login_client_id,
            }),
        )
        .map_err(|e| Error::Composition(format!("strings template: {e}")))?;

    let colors = handlebars
        .render_template(
            COLORS_TEMPLATE,
            &json!({
                "splash_color": request.splash_color,
                "status_bar_color": request.status_bar_color,
            }),
        )
        .map_err(|e| Error::Composition(format!("colors template: {e}")))?;

    let values_dir = workspace_root.join("app/src/main/res/values");
    std::fs::create_dir_all(&values_dir)?;
    std::fs::write(values_dir.join("strings.xml"), strings)?;
    std::fs::write(values_dir.join("colors.xml"), colors)?;
    Ok(())
}
