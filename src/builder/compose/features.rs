//! Conditional feature injection and removal.
//!
//! Independent sub-rules, each idempotent; they edit template files by
//! their original (pre-relocation) paths, so the engine runs them before
//! the package tree moves.

use std::path::{Path, PathBuf};

use super::super::error::Result;
use super::super::request::{Orientation, PushConfig};
use super::PLACEHOLDER_SRC_DIR;
use super::edit::{insert_after, remove_block, remove_region, replace_once, rewrite_file};

/// Entry-point source file, by its original path.
fn main_activity(workspace_root: &Path) -> PathBuf {
    workspace_root.join(PLACEHOLDER_SRC_DIR).join("MainActivity.kt")
}

// ---------------------------------------------------------------------------
// Push-notification integration
// ---------------------------------------------------------------------------

/// Guarded plugin line for the project-level build script.
const PUSH_ROOT_PLUGIN: &str = "\n    id 'com.google.gms.google-services' version '4.4.2' apply false";

/// Guarded plugin line for the app module build script.
const PUSH_APP_PLUGIN: &str = "\n    id 'com.google.gms.google-services'";

const PUSH_DEPENDENCY: &str =
    "\n    implementation 'com.google.firebase:firebase-messaging:24.0.0'";

const PUSH_IMPORT: &str = "\nimport com.google.firebase.messaging.FirebaseMessaging";

/// Placeholder bodies always report "push unavailable" to the web content.
const STUB_AVAILABILITY: &str = "\
    private fun checkPushAvailability() {
        webView.evaluateJavascript(\"window.PushBridge.onAvailability(false)\", null)
    }";

const REAL_AVAILABILITY: &str = "\
    private fun checkPushAvailability() {
        webView.evaluateJavascript(\"window.PushBridge.onAvailability(true)\", null)
    }";

const STUB_TOKEN: &str = "\
    private fun requestPushToken() {
        webView.evaluateJavascript(\"window.PushBridge.onToken(null)\", null)
    }";

const REAL_TOKEN: &str = "\
    private fun requestPushToken() {
        FirebaseMessaging.getInstance().token.addOnCompleteListener { task ->
            val token = if (task.isSuccessful) \"\\\"\" + task.result + \"\\\"\" else \"null\"
            webView.evaluateJavascript(\"window.PushBridge.onToken(\" + token + \")\", null)
        }
    }";

const STUB_REGISTER: &str = "\
    private fun registerPushTopic(topic: String) {
        webView.evaluateJavascript(\"window.PushBridge.onRegistered(false)\", null)
    }";

const REAL_REGISTER: &str = "\
    private fun registerPushTopic(topic: String) {
        FirebaseMessaging.getInstance().subscribeToTopic(topic).addOnCompleteListener { task ->
            webView.evaluateJavascript(\"window.PushBridge.onRegistered(\" + task.isSuccessful + \")\", null)
        }
    }";

/// Applies the push-notification sub-rule.
///
/// Enabled: the service configuration payload lands in the project, build
/// scripts gain the plugin and messaging dependency (guarded, never
/// duplicated), and the three placeholder methods become real messaging
/// calls. Disabled: the placeholders stay stubs and the platform service
/// source is deleted outright.
pub fn apply_push(workspace_root: &Path, push: Option<&PushConfig>) -> Result<()> {
    let Some(push) = push else {
        let service = workspace_root.join(PLACEHOLDER_SRC_DIR).join("FCMService.kt");
        match std::fs::remove_file(&service) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        return Ok(());
    };

    std::fs::write(
        workspace_root.join("app/google-services.json"),
        &push.services_json,
    )?;

    rewrite_file(&workspace_root.join("build.gradle"), |content| {
        insert_after(
            content,
            "plugins {",
            PUSH_ROOT_PLUGIN,
            "com.google.gms.google-services",
        )
    })?;

    rewrite_file(&workspace_root.join("app/build.gradle"), |content| {
        let content = insert_after(
            content,
            "id 'org.jetbrains.kotlin.android'",
            PUSH_APP_PLUGIN,
            "com.google.gms.google-services",
        );
        insert_after(&content, "dependencies {", PUSH_DEPENDENCY, "firebase-messaging")
    })?;

    rewrite_file(&main_activity(workspace_root), |content| {
        let content = insert_after(
            content,
            "import androidx.core.view.WindowCompat",
            PUSH_IMPORT,
            "FirebaseMessaging",
        );
        let content = replace_once(&content, STUB_AVAILABILITY, REAL_AVAILABILITY);
        let content = replace_once(&content, STUB_TOKEN, REAL_TOKEN);
        replace_once(&content, STUB_REGISTER, REAL_REGISTER)
    })
}

// ---------------------------------------------------------------------------
// External-login integration
// ---------------------------------------------------------------------------

const LOGIN_DEPENDENCY_LINE: &str =
    "    implementation 'com.google.android.gms:play-services-auth:21.2.0'\n";

const LOGIN_LAUNCHER_FIELD: &str =
    "    private lateinit var signInLauncher: ActivityResultLauncher<Intent>\n";

/// Marker line opening the result-handling registration block.
const LOGIN_REGISTRATION_MARKER: &str = "signInLauncher = registerForActivityResult(";

/// The registration block closes at this indentation.
const LOGIN_REGISTRATION_END: &str = "        }";

const REAL_LAUNCH: &str = "\
    private fun launchSignIn() {
        signInLauncher.launch(signInClient.signInIntent)
    }";

const STUB_LAUNCH: &str = "\
    private fun launchSignIn() {
        webView.evaluateJavascript(\"window.LoginBridge.onUnavailable()\", null)
    }";

const REAL_RESULT: &str = "\
    private fun handleSignInResult(data: Intent?) {
        val task = GoogleSignIn.getSignedInAccountFromIntent(data)
        val idToken = task.getResult(ApiException::class.java).idToken
        webView.evaluateJavascript(\"window.LoginBridge.onSignIn(\\\"\" + idToken + \"\\\")\", null)
    }";

const STUB_RESULT: &str = "\
    private fun handleSignInResult(data: Intent?) {
        webView.evaluateJavascript(\"window.LoginBridge.onUnavailable()\", null)
    }";

/// Applies the external-login sub-rule.
///
/// With a client identifier the template's default (enabled) code path is
/// left intact. Without one, the dependency, the launcher field and the
/// registration block are stripped and the entry points become
/// "unavailable" stubs.
pub fn apply_login(workspace_root: &Path, client_id: Option<&str>) -> Result<()> {
    if client_id.is_some() {
        return Ok(());
    }

    rewrite_file(&workspace_root.join("app/build.gradle"), |content| {
        remove_block(content, LOGIN_DEPENDENCY_LINE)
    })?;

    rewrite_file(&main_activity(workspace_root), |content| {
        let content = remove_block(content, LOGIN_LAUNCHER_FIELD);
        let content = remove_region(&content, LOGIN_REGISTRATION_MARKER, LOGIN_REGISTRATION_END);
        let content = replace_once(&content, REAL_LAUNCH, STUB_LAUNCH);
        replace_once(&content, REAL_RESULT, STUB_RESULT)
    })
}

// ---------------------------------------------------------------------------
// Fullscreen / immersive mode
// ---------------------------------------------------------------------------

const IMMERSIVE_IMPORTS: &str =
    "\nimport androidx.core.view.WindowInsetsCompat\nimport androidx.core.view.WindowInsetsControllerCompat";

/// The template only recolors the status bar when revealing content.
const STATUS_BAR_BLOCK: &str = "        window.statusBarColor = Color.BLACK";

const IMMERSIVE_BLOCK: &str = "\
        WindowInsetsControllerCompat(window, window.decorView).let { controller ->
            controller.hide(WindowInsetsCompat.Type.systemBars())
            controller.systemBarsBehavior = WindowInsetsControllerCompat.BEHAVIOR_SHOW_TRANSIENT_BARS_BY_SWIPE
        }";

/// Status-bar padding only makes sense in non-immersive layout.
const PADDING_BLOCK: &str = "\
        val statusBarHeight = getStatusBarHeight()
        swipeRefresh.setPadding(0, statusBarHeight, 0, 0)
        errorView.setPadding(0, statusBarHeight, 0, 0)
";

/// Applies the fullscreen sub-rule: hide all system bars with transient
/// reveal on swipe, and drop the status-bar padding insertion.
pub fn apply_fullscreen(workspace_root: &Path, enabled: bool) -> Result<()> {
    if !enabled {
        return Ok(());
    }

    rewrite_file(&main_activity(workspace_root), |content| {
        let content = insert_after(
            content,
            "import androidx.core.view.WindowCompat",
            IMMERSIVE_IMPORTS,
            "WindowInsetsControllerCompat",
        );
        let content = replace_once(&content, STATUS_BAR_BLOCK, IMMERSIVE_BLOCK);
        remove_block(&content, PADDING_BLOCK)
    })
}

// re-exported for the manifest rule, which shares the decision
pub(super) fn orientation_attribute(orientation: Orientation) -> Option<String> {
    orientation
        .attribute_value()
        .map(|value| format!("\n            android:screenOrientation=\"{value}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_ACTIVITY: &str = "\
package com.webapk.app

import android.content.Intent
import androidx.activity.result.ActivityResultLauncher
import androidx.core.view.WindowCompat

class MainActivity : AppCompatActivity() {
    private lateinit var signInLauncher: ActivityResultLauncher<Intent>

    override fun onCreate(savedInstanceState: Bundle?) {
        super.onCreate(savedInstanceState)
        signInLauncher = registerForActivityResult(
            ActivityResultContracts.StartActivityForResult()
        ) { result ->
            handleSignInResult(result.data)
        }
    }

    private fun revealContent() {
        window.statusBarColor = Color.BLACK
        val statusBarHeight = getStatusBarHeight()
        swipeRefresh.setPadding(0, statusBarHeight, 0, 0)
        errorView.setPadding(0, statusBarHeight, 0, 0)
    }

    private fun checkPushAvailability() {
        webView.evaluateJavascript(\"window.PushBridge.onAvailability(false)\", null)
    }

    private fun requestPushToken() {
        webView.evaluateJavascript(\"window.PushBridge.onToken(null)\", null)
    }

    private fun registerPushTopic(topic: String) {
        webView.evaluateJavascript(\"window.PushBridge.onRegistered(false)\", null)
    }

    private fun launchSignIn() {
        signInLauncher.launch(signInClient.signInIntent)
    }

    private fun handleSignInResult(data: Intent?) {
        val task = GoogleSignIn.getSignedInAccountFromIntent(data)
        val idToken = task.getResult(ApiException::class.java).idToken
        webView.evaluateJavascript(\"window.LoginBridge.onSignIn(\\\"\" + idToken + \"\\\")\", null)
    }
}
";

    const APP_GRADLE: &str = "\
plugins {
    id 'com.android.application'
    id 'org.jetbrains.kotlin.android'
}

dependencies {
    implementation 'androidx.core:core-ktx:1.12.0'
    implementation 'com.google.android.gms:play-services-auth:21.2.0'
}
";

    const ROOT_GRADLE: &str = "\
plugins {
    id 'com.android.application' version '8.1.0' apply false
    id 'org.jetbrains.kotlin.android' version '1.9.0' apply false
}
";

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join(PLACEHOLDER_SRC_DIR);
        std::fs::create_dir_all(&src).expect("mkdir");
        std::fs::write(src.join("MainActivity.kt"), MAIN_ACTIVITY).expect("write");
        std::fs::write(src.join("FCMService.kt"), "package com.webapk.app\n").expect("write");
        std::fs::write(dir.path().join("build.gradle"), ROOT_GRADLE).expect("write");
        std::fs::write(dir.path().join("app/build.gradle"), APP_GRADLE).expect("write");
        dir
    }

    fn read(dir: &tempfile::TempDir, rel: &str) -> String {
        std::fs::read_to_string(dir.path().join(rel)).expect("read")
    }

    #[test]
    fn push_disabled_deletes_service_and_keeps_stubs() {
        let dir = fixture();
        apply_push(dir.path(), None).expect("apply");
        assert!(!dir.path().join(PLACEHOLDER_SRC_DIR).join("FCMService.kt").exists());
        let main = read(&dir, "app/src/main/java/com/webapk/app/MainActivity.kt");
        assert!(main.contains("onAvailability(false)"));
        assert!(!main.contains("FirebaseMessaging"));
    }

    #[test]
    fn push_enabled_rewrites_stubs_and_guards_plugin() {
        let dir = fixture();
        let push = PushConfig {
            services_json: br#"{"project_info":{}}"#.to_vec(),
        };
        apply_push(dir.path(), Some(&push)).expect("apply");
        apply_push(dir.path(), Some(&push)).expect("second apply");

        assert!(dir.path().join("app/google-services.json").is_file());
        let root = read(&dir, "build.gradle");
        assert_eq!(root.matches("com.google.gms.google-services").count(), 1);
        let app = read(&dir, "app/build.gradle");
        assert_eq!(app.matches("firebase-messaging").count(), 1);

        let main = read(&dir, "app/src/main/java/com/webapk/app/MainActivity.kt");
        assert!(main.contains("onAvailability(true)"));
        assert!(main.contains("FirebaseMessaging.getInstance().token"));
        assert!(main.contains("subscribeToTopic(topic)"));
        // Service source stays when push is enabled
        assert!(dir.path().join(PLACEHOLDER_SRC_DIR).join("FCMService.kt").exists());
    }

    #[test]
    fn login_stripped_without_client_id() {
        let dir = fixture();
        apply_login(dir.path(), None).expect("apply");

        let app = read(&dir, "app/build.gradle");
        assert!(!app.contains("play-services-auth"));

        let main = read(&dir, "app/src/main/java/com/webapk/app/MainActivity.kt");
        assert!(!main.contains("signInLauncher"));
        assert!(!main.contains("registerForActivityResult"));
        assert_eq!(main.matches("window.LoginBridge.onUnavailable()").count(), 2);
        assert!(!main.contains("GoogleSignIn"));
    }

    #[test]
    fn login_left_intact_with_client_id() {
        let dir = fixture();
        apply_login(dir.path(), Some("1234-abc")).expect("apply");
        let main = read(&dir, "app/src/main/java/com/webapk/app/MainActivity.kt");
        assert!(main.contains("signInLauncher.launch"));
        assert!(main.contains("GoogleSignIn.getSignedInAccountFromIntent"));
    }

    #[test]
    fn toggles_do_not_couple() {
        // Push enabled must not re-enable stripped login paths
        let dir = fixture();
        apply_login(dir.path(), None).expect("strip login");
        let push = PushConfig {
            services_json: b"{}".to_vec(),
        };
        apply_push(dir.path(), Some(&push)).expect("enable push");

        let main = read(&dir, "app/src/main/java/com/webapk/app/MainActivity.kt");
        assert!(main.contains("FirebaseMessaging"));
        assert!(!main.contains("signInLauncher"));
    }

    #[test]
    fn fullscreen_swaps_status_bar_block_for_immersive() {
        let dir = fixture();
        apply_fullscreen(dir.path(), true).expect("apply");
        apply_fullscreen(dir.path(), true).expect("second apply");

        let main = read(&dir, "app/src/main/java/com/webapk/app/MainActivity.kt");
        assert_eq!(main.matches("import androidx.core.view.WindowInsetsCompat").count(), 1);
        assert!(main.contains("hide(WindowInsetsCompat.Type.systemBars())"));
        assert!(!main.contains("window.statusBarColor = Color.BLACK"));
        assert!(!main.contains("setPadding(0, statusBarHeight, 0, 0)"));
    }

    #[test]
    fn fullscreen_disabled_is_untouched() {
        let dir = fixture();
        apply_fullscreen(dir.path(), false).expect("apply");
        let main = read(&dir, "app/src/main/java/com/webapk/app/MainActivity.kt");
        assert!(main.contains("window.statusBarColor = Color.BLACK"));
    }
}
