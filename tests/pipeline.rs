//! End-to-end pipeline tests against a synthetic template and a fake
//! Gradle wrapper. The wrapper scripts replay representative compiler
//! output, so everything except the real Android toolchain is exercised.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgba};
use tempfile::TempDir;

use webapk_builder::builder::{
    BuildRequest, BuilderConfig, KeystoreSource, Orientation, ProgressEvent, ProgressSink,
    compose,
    credentials::SigningIdentity,
    job,
    request::ExistingKeystore,
    workspace,
};

const ROOT_GRADLE: &str = "\
plugins {
    id 'com.android.application' version '8.1.0' apply false
    id 'org.jetbrains.kotlin.android' version '1.9.0' apply false
}
";

const APP_GRADLE: &str = "\
plugins {
    id 'com.android.application'
    id 'org.jetbrains.kotlin.android'
}

android {
    namespace 'com.webapk.app'
    defaultConfig {
        applicationId \"com.webapk.app\"
        versionCode 1
        versionName \"1.0\"
    }
    buildTypes {
        release {
            minifyEnabled false
        }
    }
}

dependencies {
    implementation 'androidx.core:core-ktx:1.12.0'
    implementation 'com.google.android.gms:play-services-auth:21.2.0'
}
";

const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.webapk.app">
    <application android:label="@string/app_name">
        <activity
            android:name=".MainActivity"
            android:configChanges="orientation|screenSize|keyboardHidden"
            android:exported="true">
            <intent-filter android:autoVerify="true">
                <data android:scheme="https" android:host="webapk.example.com" />
            </intent-filter>
        </activity>
    </application>
</manifest>
"#;

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

const GRADLEW_OK: &str = "\
#!/bin/sh
echo \"CONFIGURING project :app\"
echo \"compileReleaseKotlin\"
echo \"PROCESSING resources\"
echo \"packageRelease\"
mkdir -p app/build/outputs/apk/release
printf 'apk-bytes' > app/build/outputs/apk/release/app-release.apk
echo \"BUILD SUCCESSFUL in 1s\"
exit 0
";

const GRADLEW_FAIL: &str = "\
#!/bin/sh
echo \"Task failed\"
echo \"error: cannot resolve symbol\"
exit 1
";

fn write_template(dir: &Path, gradlew: &str) {
    let src = dir.join("app/src/main/java/com/webapk/app");
    fs::create_dir_all(&src).expect("template tree");
    fs::write(dir.join("build.gradle"), ROOT_GRADLE).expect("root gradle");
    fs::write(dir.join("app/build.gradle"), APP_GRADLE).expect("app gradle");
    fs::write(dir.join("app/src/main/AndroidManifest.xml"), MANIFEST).expect("manifest");
    fs::write(src.join("MainActivity.kt"), MAIN_ACTIVITY).expect("main activity");
    fs::write(src.join("FCMService.kt"), "package com.webapk.app\n").expect("service");
    fs::write(dir.join("gradlew"), gradlew).expect("gradlew");
}

fn sample_icon() -> Vec<u8> {
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(64, 64, Rgba([200, 100, 50, 255]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode icon");
    bytes.into_inner()
}

fn sample_request(keystore: &Path) -> BuildRequest {
    BuildRequest {
        app_name: "Demo".to_string(),
        package_id: "com.example.demo".to_string(),
        url: "https://example.com/app".to_string(),
        icon: sample_icon(),
        orientation: Orientation::Portrait,
        keystore: KeystoreSource::Existing(ExistingKeystore {
            path: keystore.to_path_buf(),
            store_password: "storepw".to_string(),
            key_alias: "key0".to_string(),
            key_password: "keypw".to_string(),
        }),
        ..Default::default()
    }
}

struct Fixture {
    _dir: TempDir,
    config: BuilderConfig,
    keystore: PathBuf,
    output_dir: PathBuf,
}

fn fixture(gradlew: &str) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let template = dir.path().join("android-template");
    write_template(&template, gradlew);

    let keystore = dir.path().join("release.keystore");
    fs::write(&keystore, b"keystore-bytes").expect("keystore");

    let output_dir = dir.path().join("output");
    let config = BuilderConfig::new(&template, &output_dir);
    Fixture {
        _dir: dir,
        config,
        keystore,
        output_dir,
    }
}

async fn run_job(config: &BuilderConfig, request: BuildRequest) -> Vec<ProgressEvent> {
    let (mut sink, mut rx) = ProgressSink::channel();
    job::run(config, request, &mut sink).await;
    drop(sink);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn progress_percents(events: &[ProgressEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect()
}

#[cfg(unix)]
#[tokio::test]
async fn successful_build_produces_complete_bundle() {
    let fixture = fixture(GRADLEW_OK);
    let request = sample_request(&fixture.keystore);
    let events = run_job(&fixture.config, request).await;

    // Exactly one terminal event, and it is success
    let terminal: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminal.len(), 1, "events: {events:?}");
    let ProgressEvent::Success { filename } = terminal[0] else {
        panic!("expected success, got {events:?}");
    };
    assert!(filename.starts_with("Demo_"), "{filename}");
    assert!(filename.ends_with(".zip"));

    // Percent is monotone and reaches at least 95 before success
    let percents = progress_percents(&events);
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert!(*percents.last().expect("progress events") >= 95);

    // The bundle holds exactly the artifact, keystore and four documents
    let archive_path = fixture.output_dir.join(filename);
    let file = fs::File::open(&archive_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(file).expect("read bundle");
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "DEEPLINK-SETUP.txt",
            "Demo.apk",
            "GOOGLE-LOGIN.txt",
            "KEYSTORE-README.txt",
            "assetlinks.json",
            "release.keystore",
        ]
    );

    let mut assetlinks = String::new();
    std::io::Read::read_to_string(
        &mut archive.by_name("assetlinks.json").expect("assetlinks"),
        &mut assetlinks,
    )
    .expect("read assetlinks");
    assert!(assetlinks.contains("com.example.demo"));

    let mut login = String::new();
    std::io::Read::read_to_string(
        &mut archive.by_name("GOOGLE-LOGIN.txt").expect("login guide"),
        &mut login,
    )
    .expect("read login guide");
    assert!(login.contains("not configured"));

    // The workspace is gone; only the bundle remains in the output dir
    let leftovers: Vec<_> = fs::read_dir(&fixture.output_dir)
        .expect("output dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("build_"))
        .collect();
    assert!(leftovers.is_empty(), "workspace not cleaned: {leftovers:?}");
}

#[cfg(unix)]
#[tokio::test]
async fn failing_build_reports_last_error_line_and_cleans_up() {
    let fixture = fixture(GRADLEW_FAIL);
    let request = sample_request(&fixture.keystore);
    let events = run_job(&fixture.config, request).await;

    let terminal: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminal.len(), 1, "events: {events:?}");
    let ProgressEvent::Error { message } = terminal[0] else {
        panic!("expected error, got {events:?}");
    };
    assert!(
        message.contains("error: cannot resolve symbol"),
        "unexpected message: {message}"
    );

    let leftovers: Vec<_> = fs::read_dir(&fixture.output_dir)
        .expect("output dir")
        .filter_map(|e| e.ok())
        .collect();
    assert!(leftovers.is_empty(), "output dir not empty: {leftovers:?}");
}

#[tokio::test]
async fn malformed_identifier_fails_before_any_workspace_exists() {
    let fixture = fixture(GRADLEW_OK);
    let mut request = sample_request(&fixture.keystore);
    request.package_id = "1a.b".to_string();
    let events = run_job(&fixture.config, request).await;

    assert!(matches!(events.last(), Some(ProgressEvent::Error { .. })));
    // The failure precedes workspace creation entirely
    assert!(!fixture.output_dir.exists() || fs::read_dir(&fixture.output_dir)
        .expect("output dir")
        .next()
        .is_none());
}

/// Applying the whole composition engine twice must converge to the same
/// bytes as applying it once.
#[test]
fn composition_engine_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let template = dir.path().join("android-template");
    write_template(&template, GRADLEW_OK);

    let ws = workspace::create(&template, dir.path()).expect("workspace");
    let identity = SigningIdentity {
        keystore_path: ws.root.join("release.keystore"),
        store_password: "storepw".to_string(),
        key_alias: "key0".to_string(),
        key_password: "keypw".to_string(),
    };
    let request = BuildRequest {
        app_name: "Demo".to_string(),
        package_id: "com.example.demo".to_string(),
        url: "https://example.com/app".to_string(),
        orientation: Orientation::Landscape,
        fullscreen: true,
        ..Default::default()
    };
    let link_host = compose::deep_link_host(&request.url);

    compose::apply_all(&ws.root, &request, &identity, &link_host).expect("first pass");
    let first = snapshot_tree(&ws.root);
    compose::apply_all(&ws.root, &request, &identity, &link_host).expect("second pass");
    let second = snapshot_tree(&ws.root);

    assert_eq!(first, second);
}

fn snapshot_tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry.path().strip_prefix(root).expect("relative").to_path_buf();
            (rel, fs::read(entry.path()).expect("read file"))
        })
        .collect();
    files.sort();
    files
}
