//! Gradle build driver.
//!
//! Invokes the template's Gradle wrapper as a subprocess, classifies its
//! output line by line into coarse progress buckets, and locates the
//! artifact at the conventional path for the requested kind. The tool
//! gives us no structured diagnostics; on failure the reported message is
//! the last captured line containing an error/failure keyword, which may
//! pick an unrelated line in multi-module failures. That heuristic is a
//! documented limitation, preserved as-is.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::config::BuilderConfig;
use super::credentials::bundled_jdk;
use super::error::{Error, Result};
use super::progress::ProgressSink;
use super::request::ArtifactKind;

/// Progress floor when the compiler starts.
const BUILD_START_PERCENT: u8 = 40;

/// Gradle wrapper inside the workspace.
fn gradle_wrapper(workspace_root: &Path) -> PathBuf {
    let name = if cfg!(windows) { "gradlew.bat" } else { "gradlew" };
    workspace_root.join(name)
}

/// Environment overrides derived from the bundled tools directory.
fn build_env(tools_dir: Option<&Path>) -> Vec<(String, String)> {
    let mut env = Vec::new();
    let Some(tools) = tools_dir else {
        return env;
    };
    if let Some(jdk) = bundled_jdk(tools) {
        env.push(("JAVA_HOME".to_string(), jdk.display().to_string()));
    }
    let sdk = tools.join("android-sdk");
    if sdk.is_dir() {
        let sdk = sdk.display().to_string();
        env.push(("ANDROID_HOME".to_string(), sdk.clone()));
        env.push(("ANDROID_SDK_ROOT".to_string(), sdk));
    }
    env
}

/// Classifies one output line into a progress bucket.
///
/// Percent only ever increases; per-bucket caps keep a long compile from
/// overshooting the packaging stage.
fn classify(line: &str, current: u8) -> Option<(&'static str, u8)> {
    let upper = line.to_uppercase();
    if upper.contains("CONFIGURING") {
        Some(("Configuring project...", current.max(50)))
    } else if upper.contains("COMPILING") || upper.contains("COMPILE") {
        Some(("Compiling sources...", (current + 5).min(70).max(current)))
    } else if upper.contains("PROCESSING") {
        Some(("Processing resources...", (current + 3).min(80).max(current)))
    } else if upper.contains("PACKAGING") || upper.contains("PACKAGE") {
        Some(("Packaging artifact...", current.max(85)))
    } else if upper.contains("BUILD SUCCESSFUL") {
        Some(("Build successful!", current.max(95)))
    } else {
        None
    }
}

/// Picks the representative failure line from the captured output.
fn pick_failure_line(captured: &[String]) -> String {
    captured
        .iter()
        .rev()
        .find(|line| {
            let lower = line.to_lowercase();
            lower.contains("error") || lower.contains("failed")
        })
        .cloned()
        .unwrap_or_else(|| "unknown error".to_string())
}

/// Runs the build and returns the artifact path inside the workspace.
///
/// # Errors
///
/// [`Error::Build`] on a non-zero exit (or timeout, when configured) and
/// [`Error::ArtifactMissing`] when a zero exit left no artifact behind.
pub async fn run_build(
    workspace_root: &Path,
    kind: ArtifactKind,
    config: &BuilderConfig,
    sink: &mut ProgressSink,
) -> Result<PathBuf> {
    let wrapper = gradle_wrapper(workspace_root);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(&wrapper)
            .map_err(|e| Error::Build(format!("gradle wrapper missing: {e}")))?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&wrapper, permissions)?;
    }

    let mut command = Command::new(&wrapper);
    command
        .arg(kind.gradle_task())
        .arg("--no-daemon")
        .current_dir(workspace_root)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in build_env(config.tools_dir.as_deref()) {
        log::debug!("build env {key}={value}");
        command.env(key, value);
    }

    let mut child = command
        .spawn()
        .map_err(|e| Error::Build(format!("failed to start {}: {e}", wrapper.display())))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Build("gradle stdout not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::Build("gradle stderr not captured".to_string()))?;

    // stderr is drained concurrently so the subprocess never blocks on a
    // full pipe; its lines join the captured output for the failure scan.
    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut collected = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() {
                log::debug!("[gradle] {line}");
                collected.push(line);
            }
        }
        collected
    });

    let mut captured: Vec<String> = Vec::new();
    let mut percent = BUILD_START_PERCENT;
    let mut lines = BufReader::new(stdout).lines();

    let deadline = async {
        match config.build_timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            next = lines.next_line() => {
                match next {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        log::debug!("[gradle] {line}");
                        if let Some((message, bucket)) = classify(&line, percent) {
                            percent = bucket;
                            sink.progress(message, percent);
                        }
                        captured.push(line);
                    }
                    _ => break,
                }
            }
            _ = &mut deadline => {
                if let Err(e) = child.kill().await {
                    log::warn!("failed to kill timed-out build: {e}");
                }
                return Err(Error::Build(timeout_message(config.build_timeout)));
            }
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| Error::Build(format!("failed to wait for gradle: {e}")))?;

    if let Ok(mut tail) = stderr_task.await {
        captured.append(&mut tail);
    }

    if !status.success() {
        return Err(Error::Build(pick_failure_line(&captured)));
    }

    let artifact = workspace_root.join(kind.artifact_path());
    if !artifact.is_file() {
        return Err(Error::ArtifactMissing { path: artifact });
    }
    Ok(artifact)
}

fn timeout_message(limit: Option<Duration>) -> String {
    match limit {
        Some(limit) => format!("build exceeded the {}s time limit", limit.as_secs()),
        None => "build timed out".to_string(),
    }
}
