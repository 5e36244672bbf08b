//! End-to-end pipeline orchestration for one job.
//!
//! One call runs the stages in order, reports through the sink, and
//! guarantees a single terminal event: `success` with the bundle filename
//! or `error` with a human-readable message. The workspace is removed on
//! every exit path, best-effort.

use super::compose;
use super::config::BuilderConfig;
use super::credentials::{self, SigningIdentity};
use super::driver;
use super::error::Result;
use super::icons;
use super::package::{self, BundleInputs};
use super::progress::ProgressSink;
use super::request::{BuildRequest, KeystoreSource};
use super::workspace::{self, Workspace};

/// One build's ephemeral state, owned exclusively by its job.
#[derive(Debug)]
pub struct JobContext {
    pub token: String,
    pub root: std::path::PathBuf,
    pub identity: SigningIdentity,
    /// Deep-link host parsed from the target URL's authority
    pub link_host: String,
}

/// Runs one job to completion, emitting exactly one terminal event.
pub async fn run(config: &BuilderConfig, request: BuildRequest, sink: &mut ProgressSink) {
    match run_pipeline(config, &request, sink).await {
        Ok(filename) => sink.success(filename),
        Err(e) => sink.error(e.to_string()),
    }
}

async fn run_pipeline(
    config: &BuilderConfig,
    request: &BuildRequest,
    sink: &mut ProgressSink,
) -> Result<String> {
    sink.progress("Validating parameters...", 5);
    request.validate()?;
    sink.done("Parameters validated");

    sink.progress("Copying application template...", 10);
    std::fs::create_dir_all(&config.output_dir)?;
    let ws = workspace::create(&config.template_dir, &config.output_dir)?;
    sink.done("Template copied");

    let outcome = run_in_workspace(config, request, &ws, sink).await;
    // Cleanup runs on success and failure alike; its own failures are
    // logged inside destroy and never surface.
    workspace::destroy(&ws);
    outcome
}

async fn run_in_workspace(
    config: &BuilderConfig,
    request: &BuildRequest,
    ws: &Workspace,
    sink: &mut ProgressSink,
) -> Result<String> {
    sink.progress("Rendering launcher icons...", 15);
    icons::render_launcher_icons(&request.icon, &ws.root)?;
    sink.done("Launcher icons rendered");

    match request.keystore {
        KeystoreSource::Existing(_) => sink.progress("Importing signing keystore...", 20),
        KeystoreSource::Generate => sink.progress("Generating signing keystore...", 20),
    }
    let identity = credentials::resolve(request, &ws.root, config.tools_dir.as_deref()).await?;
    sink.done("Signing keystore ready");

    sink.progress("Applying application configuration...", 30);
    let context = JobContext {
        token: ws.token.clone(),
        root: ws.root.clone(),
        identity,
        link_host: compose::deep_link_host(&request.url),
    };
    compose::apply_all(&context.root, request, &context.identity, &context.link_host)?;
    sink.done("Configuration applied");

    sink.progress("Compiling (this can take a few minutes)...", 40);
    let artifact = driver::run_build(&context.root, request.artifact, config, sink).await?;
    sink.done("Compilation finished");

    sink.progress("Assembling download bundle...", 98);
    let fingerprints =
        credentials::extract_fingerprints(&context.identity, config.tools_dir.as_deref()).await;
    let filename = package::assemble(
        &BundleInputs {
            request,
            identity: &context.identity,
            fingerprints: &fingerprints,
            artifact: &artifact,
            job_token: &context.token,
        },
        &config.output_dir,
    )?;
    sink.done("Download bundle ready");

    Ok(filename)
}
