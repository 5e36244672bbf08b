//! Command line interface for the build pipeline.
//!
//! Assembles a [`BuildRequest`] from arguments, runs one job, and prints
//! every progress event as a JSON line in the order it was produced.

mod args;

pub use args::Args;

use std::time::Duration;

use crate::builder::{
    ArtifactKind, BuildRequest, BuilderConfig, KeystoreSource, Orientation, ProgressEvent,
    ProgressSink, PushConfig, job, request::ExistingKeystore,
};
use crate::error::{CliError, Result};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate().map_err(|reason| CliError::InvalidArguments { reason })?;

    let request = build_request(&args)?;
    let config = builder_config(&args);

    let (mut sink, mut rx) = ProgressSink::channel();
    let printer = tokio::spawn(async move {
        let mut failed = false;
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => log::error!("unserializable progress event: {e}"),
            }
            if matches!(event, ProgressEvent::Error { .. }) {
                failed = true;
            }
        }
        failed
    });

    job::run(&config, request, &mut sink).await;
    drop(sink);

    let failed = printer.await.unwrap_or(true);
    Ok(if failed { 1 } else { 0 })
}

fn build_request(args: &Args) -> Result<BuildRequest> {
    let icon = std::fs::read(&args.icon)?;

    let push = match &args.push_config {
        Some(path) => Some(PushConfig {
            services_json: std::fs::read(path)?,
        }),
        None => None,
    };

    let keystore = match &args.keystore {
        Some(path) => {
            let store_password = args.store_password.clone().unwrap_or_default();
            KeystoreSource::Existing(ExistingKeystore {
                path: path.clone(),
                key_password: args
                    .key_password
                    .clone()
                    .unwrap_or_else(|| store_password.clone()),
                store_password,
                key_alias: args.key_alias.clone(),
            })
        }
        None => KeystoreSource::Generate,
    };

    // validate() already vetted both wire forms
    let orientation = Orientation::parse(&args.orientation).unwrap_or_default();
    let artifact = ArtifactKind::parse(&args.artifact).unwrap_or_default();

    Ok(BuildRequest {
        app_name: args.app_name.clone(),
        package_id: args.package_id.clone(),
        url: args.url.clone(),
        icon,
        orientation,
        fullscreen: args.fullscreen,
        pull_to_refresh: !args.no_pull_to_refresh,
        push,
        login_client_id: args.login_client_id.clone(),
        splash_color: args.splash_color.clone(),
        status_bar_color: args.status_bar_color.clone(),
        version_name: args.version_name.clone(),
        keystore,
        artifact,
    })
}

fn builder_config(args: &Args) -> BuilderConfig {
    let mut config = BuilderConfig::new(&args.template_dir, &args.output_dir);
    if let Some(tools) = &args.tools_dir {
        config = config.tools_dir(tools);
    }
    if let Some(seconds) = args.build_timeout {
        config = config.build_timeout(Duration::from_secs(seconds));
    }
    config
}
