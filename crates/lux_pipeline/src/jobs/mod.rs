//! Marker-file job scheduler
//!
//! A render job is requested by dropping a `<scene>.job` marker next to
//! the scene file it refers to. Each scan pass snapshots the watched
//! tree, claims every marker by deleting it, and processes the claimed
//! scenes. Deleting the marker is the claim: a marker that vanishes
//! between snapshot and delete was taken by another worker and aborts
//! the pass rather than double-rendering.
//!
//! Per-job progress is appended to a `<scene>.jobout` sidecar so the
//! designer's tooling can poll it without parsing server logs.

use crate::assets::descriptor::SceneDescriptor;
use crate::assets::osgt::Osgt;
use crate::config::PipelineConfig;
use crate::render::render_scene;
use crate::resolver::{ResolveError, Resolver};
use crate::scene::compose::{compose_full, fixed_camera_world, ComposeOptions};
use crate::scene::{SceneError, World};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker suffix that flags a scene file as a pending job
pub const JOB_MARKER_SUFFIX: &str = ".job";

/// Suffix of the per-job progress sidecar
pub const JOB_LOG_SUFFIX: &str = ".jobout";

/// Errors raised while claiming jobs from a scan snapshot
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A marker refers to a base file that is missing or not a regular file
    #[error("job marker present but base file '{0}' is missing or not a file")]
    MissingBase(String),

    /// A marker vanished between snapshot and claim
    #[error("job marker '{0}' vanished; claimed by another worker")]
    MarkerVanished(String),

    /// The watched tree could not be scanned
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// I/O failure while claiming a marker
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Claim every pending job in the snapshot and dispatch its base file
///
/// The marker is deleted before the callback runs; deletion is the
/// claim. Any verification or claim failure aborts the pass so the
/// remaining markers survive for the next one. Returns the number of
/// jobs dispatched.
pub fn claim_pending(
    files: &Resolver,
    mut on_job: impl FnMut(&str),
) -> Result<usize, SchedulerError> {
    let mut claimed = 0;
    for marker in files.ends_with(JOB_MARKER_SUFFIX) {
        let base = marker
            .strip_suffix(JOB_MARKER_SUFFIX)
            .unwrap_or(marker);
        match std::fs::metadata(base) {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(SchedulerError::MissingBase(base.to_string())),
        }
        if let Err(err) = std::fs::remove_file(marker) {
            if err.kind() == ErrorKind::NotFound {
                return Err(SchedulerError::MarkerVanished(marker.to_string()));
            }
            return Err(err.into());
        }
        log::info!("claimed job for {base}");
        on_job(base);
        claimed += 1;
    }
    Ok(claimed)
}

/// Append a bracketed progress line to a job's sidecar
///
/// Sidecar failures are logged and swallowed; progress reporting must
/// never take a render down with it.
pub fn say(log_path: &Path, message: &str) {
    let appended = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .and_then(|mut file| writeln!(file, "[{message}]"));
    if let Err(err) = appended {
        log::warn!("unable to update job sidecar {}: {err}", log_path.display());
    }
}

/// Compose a world for a claimed scene file, classifying by extension
fn compose_for(
    scene_file: &str,
    files: &Resolver,
    config: &PipelineConfig,
) -> Result<World, SceneError> {
    if scene_file.ends_with(".osgt") {
        let tree = Osgt::from_file(scene_file)?;
        Ok(fixed_camera_world(&tree))
    } else {
        let descriptor = SceneDescriptor::from_file(scene_file)?;
        let options = ComposeOptions {
            preview: config.preview,
        };
        compose_full(&descriptor, files, &options)
    }
}

/// Process one claimed scene file end to end
///
/// Bare scene trees (`.osgt`) render with a fixed overview camera; full
/// descriptors (`.xml`) compose against the snapshot. Every failure is
/// reported to the job sidecar and logged; a broken job never stops the
/// scheduler.
pub fn process_job(scene_file: &str, files: &Resolver, config: &PipelineConfig) {
    let log_path = PathBuf::from(format!("{scene_file}{JOB_LOG_SUFFIX}"));
    say(&log_path, "rendering started");

    if !scene_file.ends_with(".osgt") && !scene_file.ends_with(".xml") {
        log::warn!("unsupported job type for {scene_file}");
        say(&log_path, "rendering failed: unsupported scene type");
        return;
    }

    let world = match compose_for(scene_file, files, config) {
        Ok(world) => world,
        Err(err) => {
            log::warn!("unable to compose scene for {scene_file}: {err}");
            say(&log_path, &format!("rendering failed: {err}"));
            return;
        }
    };

    let output = PathBuf::from(format!("{scene_file}.png"));
    match render_scene(&world, &config.renderer, &output, &log_path) {
        Ok(()) => say(&log_path, "rendering completed"),
        Err(err) => {
            log::warn!("render failed for {scene_file}: {err}");
            say(&log_path, &format!("rendering failed: {err}"));
        }
    }
}

/// Run one scan-claim-process pass over the watched tree
///
/// Returns the number of jobs dispatched this pass.
pub fn run_pass(config: &PipelineConfig) -> Result<usize, SchedulerError> {
    let files = Resolver::scan(&config.watch_root)?;
    claim_pending(&files, |scene_file| process_job(scene_file, &files, config))
}

/// Poll the watched tree forever
///
/// Pass failures are logged and retried after the normal poll delay;
/// only the caller's process exit stops the loop.
pub fn watch(config: &PipelineConfig) -> ! {
    log::info!(
        "watching {} every {}ms",
        config.watch_root.display(),
        config.poll_interval_ms
    );
    loop {
        match run_pass(config) {
            Ok(0) => {}
            Ok(n) => log::info!("dispatched {n} jobs"),
            Err(err) => log::error!("scan pass failed: {err}"),
        }
        std::thread::sleep(std::time::Duration::from_millis(config.poll_interval_ms));
    }
}
