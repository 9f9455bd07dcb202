//! External renderer invocation
//!
//! Runs the LuxRender console binary over a serialized scene file and
//! captures its combined output into a per-job log. Scene files are
//! written to a temporary location and removed once the render returns.

use crate::scene::{SceneError, SceneNode};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// Errors raised while preparing for or running a render
#[derive(Error, Debug)]
pub enum RenderError {
    /// The renderer executable is not on the search path
    #[error("renderer '{exe}' not found on PATH: {source}")]
    RendererNotFound {
        /// Requested executable name
        exe: String,
        /// Underlying lookup failure
        source: which::Error,
    },

    /// The requested output path does not end in `.png`
    #[error("output path '{}' must end in .png", .0.display())]
    BadOutputPath(PathBuf),

    /// The renderer process could not be started
    #[error("failed to start renderer: {0}")]
    Spawn(#[source] io::Error),

    /// The renderer ran but exited unsuccessfully
    #[error("renderer exited with {0}")]
    RendererFailed(ExitStatus),

    /// Scene serialization produced no output
    #[error("refusing to render empty scene '{}'", .0.display())]
    EmptyScene(PathBuf),

    /// Scene composition or serialization failed
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// I/O failure on the scene file or render log
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Locate the renderer executable on the search path
///
/// Called at startup so a misconfigured host fails before any job is
/// claimed, and again per render so a renderer that disappears later
/// still surfaces as an error naming the executable.
pub fn check_renderer(exe: &str) -> Result<PathBuf, RenderError> {
    let path = which::which(exe).map_err(|source| RenderError::RendererNotFound {
        exe: exe.to_string(),
        source,
    })?;
    log::debug!("using renderer at {}", path.display());
    Ok(path)
}

/// Derive the renderer's output base from a `.png` target path
///
/// The renderer appends its own extension, so it is handed the path with
/// `.png` stripped. Any other extension is rejected.
fn output_base(output_png: &Path) -> Result<PathBuf, RenderError> {
    if output_png.extension().and_then(|e| e.to_str()) != Some("png") {
        return Err(RenderError::BadOutputPath(output_png.to_path_buf()));
    }
    Ok(output_png.with_extension(""))
}

/// Run the renderer over an on-disk scene file
///
/// The executable is looked up on the search path first. Stdout and
/// stderr are both appended to `log_path`, which may already hold job
/// progress lines; the streams are interleaved in arrival order. A
/// non-zero exit becomes an error after the streams are fully drained.
pub fn render(exe: &str, scene: &Path, output_png: &Path, log_path: &Path) -> Result<(), RenderError> {
    let exe = check_renderer(exe)?;
    let base = output_base(output_png)?;
    log::info!(
        "rendering {} to {} (log {})",
        scene.display(),
        output_png.display(),
        log_path.display()
    );

    let mut child = Command::new(exe)
        .arg(scene)
        .arg("-o")
        .arg(&base)
        .arg("-V")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(RenderError::Spawn)?;

    // The log may already carry job progress lines; only ever append.
    let log_out = OpenOptions::new().create(true).append(true).open(log_path)?;
    let log_err = log_out.try_clone()?;

    // The streams must be drained concurrently or a chatty renderer
    // deadlocks on a full pipe.
    let mut stdout = child.stdout.take().ok_or_else(|| {
        RenderError::Spawn(io::Error::other("renderer stdout not captured"))
    })?;
    let mut stderr = child.stderr.take().ok_or_else(|| {
        RenderError::Spawn(io::Error::other("renderer stderr not captured"))
    })?;
    let out_pump = std::thread::spawn(move || {
        let mut sink = log_out;
        let _ = io::copy(&mut stdout, &mut sink);
    });
    let err_pump = std::thread::spawn(move || {
        let mut sink = log_err;
        let _ = io::copy(&mut stderr, &mut sink);
    });

    let status = child.wait().map_err(RenderError::Spawn)?;
    let _ = out_pump.join();
    let _ = err_pump.join();

    if !status.success() {
        return Err(RenderError::RendererFailed(status));
    }
    log::info!("render of {} complete", scene.display());
    Ok(())
}

/// Serialize a scene graph to a temporary file and render it
///
/// The temporary scene file lives only for the duration of the render.
/// A scene that serializes to zero bytes is rejected rather than handed
/// to the renderer.
pub fn render_scene(
    node: &dyn SceneNode,
    exe: &str,
    output_png: &Path,
    log_path: &Path,
) -> Result<(), RenderError> {
    let mut scene_file = tempfile::Builder::new()
        .prefix("scene")
        .suffix(".lsx")
        .tempfile()?;
    node.serialize(scene_file.as_file_mut())?;

    let written = scene_file.as_file().metadata()?.len();
    if written == 0 {
        return Err(RenderError::EmptyScene(scene_file.path().to_path_buf()));
    }
    log::debug!(
        "wrote {written} bytes of scene text to {}",
        scene_file.path().display()
    );

    render(exe, scene_file.path(), output_png, log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_base_strips_png_only() {
        let base = output_base(Path::new("/jobs/room.png")).unwrap();
        assert_eq!(base, PathBuf::from("/jobs/room"));

        for bad in ["/jobs/room.tga", "/jobs/room", "/jobs/room.png.bak"] {
            assert!(matches!(
                output_base(Path::new(bad)),
                Err(RenderError::BadOutputPath(_))
            ));
        }
    }

    #[test]
    fn test_check_renderer_names_the_missing_binary() {
        let err = check_renderer("definitely-not-a-renderer-binary").unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-renderer-binary"));
    }

    #[test]
    fn test_render_missing_executable_names_the_binary() {
        // A renderer that vanished after the startup probe must still be
        // reported by name, not as a bare spawn failure.
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("scene.lsx");
        std::fs::write(&scene, "WorldBegin\nWorldEnd\n").unwrap();
        let err = render(
            "definitely-not-a-renderer-binary",
            &scene,
            &dir.path().join("out.png"),
            &dir.path().join("out.jobout"),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::RendererNotFound { .. }));
        assert!(err.to_string().contains("definitely-not-a-renderer-binary"));
    }

    #[test]
    fn test_render_appends_to_existing_log() {
        // The log doubles as the job sidecar; lines written before the
        // render must survive it.
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("echo.sh");
        std::fs::write(&scene, "echo renderer-output\n").unwrap();
        let log = dir.path().join("room.osgt.jobout");
        std::fs::write(&log, "[rendering started]\n").unwrap();
        render("sh", &scene, &dir.path().join("room.png"), &log).unwrap();
        let captured = std::fs::read_to_string(&log).unwrap();
        assert!(captured.starts_with("[rendering started]\n"));
        assert!(captured.contains("renderer-output"));
    }

    #[test]
    fn test_render_captures_output_and_checks_exit() {
        // `sh` stands in for the renderer; it sees the same argument shape.
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("echo-args.sh");
        std::fs::write(&scene, "echo rendering \"$@\"\n").unwrap();
        let log = dir.path().join("out.jobout");
        render("sh", &scene, &dir.path().join("out.png"), &log).unwrap();
        let captured = std::fs::read_to_string(&log).unwrap();
        assert!(captured.contains("rendering -o"));
        assert!(captured.contains("-V"));

        let failing = dir.path().join("fail.sh");
        std::fs::write(&failing, "exit 3\n").unwrap();
        let err = render("sh", &failing, &dir.path().join("out.png"), &log).unwrap_err();
        assert!(matches!(err, RenderError::RendererFailed(_)));
    }

    #[test]
    fn test_render_scene_rejects_empty_output() {
        struct Empty;
        impl SceneNode for Empty {
            fn serialize(&self, _out: &mut dyn std::io::Write) -> Result<(), SceneError> {
                Ok(())
            }
        }
        let dir = tempfile::tempdir().unwrap();
        let err = render_scene(
            &Empty,
            "sh",
            &dir.path().join("out.png"),
            &dir.path().join("out.jobout"),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::EmptyScene(_)));
    }
}
