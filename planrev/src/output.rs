//! Destinations for the formatted review: clipboard, stdout, or a file the
//! invoking process is waiting on.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use clap::ValueEnum;
use serde::Deserialize;

/// Where the formatted review is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Clipboard,
    Stdout,
    /// Write to `--output-path`; used by hook-style invokers.
    File,
}

/// Clipboard seam so the fallback rules can be tested without a display.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()>;
}

/// System clipboard through `arboard`.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("opening clipboard")?;
        #[cfg(target_os = "linux")]
        {
            use arboard::SetExtLinux;
            // X11 and Wayland need the owner alive until a manager takes the data.
            clipboard
                .set()
                .wait()
                .text(text)
                .context("copying to clipboard")?;
        }
        #[cfg(not(target_os = "linux"))]
        {
            clipboard.set_text(text).context("copying to clipboard")?;
        }
        Ok(())
    }
}

/// Writes `review` to the chosen destination.
///
/// Clipboard failures fall back to `stdout`. In file mode a missing output
/// file means the invoker stopped waiting, so the review goes to the
/// clipboard instead. Status messages go to `stderr`.
///
/// # Errors
///
/// Fails when file mode has no path, or the output file exists but cannot be
/// written.
pub fn write_review(
    review: &str,
    kind: OutputKind,
    path: Option<&Path>,
    clipboard: &mut dyn ClipboardSink,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> anyhow::Result<()> {
    match kind {
        OutputKind::Clipboard => match clipboard.set_text(review) {
            Ok(()) => writeln!(stderr, "Review copied to clipboard.")?,
            Err(e) => {
                tracing::warn!(error = %e, "clipboard unavailable");
                writeln!(stderr, "Failed to copy to clipboard: {e:#}")?;
                writeln!(stderr, "Use --output stdout or --output file instead.")?;
                stdout.write_all(review.as_bytes())?;
            }
        },
        OutputKind::Stdout => stdout.write_all(review.as_bytes())?,
        OutputKind::File => {
            let Some(path) = path else {
                bail!("--output-path is required with --output file");
            };
            if !path.exists() {
                tracing::warn!(path = %path.display(), "output file vanished, using clipboard");
                match clipboard.set_text(review) {
                    Ok(()) => writeln!(
                        stderr,
                        "Output file {} was deleted (possibly due to hook timeout). Review copied to clipboard.",
                        path.display()
                    )?,
                    Err(e) => {
                        writeln!(
                            stderr,
                            "Output file {} was deleted (possibly due to hook timeout). Failed to copy to clipboard: {e:#}",
                            path.display()
                        )?;
                        stdout.write_all(review.as_bytes())?;
                    }
                }
                return Ok(());
            }
            std::fs::write(path, review)
                .with_context(|| format!("writing output file {}", path.display()))?;
            writeln!(stderr, "Review written to {}", path.display())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeClipboard {
        fail: bool,
        copied: Option<String>,
    }

    impl ClipboardSink for FakeClipboard {
        fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
            if self.fail {
                bail!("no display");
            }
            self.copied = Some(text.to_owned());
            Ok(())
        }
    }

    fn run(
        kind: OutputKind,
        path: Option<&Path>,
        clipboard: &mut FakeClipboard,
    ) -> (anyhow::Result<()>, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = write_review("REVIEW", kind, path, clipboard, &mut out, &mut err);
        (
            result,
            String::from_utf8(out).expect("utf8"),
            String::from_utf8(err).expect("utf8"),
        )
    }

    #[test]
    fn clipboard_success() {
        let mut clip = FakeClipboard::default();
        let (result, out, err) = run(OutputKind::Clipboard, None, &mut clip);
        assert!(result.is_ok());
        assert_eq!(clip.copied.as_deref(), Some("REVIEW"));
        assert!(out.is_empty());
        assert!(err.contains("copied to clipboard"));
    }

    #[test]
    fn clipboard_failure_falls_back_to_stdout() {
        let mut clip = FakeClipboard {
            fail: true,
            ..Default::default()
        };
        let (result, out, err) = run(OutputKind::Clipboard, None, &mut clip);
        assert!(result.is_ok());
        assert_eq!(out, "REVIEW");
        assert!(err.contains("Failed to copy"));
    }

    #[test]
    fn stdout_mode() {
        let mut clip = FakeClipboard::default();
        let (_, out, _) = run(OutputKind::Stdout, None, &mut clip);
        assert_eq!(out, "REVIEW");
        assert!(clip.copied.is_none());
    }

    #[test]
    fn file_mode_requires_path() {
        let mut clip = FakeClipboard::default();
        let (result, _, _) = run(OutputKind::File, None, &mut clip);
        assert!(result.is_err());
    }

    #[test]
    fn file_mode_writes_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("review.md");
        std::fs::write(&path, "").expect("create");

        let mut clip = FakeClipboard::default();
        let (result, _, err) = run(OutputKind::File, Some(&path), &mut clip);
        assert!(result.is_ok());
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "REVIEW");
        assert!(err.contains("Review written to"));
    }

    #[test]
    fn file_mode_missing_file_uses_clipboard() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gone.md");

        let mut clip = FakeClipboard::default();
        let (result, _, err) = run(OutputKind::File, Some(&path), &mut clip);
        assert!(result.is_ok());
        assert!(!path.exists());
        assert_eq!(clip.copied.as_deref(), Some("REVIEW"));
        assert!(err.contains("was deleted"));
    }
}
