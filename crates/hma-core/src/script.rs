//! Script emitter: wraps merged lines as a loadable table script

use crate::error::{Error, Result};
use crate::profile::FormatProfile;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Render the script text: optional header, then the lines as given.
///
/// Lines carry their own terminators. The header is skipped when the first
/// line already is one or starts with the profile's header prefix; an inserted
/// header uses the first line's terminator.
pub fn render_script(lines: &[String], profile: &FormatProfile) -> String {
    let first = lines.first().map(String::as_str).unwrap_or_default();
    let leading = first.trim_start();
    let has_header =
        leading.starts_with(profile.header_prefix) || leading.starts_with(profile.script_header);

    let body = lines.concat();
    if has_header {
        body
    } else {
        let newline = if first.ends_with("\r\n") { "\r\n" } else { "\n" };
        format!("{}{}{}", profile.script_header, newline, body)
    }
}

/// Write the script to `path`.
///
/// Content goes to a temporary sibling file that is renamed over the
/// destination, so a failed write never leaves a truncated script behind.
pub fn write_script<P: AsRef<Path>>(path: P, lines: &[String], profile: &FormatProfile) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = temp_path(path);
    let content = render_script(lines, profile);

    let written = write_file(&tmp_path, &content).and_then(|_| fs::rename(&tmp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::FileWrite {
            path: path.to_path_buf(),
            source: e,
        });
    }

    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote script");
    Ok(())
}

fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(content.as_bytes())?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "script".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
