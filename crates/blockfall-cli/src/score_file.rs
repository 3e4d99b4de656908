use std::{fs, io::ErrorKind, path::Path};

use anyhow::Context as _;

/// Reads the stored high score. A missing file counts as zero.
pub(crate) fn load(path: &Path) -> anyhow::Result<u64> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    text.trim()
        .parse()
        .with_context(|| format!("malformed high score in {}", path.display()))
}

/// Writes `score` when it beats the stored one. Returns whether the
/// file was updated.
pub(crate) fn store_if_higher(path: &Path, score: u64) -> anyhow::Result<bool> {
    if score <= load(path)? {
        return Ok(false);
    }
    fs::write(path, format!("{score}\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}
