//! The persisted door record: a single `DOOR_STATUS=<0|1>` line.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::Position;
use crate::common::constants::DOOR_STATUS_KEY;
use crate::common::utils::private_path;

#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored position. `Ok(None)` means no record exists yet;
    /// an unreadable or malformed record is an error.
    pub fn read(&self) -> Result<Option<Position>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", private_path(&self.path)))?;

        parse_record(&content).map(Some).with_context(|| {
            format!(
                "Malformed door record in {}: {:?}",
                private_path(&self.path),
                content.trim()
            )
        })
    }

    /// Replace the record with `position`.
    ///
    /// The new content goes to a temporary file in the same directory which
    /// is then renamed over the record, so readers see either the old line or
    /// the new one.
    pub fn write(&self, position: Position) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", private_path(parent)))?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .context("Failed to create temporary door record")?;
        writeln!(temp, "{}", format_record(position))
            .context("Failed to write temporary door record")?;
        temp.as_file()
            .sync_all()
            .context("Failed to sync temporary door record")?;
        temp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace {}", private_path(&self.path)))?;

        log_debug!("Stored {} in {}", format_record(position), private_path(&self.path));
        Ok(())
    }
}

pub fn format_record(position: Position) -> String {
    format!("{DOOR_STATUS_KEY}={}", position.as_record())
}

pub fn parse_record(content: &str) -> Result<Position> {
    let line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .context("record is empty")?;

    let (key, value) = line
        .split_once('=')
        .context("record has no '=' separator")?;
    if key.trim() != DOOR_STATUS_KEY {
        anyhow::bail!("unexpected key '{}'", key.trim());
    }

    match value.trim() {
        "0" => Ok(Position::Closed),
        "1" => Ok(Position::Open),
        other => anyhow::bail!("unexpected value '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_record() {
        assert_eq!(parse_record("DOOR_STATUS=1").unwrap(), Position::Open);
        assert_eq!(parse_record("DOOR_STATUS=0\n").unwrap(), Position::Closed);
        assert_eq!(parse_record("\n DOOR_STATUS = 1 \n").unwrap(), Position::Open);

        assert!(parse_record("").is_err());
        assert!(parse_record("DOOR_STATUS=").is_err());
        assert!(parse_record("DOOR_STATUS=2").is_err());
        assert!(parse_record("DOOR=1").is_err());
        assert!(parse_record("open").is_err());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let file = StateFile::new(dir.path().join("nested").join("door.state"));

        assert!(file.read().unwrap().is_none());

        file.write(Position::Open).unwrap();
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "DOOR_STATUS=1\n");
        assert_eq!(file.read().unwrap(), Some(Position::Open));

        file.write(Position::Closed).unwrap();
        assert_eq!(file.read().unwrap(), Some(Position::Closed));
    }

    #[test]
    fn test_write_leaves_no_temporary_files() {
        let dir = tempdir().unwrap();
        let file = StateFile::new(dir.path().join("door.state"));

        file.write(Position::Open).unwrap();
        file.write(Position::Closed).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
