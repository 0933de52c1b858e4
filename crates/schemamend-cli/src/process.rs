//! Schema file loading, the mend pass, and atomic write-back

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use schemamend_rules::{cheesemap_rule_set, RuleApplication};

/// What one mend pass did
pub struct MendOutcome {
    /// Per-rule edit counts, in application order
    pub applied: Vec<RuleApplication>,
    /// Whether the corrected text differs from what was on disk
    pub changed: bool,
}

/// Load the schema, run the rule set, and write the result back.
///
/// The write only happens after every rule has succeeded, so a failing rule
/// leaves the file exactly as it was. With `dry_run` set nothing is written
/// even when drift was found.
pub fn mend_schema(path: &Path, dry_run: bool) -> Result<MendOutcome> {
    let source = load_schema(path)?;

    let set = cheesemap_rule_set().context("invalid rule ordering")?;
    let outcome = set
        .apply(source.clone())
        .context("rule set failed; schema left untouched")?;

    let changed = outcome.buffer != source;
    if changed && !dry_run {
        write_schema_atomic(path, &outcome.buffer)?;
    }

    Ok(MendOutcome {
        applied: outcome.applied,
        changed,
    })
}

/// Read the schema in full. A missing or unreadable file aborts the run
/// before any rule executes.
pub fn load_schema(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema: {}", path.display()))
}

/// Replace the schema atomically.
///
/// The corrected text is staged in a temporary file in the same directory
/// and renamed over the original, so an interrupted write never leaves a
/// truncated or mixed-version schema behind.
pub fn write_schema_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to stage write in {}", dir.display()))?;
    staged
        .write_all(content.as_bytes())
        .context("Failed to write staged schema")?;
    staged
        .persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_schema_fails() {
        let dir = TempDir::new().unwrap();
        let result = load_schema(&dir.path().join("schema.prisma"));
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.prisma");
        fs::write(&path, "model A {\n  id String @id\n}\n").unwrap();

        let source = load_schema(&path).unwrap();
        write_schema_atomic(&path, &source).unwrap();

        assert_eq!(load_schema(&path).unwrap(), source);
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.prisma");
        fs::write(&path, "old").unwrap();

        write_schema_atomic(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        // no staging leftovers next to the schema
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.prisma");

        write_schema_atomic(&path, "model A {\n}\n").unwrap();
        assert!(path.exists());
    }

    const DRIFTED: &str =
        include_str!("../../schemamend-rules/tests/fixtures/drifted.prisma");

    #[test]
    fn test_failed_rule_set_leaves_schema_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.prisma");
        // no Booking model: the first rename has nothing to anchor on
        let source = "model Widget {\n  id String @id\n}\n";
        fs::write(&path, source).unwrap();

        assert!(mend_schema(&path, false).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), source);
    }

    #[test]
    fn test_dry_run_reports_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.prisma");
        fs::write(&path, DRIFTED).unwrap();

        let outcome = mend_schema(&path, true).unwrap();
        assert!(outcome.changed);
        assert_eq!(fs::read_to_string(&path).unwrap(), DRIFTED);
    }

    #[test]
    fn test_mend_writes_corrected_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.prisma");
        fs::write(&path, DRIFTED).unwrap();

        let outcome = mend_schema(&path, false).unwrap();
        assert!(outcome.changed);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("model TourBooking {"));

        // a second pass finds nothing left to do
        let again = mend_schema(&path, false).unwrap();
        assert!(!again.changed);
    }
}
