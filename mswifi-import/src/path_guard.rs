use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Refuse an export target that resolves to the database file itself.
pub fn ensure_not_database(output: &Path, database: &Path) -> Result<()> {
    let out_norm = normalize_for_compare(output)
        .with_context(|| format!("failed to normalize output path {}", output.display()))?;
    let db_norm = normalize_for_compare(database)
        .with_context(|| format!("failed to normalize database path {}", database.display()))?;

    if out_norm == db_norm {
        bail!(
            "refusing to overwrite the database: output {} is the database file",
            output.display()
        );
    }
    Ok(())
}

fn normalize_for_compare(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return path
            .canonicalize()
            .with_context(|| format!("canonicalize {}", path.display()));
    }

    // `..` is not resolved for paths that do not exist yet.
    let base = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().context("current_dir")?
    };
    Ok(base.join(path))
}

#[cfg(test)]
mod tests {
    use super::ensure_not_database;

    #[test]
    fn same_file_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("wifi-db.json");
        std::fs::write(&db, "{}").expect("write");
        let err = ensure_not_database(&dir.path().join(".").join("wifi-db.json"), &db)
            .expect_err("same file");
        assert!(err.to_string().contains("refusing to overwrite the database"));
        ensure_not_database(&dir.path().join("HomeWifi.xml"), &db).expect("other file");
    }
}
