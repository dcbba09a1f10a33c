use anyhow::{Context, Result};
use apidump::v1::Snapshot;
use std::path::{Path, PathBuf};

pub fn run(input: PathBuf) -> Result<()> {
    let snapshot = load_snapshot(&input)?;
    let mut stdout = std::io::stdout().lock();
    snapshot.print_as_text(&mut stdout)?;
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    Snapshot::load_from_file(path).with_context(|| format!("Failed to load {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_snapshot() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"versions": {{"pkg": null}}, "api": [[["MODULE", "pkg"]]]}}"#
        )
        .unwrap();
        f.flush().unwrap();

        let snapshot = load_snapshot(f.path()).unwrap();
        assert_eq!(snapshot.to_text(), "MODULE : pkg\n");
    }

    #[test]
    fn test_load_snapshot_rejects_bad_entry() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"versions": {{}}, "api": [[["MODULE", "pkg", 1]]]}}"#
        )
        .unwrap();
        f.flush().unwrap();

        let err = load_snapshot(f.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load"));
    }

    #[test]
    fn test_load_snapshot_missing_file() {
        assert!(load_snapshot(Path::new("/nonexistent/api.json")).is_err());
    }
}
