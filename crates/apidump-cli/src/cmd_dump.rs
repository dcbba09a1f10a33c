use anyhow::{Context, Result};
use apidump::v1::{Snapshot, WalkConfig, Walker};
use apidump_manifest::{ManifestResolver, ManifestRuntime};
use clap::Args;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding manifest search roots, separated like `PATH`.
pub const SEARCH_PATH_ENV: &str = "APIDUMP_PATH";

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Modules to dump, by dotted name
    #[arg(required = true, value_name = "MODULE")]
    modules: Vec<String>,

    /// Write to this file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the output file as text rather than a JSON snapshot
    #[arg(short, long)]
    text: bool,

    /// Directory to search for module manifests (repeatable; defaults to
    /// $APIDUMP_PATH, then the current directory)
    #[arg(short = 'I', long = "search-path", value_name = "DIR")]
    search_path: Vec<PathBuf>,

    /// How deeply classes may nest inside a module
    #[arg(long, default_value_t = WalkConfig::default().max_depth)]
    max_depth: usize,
}

pub fn run(args: DumpArgs, pretty: bool) -> Result<()> {
    let roots = search_roots(args.search_path, std::env::var_os(SEARCH_PATH_ENV));
    debug!(roots = ?roots, "manifest search roots");

    let runtime = ManifestRuntime::new(ManifestResolver::new().with_roots(roots));
    let config = WalkConfig {
        max_depth: args.max_depth,
    };
    let snapshot = Walker::new(&runtime)
        .with_config(config)
        .walk(args.modules.iter().map(String::as_str))
        .with_context(|| format!("failed to dump {}", args.modules.join(", ")))?;

    match args.output {
        None => {
            let mut stdout = std::io::stdout().lock();
            snapshot.print_as_text(&mut stdout)?;
        }
        Some(path) => write_output(&snapshot, &path, args.text, pretty)?,
    }
    Ok(())
}

fn search_roots(explicit: Vec<PathBuf>, env: Option<OsString>) -> Vec<PathBuf> {
    if !explicit.is_empty() {
        return explicit;
    }
    match env {
        Some(paths) if !paths.is_empty() => std::env::split_paths(&paths).collect(),
        _ => vec![PathBuf::from(".")],
    }
}

fn write_output(snapshot: &Snapshot, path: &Path, text: bool, pretty: bool) -> Result<()> {
    if text {
        write_atomic(path, &snapshot.to_text())
    } else if pretty {
        let json = snapshot
            .to_json_pretty()
            .context("failed to serialize snapshot")?;
        write_atomic(path, &json)
    } else {
        snapshot
            .save_to_file(path)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to persist {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidump::v1::ApiEntry;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_search_path_wins() {
        let roots = search_roots(vec!["a".into()], Some(OsString::from("b")));
        assert_eq!(roots, vec![PathBuf::from("a")]);
    }

    #[test]
    fn test_search_path_from_env() {
        let joined = std::env::join_paths(["x", "y"]).unwrap();
        let roots = search_roots(Vec::new(), Some(joined));
        assert_eq!(roots, vec![PathBuf::from("x"), PathBuf::from("y")]);
    }

    #[test]
    fn test_search_path_defaults_to_cwd() {
        assert_eq!(search_roots(Vec::new(), None), vec![PathBuf::from(".")]);
        assert_eq!(
            search_roots(Vec::new(), Some(OsString::new())),
            vec![PathBuf::from(".")]
        );
    }

    fn sample() -> Snapshot {
        let mut snap = Snapshot::new();
        snap.set_version("pkg", Some("1.0".into()));
        snap.insert(ApiEntry::module("pkg"));
        snap
    }

    #[test]
    fn test_write_output_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.txt");
        write_output(&sample(), &path, true, false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "MODULE : pkg\n");
    }

    #[test]
    fn test_write_output_json() {
        let dir = TempDir::new().unwrap();
        for pretty in [false, true] {
            let path = dir.path().join(format!("api-{pretty}.json"));
            write_output(&sample(), &path, false, pretty).unwrap();
            let content = std::fs::read_to_string(&path).unwrap();
            assert_eq!(content.contains('\n'), pretty);
            assert_eq!(Snapshot::load_from_file(&path).unwrap(), sample());
        }
    }

    #[test]
    fn test_write_output_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.txt");
        std::fs::write(&path, "stale\nstale\n").unwrap();
        write_output(&sample(), &path, true, false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "MODULE : pkg\n");
    }
}
