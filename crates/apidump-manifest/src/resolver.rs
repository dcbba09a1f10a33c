use crate::error::{ManifestError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const PACKAGE_MANIFEST: &str = "__init__.json";
const MANIFEST_EXTENSION: &str = "json";
const DIST_INFO_SUFFIX: &str = ".dist-info.json";

/// Where a module's manifest lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    pub manifest: PathBuf,
    /// Directory holding the package's submodules; `None` for plain modules.
    pub package_dir: Option<PathBuf>,
}

/// Installed package metadata, read from `<root>/<name>.dist-info.json`.
#[derive(Debug, Clone, Deserialize)]
struct DistInfo {
    version: String,
}

/// Maps dotted module names onto manifest files below a list of search roots.
///
/// Module `a.b.c` is the package `a/b/c/__init__.json` or the plain module
/// `a/b/c.json` in the first root that has either; a package wins over a
/// plain module in the same root.
#[derive(Debug, Clone, Default)]
pub struct ManifestResolver {
    roots: Vec<PathBuf>,
}

impl ManifestResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn with_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots.extend(roots.into_iter().map(Into::into));
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn locate(&self, name: &str) -> Result<ModuleLocation> {
        let relative = relative_path(name)?;

        for root in &self.roots {
            let package_dir = root.join(&relative);
            let package_manifest = package_dir.join(PACKAGE_MANIFEST);
            if package_manifest.is_file() {
                return Ok(ModuleLocation {
                    manifest: package_manifest,
                    package_dir: Some(package_dir),
                });
            }

            let module_manifest = root.join(&relative).with_extension(MANIFEST_EXTENSION);
            if module_manifest.is_file() {
                return Ok(ModuleLocation {
                    manifest: module_manifest,
                    package_dir: None,
                });
            }
        }

        Err(ManifestError::ModuleNotFound(name.to_string()))
    }

    /// Every module below the package `name`, at any depth, sorted by name.
    pub fn submodules(&self, name: &str) -> Result<Vec<String>> {
        let Some(package_dir) = self.locate(name)?.package_dir else {
            return Ok(Vec::new());
        };

        let mut names = Vec::new();
        collect_submodules(&package_dir, name, &mut names)?;
        names.sort();
        Ok(names)
    }

    /// Version from installed package metadata, if any root has it.
    pub fn distribution_version(&self, name: &str) -> Option<String> {
        for root in &self.roots {
            let path = root.join(format!("{}{}", name, DIST_INFO_SUFFIX));
            if !path.is_file() {
                continue;
            }
            match read_dist_info(&path) {
                Ok(info) => return Some(info.version),
                Err(e) => debug!(path = %path.display(), error = %e, "ignoring unreadable dist-info"),
            }
        }
        None
    }
}

fn relative_path(name: &str) -> Result<PathBuf> {
    let parts: Vec<&str> = name.split('.').collect();
    let valid = parts
        .iter()
        .all(|part| !part.is_empty() && !part.contains(['/', '\\']));
    if !valid {
        return Err(ManifestError::InvalidModuleName(name.to_string()));
    }
    Ok(parts.iter().collect())
}

fn collect_submodules(dir: &Path, package: &str, names: &mut Vec<String>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };

        if entry.file_type()?.is_dir() {
            if path.join(PACKAGE_MANIFEST).is_file() {
                let qualified = format!("{}.{}", package, file_name);
                names.push(qualified.clone());
                collect_submodules(&path, &qualified, names)?;
            }
        } else if file_name != PACKAGE_MANIFEST
            && path.extension().and_then(|s| s.to_str()) == Some(MANIFEST_EXTENSION)
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            && !stem.contains('.')
        {
            names.push(format!("{}.{}", package, stem));
        }
    }
    Ok(())
}

fn read_dist_info(path: &Path) -> Result<DistInfo> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| ManifestError::InvalidManifest {
        path: path.to_path_buf(),
        source,
    })
}
