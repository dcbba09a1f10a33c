//! Text rendering and JSON persistence for snapshots.

use crate::types::Snapshot;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Separator between the values of a segment in text output.
const TEXT_DELIMITER: &str = " : ";

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Snapshot {
    /// Print every entry in canonical order, one per line, indented by one
    /// tab per level below its root module. Only the last segment of each
    /// entry is printed; the indentation carries the rest of the path.
    ///
    /// ```text
    /// MODULE : pkg
    ///     FUNCTION : f : no-return-type
    ///         REQUIRED : 0 : a : no-type
    /// ```
    pub fn print_as_text<W: Write>(&self, to: &mut W) -> io::Result<()> {
        for entry in self.entries() {
            let indent = "\t".repeat(entry.depth());
            let leaf: Vec<String> = entry
                .leaf()
                .scalars()
                .iter()
                .map(ToString::to_string)
                .collect();
            writeln!(to, "{}{}", indent, leaf.join(TEXT_DELIMITER))?;
        }
        Ok(())
    }

    /// The output of [`Snapshot::print_as_text`] as a string.
    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.print_as_text(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the snapshot as JSON to `path`, replacing the file atomically.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, self)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Read a snapshot written by [`Snapshot::save_to_file`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ApiEntry, FunctionKind, NO_RETURN_TYPE, NO_SIGNATURE, NO_TYPE, Segment,
    };
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        let root = ApiEntry::module("pkg");
        let func = root.child(Segment::function(
            FunctionKind::Function,
            "f",
            NO_RETURN_TYPE,
        ));
        let class = root.child(Segment::class("C"));

        let mut snap = Snapshot::new();
        snap.set_version("pkg", Some("1.0".into()));
        snap.set_version("other", None);
        snap.insert(func.child(Segment::optional("b", "typing.Optional[bool]")));
        snap.insert(func.child(Segment::required(0, "a", "<class 'int'>")));
        snap.insert(func);
        snap.insert(class.child(Segment::property("v")));
        snap.insert(class.child(Segment::function(
            FunctionKind::StaticMethod,
            "native",
            NO_SIGNATURE,
        )));
        snap.insert(class);
        snap.insert(root.child(Segment::member("v1", "int")));
        snap.insert(root);
        snap
    }

    #[test]
    fn test_print_as_text() {
        let text = sample().to_text();
        let expected = "\
MODULE : pkg
\tCLASS : C
\t\tPROPERTY : v
\t\tSTATICMETHOD : native : no-signature
\tFUNCTION : f : no-return-type
\t\tOPTIONAL : b : typing.Optional[bool]
\t\tREQUIRED : 0 : a : <class 'int'>
\tMEMBER : v1 : int
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_print_as_text_empty() {
        assert_eq!(Snapshot::new().to_text(), "");
    }

    #[test]
    fn test_json_shape() {
        let mut snap = Snapshot::new();
        snap.set_version("pkg", None);
        snap.insert(ApiEntry::module("pkg").child(Segment::required(0, "x", NO_TYPE)));
        let json = snap.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"versions":{"pkg":null},"api":[[["MODULE","pkg"],["REQUIRED",0,"x","no-type"]]]}"#
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.json");
        let snap = sample();

        snap.save_to_file(&path).unwrap();
        let loaded = Snapshot::load_from_file(&path).unwrap();

        assert_eq!(loaded, snap);
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.json");
        std::fs::write(&path, "stale").unwrap();

        sample().save_to_file(&path).unwrap();
        assert_eq!(Snapshot::load_from_file(&path).unwrap(), sample());
    }

    #[test]
    fn test_load_ignores_on_disk_order() {
        let json = r#"{
            "versions": {"pkg": "1.0"},
            "api": [
                [["MODULE", "pkg"], ["MEMBER", "v1", "int"]],
                [["MODULE", "pkg"]],
                [["MODULE", "pkg"]]
            ]
        }"#;
        let snap = Snapshot::from_json(json).unwrap();
        assert_eq!(snap.len(), 2);

        let mut expected = Snapshot::new();
        expected.set_version("pkg", Some("1.0".into()));
        expected.insert(ApiEntry::module("pkg"));
        expected.insert(ApiEntry::module("pkg").child(Segment::member("v1", "int")));
        assert_eq!(snap, expected);
    }

    #[test]
    fn test_pretty_json_roundtrip() {
        let snap = sample();
        let json = snap.to_json_pretty().unwrap();
        assert!(json.contains('\n'));
        assert_eq!(Snapshot::from_json(&json).unwrap(), snap);
    }

    #[test]
    fn test_load_rejects_nested_scalar() {
        let json = r#"{"versions": {}, "api": [[["MODULE", ["pkg"]]]]}"#;
        assert!(matches!(
            Snapshot::from_json(json),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn test_load_rejects_bad_shape() {
        assert!(Snapshot::from_json(r#"{"versions": {}, "api": [[["MODULE"]]]}"#).is_err());
        assert!(Snapshot::from_json(r#"{"versions": {}, "api": [[["NOPE", "x"]]]}"#).is_err());
        assert!(Snapshot::from_json(r#"{"versions": {"pkg": 3}, "api": []}"#).is_err());
        assert!(Snapshot::from_json(r#"{"api": []}"#).is_err());
        assert!(Snapshot::from_json("not json").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Snapshot::load_from_file("/nonexistent/api.json").unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
