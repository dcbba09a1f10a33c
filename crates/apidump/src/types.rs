use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Return-type placeholder for a callable without a return annotation.
pub const NO_RETURN_TYPE: &str = "no-return-type";
/// Return-type placeholder for a callable whose signature cannot be obtained.
pub const NO_SIGNATURE: &str = "no-signature";
/// Type placeholder for a parameter without an annotation.
pub const NO_TYPE: &str = "no-type";

/// Every API entry in a snapshot, deduplicated and totally ordered.
pub type ApiSet = BTreeSet<ApiEntry>;

/// Module name to version string, `None` when no version could be determined.
pub type VersionMap = BTreeMap<String, Option<String>>;

/// Raised when an entry or one of its segments does not have a valid shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("API entry must contain at least one segment")]
    Empty,

    #[error("API entry segment must not be empty")]
    EmptySegment,

    #[error("segment tag must be a string, found {0}")]
    TagNotString(i64),

    #[error("unknown segment tag: {0}")]
    UnknownTag(String),

    #[error("{tag} segment takes {expected} values after the tag, found {found}")]
    Arity {
        tag: String,
        expected: usize,
        found: usize,
    },

    #[error("{tag} segment value {position} must be {expected}, found {found}")]
    ScalarKind {
        tag: String,
        position: usize,
        expected: &'static str,
        found: String,
    },

    #[error("API entry values must be strings or integers, found {0}")]
    NotScalar(String),
}

// ============================================================================
// Scalar
// ============================================================================

/// A single value inside a [`Segment`]: only strings and integers are allowed.
///
/// Integers order before strings when the two are compared at the same
/// position; otherwise values compare by their natural order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scalar {
    Int(i64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl TryFrom<serde_json::Value> for Scalar {
    type Error = EntryError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::String(s) => Ok(Scalar::Str(s)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Scalar::Int)
                .ok_or_else(|| EntryError::NotScalar(n.to_string())),
            other => Err(EntryError::NotScalar(other.to_string())),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer scalar")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
                Ok(Scalar::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
                i64::try_from(v)
                    .map(Scalar::Int)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
                Ok(Scalar::Str(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
                Ok(Scalar::Str(v))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

// ============================================================================
// Segment
// ============================================================================

/// How a callable is bound to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Function,
    StaticMethod,
    ClassMethod,
}

impl FunctionKind {
    pub fn tag(self) -> &'static str {
        match self {
            FunctionKind::Function => "FUNCTION",
            FunctionKind::StaticMethod => "STATICMETHOD",
            FunctionKind::ClassMethod => "CLASSMETHOD",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "FUNCTION" => Some(FunctionKind::Function),
            "STATICMETHOD" => Some(FunctionKind::StaticMethod),
            "CLASSMETHOD" => Some(FunctionKind::ClassMethod),
            _ => None,
        }
    }
}

/// One node on the path from a root module to a fact about the API.
///
/// Every segment serializes as a JSON array whose first value is the tag:
///
/// ```json
/// ["MODULE", "mypkg"]
/// ["FUNCTION", "bar", "<class 'int'>"]
/// ["REQUIRED", 0, "x", "no-type"]
/// ```
///
/// Deserialization validates the tag, the number of values, and the kind of
/// each value, so a segment that exists is always well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Module(String),
    Class(String),
    Function {
        kind: FunctionKind,
        name: String,
        returns: String,
    },
    /// A parameter without a default; `index` counts required parameters only.
    Required {
        index: u32,
        name: String,
        ty: String,
    },
    /// A parameter with a default, or a variadic collector.
    Optional {
        name: String,
        ty: String,
    },
    Property(String),
    Member {
        name: String,
        ty: String,
    },
}

impl Segment {
    pub fn module(name: impl Into<String>) -> Self {
        Segment::Module(name.into())
    }

    pub fn class(name: impl Into<String>) -> Self {
        Segment::Class(name.into())
    }

    pub fn function(
        kind: FunctionKind,
        name: impl Into<String>,
        returns: impl Into<String>,
    ) -> Self {
        Segment::Function {
            kind,
            name: name.into(),
            returns: returns.into(),
        }
    }

    pub fn required(index: u32, name: impl Into<String>, ty: impl Into<String>) -> Self {
        Segment::Required {
            index,
            name: name.into(),
            ty: ty.into(),
        }
    }

    pub fn optional(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Segment::Optional {
            name: name.into(),
            ty: ty.into(),
        }
    }

    pub fn property(name: impl Into<String>) -> Self {
        Segment::Property(name.into())
    }

    pub fn member(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Segment::Member {
            name: name.into(),
            ty: ty.into(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Segment::Module(_) => "MODULE",
            Segment::Class(_) => "CLASS",
            Segment::Function { kind, .. } => kind.tag(),
            Segment::Required { .. } => "REQUIRED",
            Segment::Optional { .. } => "OPTIONAL",
            Segment::Property(_) => "PROPERTY",
            Segment::Member { .. } => "MEMBER",
        }
    }

    /// The name this segment describes.
    pub fn name(&self) -> &str {
        match self {
            Segment::Module(name) | Segment::Class(name) | Segment::Property(name) => name,
            Segment::Function { name, .. }
            | Segment::Required { name, .. }
            | Segment::Optional { name, .. }
            | Segment::Member { name, .. } => name,
        }
    }

    /// The ordered values of this segment, tag first.
    pub fn scalars(&self) -> Vec<Scalar> {
        let tag = Scalar::from(self.tag());
        match self {
            Segment::Module(name) | Segment::Class(name) | Segment::Property(name) => {
                vec![tag, name.as_str().into()]
            }
            Segment::Function { name, returns, .. } => {
                vec![tag, name.as_str().into(), returns.as_str().into()]
            }
            Segment::Required { index, name, ty } => vec![
                tag,
                Scalar::Int(i64::from(*index)),
                name.as_str().into(),
                ty.as_str().into(),
            ],
            Segment::Optional { name, ty } | Segment::Member { name, ty } => {
                vec![tag, name.as_str().into(), ty.as_str().into()]
            }
        }
    }
}

fn tag_arity(tag: &str) -> Option<usize> {
    match tag {
        "MODULE" | "CLASS" | "PROPERTY" => Some(1),
        "FUNCTION" | "STATICMETHOD" | "CLASSMETHOD" | "OPTIONAL" | "MEMBER" => Some(2),
        "REQUIRED" => Some(3),
        _ => None,
    }
}

impl TryFrom<Vec<Scalar>> for Segment {
    type Error = EntryError;

    fn try_from(scalars: Vec<Scalar>) -> Result<Self, Self::Error> {
        let mut values = scalars.into_iter();
        let tag = match values.next() {
            None => return Err(EntryError::EmptySegment),
            Some(Scalar::Int(i)) => return Err(EntryError::TagNotString(i)),
            Some(Scalar::Str(tag)) => tag,
        };
        let fields: Vec<Scalar> = values.collect();

        let expected = tag_arity(&tag).ok_or_else(|| EntryError::UnknownTag(tag.clone()))?;
        if fields.len() != expected {
            return Err(EntryError::Arity {
                tag,
                expected,
                found: fields.len(),
            });
        }

        let string = |position: usize| match &fields[position] {
            Scalar::Str(s) => Ok(s.clone()),
            Scalar::Int(i) => Err(EntryError::ScalarKind {
                tag: tag.clone(),
                position: position + 1,
                expected: "a string",
                found: i.to_string(),
            }),
        };

        let segment = match tag.as_str() {
            "MODULE" => Segment::Module(string(0)?),
            "CLASS" => Segment::Class(string(0)?),
            "PROPERTY" => Segment::Property(string(0)?),
            "OPTIONAL" => Segment::optional(string(0)?, string(1)?),
            "MEMBER" => Segment::member(string(0)?, string(1)?),
            "REQUIRED" => {
                let index = match &fields[0] {
                    Scalar::Int(i) => u32::try_from(*i).ok(),
                    Scalar::Str(_) => None,
                }
                .ok_or_else(|| EntryError::ScalarKind {
                    tag: tag.clone(),
                    position: 1,
                    expected: "a non-negative integer",
                    found: fields[0].to_string(),
                })?;
                Segment::required(index, string(1)?, string(2)?)
            }
            other => match FunctionKind::from_tag(other) {
                Some(kind) => Segment::function(kind, string(0)?, string(1)?),
                None => return Err(EntryError::UnknownTag(tag.clone())),
            },
        };
        Ok(segment)
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scalars().cmp(&other.scalars())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.scalars().iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" : "))
    }
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.scalars().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Segment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let scalars = Vec::<Scalar>::deserialize(deserializer)?;
        Segment::try_from(scalars).map_err(de::Error::custom)
    }
}

// ============================================================================
// ApiEntry
// ============================================================================

/// One fact about the public API: the full path of segments from the root
/// module down to the thing being described.
///
/// An entry always has at least one segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ApiEntry(Vec<Segment>);

impl ApiEntry {
    pub fn new(segments: Vec<Segment>) -> Result<Self, EntryError> {
        if segments.is_empty() {
            return Err(EntryError::Empty);
        }
        Ok(Self(segments))
    }

    /// The path of a module: one `MODULE` segment per dotted component.
    pub fn module(name: &str) -> Self {
        Self(name.split('.').map(Segment::module).collect())
    }

    /// Build an entry from untyped values, rejecting anything that is not a
    /// string or an integer.
    pub fn from_values(segments: Vec<Vec<serde_json::Value>>) -> Result<Self, EntryError> {
        let segments = segments
            .into_iter()
            .map(|values| {
                let scalars = values
                    .into_iter()
                    .map(Scalar::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Segment::try_from(scalars)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(segments)
    }

    /// This path extended by one segment.
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn leaf(&self) -> &Segment {
        &self.0[self.0.len() - 1]
    }

    /// Nesting depth when rendered as text; a root module is at depth 0.
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }
}

impl fmt::Display for ApiEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" / "))
    }
}

impl<'de> Deserialize<'de> for ApiEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let segments = Vec::<Segment>::deserialize(deserializer)?;
        ApiEntry::new(segments).map_err(de::Error::custom)
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// The public API of a set of modules together with their versions.
///
/// This is the unit that gets persisted and compared: two snapshots are equal
/// when they contain the same entries and the same versions.
///
/// # JSON shape
///
/// ```json
/// {
///   "versions": { "mypkg": "1.2.0" },
///   "api": [
///     [["MODULE", "mypkg"]],
///     [["MODULE", "mypkg"], ["MEMBER", "answer", "int"]]
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub versions: VersionMap,
    pub api: ApiSet,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; returns `false` if it was already present.
    pub fn insert(&mut self, entry: ApiEntry) -> bool {
        self.api.insert(entry)
    }

    pub fn contains(&self, entry: &ApiEntry) -> bool {
        self.api.contains(entry)
    }

    pub fn set_version(&mut self, module: impl Into<String>, version: Option<String>) {
        self.versions.insert(module.into(), version);
    }

    /// Entries in their canonical order.
    pub fn entries(&self) -> impl Iterator<Item = &ApiEntry> {
        self.api.iter()
    }

    pub fn len(&self) -> usize {
        self.api.len()
    }

    pub fn is_empty(&self) -> bool {
        self.api.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(segments: Vec<Segment>) -> ApiEntry {
        ApiEntry::new(segments).unwrap()
    }

    // ── Scalar ─────────────────────────────────────────────────────────

    #[test]
    fn test_scalar_rejects_nested_list() {
        let err = Scalar::try_from(json!(["nested"])).unwrap_err();
        assert!(matches!(err, EntryError::NotScalar(_)));
    }

    #[test]
    fn test_scalar_rejects_float_and_bool() {
        assert!(Scalar::try_from(json!(1.5)).is_err());
        assert!(Scalar::try_from(json!(true)).is_err());
        assert!(Scalar::try_from(json!(null)).is_err());
    }

    #[test]
    fn test_scalar_deserialize_rejects_non_scalars() {
        assert!(serde_json::from_str::<Scalar>("[1]").is_err());
        assert!(serde_json::from_str::<Scalar>("{}").is_err());
        assert!(serde_json::from_str::<Scalar>("2.5").is_err());
        assert_eq!(serde_json::from_str::<Scalar>("7").unwrap(), Scalar::Int(7));
        assert_eq!(
            serde_json::from_str::<Scalar>("\"x\"").unwrap(),
            Scalar::from("x")
        );
    }

    #[test]
    fn test_scalar_int_orders_before_str() {
        assert!(Scalar::Int(100) < Scalar::from("0"));
    }

    // ── Segment ────────────────────────────────────────────────────────

    #[test]
    fn test_segment_scalars() {
        let seg = Segment::required(2, "x", "<class 'int'>");
        assert_eq!(
            seg.scalars(),
            vec![
                Scalar::from("REQUIRED"),
                Scalar::Int(2),
                Scalar::from("x"),
                Scalar::from("<class 'int'>"),
            ]
        );
        assert_eq!(seg.name(), "x");
    }

    #[test]
    fn test_segment_json_shape() {
        let seg = Segment::function(FunctionKind::StaticMethod, "help", NO_RETURN_TYPE);
        let json = serde_json::to_string(&seg).unwrap();
        assert_eq!(json, r#"["STATICMETHOD","help","no-return-type"]"#);
    }

    #[test]
    fn test_segment_try_from_unknown_tag() {
        let err = Segment::try_from(vec![Scalar::from("METHOD"), Scalar::from("m")]).unwrap_err();
        assert_eq!(err, EntryError::UnknownTag("METHOD".into()));
    }

    #[test]
    fn test_segment_try_from_wrong_arity() {
        let err = Segment::try_from(vec![Scalar::from("MODULE")]).unwrap_err();
        assert!(matches!(err, EntryError::Arity { expected: 1, found: 0, .. }));
    }

    #[test]
    fn test_segment_try_from_wrong_kind() {
        let err = Segment::try_from(vec![
            Scalar::from("REQUIRED"),
            Scalar::from("zero"),
            Scalar::from("x"),
            Scalar::from(NO_TYPE),
        ])
        .unwrap_err();
        assert!(matches!(err, EntryError::ScalarKind { position: 1, .. }));

        let err = Segment::try_from(vec![Scalar::from("CLASS"), Scalar::Int(3)]).unwrap_err();
        assert!(matches!(err, EntryError::ScalarKind { position: 1, .. }));
    }

    #[test]
    fn test_segment_try_from_negative_index() {
        let err = Segment::try_from(vec![
            Scalar::from("REQUIRED"),
            Scalar::Int(-1),
            Scalar::from("x"),
            Scalar::from(NO_TYPE),
        ])
        .unwrap_err();
        assert!(matches!(err, EntryError::ScalarKind { .. }));
    }

    #[test]
    fn test_segment_try_from_int_tag() {
        let err = Segment::try_from(vec![Scalar::Int(1), Scalar::from("x")]).unwrap_err();
        assert_eq!(err, EntryError::TagNotString(1));
    }

    #[test]
    fn test_segment_order_follows_scalars() {
        // "CLASS" < "FUNCTION" < "MEMBER" < "OPTIONAL" < "REQUIRED"
        let mut segs = vec![
            Segment::required(0, "a", NO_TYPE),
            Segment::member("d1", "int"),
            Segment::class("C1"),
            Segment::optional("b", NO_TYPE),
            Segment::function(FunctionKind::Function, "F1", NO_RETURN_TYPE),
        ];
        segs.sort();
        let tags: Vec<&str> = segs.iter().map(Segment::tag).collect();
        assert_eq!(
            tags,
            vec!["CLASS", "FUNCTION", "MEMBER", "OPTIONAL", "REQUIRED"]
        );
    }

    #[test]
    fn test_segment_display() {
        let seg = Segment::member("v1", "int");
        assert_eq!(seg.to_string(), "MEMBER : v1 : int");
    }

    // ── ApiEntry ───────────────────────────────────────────────────────

    #[test]
    fn test_entry_empty_is_rejected() {
        assert_eq!(ApiEntry::new(vec![]).unwrap_err(), EntryError::Empty);
    }

    #[test]
    fn test_entry_module_prefix() {
        let e = ApiEntry::module("api_ref.pub_mod");
        assert_eq!(
            e.segments(),
            &[Segment::module("api_ref"), Segment::module("pub_mod")]
        );
        assert_eq!(e.depth(), 1);
    }

    #[test]
    fn test_entry_child() {
        let base = ApiEntry::module("pkg");
        let child = base.child(Segment::member("v1", "int"));
        assert_eq!(child.depth(), 1);
        assert_eq!(child.leaf(), &Segment::member("v1", "int"));
        assert_eq!(base.depth(), 0);
    }

    #[test]
    fn test_entry_from_values_rejects_nested_list() {
        let err = ApiEntry::from_values(vec![vec![json!("MODULE"), json!(["pkg"])]]).unwrap_err();
        assert!(matches!(err, EntryError::NotScalar(_)));
    }

    #[test]
    fn test_entry_from_values() {
        let e = ApiEntry::from_values(vec![
            vec![json!("MODULE"), json!("pkg")],
            vec![json!("FUNCTION"), json!("f"), json!(NO_RETURN_TYPE)],
            vec![json!("REQUIRED"), json!(0), json!("a"), json!(NO_TYPE)],
        ])
        .unwrap();
        assert_eq!(e.leaf(), &Segment::required(0, "a", NO_TYPE));
    }

    #[test]
    fn test_entry_prefix_orders_first() {
        let base = ApiEntry::module("pkg");
        let child = base.child(Segment::class("A"));
        assert!(base < child);
    }

    #[test]
    fn test_entry_deserialize_rejects_empty() {
        assert!(serde_json::from_str::<ApiEntry>("[]").is_err());
        assert!(serde_json::from_str::<ApiEntry>(r#"[["MODULE", ["pkg"]]]"#).is_err());
    }

    #[test]
    fn test_entry_display() {
        let e = entry(vec![Segment::module("pkg"), Segment::property("v")]);
        assert_eq!(e.to_string(), "MODULE : pkg / PROPERTY : v");
    }

    // ── Snapshot ───────────────────────────────────────────────────────

    #[test]
    fn test_snapshot_insert_deduplicates() {
        let mut snap = Snapshot::new();
        assert!(snap.insert(ApiEntry::module("pkg")));
        assert!(!snap.insert(ApiEntry::module("pkg")));
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn test_snapshot_equality_ignores_insertion_order() {
        let a = ApiEntry::module("pkg");
        let b = a.child(Segment::member("v1", "int"));

        let mut s1 = Snapshot::new();
        s1.insert(a.clone());
        s1.insert(b.clone());
        let mut s2 = Snapshot::new();
        s2.insert(b);
        s2.insert(a);

        assert_eq!(s1, s2);
    }

    #[test]
    fn test_snapshot_versions_participate_in_equality() {
        let mut s1 = Snapshot::new();
        s1.set_version("pkg", Some("1.0".into()));
        let mut s2 = Snapshot::new();
        s2.set_version("pkg", None);
        assert_ne!(s1, s2);
    }
}
