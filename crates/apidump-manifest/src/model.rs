use apidump::v1::Signature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contents of one module manifest file.
///
/// # JSON shape
///
/// ```json
/// {
///   "version": "0.1",
///   "members": {
///     "v1": { "kind": "data", "type": "int" },
///     "sys": { "kind": "module", "name": "sys" },
///     "F1": {
///       "kind": "function",
///       "module": "api_ref",
///       "signature": { "parameters": [{ "name": "a" }] }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub members: BTreeMap<String, Object>,
}

/// Anything a module or class can hold, tagged by `"kind"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Object {
    Module(ModuleObject),
    Class(ClassObject),
    Function(FunctionObject),
    Property(PropertyObject),
    Data(DataObject),
}

/// A module. As a member it is only a reference by name; when imported it
/// also carries the manifest's version and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleObject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub members: BTreeMap<String, Object>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Base classes in resolution order, each as `module:Qualified.Name`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    #[serde(default)]
    pub members: BTreeMap<String, Object>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
    #[default]
    Function,
    StaticMethod,
    ClassMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default)]
    pub binding: Binding,
    /// `None` for callables that refuse introspection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataObject {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl Object {
    /// The module this object says it was defined in.
    pub fn defining_module(&self) -> Option<&str> {
        match self {
            Object::Module(_) => None,
            Object::Class(c) => c.module.as_deref(),
            Object::Function(f) => f.module.as_deref(),
            Object::Property(p) => p.module.as_deref(),
            Object::Data(d) => d.module.as_deref(),
        }
    }

    /// Name of the object's runtime type.
    pub fn type_name(&self) -> &str {
        match self {
            Object::Module(_) => "module",
            Object::Class(_) => "type",
            Object::Function(_) => "function",
            Object::Property(_) => "property",
            Object::Data(d) => &d.type_name,
        }
    }
}

impl ModuleObject {
    pub fn from_manifest(name: impl Into<String>, manifest: ModuleManifest) -> Self {
        Self {
            name: name.into(),
            version: manifest.version,
            members: manifest.members,
        }
    }
}
