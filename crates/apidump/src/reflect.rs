//! Capabilities a runtime must provide for its modules to be walked.
//!
//! The walker never inspects objects itself. Everything it needs to know
//! (what an object is, what it contains, where it was defined, how it is
//! called) goes through [`Reflect`], and module resolution goes through
//! [`ModuleLoader`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a parameter binds arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    PositionalOnly,
    #[default]
    PositionalOrKeyword,
    /// Collects extra positional arguments (`*args`).
    VarPositional,
    KeywordOnly,
    /// Collects extra keyword arguments (`**kwargs`).
    VarKeyword,
}

impl ParameterKind {
    pub fn is_variadic(self) -> bool {
        matches!(self, ParameterKind::VarPositional | ParameterKind::VarKeyword)
    }
}

/// A declared parameter of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub kind: ParameterKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            has_default: false,
            annotation: None,
        }
    }

    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::PositionalOrKeyword)
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// A parameter must be supplied by every caller unless it has a default
    /// or collects variadic arguments.
    pub fn is_required(&self) -> bool {
        !self.has_default && !self.kind.is_variadic()
    }
}

/// A call signature: parameters in declaration order plus the return
/// annotation, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_annotation: Option<String>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returning(mut self, annotation: impl Into<String>) -> Self {
        self.return_annotation = Some(annotation.into());
        self
    }
}

/// A callable refused introspection of its signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no signature available: {0}")]
pub struct SignatureError(pub String);

/// Introspection of live objects: modules, classes, callables, properties,
/// and plain data.
pub trait Reflect {
    /// A handle to an object in the runtime.
    type Object;
    /// Failure to reflect over an object (e.g. an unresolvable base class).
    type Error: std::error::Error + Send + Sync + 'static;

    /// All members of a module or class, inherited ones included, sorted by
    /// name.
    fn list_members(&self, object: &Self::Object)
    -> Result<Vec<(String, Self::Object)>, Self::Error>;

    fn is_module(&self, object: &Self::Object) -> bool;

    fn is_class(&self, object: &Self::Object) -> bool;

    fn is_callable(&self, object: &Self::Object) -> bool;

    /// A computed attribute with getter/setter semantics.
    fn is_property(&self, object: &Self::Object) -> bool;

    /// Name of the module the object declares as its origin, if it declares
    /// one at all.
    fn defining_module(&self, object: &Self::Object) -> Option<String>;

    fn is_static_method(&self, object: &Self::Object) -> bool;

    /// Bound to the class itself rather than to an instance.
    fn is_class_method(&self, object: &Self::Object) -> bool;

    fn signature(&self, object: &Self::Object) -> Result<Signature, SignatureError>;

    /// Name of the runtime type of a value.
    fn type_name(&self, object: &Self::Object) -> String;
}

/// Module resolution and discovery on top of [`Reflect`].
pub trait ModuleLoader: Reflect {
    /// Resolve a module by its dotted name.
    fn import(&self, name: &str) -> Result<Self::Object, Self::Error>;

    /// The fully qualified dotted name of a resolved module.
    fn module_name(&self, module: &Self::Object) -> String;

    /// Dotted names of every module below `module` in its package tree,
    /// at any depth. Plain (non-package) modules have none.
    fn submodule_names(&self, module: &Self::Object) -> Result<Vec<String>, Self::Error>;

    /// Version recorded in installed package metadata under `name`.
    fn distribution_version(&self, name: &str) -> Option<String>;

    /// Version the module reports about itself.
    fn version_attribute(&self, module: &Self::Object) -> Option<String>;
}
