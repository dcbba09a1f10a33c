#![doc = include_str!("../README.md")]

pub mod error;
pub mod model;
pub mod resolver;
pub mod runtime;

pub use error::{ManifestError, Result};
pub use model::{
    Binding, ClassObject, DataObject, FunctionObject, ModuleManifest, ModuleObject, Object,
    PropertyObject,
};
pub use resolver::{ManifestResolver, ModuleLocation};
pub use runtime::ManifestRuntime;
