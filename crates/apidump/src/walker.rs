//! The recursive walk that turns a module tree into API entries.

use crate::reflect::{ModuleLoader, Reflect};
use crate::types::{
    ApiEntry, FunctionKind, NO_RETURN_TYPE, NO_SIGNATURE, NO_TYPE, Segment, Snapshot,
};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, trace};

/// Constructors are public API whatever their name looks like.
const CONSTRUCTOR: &str = "__init__";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("failed to import module `{name}`: {source}")]
    Import {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to discover submodules of `{name}`: {source}")]
    Discover {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to list members of `{path}`: {source}")]
    Reflect {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("classes nested under `{path}` exceed the maximum depth of {max_depth}")]
    DepthExceeded { path: String, max_depth: usize },
}

/// Configuration for a walk.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// How many levels of classes may nest inside a module. Guards against
    /// object graphs where a class is reachable from itself.
    pub max_depth: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// A module given to the walker, either already resolved or by name.
#[derive(Debug, Clone)]
pub enum ModuleRef<O> {
    Loaded(O),
    Named(String),
}

impl<O> From<&str> for ModuleRef<O> {
    fn from(name: &str) -> Self {
        ModuleRef::Named(name.to_string())
    }
}

impl<O> From<String> for ModuleRef<O> {
    fn from(name: String) -> Self {
        ModuleRef::Named(name)
    }
}

/// Walks modules through a [`ModuleLoader`] and collects their public API.
///
/// The walker owns the map of modules it has resolved, so each module is
/// visited once per walk no matter how many ways it can be reached.
pub struct Walker<'r, R: ModuleLoader> {
    runtime: &'r R,
    config: WalkConfig,
    modules: BTreeMap<String, R::Object>,
    snapshot: Snapshot,
}

impl<'r, R: ModuleLoader> Walker<'r, R> {
    pub fn new(runtime: &'r R) -> Self {
        Self {
            runtime,
            config: WalkConfig::default(),
            modules: BTreeMap::new(),
            snapshot: Snapshot::new(),
        }
    }

    pub fn with_config(mut self, config: WalkConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve `modules` and their public submodules, then dump the API of
    /// every one of them.
    pub fn walk<I, M>(mut self, modules: I) -> Result<Snapshot, WalkError>
    where
        I: IntoIterator<Item = M>,
        M: Into<ModuleRef<R::Object>>,
    {
        self.load_all_modules(modules)?;

        let modules = std::mem::take(&mut self.modules);
        for (name, module) in &modules {
            info!(module = %name, "dumping module API");
            self.dump_struct(ApiEntry::module(name), module, name, 0)?;
        }

        Ok(self.snapshot)
    }

    fn load_all_modules<I, M>(&mut self, modules: I) -> Result<(), WalkError>
    where
        I: IntoIterator<Item = M>,
        M: Into<ModuleRef<R::Object>>,
    {
        let runtime = self.runtime;

        for module in modules {
            let module = match module.into() {
                ModuleRef::Loaded(module) => module,
                ModuleRef::Named(name) => self.import(&name)?,
            };
            let name = runtime.module_name(&module);

            let version = runtime
                .distribution_version(&name)
                .or_else(|| runtime.version_attribute(&module));
            debug!(module = %name, version = ?version, "resolved module");
            self.snapshot.set_version(name.clone(), version);

            let submodules =
                runtime
                    .submodule_names(&module)
                    .map_err(|e| WalkError::Discover {
                        name: name.clone(),
                        source: Box::new(e),
                    })?;
            self.modules.entry(name).or_insert(module);

            for submodule in submodules {
                if is_private_path(&submodule) {
                    debug!(module = %submodule, "skipping private submodule");
                    continue;
                }
                if self.modules.contains_key(&submodule) {
                    continue;
                }
                let object = self.import(&submodule)?;
                let resolved = runtime.module_name(&object);
                self.modules.entry(resolved).or_insert(object);
            }
        }

        Ok(())
    }

    fn import(&self, name: &str) -> Result<R::Object, WalkError> {
        self.runtime.import(name).map_err(|e| WalkError::Import {
            name: name.to_string(),
            source: Box::new(e),
        })
    }

    fn dump_struct(
        &mut self,
        prefix: ApiEntry,
        object: &R::Object,
        owner: &str,
        depth: usize,
    ) -> Result<(), WalkError> {
        let runtime = self.runtime;
        let members = runtime
            .list_members(object)
            .map_err(|e| WalkError::Reflect {
                path: prefix.to_string(),
                source: Box::new(e),
            })?;

        self.snapshot.insert(prefix.clone());

        for (name, member) in members {
            if runtime.is_module(&member) {
                continue;
            }

            if name.starts_with('_') && name != CONSTRUCTOR {
                trace!(member = %name, "skipping private member");
                continue;
            }

            if let Some(origin) = runtime.defining_module(&member)
                && origin != owner
            {
                trace!(member = %name, origin = %origin, "skipping member defined elsewhere");
                continue;
            }

            if runtime.is_class(&member) {
                if depth >= self.config.max_depth {
                    return Err(WalkError::DepthExceeded {
                        path: prefix.to_string(),
                        max_depth: self.config.max_depth,
                    });
                }
                let class_prefix = prefix.child(Segment::class(&name));
                self.dump_struct(class_prefix, &member, owner, depth + 1)?;
            } else if runtime.is_callable(&member) {
                let kind = if runtime.is_static_method(&member) {
                    FunctionKind::StaticMethod
                } else if runtime.is_class_method(&member) {
                    FunctionKind::ClassMethod
                } else {
                    FunctionKind::Function
                };
                self.dump_function(&prefix, kind, &name, &member);
            } else if runtime.is_property(&member) {
                self.snapshot.insert(prefix.child(Segment::property(&name)));
            } else {
                self.dump_member(&prefix, &name, &member);
            }
        }

        Ok(())
    }

    fn dump_function(
        &mut self,
        prefix: &ApiEntry,
        kind: FunctionKind,
        name: &str,
        callable: &R::Object,
    ) {
        let signature = match self.runtime.signature(callable) {
            Ok(signature) => signature,
            Err(e) => {
                debug!(function = %name, error = %e, "recording callable without signature");
                self.snapshot
                    .insert(prefix.child(Segment::function(kind, name, NO_SIGNATURE)));
                return;
            }
        };

        let returns = signature
            .return_annotation
            .as_deref()
            .unwrap_or(NO_RETURN_TYPE);
        let function_entry = prefix.child(Segment::function(kind, name, returns));
        self.snapshot.insert(function_entry.clone());

        let mut required = 0;
        for parameter in &signature.parameters {
            let ty = parameter.annotation.as_deref().unwrap_or(NO_TYPE);
            let segment = if parameter.is_required() {
                required += 1;
                Segment::required(required - 1, &parameter.name, ty)
            } else {
                Segment::optional(&parameter.name, ty)
            };
            self.snapshot.insert(function_entry.child(segment));
        }
    }

    fn dump_member(&mut self, prefix: &ApiEntry, name: &str, value: &R::Object) {
        let ty = self.runtime.type_name(value);
        if ty.starts_with('_') {
            trace!(member = %name, ty = %ty, "skipping member of private type");
            return;
        }
        self.snapshot.insert(prefix.child(Segment::member(name, ty)));
    }
}

/// A dotted module path is private when any of its components is.
fn is_private_path(name: &str) -> bool {
    name.split('.').any(|part| part.starts_with('_'))
}

/// Dump the public API of `modules` with the default configuration.
pub fn from_modules<R, I, M>(runtime: &R, modules: I) -> Result<Snapshot, WalkError>
where
    R: ModuleLoader,
    I: IntoIterator<Item = M>,
    M: Into<ModuleRef<R::Object>>,
{
    Walker::new(runtime).walk(modules)
}

impl Snapshot {
    /// Dump the public API of `modules`; see [`Walker`].
    pub fn from_modules<R, I, M>(runtime: &R, modules: I) -> Result<Self, WalkError>
    where
        R: ModuleLoader,
        I: IntoIterator<Item = M>,
        M: Into<ModuleRef<R::Object>>,
    {
        from_modules(runtime, modules)
    }
}
