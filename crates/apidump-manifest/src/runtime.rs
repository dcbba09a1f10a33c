use crate::error::{ManifestError, Result};
use crate::model::{Binding, ClassObject, ModuleManifest, ModuleObject, Object};
use crate::resolver::ManifestResolver;
use apidump::v1::{ModuleLoader, Reflect, Signature, SignatureError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A runtime whose modules are JSON manifests laid out like a package tree.
///
/// Class members include everything inherited from `bases`: bases are
/// searched depth-first in the order listed, and the first definition of a
/// name wins. A member keeps the `module` it was declared with, so inherited
/// members from another module are attributed there.
///
/// # Example
///
/// ```rust,no_run
/// use apidump::v1::Snapshot;
/// use apidump_manifest::ManifestRuntime;
///
/// let runtime = ManifestRuntime::with_roots(["site-manifests"]);
/// let snapshot = Snapshot::from_modules(&runtime, ["mypkg"])?;
/// print!("{}", snapshot.to_text());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManifestRuntime {
    resolver: ManifestResolver,
}

impl ManifestRuntime {
    pub fn new(resolver: ManifestResolver) -> Self {
        Self { resolver }
    }

    pub fn with_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new(ManifestResolver::new().with_roots(roots))
    }

    pub fn resolver(&self) -> &ManifestResolver {
        &self.resolver
    }

    fn load_module(&self, name: &str) -> Result<ModuleObject> {
        let location = self.resolver.locate(name)?;
        debug!(module = %name, manifest = %location.manifest.display(), "loading manifest");
        let manifest = read_manifest(&location.manifest)?;
        Ok(ModuleObject::from_manifest(name, manifest))
    }

    /// Find the class named by `base`, written as `module:Qualified.Name`.
    fn resolve_class(&self, base: &str) -> Result<ClassObject> {
        let unresolved = |reason: &str| ManifestError::UnresolvedBase {
            base: base.to_string(),
            reason: reason.to_string(),
        };

        let (module, qualname) = base
            .split_once(':')
            .ok_or_else(|| unresolved("expected `module:Qualified.Name`"))?;
        let module = self.load_module(module).map_err(|e| unresolved(&e.to_string()))?;

        let mut members = &module.members;
        let mut found = None;
        for part in qualname.split('.') {
            match members.get(part) {
                Some(Object::Class(class)) => {
                    members = &class.members;
                    found = Some(class);
                }
                Some(_) => return Err(unresolved(&format!("`{}` is not a class", part))),
                None => return Err(unresolved(&format!("no member named `{}`", part))),
            }
        }
        found
            .cloned()
            .ok_or_else(|| unresolved("empty class name"))
    }

    fn collect_class_members(
        &self,
        class: &ClassObject,
        stack: &mut Vec<String>,
        members: &mut BTreeMap<String, Object>,
    ) -> Result<()> {
        for (name, member) in &class.members {
            members.entry(name.clone()).or_insert_with(|| member.clone());
        }

        for base in &class.bases {
            if stack.contains(base) {
                return Err(ManifestError::BaseCycle(base.clone()));
            }
            trace!(base = %base, "merging inherited members");
            let resolved = self.resolve_class(base)?;
            stack.push(base.clone());
            self.collect_class_members(&resolved, stack, members)?;
            stack.pop();
        }
        Ok(())
    }
}

fn read_manifest(path: &Path) -> Result<ModuleManifest> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| ManifestError::InvalidManifest {
        path: path.to_path_buf(),
        source,
    })
}

impl Reflect for ManifestRuntime {
    type Object = Object;
    type Error = ManifestError;

    fn list_members(&self, object: &Object) -> Result<Vec<(String, Object)>> {
        match object {
            Object::Module(module) => Ok(module
                .members
                .iter()
                .map(|(name, member)| (name.clone(), member.clone()))
                .collect()),
            Object::Class(class) => {
                let mut members = BTreeMap::new();
                self.collect_class_members(class, &mut Vec::new(), &mut members)?;
                Ok(members.into_iter().collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    fn is_module(&self, object: &Object) -> bool {
        matches!(object, Object::Module(_))
    }

    fn is_class(&self, object: &Object) -> bool {
        matches!(object, Object::Class(_))
    }

    fn is_callable(&self, object: &Object) -> bool {
        matches!(object, Object::Function(_) | Object::Class(_))
    }

    fn is_property(&self, object: &Object) -> bool {
        matches!(object, Object::Property(_))
    }

    fn defining_module(&self, object: &Object) -> Option<String> {
        object.defining_module().map(str::to_string)
    }

    fn is_static_method(&self, object: &Object) -> bool {
        matches!(object, Object::Function(f) if f.binding == Binding::StaticMethod)
    }

    fn is_class_method(&self, object: &Object) -> bool {
        matches!(object, Object::Function(f) if f.binding == Binding::ClassMethod)
    }

    fn signature(&self, object: &Object) -> std::result::Result<Signature, SignatureError> {
        match object {
            Object::Function(f) => f
                .signature
                .clone()
                .ok_or_else(|| SignatureError("no signature recorded in manifest".into())),
            other => Err(SignatureError(format!(
                "`{}` objects are not callable",
                other.type_name()
            ))),
        }
    }

    fn type_name(&self, object: &Object) -> String {
        object.type_name().to_string()
    }
}

impl ModuleLoader for ManifestRuntime {
    fn import(&self, name: &str) -> Result<Object> {
        self.load_module(name).map(Object::Module)
    }

    fn module_name(&self, module: &Object) -> String {
        match module {
            Object::Module(m) => m.name.clone(),
            other => other.type_name().to_string(),
        }
    }

    fn submodule_names(&self, module: &Object) -> Result<Vec<String>> {
        match module {
            Object::Module(m) => self.resolver.submodules(&m.name),
            _ => Ok(Vec::new()),
        }
    }

    fn distribution_version(&self, name: &str) -> Option<String> {
        self.resolver.distribution_version(name)
    }

    fn version_attribute(&self, module: &Object) -> Option<String> {
        match module {
            Object::Module(m) => m.version.clone(),
            _ => None,
        }
    }
}
