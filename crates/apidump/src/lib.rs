#![doc = include_str!("../README.md")]

mod diff;
mod reflect;
mod store;
mod types;
mod walker;

pub mod v1 {
    //! Versioned public API for apidump types and operations.
    //!
    //! Everything you need is re-exported from this module. Types are
    //! organized into four groups:
    //!
    //! # Entries
    //!
    //! - [`Scalar`]: a string or integer value
    //! - [`Segment`]: one node of an entry path (`MODULE`, `CLASS`, ...)
    //! - [`ApiEntry`]: the full path from a root module to one API fact
    //! - [`Snapshot`]: the set of entries plus module versions
    //!
    //! # Walking
    //!
    //! - [`Reflect`] and [`ModuleLoader`]: capabilities a runtime provides
    //! - [`Walker`], [`WalkConfig`], [`ModuleRef`]: the walk itself
    //! - [`from_modules`]: walk with the default configuration
    //!
    //! # Signatures
    //!
    //! - [`Signature`], [`Parameter`], [`ParameterKind`], [`SignatureError`]
    //!
    //! # Comparison
    //!
    //! - [`ApiDiff`] and [`VersionChange`]: result of [`Snapshot::diff`]
    //!
    //! # Example: build and render a snapshot by hand
    //!
    //! ```
    //! use apidump::v1::*;
    //!
    //! let root = ApiEntry::module("mypkg");
    //! let func = root.child(Segment::function(FunctionKind::Function, "bar", NO_RETURN_TYPE));
    //!
    //! let mut snap = Snapshot::new();
    //! snap.set_version("mypkg", Some("1.0".into()));
    //! snap.insert(root.clone());
    //! snap.insert(func.clone());
    //! snap.insert(func.child(Segment::required(0, "x", NO_TYPE)));
    //!
    //! assert_eq!(
    //!     snap.to_text(),
    //!     "MODULE : mypkg\n\tFUNCTION : bar : no-return-type\n\t\tREQUIRED : 0 : x : no-type\n"
    //! );
    //!
    //! let json = snap.to_json().unwrap();
    //! assert_eq!(Snapshot::from_json(&json).unwrap(), snap);
    //! ```

    pub use crate::diff::{ApiDiff, VersionChange};
    pub use crate::reflect::{
        ModuleLoader, Parameter, ParameterKind, Reflect, Signature, SignatureError,
    };
    pub use crate::store::StoreError;
    pub use crate::types::{
        ApiEntry, ApiSet, EntryError, FunctionKind, NO_RETURN_TYPE, NO_SIGNATURE, NO_TYPE,
        Scalar, Segment, Snapshot, VersionMap,
    };
    pub use crate::walker::{ModuleRef, WalkConfig, WalkError, Walker, from_modules};
}
