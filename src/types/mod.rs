mod spec;
pub mod version;

pub use spec::{find_inconsistent_specs, parse_spec, PkgSpec};
pub use version::{PkgVersion, VersionRequirement};
