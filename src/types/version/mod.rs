mod requirement;
mod version;

pub use requirement::{parse_version_requirement, VersionRequirement};
pub use version::{parse_version, PkgVersion, VersionSegment};
