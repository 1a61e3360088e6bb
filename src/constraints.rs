use crate::package::Package;
use crate::types::PkgSpec;

/// A predicate over packages. The index only ever sees this seam, so callers
/// can match on anything a package exposes.
pub trait Constraint {
    fn matches(&self, pkg: &Package) -> bool;
}

/// The constraint derived from a spec: same target name, version within the
/// spec's range (if any), build equal to the spec's pin (if any)
pub struct Satisfies<'a> {
    spec: &'a PkgSpec,
}

pub fn satisfies(spec: &PkgSpec) -> Satisfies {
    Satisfies { spec }
}

impl Constraint for Satisfies<'_> {
    fn matches(&self, pkg: &Package) -> bool {
        if pkg.name != self.spec.name {
            return false;
        }
        if let Some(version) = &self.spec.version {
            if !version.within(&pkg.version) {
                return false;
            }
        }
        if let Some(build) = &self.spec.build {
            if &pkg.build != build {
                return false;
            }
        }
        true
    }
}
