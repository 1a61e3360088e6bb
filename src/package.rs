use crate::constraints::Constraint;
use crate::types::{PkgSpec, PkgVersion};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::convert::TryFrom;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Archive suffix shared by every package in an index
pub const PKG_EXTENSION: &str = ".tar.bz2";

/// Raw metadata record for one package build, as stored in an index file
#[derive(Deserialize, Clone, Debug)]
pub struct PkgRecord {
    pub name: String,
    pub version: String,
    pub build: String,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub is_meta: bool,
}

/// One package build. Identity is the archive filename: two Package values
/// with the same filename are the same package no matter what the other
/// fields say. Graphs and result sets rely on this.
#[derive(Clone, Debug)]
pub struct Package {
    pub filename: String,
    pub name: String,
    pub version: PkgVersion,
    pub build: String,
    pub requires: HashSet<PkgSpec>,
    pub is_meta: bool,
}

impl Package {
    pub fn from_record(filename: &str, record: &PkgRecord) -> Result<Self> {
        let version = PkgVersion::try_from(record.version.as_str())
            .with_context(|| format!("Failed to load package {}", filename))?;
        let mut requires = HashSet::new();
        for spec in &record.requires {
            let spec = PkgSpec::try_from(spec.as_str())
                .with_context(|| format!("Failed to load package {}", filename))?;
            requires.insert(spec);
        }

        Ok(Package {
            filename: filename.to_owned(),
            name: record.name.clone(),
            version,
            build: record.build.clone(),
            requires,
            is_meta: record.is_meta,
        })
    }

    /// The filename with the archive suffix removed
    pub fn canonical_name(&self) -> &str {
        self.filename
            .strip_suffix(PKG_EXTENSION)
            .unwrap_or(&self.filename)
    }

    pub fn matches(&self, constraint: &impl Constraint) -> bool {
        constraint.matches(self)
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.filename == other.filename
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.filename.hash(state);
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}
