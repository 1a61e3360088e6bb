use super::version::{parse_version_requirement, VersionRequirement};
use crate::package::PKG_EXTENSION;

use anyhow::{bail, format_err, Result};
use nom::{
    character::complete::space1,
    error::{ErrorKind, ParseError},
    IResult, InputTakeAtPosition,
};
use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;
use std::fmt;

/// A requirement on one package: a target name, an optional acceptable
/// version range and an optional exact build pin. A build pin implies an
/// exact version, the grammar enforces it.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct PkgSpec {
    pub name: String,
    pub version: Option<VersionRequirement>,
    pub build: Option<String>,
}

fn token(i: &str) -> IResult<&str, &str> {
    i.split_at_position1_complete(|c: char| c.is_whitespace(), ErrorKind::Char)
}

/// Parse a spec string: `name`, `name >=1.0`, `name 1.7.1` or
/// `name 1.7.1 py27_0`
pub fn parse_spec(i: &str) -> IResult<&str, PkgSpec> {
    let (i, name) = token(i)?;

    let mut res = PkgSpec {
        name: name.to_owned(),
        version: None,
        build: None,
    };

    let i = match space1::<_, nom::error::Error<&str>>(i) {
        Ok((i, _)) => i,
        Err(_) => return Ok((i, res)),
    };
    let (i, version) = parse_version_requirement(i)?;
    res.version = Some(version);

    let i = match space1::<_, nom::error::Error<&str>>(i) {
        Ok((i, _)) => i,
        Err(_) => return Ok((i, res)),
    };
    let (i, build) = token(i)?;
    res.build = Some(build.to_owned());

    Ok((i, res))
}

impl PkgSpec {
    /// The exact archive filename this spec pins, when it pins one
    pub fn exact_filename(&self) -> Option<String> {
        let build = self.build.as_deref()?;
        let version = self.version.as_ref()?.as_exact()?;
        Some(format!("{}-{}-{}{}", self.name, version, build, PKG_EXTENSION))
    }
}

impl TryFrom<&str> for PkgSpec {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self> {
        let (rest, spec) =
            parse_spec(s.trim()).map_err(|e| format_err!("Malformed spec {}: {}", s, e))?;
        if !rest.is_empty() {
            bail!("Malformed spec {}: trailing characters {}", s, rest);
        }
        if spec.build.is_some() {
            let exact = spec.version.as_ref().and_then(|v| v.as_exact());
            if exact.is_none() {
                bail!("Malformed spec {}: a build pin requires an exact version", s);
            }
        }
        Ok(spec)
    }
}

impl fmt::Display for PkgSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, " {}", version)?;
        }
        if let Some(build) = &self.build {
            write!(f, " {}", build)?;
        }
        Ok(())
    }
}

/// Split a set of specs into groups that cannot be satisfied together.
/// Specs targeting different names never conflict; within one name, the
/// version ranges must intersect and at most one exact build may be pinned.
pub fn find_inconsistent_specs(specs: &HashSet<PkgSpec>) -> Vec<HashSet<PkgSpec>> {
    let mut by_name: HashMap<&str, Vec<&PkgSpec>> = HashMap::new();
    for spec in specs {
        by_name.entry(&spec.name).or_default().push(spec);
    }

    let mut res = Vec::new();
    for group in by_name.into_values() {
        if group.len() < 2 {
            continue;
        }

        let mut consistent = true;
        let mut combined = VersionRequirement::default();
        for spec in &group {
            if let Some(req) = &spec.version {
                match combined.combine(req) {
                    Ok(new) => combined = new,
                    Err(_) => {
                        consistent = false;
                        break;
                    }
                }
            }
        }

        if consistent {
            let pins: HashSet<&str> = group.iter().filter_map(|s| s.build.as_deref()).collect();
            if pins.len() > 1 {
                consistent = false;
            }
        }

        if !consistent {
            res.push(group.into_iter().cloned().collect());
        }
    }

    res
}
