use super::{parse_version, PkgVersion};

use anyhow::{bail, format_err, Result};
use nom::{branch::alt, bytes::complete::tag, character::complete::space0, error::context, IResult};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering::*;
use std::convert::TryFrom;
use std::fmt;

/// An acceptable version range, with inclusive/exclusive bounds.
/// The bool on each bound is true when the bound itself is acceptable.
#[derive(PartialEq, Eq, Hash, Clone, Debug, Default, Deserialize)]
#[serde(try_from = "&str")]
pub struct VersionRequirement {
    pub lower: Option<(PkgVersion, bool)>,
    pub upper: Option<(PkgVersion, bool)>,
}

impl VersionRequirement {
    /// True when any version at all is acceptable
    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// The single version this requirement pins, if it pins one
    pub fn as_exact(&self) -> Option<&PkgVersion> {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) if lower.0 == upper.0 && lower.1 && upper.1 => {
                Some(&lower.0)
            }
            _ => None,
        }
    }

    /// Whether some PkgVersion can still satisfy this requirement
    pub fn is_valid(&self) -> bool {
        if let (Some(lower), Some(upper)) = (&self.lower, &self.upper) {
            match lower.0.cmp(&upper.0) {
                Greater => false,
                // An empty range unless both bounds are inclusive
                Equal => lower.1 && upper.1,
                Less => true,
            }
        } else {
            true
        }
    }

    /// Intersect with another requirement, keeping the stricter bound on each
    /// side. Fails when the intersection is empty.
    pub fn combine(&self, other: &VersionRequirement) -> Result<VersionRequirement> {
        let mut new = self.clone();
        match (&self.lower, &other.lower) {
            (None, Some(_)) => new.lower = other.lower.clone(),
            (Some(this), Some(that)) => {
                if this.0 < that.0 || (this.0 == that.0 && this.1 && !that.1) {
                    new.lower = other.lower.clone();
                }
            }
            _ => (),
        }

        match (&self.upper, &other.upper) {
            (None, Some(_)) => new.upper = other.upper.clone(),
            (Some(this), Some(that)) => {
                if this.0 > that.0 || (this.0 == that.0 && this.1 && !that.1) {
                    new.upper = other.upper.clone();
                }
            }
            _ => (),
        }

        if !new.is_valid() {
            bail!("Cannot combine version requirements {} and {}", self, other);
        }

        Ok(new)
    }

    /// Check if a PkgVersion lies within this requirement
    pub fn within(&self, ver: &PkgVersion) -> bool {
        if let Some(lower) = &self.lower {
            if lower.1 {
                if ver < &lower.0 {
                    return false;
                }
            } else if ver <= &lower.0 {
                return false;
            }
        }

        if let Some(upper) = &self.upper {
            if upper.1 {
                if ver > &upper.0 {
                    return false;
                }
            } else if ver >= &upper.0 {
                return false;
            }
        }

        true
    }
}

/// Parse a version requirement: a comparison operator followed by a version,
/// or a bare version meaning an exact pin
pub fn parse_version_requirement(i: &str) -> IResult<&str, VersionRequirement> {
    let (i, compare) = match context(
        "parsing compare literal",
        alt((tag(">="), tag("<="), tag("=="), tag("="), tag(">"), tag("<"))),
    )(i)
    {
        Ok((i, compare)) => (i, compare),
        // No operator, treat the bare version as exact
        Err(nom::Err::Error(_)) => (i, "="),
        Err(e) => return Err(e),
    };
    let (i, _) = space0(i)?;
    let (i, ver) = context("parsing version in VersionRequirement", parse_version)(i)?;

    let mut res = VersionRequirement::default();
    match compare {
        ">" => {
            res.lower = Some((ver, false));
        }
        ">=" => {
            res.lower = Some((ver, true));
        }
        "=" | "==" => {
            res.lower = Some((ver.clone(), true));
            res.upper = Some((ver, true));
        }
        "<" => {
            res.upper = Some((ver, false));
        }
        "<=" => {
            res.upper = Some((ver, true));
        }
        _ => unreachable!(),
    }

    Ok((i, res))
}

impl TryFrom<&str> for VersionRequirement {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self> {
        if s.trim() == "any" {
            return Ok(VersionRequirement::default());
        }
        // A range prints as a comma-separated bound list, accept it back
        let mut res = VersionRequirement::default();
        for part in s.split(',') {
            let part = part.trim();
            let (rest, req) = parse_version_requirement(part)
                .map_err(|e| format_err!("Malformed version requirement {}: {}", s, e))?;
            if !rest.is_empty() {
                bail!("Malformed version requirement {}: trailing characters {}", s, rest);
            }
            res = res.combine(&req)?;
        }
        Ok(res)
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_unbounded() {
            return write!(f, "any");
        }
        if let Some(exact) = self.as_exact() {
            return write!(f, "={}", exact);
        }
        let mut written = false;
        if let Some(lower) = &self.lower {
            if lower.1 {
                write!(f, ">={}", lower.0)?;
            } else {
                write!(f, ">{}", lower.0)?;
            }
            written = true;
        }
        if let Some(upper) = &self.upper {
            if written {
                write!(f, ", ")?;
            }
            if upper.1 {
                write!(f, "<={}", upper.0)?;
            } else {
                write!(f, "<{}", upper.0)?;
            }
        }
        Ok(())
    }
}

impl Serialize for VersionRequirement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let res = self.to_string();
        serializer.serialize_str(&res)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ver_req_from_str() {
        let tests = vec![
            (">=1.0", false, None),
            ("<2", false, None),
            ("=1.7.1", true, Some("1.7.1")),
            ("1.7.1", true, Some("1.7.1")),
            ("==3.1", true, Some("3.1")),
        ];

        for t in tests {
            let req = VersionRequirement::try_from(t.0).unwrap();
            assert_eq!(req.as_exact().is_some(), t.1, "{}", t.0);
            if let Some(exact) = t.2 {
                assert_eq!(req.as_exact().unwrap(), &PkgVersion::try_from(exact).unwrap());
            }
        }
    }

    #[test]
    fn ver_req_from_str_err() {
        let tests = vec![">=", "~1.0", ">= 1.0 extra"];
        for t in tests {
            assert!(VersionRequirement::try_from(t).is_err(), "{}", t);
        }
    }

    #[test]
    fn ver_req_within() {
        let tests = vec![
            (">=1.0", "1.0", true),
            (">1.0", "1.0", false),
            (">1.0", "1.0.1", true),
            ("<2.0", "2.0", false),
            ("<=2.0", "2.0", true),
            ("=1.7.1", "1.7.1", true),
            ("=1.7.1", "1.7.2", false),
        ];

        for t in tests {
            let req = VersionRequirement::try_from(t.0).unwrap();
            let ver = PkgVersion::try_from(t.1).unwrap();
            assert_eq!(req.within(&ver), t.2, "{} within {}", t.1, t.0);
        }
    }

    #[test]
    fn ver_req_combine() {
        let tests = vec![
            ("any", ">1", ">1"),
            (">1", ">=1", ">1"),
            (">1", ">2", ">2"),
            (">2", ">1", ">2"),
            ("<3", "<2", "<2"),
        ];

        for t in tests {
            let a = VersionRequirement::try_from(t.0).unwrap();
            let b = VersionRequirement::try_from(t.1).unwrap();
            let expected = VersionRequirement::try_from(t.2).unwrap();
            assert_eq!(a.combine(&b).unwrap(), expected);
        }
    }

    #[test]
    fn ver_req_combine_mixed_spellings() {
        // 1.0 and 1_0 are the same version; the strict bound must win the
        // tie no matter how it is spelled
        let inclusive = VersionRequirement::try_from(">=1.0").unwrap();
        let strict = VersionRequirement::try_from(">1_0").unwrap();
        let combined = inclusive.combine(&strict).unwrap();
        assert!(!combined.within(&PkgVersion::try_from("1.0").unwrap()));
        assert!(!combined.within(&PkgVersion::try_from("1_0").unwrap()));

        // ...and the intersection with <=1.0 is therefore empty
        let upper = VersionRequirement::try_from("<=1.0").unwrap();
        assert!(combined.combine(&upper).is_err());
    }

    #[test]
    fn ver_req_serde() {
        let source = vec![(">=1.0", ">=1.0"), ("1.7.1", "=1.7.1"), ("any", "any")];
        for (input, expected) in source {
            let req = VersionRequirement::try_from(input).unwrap();
            let json = serde_json::to_string(&req).unwrap();
            assert_eq!(json, format!("\"{}\"", expected));
            let back: VersionRequirement = serde_json::from_str(&json).unwrap();
            assert_eq!(back, req);
        }

        // A printed range parses back to the same range
        let range = VersionRequirement::try_from(">=1.0").unwrap()
            .combine(&VersionRequirement::try_from("<2.0").unwrap())
            .unwrap();
        let back = VersionRequirement::try_from(range.to_string().as_str()).unwrap();
        assert_eq!(back, range);
    }

    #[test]
    fn ver_req_combine_fail() {
        let tests = vec![(">1", "<1"), (">=2", "<2"), ("=1.0", "=2.0")];
        for t in tests {
            let a = VersionRequirement::try_from(t.0).unwrap();
            let b = VersionRequirement::try_from(t.1).unwrap();
            assert!(a.combine(&b).is_err(), "{} & {}", t.0, t.1);
        }
    }
}
