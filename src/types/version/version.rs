use anyhow::{bail, format_err, Result};
use nom::{
    character::complete::{alpha1, digit1},
    error::{ErrorKind, ParseError},
    IResult, InputTakeAtPosition,
};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Loose package version: a run of numeric and alphabetic segments.
/// Separators are kept so the original string can be reproduced, but they
/// take no part in ordering, equality or hashing: `1.0` and `1_0` are the
/// same version spelled two ways.
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "&str")]
pub struct PkgVersion {
    pub segments: Vec<VersionSegment>,
}

#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum VersionSegment {
    Number(u64),
    Alphabetic(String),
    Separator(String),
}

fn is_separator_char(c: char) -> bool {
    c == '.' || c == '_' || c == '+' || c == '~'
}

fn separator(i: &str) -> IResult<&str, &str> {
    i.split_at_position1_complete(|c| !is_separator_char(c), ErrorKind::Char)
}

pub fn parse_version(i: &str) -> IResult<&str, PkgVersion> {
    // A version always opens with a digit; anything else is a name or garbage
    if !i.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(nom::Err::Error(nom::error::Error::from_error_kind(
            i,
            ErrorKind::Digit,
        )));
    }

    let mut segments = Vec::new();
    let mut ti = i;
    loop {
        if let Ok((rest, digits)) = digit1::<_, ()>(ti) {
            let num = match digits.parse() {
                Ok(num) => num,
                Err(_) => {
                    return Err(nom::Err::Error(nom::error::Error::from_error_kind(
                        ti,
                        ErrorKind::TooLarge,
                    )));
                }
            };
            segments.push(VersionSegment::Number(num));
            ti = rest;
        } else if let Ok((rest, chars)) = alpha1::<_, ()>(ti) {
            segments.push(VersionSegment::Alphabetic(chars.to_owned()));
            ti = rest;
        } else if let Ok((rest, chars)) = separator(ti) {
            segments.push(VersionSegment::Separator(chars.to_owned()));
            ti = rest;
        } else {
            // Something we don't know about, stop and let the caller decide
            break;
        }
    }

    Ok((ti, PkgVersion { segments }))
}

impl TryFrom<&str> for PkgVersion {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self> {
        let (rest, ver) =
            parse_version(s).map_err(|e| format_err!("Malformed version {}: {}", s, e))?;
        if !rest.is_empty() {
            bail!("Malformed version {}: trailing characters {}", s, rest);
        }
        Ok(ver)
    }
}

impl fmt::Display for PkgVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                VersionSegment::Number(num) => write!(f, "{}", num)?,
                VersionSegment::Alphabetic(s) => write!(f, "{}", s)?,
                VersionSegment::Separator(s) => write!(f, "{}", s)?,
            }
        }
        Ok(())
    }
}

impl Serialize for PkgVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let res = self.to_string();
        serializer.serialize_str(&res)
    }
}

// Equality and hashing must agree with Ord, which skips separators; derived
// impls would see the separator spelling and disagree.
impl PartialEq for PkgVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PkgVersion {}

impl Hash for PkgVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for segment in self
            .segments
            .iter()
            .filter(|s| !matches!(s, VersionSegment::Separator(_)))
        {
            segment.hash(state);
        }
    }
}

impl Ord for PkgVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let this: Vec<&VersionSegment> = self
            .segments
            .iter()
            .filter(|s| !matches!(s, VersionSegment::Separator(_)))
            .collect();
        let that: Vec<&VersionSegment> = other
            .segments
            .iter()
            .filter(|s| !matches!(s, VersionSegment::Separator(_)))
            .collect();

        let max_len = std::cmp::max(this.len(), that.len());
        for i in 0..max_len {
            use VersionSegment::*;
            match (this.get(i), that.get(i)) {
                (Some(Number(x)), Some(Number(y))) => match x.cmp(y) {
                    Ordering::Equal => (),
                    ord => return ord,
                },
                (Some(Alphabetic(x)), Some(Alphabetic(y))) => match x.cmp(y) {
                    Ordering::Equal => (),
                    ord => return ord,
                },
                // A numeric segment sorts before an alphabetic one
                (Some(Number(_)), Some(Alphabetic(_))) => return Ordering::Less,
                (Some(Alphabetic(_)), Some(Number(_))) => return Ordering::Greater,
                // The shorter version sorts first
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (None, None) => (),
                (Some(Separator(_)), _) | (_, Some(Separator(_))) => unreachable!(),
            }
        }

        Ordering::Equal
    }
}

impl PartialOrd for PkgVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pkg_ver_from_str() {
        let source = vec!["1.7.1", "2012.2+git20210608"];
        let result = vec![
            PkgVersion {
                segments: vec![
                    VersionSegment::Number(1),
                    VersionSegment::Separator(".".to_string()),
                    VersionSegment::Number(7),
                    VersionSegment::Separator(".".to_string()),
                    VersionSegment::Number(1),
                ],
            },
            PkgVersion {
                segments: vec![
                    VersionSegment::Number(2012),
                    VersionSegment::Separator(".".to_string()),
                    VersionSegment::Number(2),
                    VersionSegment::Separator("+".to_string()),
                    VersionSegment::Alphabetic("git".to_string()),
                    VersionSegment::Number(20210608),
                ],
            },
        ];

        for (pos, e) in source.iter().enumerate() {
            assert_eq!(PkgVersion::try_from(*e).unwrap(), result[pos]);
        }
    }

    #[test]
    fn pkg_ver_from_str_err() {
        let source = vec!["", "final", "1.0-1", "1.0 beta"];
        for e in source {
            assert!(PkgVersion::try_from(e).is_err(), "{} should not parse", e);
        }
    }

    #[test]
    fn pkg_ver_display() {
        let source = vec!["1.7.1", "0.9.2+cvs.1.0", "1.5rc1", "2_0~pre3"];
        for e in source {
            assert_eq!(PkgVersion::try_from(e).unwrap().to_string(), e);
        }
    }

    #[test]
    fn pkg_ver_eq_agrees_with_ord() {
        use std::collections::hash_map::DefaultHasher;
        use std::collections::HashSet;

        let spellings = vec![("1.0", "1_0"), ("1.5~rc1", "1.5+rc1"), ("2+0", "2.0")];
        for (a, b) in spellings {
            let a = PkgVersion::try_from(a).unwrap();
            let b = PkgVersion::try_from(b).unwrap();
            assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
            assert_eq!(a, b);

            let hash = |v: &PkgVersion| {
                let mut hasher = DefaultHasher::new();
                v.hash(&mut hasher);
                hasher.finish()
            };
            assert_eq!(hash(&a), hash(&b));

            let mut set = HashSet::new();
            set.insert(a);
            assert!(set.contains(&b));
        }

        assert_ne!(
            PkgVersion::try_from("1.0").unwrap(),
            PkgVersion::try_from("1.1").unwrap()
        );
    }

    #[test]
    fn pkg_ver_serde() {
        let ver = PkgVersion::try_from("1.7.1").unwrap();
        let json = serde_json::to_string(&ver).unwrap();
        assert_eq!(json, "\"1.7.1\"");
        let back: PkgVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ver);
    }

    #[test]
    fn pkg_ver_ord() {
        use std::cmp::Ordering::*;
        let source = vec![
            ("1.1.1", Less, "1.1.2"),
            ("1a", Less, "1b"),
            ("1", Less, "1.1"),
            ("1.0", Less, "1.1"),
            ("1.2", Less, "1.11"),
            ("1.0", Equal, "1.0"),
            ("1.0", Equal, "1_0"),
            ("2.0", Greater, "1.999"),
            ("1.5", Less, "1.5rc1"),
            ("1.5rc1", Less, "1.5rc2"),
            ("1.5dev0", Less, "1.5rc1"),
            ("0.9.2", Less, "0.9.2+cvs.1.0"),
            ("500", Less, "5000"),
        ];

        for e in source {
            assert_eq!(
                PkgVersion::try_from(e.0)
                    .unwrap()
                    .cmp(&PkgVersion::try_from(e.2).unwrap()),
                e.1,
                "comparing {} and {}",
                e.0,
                e.2
            );
        }
    }
}
