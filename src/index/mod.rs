mod graph;

pub use graph::DepGraph;

use crate::constraints::{satisfies, Constraint};
use crate::error::IndexError;
use crate::package::{Package, PkgRecord, PKG_EXTENSION};
use crate::types::{find_inconsistent_specs, PkgSpec};

use anyhow::Result;
use once_cell::sync::OnceCell;
use std::collections::{HashMap, HashSet};

/// An in-memory package index. The package collection is built once from a
/// `filename -> record` mapping and never changes afterwards; the two
/// dependency graphs are derived from it on first use.
pub struct Index {
    filenames: HashMap<String, Package>,
    pkgs: HashSet<Package>,
    // Both graphs are pure functions of the immutable package set, so a
    // racing first access could at worst duplicate the computation, never
    // disagree on the result. The cells guarantee a fully built graph is the
    // only thing anyone observes.
    deps: OnceCell<DepGraph>,
    rdeps: OnceCell<DepGraph>,
}

impl Index {
    pub fn build(records: &HashMap<String, PkgRecord>) -> Result<Self> {
        let mut filenames = HashMap::new();
        let mut pkgs = HashSet::new();
        for (filename, record) in records {
            let pkg = Package::from_record(filename, record)?;
            pkgs.insert(pkg.clone());
            filenames.insert(filename.clone(), pkg);
        }

        Ok(Index {
            filenames,
            pkgs,
            deps: OnceCell::new(),
            rdeps: OnceCell::new(),
        })
    }

    /// The forward dependency graph: each non-meta package mapped to the set
    /// of packages satisfying its requirements
    pub fn deps(&self) -> &DepGraph {
        self.deps.get_or_init(|| self.compute_deps())
    }

    /// The reverse dependency graph, the exact inverse of `deps`
    pub fn rdeps(&self) -> &DepGraph {
        self.rdeps.get_or_init(|| graph::invert(self.deps()))
    }

    /// Short names of every package in the index
    pub fn package_names(&self) -> HashSet<&str> {
        self.pkgs.iter().map(|pkg| pkg.name.as_str()).collect()
    }

    pub fn lookup_from_filename(&self, filename: &str) -> Result<&Package, IndexError> {
        self.filenames
            .get(filename)
            .ok_or_else(|| IndexError::PkgNotFound(filename.to_owned()))
    }

    pub fn lookup_from_canonical_name(&self, name: &str) -> Result<&Package, IndexError> {
        self.lookup_from_filename(&format!("{}{}", name, PKG_EXTENSION))
    }

    /// All builds sharing a short name; an empty set is a normal outcome
    pub fn lookup_from_name(&self, name: &str) -> HashSet<&Package> {
        self.pkgs.iter().filter(|pkg| pkg.name == name).collect()
    }

    /// Packages matching a constraint, drawn from `pkgs` when given and from
    /// the whole collection otherwise
    pub fn find_matches(
        &self,
        constraint: &impl Constraint,
        pkgs: Option<&HashSet<Package>>,
    ) -> HashSet<Package> {
        match pkgs {
            Some(pkgs) => pkgs
                .iter()
                .filter(|pkg| pkg.matches(constraint))
                .cloned()
                .collect(),
            None => self
                .pkgs
                .iter()
                .filter(|pkg| pkg.matches(constraint))
                .cloned()
                .collect(),
        }
    }

    /// Transitive dependencies of `pkgs`, up to `max_depth` hops away.
    /// `max_depth == 0` expands to the fixed point.
    pub fn get_deps(&self, pkgs: &HashSet<Package>, max_depth: usize) -> HashSet<Package> {
        graph::reachable(self.deps(), pkgs, max_depth)
    }

    /// Transitive reverse dependencies of `pkgs`, up to `max_depth` hops away
    pub fn get_reverse_deps(&self, pkgs: &HashSet<Package>, max_depth: usize) -> HashSet<Package> {
        graph::reachable(self.rdeps(), pkgs, max_depth)
    }

    /// Every spec declared anywhere in the index that some package in `pkgs`
    /// satisfies
    pub fn find_compatible_specs(&self, pkgs: &HashSet<Package>) -> HashSet<PkgSpec> {
        let known: HashSet<&PkgSpec> = self
            .pkgs
            .iter()
            .flat_map(|pkg| pkg.requires.iter())
            .collect();

        let mut res = HashSet::new();
        for pkg in pkgs {
            for spec in &known {
                if pkg.matches(&satisfies(spec)) {
                    res.insert((*spec).clone());
                }
            }
        }
        res
    }

    /// All packages that jointly satisfy `specs`. Gathers every package
    /// matching any one spec, then drops the candidates whose own
    /// requirements conflict with the requested set: matching a spec in
    /// isolation says nothing about whether the candidate's requirements
    /// stay satisfiable alongside the rest.
    pub fn find_compatible_packages(
        &self,
        specs: &HashSet<PkgSpec>,
    ) -> Result<HashSet<Package>, IndexError> {
        let mut candidates: HashSet<Package> = HashSet::new();
        for spec in specs {
            match spec.exact_filename() {
                // A build pin addresses exactly one archive
                Some(filename) => {
                    candidates.insert(self.lookup_from_filename(&filename)?.clone());
                }
                None => candidates.extend(self.find_matches(&satisfies(spec), None)),
            }
        }

        let mut res = HashSet::new();
        for pkg in candidates {
            let combined: HashSet<PkgSpec> =
                specs.iter().chain(pkg.requires.iter()).cloned().collect();
            if find_inconsistent_specs(&combined).is_empty() {
                res.insert(pkg);
            }
        }

        Ok(res)
    }

    fn compute_deps(&self) -> DepGraph {
        let mut deps = DepGraph::new();
        for pkg in &self.pkgs {
            if pkg.is_meta {
                continue;
            }
            let mut pkg_deps = HashSet::new();
            for spec in &pkg.requires {
                pkg_deps.extend(self.find_matches(&satisfies(spec), None));
            }
            deps.insert(pkg.clone(), pkg_deps);
        }
        deps
    }
}
