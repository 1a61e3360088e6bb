use crate::package::Package;

use std::collections::{HashMap, HashSet};

/// Package dependency graph, keyed by package identity
pub type DepGraph = HashMap<Package, HashSet<Package>>;

/// Exact set-inverse of a graph: `p` appears under `d` iff `d` appears under
/// `p`. Packages nobody depends on are absent as keys.
pub(crate) fn invert(deps: &DepGraph) -> DepGraph {
    let mut rdeps = DepGraph::new();
    for (pkg, pkg_deps) in deps {
        for dep in pkg_deps {
            rdeps
                .entry(dep.clone())
                .or_insert_with(HashSet::new)
                .insert(pkg.clone());
        }
    }
    rdeps
}

/// Depth-bounded fixed-point expansion over one graph. `max_depth == 0` walks
/// all the way to the fixed point. The accumulated set only ever grows, so
/// over a finite package universe the loop terminates, cycles included.
/// Input packages only show up in the result when they are reachable as
/// someone else's dependency.
pub(crate) fn reachable(
    graph: &DepGraph,
    pkgs: &HashSet<Package>,
    max_depth: usize,
) -> HashSet<Package> {
    let mut acc: HashSet<Package> = HashSet::new();
    let mut frontier = pkgs.clone();
    let mut last: Option<HashSet<Package>> = None;
    let mut iterations = 0;

    loop {
        if max_depth > 0 && iterations >= max_depth {
            break;
        }
        for pkg in &frontier {
            if let Some(deps) = graph.get(pkg) {
                acc.extend(deps.iter().cloned());
            }
        }
        if last.as_ref() == Some(&acc) {
            // Fixed point, nothing new was discovered
            break;
        }
        // Only newly discovered packages drive further expansion
        frontier = acc.difference(&frontier).cloned().collect();
        last = Some(acc.clone());
        iterations += 1;
    }

    acc
}
