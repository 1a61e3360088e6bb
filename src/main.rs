use mokuroku::constraints::satisfies;
use mokuroku::types::PkgSpec;
use mokuroku::{println_error, println_info, println_warn, Index, Package, PkgRecord};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(name = "moku", about = "Query a package index", version)]
struct Opts {
    /// Index file: a JSON mapping of archive filename to metadata record
    #[clap(short, long)]
    index: PathBuf,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every package name in the index
    Names,
    /// List packages matching a spec, e.g. "numpy >=1.7"
    Search { spec: String },
    /// Show transitive dependencies of the named packages
    Deps {
        /// How many levels to expand, 0 for all
        #[clap(long, default_value_t = 0)]
        max_depth: usize,
        #[clap(required = true)]
        names: Vec<String>,
    },
    /// Show transitive reverse dependencies of the named packages
    Rdeps {
        /// How many levels to expand, 0 for all
        #[clap(long, default_value_t = 0)]
        max_depth: usize,
        #[clap(required = true)]
        names: Vec<String>,
    },
    /// Find packages jointly compatible with a set of specs
    Compat {
        #[clap(required = true)]
        specs: Vec<String>,
    },
}

/// Exit codes:
/// 1 => program screwed up
fn main() {
    if let Err(err) = try_main() {
        println_error!("{}", err);
        err.chain().skip(1).for_each(|cause| {
            println_error!("Caused by: {}", cause);
        });
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let opts = Opts::parse();

    let data = fs::read_to_string(&opts.index)
        .with_context(|| format!("Failed to read index file {}", opts.index.display()))?;
    let records: HashMap<String, PkgRecord> =
        serde_json::from_str(&data).context("Failed to parse index file")?;
    let index = Index::build(&records).context("Failed to build package index")?;

    match opts.command {
        Command::Names => {
            let mut names: Vec<&str> = index.package_names().into_iter().collect();
            names.sort_unstable();
            for name in names {
                println!("{}", name);
            }
        }
        Command::Search { spec } => {
            let spec = PkgSpec::try_from(spec.as_str())?;
            let matches = index.find_matches(&satisfies(&spec), None);
            if matches.is_empty() {
                println_warn!("Nothing in the index matches {}", spec);
            }
            print_pkgs(&matches);
        }
        Command::Deps { names, max_depth } => {
            let pkgs = gather(&index, &names)?;
            print_pkgs(&index.get_deps(&pkgs, max_depth));
        }
        Command::Rdeps { names, max_depth } => {
            let pkgs = gather(&index, &names)?;
            print_pkgs(&index.get_reverse_deps(&pkgs, max_depth));
        }
        Command::Compat { specs } => {
            let mut wanted = HashSet::new();
            for spec in &specs {
                wanted.insert(PkgSpec::try_from(spec.as_str())?);
            }
            let compatible = index.find_compatible_packages(&wanted)?;
            if compatible.is_empty() {
                println_warn!("No package satisfies all the given specs");
            } else {
                println_info!("{} package(s) stay consistent with the given specs:", compatible.len());
            }
            print_pkgs(&compatible);
        }
    }

    Ok(())
}

/// Resolve short names to every build carrying that name
fn gather(index: &Index, names: &[String]) -> Result<HashSet<Package>> {
    let mut pkgs = HashSet::new();
    for name in names {
        let found = index.lookup_from_name(name);
        if found.is_empty() {
            bail!("Package {} not found in index", name);
        }
        pkgs.extend(found.into_iter().cloned());
    }
    Ok(pkgs)
}

fn print_pkgs(pkgs: &HashSet<Package>) {
    let mut names: Vec<&str> = pkgs.iter().map(|pkg| pkg.canonical_name()).collect();
    names.sort_unstable();
    for name in names {
        println!("{}", name);
    }
}
