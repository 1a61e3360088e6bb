//! An in-memory package index. Feed it a `filename -> metadata record`
//! mapping and query dependency graphs, transitive closures over them, and
//! jointly compatible package/requirement sets.

pub mod cli;
pub mod constraints;
pub mod error;
pub mod index;
pub mod package;
pub mod types;

pub use index::{DepGraph, Index};
pub use package::{Package, PkgRecord, PKG_EXTENSION};
