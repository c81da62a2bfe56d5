//! # DEPTREE
//!
//! Transitive import-dependency graphs for Go source trees.
//!
//! DEPTREE walks a directory, treats every directory holding Go sources as a
//! package root, resolves imports with the toolchain's lookup rules (GOROOT,
//! modules, GOPATH, vendor) and merges everything into one directed graph.
//!
//! ## Resolution rules
//!
//! - Import cycles terminate: a package already on the current import path is
//!   located but not expanded again.
//! - Packages are resolved once per run and shared between importers.
//! - Packages under an `internal` path segment are folded into their importers.
//! - Standard packages are leaves, dropped unless requested.
//! - Unresolvable imports are collected instead of aborting the scan.
//!
//! ## Output Formats
//!
//! - **JSON**: graphlib-style `{nodes, edges, options}` document
//! - **DOT**: GraphViz digraph
//! - **List**: sorted array of package names

pub mod core;
pub mod formatters;
pub mod logging;
pub mod parsers;
