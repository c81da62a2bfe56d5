pub mod analyzer;
pub mod context;
pub mod graph;
pub mod locator;
pub mod package;
pub mod resolver;
pub mod scanner;

pub use analyzer::{DependencyAnalyzer, ResolveError, TreeReport};
pub use context::ResolutionContext;
pub use graph::{DependencyGraph, GraphBuilder, Node};
pub use locator::{GoEnv, GoLocator, ImportMode, LocateError, LocatedPackage, Locator};
pub use package::{IgnorePattern, Package};
pub use resolver::{PackageResolver, ResolveOptions};
pub use scanner::PackageScanner;
