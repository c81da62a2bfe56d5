pub mod cache;
pub mod common;
pub mod go;

use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use self::common::read_source;
use self::go::{is_candidate_file, is_test_file, BuildTarget, FileImports, GoParser};
use crate::core::LocateError;

/// Import header of a whole package directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryImports {
    pub package_name: String,
    /// Sorted and unique.
    pub imports: Vec<String>,
    /// Imports of `_test.go` files, sorted and unique.
    pub test_imports: Vec<String>,
}

/// Parses every buildable file of `dir` in parallel and merges their imports.
pub fn read_directory(
    dir: &Path,
    parser: &GoParser,
    target: &BuildTarget,
) -> Result<DirectoryImports, LocateError> {
    let entries = fs::read_dir(dir).map_err(|err| LocateError::io(dir, &err))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_candidate_file(path, target))
        .collect();
    files.sort();

    let parsed: Vec<(PathBuf, FileImports)> = files
        .par_iter()
        .map(|path| -> Result<(PathBuf, FileImports), LocateError> {
            let source = read_source(path).map_err(|err| LocateError::io(path, &err))?;
            let header = parser
                .parse_source(&source)
                .map_err(|err| LocateError::Parse {
                    file: path.clone(),
                    message: format!("{err:#}"),
                })?;
            Ok((path.clone(), header))
        })
        .collect::<Result<_, LocateError>>()?;

    let mut package_name: Option<String> = None;
    let mut imports = BTreeSet::new();
    let mut test_imports = BTreeSet::new();

    for (path, header) in parsed {
        if header.ignored {
            continue;
        }
        if is_test_file(&path) {
            test_imports.extend(header.imports);
            continue;
        }
        match &package_name {
            Some(existing) if *existing != header.package_name => {
                return Err(LocateError::MultiplePackages {
                    dir: dir.to_path_buf(),
                    first: existing.clone(),
                    second: header.package_name,
                });
            }
            Some(_) => {}
            None => package_name = Some(header.package_name),
        }
        imports.extend(header.imports);
    }

    let package_name = package_name.ok_or_else(|| LocateError::NoGoFiles(dir.to_path_buf()))?;

    Ok(DirectoryImports {
        package_name,
        imports: imports.into_iter().collect(),
        test_imports: test_imports.into_iter().collect(),
    })
}
