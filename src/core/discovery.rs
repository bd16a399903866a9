//! Source discovery
//!
//! Enumerates the compilable files of a module directory. File contents
//! are never inspected.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Recursively find files under `module_dir` whose extension is listed in
/// `extensions`.
///
/// A missing or unreadable directory yields no files, which the
/// orchestrator treats like an empty module. Those cases are logged at
/// warn level so they are not confused with a genuinely empty directory.
/// The result is sorted so command lines are reproducible.
pub fn discover(module_dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    if !module_dir.is_dir() {
        tracing::warn!(
            "Module directory {} does not exist, treating as empty",
            module_dir.display()
        );
        return Vec::new();
    }

    let mut sources: Vec<PathBuf> = WalkDir::new(module_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {e}", module_dir.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| has_source_extension(entry.path(), extensions))
        .map(walkdir::DirEntry::into_path)
        .collect();

    sources.sort();
    tracing::debug!(
        "Discovered {} source files in {}",
        sources.len(),
        module_dir.display()
    );
    sources
}

fn has_source_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn c_only() -> Vec<String> {
        vec!["c".to_string()]
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn test_discover_finds_nested_sources() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "string/string.c");
        touch(dir.path(), "string/impl/utf8.c");
        touch(dir.path(), "string/string.h");
        touch(dir.path(), "string/README.md");

        let sources = discover(&dir.path().join("string"), &c_only());
        assert_eq!(
            sources,
            vec![
                dir.path().join("string/impl/utf8.c"),
                dir.path().join("string/string.c"),
            ]
        );
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        touch(dir.path(), "empty/notes.txt");
        assert!(discover(&dir.path().join("empty"), &c_only()).is_empty());
    }

    #[test]
    fn test_discover_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(discover(&dir.path().join("nope"), &c_only()).is_empty());
    }

    #[test]
    fn test_discover_honours_extension_list() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "m/a.c");
        touch(dir.path(), "m/b.cpp");
        let exts = vec!["c".to_string(), "cpp".to_string()];
        assert_eq!(discover(&dir.path().join("m"), &exts).len(), 2);
        assert_eq!(discover(&dir.path().join("m"), &c_only()).len(), 1);
    }
}
