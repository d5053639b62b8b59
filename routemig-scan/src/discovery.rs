//! Route file discovery.

use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

/// Source extensions scanned when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "ts", "mjs", "cjs"];

/// Find every route source file under `root`, sorted by path.
///
/// Hidden files and directories (relative to `root`) are skipped, as are
/// files whose extension is not in `extensions`.
pub fn discover_route_files<S: AsRef<str>>(root: &Path, extensions: &[S]) -> io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("route directory not found: {}", root.display()),
        ));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry.path().strip_prefix(root).unwrap_or(entry.path())))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_route_extension(path, extensions))
        .collect();

    files.sort();
    Ok(files)
}

/// True when any normal component of `path` starts with a dot.
pub fn is_hidden(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

pub fn has_route_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.as_ref() == ext))
}
