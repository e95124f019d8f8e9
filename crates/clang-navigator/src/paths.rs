use std::path::Path;

/// Compare two file paths for equality, tolerating symlinks and `..` segments.
pub fn paths_match(
    a: &Path,
    b: &Path,
) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

/// Last path component, used to keep log lines short.
pub fn short_name(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}
