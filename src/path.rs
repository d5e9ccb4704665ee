//! Remote path primitives. Remote paths are always POSIX-style, independent of
//! the local platform, so `std::path` is not used here.

pub const SEPARATOR: char = '/';
pub const ROOT: &str = "/";

/// Appends `name` to `base` with exactly one separator between them.
pub fn join(base: &str, name: &str) -> String {
    let name = name.trim_matches(SEPARATOR);
    let base = base.trim_end_matches(SEPARATOR);
    if name.is_empty() {
        return if base.is_empty() {
            ROOT.to_string()
        } else {
            base.to_string()
        };
    }

    let mut joined = String::with_capacity(base.len() + name.len() + 1);
    joined.push_str(base);
    joined.push(SEPARATOR);
    joined.push_str(name);
    joined
}

/// Drops the final segment; `/` when nothing remains.
pub fn parent(path: &str) -> String {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(0) | None => ROOT.to_string(),
        Some(index) => trimmed[..index].to_string(),
    }
}

/// Final segment of a remote path, empty for the root.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    }
}
