// Path Utilities
//
// Forward-slash path manipulation shared by hosts, module resolution and the
// pipeline. Paths are plain strings so that in-memory hosts behave exactly like
// the file system host.

/// Convert backslashes to forward slashes and collapse `.` / `..` segments.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\') || path.get(1..3) == Some(":/")
}

/// Directory part of `path`. Returns an empty string for bare file names.
pub fn dirname(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => String::new(),
    }
}

pub fn basename(path: &str) -> &str {
    match path.rfind(|c| c == '/' || c == '\\') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

pub fn join(base: &str, path: &str) -> String {
    if is_absolute(path) || base.is_empty() {
        normalize_path(path)
    } else {
        normalize_path(&format!("{}/{}", base, path))
    }
}

/// Relative path from directory `from` to `to`, always with forward slashes.
pub fn relative(from: &str, to: &str) -> String {
    let from = normalize_path(from);
    let to = normalize_path(to);
    let from_segments: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segments: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let common = from_segments
        .iter()
        .zip(to_segments.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::new();
    for _ in common..from_segments.len() {
        parts.push("..");
    }
    parts.extend(&to_segments[common..]);
    parts.join("/")
}

/// Remove the TypeScript or JavaScript extension, treating `.d.ts` as one unit.
pub fn strip_extension(path: &str) -> &str {
    for ext in [".d.ts", ".ts", ".tsx", ".js", ".jsx"] {
        if let Some(stripped) = path.strip_suffix(ext) {
            return stripped;
        }
    }
    path
}

pub fn is_dts_file(path: &str) -> bool {
    path.ends_with(".d.ts")
}

pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "." || specifier == ".." || specifier.starts_with("./") || specifier.starts_with("../")
}
