/// Fallback returned when nothing usable is left of a filename.
pub const UNNAMED: &str = "unnamed";

/// Reduces a user-supplied filename to a safe leaf name.
///
/// - Keeps only the last `/`- or `\`-separated segment.
/// - Deletes control characters (NUL included).
/// - Collapses every run of dots to a single dot, so the result never
///   contains `..`.
/// - Returns [`UNNAMED`] for an empty, whitespace-only or `.` result.
///
/// Anything else, spaces and parentheses included, passes through as is.
pub fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();

    let leaf = cleaned.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut out = String::with_capacity(leaf.len());
    for ch in leaf.chars() {
        if ch == '.' && out.ends_with('.') {
            continue;
        }
        out.push(ch);
    }

    if out.trim().is_empty() || out == "." {
        return UNNAMED.to_string();
    }
    out
}
