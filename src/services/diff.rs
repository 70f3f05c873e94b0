use camino::Utf8Path;
use similar::TextDiff;

/// Unified diff of a file's current and formatted content, labelled with its path.
pub fn render_unified_diff(path: &Utf8Path, old: &str, new: &str) -> String {
    let old_label = format!("a/{path}");
    let new_label = format!("b/{path}");
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&old_label, &new_label)
        .to_string()
}
