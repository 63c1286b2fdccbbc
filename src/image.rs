//! Image reference resolution shared by every component.

/// Resolves a base image reference against an optional registry mirror.
///
/// With a mirror `M` the result is `M/<reference>`, keeping the full
/// original path (including vendor prefixes such as `tsuru/`). An absent or
/// empty mirror leaves the reference unchanged.
pub fn resolve_image(reference: &str, mirror: Option<&str>) -> String {
    match mirror.map(|m| m.trim().trim_end_matches('/')) {
        Some(mirror) if !mirror.is_empty() => format!("{}/{}", mirror, reference),
        _ => reference.to_string(),
    }
}
