//! Inverting a stored asset URL back into its remote identifier.

use url::Url;

/// Derive the remote public id from a delivery URL.
///
/// The provider inserts path components between the `upload` marker and the
/// actual id: a version segment (`v` followed by digits) and optionally a
/// comma-separated transformation qualifier (`c_fill,w_200`). Both are
/// dropped, the remainder is rejoined, and the file extension is stripped.
///
/// Returns `None` when the URL has no `upload` marker segment — callers must
/// treat that as "nothing to delete", not as an error.
pub fn resolve_public_id(asset_url: &str) -> Option<String> {
    let url = Url::parse(asset_url).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();

    let upload_index = segments.iter().position(|segment| *segment == "upload")?;

    let filtered: Vec<&str> = segments[upload_index + 1..]
        .iter()
        .copied()
        .filter(|segment| !is_version_segment(segment) && !segment.contains(','))
        .collect();

    if filtered.is_empty() {
        return None;
    }

    Some(strip_extension(&filtered.join("/")))
}

fn is_version_segment(segment: &str) -> bool {
    let Some(digits) = segment.strip_prefix('v') else {
        return false;
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Strip a trailing `.ext` from the final path segment only.
fn strip_extension(path: &str) -> String {
    let last_slash = path.rfind('/').map_or(0, |i| i + 1);
    match path[last_slash..].rfind('.') {
        Some(dot) if dot > 0 => path[..last_slash + dot].to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_version_segment() {
        assert_eq!(
            resolve_public_id("https://res.example.com/demo/image/upload/v1700000000/books/abc123.png"),
            Some("books/abc123".to_string())
        );
    }

    #[test]
    fn drops_transformation_qualifier() {
        assert_eq!(
            resolve_public_id("https://res.example.com/demo/image/upload/c_fill,w_200/books/xyz.jpg"),
            Some("books/xyz".to_string())
        );
    }

    #[test]
    fn no_upload_marker_means_nothing_to_delete() {
        assert_eq!(
            resolve_public_id("https://example.com/default-cover.png"),
            None
        );
    }

    #[test]
    fn keeps_nested_folders() {
        assert_eq!(
            resolve_public_id(
                "https://res.example.com/demo/image/upload/v1/books/2024/cover.webp"
            ),
            Some("books/2024/cover".to_string())
        );
    }

    #[test]
    fn version_lookalike_folder_is_kept() {
        // "v2beta" is not a pure version segment.
        assert_eq!(
            resolve_public_id("https://res.example.com/demo/image/upload/v2beta/abc.png"),
            Some("v2beta/abc".to_string())
        );
    }

    #[test]
    fn missing_extension_is_fine() {
        assert_eq!(
            resolve_public_id("https://res.example.com/demo/image/upload/v1/books/abc"),
            Some("books/abc".to_string())
        );
    }

    #[test]
    fn unparseable_url_is_none() {
        assert_eq!(resolve_public_id("not a url"), None);
    }
}
