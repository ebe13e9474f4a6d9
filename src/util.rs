/// Normalization helpers shared by the comparator and the stores.
///
/// IMPORTANT:
/// - No vendor-specific logic should live here.
/// - Everything in this module must stay pure and deterministic, the
///   release identity is built on top of it.
///

/// Normalize a link for identity comparison.
///
/// Target format:
///     scheme://host/path   (scheme and host lowercase, no trailing slash)
///
/// Examples:
/// - "HTTPS://Example.com/jdk/"  -> "https://example.com/jdk"
/// - " https://example.com "     -> "https://example.com"
/// - "relative/path/"            -> "relative/path"
///
/// Only the scheme and host are case-folded, paths are case sensitive on
/// most vendor hosts.
///
pub fn normalize_link(raw: &str) -> String {
    let trimmed = raw.trim();

    let Some((scheme, rest)) = trimmed.split_once("://") else {
        return trimmed.trim_end_matches('/').to_string();
    };

    let (host, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    format!(
        "{}://{}{}",
        scheme.to_ascii_lowercase(),
        host.to_ascii_lowercase(),
        path.trim_end_matches('/')
    )
}

/// Collapse surrounding and repeated inner whitespace of a display name.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_scheme_and_host_are_case_folded() {
        assert_eq!(
            normalize_link("HTTPS://Example.COM/Jdk/Release/"),
            "https://example.com/Jdk/Release"
        );
    }

    #[test]
    fn link_without_path_loses_trailing_slash() {
        assert_eq!(normalize_link(" https://example.com/ "), "https://example.com");
        assert_eq!(normalize_link("https://example.com"), "https://example.com");
    }

    #[test]
    fn link_without_scheme_is_only_trimmed() {
        assert_eq!(normalize_link("Releases/jdk17/"), "Releases/jdk17");
    }

    #[test]
    fn name_whitespace_is_collapsed() {
        assert_eq!(normalize_name("  jdk-17.0.8+7\t LTS "), "jdk-17.0.8+7 LTS");
    }
}
