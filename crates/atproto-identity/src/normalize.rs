use at_uri_parser::{AT_URI_PREFIX, DID_PREFIX};

/// Canonicalize a partial identifier.
///
/// Strips `at://` and `@` prefixes, then appends `.<default_suffix>` to a bare
/// name with no dot. DIDs pass through with only the `at://` prefix removed.
/// Idempotent: `normalize(normalize(x, s), s) == normalize(x, s)`.
pub fn normalize(raw: &str, default_suffix: &str) -> String {
    let mut id = raw;
    loop {
        if let Some(rest) = id.strip_prefix(AT_URI_PREFIX) {
            id = rest;
        } else if !id.starts_with(DID_PREFIX) && id.starts_with('@') {
            id = &id[1..];
        } else {
            break;
        }
    }

    let suffix = default_suffix.trim_start_matches('.');
    if id.is_empty() || id.starts_with(DID_PREFIX) || id.contains('.') || suffix.is_empty() {
        return id.to_string();
    }
    format!("{id}.{suffix}")
}
