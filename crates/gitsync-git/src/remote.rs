use std::fmt;

/// The part of a remote URL that identifies a repository: host and path,
/// lower-cased, with a `.git` suffix.
///
/// Scheme, user-info and port are dropped, so the https and ssh spellings of
/// one repository compare equal. Local paths have an empty host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteIdentity {
    host: String,
    path: String,
}

impl RemoteIdentity {
    /// Normalize a remote URL as written in configuration or as recorded in
    /// a repository's `remote.origin.url`.
    ///
    /// Accepted forms:
    /// - `scheme://[user@]host[:port]/path` (including `file:///path`)
    /// - scp-like `[user@]host:path`
    /// - plain local paths
    pub fn parse(url: &str) -> Self {
        let url = url.trim().to_lowercase();

        let (host, path) = if let Some((_, rest)) = url.split_once("://") {
            let (authority, path) = match rest.find('/') {
                Some(idx) => (&rest[..idx], &rest[idx..]),
                None => (rest, ""),
            };
            (strip_port(strip_user(authority)), path.to_string())
        } else if let Some((host, path)) = split_scp(&url) {
            (strip_user(host), path.to_string())
        } else {
            ("", url.clone())
        };

        Self {
            host: host.to_string(),
            path: normalize_path(&path, !host.is_empty()),
        }
    }

    /// Whether two URLs name the same repository
    pub fn same_repository(a: &str, b: &str) -> bool {
        Self::parse(a) == Self::parse(b)
    }
}

impl fmt::Display for RemoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.host, self.path)
    }
}

fn strip_user(authority: &str) -> &str {
    authority.rsplit_once('@').map_or(authority, |(_, host)| host)
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literals carry colons of their own
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.split_once(':').map_or(host, |(host, _)| host)
}

/// `host:path` with no slash before the colon. A single letter before the
/// colon is a Windows drive, not a host.
fn split_scp(url: &str) -> Option<(&str, &str)> {
    let colon = url.find(':')?;
    if url[..colon].contains('/') {
        return None;
    }
    let host = &url[..colon];
    if strip_user(host).len() <= 1 {
        return None;
    }
    Some((host, &url[colon + 1..]))
}

fn normalize_path(path: &str, has_host: bool) -> String {
    let mut path = path.trim_end_matches('/').to_string();
    if has_host && !path.starts_with('/') {
        path.insert(0, '/');
    }
    if !path.ends_with(".git") {
        path.push_str(".git");
    }
    path
}
