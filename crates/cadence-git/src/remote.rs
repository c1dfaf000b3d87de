//! Remote URL helpers.

/// Converts a remote URL into the repository's browsable `https://` URL.
///
/// Handles `https://`, `ssh://` and scp-like (`git@host:owner/repo`) remotes,
/// strips credentials and a trailing `.git`. Returns `None` for local paths
/// and anything else without a host.
#[must_use]
pub fn web_url(remote: &str) -> Option<String> {
    let remote = remote.trim();

    let (host, path) = if let Some(rest) = remote
        .strip_prefix("https://")
        .or_else(|| remote.strip_prefix("http://"))
        .or_else(|| remote.strip_prefix("ssh://"))
        .or_else(|| remote.strip_prefix("git://"))
    {
        let (authority, path) = rest.split_once('/')?;
        let host = authority.rsplit('@').next()?;
        // ssh://host:2222/path carries a port that the web URL doesn't use.
        let host = host.split(':').next()?;
        (host, path)
    } else if remote.contains("://") {
        return None;
    } else {
        let (authority, path) = remote.split_once(':')?;
        let host = authority.rsplit('@').next()?;
        (host, path)
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    if host.is_empty() || path.is_empty() {
        return None;
    }

    Some(format!("https://{host}/{path}"))
}
