//! URL and domain helpers shared by the funnel and the orchestrator.

use url::Url;

/// Extract the registrable domain from a URL: lowercased host with a single
/// leading `www.` stripped. Returns `None` for hostless URLs.
///
/// Denylist entries are plain registrable names (`toptal.com`), so this is
/// deliberately the same notion of "domain" — no public-suffix handling,
/// which would change which companies get rejected.
pub fn registrable_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    let domain = host.strip_prefix("www.").unwrap_or(&host);
    if domain.is_empty() {
        None
    } else {
        Some(domain.to_string())
    }
}

/// Parse a candidate URL string from search results. Only absolute http(s)
/// URLs with a host survive — malformed candidates must never reach the
/// fetch stage.
pub fn parse_candidate_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    url.host_str()?;
    Some(url)
}
