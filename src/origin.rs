//! Cross-site request check for the signup form.
//!
//! With a configured site origin, the browser's `Origin` header must equal it
//! exactly. Only when `Origin` is missing do we fall back to the origin of
//! `Referer`. Without a configured origin (local development) we only turn
//! away requests whose `Origin` names a different host than the one they
//! were sent to.

use reqwest::Url;

pub fn is_origin_allowed(
    origin: Option<&str>,
    referer: Option<&str>,
    host: Option<&str>,
    site_origin: Option<&str>,
) -> bool {
    let origin = origin.filter(|o| !o.is_empty());

    match site_origin {
        Some(allowed) => match origin {
            Some(origin) => origin == allowed,
            None => referer
                .filter(|r| !r.is_empty())
                .is_some_and(|r| referer_origin(r).as_deref() == Some(allowed)),
        },
        // No origin header: same-origin fetch or non-browser client
        None => match origin {
            None => true,
            Some(origin) => match (origin_host(origin), host) {
                (Some(origin_host), Some(host)) => origin_host.eq_ignore_ascii_case(host),
                _ => false,
            },
        },
    }
}

fn referer_origin(referer: &str) -> Option<String> {
    let url = Url::parse(referer).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

// `host[:port]`, port omitted when it is the scheme default
fn origin_host(origin: &str) -> Option<String> {
    let url = Url::parse(origin).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
