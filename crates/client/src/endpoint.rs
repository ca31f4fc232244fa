//! Address derivation from the server origin.
//!
//! The socket lives at `/ws` on the same host as the origin, secure iff the
//! origin is. Session commands live under `/api/{session_id}`.

use url::Url;

use crate::error::EndpointError;

pub const SOCKET_PATH: &str = "/ws";

/// `http(s)://host/...` → `ws(s)://host/ws`
pub fn socket_url(origin: &Url) -> Result<Url, EndpointError> {
    let scheme = match origin.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
    };

    let mut url = origin.clone();
    url.set_scheme(scheme)
        .map_err(|_| EndpointError::UnsupportedScheme(origin.scheme().to_string()))?;
    url.set_path(SOCKET_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// `{origin}/api/{session_id}/{segments...}`
pub fn session_api_url(
    origin: &Url,
    session_id: &str,
    segments: &[&str],
) -> Result<Url, EndpointError> {
    if !matches!(origin.scheme(), "http" | "https") {
        return Err(EndpointError::UnsupportedScheme(origin.scheme().to_string()));
    }

    let mut url = origin.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| EndpointError::NotABase(origin.to_string()))?
        .clear()
        .push("api")
        .push(session_id)
        .extend(segments);
    Ok(url)
}
