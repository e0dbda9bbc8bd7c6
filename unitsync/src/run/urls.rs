//! Run and log URLs of a unit

use url::Url;

use crate::errors::UnitError;
use crate::storage::session::Session;

/// Host of the canonical platform
const CANONICAL_HOST: &str = "unitcluster.com";

/// Domain units run under on the canonical platform
const RUN_DOMAIN: &str = "unit.run";

/// Which endpoint of a running unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitEndpoint {
    Run,
    Logs,
}

fn is_canonical(server: &Url) -> bool {
    server
        .host_str()
        .map(|h| h == CANONICAL_HOST || h.ends_with(&format!(".{}", CANONICAL_HOST)))
        .unwrap_or(false)
}

/// Build the run or log URL of unit `name`.
///
/// The canonical platform serves units from `https://<login>.unit.run/`;
/// any other server gets the login prefixed to its host, over plain HTTP.
pub fn unit_url(endpoint: UnitEndpoint, session: &Session, name: &str) -> Result<String, UnitError> {
    let server = Url::parse(&session.server)
        .map_err(|e| UnitError::ConfigError(format!("invalid server {}: {}", session.server, e)))?;

    let mut url = if is_canonical(&server) {
        Url::parse(&format!("https://{}.{}/", session.login, RUN_DOMAIN))
            .map_err(|e| UnitError::ConfigError(e.to_string()))?
    } else {
        let mut url = server.clone();
        let host = server
            .host_str()
            .ok_or_else(|| UnitError::ConfigError(format!("server {} has no host", session.server)))?;
        url.set_host(Some(&format!("{}.{}", session.login, host)))
            .map_err(|e| UnitError::ConfigError(e.to_string()))?;
        if url.scheme() == "https" {
            url.set_scheme("http")
                .map_err(|_| UnitError::ConfigError("failed to set scheme".to_string()))?;
        }
        url
    };

    let mut path = format!("{}/{}", url.path().trim_end_matches('/'), name);
    if endpoint == UnitEndpoint::Logs {
        path.push_str("/logs");
    }
    url.set_path(&path);
    url.set_query(None);
    if !session.key.is_empty() {
        url.query_pairs_mut().append_pair("key", &session.key);
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(server: &str, key: &str) -> Session {
        let mut session: Session =
            serde_json::from_value(serde_json::json!({"login": "me", "key": key})).unwrap();
        session.server = server.to_string();
        session
    }

    #[test]
    fn test_canonical_host() {
        let s = session("https://unitcluster.com", "abc");
        assert_eq!(
            unit_url(UnitEndpoint::Run, &s, "hello").unwrap(),
            "https://me.unit.run/hello?key=abc"
        );
        assert_eq!(
            unit_url(UnitEndpoint::Logs, &s, "hello").unwrap(),
            "https://me.unit.run/hello/logs?key=abc"
        );
    }

    #[test]
    fn test_custom_server_is_prefixed_and_downgraded() {
        let s = session("https://units.example.org:8443", "abc");
        assert_eq!(
            unit_url(UnitEndpoint::Logs, &s, "hello").unwrap(),
            "http://me.units.example.org:8443/hello/logs?key=abc"
        );
    }

    #[test]
    fn test_no_key_no_query() {
        let s = session("http://localhost:3000", "");
        assert_eq!(
            unit_url(UnitEndpoint::Run, &s, "hello").unwrap(),
            "http://me.localhost:3000/hello"
        );
    }
}
