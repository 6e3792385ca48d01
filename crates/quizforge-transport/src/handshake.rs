//! Metadata captured while a connection is being established.
//!
//! Hosts and players identify themselves *before* the first message: the
//! request path picks the endpoint, headers (or query parameters, for
//! browsers that cannot set headers) carry the player and room IDs, and
//! the negotiated sub-protocol tells us which kind of client connected.

use std::collections::HashMap;

use url::form_urlencoded;

/// What the client sent while opening the connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handshake {
    path: String,
    query: Vec<(String, String)>,
    /// Header names are stored lower-cased; lookups are case-insensitive.
    headers: HashMap<String, String>,
    subprotocol: Option<String>,
}

impl Handshake {
    /// Creates a handshake for the given request path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Parses a raw query string (`a=1&b=two`) into key/value pairs,
    /// decoding `%XX` escapes and `+`.
    pub fn with_query(mut self, raw: &str) -> Self {
        self.query = form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect();
        self
    }

    /// Records a request header.
    pub fn with_header(
        mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Records the sub-protocol the server agreed to speak.
    pub fn with_subprotocol(mut self, protocol: impl Into<String>) -> Self {
        self.subprotocol = Some(protocol.into());
        self
    }

    /// The request path, e.g. `/host`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Looks up a header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Looks up the first query parameter with the given key.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The negotiated sub-protocol, if the client offered one we support.
    pub fn subprotocol(&self) -> Option<&str> {
        self.subprotocol.as_deref()
    }

    /// Returns the header value, falling back to the query parameter.
    /// Empty values count as absent.
    pub fn header_or_query(&self, header: &str, key: &str) -> Option<&str> {
        self.header(header)
            .or_else(|| self.query(key))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Picks the first protocol in the client's comma-separated offer that the
/// server supports.
pub(crate) fn select_subprotocol(
    offered: &str,
    supported: &[String],
) -> Option<String> {
    offered
        .split(',')
        .map(str::trim)
        .find(|p| supported.iter().any(|s| s == p))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let hs = Handshake::new("/player").with_header("Player-ID", "alice");
        assert_eq!(hs.header("player-id"), Some("alice"));
        assert_eq!(hs.header("PLAYER-ID"), Some("alice"));
        assert_eq!(hs.header("Room-ID"), None);
    }

    #[test]
    fn test_query_parsing_decodes_escapes() {
        let hs = Handshake::new("/player")
            .with_query("playerId=Jane%20Doe&roomId=AB+12&flag");
        assert_eq!(hs.query("playerId"), Some("Jane Doe"));
        assert_eq!(hs.query("roomId"), Some("AB 12"));
        assert_eq!(hs.query("flag"), Some(""));
        assert_eq!(hs.query("missing"), None);
    }

    #[test]
    fn test_query_keeps_invalid_escapes() {
        let hs = Handshake::new("/player")
            .with_query("playerId=100%&roomId=%zz&name=%41");
        assert_eq!(hs.query("playerId"), Some("100%"));
        assert_eq!(hs.query("roomId"), Some("%zz"));
        assert_eq!(hs.query("name"), Some("A"));
    }

    #[test]
    fn test_header_wins_over_query() {
        let hs = Handshake::new("/player")
            .with_query("roomId=QUERY")
            .with_header("Room-ID", "HEADER");
        assert_eq!(hs.header_or_query("Room-ID", "roomId"), Some("HEADER"));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let hs = Handshake::new("/player").with_header("Player-ID", "  ");
        assert_eq!(hs.header_or_query("Player-ID", "playerId"), None);
    }

    #[test]
    fn test_select_subprotocol_picks_first_supported() {
        let supported = vec!["kahoot".to_string(), "kahoot-player".to_string()];
        assert_eq!(
            select_subprotocol("chat, kahoot-player", &supported),
            Some("kahoot-player".to_string())
        );
        assert_eq!(select_subprotocol("chat", &supported), None);
    }
}
