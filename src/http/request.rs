//! request-line parsing
//!
//! only the first line is interpreted; headers and body stay in the raw bytes
//! untouched (the echo handler reflects them verbatim).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// why a request line was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request line is not valid utf-8")]
    NotUtf8,

    #[error("request line starts with a space")]
    LeadingSpace,

    #[error("request line contains consecutive spaces")]
    ConsecutiveSpaces,

    #[error("request line has {0} space-separated fields, expected 3")]
    FieldCount(usize),

    #[error("unsupported method '{0}'")]
    UnsupportedMethod(String),

    #[error("request uri is empty")]
    EmptyUri,

    #[error("unsupported http version '{0}'")]
    UnsupportedVersion(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Method {
    type Err = RequestError;

    // tokens are case-sensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            _ => Err(RequestError::UnsupportedMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Version {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP/1.0" => Ok(Version::Http10),
            "HTTP/1.1" => Ok(Version::Http11),
            _ => Err(RequestError::UnsupportedVersion(s.to_string())),
        }
    }
}

/// a validated request. only constructed through [`Request::parse`], so every
/// value in circulation has all three request-line fields populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    raw: Vec<u8>,
    method: Method,
    uri: String,
    version: Version,
}

impl Request {
    /// parse the request line out of `raw` (the bytes read up to and including
    /// the terminator). `raw` is kept as-is for handlers that need it.
    pub fn parse(raw: Vec<u8>) -> Result<Self, RequestError> {
        let line_end = raw.iter().position(|&b| b == b'\r').unwrap_or(raw.len());
        let line = std::str::from_utf8(&raw[..line_end]).map_err(|_| RequestError::NotUtf8)?;

        if line.starts_with(' ') {
            return Err(RequestError::LeadingSpace);
        }
        if line.contains("  ") {
            return Err(RequestError::ConsecutiveSpaces);
        }

        let fields: Vec<&str> = line.split(' ').collect();
        let [method, uri, version] = fields[..] else {
            return Err(RequestError::FieldCount(fields.len()));
        };

        let method: Method = method.parse()?;
        // unreachable while the space checks above run first; keeps the
        // three field rules independent of them
        if uri.is_empty() {
            return Err(RequestError::EmptyUri);
        }
        let version: Version = version.parse()?;
        let uri = uri.to_string();

        Ok(Request {
            raw,
            method,
            uri,
            version,
        })
    }

    /// every byte received for this request, terminator included
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.uri, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Request, RequestError> {
        Request::parse(raw.as_bytes().to_vec())
    }

    #[test]
    fn test_parse_valid_get() {
        let req = parse("GET /echo/x HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.method(), Method::Get);
        assert_eq!(req.uri(), "/echo/x");
        assert_eq!(req.version(), Version::Http11);
        assert_eq!(req.raw(), b"GET /echo/x HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn test_parse_valid_combinations() {
        for method in ["GET", "POST"] {
            for version in ["HTTP/1.0", "HTTP/1.1"] {
                let raw = format!("{} /static/a.html {}\r\nHost: x\r\n\r\n", method, version);
                let req = parse(&raw).unwrap();
                assert_eq!(req.method().as_str(), method);
                assert_eq!(req.uri(), "/static/a.html");
                assert_eq!(req.version().as_str(), version);
            }
        }
    }

    #[test]
    fn test_headers_do_not_affect_request_line() {
        let req = parse("POST / HTTP/1.0\r\nX-Thing: a  b c d\r\n\r\n").unwrap();
        assert_eq!(req.uri(), "/");
    }

    #[test]
    fn test_leading_space() {
        assert_eq!(
            parse(" GET / HTTP/1.1\r\n\r\n"),
            Err(RequestError::LeadingSpace)
        );
    }

    #[test]
    fn test_consecutive_spaces() {
        assert_eq!(
            parse("GET  / HTTP/1.1\r\n\r\n"),
            Err(RequestError::ConsecutiveSpaces)
        );
        assert_eq!(
            parse("GET /  HTTP/1.1\r\n\r\n"),
            Err(RequestError::ConsecutiveSpaces)
        );
    }

    #[test]
    fn test_unsupported_method() {
        assert_eq!(
            parse("PUT / HTTP/1.1\r\n\r\n"),
            Err(RequestError::UnsupportedMethod("PUT".to_string()))
        );
        assert!(parse("get / HTTP/1.1\r\n\r\n").is_err());
    }

    #[test]
    fn test_unsupported_version() {
        assert_eq!(
            parse("GET / HTTP/2.0\r\n\r\n"),
            Err(RequestError::UnsupportedVersion("HTTP/2.0".to_string()))
        );
    }

    #[test]
    fn test_wrong_field_count() {
        assert_eq!(parse("GET /\r\n\r\n"), Err(RequestError::FieldCount(2)));
        assert_eq!(
            parse("GET / HTTP/1.1 extra\r\n\r\n"),
            Err(RequestError::FieldCount(4))
        );
        assert_eq!(parse("\r\n\r\n"), Err(RequestError::FieldCount(1)));
    }

    #[test]
    fn test_trailing_space_leaves_empty_version() {
        assert_eq!(
            parse("GET / \r\n\r\n"),
            Err(RequestError::UnsupportedVersion(String::new()))
        );
    }

    #[test]
    fn test_empty_uri_is_caught_by_space_rule() {
        assert_eq!(
            parse("GET  HTTP/1.1\r\n\r\n"),
            Err(RequestError::ConsecutiveSpaces)
        );
    }

    #[test]
    fn test_not_utf8() {
        let raw = b"GET /\xff HTTP/1.1\r\n\r\n".to_vec();
        assert_eq!(Request::parse(raw), Err(RequestError::NotUtf8));
    }

    #[test]
    fn test_display_request_line() {
        let req = parse("POST /echo HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(req.to_string(), "POST /echo HTTP/1.0");
    }
}
