use async_trait::async_trait;

use super::{Exchange, Handler};
use crate::error::PipelineError;
use crate::http::{Response, TERMINATOR};

/// reflects the whole request back, request line and headers included
pub struct EchoHandler;

impl EchoHandler {
    pub const TAG: &'static str = "echo_dir";

    /// `Content-Length` excludes the trailing terminator while the body
    /// still carries all `received` bytes
    pub fn respond(raw: &[u8], received: usize) -> Response {
        let length = received.saturating_sub(TERMINATOR.len());

        Response::ok()
            .with_header("Content-Type", "text/plain")
            .with_header("Content-Length", length.to_string())
            .with_body(raw.to_vec())
    }
}

#[async_trait]
impl Handler for EchoHandler {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    async fn handle(&self, exchange: &Exchange<'_>) -> Result<Response, PipelineError> {
        let raw = exchange.request.raw();
        Ok(Self::respond(raw, raw.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Request, Status};

    #[test]
    fn test_respond_length_excludes_terminator() {
        let raw = b"GET /echo/x HTTP/1.1\r\n\r\n";
        let response = EchoHandler::respond(raw, raw.len());

        assert_eq!(response.status(), Status::OK);
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(response.header("Content-Length"), Some("20"));
        assert_eq!(response.body(), raw);
    }

    #[test]
    fn test_respond_header_order() {
        let response = EchoHandler::respond(b"\r\n\r\n", 4);
        let names: Vec<_> = response.headers().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["Content-Type", "Content-Length"]);
        assert_eq!(response.header("Content-Length"), Some("0"));
    }

    #[tokio::test]
    async fn test_handle_reflects_headers_verbatim() {
        let raw = b"POST /echo HTTP/1.0\r\nHost: example\r\nX-A: b\r\n\r\n".to_vec();
        let request = Request::parse(raw.clone()).unwrap();
        let exchange = Exchange {
            request: &request,
            prefix: "/echo",
            path: "",
        };

        let response = EchoHandler.handle(&exchange).await.unwrap();
        assert_eq!(response.body(), raw.as_slice());
        assert_eq!(
            response.header("Content-Length"),
            Some((raw.len() - 4).to_string().as_str())
        );
    }
}
