//! serves files from `<root>/public`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{Exchange, Handler};
use crate::error::PipelineError;
use crate::http::{content_type_for, Response};

/// directory under the server root that static routes read from
pub const PUBLIC_DIR: &str = "public";

pub struct StaticFileHandler {
    public_dir: PathBuf,
}

impl StaticFileHandler {
    pub const TAG: &'static str = "static_dir";

    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            public_dir: root.as_ref().join(PUBLIC_DIR),
        }
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// map the url path (everything after the route prefix) onto the public
    /// directory. query and fragment are dropped; `..` segments are refused.
    pub fn resolve(&self, url_path: &str) -> Result<PathBuf, PipelineError> {
        let path = url_path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();

        let mut resolved = self.public_dir.clone();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(PipelineError::Forbidden {
                        path: url_path.to_string(),
                    })
                }
                _ => resolved.push(segment),
            }
        }

        Ok(resolved)
    }

    /// respond with the file at `url_path`, or not-found when there is no
    /// regular file there. the file is only read once it is known to exist.
    pub async fn serve(&self, url_path: &str) -> Result<Response, PipelineError> {
        let path = self.resolve(url_path)?;
        let display = path.display().to_string();

        let is_file = fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(PipelineError::NotFound { path: display });
        }

        let contents = fs::read(&path).await.map_err(|source| PipelineError::Io {
            path: display.clone(),
            source,
        })?;

        log::debug!("serving {} ({} bytes)", display, contents.len());

        Ok(Response::ok()
            .with_header("Content-Length", contents.len().to_string())
            .with_header("Content-Type", content_type_for(&display))
            .with_body(contents))
    }
}

#[async_trait]
impl Handler for StaticFileHandler {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    async fn handle(&self, exchange: &Exchange<'_>) -> Result<Response, PipelineError> {
        log::debug!(
            "{} mounted at {} -> {}",
            exchange.path,
            exchange.prefix,
            self.public_dir.display()
        );
        self.serve(exchange.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Status;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let public = dir.path().join(PUBLIC_DIR);
        std::fs::create_dir_all(public.join("docs")).unwrap();
        std::fs::write(public.join("a.html"), "hi").unwrap();
        std::fs::write(public.join("docs/report.pdf"), [0x25, 0x50, 0x44, 0x46, 0x00, 0xff]).unwrap();
        std::fs::write(public.join("notes"), "plain").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_serve_existing_html() {
        let dir = site();
        let handler = StaticFileHandler::new(dir.path());

        let response = handler.serve("/a.html").await.unwrap();
        assert_eq!(response.status(), Status::OK);
        assert_eq!(response.header("Content-Type"), Some("text/html"));
        assert_eq!(response.header("Content-Length"), Some("2"));
        assert_eq!(response.body(), b"hi");
    }

    #[tokio::test]
    async fn test_serve_binary_in_subdirectory() {
        let dir = site();
        let handler = StaticFileHandler::new(dir.path());

        let response = handler.serve("/docs/report.pdf").await.unwrap();
        assert_eq!(response.header("Content-Type"), Some("application/pdf"));
        assert_eq!(response.header("Content-Length"), Some("6"));
        assert_eq!(response.body(), &[0x25, 0x50, 0x44, 0x46, 0x00, 0xff]);
    }

    #[tokio::test]
    async fn test_serve_without_extension_is_plain_text() {
        let dir = site();
        let handler = StaticFileHandler::new(dir.path());

        let response = handler.serve("/notes").await.unwrap();
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_serve_missing_file() {
        let dir = site();
        let handler = StaticFileHandler::new(dir.path());

        let err = handler.serve("/missing.html").await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
        assert_eq!(err.status(), Status::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_directory_is_not_found() {
        let dir = site();
        let handler = StaticFileHandler::new(dir.path());

        assert!(matches!(
            handler.serve("/docs").await,
            Err(PipelineError::NotFound { .. })
        ));
        assert!(matches!(
            handler.serve("").await,
            Err(PipelineError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_serve_ignores_query_string() {
        let dir = site();
        let handler = StaticFileHandler::new(dir.path());

        let response = handler.serve("/a.html?v=2#top").await.unwrap();
        assert_eq!(response.body(), b"hi");
    }

    #[test]
    fn test_resolve_rejects_parent_segments() {
        let handler = StaticFileHandler::new("/srv");
        assert!(matches!(
            handler.resolve("/../etc/passwd"),
            Err(PipelineError::Forbidden { .. })
        ));
        assert!(matches!(
            handler.resolve("/docs/../../x"),
            Err(PipelineError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_resolve_stays_under_public_dir() {
        let handler = StaticFileHandler::new("/srv");
        assert_eq!(
            handler.resolve("//a/./b.html").unwrap(),
            PathBuf::from("/srv/public/a/b.html")
        );
        assert_eq!(handler.public_dir(), Path::new("/srv/public"));
    }
}
