pub mod echo;
pub mod registry;
pub mod static_files;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::http::{Request, Response};

pub use echo::EchoHandler;
pub use registry::HandlerRegistry;
pub use static_files::StaticFileHandler;

/// what a handler gets to see of a routed request
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'a> {
    pub request: &'a Request,
    /// the matched route prefix, e.g. `/static`
    pub prefix: &'a str,
    /// the uri after the prefix, starting at the second `/` (may be empty)
    pub path: &'a str,
}

/// a behavior a route tag can point at
#[async_trait]
pub trait Handler: Send + Sync {
    /// the tag routes use to select this handler, e.g. `echo_dir`
    fn tag(&self) -> &'static str;

    async fn handle(&self, exchange: &Exchange<'_>) -> Result<Response, PipelineError>;
}
