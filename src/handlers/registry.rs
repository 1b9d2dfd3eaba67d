use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::{EchoHandler, Handler, StaticFileHandler};

/// handler tag → handler. filled before the server starts, shared read-only.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// echo and static file handlers, the latter reading from `<root>/public`
    pub fn with_defaults(root: impl AsRef<Path>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EchoHandler));
        registry.register(Arc::new(StaticFileHandler::new(root)));
        registry
    }

    /// add a handler under its own tag, replacing any previous one
    pub fn register(&mut self, handler: Arc<dyn Handler>) {
        log::debug!("registering handler '{}'", handler.tag());
        self.handlers.insert(handler.tag(), handler);
    }

    pub fn get(&self, tag: &str) -> Option<&dyn Handler> {
        self.handlers.get(tag).map(|h| h.as_ref())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// registered tags, sorted
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.handlers.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}
