//! prefix routing: the first path segment of the uri selects a handler tag

use std::collections::BTreeMap;

use crate::error::PipelineError;

/// outcome of a successful resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// the uri was exactly `/`; never looked up in the table
    Root,
    Handler {
        prefix: &'a str,
        tag: &'a str,
        /// the uri from the second `/` onward, empty when there is none
        path: &'a str,
    },
}

/// prefix → handler tag. built once at startup, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: BTreeMap<String, String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, prefix: impl Into<String>, tag: impl Into<String>) -> Self {
        self.routes.insert(prefix.into(), tag.into());
        self
    }

    pub fn tag(&self, prefix: &str) -> Option<&str> {
        self.routes.get(prefix).map(String::as_str)
    }

    /// (prefix, tag) pairs in prefix order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes.iter().map(|(p, t)| (p.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// resolve `uri` against the table.
    ///
    /// the prefix runs from index 0 up to, not including, the second `/`. a
    /// uri with no second slash is all prefix and leaves an empty path.
    pub fn resolve<'a>(&'a self, uri: &'a str) -> Result<Route<'a>, PipelineError> {
        if uri == "/" {
            return Ok(Route::Root);
        }
        if !uri.starts_with('/') {
            return Err(PipelineError::Unroutable {
                uri: uri.to_string(),
            });
        }

        let split = uri[1..].find('/').map_or(uri.len(), |i| i + 1);
        let (prefix, path) = uri.split_at(split);

        match self.tag(prefix) {
            Some(tag) => Ok(Route::Handler { prefix, tag, path }),
            None => Err(PipelineError::Unroutable {
                uri: uri.to_string(),
            }),
        }
    }
}

impl FromIterator<(String, String)> for RouteTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            routes: iter.into_iter().collect(),
        }
    }
}
