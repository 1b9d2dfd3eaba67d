//! one request/response exchange over one connection
//!
//! phases run strictly in order: read until the terminator, parse, route,
//! handle, write, drain, close. the only suspension points are reading and
//! writing/draining, and both are bounded by [`Limits`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};

use crate::error::{PipelineError, TransportError};
use crate::handlers::{Exchange, HandlerRegistry};
use crate::http::{find_terminator, Request, Response, Status, TERMINATOR};
use crate::router::{Route, RouteTable};

const READ_CHUNK: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingRequest,
    Parsing,
    Routing,
    Handling,
    Writing,
    Draining,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::AwaitingRequest => "awaiting-request",
            Phase::Parsing => "parsing",
            Phase::Routing => "routing",
            Phase::Handling => "handling",
            Phase::Writing => "writing",
            Phase::Draining => "draining",
            Phase::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// bounds on the two suspension points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// how long a client may take to deliver the full header block
    pub read_timeout: Duration,
    /// how long writing plus flushing the response may take
    pub drain_timeout: Duration,
    /// largest header block accepted while still waiting for the terminator
    pub max_request_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            drain_timeout: Duration::from_secs(10),
            max_request_bytes: 8192,
        }
    }
}

/// what a finished exchange looked like, for the access log and callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub status: Status,
    /// the request line, when the request parsed
    pub request_line: Option<String>,
    pub body_bytes: usize,
}

enum ReadFailure {
    Respond(PipelineError),
    Transport(TransportError),
}

pub struct Connection<S> {
    stream: S,
    peer: String,
    routes: Arc<RouteTable>,
    handlers: Arc<HandlerRegistry>,
    limits: Limits,
    phase: Phase,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: impl Into<String>,
        routes: Arc<RouteTable>,
        handlers: Arc<HandlerRegistry>,
        limits: Limits,
    ) -> Self {
        Self {
            stream,
            peer: peer.into(),
            routes,
            handlers,
            limits,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!("[{}] {} -> {}", self.peer, self.phase, phase);
        self.phase = phase;
    }

    /// drive the exchange to completion. the connection is shut down on every
    /// path; a transport error means nothing (more) could be written.
    pub async fn run(mut self) -> Result<Completed, TransportError> {
        self.enter(Phase::AwaitingRequest);

        let (request_line, outcome) = match self.read_request().await {
            Ok(raw) => self.process(raw).await,
            Err(ReadFailure::Respond(err)) => (None, Err(err)),
            Err(ReadFailure::Transport(err)) => {
                log::error!("[{}] {}", self.peer, err);
                self.close().await;
                return Err(err);
            }
        };

        let response = outcome.unwrap_or_else(|err| {
            if err.status().is_server_error() {
                log::error!("[{}] {}", self.peer, err);
            } else {
                log::warn!("[{}] {}", self.peer, err);
            }
            err.to_response()
        });

        let completed = Completed {
            status: response.status(),
            request_line,
            body_bytes: response.body().len(),
        };

        if let Err(err) = self.write_response(&response).await {
            log::error!("[{}] {}", self.peer, err);
            self.close().await;
            return Err(err);
        }
        self.close().await;

        log::info!(
            "{} \"{}\" {} {}",
            self.peer,
            completed.request_line.as_deref().unwrap_or("-"),
            completed.status.code,
            completed.body_bytes
        );

        Ok(completed)
    }

    /// read until the terminator; returns the bytes up to and including it
    async fn read_request(&mut self) -> Result<Vec<u8>, ReadFailure> {
        let deadline = Instant::now() + self.limits.read_timeout;
        let mut buf = Vec::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = match timeout_at(deadline, self.stream.read(&mut chunk)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(ReadFailure::Transport(TransportError::Read(e))),
                Err(_) => {
                    return Err(ReadFailure::Respond(PipelineError::RequestTimeout(
                        self.limits.read_timeout,
                    )))
                }
            };

            if n == 0 {
                return Err(ReadFailure::Transport(TransportError::ClosedEarly {
                    received: buf.len(),
                }));
            }

            // the terminator may straddle the previous chunk
            let search_from = buf.len().saturating_sub(TERMINATOR.len() - 1);
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = find_terminator(&buf[search_from..]) {
                buf.truncate(search_from + end);
                if buf.len() > self.limits.max_request_bytes {
                    return Err(ReadFailure::Respond(PipelineError::RequestTooLarge {
                        limit: self.limits.max_request_bytes,
                    }));
                }
                log::debug!("[{}] received {} bytes", self.peer, buf.len());
                return Ok(buf);
            }

            if buf.len() >= self.limits.max_request_bytes {
                return Err(ReadFailure::Respond(PipelineError::RequestTooLarge {
                    limit: self.limits.max_request_bytes,
                }));
            }
        }
    }

    /// parse, route and handle. every failure here still becomes a response.
    async fn process(&mut self, raw: Vec<u8>) -> (Option<String>, Result<Response, PipelineError>) {
        self.enter(Phase::Parsing);
        let request = match Request::parse(raw) {
            Ok(request) => request,
            Err(err) => return (None, Err(err.into())),
        };
        let request_line = request.to_string();

        self.enter(Phase::Routing);
        let routes = Arc::clone(&self.routes);
        let (prefix, tag, path) = match routes.resolve(request.uri()) {
            Ok(Route::Handler { prefix, tag, path }) => (prefix, tag, path),
            Ok(Route::Root) => return (Some(request_line), Err(PipelineError::RootNotServed)),
            Err(err) => return (Some(request_line), Err(err)),
        };

        self.enter(Phase::Handling);
        let Some(handler) = self.handlers.get(tag) else {
            return (
                Some(request_line),
                Err(PipelineError::UnsupportedHandler {
                    tag: tag.to_string(),
                }),
            );
        };

        let exchange = Exchange {
            request: &request,
            prefix,
            path,
        };
        let outcome = handler.handle(&exchange).await;
        (Some(request_line), outcome)
    }

    /// write the serialized response and wait for it to be flushed
    async fn write_response(&mut self, response: &Response) -> Result<(), TransportError> {
        let deadline = Instant::now() + self.limits.drain_timeout;
        let bytes = response.to_bytes();

        self.enter(Phase::Writing);
        match timeout_at(deadline, self.stream.write_all(&bytes)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(TransportError::Write(e)),
            Err(_) => return Err(TransportError::DrainTimeout(self.limits.drain_timeout)),
        }

        self.enter(Phase::Draining);
        match timeout_at(deadline, self.stream.flush()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TransportError::Drain(e)),
            Err(_) => Err(TransportError::DrainTimeout(self.limits.drain_timeout)),
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            log::debug!("[{}] shutdown: {}", self.peer, e);
        }
        self.enter(Phase::Closed);
    }
}
