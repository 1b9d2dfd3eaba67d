//! accept loop: one task per connection, sharing the route table and
//! handler registry read-only

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::connection::{Connection, Limits};
use crate::handlers::HandlerRegistry;
use crate::router::RouteTable;

/// pause after a failed accept before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    routes: Arc<RouteTable>,
    handlers: Arc<HandlerRegistry>,
    limits: Limits,
    max_connections: Option<usize>,
}

impl Server {
    pub fn new(routes: RouteTable, handlers: HandlerRegistry, limits: Limits) -> Self {
        Self {
            routes: Arc::new(routes),
            handlers: Arc::new(handlers),
            limits,
            max_connections: None,
        }
    }

    /// cap on connections handled at once; further accepts wait for a slot
    pub fn with_max_connections(mut self, max: Option<usize>) -> Self {
        self.max_connections = max;
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// accept connections until `shutdown` resolves, then wait for the ones
    /// already in flight to finish
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let slots = self.max_connections.map(|n| Arc::new(Semaphore::new(n)));
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        log::info!("accepting connections on {}", listener.local_addr()?);

        loop {
            let permit = match &slots {
                Some(slots) => tokio::select! {
                    _ = &mut shutdown => break,
                    permit = Arc::clone(slots).acquire_owned() => match permit {
                        Ok(permit) => Some(permit),
                        Err(_) => break,
                    },
                },
                None => None,
            };

            tokio::select! {
                _ = &mut shutdown => break,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        log::error!("connection task failed: {}", e);
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        log::debug!("accepted connection from {}", addr);
                        let conn = Connection::new(
                            stream,
                            addr.to_string(),
                            Arc::clone(&self.routes),
                            Arc::clone(&self.handlers),
                            self.limits,
                        );
                        tasks.spawn(async move {
                            // failures are logged inside; one connection never
                            // affects another
                            let _ = conn.run().await;
                            drop(permit);
                        });
                    }
                    Err(e) => {
                        // fd exhaustion must not spin the loop
                        log::warn!("accept failed: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        log::info!("shutting down, waiting for {} connection(s)", tasks.len());
        while tasks.join_next().await.is_some() {}
        Ok(())
    }
}
