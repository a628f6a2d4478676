//! Listener lifecycle
//!
//! `start` binds and spawns the accept loop, returning once the socket accepts connections.
//! `stop` stops accepting, lets in-flight calls finish and returns once the transport is closed.

use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
};

use tokio::{net::TcpListener, sync::oneshot, sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info};

use crate::codec::{Decoder, Encoder};
use crate::config::ServerConfig;
use crate::errors::ServerError;
use crate::rpc::{events::Observer, gateway::Gateway, registry::HandlerRegistry};
use crate::{build_app, tls, AppState};

enum Lifecycle {
    Idle,
    /// Shutdown signalled; in-flight requests are still draining.
    Stopping,
    Running {
        local_addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<std::io::Result<()>>,
    },
}

pub struct RpcServer {
    config: ServerConfig,
    gateway: Arc<Gateway>,
    lifecycle: Mutex<Lifecycle>,
}

impl RpcServer {
    pub fn new(config: ServerConfig, registry: HandlerRegistry) -> Self {
        let gateway = Gateway::new(config.credentials(), registry);
        Self::with_gateway(config, gateway)
    }

    /// Serves a prebuilt gateway; use this to attach observers or another codec.
    pub fn with_gateway(config: ServerConfig, gateway: Gateway) -> Self {
        Self {
            config,
            gateway: Arc::new(gateway),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    pub fn builder(config: ServerConfig, registry: HandlerRegistry) -> RpcServerBuilder {
        let gateway = Gateway::new(config.credentials(), registry);
        RpcServerBuilder { config, gateway }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        self.gateway.registry()
    }

    /// Binds, starts serving in the background and returns the bound address.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        match *lifecycle {
            Lifecycle::Running { .. } => return Err(ServerError::AlreadyRunning),
            Lifecycle::Stopping => return Err(ServerError::Stopping),
            Lifecycle::Idle => {}
        }

        self.config.validate()?;
        let acceptor = match (&self.config.tls, self.config.use_tls) {
            (Some(files), true) => Some(tls::load_acceptor(files)?),
            _ => None,
        };

        let listener = bind_listener(&self.config).await?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: format!("{}:{}", self.config.bind_host(), self.config.port),
            source,
        })?;

        let app = build_app(AppState::new(
            self.gateway.clone(),
            self.config.max_body_bytes,
        ));
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let signal = async move {
            let _ = shutdown_rx.await;
        };

        let task = match acceptor {
            Some(acceptor) => {
                let listener = tls::TlsListener::new(listener, acceptor).map_err(|source| {
                    ServerError::Bind {
                        addr: local_addr.to_string(),
                        source,
                    }
                })?;
                tokio::spawn(async move {
                    axum::serve(listener, app)
                        .with_graceful_shutdown(signal)
                        .await
                })
            }
            None => tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(signal)
                    .await
            }),
        };

        info!(
            scheme = self.config.scheme(),
            local_addr = %local_addr,
            methods = self.gateway.registry().len(),
            "rpc server listening"
        );

        *lifecycle = Lifecycle::Running {
            local_addr,
            shutdown,
            task,
        };
        Ok(local_addr)
    }

    /// Stops accepting and waits for in-flight requests to drain.
    ///
    /// The lifecycle lock is released before draining, so `local_addr` and `is_running` answer
    /// immediately while slow handlers finish.
    pub async fn stop(&self) -> Result<(), ServerError> {
        let (local_addr, task) = {
            let mut lifecycle = self.lifecycle.lock().await;
            if !matches!(*lifecycle, Lifecycle::Running { .. }) {
                return Err(ServerError::NotRunning);
            }
            let Lifecycle::Running {
                local_addr,
                shutdown,
                task,
            } = std::mem::replace(&mut *lifecycle, Lifecycle::Stopping)
            else {
                return Err(ServerError::NotRunning);
            };
            let _ = shutdown.send(());
            (local_addr, task)
        };
        info!(local_addr = %local_addr, "rpc server stopping");

        let outcome = task.await;
        *self.lifecycle.lock().await = Lifecycle::Idle;

        match outcome {
            Ok(Ok(())) => {
                info!(local_addr = %local_addr, "rpc server stopped");
                Ok(())
            }
            Ok(Err(err)) => {
                error!(error = %err, "rpc server exited with error");
                Err(ServerError::Serve(err.to_string()))
            }
            Err(err) => {
                error!(error = %err, "rpc server task failed");
                Err(ServerError::Serve(err.to_string()))
            }
        }
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.lifecycle.lock().await {
            Lifecycle::Running { local_addr, .. } => Some(*local_addr),
            Lifecycle::Idle | Lifecycle::Stopping => None,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.local_addr().await.is_some()
    }
}

/// Binds the configured host, or every interface when none is set.
///
/// "Every interface" means `[::]`, which also accepts IPv4 on dual-stack hosts. Hosts without
/// IPv6 fall back to `0.0.0.0`.
async fn bind_listener(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let port = config.port;
    let bind_error = |source| ServerError::Bind {
        addr: format!("{}:{port}", config.bind_host()),
        source,
    };

    if let Some(host) = config.host.as_deref() {
        return TcpListener::bind((host, port)).await.map_err(bind_error);
    }

    match TcpListener::bind((Ipv6Addr::UNSPECIFIED, port)).await {
        Ok(listener) => Ok(listener),
        Err(err) => {
            debug!(error = %err, "ipv6 wildcard bind failed, falling back to ipv4");
            TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
                .await
                .map_err(bind_error)
        }
    }
}

pub struct RpcServerBuilder {
    config: ServerConfig,
    gateway: Gateway,
}

impl RpcServerBuilder {
    pub fn codec<C>(mut self, codec: C) -> Self
    where
        C: Decoder + Encoder,
    {
        self.gateway = self.gateway.with_codec(codec);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.gateway = self.gateway.with_observer(observer);
        self
    }

    pub fn build(self) -> RpcServer {
        RpcServer::with_gateway(self.config, self.gateway)
    }
}
