use crate::api::options::ProxyOptionsValidated;
use crate::api::{ClusterMember, ProxyConfig};
use crate::cluster::{ClusterClients, ConnectReport, GrpcClusterClients};
use crate::router::Router;
use crate::server::HttpServer;
use std::convert::TryFrom;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum ProxyCreationError {
    #[error("Cluster must have at least one member")]
    EmptyCluster,
    #[error("Illegal options for configuring proxy: {0}")]
    IllegalProxyOptions(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyServeError {
    #[error("Failed to bind listener: {0}")]
    Bind(#[from] hyper::Error),
}

/// `try_create_proxy()` builds the proxy and connects to every cluster member. Members that can't
/// be reached are reported in `Proxy::connect_report()` but don't fail creation.
pub async fn try_create_proxy(config: ProxyConfig) -> Result<Proxy, ProxyCreationError> {
    let root_logger = config.info_logger;

    if config.cluster_members.is_empty() {
        return Err(ProxyCreationError::EmptyCluster);
    }

    let options = ProxyOptionsValidated::try_from(config.options)
        .map_err(|e| ProxyCreationError::IllegalProxyOptions(e.to_string()))?;

    let node_addrs = config.cluster_members.iter().map(ClusterMember::rpc_addr).collect();
    let clients = GrpcClusterClients::new(root_logger.clone(), node_addrs, options.connect_timeout);
    let router = Router::new(root_logger.clone(), clients, options.router_config());

    let connect_report = router.connect_all().await;

    Ok(Proxy {
        logger: root_logger,
        listen_addr: config.listen_addr,
        router: Arc::new(router),
        connect_report,
    })
}

pub struct Proxy {
    logger: slog::Logger,
    listen_addr: SocketAddr,
    router: Arc<Router<GrpcClusterClients>>,
    connect_report: ConnectReport,
}

impl Proxy {
    pub fn connect_report(&self) -> &ConnectReport {
        &self.connect_report
    }

    /// `serve()` binds the listener and starts serving in the background. Must be called from
    /// within a tokio runtime.
    pub fn serve(self) -> Result<ProxyHandle, ProxyServeError> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let shutdown_signal = async move {
            // Sent or dropped, either way the listener stops.
            let _ = shutdown_rx.await;
        };

        let http_server = HttpServer::new(self.logger.clone(), self.router.clone());
        let (local_addr, serve) = http_server.try_bind(self.listen_addr, shutdown_signal)?;
        let server_task = tokio::spawn(serve);

        Ok(ProxyHandle {
            logger: self.logger,
            local_addr,
            router: self.router,
            shutdown_tx,
            server_task,
        })
    }
}

pub struct ProxyHandle {
    logger: slog::Logger,
    local_addr: SocketAddr,
    router: Arc<Router<GrpcClusterClients>>,
    shutdown_tx: oneshot::Sender<()>,
    server_task: JoinHandle<()>,
}

impl ProxyHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `shutdown()` closes every cluster client, then stops the listener and waits for it.
    pub async fn shutdown(self) {
        stop_in_order(&self.logger, &self.router, self.shutdown_tx, self.server_task).await;
    }
}

async fn stop_in_order<C: ClusterClients>(
    logger: &slog::Logger,
    router: &Router<C>,
    shutdown_tx: oneshot::Sender<()>,
    server_task: JoinHandle<()>,
) {
    // Clients go first: anything still in flight fails fast instead of reaching a node.
    router.close_all().await;

    let _ = shutdown_tx.send(());
    if let Err(e) = server_task.await {
        slog::error!(logger, "HTTP server task failed: {:?}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ProxyOptions;
    use crate::cluster::ScriptedClusterClients;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn clients_close_before_listener_stops() {
        // -- setup --
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let options = ProxyOptionsValidated::try_from(ProxyOptions::default()).unwrap();
        let router = Arc::new(Router::new(
            logger.clone(),
            ScriptedClusterClients::new(3),
            options.router_config(),
        ));

        // Records how many times the clients were closed at the moment the listener is told to stop.
        let closes_at_signal = Arc::new(AtomicUsize::new(usize::MAX));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let shutdown_signal = {
            let router = router.clone();
            let closes_at_signal = closes_at_signal.clone();
            async move {
                let _ = shutdown_rx.await;
                closes_at_signal.store(router.clients().num_closes(), Ordering::SeqCst);
            }
        };

        let http_server = HttpServer::new(logger.clone(), router.clone());
        let (local_addr, serve) = http_server
            .try_bind("127.0.0.1:0".parse().unwrap(), shutdown_signal)
            .unwrap();
        let server_task = tokio::spawn(serve);
        assert!(TcpStream::connect(local_addr).await.is_ok());

        // -- execute --
        stop_in_order(&logger, &router, shutdown_tx, server_task).await;

        // -- verify --
        assert_eq!(1, closes_at_signal.load(Ordering::SeqCst));
        assert_eq!(1, router.clients().num_closes());
        assert!(TcpStream::connect(local_addr).await.is_err());
    }
}
