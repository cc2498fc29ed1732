use crate::cluster::{ClusterClients, Command, LogSnapshot};
use crate::router::{NodeLogResult, Router, SubmitEntryError, SubmitEntryOutput};
use bytes::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

const APPEND_PATH: &str = "/append";
const PUSH_PATH: &str = "/push";
const LOG_PATH: &str = "/log";

/// HttpServer is the caller-facing surface: `POST /append` writes a command through the router,
/// `GET /log` streams every node's log.
pub(crate) struct HttpServer<C: ClusterClients> {
    logger: slog::Logger,
    router: Arc<Router<C>>,
}

impl<C: ClusterClients> HttpServer<C> {
    pub(crate) fn new(logger: slog::Logger, router: Arc<Router<C>>) -> Self {
        HttpServer { logger, router }
    }

    /// `try_bind()` binds the listener now, so a taken port is reported to the caller, and
    /// returns the future that serves until `shutdown_signal` fires.
    pub(crate) fn try_bind<F>(
        self,
        addr: SocketAddr,
        shutdown_signal: F,
    ) -> Result<(SocketAddr, impl Future<Output = ()>), hyper::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let logger = self.logger.clone();
        let router = self.router;

        let make_service = make_service_fn(move |_conn: &AddrStream| {
            let logger = logger.clone();
            let router = router.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |request| {
                    Self::route(logger.clone(), router.clone(), request)
                }))
            }
        });

        let server = Server::try_bind(&addr)?.serve(make_service);
        let local_addr = server.local_addr();
        let logger = self.logger;
        slog::info!(logger, "Listening on '{:?}'", local_addr);

        let serve = async move {
            let result = server.with_graceful_shutdown(shutdown_signal).await;
            slog::info!(logger, "Server run() has exited: {:?}", result);
        };

        Ok((local_addr, serve))
    }

    async fn route(
        logger: slog::Logger,
        router: Arc<Router<C>>,
        request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        slog::debug!(logger, "ServerWire - {} {}", request.method(), request.uri());

        let response = match (request.method(), request.uri().path()) {
            (&Method::POST, APPEND_PATH) | (&Method::POST, PUSH_PATH) => Self::handle_append(&router, request).await,
            (&Method::GET, LOG_PATH) => Self::handle_log(&logger, &router),
            (_, APPEND_PATH) | (_, PUSH_PATH) | (_, LOG_PATH) => {
                plain_response(StatusCode::METHOD_NOT_ALLOWED, "not allowed")
            }
            _ => plain_response(StatusCode::NOT_FOUND, "not found"),
        };

        slog::debug!(logger, "ServerWire - {}", response.status());
        Ok(response)
    }

    async fn handle_append(router: &Router<C>, request: Request<Body>) -> Response<Body> {
        let body = match hyper::body::to_bytes(request.into_body()).await {
            Ok(body) => body,
            Err(e) => return plain_response(StatusCode::BAD_REQUEST, e.to_string()),
        };

        // Malformed input never reaches the router, so it can't disturb the leader guess.
        let command: Command = match serde_json::from_slice(&body) {
            Ok(command) => command,
            Err(e) => return plain_response(StatusCode::BAD_REQUEST, e.to_string()),
        };

        write_outcome_response(router.submit_entry(&command).await)
    }

    fn handle_log(logger: &slog::Logger, router: &Router<C>) -> Response<Body> {
        let (mut sender, body) = Body::channel();
        let mut fan_out = router.fan_out_read();
        let logger = logger.clone();

        tokio::spawn(async move {
            while let Some(node_result) = fan_out.next().await {
                let line = render_log_line(&node_result);
                if sender.send_data(Bytes::from(line)).await.is_err() {
                    slog::debug!(logger, "Reader hung up before the fan-out read finished");
                    break;
                }
            }
        });

        let mut response = Response::new(body);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/x-ndjson"));
        response
    }
}

fn write_outcome_response(outcome: Result<SubmitEntryOutput, SubmitEntryError>) -> Response<Body> {
    match outcome {
        Ok(_) => plain_response(StatusCode::OK, "true"),
        Err(SubmitEntryError::AttemptsExhausted { .. }) => plain_response(StatusCode::OK, "false"),
        Err(e @ SubmitEntryError::DeadlineExceeded { .. }) => {
            plain_response(StatusCode::GATEWAY_TIMEOUT, e.to_string())
        }
        Err(e @ SubmitEntryError::Node { .. }) => plain_response(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

#[derive(serde::Serialize)]
struct LogLine<'a> {
    node_id: usize,
    #[serde(flatten)]
    snapshot: &'a LogSnapshot,
}

/// `render_log_line()` renders one node's read result as a single newline-terminated line.
fn render_log_line(node_result: &NodeLogResult) -> String {
    let node_id = node_result.node_id;
    let rendered = match &node_result.result {
        Ok(snapshot) => serde_json::to_string(&LogLine {
            node_id: node_id.as_usize(),
            snapshot,
        })
        .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    match rendered {
        Ok(json) => format!("{}\n", json),
        Err(message) => format!("node {}: {}\n", node_id, message),
    }
}

fn plain_response<T: Into<Body>>(status: StatusCode, body: T) -> Response<Body> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
}
