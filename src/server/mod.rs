mod http;

pub(crate) use http::HttpServer;
