#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCommand {
    #[prost(string, tag = "1")]
    pub op: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub key: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub value: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoSubmitEntryReq {
    #[prost(message, optional, tag = "1")]
    pub command: ::core::option::Option<ProtoCommand>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoSubmitEntryResult {
    #[prost(bool, tag = "1")]
    pub success: bool,
    /// Index of the node the responder believes is leader. Negative when it knows
    /// of no leader (e.g. an election is in progress).
    #[prost(int32, tag = "2")]
    pub leader_id: i32,
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFetchLogReq {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLogEntry {
    #[prost(uint64, tag = "1")]
    pub term: u64,
    #[prost(uint64, tag = "2")]
    pub index: u64,
    #[prost(message, optional, tag = "3")]
    pub command: ::core::option::Option<ProtoCommand>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFetchLogResult {
    #[prost(message, repeated, tag = "1")]
    pub entries: ::prost::alloc::vec::Vec<ProtoLogEntry>,
}
#[doc = r" Generated client implementations."]
pub mod grpc_cluster_node_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = " The narrow surface every cluster node exposes to the proxy. Consensus itself"]
    #[doc = " (election, replication, commit) lives entirely behind it."]
    pub struct GrpcClusterNodeClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcClusterNodeClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcClusterNodeClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        #[doc = " Ask the node to replicate a command. Only the leader can accept it; any"]
        #[doc = " other node answers `success = false` and names who it thinks the leader is."]
        pub async fn submit_entry(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoSubmitEntryReq>,
        ) -> Result<tonic::Response<super::ProtoSubmitEntryResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcClusterNode/SubmitEntry");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Return the node's locally visible log."]
        pub async fn fetch_log(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoFetchLogReq>,
        ) -> Result<tonic::Response<super::ProtoFetchLogResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcClusterNode/FetchLog");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcClusterNodeClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcClusterNodeClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcClusterNodeClient {{ ... }}")
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_cluster_node_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcClusterNodeServer."]
    #[async_trait]
    pub trait GrpcClusterNode: Send + Sync + 'static {
        #[doc = " Ask the node to replicate a command. Only the leader can accept it; any"]
        #[doc = " other node answers `success = false` and names who it thinks the leader is."]
        async fn submit_entry(
            &self,
            request: tonic::Request<super::ProtoSubmitEntryReq>,
        ) -> Result<tonic::Response<super::ProtoSubmitEntryResult>, tonic::Status>;
        #[doc = " Return the node's locally visible log."]
        async fn fetch_log(
            &self,
            request: tonic::Request<super::ProtoFetchLogReq>,
        ) -> Result<tonic::Response<super::ProtoFetchLogResult>, tonic::Status>;
    }
    #[doc = " The narrow surface every cluster node exposes to the proxy. Consensus itself"]
    #[doc = " (election, replication, commit) lives entirely behind it."]
    #[derive(Debug)]
    pub struct GrpcClusterNodeServer<T: GrpcClusterNode> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcClusterNode> GrpcClusterNodeServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for GrpcClusterNodeServer<T>
    where
        T: GrpcClusterNode,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/cluster.GrpcClusterNode/SubmitEntry" => {
                    #[allow(non_camel_case_types)]
                    struct SubmitEntrySvc<T: GrpcClusterNode>(pub Arc<T>);
                    impl<T: GrpcClusterNode> tonic::server::UnaryService<super::ProtoSubmitEntryReq>
                        for SubmitEntrySvc<T>
                    {
                        type Response = super::ProtoSubmitEntryResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoSubmitEntryReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).submit_entry(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = SubmitEntrySvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcClusterNode/FetchLog" => {
                    #[allow(non_camel_case_types)]
                    struct FetchLogSvc<T: GrpcClusterNode>(pub Arc<T>);
                    impl<T: GrpcClusterNode> tonic::server::UnaryService<super::ProtoFetchLogReq> for FetchLogSvc<T> {
                        type Response = super::ProtoFetchLogResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoFetchLogReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).fetch_log(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = FetchLogSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcClusterNode> Clone for GrpcClusterNodeServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcClusterNode> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcClusterNode> tonic::transport::NamedService for GrpcClusterNodeServer<T> {
        const NAME: &'static str = "cluster.GrpcClusterNode";
    }
}
