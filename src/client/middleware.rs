// File: ./src/client/middleware.rs
//! Tower middleware stamping every backend request with the client's
//! identity and the JSON content negotiation headers.
use http::{HeaderValue, Request, header};
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

#[derive(Clone, Debug)]
pub struct ApiHeadersLayer {
    pub user_agent: String,
}

impl ApiHeadersLayer {
    pub fn new(user_agent: String) -> Self {
        Self { user_agent }
    }

    pub fn default_user_agent() -> String {
        format!("moodjournal/{}", env!("CARGO_PKG_VERSION"))
    }
}

impl<S> Layer<S> for ApiHeadersLayer {
    type Service = ApiHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiHeadersService {
            inner,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiHeadersService<S> {
    inner: S,
    user_agent: String,
}

impl<S, ReqBody> Service<Request<ReqBody>> for ApiHeadersService<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let headers = req.headers_mut();
        if let Ok(val) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(header::USER_AGENT, val);
        }
        let json = HeaderValue::from_static("application/json");
        headers.entry(header::ACCEPT).or_insert(json.clone());
        headers.entry(header::CONTENT_TYPE).or_insert(json);
        self.inner.call(req)
    }
}
