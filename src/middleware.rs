use std::{
    any::Any,
    panic::AssertUnwindSafe,
    task::{Context, Poll},
    time::Instant,
};

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorInternalServerError,
    Error,
};
use futures::future::{ok, FutureExt as _, LocalBoxFuture, Ready};

/// Logs every request with its status and latency, and turns a panicking
/// handler into a `500 Internal Server Error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Observe;

impl<S, B> Transform<S> for Observe
where
    S: Service<Request = ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Request = ServiceRequest;
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ObserveMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ObserveMiddleware { service })
    }
}

#[derive(Debug)]
pub struct ObserveMiddleware<S> {
    service: S,
}

impl<S, B> Service for ObserveMiddleware<S>
where
    S: Service<Request = ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Request = ServiceRequest;
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().clone();
        let uri = req.uri().clone();

        let service = &mut self.service;
        let fut = std::panic::catch_unwind(AssertUnwindSafe(move || service.call(req)));

        Box::pin(async move {
            let res = match fut {
                Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
                Err(panic) => Err(panic),
            };
            let res = match res {
                Ok(res) => res,
                Err(panic) => {
                    tracing::error!(
                        method = method.as_str(),
                        uri = %uri,
                        "Caught panic during handler: {}",
                        panic_message(&*panic),
                    );
                    Err(ErrorInternalServerError("Internal Server Error"))
                }
            };

            let elapsed = started.elapsed();
            let status = match &res {
                Ok(resp) => resp.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            tracing::info!(
                status = status.as_u16(),
                method = method.as_str(),
                uri = %uri,
                elapsed = ?elapsed,
                "{} - {} {} in {:?}",
                status.as_u16(),
                method,
                uri,
                elapsed,
            );
            res
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}
