use actix_web::{
    error::PayloadError,
    http::{header, Method},
    web, HttpRequest, HttpResponse, ResponseError as _,
};
use futures::StreamExt as _;

use crate::{
    github::PushEvent,
    http::HookError,
    registry::{Registry, Routing, Target},
    runner::{self, CommandError, Invocation},
    signature::{self, SIGNATURE_HEADER},
};

/// Pushes to any other branch are acknowledged but don't run anything.
pub const TRIGGER_BRANCH: &str = "master";

const EVENT_HEADER: &str = "X-GitHub-Event";

pub async fn push_hook(
    req: HttpRequest,
    mut payload: web::Payload,
    registry: web::Data<Registry>,
) -> Result<HttpResponse, HookError> {
    match dispatch(&req, &mut payload, &registry).await {
        Ok(body) => Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(body)),
        Err(err) => {
            if err.status_code().is_server_error() {
                tracing::error!(path = req.path(), "{}", err);
            } else {
                tracing::warn!(path = req.path(), "{}", err);
            }
            if let HookError::Command(CommandError::Failed { output, .. }) = &err {
                tracing::error!(output = output.as_str(), "Hook command output");
            }
            Err(err)
        }
    }
}

async fn dispatch(
    req: &HttpRequest,
    payload: &mut web::Payload,
    registry: &Registry,
) -> Result<&'static str, HookError> {
    if req.method() != Method::POST {
        return Err(HookError::MethodNotAllowed(req.method().clone()));
    }

    let routed = match registry.routing() {
        Routing::Repository => {
            let event = header_str(req, EVENT_HEADER).unwrap_or_default();
            if event != "push" {
                return Err(HookError::UnsupportedEvent(event.to_owned()));
            }
            None
        }
        Routing::Path => Some(
            registry
                .lookup_path(req)
                .ok_or_else(|| HookError::UnknownTarget(req.path().to_owned()))?,
        ),
    };

    let content_type = header_str(req, header::CONTENT_TYPE.as_str()).unwrap_or_default();
    if !content_type.contains("json") {
        return Err(HookError::NotJson(content_type.to_owned()));
    }

    let body = read_body(payload).await?;

    let (target, parsed) = match routed {
        Some(target) => (target, None),
        None => {
            let event: PushEvent = serde_json::from_slice(&body)?;
            let key = event.repository.full_name();
            let target = registry
                .lookup(&key)
                .ok_or(HookError::UnknownTarget(key))?;
            (target, Some(event))
        }
    };

    signature::authorized(&target.secret, &body, header_str(req, SIGNATURE_HEADER))?;

    let event = match parsed {
        Some(event) => event,
        None => serde_json::from_slice(&body)?,
    };

    if event.branch() != TRIGGER_BRANCH {
        tracing::info!(
            hook = target.id.as_str(),
            "Skipping command, `{}` is not the {} branch",
            event.reference,
            TRIGGER_BRANCH,
        );
        return Ok("Skipped");
    }

    runner::execute(invocation(target, &event)).await?;
    Ok("OK")
}

fn invocation(target: &Target, event: &PushEvent) -> Invocation {
    Invocation {
        target: target.id.clone(),
        workdir: target.command.workdir.clone(),
        exec: target.command.exec.clone(),
        args: event.command_args(),
    }
}

fn header_str<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|value| value.to_str().ok())
}

async fn read_body(payload: &mut web::Payload) -> Result<web::BytesMut, PayloadError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        body.extend_from_slice(&chunk?);
    }
    Ok(body)
}
