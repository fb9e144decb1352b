use crate::error::ServerResult;
use crate::http::Request;
use crate::http::Response;
use futures::future::{self, BoxFuture};
use std::future::Future;

pub type HookResult = ServerResult<Response>;

pub type HookFuture = BoxFuture<'static, HookResult>;

/// Values a hook may produce once it has finished.
pub trait IntoHookResult {
    fn into_hook_result(self) -> HookResult;
}

impl IntoHookResult for Response {
    fn into_hook_result(self) -> HookResult {
        Ok(self)
    }
}

impl IntoHookResult for HookResult {
    fn into_hook_result(self) -> HookResult {
        self
    }
}

/// What a hook function returns: either a plain [`Response`] or a future
/// resolving to one (or to a `ServerResult<Response>`). Both are normalized
/// into a [`HookFuture`] so the pipeline treats them identically.
pub trait HookOutput {
    fn into_hook_future(self) -> HookFuture;
}

impl HookOutput for Response {
    fn into_hook_future(self) -> HookFuture {
        Box::pin(future::ready(Ok(self)))
    }
}

impl<F, T> HookOutput for F
where
    F: Future<Output = T> + Send + 'static,
    T: IntoHookResult,
{
    fn into_hook_future(self) -> HookFuture {
        Box::pin(async move { self.await.into_hook_result() })
    }
}

/// A unit of work run at a fixed pipeline phase.
pub trait Hook: Send + Sync + 'static {
    fn call(&self, req: Request, res: Response) -> HookFuture;

    /// Label used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F, R> Hook for F
where
    F: Fn(Request, Response) -> R + Send + Sync + 'static,
    R: HookOutput,
{
    fn call(&self, req: Request, res: Response) -> HookFuture {
        (self)(req, res).into_hook_future()
    }

    fn name(&self) -> &str {
        "fn"
    }
}

/// Hook adapter for synchronous functions that may fail.
///
/// A plain closure returning `ServerResult<Response>` cannot be a [`Hook`]
/// directly since async closures already claim that output shape.
#[derive(Clone)]
pub struct Fallible<F> {
    hook: F,
}

pub fn fallible<F>(hook: F) -> Fallible<F>
where
    F: Fn(Request, Response) -> HookResult + Send + Sync + 'static,
{
    Fallible { hook }
}

impl<F> Hook for Fallible<F>
where
    F: Fn(Request, Response) -> HookResult + Send + Sync + 'static,
{
    fn call(&self, req: Request, res: Response) -> HookFuture {
        Box::pin(future::ready((self.hook)(req, res)))
    }

    fn name(&self) -> &str {
        "fallible"
    }
}
