use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use futures::Future;
use futures::FutureExt;

use crate::{error::CrashId, AppError, AppResult};

pub const PANIC_CODE: &str = "RUNTIME/PANIC";

fn panic_payload(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn app_error_from_panic(payload: Box<dyn Any + Send>) -> AppError {
    let detail = panic_payload(payload.as_ref());
    let crash_id = CrashId::new();

    let mut error = AppError::new(
        PANIC_CODE,
        format!("Something went wrong. Crash ID: {crash_id}."),
    )
    .with_context("panic", detail);
    error.set_crash_id(crash_id);
    error.log_with_event("panic_caught");
    error
}

#[allow(clippy::result_large_err)]
pub fn dispatch_with_fence<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => Ok(result),
        Err(payload) => Err(app_error_from_panic(payload)),
    }
}

#[allow(clippy::result_large_err)]
pub async fn dispatch_async_with_fence<F, Fut, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let fut = dispatch_with_fence(|| AssertUnwindSafe(f()).catch_unwind())?;
    match fut.await {
        Ok(value) => Ok(value),
        Err(payload) => Err(app_error_from_panic(payload)),
    }
}

#[allow(clippy::result_large_err)]
pub async fn dispatch_async_app_result<F, Fut, T>(f: F) -> AppResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    dispatch_async_with_fence(f).await?
}
