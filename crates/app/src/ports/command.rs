//! Command port: the actuation surface of the host platform.

use std::future::Future;
use std::sync::Arc;

use tidyhub_domain::command::Command;
use tidyhub_domain::error::ActuationError;

/// Accepts `(domain, action, payload)` requests and reports success or failure.
pub trait CommandInvoker: Send + Sync {
    /// Run one command, returning once the target acknowledged it.
    fn invoke(&self, command: Command) -> impl Future<Output = Result<(), ActuationError>> + Send;
}

impl<T: CommandInvoker + ?Sized> CommandInvoker for Arc<T> {
    fn invoke(&self, command: Command) -> impl Future<Output = Result<(), ActuationError>> + Send {
        (**self).invoke(command)
    }
}
