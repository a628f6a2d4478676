//! Method-name to handler mapping
//!
//! The registry is a shared handle: clones see the same map, so an application can keep one
//! and register methods while the server is already serving.

use std::{collections::HashMap, future::Future, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::codec::Fault;
use crate::errors::RegistryError;

pub type HandlerResult = Result<Value, Fault>;

#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, method: &str, params: Vec<Value>) -> HandlerResult;
}

/// Adapts `Fn(params) -> Future` closures.
pub struct FnHandler<F> {
    func: F,
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, _method: &str, params: Vec<Value>) -> HandlerResult {
        (self.func)(params).await
    }
}

/// One-shot completion handed to callback-style handlers.
///
/// Every method consumes `self`, so a handler can complete a call at most once.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<HandlerResult>,
}

impl Completion {
    pub fn complete(self, outcome: HandlerResult) {
        // The receiver is gone only if the client disconnected mid-call.
        let _ = self.tx.send(outcome);
    }

    pub fn succeed(self, value: Value) {
        self.complete(Ok(value));
    }

    pub fn fail(self, fault: Fault) {
        self.complete(Err(fault));
    }
}

/// Adapts handlers written against a completion callback rather than a future.
pub struct CallbackHandler<F> {
    func: F,
}

#[async_trait]
impl<F> Handler for CallbackHandler<F>
where
    F: Fn(&str, Vec<Value>, Completion) + Send + Sync + 'static,
{
    async fn call(&self, method: &str, params: Vec<Value>) -> HandlerResult {
        let (tx, rx) = oneshot::channel();
        (self.func)(method, params, Completion { tx });
        rx.await
            .unwrap_or_else(|_| Err(Fault::internal("handler dropped its completion")))
    }
}

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<RwLock<HashMap<String, Arc<dyn Handler>>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler. Names are case-sensitive and must be unique.
    pub fn register<H>(&self, method: impl Into<String>, handler: H) -> Result<(), RegistryError>
    where
        H: Handler,
    {
        let method = method.into();
        let mut handlers = self.handlers.write();
        if handlers.contains_key(&method) {
            return Err(RegistryError::DuplicateMethod(method));
        }
        handlers.insert(method, Arc::new(handler));
        Ok(())
    }

    pub fn register_fn<F, Fut>(
        &self,
        method: impl Into<String>,
        func: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(method, FnHandler { func })
    }

    pub fn register_callback<F>(
        &self,
        method: impl Into<String>,
        func: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&str, Vec<Value>, Completion) + Send + Sync + 'static,
    {
        self.register(method, CallbackHandler { func })
    }

    /// Installs `handler`, returning whatever was registered under the name before.
    pub fn replace<H>(&self, method: impl Into<String>, handler: H) -> Option<Arc<dyn Handler>>
    where
        H: Handler,
    {
        self.handlers.write().insert(method.into(), Arc::new(handler))
    }

    pub fn lookup(&self, method: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.read().get(method).cloned()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.read().contains_key(method)
    }

    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("methods", &self.method_names())
            .finish()
    }
}
