//! Notification hook for call outcomes
//!
//! Observers are told about calls; they never take part in routing them.

use std::sync::Arc;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallEventKind {
    Forbidden,
    NotFound,
    Dispatched,
}

impl CallEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forbidden => "Forbidden",
            Self::NotFound => "NotFound",
            Self::Dispatched => "Dispatched",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CallEvent<'a> {
    pub kind: CallEventKind,
    pub method: &'a str,
    pub params: &'a [Value],
}

pub trait Observer: Send + Sync + 'static {
    fn on_event(&self, event: &CallEvent<'_>);
}

impl<F> Observer for F
where
    F: Fn(&CallEvent<'_>) + Send + Sync + 'static,
{
    fn on_event(&self, event: &CallEvent<'_>) {
        self(event)
    }
}

/// Observers in attachment order.
#[derive(Clone, Default)]
pub struct Observers {
    inner: Vec<Arc<dyn Observer>>,
}

impl Observers {
    pub fn push(&mut self, observer: Arc<dyn Observer>) {
        self.inner.push(observer);
    }

    pub fn notify(&self, kind: CallEventKind, method: &str, params: &[Value]) {
        let event = CallEvent {
            kind,
            method,
            params,
        };
        for observer in &self.inner {
            observer.on_event(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
