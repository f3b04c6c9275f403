use crate::traits::ack::Ack;
use crate::traits::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// An outbound event on its way through the middleware chain
///
/// `payload: None` means the event is sent without data.
#[derive(Debug, Clone)]
pub struct Emit {
    pub event: String,
    pub payload: Option<Value>,
    pub ack: Option<Ack>,
}

impl Emit {
    pub fn new(event: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            event: event.into(),
            payload,
            ack: None,
        }
    }

    pub fn with_ack(mut self, ack: Ack) -> Self {
        self.ack = Some(ack);
        self
    }
}

/// What a middleware stage decided
#[derive(Debug, Clone)]
pub enum Flow {
    /// Hand this emit to the next stage (or the transport)
    Forward(Emit),
    /// Drop the emit; nothing is sent and `emit` returns `Ok`
    Suppress,
}

/// How a failing stage affects the emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// The error is returned from `emit` as `EventSocketError::Middleware`
    #[default]
    Abort,
    /// The error is logged and the stage's input continues unchanged
    PassThrough,
}

/// A stage in the outbound emit chain
///
/// Stages run in registration order inside the emitting task. Each stage
/// sees the emit produced by the previous one.
#[async_trait]
pub trait EmitMiddleware: Send + Sync {
    async fn process(&self, emit: Emit) -> Result<Flow>;

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Abort
    }

    /// Name used in logs and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
