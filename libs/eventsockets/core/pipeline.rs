use crate::traits::*;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered, append-only chain of `EmitMiddleware` stages
#[derive(Default)]
pub struct MiddlewarePipeline {
    stages: RwLock<Vec<Arc<dyn EmitMiddleware>>>,
}

impl MiddlewarePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, stage: Arc<dyn EmitMiddleware>) {
        debug!(stage = stage.name(), "Registered emit middleware");
        self.stages.write().push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.read().is_empty()
    }

    /// Run `emit` through every stage in registration order
    ///
    /// `Ok(None)` means a stage suppressed the emit.
    pub async fn run(&self, emit: Emit) -> Result<Option<Emit>> {
        let stages = self.stages.read().clone();
        let mut emit = emit;

        for stage in stages {
            let flow = match stage.failure_policy() {
                FailurePolicy::Abort => {
                    stage
                        .process(emit)
                        .await
                        .map_err(|e| EventSocketError::Middleware {
                            stage: stage.name().to_string(),
                            reason: e.to_string(),
                        })?
                }
                FailurePolicy::PassThrough => {
                    let input = emit.clone();
                    match stage.process(emit).await {
                        Ok(flow) => flow,
                        Err(e) => {
                            warn!(stage = stage.name(), error = %e, "Middleware failed, emit passed through");
                            Flow::Forward(input)
                        }
                    }
                }
            };

            match flow {
                Flow::Forward(next) => emit = next,
                Flow::Suppress => {
                    debug!(stage = stage.name(), "Emit suppressed by middleware");
                    return Ok(None);
                }
            }
        }

        Ok(Some(emit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct Append(&'static str);

    #[async_trait]
    impl EmitMiddleware for Append {
        async fn process(&self, mut emit: Emit) -> Result<Flow> {
            let mut trail = match emit.payload.take() {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            trail.push(json!(self.0));
            emit.payload = Some(Value::Array(trail));
            Ok(Flow::Forward(emit))
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    struct Broken(FailurePolicy);

    #[async_trait]
    impl EmitMiddleware for Broken {
        async fn process(&self, _emit: Emit) -> Result<Flow> {
            Err(EventSocketError::Codec("boom".into()))
        }

        fn failure_policy(&self) -> FailurePolicy {
            self.0
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    struct Discard;

    #[async_trait]
    impl EmitMiddleware for Discard {
        async fn process(&self, _emit: Emit) -> Result<Flow> {
            Ok(Flow::Suppress)
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_registration_order() {
        let pipeline = MiddlewarePipeline::new();
        pipeline.push(Arc::new(Append("first")));
        pipeline.push(Arc::new(Append("second")));

        let out = pipeline.run(Emit::new("ps", None)).await.unwrap().unwrap();
        assert_eq!(out.payload, Some(json!(["first", "second"])));
    }

    #[tokio::test]
    async fn test_abort_policy_surfaces_stage_name() {
        let pipeline = MiddlewarePipeline::new();
        pipeline.push(Arc::new(Broken(FailurePolicy::Abort)));
        pipeline.push(Arc::new(Append("never")));

        let err = pipeline.run(Emit::new("ps", None)).await.unwrap_err();
        match err {
            EventSocketError::Middleware { stage, reason } => {
                assert_eq!(stage, "broken");
                assert!(reason.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_pass_through_policy_keeps_input() {
        let pipeline = MiddlewarePipeline::new();
        pipeline.push(Arc::new(Append("a")));
        pipeline.push(Arc::new(Broken(FailurePolicy::PassThrough)));
        pipeline.push(Arc::new(Append("b")));

        let out = pipeline.run(Emit::new("ps", None)).await.unwrap().unwrap();
        assert_eq!(out.payload, Some(json!(["a", "b"])));
    }

    #[tokio::test]
    async fn test_suppress_stops_chain() {
        let pipeline = MiddlewarePipeline::new();
        pipeline.push(Arc::new(Discard));
        pipeline.push(Arc::new(Append("never")));

        assert!(pipeline.run(Emit::new("ps", None)).await.unwrap().is_none());
        assert!(MiddlewarePipeline::new().is_empty());
    }
}
