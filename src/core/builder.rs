use std::marker::PhantomData;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{orchestrator::Orchestrator, Config};
use crate::subscribers::Subscribe;

/// Builder for an [`Orchestrator`] with subscribers or an external cancel signal.
pub struct OrchestratorBuilder<T> {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    parent: Option<CancellationToken>,
    _value: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> OrchestratorBuilder<T> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            parent: None,
            _value: PhantomData,
        }
    }

    /// Sets event subscribers (replaces any added before).
    ///
    /// Each one gets a dedicated worker and a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a single subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Links the run to an outer cancel signal.
    ///
    /// The orchestrator works on a child of `parent`: cancelling `parent` stops
    /// the run, while a deadline or signal inside the run leaves `parent` untouched.
    pub fn with_cancel_token(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> Orchestrator<T> {
        let token = match self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        Orchestrator::from_parts(self.cfg, self.subscribers, token)
    }
}
