//! Credit-Based Port.
//!
//! The boundary between the surrounding simulation and the engine. Operations
//! are accepted into a bounded request queue and their observations returned
//! through a bounded response queue:
//! 1. **Admission:** `try_send` refuses an operation when either credit pool is
//!    exhausted. A refused operation never reaches the engine.
//! 2. **Service:** `service` hands queued requests to the engine in order.
//! 3. **Completion:** `try_recv` returns the observations in the same order.

use std::collections::VecDeque;

use tracing::trace;

use crate::common::data::{Pc, StoreOp, Tick};
use crate::common::error::PortError;
use crate::config::PortConfig;
use crate::engine::{Environment, Observation, PredictionEngine};
use crate::stats::PredictorStats;

/// Observation returned for one serviced operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreResponse {
    /// Tick of the operation.
    pub tick: Tick,
    /// PC of the operation.
    pub pc: Pc,
    /// Virtual address of the operation.
    pub addr: u64,
    /// What the engine did with it.
    pub observation: Observation,
}

/// Request/response port in front of a [`PredictionEngine`].
#[derive(Debug)]
pub struct PredictorPort {
    engine: PredictionEngine,
    requests: VecDeque<StoreOp>,
    responses: VecDeque<StoreResponse>,
    max_requests: usize,
    max_responses: usize,
    busy: u64,
}

impl PredictorPort {
    /// Wraps `engine`, taking the credit limits from its configuration.
    pub fn new(engine: PredictionEngine) -> Self {
        let PortConfig {
            max_requests,
            max_responses,
        } = engine.config().port.clone();
        Self {
            engine,
            requests: VecDeque::new(),
            responses: VecDeque::new(),
            max_requests,
            max_responses,
            busy: 0,
        }
    }

    /// Queues an operation.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::RequestsExhausted`] if the request queue is full,
    /// or [`PortError::ResponsesExhausted`] if accepting the operation could
    /// produce more responses than the response queue holds. The operation is
    /// not queued in either case.
    pub fn try_send(&mut self, op: StoreOp) -> Result<(), PortError> {
        let outstanding = self.requests.len();
        if outstanding >= self.max_requests {
            self.busy += 1;
            trace!(target: "wpred::port", outstanding, "request credits exhausted");
            return Err(PortError::RequestsExhausted { outstanding });
        }
        let outstanding = self.requests.len() + self.responses.len();
        if outstanding >= self.max_responses {
            self.busy += 1;
            trace!(target: "wpred::port", outstanding, "response credits exhausted");
            return Err(PortError::ResponsesExhausted { outstanding });
        }
        self.requests.push_back(op);
        Ok(())
    }

    /// Hands every queued request to the engine. Returns the number serviced.
    pub fn service<E: Environment + ?Sized>(&mut self, env: &mut E) -> usize {
        let mut serviced = 0;
        while let Some(op) = self.requests.pop_front() {
            let observation = self.engine.observe_store(&op, env);
            self.responses.push_back(StoreResponse {
                tick: op.tick,
                pc: op.pc,
                addr: op.addr.val(),
                observation,
            });
            serviced += 1;
        }
        serviced
    }

    /// Takes the oldest response.
    pub fn try_recv(&mut self) -> Option<StoreResponse> {
        self.responses.pop_front()
    }

    /// Returns the request credits still available.
    pub fn request_credits(&self) -> usize {
        self.max_requests.saturating_sub(self.requests.len())
    }

    /// Returns the response credits still available.
    pub fn response_credits(&self) -> usize {
        self.max_responses
            .saturating_sub(self.requests.len() + self.responses.len())
    }

    /// Returns the number of operations refused so far.
    pub const fn busy_rejections(&self) -> u64 {
        self.busy
    }

    /// Returns the engine.
    pub const fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    /// Returns the engine mutably.
    pub const fn engine_mut(&mut self) -> &mut PredictionEngine {
        &mut self.engine
    }

    /// Unwraps the engine, dropping anything still queued.
    pub fn into_engine(self) -> PredictionEngine {
        self.engine
    }

    /// Returns the engine statistics with the port's rejections added.
    pub fn stats(&self) -> PredictorStats {
        let mut stats = self.engine.stats();
        stats.port_busy_rejections = self.busy;
        stats
    }
}
