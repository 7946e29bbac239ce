use std::sync::Arc;
use std::time::Duration;

use failsafe::backoff::Exponential;
use failsafe::failure_policy::{consecutive_failures, ConsecutiveFailures};
use failsafe::futures::CircuitBreaker;
pub use failsafe::FailurePredicate;
use failsafe::{backoff, Config, StateMachine};
use futures_core::TryFuture;

pub type Error<E> = failsafe::Error<E>;
type FailurePolicy = ConsecutiveFailures<Exponential>;

/// Consecutive failures opening the circuit of an endpoint
const CONSECUTIVE_FAILURES: u32 = 3;
const MIN_BACKOFF: Duration = Duration::from_secs(10);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

struct Endpoint<T> {
    value: Arc<T>,
    state_machine: StateMachine<FailurePolicy, ()>,
}

impl<T> Clone for Endpoint<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            state_machine: self.state_machine.clone(),
        }
    }
}

impl<E, T: FailurePredicate<E>> FailurePredicate<E> for &Endpoint<T> {
    fn is_err(&self, err: &E) -> bool {
        self.value.is_err(err)
    }
}

impl<T> Endpoint<T> {
    fn new(value: T) -> Self {
        let backoff = backoff::exponential(MIN_BACKOFF, MAX_BACKOFF);

        Self {
            value: value.into(),
            state_machine: Config::new()
                .failure_policy(consecutive_failures(CONSECUTIVE_FAILURES, backoff))
                .build(),
        }
    }

    async fn call<F>(&self, f: impl FnOnce(Arc<T>) -> F) -> Result<F::Ok, Error<F::Error>>
    where
        F: TryFuture,
        T: FailurePredicate<F::Error>,
    {
        self.state_machine.call_with(self, f(self.value.clone())).await
    }

    fn is_call_permitted(&self) -> bool {
        self.state_machine.is_call_permitted()
    }
}

/// Ordered list of interchangeable endpoints, each one guarded by its own circuit breaker.
/// Clones share the breakers' state.
#[derive(Clone)]
pub struct WithFallback<T> {
    endpoints: Vec<Endpoint<T>>,
}

impl<T> Default for WithFallback<T> {
    fn default() -> Self {
        Self { endpoints: vec![] }
    }
}

impl<T> WithFallback<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, alternative: T) -> Self {
        self.endpoints.push(Endpoint::new(alternative));
        self
    }

    /// Runs `f` on the first endpoint whose circuit is closed and returns its result,
    /// whether it succeeds or not. Returns [`Error::Rejected`] when every circuit is open.
    pub async fn call<F>(&self, f: impl FnOnce(Arc<T>) -> F) -> Result<F::Ok, Error<F::Error>>
    where
        F: TryFuture,
        T: FailurePredicate<F::Error>,
    {
        for endpoint in self.endpoints.iter() {
            if endpoint.is_call_permitted() {
                return endpoint.call(f).await;
            }
        }

        Err(Error::Rejected)
    }
}
