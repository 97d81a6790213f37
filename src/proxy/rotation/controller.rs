//! Rotation and retry controller
//!
//! Drives one request through the pool: select a proxy, execute, classify,
//! then retry on the same proxy, fail over to the next one, or finish.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::RetryPolicy;
use crate::error::{Result, RotaError};
use crate::models::ProxyEndpoint;
use crate::proxy::classify::{classify, Classification};
use crate::proxy::log_hook::{LogHook, LogLevel, NO_PROXY};
use crate::proxy::pool::ProxyPool;
use crate::proxy::transport::{Transport, TransportError, TransportResponse};
use crate::request::Request;
use crate::response::ProxyResponse;

/// Outcome of one transport call after classification
enum Attempt {
    Done(TransportResponse),
    Retry(TransportError),
    Failover(TransportError),
}

pub struct RotationController {
    pool: Arc<ProxyPool>,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    timeout: Duration,
    log_hook: Arc<dyn LogHook>,
}

impl RotationController {
    pub fn new(
        pool: Arc<ProxyPool>,
        transport: Arc<dyn Transport>,
        policy: RetryPolicy,
        timeout: Duration,
        log_hook: Arc<dyn LogHook>,
    ) -> Self {
        Self {
            pool,
            transport,
            policy,
            timeout,
            log_hook,
        }
    }

    pub fn pool(&self) -> &Arc<ProxyPool> {
        &self.pool
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send a request, rotating through the pool, until it succeeds, the pool
    /// runs dry, or `cancel` fires
    #[instrument(skip_all, fields(method = %request.method(), url = %request.url()))]
    pub async fn send(
        &self,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse> {
        let start = Instant::now();
        let result = if self.pool.is_empty() {
            self.send_direct(request, cancel).await
        } else {
            self.send_rotating(request, cancel).await
        };

        match &result {
            Ok(response) => debug!(
                "{} {} - {} in {:?}",
                request.method(),
                request.url(),
                response.status(),
                start.elapsed()
            ),
            Err(RotaError::Cancelled) => info!("Request cancelled after {:?}", start.elapsed()),
            Err(e) => error!("Request failed after {:?}: {}", start.elapsed(), e),
        }
        result
    }

    async fn send_rotating(
        &self,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse> {
        let mut attempts: u32 = 0;
        let mut last_error: Option<TransportError> = None;

        while let Some((index, proxy)) = self.pool.select_next() {
            let descriptor = proxy.masked_url();
            debug!("Selected proxy {} (index {})", descriptor, index);

            let mut proxy_attempt: u32 = 0;
            loop {
                proxy_attempt += 1;
                attempts += 1;

                let failure = match self.attempt(request, Some(&proxy), cancel).await? {
                    Attempt::Done(response) => {
                        info!("Request successful through {}", descriptor);
                        self.emit(
                            LogLevel::Info,
                            &format!("Request successful: {} {}", request.method(), request.url()),
                            &descriptor,
                        );
                        return Ok(ProxyResponse::new(response, Some(descriptor)));
                    }
                    Attempt::Failover(err) => {
                        warn!("Proxy {} rejected the request: {}", descriptor, err);
                        err
                    }
                    Attempt::Retry(err) if proxy_attempt < self.policy.budget() => {
                        let delay = self.policy.backoff(proxy_attempt);
                        warn!(
                            "Request through {} failed: {} (attempt {}/{}), retrying in {:?}",
                            descriptor,
                            err,
                            proxy_attempt,
                            self.policy.budget(),
                            delay
                        );
                        self.emit(
                            LogLevel::Warn,
                            &format!(
                                "Retrying request: attempt {}/{} failed: {}",
                                proxy_attempt,
                                self.policy.budget(),
                                err
                            ),
                            &descriptor,
                        );
                        self.backoff(delay, cancel).await?;
                        continue;
                    }
                    Attempt::Retry(err) => {
                        warn!(
                            "Proxy {} exhausted its {} attempts: {}",
                            descriptor,
                            self.policy.budget(),
                            err
                        );
                        err
                    }
                };

                self.pool.mark_unhealthy(index, failure.clone());
                self.emit(
                    LogLevel::Error,
                    &format!("Request failed: {}", failure),
                    &descriptor,
                );
                last_error = Some(failure);
                break;
            }
        }

        error!(
            "All proxies exhausted after {} attempts ({} of {} healthy)",
            attempts,
            self.pool.healthy_count(),
            self.pool.len()
        );
        Err(RotaError::AllProxiesExhausted {
            attempts,
            last_error,
        })
    }

    /// No proxies configured: go straight to the target, same retry budget
    async fn send_direct(
        &self,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse> {
        debug!("No proxies configured, making direct request");

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let exhausted = attempt >= self.policy.budget();

            let response = self.execute(request, None, cancel).await?;
            let classification = classify(&response, false);

            let failure = match response {
                Ok(response) if classification == Classification::Success || exhausted => {
                    self.emit(
                        LogLevel::Info,
                        &format!(
                            "Request completed: {} {} - {}",
                            request.method(),
                            request.url(),
                            response.status
                        ),
                        NO_PROXY,
                    );
                    return Ok(ProxyResponse::new(response, None));
                }
                Ok(response) => TransportError::status(response.status),
                Err(err) if classification.is_retryable() && !exhausted => err,
                Err(err) => {
                    self.emit(LogLevel::Error, &format!("Request failed: {}", err), NO_PROXY);
                    return Err(RotaError::Transport(err));
                }
            };

            let delay = self.policy.backoff(attempt);
            warn!(
                "Direct request failed: {} (attempt {}/{}), retrying in {:?}",
                failure,
                attempt,
                self.policy.budget(),
                delay
            );
            self.emit(
                LogLevel::Warn,
                &format!(
                    "Retrying request: attempt {}/{} failed: {}",
                    attempt,
                    self.policy.budget(),
                    failure
                ),
                NO_PROXY,
            );
            self.backoff(delay, cancel).await?;
        }
    }

    async fn attempt(
        &self,
        request: &Request,
        proxy: Option<&ProxyEndpoint>,
        cancel: &CancellationToken,
    ) -> Result<Attempt> {
        let result = self.execute(request, proxy, cancel).await?;
        let classification = classify(&result, proxy.is_some());

        Ok(match (classification, result) {
            (Classification::Success, Ok(response)) => Attempt::Done(response),
            (Classification::ProxyUnusable, Ok(response)) => {
                Attempt::Failover(TransportError::status(response.status))
            }
            (Classification::ProxyUnusable, Err(err)) => Attempt::Failover(err),
            (_, Ok(response)) => Attempt::Retry(TransportError::status(response.status)),
            (_, Err(err)) => Attempt::Retry(err),
        })
    }

    /// One transport call, abandoned if the caller cancels
    async fn execute(
        &self,
        request: &Request,
        proxy: Option<&ProxyEndpoint>,
        cancel: &CancellationToken,
    ) -> Result<std::result::Result<TransportResponse, TransportError>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RotaError::Cancelled),
            result = self.transport.execute(request, proxy, self.timeout) => Ok(result),
        }
    }

    async fn backoff(&self, delay: Duration, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RotaError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    fn emit(&self, level: LogLevel, message: &str, proxy: &str) {
        self.log_hook.log(level, message, proxy);
    }
}
