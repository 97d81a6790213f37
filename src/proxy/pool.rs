//! Proxy pool with live health state
//!
//! The whole pool (endpoint health and the rotation cursor) sits behind one
//! mutex. Every operation takes the lock for a short read or write and never
//! holds it across I/O.

use chrono::Utc;
use parking_lot::Mutex;

use crate::error::Result;
use crate::models::{ProxyEndpoint, ProxyStatus};
use crate::proxy::transport::TransportError;

#[derive(Debug)]
struct PoolState {
    endpoints: Vec<ProxyEndpoint>,
    /// Last selected endpoint; `None` before the first selection
    current: Option<usize>,
}

/// Ordered, fixed-size set of upstream proxies
#[derive(Debug)]
pub struct ProxyPool {
    state: Mutex<PoolState>,
}

impl ProxyPool {
    /// Build a pool from proxy URLs, in configuration order.
    ///
    /// A single malformed URL fails the whole construction.
    pub fn new<I, S>(urls: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let endpoints = urls
            .into_iter()
            .map(|url| ProxyEndpoint::parse(url.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_endpoints(endpoints))
    }

    pub fn from_endpoints(endpoints: Vec<ProxyEndpoint>) -> Self {
        Self {
            state: Mutex::new(PoolState {
                endpoints,
                current: None,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the last selected endpoint
    pub fn current(&self) -> Option<usize> {
        self.state.lock().current
    }

    pub fn healthy_count(&self) -> usize {
        self.state
            .lock()
            .endpoints
            .iter()
            .filter(|e| e.working)
            .count()
    }

    /// Owned copy of every endpoint, taken under one lock acquisition
    pub fn snapshot(&self) -> Vec<ProxyEndpoint> {
        self.state.lock().endpoints.clone()
    }

    /// Health report with credentials masked
    pub fn status(&self) -> Vec<ProxyStatus> {
        self.state
            .lock()
            .endpoints
            .iter()
            .map(ProxyEndpoint::status)
            .collect()
    }

    /// First healthy endpoint strictly after `cursor`, without wrapping
    pub fn next_healthy_after(&self, cursor: Option<usize>) -> Option<usize> {
        let state = self.state.lock();
        scan(&state.endpoints, cursor)
    }

    /// Advance the cursor to the next healthy endpoint and return it
    pub fn select_next(&self) -> Option<(usize, ProxyEndpoint)> {
        let mut state = self.state.lock();
        let index = scan(&state.endpoints, state.current)?;
        state.current = Some(index);
        Some((index, state.endpoints[index].clone()))
    }

    /// Quarantine an endpoint. Returns `true` if it was healthy before.
    pub fn mark_unhealthy(&self, index: usize, err: TransportError) -> bool {
        let mut state = self.state.lock();
        let Some(endpoint) = state.endpoints.get_mut(index) else {
            return false;
        };

        let was_working = endpoint.working;
        endpoint.working = false;
        endpoint.last_error = Some(err);
        if was_working {
            endpoint.failed_at = Some(Utc::now());
        }
        was_working
    }

    /// Restore every endpoint to healthy and rewind the cursor
    pub fn reset(&self) {
        let mut state = self.state.lock();
        for endpoint in state.endpoints.iter_mut() {
            endpoint.working = true;
            endpoint.last_error = None;
            endpoint.failed_at = None;
        }
        state.current = None;
    }

    #[cfg(test)]
    pub(crate) fn seek(&self, cursor: Option<usize>) {
        let mut state = self.state.lock();
        if let Some(index) = cursor {
            assert!(state.endpoints[index].working, "cursor must point at a healthy endpoint");
        }
        state.current = cursor;
    }
}

fn scan(endpoints: &[ProxyEndpoint], cursor: Option<usize>) -> Option<usize> {
    let start = cursor.map_or(0, |c| c + 1);
    endpoints
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, e)| e.working)
        .map(|(i, _)| i)
}
