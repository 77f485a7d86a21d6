//! Request coordination for the dashboard
//!
//! Every fetch is tagged with a token from a monotonically increasing counter.
//! Only the fetch holding the latest token may publish its result; anything
//! older is dropped as superseded. Manual refreshes are additionally held back
//! by a cooldown measured from the last successful fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::api::EnvironmentSource;
use crate::models::{EnvironmentalSnapshot, Location};
use crate::{HealthExposureError, Result};

/// Result of a fetch that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Accepted(EnvironmentalSnapshot),
    /// A newer request was issued while this one was in flight
    Superseded,
}

#[derive(Debug, Default)]
struct RefreshState {
    location: Option<Location>,
    /// Start of the last fetch that was accepted
    last_success: Option<Instant>,
    snapshot: Option<EnvironmentalSnapshot>,
}

pub struct RefreshCoordinator<S> {
    source: Arc<S>,
    cooldown: Duration,
    latest_token: AtomicU64,
    state: Mutex<RefreshState>,
}

impl<S: EnvironmentSource> RefreshCoordinator<S> {
    pub fn new(source: Arc<S>, cooldown: Duration) -> Self {
        Self {
            source,
            cooldown,
            latest_token: AtomicU64::new(0),
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Switch to `location` and fetch it. Never rate limited.
    #[instrument(skip(self), fields(location = %location.name))]
    pub async fn load(&self, location: Location) -> Result<FetchOutcome> {
        let token = {
            let mut state = self.state();
            state.location = Some(location.clone());
            self.issue_token()
        };
        self.fetch(token, &location, Instant::now()).await
    }

    /// Manual refresh of the current location
    pub async fn refresh(&self) -> Result<FetchOutcome> {
        self.refresh_at(Instant::now()).await
    }

    /// Manual refresh as of `now`.
    ///
    /// Inside the cooldown this fails with [`HealthExposureError::RefreshCooldown`]
    /// without touching the network.
    #[instrument(skip(self))]
    pub async fn refresh_at(&self, now: Instant) -> Result<FetchOutcome> {
        let (token, location) = {
            let state = self.state();
            if let Some(remaining) = self.remaining(&state, now) {
                debug!("Refresh rejected, {}s of cooldown left", remaining.as_secs());
                return Err(HealthExposureError::RefreshCooldown { remaining });
            }
            let location = state
                .location
                .clone()
                .ok_or_else(|| HealthExposureError::validation("No location selected"))?;
            (self.issue_token(), location)
        };

        self.fetch(token, &location, now).await
    }

    /// Whole seconds until a manual refresh is allowed, zero when it is
    #[must_use]
    pub fn seconds_until_refresh_at(&self, now: Instant) -> u64 {
        let state = self.state();
        self.remaining(&state, now)
            .map_or(0, |remaining| remaining.as_secs_f64().ceil() as u64)
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<EnvironmentalSnapshot> {
        self.state().snapshot.clone()
    }

    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.state().location.clone()
    }

    #[must_use]
    pub fn last_success(&self) -> Option<Instant> {
        self.state().last_success
    }

    /// Callers hold the state lock so a token and the location it belongs to
    /// are published together
    fn issue_token(&self) -> u64 {
        self.latest_token.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, token: u64) -> bool {
        self.latest_token.load(Ordering::SeqCst) == token
    }

    fn state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remaining(&self, state: &RefreshState, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(state.last_success?);
        (elapsed < self.cooldown).then(|| self.cooldown - elapsed)
    }

    async fn fetch(
        &self,
        token: u64,
        location: &Location,
        started: Instant,
    ) -> Result<FetchOutcome> {
        let result = self.source.fetch_cells(location.lat, location.lon).await;

        {
            // token check and publish under one lock; tokens are only issued while it is held
            let mut state = self.state();
            if !self.is_latest(token) {
                debug!("Discarding response for request {}", token);
                return Ok(FetchOutcome::Superseded);
            }
            if let Ok(snapshot) = &result {
                state.last_success = Some(started);
                state.snapshot = Some(snapshot.clone());
            }
        }

        match result {
            Ok(snapshot) => {
                info!("Accepted snapshot for {}", location.name);
                Ok(FetchOutcome::Accepted(snapshot))
            }
            Err(e) => {
                warn!("Fetch for {} failed: {}", location.name, e);
                Err(e)
            }
        }
    }
}
