//! Liveness probing for registered services.
//!
//! Every round the prober snapshots the registry, sends one HTTP GET per
//! entry, and writes the outcome back through the registry handle:
//! - HTTP 200 within the timeout → `on`
//! - any other status, transport error or timeout → `off`
//!
//! Probes within a round run concurrently, one task per entry. Each task
//! owns its entry's name and writes only its own result. Rounds never
//! overlap: the next tick is not taken until every probe of the current
//! round has finished. There is no retry and no backoff.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Probe failures are logged and mapped to `off`, never propagated

use std::time::Duration;

use bulletin_core::{ServiceName, ServiceStatus};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::RegistryHandle;

/// Errors that can occur while setting up the prober.
#[derive(Debug, Error)]
pub enum ProberError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Outcome counts of one probe round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeRound {
    /// Entries found in the snapshot
    pub probed: usize,

    /// Entries that answered 200
    pub on: usize,

    /// Entries that did not
    pub off: usize,
}

impl ProbeRound {
    fn record(&mut self, status: ServiceStatus) {
        if status.is_on() {
            self.on += 1;
        } else {
            self.off += 1;
        }
    }
}

/// Periodic liveness checker for every registered service.
#[derive(Clone)]
pub struct StatusProber {
    client: Client,
    registry: RegistryHandle,
}

impl StatusProber {
    /// Creates a prober whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// - `ProberError::Client` if the HTTP client cannot be built
    pub fn new(registry: RegistryHandle, timeout: Duration) -> Result<Self, ProberError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, registry })
    }

    /// Probes every registered service once and records the results.
    ///
    /// Returns after all probes of the round have been written back.
    pub async fn run_round(&self) -> ProbeRound {
        let entries = self.registry.snapshot().await;
        let mut round = ProbeRound {
            probed: entries.len(),
            ..ProbeRound::default()
        };

        let mut probes = JoinSet::new();
        for entry in entries {
            let client = self.client.clone();
            let registry = self.registry.clone();

            probes.spawn(async move {
                let status = probe(&client, &entry.name, &entry.url).await;
                if let Err(e) = registry.set_status(entry.name, status).await {
                    warn!(error = %e, "Failed to record probe result");
                }
                status
            });
        }

        while let Some(result) = probes.join_next().await {
            match result {
                Ok(status) => round.record(status),
                Err(e) => warn!(error = %e, "Probe task failed"),
            }
        }

        round
    }
}

/// Issues one GET against `url` and classifies the answer.
pub async fn probe(client: &Client, name: &ServiceName, url: &str) -> ServiceStatus {
    let alive = match client.get(url).send().await {
        Ok(response) if response.status() == StatusCode::OK => true,
        Ok(response) => {
            debug!(
                service = %name,
                url = %url,
                status = response.status().as_u16(),
                "Probe got non-200 response"
            );
            false
        }
        Err(e) => {
            debug!(
                service = %name,
                url = %url,
                error = %e,
                timeout = e.is_timeout(),
                "Probe failed"
            );
            false
        }
    };

    ServiceStatus::from_alive(alive)
}

/// Spawns the recurring probe task.
///
/// The first round starts one `period` after the call. Uses cooperative
/// shutdown via CancellationToken; a round in progress is abandoned when
/// the token fires.
///
/// # Returns
///
/// A join handle for the spawned task.
pub fn spawn_prober_task(
    prober: StatusProber,
    period: Duration,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval_at(Instant::now() + period, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?period, "Status prober started");

        loop {
            tokio::select! {
                biased;

                _ = cancel_token.cancelled() => break,

                _ = tick.tick() => {
                    tokio::select! {
                        biased;

                        _ = cancel_token.cancelled() => break,

                        round = prober.run_round() => {
                            debug!(
                                probed = round.probed,
                                on = round.on,
                                off = round.off,
                                "Probe round complete"
                            );
                        }
                    }
                }
            }
        }

        info!("Status prober shutting down");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryCommand;
    use tokio::sync::mpsc;

    #[test]
    fn test_probe_round_counts() {
        let mut round = ProbeRound {
            probed: 3,
            ..ProbeRound::default()
        };
        round.record(ServiceStatus::On);
        round.record(ServiceStatus::Off);
        round.record(ServiceStatus::Off);

        assert_eq!(
            round,
            ProbeRound {
                probed: 3,
                on: 1,
                off: 2
            }
        );
    }

    #[tokio::test]
    async fn test_probe_invalid_url_is_off() {
        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let name = ServiceName::parse("broken").unwrap();

        assert_eq!(probe(&client, &name, "not a url").await, ServiceStatus::Off);
        assert_eq!(probe(&client, &name, "").await, ServiceStatus::Off);
    }

    #[tokio::test]
    async fn test_prober_task_sub_millisecond_period() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(16);
        let registry = RegistryHandle::new(cmd_tx);

        // Stand-in actor answering every snapshot with an empty registry
        let actor = tokio::spawn(async move {
            let mut snapshots = 0;
            while let Some(cmd) = cmd_rx.recv().await {
                if let RegistryCommand::Snapshot { respond_to } = cmd {
                    snapshots += 1;
                    let _ = respond_to.send(Vec::new());
                }
            }
            snapshots
        });

        let prober = StatusProber::new(registry, Duration::from_millis(100)).unwrap();
        let cancel_token = CancellationToken::new();
        let task = spawn_prober_task(prober, Duration::from_micros(250), cancel_token.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_token.cancel();
        task.await.unwrap();

        assert!(actor.await.unwrap() > 1);
    }
}
