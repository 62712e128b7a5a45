use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use crate::api::traits::TimewebApi;
use crate::error::{ApiError, PollError};
use crate::progress::Spinner;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A provider-side resource whose status can be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Vds(u64),
    Database(u64),
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Vds(id) => write!(f, "server {id}"),
            Resource::Database(id) => write!(f, "database {id}"),
        }
    }
}

/// One status fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Present { id: u64, status: String },
    Absent,
}

/// What the resource must look like for the operation to count as applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    Status(&'static str),
    /// The provider no longer returns the resource at all.
    Absent,
}

impl Convergence {
    pub fn is_met(&self, snapshot: &Snapshot) -> bool {
        match (self, snapshot) {
            (Convergence::Status(expected), Snapshot::Present { status, .. }) => status == expected,
            (Convergence::Absent, Snapshot::Absent) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` waits for as long as it takes.
    pub timeout: Option<Duration>,
    pub max_attempts: Option<u32>,
    /// Upper bound on a single status fetch. A fetch that takes longer is
    /// abandoned and counts as a transient failure.
    pub fetch_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_TIMEOUT),
            max_attempts: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl PollSettings {
    fn exhausted(&self, elapsed: Duration, attempts: u32) -> bool {
        self.timeout.is_some_and(|timeout| elapsed >= timeout)
            || self.max_attempts.is_some_and(|max| attempts >= max)
    }

    /// Time left before the deadline, if there is one.
    fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        self.timeout.map(|timeout| timeout.saturating_sub(elapsed))
    }

    /// How long the next fetch may take without overrunning the deadline.
    fn fetch_bound(&self, elapsed: Duration) -> Duration {
        match self.remaining(elapsed) {
            Some(remaining) => self.fetch_timeout.min(remaining),
            None => self.fetch_timeout,
        }
    }

    /// The pause before the next fetch, cut short at the deadline.
    fn pause(&self, elapsed: Duration) -> Duration {
        match self.remaining(elapsed) {
            Some(remaining) => self.interval.min(remaining),
            None => self.interval,
        }
    }
}

/// Fetches a fresh status snapshot of the resource.
pub async fn fetch_snapshot<T: TimewebApi + ?Sized>(
    api_client: &T,
    resource: Resource,
) -> Result<Snapshot, ApiError> {
    let snapshot = match resource {
        Resource::Vds(id) => api_client
            .get_vds(id)
            .await?
            .map(|server| Snapshot::Present {
                id: server.id,
                status: server.status,
            }),
        Resource::Database(id) => api_client
            .get_database(id)
            .await?
            .map(|db| Snapshot::Present {
                id: db.id,
                status: db.status,
            }),
    };
    Ok(snapshot.unwrap_or(Snapshot::Absent))
}

/// Polls the resource until it reaches `convergence`.
///
/// The mutating call that precedes this only means the provider accepted the
/// request; this loop is what confirms it was applied. Transient fetch
/// failures (including fetches that outlive `settings.fetch_timeout`) are
/// retried and permanent ones abort. Neither a fetch nor a pause runs past
/// `settings.timeout`.
pub async fn wait_for<T: TimewebApi + ?Sized>(
    api_client: &T,
    resource: Resource,
    convergence: Convergence,
    settings: &PollSettings,
    spinner: &Spinner,
) -> Result<Snapshot, PollError> {
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        let bound = settings.fetch_bound(start.elapsed());
        match timeout(bound, fetch_snapshot(api_client, resource)).await {
            Err(_) => {
                debug!(%resource, attempts, ?bound, "status check timed out, retrying");
            }
            Ok(Ok(snapshot)) if convergence.is_met(&snapshot) => {
                info!(%resource, attempts, "converged");
                spinner.finish_success(&format!(
                    "{} is {}",
                    capitalize(resource),
                    describe(&convergence)
                ));
                return Ok(snapshot);
            }
            Ok(Ok(Snapshot::Absent)) => {
                // Only reachable when waiting for a status.
                let expected = match convergence {
                    Convergence::Status(status) => status.to_string(),
                    Convergence::Absent => String::new(),
                };
                let err = PollError::Vanished {
                    resource: resource.to_string(),
                    expected,
                };
                spinner.finish_error(&err.to_string());
                return Err(err);
            }
            Ok(Ok(Snapshot::Present { status, .. })) => {
                debug!(%resource, attempts, %status, "not converged yet");
                spinner.set_message(&format!("Waiting for {resource} (status: {status})"));
            }
            Ok(Err(e)) if e.is_transient() => {
                debug!(%resource, attempts, error = %e, "status check failed, retrying");
            }
            Ok(Err(source)) => {
                let err = PollError::Fetch {
                    resource: resource.to_string(),
                    source,
                };
                spinner.finish_error(&err.to_string());
                return Err(err);
            }
        }

        let elapsed = start.elapsed();
        if settings.exhausted(elapsed, attempts) {
            let err = PollError::Timeout {
                resource: resource.to_string(),
                elapsed,
                attempts,
            };
            spinner.finish_error(&err.to_string());
            return Err(err);
        }

        spinner.tick();
        sleep(settings.pause(elapsed)).await;
    }
}

fn describe(convergence: &Convergence) -> String {
    match convergence {
        Convergence::Status(status) => format!("'{status}'"),
        Convergence::Absent => "gone".to_string(),
    }
}

fn capitalize(resource: Resource) -> String {
    let text = resource.to_string();
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::clients::LiveApiClient;
    use crate::api::clients::tests::{CannedServer, FakeApiClient, Step};
    use crate::auth::AuthContext;
    use crate::api::types::{DB_STATUS_STARTED, VDS_STATUS_OFF, VDS_STATUS_ON};

    fn fast(max_attempts: u32) -> PollSettings {
        PollSettings {
            interval: Duration::ZERO,
            timeout: None,
            max_attempts: Some(max_attempts),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_converges_on_first_fetch_without_sleeping() {
        let client = FakeApiClient::with_vds_script(&[Step::Status("on")]);
        let settings = PollSettings {
            interval: Duration::from_secs(3600),
            ..Default::default()
        };

        let snapshot = wait_for(
            &client,
            Resource::Vds(42),
            Convergence::Status(VDS_STATUS_ON),
            &settings,
            &Spinner::hidden(),
        )
        .await
        .unwrap();

        assert_eq!(client.fetch_count(), 1);
        assert_eq!(
            snapshot,
            Snapshot::Present {
                id: 42,
                status: "on".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_start_converges_after_two_fetches() {
        let client = FakeApiClient::with_vds_script(&[Step::Status("off"), Step::Status("on")]);

        let result = wait_for(
            &client,
            Resource::Vds(42),
            Convergence::Status(VDS_STATUS_ON),
            &fast(100),
            &Spinner::hidden(),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(client.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_no_false_positive_while_status_differs() {
        let client = FakeApiClient::with_vds_script(&[Step::Status("starting")]);

        let result = wait_for(
            &client,
            Resource::Vds(42),
            Convergence::Status(VDS_STATUS_OFF),
            &fast(50),
            &Spinner::hidden(),
        )
        .await;

        assert!(matches!(result, Err(PollError::Timeout { attempts: 50, .. })));
        assert_eq!(client.fetch_count(), 50);
    }

    #[tokio::test]
    async fn test_remove_converges_only_on_absence() {
        let client = FakeApiClient::with_vds_script(&[Step::Status("on"), Step::Absent]);

        let result = wait_for(
            &client,
            Resource::Vds(7),
            Convergence::Absent,
            &fast(100),
            &Spinner::hidden(),
        )
        .await;

        assert_eq!(result.unwrap(), Snapshot::Absent);
        assert_eq!(client.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_remove_ignores_status_changes() {
        let client = FakeApiClient::with_vds_script(&[
            Step::Status("on"),
            Step::Status("off"),
            Step::Status("removing"),
        ]);

        let result = wait_for(
            &client,
            Resource::Vds(7),
            Convergence::Absent,
            &fast(10),
            &Spinner::hidden(),
        )
        .await;

        assert!(matches!(result, Err(PollError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_transient_failure_does_not_abort() {
        let client = FakeApiClient::with_vds_script(&[
            Step::Status("off"),
            Step::Transient,
            Step::Status("on"),
        ]);

        let result = wait_for(
            &client,
            Resource::Vds(42),
            Convergence::Status(VDS_STATUS_ON),
            &fast(100),
            &Spinner::hidden(),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(client.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_aborts() {
        let client = FakeApiClient::with_vds_script(&[Step::NotFound]);

        let result = wait_for(
            &client,
            Resource::Vds(4242),
            Convergence::Status(VDS_STATUS_ON),
            &fast(100),
            &Spinner::hidden(),
        )
        .await;

        assert!(matches!(result, Err(PollError::Fetch { .. })));
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_absence_while_waiting_for_status_aborts() {
        let client = FakeApiClient::with_vds_script(&[Step::Status("off"), Step::Absent]);

        let result = wait_for(
            &client,
            Resource::Vds(42),
            Convergence::Status(VDS_STATUS_ON),
            &fast(100),
            &Spinner::hidden(),
        )
        .await;

        assert!(matches!(result, Err(PollError::Vanished { .. })));
        assert_eq!(client.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_database_converges_on_started() {
        let client = FakeApiClient::with_db_script(&[
            Step::Status("creating"),
            Step::Status("creating"),
            Step::Status("started"),
        ]);

        let result = wait_for(
            &client,
            Resource::Database(3),
            Convergence::Status(DB_STATUS_STARTED),
            &fast(100),
            &Spinner::hidden(),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(client.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_timeout_by_duration() {
        let client = FakeApiClient::with_vds_script(&[Step::Status("off")]);
        let settings = PollSettings {
            interval: Duration::from_millis(5),
            timeout: Some(Duration::from_millis(30)),
            max_attempts: None,
            ..Default::default()
        };

        let result = wait_for(
            &client,
            Resource::Vds(1),
            Convergence::Status(VDS_STATUS_ON),
            &settings,
            &Spinner::hidden(),
        )
        .await;

        match result {
            Err(PollError::Timeout { elapsed, attempts, .. }) => {
                assert!(elapsed >= Duration::from_millis(30));
                assert!(attempts >= 1);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stalled_fetch_is_retried() {
        let client = FakeApiClient::with_vds_script(&[Step::Stall, Step::Status("on")]);
        let settings = PollSettings {
            interval: Duration::ZERO,
            timeout: None,
            max_attempts: Some(10),
            fetch_timeout: Duration::from_millis(20),
        };

        let result = wait_for(
            &client,
            Resource::Vds(42),
            Convergence::Status(VDS_STATUS_ON),
            &settings,
            &Spinner::hidden(),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(client.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_stalled_fetch_cannot_outlive_timeout() {
        let client = FakeApiClient::with_vds_script(&[Step::Stall]);
        let settings = PollSettings {
            interval: Duration::from_millis(10),
            timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        };

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            wait_for(
                &client,
                Resource::Vds(42),
                Convergence::Status(VDS_STATUS_ON),
                &settings,
                &Spinner::hidden(),
            ),
        )
        .await
        .expect("wait_for ignored its timeout");

        assert!(matches!(result, Err(PollError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_unanswered_http_request_cannot_outlive_timeout() {
        let server = CannedServer::stalled().await;
        let client = LiveApiClient::new(&server.base_url, &AuthContext::new("t")).unwrap();
        let settings = PollSettings {
            interval: Duration::from_millis(10),
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        };

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            wait_for(
                &client,
                Resource::Vds(42),
                Convergence::Status(VDS_STATUS_ON),
                &settings,
                &Spinner::hidden(),
            ),
        )
        .await
        .expect("wait_for ignored its timeout");

        assert!(matches!(result, Err(PollError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_interval_longer_than_timeout_stops_at_deadline() {
        let client = FakeApiClient::with_vds_script(&[Step::Status("off")]);
        let settings = PollSettings {
            interval: Duration::from_secs(2),
            timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        };
        let start = Instant::now();

        let result = wait_for(
            &client,
            Resource::Vds(42),
            Convergence::Status(VDS_STATUS_ON),
            &settings,
            &Spinner::hidden(),
        )
        .await;

        assert!(matches!(result, Err(PollError::Timeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_pause_and_fetch_bound_respect_deadline() {
        let settings = PollSettings {
            interval: Duration::from_secs(2),
            timeout: Some(Duration::from_secs(1)),
            max_attempts: None,
            fetch_timeout: Duration::from_secs(30),
        };
        assert_eq!(
            settings.pause(Duration::from_millis(400)),
            Duration::from_millis(600)
        );
        assert_eq!(
            settings.fetch_bound(Duration::from_millis(400)),
            Duration::from_millis(600)
        );
        assert_eq!(settings.pause(Duration::from_secs(5)), Duration::ZERO);

        let unbounded = PollSettings {
            timeout: None,
            ..settings
        };
        assert_eq!(unbounded.pause(Duration::from_secs(5)), Duration::from_secs(2));
        assert_eq!(
            unbounded.fetch_bound(Duration::from_secs(5)),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_convergence_is_met() {
        let on = Snapshot::Present {
            id: 1,
            status: "on".to_string(),
        };
        assert!(Convergence::Status("on").is_met(&on));
        assert!(!Convergence::Status("off").is_met(&on));
        assert!(!Convergence::Absent.is_met(&on));
        assert!(Convergence::Absent.is_met(&Snapshot::Absent));
        assert!(!Convergence::Status("on").is_met(&Snapshot::Absent));
    }
}
