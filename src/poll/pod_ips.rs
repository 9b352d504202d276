//! Waiting for pods to be assigned IP addresses.

use super::poller::{PollOutcome, PollReport, PollTarget, Poller};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// PodAddressing is the view of an installation's status needed to tell whether
/// every pod has an IP address.
pub trait PodAddressing {
    /// Names of the pods the installation status knows about.
    fn pods(&self) -> &[String];

    /// IP addresses currently assigned to the installation's pods.
    fn pod_ips(&self) -> &[String];

    /// Stopped installations have no running pods to wait for.
    fn is_stopped(&self) -> bool {
        false
    }

    fn all_pods_addressed(&self) -> bool {
        self.pod_ips().len() >= self.pods().len()
    }
}

/// Waits until every pod of the installation has an IP address.
///
/// Returns `None` without polling when `cancel` has already fired or `installation`
/// is stopped. Fetch failures are treated as "still waiting".
pub async fn wait_for_pod_ips<S, P>(
    poller: &Poller,
    cancel: &CancellationToken,
    installation: &S,
    target: &P,
) -> Option<PollReport>
where
    S: PodAddressing,
    P: PollTarget,
    P::State: PodAddressing,
    P::Error: std::fmt::Display,
{
    if cancel.is_cancelled() {
        debug!("task is done");
        return None;
    }
    if installation.is_stopped() {
        debug!("installation is stopped, not waiting for IP addresses");
        return None;
    }

    info!("wait for IP addresses to be assigned to all pods");
    let report = poller
        .poll(cancel, target, |tick| match tick.result {
            Ok(status) if status.all_pods_addressed() => {
                info!(pods = status.pods().len(), "all IP addresses are in place");
                false
            }
            Ok(status) => {
                debug!(
                    pods = status.pods().len(),
                    ips = status.pod_ips().len(),
                    "still waiting - not all IP addresses are in place yet"
                );
                true
            }
            Err(e) => {
                debug!(error = %e, "still waiting - failed to fetch installation");
                true
            }
        })
        .await;

    if report.outcome == PollOutcome::DeadlineExceeded {
        warn!(
            elapsed = ?report.elapsed,
            "not all IP addresses are in place but time has elapsed"
        );
    }
    Some(report)
}
