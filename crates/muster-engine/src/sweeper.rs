//! Periodic party sweep with bounded runs and clean shutdown.
//!
//! [`run_sweeps`] drives [`PartyEngine::cleanup_expired_parties`] on a
//! `tokio` interval until `max_sweeps` is reached or the shutdown future
//! resolves, whichever comes first.

use std::future::Future;
use std::time::Duration;

use muster_groups::{EngineDeps, PartyEngine, PartyPolicy, World};
use muster_types::{GroupKind, PartySummary};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::SweepConfig;

/// Why the sweep loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepEndReason {
    /// `max_sweeps` sweeps completed.
    MaxSweepsReached,
    /// The shutdown future resolved.
    Shutdown,
}

/// Outcome of a sweep run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Why the loop stopped.
    pub end_reason: SweepEndReason,
    /// Number of sweeps executed.
    pub total_sweeps: u64,
    /// Parties disbanded across all sweeps.
    pub total_disbanded: usize,
}

/// Run the sweep loop.
///
/// The first sweep runs immediately. A pending shutdown is honored before
/// each sweep.
pub async fn run_sweeps(
    world: &mut World,
    deps: &mut EngineDeps,
    policy: PartyPolicy,
    sweep: SweepConfig,
    shutdown: impl Future<Output = ()>,
) -> SweepReport {
    let mut interval = tokio::time::interval(Duration::from_millis(sweep.interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut total_sweeps: u64 = 0;
    let mut total_disbanded: usize = 0;

    info!(
        interval_ms = sweep.interval_ms,
        max_sweeps = sweep.max_sweeps,
        "Sweep loop starting"
    );

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!("Shutdown requested");
                return SweepReport {
                    end_reason: SweepEndReason::Shutdown,
                    total_sweeps,
                    total_disbanded,
                };
            }
            _ = interval.tick() => {}
        }

        let disbanded = PartyEngine::new(world, deps, policy).cleanup_expired_parties();
        for party in &disbanded {
            info!(party = %party.id, name = %party.name, "Idle party disbanded");
        }

        total_sweeps = total_sweeps.saturating_add(1);
        total_disbanded = total_disbanded.saturating_add(disbanded.len());
        debug!(
            sweep = total_sweeps,
            disbanded = disbanded.len(),
            remaining = world.groups.len(),
            "Sweep finished"
        );

        if sweep.max_sweeps > 0 && total_sweeps >= sweep.max_sweeps {
            info!(max_sweeps = sweep.max_sweeps, "Sweep limit reached");
            return SweepReport {
                end_reason: SweepEndReason::MaxSweepsReached,
                total_sweeps,
                total_disbanded,
            };
        }
    }
}

/// Resolve once `signal` fires. A failed signal handler is logged and
/// treated as a shutdown request.
pub async fn until_signal(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        warn!(error = %e, "Shutdown signal handler failed, stopping");
    }
}

/// Snapshot every live party for the end-of-run log.
pub fn party_summaries(world: &World) -> Vec<PartySummary> {
    world
        .groups
        .values()
        .filter(|group| group.kind == GroupKind::Party)
        .map(PartySummary::from)
        .collect()
}

/// Log the end of a sweep run.
pub fn log_sweep_end(report: &SweepReport, world: &World) {
    info!(
        reason = ?report.end_reason,
        total_sweeps = report.total_sweeps,
        total_disbanded = report.total_disbanded,
        parties_remaining = party_summaries(world).len(),
        actors = world.actors.len(),
        "Sweep loop ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use muster_groups::{ManualClock, SequentialIdGenerator};

    use super::*;

    fn world_with_lone_party(clock: &ManualClock) -> (World, EngineDeps) {
        let mut world = World::new();
        let mut deps = EngineDeps::new(clock.clone(), SequentialIdGenerator::new());
        let alice = world.spawn_actor("Alice");
        let bob = world.spawn_actor("Bob");
        let carol = world.spawn_actor("Carol");

        let mut parties = PartyEngine::new(&mut world, &mut deps, PartyPolicy::default());
        parties.found_party(alice, |_| {}).unwrap();
        let pair = parties.found_party(bob, |_| {}).unwrap();
        parties.add_party_member(&pair, carol).unwrap();
        (world, deps)
    }

    const FAST: SweepConfig = SweepConfig {
        interval_ms: 1,
        max_sweeps: 3,
    };

    #[tokio::test]
    async fn bounded_by_max_sweeps() {
        let clock = ManualClock::default();
        let (mut world, mut deps) = world_with_lone_party(&clock);
        clock.set(120_000);

        let report = run_sweeps(
            &mut world,
            &mut deps,
            PartyPolicy::default(),
            FAST,
            std::future::pending(),
        )
        .await;

        assert_eq!(report.end_reason, SweepEndReason::MaxSweepsReached);
        assert_eq!(report.total_sweeps, 3);
        assert_eq!(report.total_disbanded, 1);
        assert_eq!(party_summaries(&world).len(), 1);
        assert_eq!(world.actor_by_name("Alice").unwrap().party(), None);
    }

    #[tokio::test]
    async fn young_parties_survive() {
        let clock = ManualClock::default();
        let (mut world, mut deps) = world_with_lone_party(&clock);

        let report = run_sweeps(
            &mut world,
            &mut deps,
            PartyPolicy::default(),
            FAST,
            std::future::pending(),
        )
        .await;

        assert_eq!(report.total_disbanded, 0);
        assert_eq!(party_summaries(&world).len(), 2);
    }

    #[tokio::test]
    async fn pending_shutdown_wins_over_first_sweep() {
        let clock = ManualClock::default();
        let (mut world, mut deps) = world_with_lone_party(&clock);
        clock.set(120_000);

        let report = run_sweeps(
            &mut world,
            &mut deps,
            PartyPolicy::default(),
            FAST,
            std::future::ready(()),
        )
        .await;

        assert_eq!(report.end_reason, SweepEndReason::Shutdown);
        assert_eq!(report.total_sweeps, 0);
        assert_eq!(party_summaries(&world).len(), 2);
    }

    #[tokio::test]
    async fn failed_signal_handler_stops_the_loop() {
        let clock = ManualClock::default();
        let (mut world, mut deps) = world_with_lone_party(&clock);
        let unbounded = SweepConfig {
            interval_ms: 1,
            max_sweeps: 0,
        };

        let broken = std::future::ready(Err(std::io::Error::other("no signal handler")));
        let report = run_sweeps(
            &mut world,
            &mut deps,
            PartyPolicy::default(),
            unbounded,
            until_signal(broken),
        )
        .await;

        assert_eq!(report.end_reason, SweepEndReason::Shutdown);
        assert_eq!(report.total_sweeps, 0);
    }

    #[tokio::test]
    async fn shutdown_signal_stops_unbounded_loop() {
        let clock = ManualClock::default();
        let (mut world, mut deps) = world_with_lone_party(&clock);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let unbounded = SweepConfig {
            interval_ms: 1,
            max_sweeps: 0,
        };

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(());
        });
        let report = run_sweeps(&mut world, &mut deps, PartyPolicy::default(), unbounded, async {
            let _ = rx.await;
        })
        .await;

        assert_eq!(report.end_reason, SweepEndReason::Shutdown);
        assert!(report.total_sweeps >= 1);
    }
}
