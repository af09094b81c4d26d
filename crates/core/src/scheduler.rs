//! Fixed-interval tick loops, one per community.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{
    task::{self, JoinHandle},
    time::{self, MissedTickBehavior},
};
use tracing::{debug, error, info};

use crate::{community::CommunityManager, CommunityId};

/// Drives [`CommunityManager::tick`] on a fixed period.
///
/// Each community gets its own task, so a slow or failing snapshot write in
/// one community never delays another.
pub struct TickScheduler {
    period: Duration,
    tasks: Mutex<HashMap<CommunityId, JoinHandle<()>>>,
}

impl TickScheduler {
    /// Create a scheduler that ticks every `period`.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking `manager`. Returns `false` if it was already scheduled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch(&self, manager: Arc<CommunityManager>) -> bool {
        let id = manager.id();
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(&id) {
            return false;
        }

        info!(community = id, period_secs = self.period.as_secs_f64(), "starting tick loop");
        tasks.insert(id, tokio::spawn(run_ticks(manager, self.period)));
        true
    }

    /// Whether `id` has a running tick loop.
    pub fn is_watching(&self, id: CommunityId) -> bool {
        self.tasks.lock().contains_key(&id)
    }

    /// Stop every tick loop.
    pub fn shutdown(&self) {
        for (id, handle) in self.tasks.lock().drain() {
            debug!(community = id, "stopping tick loop");
            handle.abort();
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_ticks(manager: Arc<CommunityManager>, period: Duration) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the plant should get a full period first.
    interval.tick().await;

    loop {
        interval.tick().await;
        let id = manager.id();
        let ticking = Arc::clone(&manager);
        match task::spawn_blocking(move || ticking.tick()).await {
            Ok(Ok(outcome)) => debug!(community = id, ?outcome, "tick complete"),
            Ok(Err(err)) => error!(community = id, "failed to write snapshot: {err}"),
            Err(err) => error!(community = id, "tick task failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{community::CommunityState, snapshot::SnapshotStore};
    use anyhow::Result;
    use tempfile::tempdir;

    #[tokio::test]
    async fn ticks_persist_snapshots() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        let manager = Arc::new(CommunityManager::open(21, store.clone())?);
        let scheduler = TickScheduler::new(Duration::from_millis(10));

        assert!(scheduler.watch(Arc::clone(&manager)));
        assert!(!scheduler.watch(Arc::clone(&manager)));
        assert!(scheduler.is_watching(21));

        let mut waited = 0;
        while store.load(21)?.is_none() {
            assert!(waited < 200, "no snapshot written after {waited} polls");
            time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }

        scheduler.shutdown();
        assert!(!scheduler.is_watching(21));
        assert!(manager.state().plant.hydration < 100.0);
        Ok(())
    }

    #[tokio::test]
    async fn failed_writes_do_not_stop_the_loop() -> Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("not-a-directory");
        std::fs::write(&blocker, "")?;
        let manager = Arc::new(CommunityManager::with_state(
            22,
            SnapshotStore::new(&blocker),
            CommunityState::default(),
        ));
        let scheduler = TickScheduler::new(Duration::from_millis(10));
        scheduler.watch(Arc::clone(&manager));

        // Three or more ticks, every one of them failing to persist.
        let mut waited = 0;
        while manager.state().plant.hydration > 99.75 {
            assert!(waited < 300, "loop stalled after {waited} polls");
            time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }

        scheduler.shutdown();
        assert!(blocker.is_file());
        Ok(())
    }
}
