//! Single-shot timers for the delayed re-render after a correct answer.
//!
//! The timer only knows about time. Whether the advance still applies is
//! the engine's call: check [`crate::ScenarioEngine::is_pending_current`]
//! before rendering.
use tokio::task::JoinHandle;

use crate::engine::PendingAdvance;

/// Handle to a scheduled advance. Dropping it cancels the advance.
#[derive(Debug)]
pub struct AdvanceTimer {
    handle: Option<JoinHandle<PendingAdvance>>,
}

impl AdvanceTimer {
    /// Sleep for `pending.delay`, then run `on_fire` once.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn schedule<F>(pending: &PendingAdvance, on_fire: F) -> Self
    where
        F: FnOnce(&PendingAdvance) + Send + 'static,
    {
        let pending = pending.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(pending.delay).await;
            log::debug!("advance to '{}' fired", pending.next_node_id);
            on_fire(&pending);
            pending
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Sleep for `pending.delay` with no callback; pair with [`Self::wait`].
    #[must_use]
    pub fn start(pending: &PendingAdvance) -> Self {
        Self::schedule(pending, |_| {})
    }

    /// Abort the advance if it has not fired yet.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                log::debug!("pending advance cancelled");
            }
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for the advance. `None` when it was cancelled.
    ///
    /// Cancel safe: if this future is dropped before the advance fires, the
    /// timer stays armed until [`Self::cancel`] runs or the handle drops.
    pub async fn wait(&mut self) -> Option<PendingAdvance> {
        let handle = self.handle.as_mut()?;
        let fired = handle.await.ok();
        self.handle = None;
        fired
    }
}

impl Drop for AdvanceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::data::{Choice, ScenarioData, ScenarioNode};
    use crate::engine::ScenarioEngine;
    use crate::semantic::CorrectnessSet;
    use crate::shuffle::IdentityShuffler;
    use crate::store::ScenarioStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn pending_advance() -> PendingAdvance {
        let store = ScenarioStore::from_data(ScenarioData::from_nodes(vec![
            ScenarioNode {
                id: "start".to_string(),
                description: "start".to_string(),
                choices: vec![Choice::new("go", "n2", "oath")],
            },
            ScenarioNode {
                id: "n2".to_string(),
                description: "n2".to_string(),
                choices: vec![],
            },
        ]))
        .unwrap();
        let mut engine = ScenarioEngine::new(
            store,
            CorrectnessSet::default_allow_list(),
            IdentityShuffler,
            EngineConfig::default(),
        );
        engine.start().unwrap();
        let view = engine.present_node().unwrap();
        engine
            .resolve_choice(view.choices[0].choice_ref)
            .unwrap()
            .pending
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let pending = pending_advance();
        let mut timer = AdvanceTimer::schedule(&pending, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timer.is_pending());

        let result = timer.wait().await.unwrap();
        assert_eq!(result.next_node_id, "n2");
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_pending());
        assert!(timer.wait().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn losing_a_select_keeps_the_timer_armed() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let mut timer = AdvanceTimer::schedule(&pending_advance(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let won = tokio::select! {
            _ = timer.wait() => false,
            () = tokio::time::sleep(Duration::from_millis(100)) => true,
        };
        assert!(won);
        assert!(timer.is_pending());

        let result = timer.wait().await.unwrap();
        assert_eq!(result.next_node_id, "n2");
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_after_a_lost_select_cancels() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let mut timer = AdvanceTimer::schedule(&pending_advance(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::select! {
            _ = timer.wait() => panic!("advance fired before the interrupt"),
            () = tokio::time::sleep(Duration::from_millis(100)) => {}
        }
        drop(timer);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let mut timer = AdvanceTimer::schedule(&pending_advance(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(500)).await;
        timer.cancel();
        assert!(!timer.is_pending());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(timer.wait().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        drop(AdvanceTimer::schedule(&pending_advance(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
