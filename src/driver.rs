//! Real-time game driver
//!
//! Ties a [`GameSession`] to a [`TickScheduler`]. Every lifecycle call
//! re-syncs the timer with the session phase: it runs while `Playing` and is
//! stopped otherwise. Ticks and input share one lock, so a key press never
//! lands in the middle of a tick.

use std::ops::ControlFlow;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::persistence::KeyValueStore;
use crate::scheduler::TickScheduler;
use crate::scoring::{ScoreReporter, ScoreSink, SessionContext};
use crate::session::{GameSession, RoundSummary, SessionPhase};
use crate::settings::GameConfig;
use crate::sim::{GameMode, GameState, Intent, Key};

pub struct GameDriver {
    session: Arc<Mutex<GameSession>>,
    reporter: Arc<Mutex<ScoreReporter>>,
    context: SessionContext,
    scheduler: TickScheduler,
    round_tx: watch::Sender<Option<RoundSummary>>,
}

impl GameDriver {
    pub fn new(
        config: GameConfig,
        store: Box<dyn KeyValueStore>,
        sink: Box<dyn ScoreSink>,
        context: SessionContext,
    ) -> Self {
        let (round_tx, _) = watch::channel(None);
        Self {
            session: Arc::new(Mutex::new(GameSession::new(config, store))),
            reporter: Arc::new(Mutex::new(ScoreReporter::new(sink))),
            context,
            scheduler: TickScheduler::new(),
            round_tx,
        }
    }

    /// Latest finished round; changes once per round
    pub fn round_results(&self) -> watch::Receiver<Option<RoundSummary>> {
        self.round_tx.subscribe()
    }

    pub fn snapshot(&self) -> GameState {
        self.session.lock().state().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.lock().phase()
    }

    pub fn high_score(&self) -> u32 {
        self.session.lock().high_score()
    }

    pub fn is_ticking(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn start(&mut self) -> bool {
        self.apply(GameSession::start)
    }

    pub fn handle_key(&mut self, key: Key) -> bool {
        self.apply(|session| session.handle_key(key))
    }

    pub fn submit_intent(&mut self, intent: Intent) -> bool {
        self.apply(|session| session.submit_intent(intent))
    }

    pub fn pause(&mut self) -> bool {
        self.apply(GameSession::pause)
    }

    pub fn resume(&mut self) -> bool {
        self.apply(GameSession::resume)
    }

    pub fn next_round(&mut self) -> bool {
        let started = self.apply(GameSession::next_round);
        if started {
            self.reporter.lock().reset();
        }
        started
    }

    pub fn new_game(&mut self) {
        self.apply(GameSession::new_game);
        self.reporter.lock().reset();
    }

    pub fn configure(&mut self, config: GameConfig) -> bool {
        self.apply(|session| session.configure(config))
    }

    /// Stop ticking without changing the session
    pub fn stop(&mut self) -> bool {
        self.scheduler.stop()
    }

    /// Run a session call, then bring the timer in line with the new phase.
    ///
    /// Entering `Playing` always gets a fresh tick task. The previous one may
    /// have published a round result and broken out without having exited
    /// yet, and it would otherwise still look alive.
    fn apply<T>(&mut self, f: impl FnOnce(&mut GameSession) -> T) -> T {
        let (result, entered_playing) = {
            let mut session = self.session.lock();
            let before = session.phase();
            let result = f(&mut *session);
            let entered =
                before != SessionPhase::Playing && session.phase() == SessionPhase::Playing;
            (result, entered)
        };
        if entered_playing {
            self.scheduler.stop();
        }
        self.sync_scheduler();
        result
    }

    fn sync_scheduler(&mut self) {
        let (phase, interval) = {
            let session = self.session.lock();
            (session.phase(), session.config().tick_interval())
        };

        if phase != SessionPhase::Playing {
            self.scheduler.stop();
            return;
        }
        if self.scheduler.is_running() {
            return;
        }

        let session = Arc::clone(&self.session);
        let reporter = Arc::clone(&self.reporter);
        let context = self.context.clone();
        let round_tx = self.round_tx.clone();

        self.scheduler.start(interval, move || {
            let summary = {
                let mut session = session.lock();
                if !session.is_running() {
                    return ControlFlow::Break(());
                }
                session.tick()
            };

            let Some(summary) = summary else {
                return ControlFlow::Continue(());
            };
            // Outside the session lock so a slow sink cannot block input
            if summary.mode == GameMode::Single {
                reporter.lock().report(&context, summary.tokens_collected);
            }
            round_tx.send_replace(Some(summary));
            ControlFlow::Break(())
        });
    }
}

impl std::fmt::Debug for GameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameDriver")
            .field("context", &self.context)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::persistence::MemoryStore;
    use crate::scoring::{LogScoreSink, SubmitError};
    use crate::sim::Token;
    use glam::IVec2;

    struct CountingSink(Arc<Mutex<Vec<u32>>>);

    impl ScoreSink for CountingSink {
        fn submit(&mut self, _: &str, _: &str, score: u32) -> Result<(), SubmitError> {
            self.0.lock().push(score);
            Ok(())
        }
    }

    fn driver(mode: GameMode, fps: u32) -> GameDriver {
        let config = GameConfig {
            frames_per_second: fps,
            seed: Some(8),
            ..GameConfig::with_mode(mode)
        };
        GameDriver::new(
            config,
            Box::new(MemoryStore::new()),
            Box::new(LogScoreSink),
            SessionContext::anonymous(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_only_while_playing() {
        let mut d = driver(GameMode::Single, 10);
        assert!(!d.is_ticking());
        d.start();
        assert!(d.is_ticking());

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(d.snapshot().time_ticks, 3);

        assert!(d.pause());
        assert!(!d.is_ticking());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(d.snapshot().time_ticks, 3);

        assert!(d.handle_key(Key::Space));
        assert_eq!(d.phase(), SessionPhase::Playing);
        assert!(d.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_end_publishes_summary_and_stops() {
        let mut d = driver(GameMode::Single, 100);
        let mut results = d.round_results();
        d.start();

        // Heading right from x=10 on a 40-wide grid: dead within 30 ticks
        results.changed().await.unwrap();
        let summary = results.borrow().clone().unwrap();
        assert_eq!(summary.round, 1);
        assert_eq!(d.phase(), SessionPhase::RoundOver);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!d.is_ticking());

        assert!(d.next_round());
        assert!(d.is_ticking());
        assert_eq!(d.snapshot().round, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_keeps_ticking_across_back_to_back_rounds() {
        let config = GameConfig {
            grid_width: 20,
            grid_height: 20,
            frames_per_second: 200,
            seed: Some(21),
            ..GameConfig::default()
        };
        let mut d = GameDriver::new(
            config,
            Box::new(MemoryStore::new()),
            Box::new(LogScoreSink),
            SessionContext::anonymous(),
        );
        let mut results = d.round_results();
        d.start();

        // Restart as soon as each result lands, while the old tick task may
        // still be winding down on another worker
        for round in 1..=100 {
            let changed = tokio::time::timeout(Duration::from_secs(2), results.changed()).await;
            assert!(
                changed.is_ok(),
                "round {} never finished: phase={:?} ticking={}",
                round,
                d.phase(),
                d.is_ticking()
            );
            assert_eq!(results.borrow_and_update().as_ref().map(|s| s.round), Some(round));
            assert!(d.next_round());
            assert!(d.is_ticking());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_signed_in_round_submits_score() {
        let submitted = Arc::new(Mutex::new(Vec::new()));
        let config = GameConfig {
            frames_per_second: 100,
            seed: Some(8),
            ..GameConfig::default()
        };
        let mut d = GameDriver::new(
            config,
            Box::new(MemoryStore::new()),
            Box::new(CountingSink(Arc::clone(&submitted))),
            SessionContext::signed_in("7", "Quorra"),
        );
        {
            let mut session = d.session.lock();
            session.start();
            // A token right in front of the player so the round scores
            let state = session.state_mut();
            let head = state.players[0].position;
            state.tokens.push(Token::new(head + IVec2::X));
        }
        let mut results = d.round_results();
        d.sync_scheduler();

        results.changed().await.unwrap();
        let summary = results.borrow().clone().unwrap();
        assert!(summary.tokens_collected >= 1);
        assert_eq!(*submitted.lock(), vec![summary.tokens_collected]);
    }
}
