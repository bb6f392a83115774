//! Battle Tron entry point
//!
//! Native builds run a headless demo: the autopilot steers every player for
//! a few rounds while the driver ticks in real time. An optional argument
//! names a JSON config file.

#[cfg(not(target_arch = "wasm32"))]
const DEMO_ROUNDS: u32 = 3;

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() {
    use battle_tron::autopilot::choose_direction;
    use battle_tron::driver::GameDriver;
    use battle_tron::persistence::FileStore;
    use battle_tron::scoring::{LogScoreSink, SessionContext};
    use battle_tron::sim::Intent;
    use battle_tron::{GameConfig, GameMode};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Battle Tron (native demo) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => match GameConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };
    let tick = config.tick_interval();

    let mut driver = GameDriver::new(
        config,
        Box::new(FileStore::new("battle_tron_scores.json")),
        Box::new(LogScoreSink),
        SessionContext::anonymous(),
    );
    let mut results = driver.round_results();
    driver.start();

    for round in 1..=DEMO_ROUNDS {
        loop {
            tokio::select! {
                changed = results.changed() => {
                    if changed.is_err() {
                        log::error!("Round result channel closed");
                        return;
                    }
                    break;
                }
                _ = tokio::time::sleep(tick / 2) => {
                    let state = driver.snapshot();
                    for player in state.players.iter().filter(|p| p.is_alive) {
                        if let Some(direction) = choose_direction(&state, player.id) {
                            driver.submit_intent(Intent::Steer { player: player.id, direction });
                        }
                    }
                }
            }
        }

        if let Some(summary) = results.borrow_and_update().clone() {
            match summary.mode {
                GameMode::Single => log::info!(
                    "Demo round {}: {} tokens, best {}{}",
                    round,
                    summary.tokens_collected,
                    summary.high_score,
                    if summary.new_high_score { " (new!)" } else { "" }
                ),
                GameMode::Two => log::info!(
                    "Demo round {}: winner {:?}, scores {:?}",
                    round,
                    summary.winner,
                    summary.scores
                ),
            }
        }

        if round < DEMO_ROUNDS {
            driver.next_round();
        }
    }

    driver.stop();
    log::info!("Demo finished, high score {}", driver.high_score());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly; there is no wasm entry point
}
