//! Fixed timestep simulation tick
//!
//! Core round loop that advances the simulation deterministically.

use super::state::{GameEvent, GamePhase, GameState};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pause toggle
    pub pause: bool,
    /// Start the next wave if one can be started
    pub start_wave: bool,
}

/// Advance the game state by one fixed timestep of `dt_ms`
///
/// Order within a tick: auto-start, spawning and wave completion, bloon
/// movement and leaks, towers, projectiles, rewards.
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: u64) {
    if input.pause {
        state.toggle_pause();
    }

    // Don't tick if paused or game over
    match state.phase {
        GamePhase::Paused | GamePhase::GameOver => return,
        _ => {}
    }

    state.clock_ms += dt_ms;
    let now = state.clock_ms;

    if input.start_wave {
        state.start_wave();
    }

    // (1) Auto-start after the configured delay
    if state.phase == GamePhase::WaveComplete
        && state.settings.auto_start
        && state
            .wave_completed_at
            .is_some_and(|t| now.saturating_sub(t) >= state.settings.auto_start_delay_ms)
    {
        state.start_wave();
    }

    // (2) Spawn, then check completion
    if state.phase == GamePhase::WaveActive {
        if let Some(wave) = state.wave.as_mut() {
            if let Some(bloon) = wave.spawn_next_bloon(now, state.map.path()) {
                state.bloons.insert(bloon);
            }
        }

        let exhausted = state.wave.as_ref().is_none_or(|w| w.is_complete());
        if exhausted && state.bloons.iter().all(|b| !b.is_active()) {
            state.complete_wave();
        }
    }

    // (3) Move bloons; leaks cost a life each
    for bloon in state.bloons.iter_mut() {
        bloon.update();
    }
    let leaked: Vec<_> = state
        .bloons
        .iter()
        .filter(|b| b.alive && b.reached_end)
        .map(|b| (b.id, b.kind))
        .collect();
    if !leaked.is_empty() {
        state.bloons.retain(|b| !b.reached_end);
        let mut out_of_lives = false;
        for (id, kind) in leaked {
            state.events.push(GameEvent::BloonLeaked { id, kind });
            out_of_lives |= state.lose_life();
        }
        log::debug!("Bloons leaked, {} lives left", state.lives);
        if out_of_lives {
            state.set_game_over();
            return;
        }
    }

    // (4) Towers target and fire at post-move positions
    let bloons = state.bloons.as_slice();
    for tower in &mut state.towers {
        let shots = tower.update(bloons, now);
        state.projectiles.extend(shots);
    }

    // (5) Projectiles move and collide
    for projectile in &mut state.projectiles {
        projectile.update(state.bloons.as_mut_slice());
    }
    state.projectiles.retain(|p| p.alive);

    // (6) Rewards for every bloon popped this tick
    let popped: Vec<_> = state
        .bloons
        .iter()
        .filter(|b| !b.alive && !b.reached_end)
        .map(|b| (b.id, b.kind, b.reward))
        .collect();
    if !popped.is_empty() {
        for (id, kind, reward) in popped {
            state.credit(reward);
            state.events.push(GameEvent::BloonPopped { id, kind, reward });
        }
        state.bloons.retain(|b| b.alive);

        let bloons = &state.bloons;
        for tower in &mut state.towers {
            if tower.target.is_some_and(|id| bloons.get(id).is_none()) {
                tower.target = None;
            }
        }
    }
}
