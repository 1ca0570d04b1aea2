//! Round lifecycle: waiting -> started -> waiting.
//!
//! Every transition keeps the scheduler in step with the round: timers are
//! armed exactly when a round starts and all of them are cancelled whenever
//! it ends, so a restart never leaves a second set running.

use crate::grid::Cell;
use crate::lobby;
use crate::net::messages::{
    AlertMsg, GameEndedMsg, GameQuitMsg, GameStartedMsg, PauseStateMsg, ServerMessage,
};
use crate::net::outbox::Outbox;
use crate::player::PlayerId;
use crate::scheduler::Scheduler;
use crate::world::{RoundStatus, World};

/// Name reported when nobody wins.
pub const NOBODY: &str = "Nobody";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    pub winner: String,
    pub score: u32,
}

/// Highest-scoring participants, joined with " and " on a tie.
///
/// A round where nobody scored (or nobody took part) has no winner.
pub fn decide_winner(world: &World) -> RoundResult {
    let best = world.participants().map(|p| p.score).max().unwrap_or(0);
    if best == 0 {
        return RoundResult {
            winner: NOBODY.to_string(),
            score: 0,
        };
    }
    let names: Vec<&str> = world
        .participants()
        .filter(|p| p.score == best)
        .map(|p| p.display_name())
        .collect();
    RoundResult {
        winner: names.join(" and "),
        score: best,
    }
}

/// Begin a round with `roster` playing and everyone else queued.
pub fn start_round(
    world: &mut World,
    scheduler: &mut Scheduler,
    roster: &[PlayerId],
    now: u64,
    out: &mut Outbox,
) {
    let game_time = world.round().game_time;
    {
        let round = world.round_mut();
        round.status = RoundStatus::Started;
        round.paused = false;
        round.remaining_time = game_time;
    }
    world.clear_resources();

    let ids: Vec<PlayerId> = world.players().map(|p| p.id).collect();
    for id in ids {
        let cell = Cell::random(world.rng_mut());
        let Some(player) = world.player_mut(id) else {
            continue;
        };
        player.in_game = roster.contains(&id);
        if player.in_game {
            player.set_cell(cell);
            player.score = 0;
            player.effects.clear();
        }
    }

    scheduler.start_all(now);

    out.broadcast(ServerMessage::GameStarted(GameStartedMsg {
        players: world.participants().cloned().collect(),
        resources: world.resources().to_vec(),
    }));
    out.broadcast_timer(world);
    out.send_queue(world);

    tracing::info!(
        participants = roster.len(),
        queued = world.queued().count(),
        game_time,
        "Round started"
    );
}

/// One second of countdown. Reaching zero ends the round.
pub fn tick_countdown(world: &mut World, scheduler: &mut Scheduler, out: &mut Outbox) {
    if !world.round().is_running() {
        return;
    }
    let round = world.round_mut();
    round.remaining_time = round.remaining_time.saturating_sub(1);
    let remaining = round.remaining_time;
    out.broadcast_timer(world);
    if remaining == 0 {
        end_by_timeout(world, scheduler, out);
    }
}

/// Stop all timers and send everyone back to the lobby.
fn finish_round(world: &mut World, scheduler: &mut Scheduler) {
    scheduler.cancel_all();
    world.reset_round();
    let ids: Vec<PlayerId> = world.players().map(|p| p.id).collect();
    for id in ids {
        if let Some(player) = world.player_mut(id) {
            player.ready = false;
            player.in_game = false;
        }
    }
}

/// End the round normally and announce the winner.
pub fn end_by_timeout(world: &mut World, scheduler: &mut Scheduler, out: &mut Outbox) {
    if !world.round().is_started() {
        return;
    }
    let result = decide_winner(world);
    finish_round(world, scheduler);

    tracing::info!(winner = %result.winner, score = result.score, "Round ended");
    out.broadcast(ServerMessage::GameEnded(GameEndedMsg {
        winner: result.winner,
        score: result.score,
    }));
    out.broadcast_lobby(world);
}

/// Halt the round for everyone on a participant's request.
pub fn end_by_quit(world: &mut World, scheduler: &mut Scheduler, by: String, out: &mut Outbox) {
    if !world.round().is_started() {
        return;
    }
    finish_round(world, scheduler);

    tracing::info!(by = %by, "Round quit");
    out.broadcast(ServerMessage::GameQuit(GameQuitMsg { by }));
    out.broadcast_lobby(world);
}

/// A participant leaves the round but stays connected, joining the queue.
///
/// The round carries on unless too few participants remain.
pub fn quit_to_lobby(
    world: &mut World,
    scheduler: &mut Scheduler,
    id: PlayerId,
    out: &mut Outbox,
) {
    if !world.round().is_started() {
        return;
    }
    let Some(player) = world.player_mut(id) else {
        return;
    };
    if !player.in_game {
        return;
    }
    player.in_game = false;
    player.ready = false;

    out.broadcast_players(world);
    out.send_queue(world);

    if world.participant_count() < world.rules().min_players {
        end_by_timeout(world, scheduler, out);
        return;
    }
    out.broadcast_lobby(world);
}

/// Start a fresh round straight away with whoever is connected.
pub fn restart(
    world: &mut World,
    scheduler: &mut Scheduler,
    requester: PlayerId,
    now: u64,
    out: &mut Outbox,
) {
    let Some(by) = world
        .player(requester)
        .filter(|p| p.is_named())
        .map(|p| p.name.clone())
    else {
        return;
    };
    let Some(roster) = lobby::restart_roster(world) else {
        out.broadcast(ServerMessage::Alert(AlertMsg::error(
            world.rules().gate_message(),
        )));
        return;
    };

    scheduler.cancel_all();
    for &id in &roster {
        if let Some(player) = world.player_mut(id) {
            player.ready = true;
        }
    }
    start_round(world, scheduler, &roster, now, out);
    out.broadcast(ServerMessage::Alert(AlertMsg::info(format!(
        "Game restarted by {by}"
    ))));
}

/// Set the global pause flag. Only meaningful while a round is started.
pub fn toggle_pause(world: &mut World, paused: bool, by: String, out: &mut Outbox) {
    if !world.round().is_started() {
        return;
    }
    world.round_mut().paused = paused;
    out.broadcast(ServerMessage::TogglePause(PauseStateMsg { paused, by }));
}

/// A connection is gone: drop its player and repair the round around it.
pub fn on_participant_lost(
    world: &mut World,
    scheduler: &mut Scheduler,
    id: PlayerId,
    out: &mut Outbox,
) {
    let Some(removed) = lobby::leave(world, id) else {
        return;
    };
    if world.player_count() == 0 {
        scheduler.cancel_all();
        return;
    }

    if world.round().is_started() {
        if removed.in_game {
            if world.participant_count() < world.rules().min_players {
                end_by_timeout(world, scheduler, out);
                return;
            }
            out.broadcast_players(world);
        } else {
            out.send_queue(world);
        }
    }
    out.broadcast_lobby(world);
}
