//! Session gateway: maps connection events onto the lobby, round controller,
//! and movement resolver, and returns the messages to deliver.
//!
//! The gateway owns the world and the scheduler. Callers supply the clock;
//! before any inbound event is handled, timers due up to that instant are run
//! first so events and timers interleave in time order.

use rand::rngs::StdRng;

use crate::engine;
use crate::grid::Direction;
use crate::lobby::{self, StartGate};
use crate::movement::{self, MoveOutcome};
use crate::net::messages::{
    AlertMsg, BombExplosionMsg, ClientMessage, PlayerInfoAckMsg, ServerMessage, WelcomeMsg,
};
use crate::net::outbox::{Outbound, Outbox};
use crate::player::PlayerId;
use crate::round;
use crate::rules::GameRules;
use crate::scheduler::{Scheduler, TimerTask};
use crate::world::World;

/// Attribution used when a requester has no name and supplied none.
const UNKNOWN: &str = "Unknown";

pub struct Gateway {
    world: World,
    scheduler: Scheduler,
    next_player_id: PlayerId,
}

impl Gateway {
    pub fn new(rules: GameRules, rng: StdRng) -> Self {
        Self {
            world: World::new(rules, rng),
            scheduler: Scheduler::new(),
            next_player_id: 1,
        }
    }

    pub fn seeded(rules: GameRules, seed: u64) -> Self {
        Self {
            world: World::seeded(rules, seed),
            scheduler: Scheduler::new(),
            next_player_id: 1,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    #[cfg(any(test, feature = "test-helpers"))]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Register a new connection. Late joiners sit in the queue.
    pub fn connect(&mut self, now: u64) -> (PlayerId, Vec<Outbound>) {
        let mut out = Outbox::new();
        self.run_timers(now, &mut out);

        let id = self.next_player_id;
        self.next_player_id += 1;
        lobby::join(&mut self.world, id);

        out.send_to(id, ServerMessage::Welcome(WelcomeMsg { player_id: id }));
        out.broadcast_lobby(&self.world);
        if self.world.round().is_started() {
            out.send_queue(&self.world);
        }

        tracing::info!(
            player_id = id,
            players = self.world.player_count(),
            "Player connected"
        );
        (id, out.into_vec())
    }

    /// The connection for `id` is gone.
    pub fn disconnect(&mut self, id: PlayerId, now: u64) -> Vec<Outbound> {
        let mut out = Outbox::new();
        self.run_timers(now, &mut out);
        round::on_participant_lost(&mut self.world, &mut self.scheduler, id, &mut out);
        tracing::info!(
            player_id = id,
            players = self.world.player_count(),
            "Player disconnected"
        );
        out.into_vec()
    }

    /// Run every timer due at or before `now`.
    pub fn advance(&mut self, now: u64) -> Vec<Outbound> {
        let mut out = Outbox::new();
        self.run_timers(now, &mut out);
        out.into_vec()
    }

    /// Handle one inbound event from `id`.
    pub fn handle(&mut self, id: PlayerId, msg: ClientMessage, now: u64) -> Vec<Outbound> {
        let mut out = Outbox::new();
        self.run_timers(now, &mut out);

        if self.world.player(id).is_none() {
            tracing::debug!(player_id = id, event = msg.event_name(), "Event from unknown player");
            return out.into_vec();
        }

        match msg {
            ClientMessage::SetPlayerInfo(info) => {
                self.on_player_info(id, &info.name, &info.color, &mut out);
            },
            ClientMessage::SetReady => {
                if lobby::set_ready(&mut self.world, id) {
                    out.broadcast_lobby(&self.world);
                }
            },
            ClientMessage::SetGameTime(req) => {
                if lobby::set_game_time(&mut self.world, id, req.seconds) {
                    out.broadcast_lobby(&self.world);
                }
            },
            ClientMessage::StartGame => self.on_start(id, now, &mut out),
            ClientMessage::RestartGame => {
                round::restart(&mut self.world, &mut self.scheduler, id, now, &mut out);
            },
            ClientMessage::Move(req) => self.on_move(id, req.direction, now, &mut out),
            ClientMessage::TogglePause(req) => {
                let by = self.attribution(id, req.by);
                round::toggle_pause(&mut self.world, req.paused, by, &mut out);
            },
            ClientMessage::QuitGame(req) => {
                let in_game = self.world.player(id).is_some_and(|p| p.in_game);
                if req.end_round && in_game {
                    let by = self.attribution(id, req.by);
                    round::end_by_quit(&mut self.world, &mut self.scheduler, by, &mut out);
                } else {
                    round::quit_to_lobby(&mut self.world, &mut self.scheduler, id, &mut out);
                }
            },
        }
        out.into_vec()
    }

    fn on_player_info(&mut self, id: PlayerId, name: &str, color: &str, out: &mut Outbox) {
        match lobby::set_player_info(&mut self.world, id, name, color) {
            Ok(()) => {
                out.send_to(
                    id,
                    ServerMessage::PlayerInfoAck(PlayerInfoAckMsg {
                        success: true,
                        message: None,
                    }),
                );
                out.broadcast_lobby(&self.world);
                if self.world.round().is_started() {
                    out.send_queue(&self.world);
                }
            },
            Err(e) => {
                tracing::debug!(player_id = id, error = %e, "Player info rejected");
                out.send_to(
                    id,
                    ServerMessage::PlayerInfoAck(PlayerInfoAckMsg {
                        success: false,
                        message: Some(e.to_string()),
                    }),
                );
            },
        }
    }

    fn on_start(&mut self, id: PlayerId, now: u64, out: &mut Outbox) {
        match lobby::start_gate(&self.world, id) {
            StartGate::NotHost | StartGate::InProgress => {
                tracing::debug!(player_id = id, "Start request ignored");
            },
            StartGate::Rejected => {
                out.broadcast(ServerMessage::Alert(AlertMsg::error(
                    self.world.rules().gate_message(),
                )));
            },
            StartGate::Open(roster) => {
                round::start_round(&mut self.world, &mut self.scheduler, &roster, now, out);
            },
        }
    }

    fn on_move(&mut self, id: PlayerId, requested: Direction, now: u64, out: &mut Outbox) {
        let confused = self
            .world
            .player(id)
            .is_some_and(|p| p.effects.is_confused(now));
        let direction = if confused { requested.inverted() } else { requested };

        match movement::handle_move(&mut self.world, id, direction, now) {
            MoveOutcome::Blocked => {},
            MoveOutcome::Moved { collected } => {
                out.broadcast_players(&self.world);
                if collected {
                    out.broadcast_resources(&self.world);
                    out.send_to(id, ServerMessage::ResourceCollected);
                }
            },
        }
    }

    /// Name to credit for a pause or quit: the requester's registered name,
    /// else what the client claimed.
    fn attribution(&self, id: PlayerId, supplied: Option<String>) -> String {
        if let Some(player) = self.world.player(id)
            && player.is_named()
        {
            return player.name.clone();
        }
        supplied
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn run_timers(&mut self, now: u64, out: &mut Outbox) {
        while let Some((task, due)) = self.scheduler.pop_due(now) {
            self.fire(task, due, out);
        }
    }

    fn fire(&mut self, task: TimerTask, now: u64, out: &mut Outbox) {
        let world = &mut self.world;
        match task {
            TimerTask::Countdown => round::tick_countdown(world, &mut self.scheduler, out),
            TimerTask::Spawn => {
                if engine::spawn_resource(world, now).is_some() {
                    out.broadcast_resources(world);
                }
            },
            TimerTask::Cleanup => {
                if engine::purge_expired(world, now) {
                    out.broadcast_resources(world);
                }
            },
            TimerTask::Magnet => {
                if engine::process_magnets(world, now) {
                    out.broadcast_resources(world);
                    out.broadcast_players(world);
                }
            },
            TimerTask::Bomb => {
                let report = engine::process_bombs(world, now);
                if report.is_empty() {
                    return;
                }
                for at in &report.blasts {
                    out.broadcast(ServerMessage::BombExplosion(BombExplosionMsg {
                        x: at.x,
                        y: at.y,
                    }));
                }
                out.broadcast_resources(world);
                if report.players_hit {
                    out.broadcast_players(world);
                }
                tracing::debug!(blasts = report.blasts.len(), "Bombs detonated");
            },
            TimerTask::Poison => {
                if engine::process_poison(world, now) {
                    out.broadcast_players(world);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::net::messages::{
        GameEndedMsg, MoveMsg, QuitGameMsg, SetGameTimeMsg, SetPlayerInfoMsg, TogglePauseMsg,
    };
    use crate::net::outbox::Audience;
    use crate::resource::ResourceKind;
    use crate::test_helpers::{place, ready_gateway};
    use crate::world::RoundStatus;

    fn info(name: &str, color: &str) -> ClientMessage {
        ClientMessage::SetPlayerInfo(SetPlayerInfoMsg {
            name: name.into(),
            color: color.into(),
        })
    }

    fn find<'a>(
        items: &'a [Outbound],
        pred: impl Fn(&ServerMessage) -> bool,
    ) -> Option<&'a Outbound> {
        items.iter().find(|o| pred(&o.message))
    }

    #[test]
    fn connect_welcomes_and_announces() {
        let mut gw = Gateway::seeded(GameRules::default(), 1);
        let (id, items) = gw.connect(0);
        assert_eq!(id, 1);
        assert_eq!(items[0].audience, Audience::Player(1));
        assert_eq!(
            items[0].message,
            ServerMessage::Welcome(WelcomeMsg { player_id: 1 })
        );
        assert!(matches!(items[1].message, ServerMessage::UpdateLobby(_)));

        let (second, _) = gw.connect(0);
        assert_eq!(second, 2);
        assert_eq!(gw.world().host_id(), Some(1));
    }

    #[test]
    fn duplicate_name_gets_targeted_failure() {
        let mut gw = Gateway::seeded(GameRules::default(), 1);
        let (a, _) = gw.connect(0);
        let (b, _) = gw.connect(0);

        let first = gw.handle(a, info("Ann", "#ff0000"), 10);
        assert_eq!(first[0].audience, Audience::Player(a));
        assert_eq!(
            first[0].message,
            ServerMessage::PlayerInfoAck(PlayerInfoAckMsg {
                success: true,
                message: None
            })
        );

        let second = gw.handle(b, info("Ann", "#00ff00"), 20);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].audience, Audience::Player(b));
        match &second[0].message {
            ServerMessage::PlayerInfoAck(ack) => {
                assert!(!ack.success);
                assert!(ack.message.is_some());
            },
            other => panic!("expected PlayerInfoAck, got {other:?}"),
        }
    }

    #[test]
    fn non_host_start_is_silent() {
        let (mut gw, ids) = ready_gateway(2, 3, 0);
        let items = gw.handle(ids[1], ClientMessage::StartGame, 100);
        assert!(items.is_empty());
        assert_eq!(gw.world().round().status, RoundStatus::Waiting);
    }

    #[test]
    fn host_start_with_one_player_alerts() {
        let (mut gw, ids) = ready_gateway(1, 3, 0);
        let items = gw.handle(ids[0], ClientMessage::StartGame, 100);
        assert_eq!(
            items[0].message,
            ServerMessage::Alert(AlertMsg::error("there must be at least 2-4 players"))
        );
        assert_eq!(gw.world().round().status, RoundStatus::Waiting);
        assert!(!gw.scheduler().is_armed());
    }

    #[test]
    fn scoreless_round_ends_with_nobody() {
        let (mut gw, ids) = ready_gateway(2, 9, 0);
        let host = ids[0];
        gw.handle(host, ClientMessage::SetGameTime(SetGameTimeMsg { seconds: 15.0 }), 0);
        let started = gw.handle(host, ClientMessage::StartGame, 1_000);
        assert!(find(&started, |m| matches!(m, ServerMessage::GameStarted(_))).is_some());
        assert_eq!(gw.world().round().remaining_time, 15);

        let items = gw.advance(15_999);
        assert!(find(&items, |m| matches!(m, ServerMessage::GameEnded(_))).is_none());
        assert_eq!(gw.world().round().remaining_time, 1);

        let items = gw.advance(16_000);
        let ended = find(&items, |m| matches!(m, ServerMessage::GameEnded(_))).unwrap();
        assert_eq!(
            ended.message,
            ServerMessage::GameEnded(GameEndedMsg {
                winner: "Nobody".into(),
                score: 0
            })
        );
        assert_eq!(gw.world().round().status, RoundStatus::Waiting);
        assert!(gw.world().resources().is_empty());
        assert!(!gw.scheduler().is_armed());
        assert!(gw.world().players().all(|p| !p.ready));
    }

    #[test]
    fn higher_score_wins() {
        let (mut gw, ids) = ready_gateway(2, 9, 0);
        gw.handle(ids[0], ClientMessage::StartGame, 0);
        gw.world_mut().player_mut(ids[1]).unwrap().score = 12;
        gw.world_mut().round_mut().remaining_time = 1;

        let items = gw.advance(1_000);
        let ended = find(&items, |m| matches!(m, ServerMessage::GameEnded(_))).unwrap();
        assert_eq!(
            ended.message,
            ServerMessage::GameEnded(GameEndedMsg {
                winner: "Player2".into(),
                score: 12
            })
        );
    }

    #[test]
    fn pause_holds_countdown() {
        let (mut gw, ids) = ready_gateway(2, 4, 0);
        gw.handle(ids[0], ClientMessage::StartGame, 0);
        gw.advance(50_000);
        assert_eq!(gw.world().round().remaining_time, 10);

        let pause = ClientMessage::TogglePause(TogglePauseMsg {
            paused: true,
            by: None,
        });
        let items = gw.handle(ids[1], pause, 50_000);
        assert_eq!(
            find(&items, |m| matches!(m, ServerMessage::TogglePause(_)))
                .unwrap()
                .message,
            ServerMessage::TogglePause(crate::net::messages::PauseStateMsg {
                paused: true,
                by: "Player2".into()
            })
        );

        gw.advance(55_000);
        assert_eq!(gw.world().round().remaining_time, 10);

        let resume = ClientMessage::TogglePause(TogglePauseMsg {
            paused: false,
            by: None,
        });
        gw.handle(ids[1], resume, 55_000);
        assert_eq!(gw.world().round().remaining_time, 10);
        gw.advance(56_000);
        assert_eq!(gw.world().round().remaining_time, 9);
    }

    #[test]
    fn bomb_blast_damages_and_clears_nearby() {
        let (mut gw, ids) = ready_gateway(2, 6, 0);
        gw.handle(ids[0], ClientMessage::StartGame, 1_000);

        let world = gw.world_mut();
        world.player_mut(ids[0]).unwrap().set_cell(Cell::new(5, 5));
        world.player_mut(ids[0]).unwrap().score = 5;
        world.player_mut(ids[1]).unwrap().set_cell(Cell::new(15, 15));
        world.player_mut(ids[1]).unwrap().score = 5;
        let bomb = place(world, ResourceKind::TimeBomb, Cell::new(5, 6), 1_000);
        world.resources[bomb].explode_time = Some(2_000);
        place(world, ResourceKind::Gold, Cell::new(6, 7), 1_000);
        place(world, ResourceKind::Silver, Cell::new(12, 12), 1_000);

        let items = gw.advance(1_900);
        assert!(find(&items, |m| matches!(m, ServerMessage::BombExplosion(_))).is_none());

        let items = gw.advance(2_000);
        assert_eq!(
            find(&items, |m| matches!(m, ServerMessage::BombExplosion(_)))
                .unwrap()
                .message,
            ServerMessage::BombExplosion(BombExplosionMsg { x: 5, y: 6 })
        );
        assert_eq!(gw.world().player(ids[0]).unwrap().score, 2);
        assert_eq!(gw.world().player(ids[1]).unwrap().score, 5);
        let left: Vec<ResourceKind> = gw.world().resources().iter().map(|r| r.kind).collect();
        assert_eq!(left, vec![ResourceKind::Silver]);
    }

    #[test]
    fn confusion_inverts_moves() {
        let (mut gw, ids) = ready_gateway(2, 2, 0);
        gw.handle(ids[0], ClientMessage::StartGame, 0);
        let player = gw.world_mut().player_mut(ids[0]).unwrap();
        player.set_cell(Cell::new(0, 0));
        player.effects.confused_until = Some(10_000);

        let step = ClientMessage::Move(MoveMsg {
            direction: Direction::Left,
        });
        let items = gw.handle(ids[0], step.clone(), 100);
        assert!(find(&items, |m| matches!(m, ServerMessage::UpdatePlayers(_))).is_some());
        assert_eq!(gw.world().player(ids[0]).unwrap().cell(), Cell::new(1, 0));

        gw.world_mut().player_mut(ids[0]).unwrap().effects.confused_until = None;
        gw.handle(ids[0], step, 200);
        assert_eq!(gw.world().player(ids[0]).unwrap().cell(), Cell::new(0, 0));
    }

    #[test]
    fn collection_notifies_collector() {
        let (mut gw, ids) = ready_gateway(2, 2, 0);
        gw.handle(ids[0], ClientMessage::StartGame, 0);
        let world = gw.world_mut();
        world.player_mut(ids[0]).unwrap().set_cell(Cell::new(3, 3));
        world.player_mut(ids[1]).unwrap().set_cell(Cell::new(10, 10));
        place(world, ResourceKind::Gold, Cell::new(4, 3), 0);

        let items = gw.handle(
            ids[0],
            ClientMessage::Move(MoveMsg {
                direction: Direction::Right,
            }),
            100,
        );
        let collected = find(&items, |m| matches!(m, ServerMessage::ResourceCollected)).unwrap();
        assert_eq!(collected.audience, Audience::Player(ids[0]));
        assert_eq!(gw.world().player(ids[0]).unwrap().score, 3);
    }

    #[test]
    fn late_joiner_is_queued() {
        let (mut gw, ids) = ready_gateway(2, 2, 0);
        gw.handle(ids[0], ClientMessage::StartGame, 0);
        let (late, items) = gw.connect(500);
        assert!(!gw.world().player(late).unwrap().in_game);
        let queue = find(&items, |m| matches!(m, ServerMessage::UpdateQueue(_))).unwrap();
        assert_eq!(queue.audience, Audience::Players(vec![late]));
    }

    #[test]
    fn quit_with_end_round_attributes_requester() {
        let (mut gw, ids) = ready_gateway(2, 2, 0);
        gw.handle(ids[0], ClientMessage::StartGame, 0);
        let items = gw.handle(
            ids[1],
            ClientMessage::QuitGame(QuitGameMsg {
                by: Some("Someone Else".into()),
                end_round: true,
            }),
            500,
        );
        let quit = find(&items, |m| matches!(m, ServerMessage::GameQuit(_))).unwrap();
        assert_eq!(
            quit.message,
            ServerMessage::GameQuit(crate::net::messages::GameQuitMsg {
                by: "Player2".into()
            })
        );
        assert!(!gw.scheduler().is_armed());
    }

    #[test]
    fn disconnect_mid_round_ends_it() {
        let (mut gw, ids) = ready_gateway(2, 2, 0);
        gw.handle(ids[0], ClientMessage::StartGame, 0);
        let items = gw.disconnect(ids[0], 500);
        assert!(find(&items, |m| matches!(m, ServerMessage::GameEnded(_))).is_some());
        assert_eq!(gw.world().host_id(), Some(ids[1]));
        assert!(!gw.scheduler().is_armed());
    }

    #[test]
    fn unknown_player_events_are_dropped() {
        let mut gw = Gateway::seeded(GameRules::default(), 1);
        assert!(gw.handle(42, ClientMessage::SetReady, 0).is_empty());
    }
}
