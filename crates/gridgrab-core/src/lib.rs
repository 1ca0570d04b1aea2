pub mod effects;
pub mod engine;
pub mod gateway;
pub mod grid;
pub mod lobby;
pub mod movement;
pub mod net;
pub mod player;
pub mod resource;
pub mod round;
pub mod rules;
pub mod scheduler;
pub mod time;
pub mod world;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::gateway::Gateway;
    use crate::grid::Cell;
    use crate::net::messages::{ClientMessage, SetPlayerInfoMsg};
    use crate::player::{Player, PlayerId};
    use crate::resource::{Resource, ResourceKind};
    use crate::rules::GameRules;
    use crate::world::{RoundStatus, World};

    /// Distinct colors for builder-made players.
    const COLORS: [&str; 4] = ["#e6194b", "#3cb44b", "#4363d8", "#f58231"];

    fn named_player(id: PlayerId) -> Player {
        let mut player = Player::new(id);
        player.name = format!("Player{id}");
        player.color = COLORS[(id as usize) % COLORS.len()].to_string();
        player.ready = true;
        player
    }

    /// A waiting lobby with players `1..=n`, all named `Player{id}` and ready.
    pub fn lobby_world(n: u64, seed: u64) -> World {
        let mut world = World::seeded(GameRules::default(), seed);
        for id in 1..=n {
            world.insert_player(named_player(id));
        }
        world
    }

    /// A running round with players `1..=n` in game, all standing on (0, 0).
    pub fn running_world(n: u64, seed: u64) -> World {
        let mut world = lobby_world(n, seed);
        for player in world.players.values_mut() {
            player.in_game = true;
        }
        let round = world.round_mut();
        round.status = RoundStatus::Started;
        round.paused = false;
        round.remaining_time = round.game_time;
        world
    }

    /// Put a resource of `kind` on `cell`. Returns its index in the resource list.
    pub fn place(world: &mut World, kind: ResourceKind, cell: Cell, spawn_time: u64) -> usize {
        let resource = Resource::spawn(kind.spec(), cell, spawn_time, world.rng_mut());
        world.push_resource(resource);
        world.resources().len() - 1
    }

    /// A gateway whose `n` connections have named themselves and readied up,
    /// driven through the real event path.
    pub fn ready_gateway(n: u64, seed: u64, now: u64) -> (Gateway, Vec<PlayerId>) {
        let mut gw = Gateway::seeded(GameRules::default(), seed);
        let mut ids = Vec::new();
        for _ in 0..n {
            let (id, _) = gw.connect(now);
            ids.push(id);
        }
        for &id in &ids {
            let info = ClientMessage::SetPlayerInfo(SetPlayerInfoMsg {
                name: format!("Player{id}"),
                color: COLORS[(id as usize) % COLORS.len()].to_string(),
            });
            gw.handle(id, info, now);
            gw.handle(id, ClientMessage::SetReady, now);
        }
        (gw, ids)
    }
}
