use crate::engine;
use crate::grid::Direction;
use crate::player::PlayerId;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Round not running, player not in the round, or player frozen.
    Blocked,
    Moved { collected: bool },
}

/// Move a participant one cell and pick up whatever is there.
///
/// `direction` is the effective direction: confusion has already been
/// applied by the caller.
pub fn handle_move(
    world: &mut World,
    player_id: PlayerId,
    direction: Direction,
    now: u64,
) -> MoveOutcome {
    if !world.round().is_running() {
        return MoveOutcome::Blocked;
    }
    let Some(player) = world.player_mut(player_id) else {
        return MoveOutcome::Blocked;
    };
    if !player.in_game || player.effects.is_frozen(now) {
        return MoveOutcome::Blocked;
    }
    let next = player.cell().step(direction);
    player.set_cell(next);

    let collected = engine::collect_at(world, player_id, now);
    MoveOutcome::Moved { collected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Effect;
    use crate::grid::Cell;
    use crate::resource::ResourceKind;
    use crate::test_helpers::{place, running_world};

    #[test]
    fn move_wraps_around_edges() {
        let mut world = running_world(1, 1);
        world.player_mut(1).unwrap().set_cell(Cell::new(0, 0));
        assert_eq!(
            handle_move(&mut world, 1, Direction::Left, 0),
            MoveOutcome::Moved { collected: false }
        );
        assert_eq!(world.player(1).unwrap().cell(), Cell::new(19, 0));
        handle_move(&mut world, 1, Direction::Up, 0);
        assert_eq!(world.player(1).unwrap().cell(), Cell::new(19, 19));
    }

    #[test]
    fn move_collects_on_arrival() {
        let mut world = running_world(1, 1);
        place(&mut world, ResourceKind::Silver, Cell::new(1, 0), 0);
        assert_eq!(
            handle_move(&mut world, 1, Direction::Right, 10),
            MoveOutcome::Moved { collected: true }
        );
        assert_eq!(world.player(1).unwrap().score, 2);
    }

    #[test]
    fn frozen_player_cannot_move() {
        let mut world = running_world(1, 1);
        world.player_mut(1).unwrap().effects.apply(Effect::Freeze, 0);
        assert_eq!(handle_move(&mut world, 1, Direction::Down, 3_999), MoveOutcome::Blocked);
        assert_eq!(world.player(1).unwrap().cell(), Cell::new(0, 0));
        assert!(matches!(
            handle_move(&mut world, 1, Direction::Down, 4_000),
            MoveOutcome::Moved { .. }
        ));
    }

    #[test]
    fn paused_round_blocks_moves() {
        let mut world = running_world(1, 1);
        world.round_mut().paused = true;
        assert_eq!(handle_move(&mut world, 1, Direction::Down, 0), MoveOutcome::Blocked);
    }

    #[test]
    fn queued_player_cannot_move() {
        let mut world = running_world(2, 1);
        world.player_mut(2).unwrap().in_game = false;
        assert_eq!(handle_move(&mut world, 2, Direction::Down, 0), MoveOutcome::Blocked);
        assert_eq!(handle_move(&mut world, 99, Direction::Down, 0), MoveOutcome::Blocked);
    }
}
