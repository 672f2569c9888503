use crate::constants::{BOARD_HEIGHT, BOARD_WIDTH, GHOST_SPEED, MODE_PHASE_TICKS};
use crate::kinematics::{is_valid_move, move_entity};
use crate::maze::MazeGrid;
use crate::rng::Rng;
use crate::types::{Direction, GhostId, GhostMode, Pos};

#[derive(Clone, Debug)]
pub struct Ghost {
    pub id: GhostId,
    pub pos: Pos,
    pub dir: Direction,
    pub mode: GhostMode,
    pub frightened_timer: u32,
}

impl Ghost {
    pub fn spawn(id: GhostId) -> Self {
        Self {
            id,
            pos: id.home_position(),
            dir: Direction::Up,
            mode: GhostMode::Scatter,
            frightened_timer: 0,
        }
    }
}

/// Global chase/scatter cadence shared by every ghost not frightened or
/// eaten. Tick-counted so the same seed always replays the same game.
pub fn scheduled_mode(tick: u64) -> GhostMode {
    if (tick / MODE_PHASE_TICKS) % 2 == 0 {
        GhostMode::Chase
    } else {
        GhostMode::Scatter
    }
}

fn target_for(ghost: &Ghost, player_pos: Pos, rng: &mut Rng) -> Pos {
    match ghost.mode {
        GhostMode::Chase => player_pos,
        GhostMode::Scatter => ghost.id.scatter_target(),
        // Resampled every tick; there is no persistent random walk.
        GhostMode::Frightened => Pos::new(
            rng.next_f32() * BOARD_WIDTH as f32,
            rng.next_f32() * BOARD_HEIGHT as f32,
        ),
        GhostMode::Eaten => ghost.id.home_position(),
    }
}

/// Pick the legal direction whose next cell is closest to `target`.
/// Reversal is excluded unless it is the only legal move; ties resolve in
/// up/down/left/right order. With no legal candidate at all the previous
/// direction is kept and the ghost stalls against the wall.
fn choose_direction(ghost: &Ghost, target: Pos, maze: &MazeGrid) -> Direction {
    let reverse = ghost.dir.opposite();
    let mut best: Option<(f32, Direction)> = None;

    for dir in Direction::CARDINALS {
        if dir == reverse && ghost.dir != Direction::None {
            continue;
        }
        if !is_valid_move(ghost.pos, dir, maze) {
            continue;
        }
        let (dx, dy) = dir.delta();
        let next = Pos::new(ghost.pos.x + dx, ghost.pos.y + dy);
        let dist = next.distance(target);
        if best.map(|(b, _)| dist < b).unwrap_or(true) {
            best = Some((dist, dir));
        }
    }

    if let Some((_, dir)) = best {
        return dir;
    }
    if reverse != Direction::None && is_valid_move(ghost.pos, reverse, maze) {
        return reverse;
    }
    ghost.dir
}

/// Advance one ghost by one tick: pick a target from the mode, steer, move,
/// and run the mode's own bookkeeping (frightened countdown, eaten recovery).
pub fn step_ghost(ghost: &mut Ghost, player_pos: Pos, maze: &MazeGrid, rng: &mut Rng, tick: u64) {
    let target = target_for(ghost, player_pos, rng);
    let chosen = choose_direction(ghost, target, maze);
    move_entity(&mut ghost.pos, &mut ghost.dir, chosen, maze, GHOST_SPEED);

    if ghost.mode == GhostMode::Frightened && ghost.frightened_timer > 0 {
        ghost.frightened_timer -= 1;
    }

    // An eaten ghost rejoins the schedule once it is back within a grid unit
    // of home. Fractional speed means the exact home cell may never be hit.
    if ghost.mode == GhostMode::Eaten && ghost.pos.distance(ghost.id.home_position()) < 1.0 {
        ghost.mode = scheduled_mode(tick);
        ghost.frightened_timer = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MODE_PHASE_TICKS;

    fn maze() -> MazeGrid {
        MazeGrid::new().expect("builtin template is valid")
    }

    #[test]
    fn schedule_alternates_in_five_second_phases() {
        assert_eq!(scheduled_mode(0), GhostMode::Chase);
        assert_eq!(scheduled_mode(MODE_PHASE_TICKS - 1), GhostMode::Chase);
        assert_eq!(scheduled_mode(MODE_PHASE_TICKS), GhostMode::Scatter);
        assert_eq!(scheduled_mode(2 * MODE_PHASE_TICKS - 1), GhostMode::Scatter);
        assert_eq!(scheduled_mode(2 * MODE_PHASE_TICKS), GhostMode::Chase);
    }

    #[test]
    fn chase_steers_toward_the_player() {
        let maze = maze();
        let mut ghost = Ghost::spawn(GhostId::Blinky);
        ghost.pos = Pos::new(9.0, 3.0);
        ghost.dir = Direction::None;
        ghost.mode = GhostMode::Chase;
        let mut rng = Rng::new(1);

        // Player to the right along the open row.
        step_ghost(&mut ghost, Pos::new(15.0, 3.0), &maze, &mut rng, 0);
        assert_eq!(ghost.dir, Direction::Right);
        assert!(ghost.pos.x > 9.0);
    }

    #[test]
    fn scatter_heads_for_the_fixed_corner() {
        let maze = maze();
        let mut ghost = Ghost::spawn(GhostId::Pinky);
        ghost.pos = Pos::new(9.0, 3.0);
        ghost.dir = Direction::None;
        ghost.mode = GhostMode::Scatter;
        let mut rng = Rng::new(1);

        // Pinky's corner is (0,0); player position must be ignored.
        step_ghost(&mut ghost, Pos::new(17.0, 19.0), &maze, &mut rng, 0);
        assert_eq!(ghost.dir, Direction::Left);
    }

    #[test]
    fn ghost_never_reverses_when_other_moves_exist() {
        let maze = maze();
        let mut ghost = Ghost::spawn(GhostId::Blinky);
        // Open row 3: every cardinal neighbor of (4,3) except up is open.
        ghost.pos = Pos::new(4.0, 3.0);
        ghost.dir = Direction::Right;
        ghost.mode = GhostMode::Chase;
        let mut rng = Rng::new(1);

        // Player directly behind the ghost: reversing would be shortest.
        step_ghost(&mut ghost, Pos::new(1.0, 3.0), &maze, &mut rng, 0);
        assert_ne!(ghost.dir, Direction::Left);
    }

    #[test]
    fn reversal_is_allowed_when_it_is_the_only_move() {
        // Dead-end shaft: the only opening from (1,1) is straight back down.
        let mut rows: Vec<String> = vec!["#".repeat(19); 21];
        for y in 1..=3 {
            rows[y].replace_range(1..2, " ");
        }
        let refs: Vec<&str> = rows.iter().map(|row| row.as_str()).collect();
        let maze = MazeGrid::from_template(&refs).expect("dead-end template is valid");

        let mut ghost = Ghost::spawn(GhostId::Blinky);
        ghost.pos = Pos::new(1.0, 1.0);
        ghost.dir = Direction::Up;
        ghost.mode = GhostMode::Chase;
        let mut rng = Rng::new(1);

        step_ghost(&mut ghost, Pos::new(1.0, 3.0), &maze, &mut rng, 0);
        assert_eq!(ghost.dir, Direction::Down);
        assert!(ghost.pos.y > 1.0);
    }

    #[test]
    fn frightened_targeting_is_deterministic_per_seed() {
        let maze = maze();
        let mut a = Ghost::spawn(GhostId::Inky);
        let mut b = Ghost::spawn(GhostId::Inky);
        for ghost in [&mut a, &mut b] {
            ghost.pos = Pos::new(9.0, 3.0);
            ghost.dir = Direction::None;
            ghost.mode = GhostMode::Frightened;
            ghost.frightened_timer = 300;
        }
        let mut rng_a = Rng::new(777);
        let mut rng_b = Rng::new(777);

        for tick in 0..50 {
            step_ghost(&mut a, Pos::new(9.0, 15.0), &maze, &mut rng_a, tick);
            step_ghost(&mut b, Pos::new(9.0, 15.0), &maze, &mut rng_b, tick);
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.dir, b.dir);
        }
        assert_eq!(a.frightened_timer, 250);
    }

    #[test]
    fn eaten_ghost_returns_home_and_rejoins_schedule() {
        let maze = maze();
        let mut ghost = Ghost::spawn(GhostId::Blinky);
        ghost.mode = GhostMode::Eaten;
        ghost.pos = Pos::new(9.0, 3.0);
        ghost.dir = Direction::None;
        let mut rng = Rng::new(5);

        let mut recovered_at = None;
        for tick in 0..2000u64 {
            step_ghost(&mut ghost, Pos::new(1.0, 19.0), &maze, &mut rng, tick);
            if ghost.mode != GhostMode::Eaten {
                recovered_at = Some(tick);
                break;
            }
        }
        let tick = recovered_at.expect("ghost should reach home");
        assert!(ghost.pos.distance(GhostId::Blinky.home_position()) < 1.0);
        assert_eq!(ghost.mode, scheduled_mode(tick));
    }
}
