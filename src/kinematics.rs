use crate::constants::{BOARD_HEIGHT, BOARD_WIDTH};
use crate::maze::MazeGrid;
use crate::types::{CellType, Direction, Pos};

/// Whether an entity at `pos` may head one cell in `dir`. The target cell is
/// the rounded coordinate of `pos + dir`. Vertical out-of-bounds is blocking;
/// horizontal out-of-bounds wraps onto the far column so the tunnel row stays
/// passable from either edge. Doors do not block here; keeping ghosts out of
/// the house is a caller policy, not a kinematics rule.
pub fn is_valid_move(pos: Pos, dir: Direction, maze: &MazeGrid) -> bool {
    let (dx, dy) = dir.delta();
    let target_x = (pos.x + dx).round() as i32;
    let target_y = (pos.y + dy).round() as i32;

    if target_y < 0 || target_y >= BOARD_HEIGHT {
        return false;
    }
    let target_x = target_x.rem_euclid(BOARD_WIDTH);
    maze.cell_at(target_x, target_y) != CellType::Wall
}

/// Advance an entity by one tick. `desired` is adopted as the active
/// direction when it is non-zero and currently legal; the entity then moves
/// `speed` grid units along the active direction, wrapping horizontally
/// through the tunnel. An illegal active direction stalls the entity and
/// drops the direction to `None`. Positions stay real-valued.
pub fn move_entity(
    pos: &mut Pos,
    active: &mut Direction,
    desired: Direction,
    maze: &MazeGrid,
    speed: f32,
) {
    if desired != Direction::None && is_valid_move(*pos, desired, maze) {
        *active = desired;
    }

    if is_valid_move(*pos, *active, maze) {
        let (dx, dy) = active.delta();
        pos.x += dx * speed;
        pos.y += dy * speed;

        if pos.x < 0.0 {
            pos.x = (BOARD_WIDTH - 1) as f32;
        } else if pos.x >= BOARD_WIDTH as f32 {
            pos.x = 0.0;
        }
    } else {
        *active = Direction::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maze() -> MazeGrid {
        MazeGrid::new().expect("builtin template is valid")
    }

    #[test]
    fn walls_and_vertical_bounds_block() {
        let maze = maze();
        // (1,1) has walls above and to the left.
        let pos = Pos::new(1.0, 1.0);
        assert!(!is_valid_move(pos, Direction::Up, &maze));
        assert!(!is_valid_move(pos, Direction::Left, &maze));
        assert!(is_valid_move(pos, Direction::Down, &maze));
        assert!(is_valid_move(pos, Direction::Right, &maze));

        // Off the top and bottom of the board is always blocking.
        assert!(!is_valid_move(Pos::new(9.0, 0.0), Direction::Up, &maze));
        assert!(!is_valid_move(Pos::new(9.0, 20.0), Direction::Down, &maze));
    }

    #[test]
    fn tunnel_edges_are_legal_moves() {
        let maze = maze();
        assert!(is_valid_move(Pos::new(0.0, 10.0), Direction::Left, &maze));
        assert!(is_valid_move(Pos::new(18.0, 10.0), Direction::Right, &maze));
        // Same columns off the tunnel row hit the border wall.
        assert!(!is_valid_move(Pos::new(0.0, 9.0), Direction::Left, &maze));
        assert!(!is_valid_move(Pos::new(18.0, 9.0), Direction::Right, &maze));
    }

    #[test]
    fn door_is_passable() {
        let maze = maze();
        // From above the house, heading down through the door at (9,8).
        assert!(is_valid_move(Pos::new(9.0, 7.0), Direction::Down, &maze));
        // And from inside heading up.
        assert!(is_valid_move(Pos::new(9.0, 9.0), Direction::Up, &maze));
    }

    #[test]
    fn desired_direction_is_adopted_when_legal() {
        let maze = maze();
        let mut pos = Pos::new(9.0, 3.0);
        let mut dir = Direction::Right;
        move_entity(&mut pos, &mut dir, Direction::Down, &maze, 1.0);
        // (9,4) is a wall, so the turn request is absorbed silently.
        assert_eq!(dir, Direction::Right);
        assert_eq!(pos.cell(), (10, 3));

        let mut pos = Pos::new(4.0, 3.0);
        let mut dir = Direction::Right;
        move_entity(&mut pos, &mut dir, Direction::Down, &maze, 1.0);
        assert_eq!(dir, Direction::Down);
        assert_eq!(pos.cell(), (4, 4));
    }

    #[test]
    fn blocked_entity_stalls_to_none() {
        let maze = maze();
        let mut pos = Pos::new(1.0, 1.0);
        let mut dir = Direction::Up;
        move_entity(&mut pos, &mut dir, Direction::None, &maze, 1.0);
        assert_eq!(dir, Direction::None);
        assert_eq!(pos, Pos::new(1.0, 1.0));
    }

    #[test]
    fn fractional_speed_keeps_sub_cell_position() {
        let maze = maze();
        let mut pos = Pos::new(9.0, 3.0);
        let mut dir = Direction::Right;
        move_entity(&mut pos, &mut dir, Direction::None, &maze, 0.18);
        assert!((pos.x - 9.18).abs() < 1e-6);
        assert_eq!(pos.cell(), (9, 3));
    }

    #[test]
    fn tunnel_wraps_left_and_right() {
        let maze = maze();

        let mut pos = Pos::new(0.0, 10.0);
        let mut dir = Direction::Left;
        move_entity(&mut pos, &mut dir, Direction::None, &maze, 1.0);
        assert_eq!(pos.x, (BOARD_WIDTH - 1) as f32);
        assert_eq!(pos.y, 10.0);

        let mut pos = Pos::new(18.0, 10.0);
        let mut dir = Direction::Right;
        move_entity(&mut pos, &mut dir, Direction::None, &maze, 1.0);
        assert_eq!(pos.x, 0.0);
        assert_eq!(pos.y, 10.0);
    }

    #[test]
    fn no_vertical_wrap() {
        let maze = maze();
        let mut pos = Pos::new(9.0, 0.0);
        let mut dir = Direction::Up;
        move_entity(&mut pos, &mut dir, Direction::None, &maze, 1.0);
        assert_eq!(pos, Pos::new(9.0, 0.0));
        assert_eq!(dir, Direction::None);
    }
}
