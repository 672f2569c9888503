use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub fn delta(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
            Self::None => (0.0, 0.0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    pub const CARDINALS: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Empty,
    Wall,
    Pellet,
    PowerPellet,
    Door,
}

impl CellType {
    pub fn is_pellet(self) -> bool {
        matches!(self, Self::Pellet | Self::PowerPellet)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    Chase,
    Scatter,
    Frightened,
    Eaten,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Menu,
    Playing,
    Paused,
    GameOver,
    Won,
}

/// Real-valued position in grid units. Speeds are fractional, so entities sit
/// between cells; grid lookups always go through `cell()`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Pos {
    pub x: f32,
    pub y: f32,
}

impl Pos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn cell(self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    pub fn distance(self, other: Pos) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostId {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostId {
    pub const ALL: [GhostId; 4] = [Self::Blinky, Self::Pinky, Self::Inky, Self::Clyde];

    /// Spawn cell inside the ghost house; also the EATEN return target.
    pub fn home_position(self) -> Pos {
        match self {
            Self::Blinky => Pos::new(9.0, 9.0),
            Self::Pinky => Pos::new(8.0, 10.0),
            Self::Inky => Pos::new(9.0, 10.0),
            Self::Clyde => Pos::new(10.0, 10.0),
        }
    }

    pub fn scatter_target(self) -> Pos {
        match self {
            Self::Blinky => Pos::new(18.0, 0.0),
            Self::Pinky => Pos::new(0.0, 0.0),
            Self::Inky => Pos::new(18.0, 20.0),
            Self::Clyde => Pos::new(0.0, 20.0),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "mouthOpen")]
    pub mouth_open: bool,
    #[serde(rename = "animationFrame")]
    pub animation_frame: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: GhostId,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub mode: GhostMode,
    #[serde(rename = "frightenedTimer")]
    pub frightened_timer: u32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        x: i32,
        y: i32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
    },
    GhostEaten {
        ghost: GhostId,
        points: i32,
    },
    LifeLost {
        #[serde(rename = "livesLeft")]
        lives_left: i32,
    },
    GameWon,
    GameOver,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub status: GameStatus,
    pub score: i32,
    pub lives: i32,
    pub level: i32,
    #[serde(rename = "pelletCount")]
    pub pellet_count: i32,
    #[serde(rename = "powerPelletActive")]
    pub power_pellet_active: bool,
    #[serde(rename = "powerPelletTimer")]
    pub power_pellet_timer: u32,
    #[serde(rename = "frightenedScore")]
    pub frightened_score: i32,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<RuntimeEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::CARDINALS {
            assert_eq!(dir.opposite().opposite(), dir);
        }
        assert_eq!(Direction::None.opposite(), Direction::None);
    }

    #[test]
    fn cell_rounds_to_nearest() {
        assert_eq!(Pos::new(3.4, 7.6).cell(), (3, 8));
        assert_eq!(Pos::new(3.5, 0.0).cell(), (4, 0));
        assert_eq!(Pos::new(0.0, 0.0).cell(), (0, 0));
    }

    #[test]
    fn scatter_targets_sit_in_distinct_corners() {
        let targets: Vec<(i32, i32)> = GhostId::ALL
            .iter()
            .map(|id| id.scatter_target().cell())
            .collect();
        for (idx, a) in targets.iter().enumerate() {
            for b in targets.iter().skip(idx + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
