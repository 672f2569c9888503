use crate::constants::{
    FRIGHTENED_BASE_SCORE, GHOST_COLLISION_RADIUS, PELLET_POINTS, PLAYER_SPEED,
    POWER_PELLET_DURATION_TICKS, POWER_PELLET_POINTS, STARTING_LIVES,
};
use crate::ghost::{scheduled_mode, step_ghost, Ghost};
use crate::kinematics::move_entity;
use crate::maze::{MazeError, MazeGrid};
use crate::rng::Rng;
use crate::types::{
    CellType, Direction, GameStatus, GhostId, GhostMode, GhostView, PlayerView, Pos, RuntimeEvent,
    Snapshot,
};

#[derive(Clone, Debug)]
struct Player {
    pos: Pos,
    dir: Direction,
    animation_frame: u32,
    mouth_open: bool,
}

impl Player {
    fn spawn() -> Self {
        Self {
            pos: Pos::new(9.0, 15.0),
            dir: Direction::None,
            animation_frame: 0,
            mouth_open: true,
        }
    }
}

/// The whole simulation behind one seed: maze, player, ghosts, scoring and
/// lifecycle. Everything advances through `step`, one tick at a time.
pub struct GameEngine {
    maze: MazeGrid,
    player: Player,
    ghosts: Vec<Ghost>,
    status: GameStatus,
    score: i32,
    lives: i32,
    level: i32,
    pellet_count: i32,
    power_pellet_active: bool,
    power_pellet_timer: u32,
    frightened_score: i32,
    rng: Rng,
    tick: u64,
    events: Vec<RuntimeEvent>,
    seed: u32,
}

impl GameEngine {
    pub fn new(seed: u32) -> Result<Self, MazeError> {
        let maze = MazeGrid::new()?;
        let pellet_count = maze.count_pellets();
        Ok(Self {
            maze,
            player: Player::spawn(),
            ghosts: GhostId::ALL.iter().map(|&id| Ghost::spawn(id)).collect(),
            status: GameStatus::Menu,
            score: 0,
            lives: STARTING_LIVES,
            level: 1,
            pellet_count,
            power_pellet_active: false,
            power_pellet_timer: 0,
            frightened_score: FRIGHTENED_BASE_SCORE,
            rng: Rng::new(seed),
            tick: 0,
            events: Vec::new(),
            seed,
        })
    }

    /// Fresh board, fresh entities, fresh rng stream. Scores and lives reset.
    fn reset_world(&mut self) -> Result<(), MazeError> {
        self.maze = MazeGrid::new()?;
        self.pellet_count = self.maze.count_pellets();
        self.player = Player::spawn();
        self.ghosts = GhostId::ALL.iter().map(|&id| Ghost::spawn(id)).collect();
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.level = 1;
        self.power_pellet_active = false;
        self.power_pellet_timer = 0;
        self.frightened_score = FRIGHTENED_BASE_SCORE;
        self.rng = Rng::new(self.seed);
        self.tick = 0;
        self.events.clear();
        Ok(())
    }

    /// Respawn player and ghosts after a life is lost. The maze, the score and
    /// the eaten-pellet progress all survive; the power window does not.
    fn reset_positions(&mut self) {
        self.player = Player::spawn();
        self.ghosts = GhostId::ALL.iter().map(|&id| Ghost::spawn(id)).collect();
        self.power_pellet_active = false;
        self.power_pellet_timer = 0;
        self.frightened_score = FRIGHTENED_BASE_SCORE;
    }

    pub fn start(&mut self) -> Result<(), MazeError> {
        self.reset_world()?;
        self.status = GameStatus::Playing;
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.status == GameStatus::Playing {
            self.status = GameStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.status == GameStatus::Paused {
            self.status = GameStatus::Playing;
        }
    }

    /// Back to the menu from any state, dropping the game in progress.
    pub fn restart(&mut self) -> Result<(), MazeError> {
        self.reset_world()?;
        self.status = GameStatus::Menu;
        Ok(())
    }

    /// Advance one tick. `queued` is the player's latest turn request; it is
    /// applied when legal and otherwise absorbed. Outside PLAYING the call is
    /// an identity.
    pub fn step(&mut self, queued: Direction) {
        if self.status != GameStatus::Playing {
            return;
        }
        self.tick += 1;

        move_entity(
            &mut self.player.pos,
            &mut self.player.dir,
            queued,
            &self.maze,
            PLAYER_SPEED,
        );
        self.player.animation_frame = self.player.animation_frame.wrapping_add(1);
        self.player.mouth_open = (self.player.animation_frame / 5) % 2 == 0;

        self.resolve_pellet();
        self.tick_power_window();

        let player_pos = self.player.pos;
        for ghost in &mut self.ghosts {
            step_ghost(ghost, player_pos, &self.maze, &mut self.rng, self.tick);
        }

        self.resolve_collisions();

        // The win check runs after collisions: clearing the board on the same
        // tick as losing the last life still counts as a win.
        if self.pellet_count <= 0 {
            self.status = GameStatus::Won;
            self.events.push(RuntimeEvent::GameWon);
            return;
        }

        // Frightened and eaten ghosts sit outside the schedule; everyone else
        // follows the shared cadence, including ghosts that recovered from
        // EATEN mid-window.
        let mode = scheduled_mode(self.tick);
        for ghost in &mut self.ghosts {
            if matches!(ghost.mode, GhostMode::Chase | GhostMode::Scatter) {
                ghost.mode = mode;
            }
        }
    }

    fn resolve_pellet(&mut self) {
        let (x, y) = self.player.pos.cell();
        match self.maze.cell_at(x, y) {
            CellType::Pellet => {
                self.maze.consume_pellet(x, y);
                self.pellet_count -= 1;
                self.score += PELLET_POINTS;
                self.events.push(RuntimeEvent::PelletEaten { x, y });
            }
            CellType::PowerPellet => {
                self.maze.consume_pellet(x, y);
                self.pellet_count -= 1;
                self.score += POWER_PELLET_POINTS;
                self.power_pellet_active = true;
                self.power_pellet_timer = POWER_PELLET_DURATION_TICKS;
                self.frightened_score = FRIGHTENED_BASE_SCORE;
                // Overrides any prior mode, EATEN included.
                for ghost in &mut self.ghosts {
                    ghost.mode = GhostMode::Frightened;
                    ghost.frightened_timer = POWER_PELLET_DURATION_TICKS;
                }
                self.events.push(RuntimeEvent::PowerPelletEaten { x, y });
            }
            _ => {}
        }
    }

    fn tick_power_window(&mut self) {
        if !self.power_pellet_active {
            return;
        }
        self.power_pellet_timer = self.power_pellet_timer.saturating_sub(1);
        if self.power_pellet_timer == 0 {
            self.power_pellet_active = false;
            self.frightened_score = FRIGHTENED_BASE_SCORE;
            // Expiry reverts to CHASE; the scheduler takes over from the next
            // schedule pass.
            for ghost in &mut self.ghosts {
                if ghost.mode == GhostMode::Frightened {
                    ghost.mode = GhostMode::Chase;
                    ghost.frightened_timer = 0;
                }
            }
        }
    }

    /// Ghost/player contacts, in fixed ghost order. Every frightened contact
    /// on a tick resolves, doubling the bounty each time; the first lethal
    /// contact ends the sweep.
    fn resolve_collisions(&mut self) {
        for idx in 0..self.ghosts.len() {
            if self.ghosts[idx].pos.distance(self.player.pos) >= GHOST_COLLISION_RADIUS {
                continue;
            }
            match self.ghosts[idx].mode {
                GhostMode::Frightened => {
                    let points = self.frightened_score;
                    self.score += points;
                    self.frightened_score *= 2;
                    self.ghosts[idx].mode = GhostMode::Eaten;
                    self.ghosts[idx].frightened_timer = 0;
                    let ghost = self.ghosts[idx].id;
                    self.events.push(RuntimeEvent::GhostEaten { ghost, points });
                }
                // A ghost on its way home is harmless.
                GhostMode::Eaten => {}
                GhostMode::Chase | GhostMode::Scatter => {
                    self.lives -= 1;
                    self.events.push(RuntimeEvent::LifeLost {
                        lives_left: self.lives,
                    });
                    if self.lives <= 0 {
                        self.status = GameStatus::GameOver;
                        self.events.push(RuntimeEvent::GameOver);
                    } else {
                        self.reset_positions();
                    }
                    break;
                }
            }
        }
    }

    /// Serializable view of the world. With `include_events` the pending event
    /// queue is drained into the snapshot; otherwise it is left untouched.
    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let events = if include_events {
            std::mem::take(&mut self.events)
        } else {
            Vec::new()
        };
        Snapshot {
            tick: self.tick,
            status: self.status,
            score: self.score,
            lives: self.lives,
            level: self.level,
            pellet_count: self.pellet_count,
            power_pellet_active: self.power_pellet_active,
            power_pellet_timer: self.power_pellet_timer,
            frightened_score: self.frightened_score,
            player: PlayerView {
                x: self.player.pos.x,
                y: self.player.pos.y,
                dir: self.player.dir,
                mouth_open: self.player.mouth_open,
                animation_frame: self.player.animation_frame,
            },
            ghosts: self
                .ghosts
                .iter()
                .map(|ghost| GhostView {
                    id: ghost.id,
                    x: ghost.pos.x,
                    y: ghost.pos.y,
                    dir: ghost.dir,
                    mode: ghost.mode,
                    frightened_timer: ghost.frightened_timer,
                })
                .collect(),
            events,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn pellet_count(&self) -> i32 {
        self.pellet_count
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn maze(&self) -> &MazeGrid {
        &self.maze
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn player_position(&self) -> Pos {
        self.player.pos
    }

    pub fn player_direction(&self) -> Direction {
        self.player.dir
    }
}
