use clap::Parser;
use maze_chase_sim::constants::{
    BOARD_HEIGHT, BOARD_WIDTH, POWER_PELLET_DURATION_TICKS, STARTING_LIVES,
};
use maze_chase_sim::driver::{InputLatch, TickDriver};
use maze_chase_sim::engine::GameEngine;
use maze_chase_sim::kinematics::is_valid_move;
use maze_chase_sim::maze::MazeError;
use maze_chase_sim::rng::Rng;
use maze_chase_sim::types::{CellType, Direction, GameStatus, GhostMode, Pos, RuntimeEvent, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    max_ticks: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    realtime: bool,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    Won,
    GameOver,
    TickLimit,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    outcome: Outcome,
    ticks: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    score: i32,
    lives: i32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: i32,
    #[serde(rename = "powerPelletsEaten")]
    power_pellets_eaten: i32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: i32,
    #[serde(rename = "livesLost")]
    lives_lost: i32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "maxTicks": scenario.max_ticks,
                "realtime": cli.realtime,
            }),
        );
        let scenario_run = match run_scenario(&scenario, cli.realtime) {
            Ok(scenario_run) => scenario_run,
            Err(error) => {
                emit_log(
                    "error",
                    "scenario_failed",
                    &run_id,
                    Some(&scenario.name),
                    Some(scenario.seed),
                    None,
                    json!({
                        "error": error.to_string(),
                    }),
                );
                std::process::exit(1);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_duration_ms += scenario_run.result.duration_ms;
        *outcome_counts
            .entry(outcome_key(scenario_run.result.outcome))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "outcome": scenario_run.result.outcome,
                "score": scenario_run.result.score,
                "durationMs": scenario_run.result.duration_ms,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_duration_ms,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationMs": summary.average_duration_ms,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario, realtime: bool) -> Result<ScenarioRunResult, MazeError> {
    let mut engine = GameEngine::new(scenario.seed)?;
    engine.start()?;

    let mut policy_rng = Rng::new(scenario.seed ^ 0x9e37_79b9);
    let mut latch = InputLatch::new();
    let mut driver = realtime.then(TickDriver::at_tick_rate);

    let mut pellets_eaten = 0;
    let mut power_pellets_eaten = 0;
    let mut ghosts_eaten = 0;
    let mut lives_lost = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_tick = 0u64;
    let started = Instant::now();

    while engine.status() == GameStatus::Playing && engine.tick() < scenario.max_ticks {
        if let Some(driver) = driver.as_mut() {
            while !driver.poll(Instant::now()) {
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
        }

        latch.push(steer(&engine, &mut policy_rng));
        engine.step(latch.current());

        let board_pellets = engine.maze().count_pellets();
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;

        for message in collect_snapshot_anomalies(&snapshot, board_pellets) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::PelletEaten { .. } => pellets_eaten += 1,
                RuntimeEvent::PowerPelletEaten { .. } => power_pellets_eaten += 1,
                RuntimeEvent::GhostEaten { .. } => ghosts_eaten += 1,
                RuntimeEvent::LifeLost { .. } => lives_lost += 1,
                _ => {}
            }
        }
    }

    let outcome = match engine.status() {
        GameStatus::Won => Outcome::Won,
        GameStatus::GameOver => Outcome::GameOver,
        _ => Outcome::TickLimit,
    };

    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            outcome,
            ticks: last_tick,
            duration_ms: started.elapsed().as_millis() as u64,
            score: engine.score(),
            lives: engine.lives(),
            pellets_eaten,
            power_pellets_eaten,
            ghosts_eaten,
            lives_lost,
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    })
}

/// Scripted player: run from any nearby hostile ghost, otherwise follow the
/// shortest path to the nearest remaining pellet, with a small random kick to
/// break corridor oscillation. Deterministic per seed.
fn steer(engine: &GameEngine, rng: &mut Rng) -> Direction {
    let player = engine.player_position();

    let threat = engine
        .ghosts()
        .iter()
        .filter(|ghost| matches!(ghost.mode, GhostMode::Chase | GhostMode::Scatter))
        .map(|ghost| (ghost.pos, player.distance(ghost.pos)))
        .filter(|(_, dist)| *dist < 3.0)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((ghost_pos, _)) = threat {
        let mut best: Option<(f32, Direction)> = None;
        for dir in Direction::CARDINALS {
            if !is_valid_move(player, dir, engine.maze()) {
                continue;
            }
            let (dx, dy) = dir.delta();
            let next = Pos::new(player.x + dx, player.y + dy);
            let dist = next.distance(ghost_pos);
            if best.map(|(b, _)| dist > b).unwrap_or(true) {
                best = Some((dist, dir));
            }
        }
        if let Some((_, dir)) = best {
            return dir;
        }
    }

    if rng.next_f32() < 0.02 {
        let open: Vec<Direction> = Direction::CARDINALS
            .into_iter()
            .filter(|&dir| is_valid_move(player, dir, engine.maze()))
            .collect();
        if !open.is_empty() {
            let idx = rng.int(0, open.len() as i32 - 1) as usize;
            return open[idx];
        }
    }

    pellet_direction(engine)
}

/// First step of the shortest walkable path from the player's cell to any
/// pellet, breadth-first with tunnel wrap. NONE when the board is clear.
fn pellet_direction(engine: &GameEngine) -> Direction {
    let maze = engine.maze();
    let (sx, sy) = engine.player_position().cell();
    let mut queue = VecDeque::new();
    let mut seen = HashSet::new();
    seen.insert((sx, sy));

    for dir in Direction::CARDINALS {
        let (dx, dy) = dir.delta();
        let ny = sy + dy as i32;
        if ny < 0 || ny >= BOARD_HEIGHT {
            continue;
        }
        let nx = (sx + dx as i32).rem_euclid(BOARD_WIDTH);
        let cell = maze.cell_at(nx, ny);
        if cell == CellType::Wall {
            continue;
        }
        if cell.is_pellet() {
            return dir;
        }
        if seen.insert((nx, ny)) {
            queue.push_back((nx, ny, dir));
        }
    }

    while let Some((x, y, dir)) = queue.pop_front() {
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            if ny < 0 || ny >= BOARD_HEIGHT {
                continue;
            }
            let nx = nx.rem_euclid(BOARD_WIDTH);
            let cell = maze.cell_at(nx, ny);
            if cell == CellType::Wall {
                continue;
            }
            if cell.is_pellet() {
                return dir;
            }
            if seen.insert((nx, ny)) {
                queue.push_back((nx, ny, dir));
            }
        }
    }
    Direction::None
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, board_pellets: i32) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.pellet_count != board_pellets {
        anomalies.push(format!(
            "pellet count drift: counter {} board {}",
            snapshot.pellet_count, board_pellets
        ));
    }
    if snapshot.pellet_count < 0 {
        anomalies.push(format!("negative pellet count: {}", snapshot.pellet_count));
    }
    if snapshot.score < 0 {
        anomalies.push(format!("negative score: {}", snapshot.score));
    }
    if snapshot.lives < 0 || snapshot.lives > STARTING_LIVES {
        anomalies.push(format!("lives out of range: {}", snapshot.lives));
    }
    if snapshot.power_pellet_timer > POWER_PELLET_DURATION_TICKS {
        anomalies.push(format!(
            "power timer out of range: {}",
            snapshot.power_pellet_timer
        ));
    }
    if !position_in_bounds(snapshot.player.x, snapshot.player.y) {
        anomalies.push(format!(
            "player out of bounds: ({}, {})",
            snapshot.player.x, snapshot.player.y
        ));
    }
    for ghost in &snapshot.ghosts {
        if !position_in_bounds(ghost.x, ghost.y) {
            anomalies.push(format!(
                "ghost out of bounds: {:?} ({}, {})",
                ghost.id, ghost.x, ghost.y
            ));
        }
    }
    anomalies
}

fn position_in_bounds(x: f32, y: f32) -> bool {
    x.is_finite()
        && y.is_finite()
        && x >= 0.0
        && x < BOARD_WIDTH as f32
        && y >= 0.0
        && y < BOARD_HEIGHT as f32
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| rand::random::<u64>()));
    let max_ticks = cli.max_ticks.unwrap_or(30_000).clamp(1, 200_000);

    if cli.single || cli.max_ticks.is_some() {
        return vec![Scenario {
            name: "custom".to_string(),
            seed,
            max_ticks,
        }];
    }

    vec![
        Scenario {
            name: "quick-check".to_string(),
            seed,
            max_ticks,
        },
        Scenario {
            name: "long-run".to_string(),
            seed: normalize_seed(seed as u64 + 1),
            max_ticks: max_ticks * 2,
        },
    ]
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_duration_ms,
        outcome_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn outcome_key(outcome: Outcome) -> String {
    match outcome {
        Outcome::Won => "won",
        Outcome::GameOver => "game_over",
        Outcome::TickLimit => "tick_limit",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
