#![cfg(unix)]

mod common;

use chess::{ChessMove, Color, Square};
use chs::engine::DEFAULT_PLAY_TIME;
use chs::{normalize, ChsError, GameBoard, Level, Limit, Score};
use common::{desktop, termux, FakeEngine};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_handshake_on_desktop_sets_only_skill() {
    let fake = FakeEngine::new();
    let engine = fake.launch(&desktop(), Level::THREE, "cp 0", &[]).unwrap();

    assert_eq!(engine.name(), Some("FakeFish 1.0"));
    let commands = fake.commands();
    assert_eq!(commands[0], "uci");
    assert!(commands.contains(&"setoption name Skill Level value 7".to_string()));
    assert!(!commands.iter().any(|c| c.contains("name Hash")));
    assert!(!commands.iter().any(|c| c.contains("name Threads")));
    assert_eq!(commands.last().map(String::as_str), Some("isready"));
}

#[test]
fn test_handshake_on_constrained_host_caps_resources() {
    let fake = FakeEngine::new();
    let _engine = fake.launch(&termux(), Level::EIGHT, "cp 0", &[]).unwrap();

    let commands = fake.commands();
    let position = |needle: &str| commands.iter().position(|c| c == needle);
    let hash = position("setoption name Hash value 16").expect("hash option");
    let threads = position("setoption name Threads value 1").expect("threads option");
    let skill = position("setoption name Skill Level value 20").expect("skill option");
    assert!(hash < skill && threads < skill);
}

#[test]
fn test_play_returns_move_and_search_info() {
    let fake = FakeEngine::new();
    let mut engine = fake.launch(&desktop(), Level::ONE, "cp 35", &["e2e4"]).unwrap();

    let result = engine.play(&GameBoard::new(), Limit::time(DEFAULT_PLAY_TIME)).unwrap();
    assert_eq!(result.chess_move, Some(ChessMove::new(Square::E2, Square::E4, None)));
    assert_eq!(result.info.score, Some(Score::Cp(35)));
    assert_eq!(result.info.depth, Some(1));
    assert_eq!(result.info.nodes, Some(20));

    let commands = fake.commands();
    assert!(commands.contains(&"position startpos".to_string()));
    assert!(commands.contains(&"go movetime 1500".to_string()));
}

#[test]
fn test_play_sends_move_history() {
    let fake = FakeEngine::new();
    let mut engine = fake.launch(&desktop(), Level::ONE, "cp 0", &["g1f3"]).unwrap();

    let mut game = GameBoard::new();
    game.push_text("e4").unwrap();
    game.push_text("e5").unwrap();
    engine.play(&game, Limit::time(Level::ONE.time_budget())).unwrap();

    let commands = fake.commands();
    assert!(commands.contains(&"position startpos moves e2e4 e7e5".to_string()));
    assert!(commands.contains(&"go movetime 1000".to_string()));
}

#[test]
fn test_play_without_best_move() {
    let fake = FakeEngine::new();
    let mut engine = fake.launch(&desktop(), Level::ONE, "cp 0", &[]).unwrap();

    let result = engine.play(&GameBoard::new(), Limit::depth(1)).unwrap();
    assert_eq!(result.chess_move, None);
}

#[test]
fn test_score_is_relative_to_point_of_view() {
    let fake = FakeEngine::new();
    let mut engine = fake.launch(&desktop(), Level::ONE, "cp 35", &[]).unwrap();
    let game = GameBoard::new();

    assert_eq!(engine.score(&game, Color::White).unwrap(), Some(Score::Cp(35)));
    assert_eq!(engine.score(&game, Color::Black).unwrap(), Some(Score::Cp(-35)));
    assert!(fake.commands().contains(&"go movetime 500".to_string()));
}

#[test]
fn test_mate_score_has_no_normalized_value() {
    let fake = FakeEngine::new();
    let mut engine = fake.launch(&desktop(), Level::ONE, "mate 2", &[]).unwrap();

    let score = engine.score(&GameBoard::new(), Color::Black).unwrap();
    assert_eq!(score, Some(Score::Mate(-2)));
    assert_eq!(normalize(score.and_then(Score::centipawns)), None);
}

#[test]
fn test_score_after_termination_is_unavailable() {
    let fake = FakeEngine::dying();
    let mut engine = fake.launch(&desktop(), Level::ONE, "cp 0", &[]).unwrap();
    assert!(engine.is_alive());

    assert_eq!(engine.score(&GameBoard::new(), Color::White).unwrap(), None);
    assert!(!engine.is_alive());
    // Still unavailable once the handle has been released
    assert_eq!(engine.score(&GameBoard::new(), Color::White).unwrap(), None);
}

#[test]
fn test_play_after_termination_is_fatal() {
    let fake = FakeEngine::dying();
    let mut engine = fake.launch(&desktop(), Level::ONE, "cp 0", &[]).unwrap();

    let err = engine.play(&GameBoard::new(), Limit::time(DEFAULT_PLAY_TIME)).unwrap_err();
    assert!(matches!(err, ChsError::EngineTerminated));
    assert!(err.is_terminated());
}

#[test]
fn test_done_is_idempotent() {
    let fake = FakeEngine::new();
    let mut engine = fake.launch(&desktop(), Level::ONE, "cp 0", &[]).unwrap();
    assert!(engine.is_alive());

    engine.done().unwrap();
    assert!(!engine.is_alive());
    assert!(fake.commands().contains(&"quit".to_string()));

    engine.done().unwrap();
    assert!(matches!(
        engine.play(&GameBoard::new(), Limit::depth(1)),
        Err(ChsError::EngineTerminated)
    ));
    assert_eq!(engine.score(&GameBoard::new(), Color::White).unwrap(), None);
}

#[test]
fn test_done_after_engine_exited_on_its_own() {
    let fake = FakeEngine::exiting();
    let mut engine = fake.launch(&desktop(), Level::ONE, "cp 0", &[]).unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while engine.is_alive() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert!(!engine.is_alive());

    engine.done().unwrap();
    engine.done().unwrap();
    assert_eq!(engine.score(&GameBoard::new(), Color::White).unwrap(), None);
}

#[test]
fn test_drop_sends_quit() {
    let fake = FakeEngine::new();
    let engine = fake.launch(&desktop(), Level::ONE, "cp 0", &[]).unwrap();
    drop(engine);
    assert_eq!(fake.commands().last().map(String::as_str), Some("quit"));
}

#[test]
fn test_handshake_failure_is_a_launch_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let script = dir.path().join("broken.sh");
    std::fs::write(&script, "read line\nexit 3\n").unwrap();

    let host = desktop();
    let err = chs::Engine::launch_with_args(
        std::path::Path::new("/bin/sh"),
        [script.as_os_str()],
        chs::EngineOptions::for_level(Level::ONE, &host),
        &host,
    )
    .unwrap_err();

    match &err {
        ChsError::EngineLaunch { source, .. } => assert!(source.is_terminated()),
        other => panic!("expected a launch error, got {other:?}"),
    }
    assert!(err.to_string().contains("apt install stockfish"));
}
