//! # chs
//!
//! Play chess against the Stockfish engine in your terminal.
//!
//! The rules of chess come from the [`chess`] crate and all searching is done
//! by an external UCI engine. This crate finds and drives that engine, keeps
//! the game history, and draws the board.
//!
//! ## Features
//!
//! - **Engine discovery**: `CHS_STOCKFISH_PATH`, then `PATH`, then a bundled
//!   binary for the host platform
//! - **Skill levels** 1-8 mapped onto Stockfish's `Skill Level`
//! - **Hints and take-backs** from a second, independent engine
//! - **Termux support** with a reduced hash table and a single thread
//! - **PGN export** of finished games
//!
//! ## Quick Start
//!
//! ```rust
//! use chs::{normalize, GameBoard};
//!
//! let mut game = GameBoard::new();
//! game.push_text("e4").unwrap();
//! game.push_text("e5").unwrap();
//! assert_eq!(game.uci_position(), "position startpos moves e2e4 e7e5");
//!
//! // Engine scores map onto (-1, 1)
//! assert_eq!(normalize(Some(0)), Some(0.0));
//! assert_eq!(normalize(Some(100)), Some(0.197));
//! assert_eq!(normalize(None), None);
//! ```

// Core modules
pub mod errors;
pub mod levels;

pub mod client;
pub mod engine;
pub mod engine_path;
pub mod game;
pub mod host;
pub mod render;
pub mod san;
pub mod uci;

// Re-export commonly used types
pub use errors::{ChsError, Result};

pub use client::{Client, Command, SessionEnd};
pub use engine::{normalize, Engine, EngineOptions, PlayResult};
pub use engine_path::{EngineLocator, STOCKFISH_PATH_ENV};
pub use game::{GameBoard, Outcome};
pub use host::{Arch, Host, Os};
pub use levels::Level;
pub use render::BoardView;
pub use san::to_san;
pub use uci::{BestMove, Limit, Score, SearchInfo};
