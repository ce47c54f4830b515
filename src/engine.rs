//! Stockfish engine adapter
//!
//! One [`Engine`] owns one engine subprocess and talks UCI to it over its
//! stdin/stdout pipes. Requests are synchronous: a command is written and
//! lines are read until the matching reply arrives.
//!
//! The handle is released with [`Engine::done`], which is idempotent, and
//! again on drop, so a subprocess never outlives its handle, including when
//! construction fails half way through the handshake.

use crate::engine_path::EngineLocator;
use crate::errors::{pipe_error, ChsError, Result};
use crate::game::GameBoard;
use crate::host::Host;
use crate::levels::Level;
use crate::uci::{self, Limit, Score, SearchInfo};
use chess::{ChessMove, Color};
use std::ffi::OsStr;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::str::FromStr;
use std::time::Duration;

/// Default thinking time for [`Engine::play`].
pub const DEFAULT_PLAY_TIME: Duration = Duration::from_millis(1500);
/// Fixed thinking time for [`Engine::score`].
pub const SCORE_TIME: Duration = Duration::from_millis(500);

/// Hash table size on constrained hosts, in MB.
pub const CONSTRAINED_HASH_MB: u32 = 16;
/// Search threads on constrained hosts.
pub const CONSTRAINED_THREADS: u32 = 1;

/// Steepness of the centipawn to win-chance curve.
const WIN_CHANCE_K: f64 = 0.004;
/// Largest magnitude normalize() returns, keeping the result inside (-1, 1).
const NORMALIZED_LIMIT: f64 = 0.999;

/// UCI options applied at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub skill_level: u8,
    pub hash_mb: Option<u32>,
    pub threads: Option<u32>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            skill_level: Level::default().skill_level(),
            hash_mb: None,
            threads: None,
        }
    }
}

impl EngineOptions {
    /// Options for `level`, capped for constrained hosts.
    pub fn for_level(level: Level, host: &Host) -> Self {
        let constrained = host.is_constrained();
        Self {
            skill_level: level.skill_level(),
            hash_mb: constrained.then_some(CONSTRAINED_HASH_MB),
            threads: constrained.then_some(CONSTRAINED_THREADS),
        }
    }

    /// `(name, value)` pairs in the order they are sent.
    pub fn uci_options(&self) -> Vec<(&'static str, String)> {
        let mut options = Vec::new();
        if let Some(hash_mb) = self.hash_mb {
            options.push(("Hash", hash_mb.to_string()));
        }
        if let Some(threads) = self.threads {
            options.push(("Threads", threads.to_string()));
        }
        options.push(("Skill Level", self.skill_level.to_string()));
        options
    }
}

/// Outcome of a move search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayResult {
    /// `None` when the engine reports no legal move
    pub chess_move: Option<ChessMove>,
    pub ponder: Option<ChessMove>,
    /// Last search statistics seen before `bestmove`
    pub info: SearchInfo,
}

/// Pipes of a live engine process
struct EngineProcess {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

/// Handle on one running chess engine
pub struct Engine {
    process: Option<EngineProcess>,
    path: PathBuf,
    name: Option<String>,
    options: EngineOptions,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("options", &self.options)
            .field("running", &self.process.is_some())
            .finish()
    }
}

impl Engine {
    /// Resolve the engine binary for this host and launch it at `level`.
    pub fn new(level: Level, host: &Host) -> Result<Self> {
        let path = EngineLocator::from_env(host.clone()).resolve();
        Self::launch(&path, EngineOptions::for_level(level, host), host)
    }

    /// Launch the engine at `path`.
    pub fn launch(path: &Path, options: EngineOptions, host: &Host) -> Result<Self> {
        Self::launch_with_args(path, std::iter::empty::<&OsStr>(), options, host)
    }

    /// Launch `program` with extra arguments, e.g. an interpreter and a script.
    pub fn launch_with_args<I, S>(program: &Path, args: I, options: EngineOptions, host: &Host) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let launch_error = |source: ChsError| ChsError::EngineLaunch {
            path: program.to_path_buf(),
            remediation: host.remediation(),
            source: Box::new(source),
        };

        log::info!("Starting engine {}", program.display());
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| launch_error(ChsError::Io(e)))?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(launch_error(ChsError::Protocol(
                    "engine pipes were not captured".to_string(),
                )));
            }
        };

        let mut engine = Self {
            process: Some(EngineProcess {
                child,
                stdin: BufWriter::new(stdin),
                stdout: BufReader::new(stdout),
            }),
            path: program.to_path_buf(),
            name: None,
            options,
        };

        // On failure `engine` is dropped here, which reaps the child
        engine.initialize().map_err(launch_error)?;
        Ok(engine)
    }

    fn initialize(&mut self) -> Result<()> {
        self.send_command("uci")?;
        loop {
            let line = self.read_line()?;
            if let Some(name) = uci::parse_id_name(&line) {
                self.name = Some(name.to_string());
            }
            if line == "uciok" {
                break;
            }
        }

        for (name, value) in self.options.uci_options() {
            self.send_command(&uci::setoption_command(name, &value))?;
        }

        self.wait_ready()?;
        log::info!(
            "Engine {} ready (skill {})",
            self.name.as_deref().unwrap_or("<unnamed>"),
            self.options.skill_level
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Engine name from its `id name` line.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Whether the subprocess is still running.
    pub fn is_alive(&mut self) -> bool {
        match self.process.as_mut() {
            Some(process) => matches!(process.child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Ask for the best move within `limit`.
    ///
    /// A terminated engine is an error here, unlike in [`Engine::score`].
    pub fn play(&mut self, board: &GameBoard, limit: Limit) -> Result<PlayResult> {
        let result = self.search(board, limit);
        self.reap_if_terminated(result)
    }

    /// Evaluate the position from `pov`'s point of view.
    ///
    /// Returns `Ok(None)` when the engine has terminated.
    pub fn score(&mut self, board: &GameBoard, pov: Color) -> Result<Option<Score>> {
        let result = self.search(board, Limit::time(SCORE_TIME));
        match self.reap_if_terminated(result) {
            Ok(result) => {
                let relative = result.info.score;
                Ok(relative.map(|score| {
                    if board.side_to_move() == pov {
                        score
                    } else {
                        -score
                    }
                }))
            }
            Err(ChsError::EngineTerminated) => {
                log::warn!("Engine terminated; no evaluation available");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn search(&mut self, board: &GameBoard, limit: Limit) -> Result<PlayResult> {
        self.send_command(&board.uci_position())?;
        self.send_command(&limit.go_command())?;

        let mut info = SearchInfo::default();
        loop {
            let line = self.read_line()?;
            if let Some(update) = uci::parse_info(&line) {
                info.merge(update);
            } else if let Some(best) = uci::parse_bestmove(&line) {
                let chess_move = best.best.as_deref().map(parse_engine_move).transpose()?;
                let ponder = best.ponder.as_deref().and_then(|m| ChessMove::from_str(m).ok());
                return Ok(PlayResult {
                    chess_move,
                    ponder,
                    info,
                });
            }
        }
    }

    /// Shut the engine down. Calling it again, or on a dead engine, does nothing.
    pub fn done(&mut self) -> Result<()> {
        let Some(mut process) = self.process.take() else {
            return Ok(());
        };

        let quit_sent = writeln!(process.stdin, "quit").and_then(|_| process.stdin.flush());
        drop(process.stdin);
        if quit_sent.is_err() {
            let _ = process.child.kill();
        }
        match process.child.wait() {
            Ok(status) => {
                log::debug!("Engine {} exited with {}", self.path.display(), status);
                Ok(())
            }
            Err(e) => Err(ChsError::Io(e)),
        }
    }

    fn reap_if_terminated<T>(&mut self, result: Result<T>) -> Result<T> {
        if matches!(result, Err(ChsError::EngineTerminated)) {
            if let Some(mut process) = self.process.take() {
                let _ = process.child.kill();
                let _ = process.child.wait();
            }
        }
        result
    }

    fn wait_ready(&mut self) -> Result<()> {
        self.send_command("isready")?;
        loop {
            if self.read_line()? == "readyok" {
                return Ok(());
            }
        }
    }

    fn send_command(&mut self, command: &str) -> Result<()> {
        let process = self.process.as_mut().ok_or(ChsError::EngineTerminated)?;
        log::trace!(">> {}", command);
        writeln!(process.stdin, "{command}").map_err(pipe_error)?;
        process.stdin.flush().map_err(pipe_error)
    }

    fn read_line(&mut self) -> Result<String> {
        let process = self.process.as_mut().ok_or(ChsError::EngineTerminated)?;
        let mut line = String::new();
        let read = process.stdout.read_line(&mut line).map_err(pipe_error)?;
        if read == 0 {
            return Err(ChsError::EngineTerminated);
        }
        let line = line.trim().to_string();
        log::trace!("<< {}", line);
        Ok(line)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let _ = self.done();
    }
}

fn parse_engine_move(text: &str) -> Result<ChessMove> {
    ChessMove::from_str(text).map_err(|_| ChsError::Protocol(format!("bestmove {text}")))
}

/// Map a centipawn score to (-1, 1) with `2 / (1 + e^(-0.004 cp)) - 1`, rounded to 3 places.
///
/// Positive means the point of view the score was taken from is better.
pub fn normalize(cp: Option<i32>) -> Option<f64> {
    let cp = cp?;
    let raw_score = 2.0 / (1.0 + (-WIN_CHANCE_K * f64::from(cp)).exp()) - 1.0;
    let rounded = (raw_score * 1000.0).round() / 1000.0;
    Some(rounded.clamp(-NORMALIZED_LIMIT, NORMALIZED_LIMIT))
}
