//! Fake UCI engine for driving the adapter without Stockfish installed.
//!
//! The engine is a POSIX shell script run through `/bin/sh`. Arguments are
//! the path of a log file, the `score` clause to report (e.g. `cp 35`), and
//! the moves to answer successive `go` commands with. Once the moves run out
//! it answers `bestmove (none)`.

#![allow(dead_code)]

use chs::{Arch, Engine, EngineOptions, Host, Level, Os};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FAKE_ENGINE: &str = r#"
log="$1"; shift
score="$1"; shift
while IFS= read -r line; do
  echo "$line" >> "$log"
  case "$line" in
    uci)
      echo "id name FakeFish 1.0"
      echo "id author chs tests"
      echo "uciok"
      ;;
    isready)
      echo "readyok"
      ;;
    go*)
      if [ $# -gt 0 ]; then
        move="$1"; shift
      else
        move="(none)"
      fi
      echo "info string thinking"
      echo "info depth 1 seldepth 2 score $score nodes 20 nps 1000 time 1"
      echo "bestmove $move"
      ;;
    quit)
      exit 0
      ;;
  esac
done
"#;

/// Completes the handshake, then exits on the first `position` command.
const DYING_ENGINE: &str = r#"
log="$1"
while IFS= read -r line; do
  echo "$line" >> "$log"
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    position*) exit 0 ;;
  esac
done
"#;

/// Completes the handshake, then exits on its own.
const EXITING_ENGINE: &str = r#"
log="$1"
while IFS= read -r line; do
  echo "$line" >> "$log"
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok"; exit 0 ;;
  esac
done
"#;

pub struct FakeEngine {
    _dir: TempDir,
    script: PathBuf,
    log: PathBuf,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::with_script(FAKE_ENGINE)
    }

    pub fn dying() -> Self {
        Self::with_script(DYING_ENGINE)
    }

    pub fn exiting() -> Self {
        Self::with_script(EXITING_ENGINE)
    }

    fn with_script(body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("engine.sh");
        let log = dir.path().join("engine.log");
        fs::write(&script, body).unwrap();
        fs::write(&log, "").unwrap();
        Self { _dir: dir, script, log }
    }

    /// Start the fake engine on `host` at `level`.
    pub fn launch(&self, host: &Host, level: Level, score: &str, moves: &[&str]) -> chs::Result<Engine> {
        let mut args: Vec<String> = vec![
            self.script.display().to_string(),
            self.log.display().to_string(),
            score.to_string(),
        ];
        args.extend(moves.iter().map(|m| m.to_string()));
        Engine::launch_with_args(
            Path::new("/bin/sh"),
            args,
            EngineOptions::for_level(level, host),
            host,
        )
    }

    /// Every command the engine has received so far.
    pub fn commands(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

pub fn desktop() -> Host {
    Host::new(Os::Linux, Arch::X86_64, false)
}

pub fn termux() -> Host {
    Host::new(Os::Android, Arch::Aarch64, true)
}
