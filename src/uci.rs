//! UCI (Universal Chess Interface) line codec
//!
//! Formats the handful of commands we send to an engine and parses the
//! `id`, `info` and `bestmove` lines it sends back.

use std::fmt;
use std::ops::Neg;
use std::time::Duration;

/// Engine evaluation as reported in an `info ... score` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns from the side to move's point of view
    Cp(i32),
    /// Mate in N moves; negative when the side to move gets mated
    Mate(i32),
}

impl Score {
    /// Centipawn value, or `None` for mate scores.
    pub fn centipawns(self) -> Option<i32> {
        match self {
            Score::Cp(cp) => Some(cp),
            Score::Mate(_) => None,
        }
    }
}

impl Neg for Score {
    type Output = Score;

    fn neg(self) -> Score {
        match self {
            Score::Cp(cp) => Score::Cp(cp.saturating_neg()),
            Score::Mate(n) => Score::Mate(n.saturating_neg()),
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Cp(cp) => write!(f, "{:+.2}", *cp as f64 / 100.0),
            Score::Mate(n) if *n >= 0 => write!(f, "#{n}"),
            Score::Mate(n) => write!(f, "#-{}", -n),
        }
    }
}

/// Fields of an `info` line we care about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time_ms: Option<u64>,
    pub score: Option<Score>,
    /// Principal variation in UCI move notation
    pub pv: Vec<String>,
}

impl SearchInfo {
    /// Fold a later `info` line into this one; fields it omits keep their values.
    pub fn merge(&mut self, other: SearchInfo) {
        self.depth = other.depth.or(self.depth);
        self.seldepth = other.seldepth.or(self.seldepth);
        self.nodes = other.nodes.or(self.nodes);
        self.nps = other.nps.or(self.nps);
        self.time_ms = other.time_ms.or(self.time_ms);
        self.score = other.score.or(self.score);
        if !other.pv.is_empty() {
            self.pv = other.pv;
        }
    }
}

/// Parsed `bestmove` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    /// `None` when the engine answered `(none)`
    pub best: Option<String>,
    pub ponder: Option<String>,
}

/// Search limits for a `go` command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limit {
    pub movetime: Option<Duration>,
    pub depth: Option<u8>,
}

impl Limit {
    pub fn time(movetime: Duration) -> Self {
        Self {
            movetime: Some(movetime),
            depth: None,
        }
    }

    pub fn depth(depth: u8) -> Self {
        Self {
            movetime: None,
            depth: Some(depth),
        }
    }

    /// `go` command for this limit; an empty limit searches until `stop`.
    pub fn go_command(&self) -> String {
        let mut go_command = "go".to_string();
        if let Some(depth) = self.depth {
            go_command.push_str(&format!(" depth {depth}"));
        }
        if let Some(movetime) = self.movetime {
            go_command.push_str(&format!(" movetime {}", movetime.as_millis().max(1)));
        }
        go_command
    }
}

/// `setoption` command
pub fn setoption_command(name: &str, value: &str) -> String {
    format!("setoption name {name} value {value}")
}

/// `position` command from a start FEN (None = startpos) and moves in UCI notation.
pub fn position_command<S: AsRef<str>>(fen: Option<&str>, moves: &[S]) -> String {
    let mut command = match fen {
        Some(fen) => format!("position fen {fen}"),
        None => "position startpos".to_string(),
    };
    if !moves.is_empty() {
        command.push_str(" moves");
        for mv in moves {
            command.push(' ');
            command.push_str(mv.as_ref());
        }
    }
    command
}

/// Value of an `id name ...` line.
pub fn parse_id_name(line: &str) -> Option<&str> {
    line.strip_prefix("id name ").map(str::trim)
}

/// Parse an `info` line. Returns `None` for anything else, including `info string`.
pub fn parse_info(line: &str) -> Option<SearchInfo> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "info" {
        return None;
    }

    let mut info = SearchInfo::default();
    while let Some(token) = tokens.next() {
        match token {
            "depth" => info.depth = tokens.next().and_then(|t| t.parse().ok()),
            "seldepth" => info.seldepth = tokens.next().and_then(|t| t.parse().ok()),
            "nodes" => info.nodes = tokens.next().and_then(|t| t.parse().ok()),
            "nps" => info.nps = tokens.next().and_then(|t| t.parse().ok()),
            "time" => info.time_ms = tokens.next().and_then(|t| t.parse().ok()),
            "score" => {
                let kind = tokens.next();
                let value = tokens.next().and_then(|t| t.parse::<i32>().ok());
                info.score = match (kind, value) {
                    (Some("cp"), Some(cp)) => Some(Score::Cp(cp)),
                    (Some("mate"), Some(n)) => Some(Score::Mate(n)),
                    _ => None,
                };
            }
            "pv" => {
                info.pv = tokens.by_ref().map(str::to_string).collect();
            }
            // Free text until end of line
            "string" => return None,
            _ => {}
        }
    }
    Some(info)
}

/// Parse a `bestmove` line.
pub fn parse_bestmove(line: &str) -> Option<BestMove> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "bestmove" {
        return None;
    }
    let best = tokens.next().filter(|m| *m != "(none)" && *m != "0000");
    let ponder = match tokens.next() {
        Some("ponder") => tokens.next(),
        _ => None,
    };
    Some(BestMove {
        best: best.map(str::to_string),
        ponder: ponder.map(str::to_string),
    })
}
