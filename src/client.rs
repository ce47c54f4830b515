//! Interactive game loop: a human at the terminal against the engine.

use crate::engine::{normalize, Engine, EngineOptions, PlayResult};
use crate::engine_path::EngineLocator;
use crate::errors::{ChsError, Result};
use crate::game::{color_name, GameBoard, Outcome};
use crate::host::Host;
use crate::levels::Level;
use crate::render::{self, colors, BoardView};
use crate::san::to_san;
use crate::uci::{Limit, Score};
use chess::Color;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Something typed at the move prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Take back the last move pair
    Back,
    Hint,
    Resign,
    Move(String),
}

impl Command {
    /// `None` for a blank line.
    pub fn parse(line: &str) -> Option<Command> {
        let text = line.trim();
        if text.is_empty() {
            return None;
        }
        Some(match text.to_ascii_lowercase().as_str() {
            "back" | "undo" => Command::Back,
            "hint" => Command::Hint,
            "resign" | "quit" | "exit" => Command::Resign,
            _ => Command::Move(text.to_string()),
        })
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Finished(Outcome),
    /// The human gave up
    Resigned,
    /// Standard input reached end of file
    InputClosed,
}

/// One game between the human and the engine
pub struct Client<R, W> {
    engine: Engine,
    hint_engine: Engine,
    board: GameBoard,
    play_as: Color,
    level: Level,
    view: BoardView,
    input: R,
    output: W,
    /// Hint engine's view of the position after the last engine move, from the human's side
    evaluation: Option<Score>,
}

impl Client<io::StdinLock<'static>, io::Stdout> {
    /// Launch both engines and attach to the terminal.
    ///
    /// `engine_path` bypasses engine resolution when given.
    pub fn new(level: Level, play_as: Color, engine_path: Option<PathBuf>) -> Result<Self> {
        let host = Host::detect();
        let path = engine_path.unwrap_or_else(|| EngineLocator::from_env(host.clone()).resolve());
        let options = EngineOptions::for_level(level, &host);

        let engine = Engine::launch(&path, options.clone(), &host)?;
        let hint_engine = Engine::launch(&path, options, &host)?;
        Ok(Self::with_engines(
            engine,
            hint_engine,
            level,
            play_as,
            io::stdin().lock(),
            io::stdout(),
        ))
    }
}

impl<R: BufRead, W: Write> Client<R, W> {
    pub fn with_engines(engine: Engine, hint_engine: Engine, level: Level, play_as: Color, input: R, output: W) -> Self {
        Self::with_board(engine, hint_engine, GameBoard::new(), level, play_as, input, output)
    }

    /// Start from an existing position.
    pub fn with_board(
        engine: Engine,
        hint_engine: Engine,
        board: GameBoard,
        level: Level,
        play_as: Color,
        input: R,
        output: W,
    ) -> Self {
        Self {
            engine,
            hint_engine,
            board,
            play_as,
            level,
            view: BoardView::new(play_as),
            input,
            output,
            evaluation: None,
        }
    }

    pub fn board(&self) -> &GameBoard {
        &self.board
    }

    pub fn play_as(&self) -> Color {
        self.play_as
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn hint_engine_mut(&mut self) -> &mut Engine {
        &mut self.hint_engine
    }

    /// Play until the game ends or the human leaves, then shut both engines down.
    pub fn run(&mut self) -> Result<SessionEnd> {
        let result = self.play_loop();
        let shutdown = self.shutdown();
        let end = result?;
        shutdown?;
        Ok(end)
    }

    /// Shut both engines down; safe to call more than once.
    pub fn shutdown(&mut self) -> Result<()> {
        let first = self.engine.done();
        let second = self.hint_engine.done();
        first.and(second)
    }

    fn play_loop(&mut self) -> Result<SessionEnd> {
        write!(
            self.output,
            "{}{}Welcome to chs - terminal chess!{}\n{}",
            colors::GREEN,
            colors::BOLD,
            colors::RESET,
            render::info_line(&format!(
                "Playing as {} at level {}",
                color_name(self.play_as),
                self.level
            ))
        )?;

        loop {
            self.display()?;

            if let Some(outcome) = self.board.outcome() {
                self.announce(outcome)?;
                return Ok(SessionEnd::Finished(outcome));
            }

            if self.board.side_to_move() == self.play_as {
                if let Some(end) = self.player_turn()? {
                    write!(self.output, "{}", render::info_line("Thanks for playing chs!"))?;
                    return Ok(end);
                }
            } else {
                self.computer_turn()?;
            }
        }
    }

    fn display(&mut self) -> Result<()> {
        let mut text = self.view.render(&self.board);
        text.push_str(&render::move_list(&self.board));
        match self.evaluation {
            // Mate already on the board
            Some(Score::Mate(0)) => {}
            Some(Score::Mate(n)) => {
                let side = if n > 0 { "You have" } else { "The computer has" };
                text.push_str(&render::info_line(&format!("{side} mate in {}", n.abs())));
            }
            Some(score) => text.push_str(&render::advantage_bar(normalize(score.centipawns()))),
            None => {}
        }
        text.push_str(&self.view.status(&self.board));
        write!(self.output, "{text}")?;
        Ok(())
    }

    /// Read commands until a move is played or the board changes.
    fn player_turn(&mut self) -> Result<Option<SessionEnd>> {
        loop {
            write!(self.output, "{}Your move: {}", colors::BOLD, colors::RESET)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(Some(SessionEnd::InputClosed));
            }

            match Command::parse(&line) {
                None => continue,
                Some(Command::Resign) => return Ok(Some(SessionEnd::Resigned)),
                Some(Command::Hint) => self.show_hint()?,
                Some(Command::Back) => {
                    if self.take_back()? {
                        return Ok(None);
                    }
                }
                Some(Command::Move(text)) => match self.board.push_text(&text) {
                    Ok(san) => {
                        log::debug!("Player played {}", san);
                        self.evaluation = None;
                        return Ok(None);
                    }
                    Err(ChsError::InvalidMove(_)) => {
                        let message = match self.board.suggest(&text) {
                            Some(suggestion) => format!("Invalid move. Did you mean \"{suggestion}\"?"),
                            None => "Invalid move. Use algebraic notation (e.g. e4, Nf3).".to_string(),
                        };
                        write!(self.output, "{}", render::error_line(&message))?;
                    }
                    Err(e) => return Err(e),
                },
            }
        }
    }

    fn computer_turn(&mut self) -> Result<()> {
        write!(self.output, "{}", render::info_line("Computer is thinking..."))?;
        let result = self.engine.play(&self.board, Limit::time(self.level.time_budget()))?;
        let chess_move = result.chess_move.ok_or_else(|| ChsError::NoBestMove {
            fen: self.board.board().to_string(),
        })?;
        let san = self
            .board
            .push(chess_move)
            .map_err(|_| ChsError::Protocol(format!("illegal bestmove {chess_move}")))?;
        write!(self.output, "{}", render::info_line(&format!("Computer plays: {san}")))?;

        self.evaluation = self.hint_engine.score(&self.board, self.play_as)?;
        Ok(())
    }

    /// Undo the last human move and the reply to it. Returns whether anything changed.
    fn take_back(&mut self) -> Result<bool> {
        if self.board.san_stack(self.play_as).is_empty() {
            write!(self.output, "{}", render::error_line("No moves to take back."))?;
            return Ok(false);
        }
        while self.board.pop().is_some() {
            if self.board.side_to_move() == self.play_as {
                break;
            }
        }
        self.evaluation = None;
        writeln!(self.output, "{}Took back last move.{}", colors::YELLOW, colors::RESET)?;
        Ok(true)
    }

    fn show_hint(&mut self) -> Result<()> {
        write!(self.output, "{}", render::info_line("Analyzing position..."))?;
        match self.hint_engine.play(&self.board, Limit::time(self.level.time_budget())) {
            Ok(PlayResult {
                chess_move: Some(chess_move),
                ..
            }) if self.board.is_legal(chess_move) => {
                let san = to_san(self.board.board(), chess_move);
                write!(self.output, "{}", render::hint_line(&san))?;
            }
            Ok(_) => write!(self.output, "{}", render::info_line("No hint available."))?,
            Err(e) => {
                log::warn!("Hint request failed: {}", e);
                write!(self.output, "{}", render::error_line(&format!("Could not get hint: {e}")))?;
            }
        }
        Ok(())
    }

    fn announce(&mut self, outcome: Outcome) -> Result<()> {
        let mut text = match outcome {
            Outcome::Checkmate { .. } => format!("{}{}{}!{}\n", colors::GREEN, colors::BOLD, outcome, colors::RESET),
            _ => format!("{}{}{}.{}\n", colors::YELLOW, colors::BOLD, outcome, colors::RESET),
        };
        match outcome.winner() {
            Some(winner) if winner == self.play_as => {
                text.push_str(&format!("{}Congratulations! You won!{}\n", colors::GREEN, colors::RESET))
            }
            Some(_) => text.push_str(&format!(
                "{}Computer wins. Better luck next time!{}\n",
                colors::RED,
                colors::RESET
            )),
            None => {}
        }
        text.push_str("\nThanks for playing chs!\n");
        write!(self.output, "{text}")?;
        Ok(())
    }

    /// PGN record of the game so far.
    pub fn pgn(&self, end: SessionEnd) -> String {
        let (white, black) = match self.play_as {
            Color::White => ("Player", "Stockfish"),
            Color::Black => ("Stockfish", "Player"),
        };
        let result = match end {
            SessionEnd::Finished(outcome) => outcome.result_token(),
            SessionEnd::Resigned => match self.play_as {
                Color::White => "0-1",
                Color::Black => "1-0",
            },
            SessionEnd::InputClosed => "*",
        };
        self.board.to_pgn(white, black, result)
    }
}
