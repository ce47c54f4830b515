//! Game state on top of the rules library
//!
//! [`GameBoard`] keeps the stack of positions reached so far so moves can be
//! pushed and popped, the SAN history of each side for display, and the
//! half-move clock the library's board does not carry.

use crate::errors::{ChsError, Result};
use crate::san::to_san;
use crate::uci;
use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece};
use chrono::Local;
use std::fmt;
use std::str::FromStr;

/// Plies without a capture or pawn move before the fifty-move rule applies.
const FIFTY_MOVE_PLIES: u32 = 100;

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoves,
}

impl Outcome {
    pub fn winner(self) -> Option<Color> {
        match self {
            Outcome::Checkmate { winner } => Some(winner),
            _ => None,
        }
    }

    /// PGN result token.
    pub fn result_token(self) -> &'static str {
        match self {
            Outcome::Checkmate { winner: Color::White } => "1-0",
            Outcome::Checkmate { winner: Color::Black } => "0-1",
            _ => "1/2-1/2",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Checkmate { winner } => write!(f, "Checkmate! {} wins", color_name(*winner)),
            Outcome::Stalemate => write!(f, "Draw by stalemate"),
            Outcome::InsufficientMaterial => write!(f, "Draw by insufficient material"),
            Outcome::ThreefoldRepetition => write!(f, "Draw by threefold repetition"),
            Outcome::FiftyMoves => write!(f, "Draw by the fifty-move rule"),
        }
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Board with move history
#[derive(Debug, Clone)]
pub struct GameBoard {
    /// Starting FEN when the game did not begin from the standard position
    start_fen: Option<String>,
    /// `positions[0]` is the start; one more entry per move played
    positions: Vec<Board>,
    moves: Vec<ChessMove>,
    /// Half-move clock after each position in `positions`
    halfmove_clocks: Vec<u32>,
    pub san_move_stack_white: Vec<String>,
    pub san_move_stack_black: Vec<String>,
}

impl Default for GameBoard {
    fn default() -> Self {
        Self::from_board(Board::default(), None, 0)
    }
}

impl GameBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a FEN position.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let board = Board::from_str(fen).map_err(|e| ChsError::InvalidFen(format!("{fen}: {e}")))?;
        let halfmove_clock = fen
            .split_whitespace()
            .nth(4)
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);
        Ok(Self::from_board(board, Some(fen.trim().to_string()), halfmove_clock))
    }

    fn from_board(board: Board, start_fen: Option<String>, halfmove_clock: u32) -> Self {
        Self {
            start_fen,
            positions: vec![board],
            moves: Vec::new(),
            halfmove_clocks: vec![halfmove_clock],
            san_move_stack_white: Vec::new(),
            san_move_stack_black: Vec::new(),
        }
    }

    /// Current position.
    pub fn board(&self) -> &Board {
        // Never empty: the start position is never popped
        &self.positions[self.positions.len() - 1]
    }

    pub fn side_to_move(&self) -> Color {
        self.board().side_to_move()
    }

    /// Side to move in the starting position.
    pub fn starting_side(&self) -> Color {
        self.positions[0].side_to_move()
    }

    pub fn start_fen(&self) -> Option<&str> {
        self.start_fen.as_deref()
    }

    pub fn move_stack(&self) -> &[ChessMove] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<ChessMove> {
        self.moves.last().copied()
    }

    pub fn san_stack(&self, color: Color) -> &[String] {
        match color {
            Color::White => &self.san_move_stack_white,
            Color::Black => &self.san_move_stack_black,
        }
    }

    fn san_stack_mut(&mut self, color: Color) -> &mut Vec<String> {
        match color {
            Color::White => &mut self.san_move_stack_white,
            Color::Black => &mut self.san_move_stack_black,
        }
    }

    pub fn is_legal(&self, chess_move: ChessMove) -> bool {
        self.board().legal(chess_move)
    }

    /// Play a legal move, recording its SAN for the side that made it.
    pub fn push(&mut self, chess_move: ChessMove) -> Result<String> {
        let board = *self.board();
        if !board.legal(chess_move) {
            return Err(ChsError::InvalidMove(chess_move.to_string()));
        }

        let san = to_san(&board, chess_move);
        let resets_clock = board.piece_on(chess_move.get_source()) == Some(Piece::Pawn)
            || board.piece_on(chess_move.get_dest()).is_some();
        let clock = if resets_clock {
            0
        } else {
            self.halfmove_clocks[self.halfmove_clocks.len() - 1] + 1
        };

        self.positions.push(board.make_move_new(chess_move));
        self.halfmove_clocks.push(clock);
        self.moves.push(chess_move);
        self.san_stack_mut(board.side_to_move()).push(san.clone());
        Ok(san)
    }

    /// Parse and play a move written by a human.
    pub fn push_text(&mut self, text: &str) -> Result<String> {
        let chess_move = self.parse_move(text)?;
        self.push(chess_move)
    }

    /// Undo the last move.
    pub fn pop(&mut self) -> Option<ChessMove> {
        let chess_move = self.moves.pop()?;
        self.positions.pop();
        self.halfmove_clocks.pop();
        let mover = self.side_to_move();
        self.san_stack_mut(mover).pop();
        Some(chess_move)
    }

    /// Accept SAN (`Nf3`, `exd5`, `O-O`, `e8=Q`) or UCI coordinates (`g1f3`).
    ///
    /// SAN is matched against the legal moves' own notation, ignoring check
    /// marks, annotations and the `=` of a promotion.
    pub fn parse_move(&self, text: &str) -> Result<ChessMove> {
        let trimmed = text.trim();
        let wanted = normalize_san(trimmed);
        if wanted.is_empty() {
            return Err(ChsError::InvalidMove(trimmed.to_string()));
        }

        let board = self.board();
        if let Some(mv) = MoveGen::new_legal(board).find(|mv| normalize_san(&to_san(board, *mv)) == wanted) {
            return Ok(mv);
        }

        let coordinates = trimmed.to_ascii_lowercase();
        if matches!(coordinates.len(), 4 | 5) && coordinates.chars().all(|c| c.is_ascii_alphanumeric()) {
            if let Ok(mv) = ChessMove::from_str(&coordinates) {
                if board.legal(mv) {
                    return Ok(mv);
                }
            }
        }
        Err(ChsError::InvalidMove(trimmed.to_string()))
    }

    /// Every legal move in SAN.
    pub fn legal_sans(&self) -> Vec<String> {
        let board = self.board();
        MoveGen::new_legal(board).map(|mv| to_san(board, mv)).collect()
    }

    /// Closest legal SAN within edit distance 2, for "did you mean" hints.
    pub fn suggest(&self, text: &str) -> Option<String> {
        let wanted = text.trim().to_lowercase();
        self.legal_sans()
            .into_iter()
            .map(|san| (edit_distance(&wanted, &san.to_lowercase()), san))
            .filter(|(distance, _)| *distance <= 2)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, san)| san)
    }

    pub fn is_check(&self) -> bool {
        self.board().checkers().popcnt() > 0
    }

    /// Terminal state of the current position, if any.
    pub fn outcome(&self) -> Option<Outcome> {
        let board = self.board();
        match board.status() {
            BoardStatus::Checkmate => {
                return Some(Outcome::Checkmate {
                    winner: !board.side_to_move(),
                })
            }
            BoardStatus::Stalemate => return Some(Outcome::Stalemate),
            BoardStatus::Ongoing => {}
        }
        if is_insufficient_material(board) {
            return Some(Outcome::InsufficientMaterial);
        }
        if self.repetitions() >= 3 {
            return Some(Outcome::ThreefoldRepetition);
        }
        if self.halfmove_clocks[self.halfmove_clocks.len() - 1] >= FIFTY_MOVE_PLIES {
            return Some(Outcome::FiftyMoves);
        }
        None
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// How many times the current position has occurred.
    fn repetitions(&self) -> usize {
        let hash = self.board().get_hash();
        self.positions.iter().filter(|b| b.get_hash() == hash).count()
    }

    /// Position as a UCI `position` command.
    pub fn uci_position(&self) -> String {
        let moves: Vec<String> = self.moves.iter().map(|mv| mv.to_string()).collect();
        uci::position_command(self.start_fen.as_deref(), &moves)
    }

    /// SAN movetext with move numbers, e.g. `1. e4 e5 2. Nf3`.
    pub fn movetext(&self) -> String {
        let mut text = String::new();
        let mut fullmove = self
            .start_fen
            .as_deref()
            .and_then(|fen| fen.split_whitespace().nth(5))
            .and_then(|t| t.parse::<u32>().ok())
            .unwrap_or(1);

        for (i, chess_move) in self.moves.iter().enumerate() {
            let board = &self.positions[i];
            let san = to_san(board, *chess_move);
            match board.side_to_move() {
                Color::White => {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&format!("{fullmove}. {san}"));
                }
                Color::Black => {
                    if i == 0 {
                        text.push_str(&format!("{fullmove}... {san}"));
                    } else {
                        text.push(' ');
                        text.push_str(&san);
                    }
                    fullmove += 1;
                }
            }
        }
        text
    }

    /// Full PGN record dated today.
    pub fn to_pgn(&self, white: &str, black: &str, result: &str) -> String {
        let mut pgn = String::new();

        pgn.push_str("[Event \"Casual Game\"]\n");
        pgn.push_str("[Site \"chs\"]\n");
        pgn.push_str(&format!("[Date \"{}\"]\n", Local::now().format("%Y.%m.%d")));
        pgn.push_str("[Round \"1\"]\n");
        pgn.push_str(&format!("[White \"{white}\"]\n"));
        pgn.push_str(&format!("[Black \"{black}\"]\n"));
        pgn.push_str(&format!("[Result \"{result}\"]\n"));
        if let Some(fen) = &self.start_fen {
            pgn.push_str("[SetUp \"1\"]\n");
            pgn.push_str(&format!("[FEN \"{fen}\"]\n"));
        }
        pgn.push('\n');

        let movetext = self.movetext();
        if !movetext.is_empty() {
            pgn.push_str(&movetext);
            pgn.push(' ');
        }
        pgn.push_str(result);
        pgn.push('\n');
        pgn
    }
}

fn is_insufficient_material(board: &Board) -> bool {
    let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy.popcnt() > 0 {
        return false;
    }
    let knights = board.pieces(Piece::Knight).popcnt();
    let bishops = *board.pieces(Piece::Bishop);
    if knights + bishops.popcnt() <= 1 {
        return true;
    }
    // Only bishops left, all on squares of one colour
    knights == 0 && {
        let mut shades = bishops.map(|sq| (sq.get_file().to_index() + sq.get_rank().to_index()) % 2);
        let first = shades.next();
        shades.all(|shade| Some(shade) == first)
    }
}

/// SAN reduced to what identifies the move: no check marks, annotations or `=`.
fn normalize_san(text: &str) -> String {
    text.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .chars()
        .filter(|c| *c != '=')
        .map(|c| if c == '0' { 'O' } else { c })
        .collect()
}

/// Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        previous = current;
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_is_empty() {
        let game = GameBoard::new();
        assert!(!game.is_game_over());
        assert!(game.move_stack().is_empty());
        assert!(game.san_move_stack_white.is_empty());
        assert!(game.san_move_stack_black.is_empty());
        assert_eq!(game.side_to_move(), Color::White);
    }

    #[test]
    fn test_push_records_san_per_color() {
        let mut game = GameBoard::new();
        for text in ["e4", "e5", "Nf3", "Nc6"] {
            game.push_text(text).unwrap();
        }
        assert_eq!(game.move_stack().len(), 4);
        assert_eq!(game.san_move_stack_white, vec!["e4", "Nf3"]);
        assert_eq!(game.san_move_stack_black, vec!["e5", "Nc6"]);
    }

    #[test]
    fn test_pop_restores_stacks() {
        let mut game = GameBoard::new();
        game.push_text("d4").unwrap();
        game.push_text("d5").unwrap();
        assert!(game.pop().is_some());
        assert_eq!(game.san_move_stack_black.len(), 0);
        assert_eq!(game.san_move_stack_white, vec!["d4"]);
        assert_eq!(game.side_to_move(), Color::Black);
        assert!(game.pop().is_some());
        assert!(game.pop().is_none());
        assert_eq!(game.board().to_string(), Board::default().to_string());
    }

    #[test]
    fn test_parse_move_notations() {
        let game = GameBoard::new();
        let san = game.parse_move("Nf3").unwrap();
        let uci = game.parse_move("g1f3").unwrap();
        assert_eq!(san, uci);
        assert!(game.parse_move("e4+").is_ok());
    }

    #[test]
    fn test_illegal_and_garbage_input_rejected() {
        let mut game = GameBoard::new();
        for text in ["e5", "Ke2", "hello", "", "e2e5", "z9z9"] {
            assert!(game.parse_move(text).is_err(), "accepted {text:?}");
        }
        assert!(game.push_text("Qh5").is_err());
        assert!(game.move_stack().is_empty());
    }

    #[test]
    fn test_promotion_san_variants() {
        let fen = "4k3/P7/8/8/8/8/8/4K3 w - - 0 1";
        let game = GameBoard::from_fen(fen).unwrap();
        let queen = ChessMove::from_str("a7a8q").unwrap();
        for text in ["a8=Q+", "a8=Q", "a8Q", "a7a8q"] {
            assert_eq!(game.parse_move(text).unwrap(), queen, "{text}");
        }
        assert_eq!(game.parse_move("a8=N").unwrap(), ChessMove::from_str("a7a8n").unwrap());

        let mut game = GameBoard::from_fen(fen).unwrap();
        assert_eq!(game.push_text("a8=Q+").unwrap(), "a8=Q+");
    }

    #[test]
    fn test_en_passant_in_plain_san() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        let mut game = GameBoard::from_fen(fen).unwrap();
        assert_eq!(game.push_text("exf6").unwrap(), "exf6");
        assert!(game.board().piece_on(chess::Square::F5).is_none());
    }

    #[test]
    fn test_trailing_junk_rejected() {
        let game = GameBoard::new();
        for text in ["e4é", "Nf3 e.p.", "e2e4e4", "e4x"] {
            assert!(game.parse_move(text).is_err(), "accepted {text:?}");
        }
    }

    #[test]
    fn test_hinted_san_is_accepted() {
        let fen = "4k3/P7/8/8/8/8/8/4K3 w - - 0 1";
        let game = GameBoard::from_fen(fen).unwrap();
        for san in game.legal_sans() {
            assert!(game.parse_move(&san).is_ok(), "rejected {san}");
        }
    }

    #[test]
    fn test_castling_with_zeros() {
        let mut game = GameBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!(game.push_text("0-0").unwrap(), "O-O");
    }

    #[test]
    fn test_suggestion() {
        let game = GameBoard::new();
        assert_eq!(game.suggest("nf33"), Some("Nf3".to_string()));
        assert!(game.suggest("Nf4").is_some());
        assert_eq!(game.suggest("completely wrong"), None);
    }

    #[test]
    fn test_checkmate_outcome() {
        let mut game = GameBoard::new();
        for text in ["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"] {
            game.push_text(text).unwrap();
        }
        assert_eq!(
            game.outcome(),
            Some(Outcome::Checkmate {
                winner: Color::White
            })
        );
        assert_eq!(game.san_move_stack_white.last().unwrap(), "Qxf7#");
        assert_eq!(game.outcome().unwrap().result_token(), "1-0");
    }

    #[test]
    fn test_stalemate_outcome() {
        let game = GameBoard::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(game.outcome(), Some(Outcome::Stalemate));
    }

    #[test]
    fn test_insufficient_material() {
        for fen in [
            "8/8/8/4k3/8/8/8/4K3 w - - 0 1",
            "8/8/8/4k3/8/8/8/4KN2 w - - 0 1",
            "8/8/8/4k3/8/B7/8/2B1K3 w - - 0 1",
        ] {
            let game = GameBoard::from_fen(fen).unwrap();
            assert_eq!(game.outcome(), Some(Outcome::InsufficientMaterial), "{fen}");
        }
        // Opposite-coloured bishops can still mate
        let game = GameBoard::from_fen("8/8/8/4k3/8/8/8/2B1KB2 w - - 0 1").unwrap();
        assert_eq!(game.outcome(), None);
    }

    #[test]
    fn test_threefold_repetition() {
        let mut game = GameBoard::new();
        for _ in 0..2 {
            for text in ["Nf3", "Nf6", "Ng1", "Ng8"] {
                game.push_text(text).unwrap();
            }
        }
        assert_eq!(game.outcome(), Some(Outcome::ThreefoldRepetition));
    }

    #[test]
    fn test_fifty_move_rule() {
        let mut game = GameBoard::from_fen("8/8/8/4k3/8/8/3R4/4K3 w - - 99 80").unwrap();
        assert_eq!(game.outcome(), None);
        game.push_text("Rd3").unwrap();
        assert_eq!(game.outcome(), Some(Outcome::FiftyMoves));
        game.pop();
        game.push_text("Kf2").unwrap();
        assert_eq!(game.outcome(), Some(Outcome::FiftyMoves));
    }

    #[test]
    fn test_uci_position_and_movetext() {
        let mut game = GameBoard::new();
        game.push_text("e4").unwrap();
        game.push_text("c5").unwrap();
        game.push_text("Nf3").unwrap();
        assert_eq!(game.uci_position(), "position startpos moves e2e4 c7c5 g1f3");
        assert_eq!(game.movetext(), "1. e4 c5 2. Nf3");

        let mut black_first =
            GameBoard::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        black_first.push_text("e5").unwrap();
        black_first.push_text("Nf3").unwrap();
        assert_eq!(black_first.movetext(), "1... e5 2. Nf3");
        assert!(black_first.uci_position().starts_with("position fen rnbqkbnr"));
    }

    #[test]
    fn test_pgn_export() {
        let mut game = GameBoard::new();
        for text in ["f3", "e5", "g4", "Qh4"] {
            game.push_text(text).unwrap();
        }
        let outcome = game.outcome().unwrap();
        let pgn = game.to_pgn("Player", "Stockfish", outcome.result_token());
        assert!(pgn.starts_with("[Event \"Casual Game\"]\n"));
        assert!(pgn.contains("[White \"Player\"]"));
        assert!(pgn.contains("[Result \"0-1\"]"));
        assert!(!pgn.contains("[FEN"));
        assert!(pgn.ends_with("1. f3 e5 2. g4 Qh4# 0-1\n"));

        let custom = GameBoard::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let pgn = custom.to_pgn("A", "B", "*");
        assert!(pgn.contains("[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/8/4K2R w K - 0 1\"]"));
        assert!(pgn.ends_with("\n\n*\n"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("nf3", "nf3"), 0);
        assert_eq!(edit_distance("nf4", "nf3"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_bad_fen() {
        assert!(matches!(GameBoard::from_fen("not a fen"), Err(ChsError::InvalidFen(_))));
    }
}
