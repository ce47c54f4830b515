//! Terminal board rendering with ANSI colours.

use crate::game::{color_name, GameBoard};
use chess::{Color, File, Piece, Rank, Square};

/// ANSI escape sequences
pub mod colors {
    pub const RESET: &str = "\x1b[49;0m";
    pub const DARK: &str = "\x1b[38;5;232;1m";
    pub const LIGHT: &str = "\x1b[38;5;231;1m";
    pub const GREEN: &str = "\x1b[38;5;2;1m";
    pub const YELLOW: &str = "\x1b[38;5;226;1m";
    pub const RED: &str = "\x1b[38;5;1m";
    pub const GRAY: &str = "\x1b[38;5;242m";
    pub const BOLD: &str = "\x1b[1m";

    pub const BG_DARK: &str = "\x1b[48;5;172;1m";
    pub const BG_LIGHT: &str = "\x1b[48;5;215;1m";
    pub const BG_HIGHLIGHT_DARK: &str = "\x1b[48;5;136;1m";
    pub const BG_HIGHLIGHT_LIGHT: &str = "\x1b[48;5;143;1m";
    pub const BG_WHITE: &str = "\x1b[48;5;15;1m";
    pub const BG_BLACK: &str = "\x1b[48;5;232;1m";
}

/// Width of the advantage bar in characters.
const BAR_WIDTH: usize = 24;

fn piece_symbol(piece: Piece, color: Color) -> char {
    match (color, piece) {
        (Color::White, Piece::King) => '♔',
        (Color::White, Piece::Queen) => '♕',
        (Color::White, Piece::Rook) => '♖',
        (Color::White, Piece::Bishop) => '♗',
        (Color::White, Piece::Knight) => '♘',
        (Color::White, Piece::Pawn) => '♙',
        (Color::Black, Piece::King) => '♚',
        (Color::Black, Piece::Queen) => '♛',
        (Color::Black, Piece::Rook) => '♜',
        (Color::Black, Piece::Bishop) => '♝',
        (Color::Black, Piece::Knight) => '♞',
        (Color::Black, Piece::Pawn) => '♟',
    }
}

/// Board view from one side
#[derive(Debug, Clone, Copy)]
pub struct BoardView {
    /// Side shown at the bottom
    pub perspective: Color,
}

impl BoardView {
    pub fn new(perspective: Color) -> Self {
        Self { perspective }
    }

    /// Board with coordinates and the last move highlighted.
    pub fn render(&self, game: &GameBoard) -> String {
        let board = game.board();
        let flipped = self.perspective == Color::Black;
        let highlighted: Vec<Square> = game
            .last_move()
            .map(|mv| vec![mv.get_source(), mv.get_dest()])
            .unwrap_or_default();

        let mut out = String::new();
        out.push('\n');
        out.push_str(&file_header(flipped));
        out.push_str(&format!("{}   ┌{}┐   {}\n", colors::GRAY, "───".repeat(8), colors::RESET));

        for row in 0..8 {
            let rank_index = if flipped { row } else { 7 - row };
            let rank = Rank::from_index(rank_index);
            out.push_str(&format!("{} {} {}│", colors::GRAY, rank_index + 1, colors::RESET));

            for column in 0..8 {
                let file_index = if flipped { 7 - column } else { column };
                let square = Square::make_square(rank, File::from_index(file_index));
                let light = (file_index + rank_index) % 2 == 1;
                let background = match (highlighted.contains(&square), light) {
                    (true, true) => colors::BG_HIGHLIGHT_LIGHT,
                    (true, false) => colors::BG_HIGHLIGHT_DARK,
                    (false, true) => colors::BG_LIGHT,
                    (false, false) => colors::BG_DARK,
                };
                let (symbol, foreground) = match (board.piece_on(square), board.color_on(square)) {
                    (Some(piece), Some(color)) => (
                        piece_symbol(piece, color),
                        if color == Color::White { colors::LIGHT } else { colors::DARK },
                    ),
                    _ => (' ', colors::LIGHT),
                };
                out.push_str(&format!("{background}{foreground} {symbol} {}", colors::RESET));
            }

            out.push_str(&format!("│{} {} {}\n", colors::GRAY, rank_index + 1, colors::RESET));
        }

        out.push_str(&format!("{}   └{}┘   {}\n", colors::GRAY, "───".repeat(8), colors::RESET));
        out.push_str(&file_header(flipped));
        out
    }

    /// Side to move, check and whose turn it is.
    pub fn status(&self, game: &GameBoard) -> String {
        let to_move = game.side_to_move();
        let whose = if to_move == self.perspective { "Your" } else { "Computer's" };
        let mut out = format!(
            "{}{} to move ({} turn){}\n",
            colors::BOLD,
            color_name(to_move),
            whose,
            colors::RESET
        );
        if game.is_check() && !game.is_game_over() {
            out.push_str(&format!("{}{}Check!{}\n", colors::RED, colors::BOLD, colors::RESET));
        }
        out
    }
}

fn file_header(flipped: bool) -> String {
    let files = if flipped { "hgfedcba" } else { "abcdefgh" };
    let mut header = format!("{}   ", colors::GRAY);
    for file in files.chars() {
        header.push_str(&format!(" {file} "));
    }
    header.push_str(&format!("   {}\n", colors::RESET));
    header
}

/// Numbered move list built from the two SAN stacks.
pub fn move_list(game: &GameBoard) -> String {
    let white = &game.san_move_stack_white;
    let black = &game.san_move_stack_black;
    // A game started with black to move leaves the first white slot empty
    let offset = usize::from(game.starting_side() == Color::Black);
    let rows = (white.len() + offset).max(black.len());

    let mut out = String::new();
    for i in 0..rows {
        let w = match i.checked_sub(offset) {
            Some(j) => white.get(j).map(String::as_str).unwrap_or(""),
            None => "...",
        };
        let b = black.get(i).map(String::as_str).unwrap_or("");
        out.push_str(&format!("{}{:>3}.{} {:<8} {}\n", colors::GRAY, i + 1, colors::RESET, w, b));
    }
    out
}

/// Bar filled in proportion to `advantage` in (-1, 1); None means no evaluation.
pub fn advantage_bar(advantage: Option<f64>) -> String {
    let Some(advantage) = advantage else {
        return format!("{}Evaluation unavailable{}\n", colors::GRAY, colors::RESET);
    };
    let filled = (((advantage + 1.0) / 2.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "{}{}{}{}{} {:+.3}\n",
        colors::BG_WHITE,
        " ".repeat(filled),
        colors::BG_BLACK,
        " ".repeat(BAR_WIDTH - filled),
        colors::RESET,
        advantage
    )
}

pub fn error_line(message: &str) -> String {
    format!("{}Error: {}{}\n", colors::RED, message, colors::RESET)
}

pub fn hint_line(san: &str) -> String {
    format!("{}Hint: Try {}{}\n", colors::YELLOW, san, colors::RESET)
}

pub fn info_line(message: &str) -> String {
    format!("{}{}{}\n", colors::GRAY, message, colors::RESET)
}
