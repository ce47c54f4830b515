use chess::{Board, BoardStatus, ChessMove, MoveGen, Piece, Square};

fn piece_letter(piece: Piece) -> Option<char> {
    match piece {
        Piece::King => Some('K'),
        Piece::Queen => Some('Q'),
        Piece::Rook => Some('R'),
        Piece::Bishop => Some('B'),
        Piece::Knight => Some('N'),
        Piece::Pawn => None,
    }
}

fn push_square(san: &mut String, square: Square) {
    san.push((b'a' + square.get_file().to_index() as u8) as char);
    san.push((b'1' + square.get_rank().to_index() as u8) as char);
}

/// Convert a legal move to Standard Algebraic Notation (SAN)
pub fn to_san(board: &Board, chess_move: ChessMove) -> String {
    let from_square = chess_move.get_source();
    let to_square = chess_move.get_dest();

    let Some(piece) = board.piece_on(from_square) else {
        // Not a move in this position; fall back to coordinate notation
        return chess_move.to_string();
    };

    let mut san = String::new();

    let file_distance =
        (from_square.get_file().to_index() as i32 - to_square.get_file().to_index() as i32).abs();
    if piece == Piece::King && file_distance == 2 {
        san.push_str(if to_square.get_file().to_index() > from_square.get_file().to_index() {
            "O-O"
        } else {
            "O-O-O"
        });
    } else {
        if let Some(letter) = piece_letter(piece) {
            san.push(letter);
            push_disambiguation(&mut san, board, chess_move, piece);
        }

        // Pawns changing file always capture, including en passant
        let is_capture = board.piece_on(to_square).is_some()
            || (piece == Piece::Pawn && from_square.get_file() != to_square.get_file());
        if is_capture {
            if piece == Piece::Pawn {
                san.push((b'a' + from_square.get_file().to_index() as u8) as char);
            }
            san.push('x');
        }

        push_square(&mut san, to_square);

        if let Some(promotion) = chess_move.get_promotion().and_then(piece_letter) {
            san.push('=');
            san.push(promotion);
        }
    }

    let next_board = board.make_move_new(chess_move);
    if next_board.status() == BoardStatus::Checkmate {
        san.push('#');
    } else if next_board.checkers().popcnt() > 0 {
        san.push('+');
    }

    san
}

/// File, rank or both of the source square when another piece of the same kind
/// can reach the destination.
fn push_disambiguation(san: &mut String, board: &Board, chess_move: ChessMove, piece: Piece) {
    let from_square = chess_move.get_source();
    let to_square = chess_move.get_dest();

    let rivals: Vec<Square> = MoveGen::new_legal(board)
        .filter(|mv| {
            mv.get_dest() == to_square
                && mv.get_source() != from_square
                && board.piece_on(mv.get_source()) == Some(piece)
        })
        .map(|mv| mv.get_source())
        .collect();

    if rivals.is_empty() {
        return;
    }

    let file_unique = rivals.iter().all(|sq| sq.get_file() != from_square.get_file());
    let rank_unique = rivals.iter().all(|sq| sq.get_rank() != from_square.get_rank());

    if file_unique {
        san.push((b'a' + from_square.get_file().to_index() as u8) as char);
    } else if rank_unique {
        san.push((b'1' + from_square.get_rank().to_index() as u8) as char);
    } else {
        push_square(san, from_square);
    }
}
