//! Rules engine adapter.
//!
//! `chess::Board` only knows the current position, so [`Position`] keeps the
//! move list, the halfmove clock and the repetition history needed for the
//! automatic draw rules.

use chess::{BitBoard, Board, BoardStatus, ChessMove, File, MoveGen, Piece, Square};
use std::str::FromStr;

use crate::error::{GameError, GameResult};
use crate::types::{DrawMethod, Outcome, Side};

const FIVEFOLD: usize = 5;
/// 75 moves by each side, counted in plies
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
    moves: Vec<ChessMove>,
    halfmove_clock: u32,
    /// Hashes since the last capture or pawn move, current position included
    repetitions: Vec<u64>,
}

impl Default for Position {
    fn default() -> Self {
        Self::from_board(Board::default())
    }
}

impl Position {
    /// The standard starting position
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            moves: Vec::new(),
            halfmove_clock: 0,
            repetitions: vec![board.get_hash()],
        }
    }

    pub fn from_fen(fen: &str) -> GameResult<Self> {
        Board::from_str(fen)
            .map(Self::from_board)
            .map_err(|e| GameError::InvalidMove(format!("bad position {}: {}", fen, e)))
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn turn(&self) -> Side {
        self.board.side_to_move().into()
    }

    /// Decode a move in SAN (`Nf3`) or coordinate notation (`g1f3`)
    pub fn parse_move(&self, text: &str) -> GameResult<ChessMove> {
        let original = text.trim();
        let text = original.trim_end_matches(['+', '#', '!', '?']);
        if text.is_empty() {
            return Err(GameError::InvalidMove(original.to_string()));
        }

        // "a8=Q" and "a8Q" are the same promotion
        let san = text.replace('=', "");

        ChessMove::from_str(text)
            .ok()
            .filter(|mv| self.board.legal(*mv))
            .or_else(|| {
                ChessMove::from_san(&self.board, &san)
                    .ok()
                    .filter(|mv| self.board.legal(*mv))
            })
            .or_else(|| self.parse_pawn_move(&san))
            .ok_or_else(|| GameError::InvalidMove(original.to_string()))
    }

    /// Pawn moves `from_san` misses: en passant ("exd6") and some promotions
    fn parse_pawn_move(&self, text: &str) -> Option<ChessMove> {
        if !text.is_ascii() {
            return None;
        }
        let (from_file, rest) = match text.as_bytes() {
            [c @ b'a'..=b'h', b'x', ..] => {
                (Some(File::from_index((*c - b'a') as usize)), &text[2..])
            }
            _ => (None, text),
        };
        if rest.len() < 2 {
            return None;
        }
        let dest = Square::from_str(&rest[..2]).ok()?;
        let promotion = match &rest[2..] {
            "" => None,
            "Q" => Some(Piece::Queen),
            "R" => Some(Piece::Rook),
            "B" => Some(Piece::Bishop),
            "N" => Some(Piece::Knight),
            _ => return None,
        };

        MoveGen::new_legal(&self.board).find(|mv| {
            let source_file = mv.get_source().get_file();
            let file_matches = match from_file {
                Some(file) => source_file == file && source_file != dest.get_file(),
                None => source_file == dest.get_file() && self.board.piece_on(dest).is_none(),
            };
            self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
                && file_matches
                && mv.get_dest() == dest
                && mv.get_promotion() == promotion
        })
    }

    pub fn apply(&mut self, mv: ChessMove) -> GameResult<()> {
        if !self.board.legal(mv) {
            return Err(GameError::IllegalMove(mv.to_string()));
        }

        let irreversible = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(mv.get_dest()).is_some();

        self.board = self.board.make_move_new(mv);
        self.moves.push(mv);

        if irreversible {
            self.halfmove_clock = 0;
            self.repetitions.clear();
        } else {
            self.halfmove_clock += 1;
        }
        self.repetitions.push(self.board.get_hash());
        Ok(())
    }

    pub fn outcome(&self) -> Outcome {
        match self.board.status() {
            BoardStatus::Checkmate => Outcome::Decisive {
                winner: self.turn().opposite(),
            },
            BoardStatus::Stalemate => Outcome::Draw {
                method: DrawMethod::Stalemate,
            },
            BoardStatus::Ongoing => {
                if insufficient_material(&self.board) {
                    Outcome::Draw {
                        method: DrawMethod::InsufficientMaterial,
                    }
                } else if self.repetition_count() >= FIVEFOLD {
                    Outcome::Draw {
                        method: DrawMethod::FivefoldRepetition,
                    }
                } else if self.halfmove_clock >= SEVENTY_FIVE_MOVE_PLIES {
                    Outcome::Draw {
                        method: DrawMethod::SeventyFiveMoveRule,
                    }
                } else {
                    Outcome::NoOutcome
                }
            }
        }
    }

    pub fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.board).collect()
    }

    pub fn last_move(&self) -> Option<ChessMove> {
        self.moves.last().copied()
    }

    pub fn ply(&self) -> usize {
        self.moves.len()
    }

    /// FEN with this position's own move counters
    pub fn fen(&self) -> String {
        let board_fen = self.board.to_string();
        let placement: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        let fullmove = self.moves.len() / 2 + 1;
        format!(
            "{} {} {}",
            placement.join(" "),
            self.halfmove_clock,
            fullmove
        )
    }

    fn repetition_count(&self) -> usize {
        let current = self.board.get_hash();
        self.repetitions.iter().filter(|h| **h == current).count()
    }
}

/// Dead positions: bare kings, a single minor piece, or bishops all on one color
fn insufficient_material(board: &Board) -> bool {
    let heavy: BitBoard =
        *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy.popcnt() > 0 {
        return false;
    }

    let knights = board.pieces(Piece::Knight).popcnt();
    let bishops = *board.pieces(Piece::Bishop);

    match (knights, bishops.popcnt()) {
        (0, 0) | (1, 0) | (0, 1) => true,
        (0, _) => {
            let shades: Vec<usize> = bishops.map(square_shade).collect();
            shades.windows(2).all(|pair| pair[0] == pair[1])
        }
        _ => false,
    }
}

fn square_shade(square: Square) -> usize {
    (square.get_rank().to_index() + square.get_file().to_index()) % 2
}
