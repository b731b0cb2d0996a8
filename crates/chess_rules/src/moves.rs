//! Move parsing, legality and notation
//!
//! Converts between the two notations the bot deals with: UCI coordinate
//! tokens (what the game server speaks) and SAN (what the oracle writes and
//! what transcripts are made of).

use shakmaty::san::{San, SanPlus};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, File, Move, Position, Role};

use crate::error::{RulesError, RulesResult};

/// Resolve a UCI token (`e2e4`, `e7e8q`) to a legal move
///
/// # Errors
///
/// [`RulesError::InvalidUci`] if the token does not parse,
/// [`RulesError::IllegalMove`] if it is not legal in `pos`.
pub fn parse_uci(pos: &Chess, token: &str) -> RulesResult<Move> {
    let uci: UciMove = token.parse().map_err(|_| RulesError::InvalidUci {
        token: token.to_string(),
    })?;
    uci.to_move(pos).map_err(|_| RulesError::IllegalMove {
        token: token.to_string(),
    })
}

/// Resolve a SAN-like token to a legal move
///
/// Accepts standard SAN with or without check/mate suffixes, castling
/// written with zeros, promotions without `=` (`e8Q`), and the pawn-capture
/// shorthand `exd` when exactly one legal pawn capture matches it. A
/// shorthand capture onto the last rank promotes to a queen.
///
/// # Errors
///
/// [`RulesError::InvalidSan`] if the token does not parse,
/// [`RulesError::IllegalMove`] if nothing legal matches,
/// [`RulesError::AmbiguousMove`] if the shorthand names captures by
/// different pawns or onto different squares.
pub fn resolve_san(pos: &Chess, token: &str) -> RulesResult<Move> {
    let normalized = normalize_san(token);

    if let Some((from_file, to_file)) = pawn_capture_shorthand(&normalized) {
        return resolve_pawn_capture(pos, token, from_file, to_file);
    }

    let san: San = normalized.parse().map_err(|_| RulesError::InvalidSan {
        token: token.to_string(),
    })?;
    san.to_move(pos).map_err(|_| RulesError::IllegalMove {
        token: token.to_string(),
    })
}

/// Check whether a SAN-like token names a legal move in `pos`
pub fn is_legal_san(pos: &Chess, token: &str) -> bool {
    resolve_san(pos, token).is_ok()
}

/// Standard (non-Chess960) UCI rendering of a move
pub fn to_uci(chess_move: &Move) -> String {
    UciMove::from_move(chess_move, CastlingMode::Standard).to_string()
}

/// SAN rendering of a move played from `pos`, including `+`/`#`
pub fn to_san(pos: &Chess, chess_move: &Move) -> String {
    let mut scratch = pos.clone();
    SanPlus::from_move_and_play_unchecked(&mut scratch, chess_move).to_string()
}

/// All legal moves in `pos`
pub fn legal_moves(pos: &Chess) -> Vec<Move> {
    pos.legal_moves().into_iter().collect()
}

fn normalize_san(token: &str) -> String {
    let core = token.trim().trim_end_matches(['+', '#', '!', '?']);

    if core.starts_with('0') {
        return core.replace('0', "O");
    }

    // e8Q -> e8=Q
    let bytes = core.as_bytes();
    if let [.., rank, promo] = bytes {
        let is_pawn_move = matches!(bytes.first(), Some(b'a'..=b'h'));
        if is_pawn_move && matches!(rank, b'1' | b'8') && matches!(promo, b'Q' | b'R' | b'B' | b'N')
        {
            let (head, tail) = core.split_at(core.len() - 1);
            return format!("{head}={tail}");
        }
    }

    core.to_string()
}

fn pawn_capture_shorthand(token: &str) -> Option<(File, File)> {
    let mut chars = token.chars();
    let from = chars.next()?;
    let capture = chars.next()?;
    let to = chars.next()?;
    if capture != 'x' || chars.next().is_some() {
        return None;
    }
    Some((file_from_char(from)?, file_from_char(to)?))
}

fn file_from_char(ch: char) -> Option<File> {
    if ch.is_ascii_lowercase() {
        File::from_char(ch)
    } else {
        None
    }
}

fn resolve_pawn_capture(
    pos: &Chess,
    token: &str,
    from_file: File,
    to_file: File,
) -> RulesResult<Move> {
    let candidates: Vec<Move> = pos
        .legal_moves()
        .into_iter()
        .filter(|m| {
            m.role() == Role::Pawn
                && m.is_capture()
                && m.from().map(|sq| sq.file()) == Some(from_file)
                && m.to().file() == to_file
        })
        .collect();

    match candidates.as_slice() {
        [] => Err(RulesError::IllegalMove {
            token: token.to_string(),
        }),
        [only] => Ok(only.clone()),
        many if same_squares(many) => many
            .iter()
            .find(|m| m.promotion() == Some(Role::Queen))
            .cloned()
            .ok_or_else(|| RulesError::AmbiguousMove {
                token: token.to_string(),
                candidates: many.len(),
            }),
        many => Err(RulesError::AmbiguousMove {
            token: token.to_string(),
            candidates: many.len(),
        }),
    }
}

/// Candidates that differ only by promotion piece
fn same_squares(moves: &[Move]) -> bool {
    moves
        .windows(2)
        .all(|pair| pair[0].from() == pair[1].from() && pair[0].to() == pair[1].to())
}
