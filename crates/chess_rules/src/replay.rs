//! History replay
//!
//! Rebuilds a position from scratch out of a cumulative UCI move list.
//! Along the way it counts how often the final position occurred, which is
//! what fivefold repetition needs and a lone position cannot tell.

use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Chess, Color, EnPassantMode, Move, Position};

use crate::error::{RulesError, RulesResult};
use crate::moves::parse_uci;
use crate::state::{position_status, PositionStatus};

/// Occurrences of one position that end the game
const FIVEFOLD: usize = 5;

/// Position reached by replaying a history from the initial position
#[derive(Debug, Clone)]
pub struct Replay {
    pub position: Chess,
    pub moves: Vec<Move>,
    /// Times the final position occurred in the game, itself included
    pub repetitions: usize,
}

impl Replay {
    /// Side to move in the final position
    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// Number of half-moves replayed
    pub fn ply(&self) -> usize {
        self.moves.len()
    }

    /// Classify the final position, fivefold repetition included
    pub fn status(&self) -> PositionStatus {
        classify(&self.position, self.repetitions)
    }
}

/// [`position_status`] extended with the repetition count of `pos`
pub fn classify(pos: &Chess, repetitions: usize) -> PositionStatus {
    match position_status(pos) {
        PositionStatus::Ongoing if repetitions >= FIVEFOLD => PositionStatus::FivefoldRepetition,
        status => status,
    }
}

fn position_key(pos: &Chess) -> Zobrist64 {
    pos.zobrist_hash(EnPassantMode::Legal)
}

/// Replay a space-separated UCI move list
///
/// Blank input yields the initial position. Every move must be legal where
/// it is played; the first one that is not aborts the replay.
///
/// # Errors
///
/// [`RulesError::ReplayFailed`] carrying the 0-based ply and the offending
/// token.
pub fn replay_uci(moves: &str) -> RulesResult<Replay> {
    replay_tokens(moves.split_whitespace())
}

/// Replay an already split sequence of UCI tokens
pub fn replay_tokens<'a, I>(tokens: I) -> RulesResult<Replay>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut position = Chess::default();
    let mut moves = Vec::new();
    let mut keys = vec![position_key(&position)];

    for (ply, token) in tokens.into_iter().enumerate() {
        let chess_move = parse_uci(&position, token).map_err(|err| RulesError::ReplayFailed {
            ply,
            token: token.to_string(),
            reason: err.to_string(),
        })?;
        position.play_unchecked(&chess_move);
        keys.push(position_key(&position));
        moves.push(chess_move);
    }

    let last = position_key(&position);
    let repetitions = keys.iter().filter(|key| **key == last).count();

    Ok(Replay {
        position,
        moves,
        repetitions,
    })
}
