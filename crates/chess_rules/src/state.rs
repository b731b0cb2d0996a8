//! Game state classification
//!
//! Decides whether a position has ended the game and, if so, how.
//! A lone position carries no history, so [`position_status`] never reports
//! fivefold repetition; `Replay::status` adds it from the replayed game.

use shakmaty::{Chess, Color, Position};

/// Half-move clock value at which the 75-move rule ends the game
const SEVENTY_FIVE_MOVE_HALFMOVES: u32 = 150;

/// Outcome of inspecting a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    /// Game continues
    Ongoing,
    /// Side to move is mated
    Checkmate { winner: Color },
    /// Side to move has no legal move and is not in check
    Stalemate,
    /// Neither side can mate
    InsufficientMaterial,
    /// 75 moves without capture or pawn move
    SeventyFiveMoveRule,
    /// Same position for the fifth time
    FivefoldRepetition,
}

impl PositionStatus {
    /// True for every status except [`PositionStatus::Ongoing`]
    pub fn is_terminal(self) -> bool {
        !matches!(self, PositionStatus::Ongoing)
    }

    /// PGN result string
    pub fn result(self) -> &'static str {
        match self {
            PositionStatus::Ongoing => "*",
            PositionStatus::Checkmate {
                winner: Color::White,
            } => "1-0",
            PositionStatus::Checkmate {
                winner: Color::Black,
            } => "0-1",
            PositionStatus::Stalemate
            | PositionStatus::InsufficientMaterial
            | PositionStatus::SeventyFiveMoveRule
            | PositionStatus::FivefoldRepetition => "1/2-1/2",
        }
    }
}

/// Classify a position
pub fn position_status(pos: &Chess) -> PositionStatus {
    if pos.is_checkmate() {
        PositionStatus::Checkmate {
            winner: !pos.turn(),
        }
    } else if pos.is_stalemate() {
        PositionStatus::Stalemate
    } else if pos.is_insufficient_material() {
        PositionStatus::InsufficientMaterial
    } else if pos.halfmoves() >= SEVENTY_FIVE_MOVE_HALFMOVES {
        PositionStatus::SeventyFiveMoveRule
    } else {
        PositionStatus::Ongoing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::replay_uci;

    #[test]
    fn test_start_position_is_ongoing() {
        let status = position_status(&Chess::default());
        assert_eq!(status, PositionStatus::Ongoing);
        assert!(!status.is_terminal());
        assert_eq!(status.result(), "*");
    }

    #[test]
    fn test_fools_mate_is_checkmate_for_black() {
        let replay = replay_uci("f2f3 e7e5 g2g4 d8h4").unwrap();
        let status = position_status(&replay.position);
        assert_eq!(
            status,
            PositionStatus::Checkmate {
                winner: Color::Black
            }
        );
        assert!(status.is_terminal());
        assert_eq!(status.result(), "0-1");
    }

    #[test]
    fn test_scholars_mate_is_checkmate_for_white() {
        let replay = replay_uci("e2e4 e7e5 d1h5 b8c6 f1c4 g8f6 h5f7").unwrap();
        assert_eq!(
            position_status(&replay.position),
            PositionStatus::Checkmate {
                winner: Color::White
            }
        );
    }

    #[test]
    fn test_draw_results() {
        assert_eq!(PositionStatus::Stalemate.result(), "1/2-1/2");
        assert_eq!(PositionStatus::InsufficientMaterial.result(), "1/2-1/2");
        assert!(PositionStatus::SeventyFiveMoveRule.is_terminal());
        assert!(PositionStatus::FivefoldRepetition.is_terminal());
        assert_eq!(PositionStatus::FivefoldRepetition.result(), "1/2-1/2");
    }
}
