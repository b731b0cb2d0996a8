//! Board state reconstruction
//!
//! Every state-bearing game event carries the full move list since the start
//! of the game. The tracker rebuilds the position from that list each time
//! instead of patching the previous position, so a missed or duplicated event
//! can never leave the worker on a stale board.
//!
//! The same pass renders the SAN transcript used as oracle prompt context:
//!
//! ```text
//! 1. e4 e5
//! 2. Nf3 Nc6
//! 3. Bb5
//! ```
//!
//! A transcript that ends after White's move invites Black's reply on the same
//! line; one that ends after a full pair invites the next numbered move.

use chess_rules::{classify, replay_uci, to_san, Chess, Color, Move, Position, PositionStatus};

use crate::core::{BotError, BotResult};

/// Position rebuilt from an authoritative move list
#[derive(Debug, Clone)]
pub struct TrackedPosition {
    pub position: Chess,
    pub moves: Vec<Move>,
    pub san: Vec<String>,
    pub transcript: String,
    /// Occurrences of the current position, itself included
    pub repetitions: usize,
}

impl TrackedPosition {
    /// Side to move
    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// Half-moves played so far
    pub fn ply(&self) -> usize {
        self.moves.len()
    }

    pub fn status(&self) -> PositionStatus {
        classify(&self.position, self.repetitions)
    }
}

/// Rebuild the position for `game_id` from a space-separated UCI move list
///
/// # Errors
///
/// [`BotError::ProtocolInconsistency`] if any move fails to replay. The server
/// is authoritative, so this means the session cannot continue safely.
pub fn rebuild(game_id: &str, moves: &str) -> BotResult<TrackedPosition> {
    let replay = replay_uci(moves).map_err(|source| BotError::ProtocolInconsistency {
        game_id: game_id.to_string(),
        source,
    })?;

    let mut scratch = Chess::default();
    let mut san = Vec::with_capacity(replay.moves.len());
    for chess_move in &replay.moves {
        san.push(to_san(&scratch, chess_move));
        scratch.play_unchecked(chess_move);
    }

    let transcript = format_transcript(&san);

    Ok(TrackedPosition {
        position: replay.position,
        moves: replay.moves,
        san,
        transcript,
        repetitions: replay.repetitions,
    })
}

/// Numbered move pairs, one White/Black pair per line
pub fn format_transcript<S: AsRef<str>>(san: &[S]) -> String {
    let mut transcript = String::new();
    for (index, mv) in san.iter().enumerate() {
        if index % 2 == 0 {
            transcript.push_str(&format!("{}. {}", index / 2 + 1, mv.as_ref()));
        } else {
            transcript.push_str(&format!(" {}\n", mv.as_ref()));
        }
    }
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_rules::RulesError;

    #[test]
    fn test_empty_history() {
        let tracked = rebuild("g1", "").unwrap();
        assert_eq!(tracked.turn(), Color::White);
        assert_eq!(tracked.ply(), 0);
        assert!(tracked.transcript.is_empty());
        assert_eq!(tracked.status(), PositionStatus::Ongoing);
    }

    #[test]
    fn test_transcript_after_white_move_stays_on_line() {
        let tracked = rebuild("g1", "e2e4").unwrap();
        assert_eq!(tracked.transcript, "1. e4");
        assert_eq!(tracked.turn(), Color::Black);
    }

    #[test]
    fn test_transcript_pairs_and_numbering() {
        let tracked = rebuild("g1", "e2e4 e7e5 g1f3 b8c6 f1b5").unwrap();
        assert_eq!(tracked.transcript, "1. e4 e5\n2. Nf3 Nc6\n3. Bb5");
        assert_eq!(tracked.san, vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]);
    }

    #[test]
    fn test_transcript_marks_check_and_castling() {
        let tracked = rebuild("g1", "e2e4 e7e5 g1f3 b8c6 f1c4 g8f6 e1g1 f8c5 c4f7").unwrap();
        assert_eq!(
            tracked.transcript,
            "1. e4 e5\n2. Nf3 Nc6\n3. Bc4 Nf6\n4. O-O Bc5\n5. Bxf7+"
        );
    }

    #[test]
    fn test_checkmate_history_is_terminal() {
        let tracked = rebuild("g1", "f2f3 e7e5 g2g4 d8h4").unwrap();
        assert!(tracked.status().is_terminal());
        assert_eq!(tracked.san.last().map(String::as_str), Some("Qh4#"));
    }

    #[test]
    fn test_fivefold_repetition_is_terminal() {
        let shuffle = "g1f3 g8f6 f3g1 f6g8";
        let tracked = rebuild("g1", &vec![shuffle; 4].join(" ")).unwrap();
        assert_eq!(tracked.status(), PositionStatus::FivefoldRepetition);

        let tracked = rebuild("g1", &vec![shuffle; 3].join(" ")).unwrap();
        assert_eq!(tracked.status(), PositionStatus::Ongoing);
    }

    #[test]
    fn test_bad_history_is_protocol_inconsistency() {
        //! An illegal server move must abort rather than be skipped
        let err = rebuild("g7", "e2e4 e2e4").unwrap_err();
        match err {
            BotError::ProtocolInconsistency { game_id, source } => {
                assert_eq!(game_id, "g7");
                assert!(matches!(source, RulesError::ReplayFailed { ply: 1, .. }));
            }
            other => panic!("Expected ProtocolInconsistency, got {other:?}"),
        }
    }

    #[test]
    fn test_format_transcript_from_plain_strings() {
        assert_eq!(format_transcript(&["d4", "d5", "c4"]), "1. d4 d5\n2. c4");
    }
}
