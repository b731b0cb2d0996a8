//! Move token extraction from free-form oracle text
//!
//! The oracle continues a PGN transcript, so its output usually starts with a
//! move but may carry move numbers, a second move, commentary or junk. This
//! module finds the first move-shaped token and nothing more; legality is the
//! rules engine's call.
//!
//! # Accepted Grammar
//!
//! The first match of, in order of preference:
//!
//! - **SAN**: `[KQBNR]? [a-h]? [1-8]? x? [a-h][1-8] (=?[QRBN])?`
//!   covers pawn pushes (`e4`), piece moves (`Nf3`), file, rank and full
//!   square disambiguation (`Nbd7`, `R1e2`, `Qh4xe1`), captures and
//!   promotions with or without `=` (`e8=Q`, `bxa8N`)
//! - **Castling**: `O-O`, `O-O-O`, or the same with zeros
//! - **Pawn-capture shorthand**: `[a-h]x[a-h]` (`exd`)
//!
//! followed by an optional `+`, `++` or `#`. The token must start at a word
//! boundary and its core must end at one, so prose such as `relaxed` yields
//! nothing rather than a fragment. Full-square disambiguation means a UCI
//! token like `e2e4` is picked up whole.

use regex::Regex;
use std::sync::OnceLock;

const MOVE_PATTERN: &str = r"\b(?:[KQBNR]?[a-h]?[1-8]?x?[a-h][1-8](?:=?[QRBN])?|O-O(?:-O)?|0-0(?:-0)?|[a-h]x[a-h])\b(?:\+{1,2}|#)?";

fn move_regex() -> &'static Regex {
    static MOVE_REGEX: OnceLock<Regex> = OnceLock::new();
    MOVE_REGEX.get_or_init(|| Regex::new(MOVE_PATTERN).expect("move pattern is a valid regex"))
}

/// First move-shaped token in `text`, if any
///
/// # Examples
///
/// ```
/// use xfchess_bot::game::ai::extract_move;
///
/// assert_eq!(extract_move(" Nf3 Nc6 3. Bb5"), Some("Nf3"));
/// assert_eq!(extract_move("I resign."), None);
/// ```
pub fn extract_move(text: &str) -> Option<&str> {
    move_regex().find(text).map(|m| m.as_str())
}
