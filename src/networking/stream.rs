//! NDJSON stream decoding

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::io;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;

use crate::core::{BotError, BotResult};
use shared::decode_line;

/// Longest line accepted from the server
const MAX_LINE_BYTES: usize = 1 << 20;

/// Typed events decoded from a long-lived response body
pub type EventStream<T> = BoxStream<'static, BotResult<T>>;

/// Decode a byte stream of newline-delimited JSON into typed events
///
/// Blank keep-alive lines are skipped. A line that fails to decode yields an
/// error item and the stream continues with the next line.
pub fn ndjson_stream<S, T>(bytes: S) -> EventStream<T>
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    T: DeserializeOwned + Send + 'static,
{
    let lines = FramedRead::new(
        StreamReader::new(bytes),
        LinesCodec::new_with_max_length(MAX_LINE_BYTES),
    );

    lines
        .filter_map(|line| async move {
            match line {
                Ok(line) => decode_line::<T>(&line).map_err(BotError::from).transpose(),
                Err(err) => Some(Err(codec_error(err))),
            }
        })
        .boxed()
}

fn codec_error(err: LinesCodecError) -> BotError {
    match err {
        LinesCodecError::Io(err) => BotError::Io(err),
        LinesCodecError::MaxLineLengthExceeded => BotError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("stream line longer than {MAX_LINE_BYTES} bytes"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use shared::{AccountEvent, GameEvent};

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        let parts: Vec<io::Result<Bytes>> = parts
            .iter()
            .map(|part| Ok(Bytes::from_static(part.as_bytes())))
            .collect();
        stream::iter(parts)
    }

    #[tokio::test]
    async fn test_keep_alives_are_skipped() {
        let events: Vec<BotResult<AccountEvent>> = ndjson_stream(chunks(&[
            "\n",
            "{\"type\":\"challengeCanceled\",\"challenge\":{\"id\":\"c1\"}}\n",
            "\n\n",
        ]))
        .collect()
        .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Ok(AccountEvent::ChallengeCanceled { .. })
        ));
    }

    #[tokio::test]
    async fn test_lines_split_across_chunks() {
        //! The server flushes whenever it likes; a line may span several chunks
        let events: Vec<BotResult<GameEvent>> = ndjson_stream(chunks(&[
            "{\"type\":\"gameState\",\"moves\":\"e2",
            "e4\",\"status\":\"started\"}\n{\"type\":\"chatLine\",",
            "\"username\":\"a\",\"text\":\"hi\",\"room\":\"player\"}\n",
        ]))
        .collect()
        .await;

        assert_eq!(events.len(), 2);
        let state = events[0].as_ref().unwrap().state().unwrap();
        assert_eq!(state.moves, "e2e4");
        assert!(matches!(events[1], Ok(GameEvent::ChatLine(_))));
    }

    #[tokio::test]
    async fn test_bad_line_does_not_end_stream() {
        let events: Vec<BotResult<AccountEvent>> = ndjson_stream(chunks(&[
            "not json\n",
            "{\"type\":\"gameFinish\",\"game\":{\"id\":\"g1\",\"color\":\"white\"}}\n",
        ]))
        .collect()
        .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Err(BotError::Decode(_))));
        assert!(matches!(events[1], Ok(AccountEvent::GameFinish { .. })));
    }

    #[tokio::test]
    async fn test_final_line_without_newline() {
        let events: Vec<BotResult<AccountEvent>> =
            ndjson_stream(chunks(&["{\"type\":\"somethingElse\"}"]))
                .collect()
                .await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Ok(AccountEvent::Unsupported)));
    }
}
