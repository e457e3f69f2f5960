//! Integration tests for the streaming fragment decoder

mod common;

use chatwire_core::streaming::{DecoderState, FragmentDecoder};
use chatwire_core::{ChatError, ChatResult, CompletionFragment};
use common::{chunk_events, chunk_events_with_terminator, sse_body, split_by, stream_head};
use proptest::prelude::*;
use test_case::test_case;

/// Feed `pieces` in order, then close if the stream is still open
fn decode(pieces: &[Vec<u8>]) -> (ChatResult<DecoderState>, Vec<String>) {
    let mut decoder = FragmentDecoder::new();
    let mut texts = Vec::new();
    let mut on_fragment = |fragment: CompletionFragment| -> ChatResult<()> {
        texts.push(fragment.text()?.to_string());
        Ok(())
    };

    for piece in pieces {
        match decoder.feed(piece, &mut on_fragment) {
            Ok(state) if state.is_terminal() => break,
            Ok(_) => {}
            Err(err) => return (Err(err), texts),
        }
    }
    (decoder.close(), texts)
}

fn wire(texts: &[&str], chunked: bool, with_done: bool) -> Vec<u8> {
    let body = sse_body(texts, with_done);
    let body = if chunked { chunk_events(&body) } else { body };
    format!("{}{}", stream_head(chunked), body).into_bytes()
}

/// Chunked wire with a terminator chunk after the first `after` events
fn keep_alive_wire(texts: &[&str], with_done: bool, after: usize) -> Vec<u8> {
    let body = chunk_events_with_terminator(&sse_body(texts, with_done), after);
    format!("{}{}", stream_head(true), body).into_bytes()
}

#[test_case(false, &[usize::MAX] ; "plain single read")]
#[test_case(true, &[usize::MAX] ; "chunked single read")]
#[test_case(false, &[1] ; "plain byte at a time")]
#[test_case(true, &[1] ; "chunked byte at a time")]
#[test_case(true, &[3, 7, 2, 19] ; "chunked ragged reads")]
#[test_case(false, &[40, 5] ; "plain ragged reads")]
fn test_fragments_in_wire_order(chunked: bool, sizes: &[usize]) {
    let bytes = wire(&["The", " sky", " is", " blue."], chunked, true);
    let (state, texts) = decode(&split_by(&bytes, sizes));

    assert_eq!(state.unwrap(), DecoderState::Done);
    assert_eq!(texts, vec!["The", " sky", " is", " blue."]);
}

#[test]
fn test_peer_close_without_sentinel() {
    let bytes = wire(&["partial", " answer"], false, false);
    let (state, texts) = decode(&[bytes]);

    assert_eq!(state.unwrap(), DecoderState::ClosedByPeer);
    assert_eq!(texts, vec!["partial", " answer"]);
}

#[test]
fn test_peer_close_drops_undelimited_payload() {
    let mut bytes = wire(&["kept"], false, false);
    bytes.extend_from_slice(br#"data: {"choices":[{"delta":{"content":"lost"}}]}"#);
    let (state, texts) = decode(&[bytes]);

    assert_eq!(state.unwrap(), DecoderState::ClosedByPeer);
    assert_eq!(texts, vec!["kept"]);
}

#[test]
fn test_sentinel_stops_before_trailing_events() {
    let mut bytes = wire(&["a"], true, true);
    bytes.extend_from_slice(sse_body(&["b"], true).as_bytes());
    let (state, texts) = decode(&split_by(&bytes, &[11]));

    assert_eq!(state.unwrap(), DecoderState::Done);
    assert_eq!(texts, vec!["a"]);
}

#[test]
fn test_malformed_payload_stops_the_call() {
    let mut body = sse_body(&["one", "two"], false);
    body.push_str("data: {\"bad json\"\n\n");
    body.push_str(&sse_body(&["three"], true));
    let bytes = format!("{}{}", stream_head(false), body).into_bytes();

    let (state, texts) = decode(&split_by(&bytes, &[13]));
    assert!(matches!(state, Err(ChatError::Framing { .. })));
    assert_eq!(texts, vec!["one", "two"]);
}

#[test]
fn test_missing_delta_content_is_schema_error() {
    let body = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n";
    let bytes = format!("{}{}", stream_head(false), body).into_bytes();
    let (state, texts) = decode(&[bytes]);

    assert!(matches!(state, Err(ChatError::Schema { ref path }) if path == "choices[0].delta.content"));
    assert!(texts.is_empty());
}

#[test_case(&[usize::MAX] ; "single read")]
#[test_case(&[1] ; "byte at a time")]
#[test_case(&[5, 11, 3] ; "ragged reads")]
fn test_events_after_mid_stream_terminator(sizes: &[usize]) {
    let bytes = keep_alive_wire(&["a", "b", "c"], true, 1);
    let (state, texts) = decode(&split_by(&bytes, sizes));

    assert_eq!(state.unwrap(), DecoderState::Done);
    assert_eq!(texts, vec!["a", "b", "c"]);
}

#[test]
fn test_error_status_reads_body_message() {
    let body = r#"{"error":{"message":"quota exhausted"}}"#;
    let bytes = format!(
        "HTTP/1.1 429 Too Many Requests\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes();
    let (state, texts) = decode(&split_by(&bytes, &[7]));

    assert!(matches!(
        state,
        Err(ChatError::Status { status: 429, ref message }) if message.starts_with("quota exhausted [request_id:")
    ));
    assert!(texts.is_empty());
}

#[test]
fn test_leading_bytes_before_status_line() {
    let mut bytes = b"\r\n0\r\n\r\n".to_vec();
    bytes.extend(wire(&["fresh"], true, true));
    let (state, texts) = decode(&split_by(&bytes, &[4]));

    assert_eq!(state.unwrap(), DecoderState::Done);
    assert_eq!(texts, vec!["fresh"]);
}

proptest! {
    #[test]
    fn prop_output_invariant_under_rechunking(
        texts in prop::collection::vec("[a-zA-Z0-9 .,!?]{0,16}", 1..8),
        sizes in prop::collection::vec(1usize..48, 1..12),
        chunked in any::<bool>(),
        with_done in any::<bool>(),
        terminator_after in prop::option::of(0usize..8),
    ) {
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
        let bytes = match (chunked, terminator_after) {
            (true, Some(after)) => keep_alive_wire(&texts, with_done, after),
            _ => wire(&texts, chunked, with_done),
        };

        let (whole_state, whole) = decode(&[bytes.clone()]);
        let (split_state, split) = decode(&split_by(&bytes, &sizes));

        prop_assert_eq!(&whole, &texts);
        prop_assert_eq!(&split, &whole);
        prop_assert_eq!(whole_state.unwrap(), split_state.unwrap());
    }
}
