//! Codec Tests
//!
//! Tests for request, response and command encoding/decoding.

use proptest::prelude::*;
use wsdsp::protocol::{
    Command, CommandKind, Message, SampleParams,
    encode_command, decode_command,
    encode_message, decode_message,
    encode_response, decode_response,
    message_encoded_len, response_encoded_len, PROTOCOL_VERSION,
};
use wsdsp::DspError;

fn sample_request() -> Message {
    Message::request(
        42,
        vec![
            Command::echo(),
            Command::fir_filter(SampleParams::new(48_000, 2)),
            Command::fft(SampleParams::new(48_000, 2)),
        ],
        vec![1, 2, 3, 4, 5, 6, 7, 8],
    )
}

fn assert_protocol_error(result: wsdsp::Result<Message>, needle: &str) {
    match result {
        Err(DspError::Protocol(msg)) => {
            assert!(msg.contains(needle), "unexpected message: {}", msg)
        }
        other => panic!("Expected protocol error containing {:?}, got {:?}", needle, other),
    }
}

// =============================================================================
// Wire Layout Tests
// =============================================================================

#[test]
fn test_request_wire_layout() {
    let message = Message::request(42, vec![Command::echo()], b"abcd".to_vec());
    let encoded = encode_message(&message).unwrap();

    let parts: [&[u8]; 7] = [
        &[PROTOCOL_VERSION],
        &42u32.to_le_bytes(),
        &1u32.to_le_bytes(),        // commands_count
        &CommandKind::ECHO.to_le_bytes(),
        &0u32.to_le_bytes(),        // params_len
        &4u32.to_le_bytes(),        // data_len
        b"abcd",
    ];
    let expected = parts.concat();

    assert_eq!(encoded, expected);
}

#[test]
fn test_response_wire_layout() {
    let message = Message::response(7, vec![0xAA, 0xBB]);
    let encoded = encode_response(&message).unwrap();

    assert_eq!(encoded, vec![PROTOCOL_VERSION, 7, 0, 0, 0, 2, 0, 0, 0, 0xAA, 0xBB]);
}

#[test]
fn test_response_omits_commands() {
    let request = sample_request();
    let encoded = encode_response(&request).unwrap();
    let decoded = decode_response(&encoded).unwrap();

    assert_eq!(decoded.id, 42);
    assert!(decoded.commands.is_empty());
    assert_eq!(decoded.data, request.data);
}

#[test]
fn test_sample_params_wire_layout() {
    let command = Command::fft(SampleParams::new(48_000, 2));
    let encoded = encode_command(&command).unwrap();

    assert_eq!(&encoded[0..4], &CommandKind::FFT.to_le_bytes());
    assert_eq!(&encoded[4..8], &8u32.to_le_bytes());
    assert_eq!(&encoded[8..12], &48_000u32.to_le_bytes());
    assert_eq!(&encoded[12..16], &2u32.to_le_bytes());
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_encode_decode_request() {
    let message = sample_request();
    let encoded = encode_message(&message).unwrap();
    let decoded = decode_message(&encoded).unwrap();

    assert_eq!(decoded, message);
}

#[test]
fn test_encode_decode_empty_request() {
    let message = Message::request(0, vec![], vec![]);
    let encoded = encode_message(&message).unwrap();
    assert_eq!(encoded.len(), 13);

    let decoded = decode_message(&encoded).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn test_unknown_command_survives_round_trip() {
    let command = Command::new(CommandKind::from_tag(0xBEEF), vec![9, 9, 9]);
    let message = Message::request(1, vec![command.clone()], vec![]);

    let decoded = decode_message(&encode_message(&message).unwrap()).unwrap();
    assert_eq!(decoded.commands, vec![command]);
    assert_eq!(decoded.commands[0].kind, CommandKind::Unknown(0xBEEF));
}

#[test]
fn test_decode_command_reports_consumed() {
    let command = Command::fir_filter(SampleParams::new(8_000, 1));
    let mut encoded = encode_command(&command).unwrap();
    encoded.extend_from_slice(b"next");

    let (decoded, consumed) = decode_command(&encoded).unwrap();
    assert_eq!(decoded, command);
    assert_eq!(consumed, 16);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_decode_empty_buffer() {
    assert_protocol_error(decode_message(&[]), "Incomplete");
    assert_protocol_error(decode_response(&[]), "Incomplete");
}

#[test]
fn test_decode_bad_version() {
    let mut encoded = encode_message(&sample_request()).unwrap();
    encoded[0] = 9;

    match decode_message(&encoded) {
        Err(DspError::UnsupportedVersion(9)) => {}
        other => panic!("Expected UnsupportedVersion, got {:?}", other),
    }
}

#[test]
fn test_decode_data_len_exceeds_buffer() {
    let message = Message::request(3, vec![], b"abcd".to_vec());
    let mut encoded = encode_message(&message).unwrap();
    // data_len sits right before the data
    let at = encoded.len() - 8;
    encoded[at..at + 4].copy_from_slice(&1000u32.to_le_bytes());

    assert_protocol_error(decode_message(&encoded), "Incomplete message data");
}

#[test]
fn test_decode_params_len_exceeds_buffer() {
    let message = Message::request(3, vec![Command::echo()], vec![]);
    let mut encoded = encode_message(&message).unwrap();
    // params_len of the first command: version + id + count + type
    encoded[13..17].copy_from_slice(&u32::MAX.to_le_bytes());

    assert_protocol_error(decode_message(&encoded), "Incomplete command params");
}

#[test]
fn test_decode_impossible_command_count() {
    let mut encoded = encode_message(&Message::request(3, vec![], vec![])).unwrap();
    encoded[5..9].copy_from_slice(&u32::MAX.to_le_bytes());

    assert_protocol_error(decode_message(&encoded), "Command count");
}

#[test]
fn test_decode_rejects_trailing_bytes() {
    let mut encoded = encode_message(&sample_request()).unwrap();
    encoded.push(0);
    assert_protocol_error(decode_message(&encoded), "1 trailing bytes");

    let mut encoded = encode_response(&Message::response(1, vec![1])).unwrap();
    encoded.extend_from_slice(&[0, 0]);
    assert_protocol_error(decode_response(&encoded), "2 trailing bytes");
}

#[test]
fn test_decode_truncated_everywhere() {
    let encoded = encode_message(&sample_request()).unwrap();
    for cut in 0..encoded.len() {
        assert!(
            decode_message(&encoded[..cut]).is_err(),
            "prefix of {} bytes decoded",
            cut
        );
    }
}

// =============================================================================
// Property Tests
// =============================================================================

fn arb_command() -> impl Strategy<Value = Command> {
    (any::<u32>(), prop::collection::vec(any::<u8>(), 0..32))
        .prop_map(|(tag, params)| Command::new(CommandKind::from_tag(tag), params))
}

fn arb_request() -> impl Strategy<Value = Message> {
    (
        any::<u32>(),
        prop::collection::vec(arb_command(), 0..6),
        prop::collection::vec(any::<u8>(), 0..256),
    )
        .prop_map(|(id, commands, data)| Message::request(id, commands, data))
}

proptest! {
    #[test]
    fn prop_request_round_trip(message in arb_request()) {
        let encoded = encode_message(&message).unwrap();
        prop_assert_eq!(encoded.len(), message_encoded_len(&message));
        prop_assert_eq!(decode_message(&encoded).unwrap(), message);
    }

    #[test]
    fn prop_response_round_trip(
        id in any::<u32>(),
        data in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let message = Message::response(id, data);
        let encoded = encode_response(&message).unwrap();
        prop_assert_eq!(encoded.len(), response_encoded_len(&message));
        prop_assert_eq!(decode_response(&encoded).unwrap(), message);
    }

    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let _ = decode_message(&bytes);
        let _ = decode_response(&bytes);
    }
}
