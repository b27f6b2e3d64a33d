//! Session Tests
//!
//! Drives a session through notification sequences against a recording
//! transport.

use wsdsp::config::{Config, UnknownCommandPolicy};
use wsdsp::protocol::{decode_response, encode_message, Command, CommandKind, Message};
use wsdsp::session::{FrameFlags, Session, Transport};
use wsdsp::DspError;

/// Transport that records everything the session asks of it
#[derive(Default)]
struct MockTransport {
    writes: Vec<(Vec<u8>, FrameFlags)>,
    /// Every pause (`true`) / resume (`false`) request, in order
    pause_calls: Vec<bool>,
    writable_requested: bool,
    /// Accept this many bytes fewer than offered
    short_by: usize,
}

impl Transport for MockTransport {
    fn write(&mut self, payload: &[u8], flags: FrameFlags) -> wsdsp::Result<usize> {
        self.writes.push((payload.to_vec(), flags));
        Ok(payload.len().saturating_sub(self.short_by))
    }

    fn set_read_paused(&mut self, paused: bool) {
        self.pause_calls.push(paused);
    }

    fn request_writable(&mut self) {
        self.writable_requested = true;
    }
}

impl MockTransport {
    fn pauses(&self) -> usize {
        self.pause_calls.iter().filter(|&&p| p).count()
    }

    fn resumes(&self) -> usize {
        self.pause_calls.iter().filter(|&&p| !p).count()
    }
}

fn config(ring_depth: usize) -> Config {
    Config::builder().ring_depth(ring_depth).build()
}

fn echo_request(id: u32, data: &[u8]) -> Vec<u8> {
    encode_message(&Message::request(id, vec![Command::echo()], data.to_vec())).unwrap()
}

fn deliver(session: &mut Session, transport: &mut MockTransport, bytes: &[u8]) {
    session.on_fragment(transport, bytes, FrameFlags::complete_binary());
}

/// Keep delivering writable notifications while the session asks for them
fn drain(session: &mut Session, transport: &mut MockTransport) {
    while std::mem::take(&mut transport.writable_requested) {
        session.on_writable(transport).unwrap();
    }
}

// =============================================================================
// Request Handling Tests
// =============================================================================

#[test]
fn test_request_produces_response() {
    let mut session = Session::new(&config(16));
    let mut transport = MockTransport::default();

    deliver(&mut session, &mut transport, &echo_request(42, b"abcd"));
    assert!(transport.writable_requested);
    assert_eq!(session.queued_responses(), 1);

    drain(&mut session, &mut transport);

    assert_eq!(transport.writes.len(), 1);
    let (payload, flags) = &transport.writes[0];
    assert_eq!(*flags, FrameFlags::complete_binary());
    let response = decode_response(payload).unwrap();
    assert_eq!(response.id, 42);
    assert_eq!(response.data, b"abcd");

    assert_eq!(session.queued_responses(), 0);
    assert_eq!(session.stats().messages_processed, 1);
    assert_eq!(session.stats().responses_written, 1);
}

#[test]
fn test_fragmented_request() {
    let mut session = Session::new(&config(16));
    let mut transport = MockTransport::default();
    let request = echo_request(7, b"fragmented payload");

    let (a, rest) = request.split_at(3);
    let (b, c) = rest.split_at(10);
    session.on_fragment(&mut transport, a, FrameFlags::new(true, true, false));
    session.on_fragment(&mut transport, b, FrameFlags::new(true, false, false));
    assert_eq!(session.pending_fragments(), 2);
    assert!(!transport.writable_requested);

    session.on_fragment(&mut transport, c, FrameFlags::new(true, false, true));
    assert_eq!(session.pending_fragments(), 0);

    drain(&mut session, &mut transport);
    let response = decode_response(&transport.writes[0].0).unwrap();
    assert_eq!(response.id, 7);
    assert_eq!(response.data, b"fragmented payload");
}

#[test]
fn test_responses_keep_request_order() {
    let mut session = Session::new(&config(16));
    let mut transport = MockTransport::default();

    for id in 1..=5 {
        deliver(&mut session, &mut transport, &echo_request(id, &[id as u8]));
    }
    drain(&mut session, &mut transport);

    let ids: Vec<u32> = transport
        .writes
        .iter()
        .map(|(payload, _)| decode_response(payload).unwrap().id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_malformed_message_dropped() {
    let mut session = Session::new(&config(16));
    let mut transport = MockTransport::default();

    deliver(&mut session, &mut transport, &[1, 2, 3]);

    assert!(!transport.writable_requested);
    assert_eq!(session.queued_responses(), 0);
    assert_eq!(session.stats().malformed_messages, 1);

    // The session keeps working afterwards
    deliver(&mut session, &mut transport, &echo_request(1, b"ok"));
    assert_eq!(session.queued_responses(), 1);
}

#[test]
fn test_rejected_request_gets_no_response() {
    let config = Config::builder()
        .unknown_command_policy(UnknownCommandPolicy::Reject)
        .build();
    let mut session = Session::new(&config);
    let mut transport = MockTransport::default();

    let unknown = Command::new(CommandKind::from_tag(500), vec![]);
    let request = encode_message(&Message::request(3, vec![unknown], vec![])).unwrap();
    deliver(&mut session, &mut transport, &request);

    assert_eq!(session.queued_responses(), 0);
    assert_eq!(session.stats().rejected_messages, 1);
}

#[test]
fn test_skipped_and_failed_commands_counted() {
    let mut session = Session::new(&config(16));
    let mut transport = MockTransport::default();

    let commands = vec![
        Command::new(CommandKind::from_tag(500), vec![]),
        Command::new(CommandKind::Fft, vec![]),
        Command::echo(),
    ];
    let request = encode_message(&Message::request(3, commands, b"xy".to_vec())).unwrap();
    deliver(&mut session, &mut transport, &request);

    assert_eq!(session.stats().skipped_commands, 1);
    assert_eq!(session.stats().failed_commands, 1);
    assert_eq!(session.queued_responses(), 1);
}

// =============================================================================
// Write Path Tests
// =============================================================================

#[test]
fn test_consume_is_deferred_until_next_writable() {
    let mut session = Session::new(&config(16));
    let mut transport = MockTransport::default();
    deliver(&mut session, &mut transport, &echo_request(1, b"a"));

    transport.writable_requested = false;
    session.on_writable(&mut transport).unwrap();

    // Written but still at the head until the transport confirms
    assert_eq!(transport.writes.len(), 1);
    assert!(session.write_consume_pending());
    assert_eq!(session.queued_responses(), 1);
    assert!(transport.writable_requested);

    transport.writable_requested = false;
    session.on_writable(&mut transport).unwrap();

    assert!(!session.write_consume_pending());
    assert_eq!(session.queued_responses(), 0);
    assert_eq!(transport.writes.len(), 1);
    assert!(!transport.writable_requested);
}

#[test]
fn test_writable_with_empty_queue_is_noop() {
    let mut session = Session::new(&config(16));
    let mut transport = MockTransport::default();

    session.on_writable(&mut transport).unwrap();

    assert!(transport.writes.is_empty());
    assert!(!transport.writable_requested);
}

#[test]
fn test_short_write_is_fatal() {
    let mut session = Session::new(&config(16));
    let mut transport = MockTransport {
        short_by: 1,
        ..Default::default()
    };
    let request = echo_request(1, b"abcd");
    deliver(&mut session, &mut transport, &request);

    match session.on_writable(&mut transport) {
        Err(DspError::ShortWrite { written, expected }) => {
            assert_eq!(expected, 13);
            assert_eq!(written, 12);
        }
        other => panic!("Expected ShortWrite, got {:?}", other),
    }
}

#[test]
fn test_response_ring_overflow_drops_response() {
    let mut session = Session::new(&config(10));
    let mut transport = MockTransport::default();

    for id in 0..11 {
        deliver(&mut session, &mut transport, &echo_request(id, b"x"));
    }

    assert_eq!(session.queued_responses(), 10);
    assert_eq!(session.stats().dropped_responses, 1);
}

// =============================================================================
// Flow Control Tests
// =============================================================================

#[test]
fn test_pause_and_resume_once_each() {
    // ring of 10: pause below 3 free, resume above 5 free
    let mut session = Session::new(&config(10));
    let mut transport = MockTransport::default();

    for id in 0..7 {
        deliver(&mut session, &mut transport, &echo_request(id, b"x"));
    }
    assert_eq!(transport.pauses(), 0);

    deliver(&mut session, &mut transport, &echo_request(7, b"x"));
    assert_eq!(transport.pause_calls, vec![true]);
    assert!(session.is_flow_controlled());

    // Still paused; no second pause request
    deliver(&mut session, &mut transport, &echo_request(8, b"x"));
    assert_eq!(transport.pauses(), 1);

    drain(&mut session, &mut transport);

    assert_eq!(transport.writes.len(), 9);
    assert_eq!(transport.pause_calls, vec![true, false]);
    assert_eq!(transport.resumes(), 1);
    assert!(!session.is_flow_controlled());
}

#[test]
fn test_resume_waits_for_margin() {
    let mut session = Session::new(&config(10));
    let mut transport = MockTransport::default();

    for id in 0..9 {
        deliver(&mut session, &mut transport, &echo_request(id, b"x"));
    }
    assert!(session.is_flow_controlled());

    // Four confirmed writes leave 5 free slots, not yet above the margin
    for _ in 0..5 {
        session.on_writable(&mut transport).unwrap();
    }
    assert_eq!(session.queued_responses(), 5);
    assert!(session.is_flow_controlled());

    session.on_writable(&mut transport).unwrap();
    assert!(!session.is_flow_controlled());
    assert_eq!(transport.resumes(), 1);
}

/// Fill the fragment ring of a depth-10 session until reads pause
fn buffer_fragments_until_paused(session: &mut Session, transport: &mut MockTransport) {
    // 8 buffered fragments leave 2 free slots, below the pause point of 3
    for i in 0..8 {
        session.on_fragment(transport, &[i, i], FrameFlags::new(true, i == 0, false));
    }
    assert_eq!(transport.pause_calls, vec![true]);
    assert!(session.is_flow_controlled());
}

#[test]
fn test_writes_resume_reads_paused_by_fragments() {
    let mut session = Session::new(&config(10));
    let mut transport = MockTransport::default();

    deliver(&mut session, &mut transport, &echo_request(1, b"x"));
    buffer_fragments_until_paused(&mut session, &mut transport);

    // A paused transport delivers no more fragments, only writable events
    drain(&mut session, &mut transport);

    assert_eq!(transport.writes.len(), 1);
    assert_eq!(session.queued_responses(), 0);
    assert_eq!(transport.pause_calls, vec![true, false]);
    assert!(!session.is_flow_controlled());
    assert_eq!(session.pending_fragments(), 8);
}

#[test]
fn test_fragment_pause_resumes_with_nothing_to_write() {
    let mut session = Session::new(&config(10));
    let mut transport = MockTransport::default();

    buffer_fragments_until_paused(&mut session, &mut transport);
    assert!(transport.writable_requested);

    drain(&mut session, &mut transport);

    assert!(transport.writes.is_empty());
    assert_eq!(transport.pause_calls, vec![true, false]);
    assert!(!session.is_flow_controlled());
}

#[test]
fn test_draining_writes_always_lifts_pause() {
    let mut session = Session::new(&config(10));
    let mut transport = MockTransport::default();

    for id in 0..9 {
        deliver(&mut session, &mut transport, &echo_request(id, b"x"));
    }
    for i in 0..3 {
        session.on_fragment(&mut transport, &[i], FrameFlags::new(true, i == 0, false));
    }
    assert!(session.is_flow_controlled());

    drain(&mut session, &mut transport);

    assert_eq!(transport.writes.len(), 9);
    assert!(!session.is_flow_controlled());
    assert_eq!(transport.pauses(), transport.resumes());
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_one_shot_completes_after_final_write() {
    let config = Config::builder().exit_after_response(true).build();
    let mut session = Session::new(&config);
    let mut transport = MockTransport::default();

    deliver(&mut session, &mut transport, &echo_request(1, b"once"));
    assert!(!session.is_completed());

    session.on_writable(&mut transport).unwrap();
    assert!(session.is_completed());
}

#[test]
fn test_session_without_one_shot_never_completes() {
    let mut session = Session::new(&config(16));
    let mut transport = MockTransport::default();

    deliver(&mut session, &mut transport, &echo_request(1, b"a"));
    drain(&mut session, &mut transport);

    assert!(!session.is_completed());
}

#[test]
fn test_close_reports_discarded_state() {
    let mut session = Session::new(&config(16));
    let mut transport = MockTransport::default();

    deliver(&mut session, &mut transport, &echo_request(1, b"a"));
    deliver(&mut session, &mut transport, &echo_request(2, b"b"));
    session.on_fragment(&mut transport, &[1, 2], FrameFlags::new(true, true, false));

    let summary = session.on_close();

    assert_eq!(summary.unwritten_responses, 2);
    assert_eq!(summary.discarded_fragments, 1);
    assert_eq!(summary.stats.messages_processed, 2);
    assert!(!summary.completed);
}
