//! Dispatcher Tests
//!
//! Tests for the request/response exchange: retries, NACKs, corrupted and
//! foreign traffic.

#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use common::{ack, fast_config, nack, reply_frame, Reply, ScriptedTransport, HOST, WHEEL};
use nspwheel::framing::{FEND, FESC};
use nspwheel::protocol::{Control, NspCommand, Packet};
use nspwheel::{framing, Dispatcher, WheelError};

// =============================================================================
// Helper Functions
// =============================================================================

fn dispatcher(replies: Vec<Reply>) -> (Dispatcher<ScriptedTransport>, common::Probe) {
    let (transport, probe) = ScriptedTransport::new(replies);
    (Dispatcher::new(&fast_config(), transport), probe)
}

fn timeout() -> Duration {
    fast_config().response_timeout()
}

// =============================================================================
// Successful Exchanges
// =============================================================================

#[test]
fn test_ack_reply_is_returned() {
    let (mut dispatcher, probe) = dispatcher(vec![ack(NspCommand::Ping, b"RW4")]);

    let reply = dispatcher.exchange(NspCommand::Ping, &[], timeout()).unwrap();

    assert_eq!(reply.payload(), b"RW4");
    assert_eq!(probe.write_count(), 1);
    assert_eq!(
        probe.writes()[0],
        vec![0xC0, 0x20, 0x11, 0x80, 0x49, 0x32, 0xC0]
    );
    assert!(dispatcher.pending().is_none());
}

#[test]
fn test_request_with_response() {
    let (mut dispatcher, _probe) = dispatcher(vec![ack(NspCommand::Ping, b"x")]);
    let reply = dispatcher.request(NspCommand::Ping, &[], true).unwrap();
    assert!(reply.is_some());
}

#[test]
fn test_request_without_response_clears_poll() {
    let (mut dispatcher, probe) = dispatcher(vec![]);

    let reply = dispatcher
        .request(NspCommand::WriteFile, &[0x00, 0x00, 0, 0, 0, 0], false)
        .unwrap();

    assert!(reply.is_none());
    let sent = probe.sent_packets();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].control().poll);
    assert_eq!(sent[0].command(), Some(NspCommand::WriteFile));
}

#[test]
fn test_reply_after_one_silent_attempt() {
    let (mut dispatcher, probe) = dispatcher(vec![Reply::Silence, ack(NspCommand::Ping, b"")]);

    dispatcher.exchange(NspCommand::Ping, &[], timeout()).unwrap();

    assert_eq!(probe.write_count(), 2);
    let writes = probe.writes();
    assert_eq!(writes[0], writes[1]);
    let stats = dispatcher.stats();
    assert_eq!(stats.transmissions, 2);
    assert_eq!(stats.retries, 1);
}

// =============================================================================
// Failure Paths
// =============================================================================

#[test]
fn test_silent_device_times_out_after_all_retries() {
    let (mut dispatcher, probe) = dispatcher(vec![]);

    let err = dispatcher
        .exchange(NspCommand::Ping, &[], timeout())
        .unwrap_err();

    match err {
        WheelError::Timeout { command, attempts } => {
            assert_eq!(command, NspCommand::Ping.id());
            assert_eq!(attempts, 3);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(probe.write_count(), 3);
    assert!(dispatcher.pending().is_none());
}

#[test]
fn test_zero_retries_means_single_attempt() {
    let config = nspwheel::Config::builder()
        .response_timeout_ms(10)
        .max_retries(0)
        .build();
    let (transport, probe) = ScriptedTransport::silent();
    let mut dispatcher = Dispatcher::new(&config, transport);

    let err = dispatcher
        .exchange(NspCommand::Ping, &[], config.response_timeout())
        .unwrap_err();

    assert!(matches!(err, WheelError::Timeout { attempts: 1, .. }));
    assert_eq!(probe.write_count(), 1);
}

#[test]
fn test_nack_is_not_retried() {
    let (mut dispatcher, probe) = dispatcher(vec![nack(NspCommand::ReadFile)]);

    let err = dispatcher
        .exchange(NspCommand::ReadFile, &[0x03], timeout())
        .unwrap_err();

    assert!(matches!(
        err,
        WheelError::RejectedCommand { command } if command == NspCommand::ReadFile.id()
    ));
    assert_eq!(probe.write_count(), 1);
    assert_eq!(dispatcher.stats().nacks, 1);
}

#[test]
fn test_oversize_payload_is_rejected_before_io() {
    let (mut dispatcher, probe) = dispatcher(vec![]);
    let payload = vec![0u8; 1025];

    let err = dispatcher
        .exchange(NspCommand::Poke, &payload, timeout())
        .unwrap_err();

    assert!(matches!(err, WheelError::MalformedPacket(_)));
    assert_eq!(probe.write_count(), 0);
}

// =============================================================================
// Line Noise
// =============================================================================

#[test]
fn test_corrupted_reply_then_valid_reply() {
    let mut corrupted = reply_frame(NspCommand::Ping, true, b"ok");
    corrupted[4] ^= 0x01;
    let mut bytes = corrupted;
    bytes.extend(reply_frame(NspCommand::Ping, true, b"ok"));

    let (mut dispatcher, probe) = dispatcher(vec![Reply::Bytes(bytes)]);
    let reply = dispatcher.exchange(NspCommand::Ping, &[], timeout()).unwrap();

    assert_eq!(reply.payload(), b"ok");
    assert_eq!(probe.write_count(), 1);
    assert_eq!(dispatcher.stats().discarded_frames, 1);
}

#[test]
fn test_invalid_escape_then_valid_reply() {
    let mut bytes = vec![FEND, 0x11, FESC, 0x42, 0x01];
    bytes.extend(reply_frame(NspCommand::Ping, true, b""));

    let (mut dispatcher, _probe) = dispatcher(vec![Reply::Bytes(bytes)]);
    dispatcher.exchange(NspCommand::Ping, &[], timeout()).unwrap();

    assert_eq!(dispatcher.stats().discarded_frames, 1);
}

#[test]
fn test_foreign_and_mismatched_packets_are_ignored() {
    let foreign_src = Packet::new(HOST, 0x21, Control::reply(NspCommand::Ping.id(), true), vec![]);
    let foreign_dest = Packet::new(0x12, WHEEL, Control::reply(NspCommand::Ping.id(), true), vec![]);
    let other_command = Packet::new(HOST, WHEEL, Control::reply(NspCommand::Init.id(), true), vec![]);

    let mut bytes = Vec::new();
    for packet in [&foreign_src, &foreign_dest, &other_command] {
        bytes.extend(framing::encode(&packet.encode()));
    }
    bytes.extend(reply_frame(NspCommand::Ping, true, b"me"));

    let (mut dispatcher, probe) = dispatcher(vec![Reply::Bytes(bytes)]);
    let reply = dispatcher.exchange(NspCommand::Ping, &[], timeout()).unwrap();

    assert_eq!(reply.payload(), b"me");
    assert_eq!(probe.write_count(), 1);
    assert_eq!(dispatcher.stats().ignored_packets, 3);
}

#[test]
fn test_only_foreign_traffic_times_out() {
    let foreign = Packet::new(HOST, 0x21, Control::reply(NspCommand::Ping.id(), true), vec![]);
    let frame = framing::encode(&foreign.encode());
    let replies = vec![
        Reply::Bytes(frame.clone()),
        Reply::Bytes(frame.clone()),
        Reply::Bytes(frame),
    ];

    let (mut dispatcher, probe) = dispatcher(replies);
    let err = dispatcher
        .exchange(NspCommand::Ping, &[], timeout())
        .unwrap_err();

    assert!(matches!(err, WheelError::Timeout { attempts: 3, .. }));
    assert_eq!(probe.write_count(), 3);
}

#[test]
fn test_unterminated_noise_is_bounded() {
    // One byte more than the largest valid packet, never terminated
    let mut bytes = vec![0x55; 1024 + 5 + 1];
    bytes.extend(reply_frame(NspCommand::Ping, true, b"ok"));

    let (mut dispatcher, probe) = dispatcher(vec![Reply::Bytes(bytes)]);
    let reply = dispatcher.exchange(NspCommand::Ping, &[], timeout()).unwrap();

    assert_eq!(reply.payload(), b"ok");
    assert_eq!(probe.write_count(), 1);
    assert_eq!(dispatcher.stats().discarded_frames, 1);
}

#[test]
fn test_next_exchange_after_timeout() {
    let (mut dispatcher, probe) = dispatcher(vec![
        Reply::Silence,
        Reply::Silence,
        Reply::Silence,
        ack(NspCommand::Ping, b"back"),
    ]);

    assert!(dispatcher.exchange(NspCommand::Ping, &[], timeout()).is_err());
    assert!(dispatcher.pending().is_none());

    let reply = dispatcher.exchange(NspCommand::Ping, &[], timeout()).unwrap();
    assert_eq!(reply.payload(), b"back");
    assert_eq!(probe.write_count(), 4);
}

#[test]
fn test_exchanges_are_sequential() {
    let (mut dispatcher, probe) = dispatcher(vec![
        ack(NspCommand::Ping, b"a"),
        ack(NspCommand::ReadFile, &[0x03, 0, 0, 0xE0, 0x41]),
    ]);

    dispatcher.exchange(NspCommand::Ping, &[], timeout()).unwrap();
    let reply = dispatcher
        .exchange(NspCommand::ReadFile, &[0x03], timeout())
        .unwrap();

    assert_eq!(reply.payload(), &[0x03, 0, 0, 0xE0, 0x41]);
    assert_eq!(probe.write_count(), 2);
    assert_eq!(dispatcher.stats().transmissions, 2);
}
