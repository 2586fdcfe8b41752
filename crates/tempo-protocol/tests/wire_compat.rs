//! Byte-exact wire compatibility. These cases pin the frame layout; any
//! change that breaks them breaks deployed peers.

use tempo_core::RecordId;
use tempo_monitor::{FireContext, MonitorEvent};
use tempo_protocol::{fan_out, Endpoint, Frame, NotifierFn, ProtocolError, ServerFn, UiFn};

fn sample_id() -> RecordId {
    RecordId::from_bytes([
        0x65, 0x00, 0x11, 0x22, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01, 0x02, 0x03,
    ])
}

#[test]
fn mark_missed_layout_is_stable() {
    let id = sample_id();
    let bytes = UiFn::MarkMissed.with_id(id).encode();

    assert_eq!(bytes.len(), 14);
    assert_eq!(bytes[0], 1, "UI endpoint code");
    assert_eq!(bytes[1], 2, "MarkMissed function code");
    assert_eq!(&bytes[2..], id.as_bytes());

    let frame = Frame::decode(&bytes, Endpoint::Ui).unwrap();
    assert_eq!(frame.target, Endpoint::Ui);
    assert_eq!(UiFn::try_from(frame.function).unwrap(), UiFn::MarkMissed);
    assert_eq!(frame.require_id().unwrap(), id);
}

#[test]
fn bare_frames_are_two_bytes() {
    assert_eq!(UiFn::ConnectionClosed.bare().encode(), vec![1, 0]);
    assert_eq!(UiFn::ReloadView.bare().encode(), vec![1, 1]);
    assert_eq!(NotifierFn::ConnectionClosed.bare().encode(), vec![2, 0]);
}

#[test]
fn server_requests_carry_the_id() {
    let id = sample_id();
    for (function, code) in [
        (ServerFn::Cancel, 0u8),
        (ServerFn::Rebind, 1),
        (ServerFn::Ensure, 2),
    ] {
        let bytes = function.with_id(id).encode();
        assert_eq!(bytes[..2], [0, code]);
        assert_eq!(&bytes[2..], id.as_bytes());

        let frame = Frame::decode(&bytes, Endpoint::Server).unwrap();
        assert_eq!(ServerFn::try_from(frame.function).unwrap(), function);
        assert_eq!(frame.require_id().unwrap(), id);
    }
}

#[test]
fn illegal_lengths_are_rejected() {
    for len in [0usize, 1, 3, 13, 15, 64] {
        let bytes = vec![1u8; len];
        assert!(
            matches!(
                Frame::decode(&bytes, Endpoint::Ui),
                Err(ProtocolError::BadLength(l)) if l == len
            ),
            "length {len} must be rejected"
        );
    }
}

#[test]
fn frames_for_another_endpoint_are_rejected() {
    let bytes = NotifierFn::ShowMissed.with_id(sample_id()).encode();
    let err = Frame::decode(&bytes, Endpoint::Ui).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::WrongTarget {
            target: Endpoint::Notifier,
            receiver: Endpoint::Ui
        }
    ));
}

#[test]
fn unknown_codes_are_rejected() {
    assert!(matches!(
        Frame::decode(&[9, 0], Endpoint::Server),
        Err(ProtocolError::UnknownEndpoint(9))
    ));
    let frame = Frame::decode(&[0, 7], Endpoint::Server).unwrap();
    assert!(matches!(
        ServerFn::try_from(frame.function),
        Err(ProtocolError::UnknownFunction { function: 7, .. })
    ));
}

#[test]
fn coalesced_server_burst_splits_into_every_request() {
    let id = sample_id();
    let mut bytes = ServerFn::Cancel.with_id(id).encode();
    bytes.extend(ServerFn::Rebind.with_id(id).encode());
    bytes.extend(ServerFn::Ensure.with_id(id).encode());

    let frames = Frame::decode_all(&bytes, Endpoint::Server).unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0], ServerFn::Cancel.with_id(id));
    assert_eq!(frames[1], ServerFn::Rebind.with_id(id));
    assert_eq!(frames[2], ServerFn::Ensure.with_id(id));
}

#[test]
fn coalesced_mixed_length_ui_read_splits_on_function_codes() {
    let id = sample_id();
    let mut bytes = UiFn::ReloadView.bare().encode();
    bytes.extend(UiFn::MarkMissed.with_id(id).encode());
    assert_eq!(bytes.len(), 16);

    let frames = Frame::decode_all(&bytes, Endpoint::Ui).unwrap();
    assert_eq!(
        frames,
        vec![UiFn::ReloadView.bare(), UiFn::MarkMissed.with_id(id)]
    );
}

#[test]
fn truncated_tail_rejects_the_whole_read() {
    let mut bytes = NotifierFn::ShowMissed.with_id(sample_id()).encode();
    // ShowMissed carries an id, so a bare [2, 1] tail is an amputated frame.
    bytes.extend([2u8, 1]);

    assert!(matches!(
        Frame::decode_all(&bytes, Endpoint::Notifier),
        Err(ProtocolError::BadLength(2))
    ));
    // A lone server header with no id is equally unusable.
    assert!(Frame::decode_all(&[0, 0], Endpoint::Server).is_err());
}

#[test]
fn reminder_fans_out_to_the_notifier_only() {
    let id = sample_id();
    let frames = fan_out(&MonitorEvent {
        id,
        context: FireContext::Notification,
    });
    assert_eq!(frames, vec![NotifierFn::ShowDueSoon.with_id(id)]);
}

#[test]
fn deadline_fans_out_to_notifier_and_ui() {
    let id = sample_id();
    let frames = fan_out(&MonitorEvent {
        id,
        context: FireContext::Ending,
    });
    assert_eq!(
        frames,
        vec![NotifierFn::ShowMissed.with_id(id), UiFn::MarkMissed.with_id(id)]
    );
}

#[test]
fn internal_rearms_never_reach_the_wire() {
    let frames = fan_out(&MonitorEvent {
        id: sample_id(),
        context: FireContext::Cycled,
    });
    assert!(frames.is_empty());
}
