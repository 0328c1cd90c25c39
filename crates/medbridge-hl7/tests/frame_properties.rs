//! Generated framing cases: payloads dense in 0x0B / 0x0D / 0x1C, streams
//! cut at every offset.

use bytes::{Bytes, BytesMut};
use medbridge_hl7::frame::{CARRIAGE_RETURN, END_BLOCK, START_BLOCK};
use medbridge_hl7::{MllpCodec, decode_frame, encode_frame};
use proptest::prelude::*;
use tokio_util::codec::Decoder;

/// Push `chunks` through one codec the way `Framed` does, then signal EOF.
fn feed<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> (Vec<Vec<u8>>, BytesMut) {
    let mut codec = MllpCodec::new();
    let mut buf = BytesMut::new();
    let mut frames = Vec::new();
    for chunk in chunks {
        buf.extend_from_slice(chunk);
        while let Some(frame) = codec.decode(&mut buf).unwrap() {
            frames.push(frame.to_vec());
        }
    }
    while let Some(frame) = codec.decode_eof(&mut buf).unwrap() {
        frames.push(frame.to_vec());
    }
    (frames, buf)
}

fn stream_of(payloads: &[&[u8]]) -> Vec<u8> {
    payloads
        .iter()
        .flat_map(|p| encode_frame(p).to_vec())
        .collect()
}

/// Whether `payload` survives framing: scanning it pairwise never meets
/// `0x1C 0x0D` and never leaves a trailing `0x1C` that would swallow the
/// terminator.
fn frames_cleanly(payload: &[u8]) -> bool {
    let mut i = 0;
    while i < payload.len() {
        if payload[i] != END_BLOCK {
            i += 1;
            continue;
        }
        match payload.get(i + 1) {
            None | Some(&CARRIAGE_RETURN) => return false,
            Some(_) => i += 2,
        }
    }
    true
}

fn token() -> impl Strategy<Value = Vec<u8>> {
    let plain = prop_oneof![
        Just(START_BLOCK),
        Just(CARRIAGE_RETURN),
        Just(b'|'),
        Just(b'A'),
        any::<u8>().prop_filter("0x1C starts a pair", |b| *b != END_BLOCK),
    ];
    let after_end_block = prop_oneof![
        Just(END_BLOCK),
        Just(START_BLOCK),
        Just(b'X'),
        any::<u8>().prop_filter("0x1C 0x0D terminates", |b| *b != CARRIAGE_RETURN),
    ];
    prop_oneof![
        3 => plain.prop_map(|b| vec![b]),
        2 => after_end_block.prop_map(|b| vec![END_BLOCK, b]),
    ]
}

fn payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(token(), 0..40).prop_map(|tokens| tokens.concat())
}

proptest! {
    #[test]
    fn encoded_payload_decodes_to_itself(p in payload()) {
        prop_assert!(frames_cleanly(&p));
        let decoded = decode_frame(&encode_frame(&p)).unwrap();
        prop_assert_eq!(decoded, Bytes::from(p));
    }

    #[test]
    fn every_split_point_yields_the_same_frames(a in payload(), b in payload()) {
        let stream = stream_of(&[a.as_slice(), b.as_slice()]);
        for split in 0..=stream.len() {
            let (frames, rest) = feed([&stream[..split], &stream[split..]]);
            prop_assert_eq!(&frames, &vec![a.clone(), b.clone()], "split at {}", split);
            prop_assert!(rest.is_empty());
        }
    }

    #[test]
    fn byte_at_a_time_yields_the_same_frames(a in payload(), b in payload()) {
        let stream = stream_of(&[a.as_slice(), b.as_slice()]);
        let (frames, rest) = feed(stream.chunks(1));
        prop_assert_eq!(frames, vec![a, b]);
        prop_assert!(rest.is_empty());
    }
}

#[test]
fn short_payloads_over_control_bytes() {
    const ALPHABET: [u8; 4] = [START_BLOCK, CARRIAGE_RETURN, END_BLOCK, b'A'];

    let mut level: Vec<Vec<u8>> = vec![Vec::new()];
    for _ in 0..=6 {
        for p in &level {
            let decoded = decode_frame(&encode_frame(p)).ok();
            assert_eq!(
                decoded.as_deref() == Some(p.as_slice()),
                frames_cleanly(p),
                "payload {p:02X?}"
            );

            if frames_cleanly(p) {
                let stream = stream_of(&[p.as_slice(), b"next".as_slice()]);
                let (frames, rest) = feed(stream.chunks(1));
                assert_eq!(frames, vec![p.clone(), b"next".to_vec()], "payload {p:02X?}");
                assert!(rest.is_empty());
            }
        }
        level = level
            .iter()
            .flat_map(|p| {
                ALPHABET.iter().map(move |b| {
                    let mut next = p.clone();
                    next.push(*b);
                    next
                })
            })
            .collect();
    }
}

#[test]
fn unterminated_stream_is_incomplete_at_every_cut() {
    let stream = stream_of(&[b"A\x1c\x1c\x0dB".as_slice()]);
    for cut in 1..stream.len() {
        let mut codec = MllpCodec::new();
        let mut buf = BytesMut::from(&stream[..cut]);
        assert!(codec.decode(&mut buf).unwrap().is_none(), "cut at {cut}");
        assert!(codec.decode_eof(&mut buf).is_err(), "cut at {cut}");
    }
}
