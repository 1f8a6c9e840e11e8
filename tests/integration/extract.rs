use bundle_patcher::extract::{extract, MarkerOutcome, BUN_HEADER, BUN_TAIL};
use proptest::prelude::*;

// Lowercase letters never form either marker, which both contain '/' and '\n'
fn plain_bytes(max: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(b'a'..=b'z', 0..max)
}

proptest! {
    #[test]
    fn framed_payload_is_recovered(
        prefix in plain_bytes(64),
        payload in plain_bytes(256),
        suffix in plain_bytes(64),
    ) {
        let mut buffer = prefix.clone();
        buffer.extend_from_slice(BUN_HEADER.bytes());
        buffer.extend_from_slice(&payload);
        buffer.extend_from_slice(BUN_TAIL.bytes());
        buffer.extend_from_slice(&suffix);

        let out = extract(&buffer, &BUN_HEADER, &BUN_TAIL);
        prop_assert_eq!(out.header, MarkerOutcome::Found { offset: prefix.len() });
        prop_assert_eq!(out.tail, MarkerOutcome::Found { offset: payload.len() });
        prop_assert_eq!(out.payload, payload);
    }

    #[test]
    fn unframed_buffer_passes_through(buffer in plain_bytes(512)) {
        let out = extract(&buffer, &BUN_HEADER, &BUN_TAIL);
        prop_assert_eq!(out.header, MarkerOutcome::Missing);
        prop_assert_eq!(out.tail, MarkerOutcome::NotSearched);
        prop_assert_eq!(out.payload, buffer);
    }

    #[test]
    fn payload_is_a_slice_of_the_input(buffer in proptest::collection::vec(any::<u8>(), 0..512)) {
        let out = extract(&buffer, &BUN_HEADER, &BUN_TAIL);
        prop_assert!(out.payload.len() <= buffer.len());
        prop_assert!(
            out.payload.is_empty()
                || buffer
                    .windows(out.payload.len())
                    .any(|w| w == out.payload.as_slice())
        );
    }
}

#[test]
fn repeated_tail_marker_cuts_at_the_last_one() {
    let mut buffer = b"\x7fELF\0\0".to_vec();
    buffer.extend_from_slice(b"// @bun\nrun();\n//# debugId=inner\nmore();");
    buffer.extend_from_slice(b"\n//# debugId=1234\0\0\0");
    let out = extract(&buffer, &BUN_HEADER, &BUN_TAIL);
    assert!(out.is_framed());
    assert_eq!(out.payload, b"run();\n//# debugId=inner\nmore();".to_vec());
}
