//! FPM383 checksum algorithm
//!
//! Both checksums in the protocol are additive two's-complement sums over
//! bytes: the checksum byte is chosen so that the bytes plus the checksum
//! add up to zero modulo 256.
//!
//! - The frame checksum covers the marker and the big-endian length field.
//! - The payload checksum covers the envelope up to (not including) its
//!   trailing checksum byte.

use tracing::trace;

use crate::constants::MARKER;

/// Two's-complement of the byte sum, truncated to 8 bits
fn negated_sum<'a>(bytes: impl IntoIterator<Item = &'a u8>) -> u8 {
    let sum = bytes
        .into_iter()
        .fold(0u8, |acc, &byte| acc.wrapping_add(byte));
    sum.wrapping_neg()
}

/// Calculate the frame header checksum for an envelope of `length` bytes
///
/// # Algorithm
///
/// ```text
/// sum = marker[0] + .. + marker[7] + (length >> 8) + (length & 0xFF)
/// checksum = (-sum) mod 256
/// ```
///
/// # Examples
///
/// ```
/// use fpm383_core::checksum;
///
/// let checksum = checksum::frame(7);
/// println!("Checksum: 0x{:02X}", checksum);
/// ```
pub fn frame(length: u16) -> u8 {
    let checksum = negated_sum(MARKER.iter().chain(length.to_be_bytes().iter()));

    trace!(length, checksum = format!("0x{:02X}", checksum), "Calculated frame checksum");

    checksum
}

/// Calculate the envelope checksum over `bytes`
///
/// `bytes` is the envelope without its trailing checksum byte.
pub fn payload(bytes: &[u8]) -> u8 {
    let checksum = negated_sum(bytes);

    trace!(
        len = bytes.len(),
        checksum = format!("0x{:02X}", checksum),
        "Calculated payload checksum"
    );

    checksum
}

/// Verify a frame header checksum
pub fn verify_frame(length: u16, expected: u8) -> bool {
    frame(length) == expected
}

/// Verify an envelope checksum
pub fn verify_payload(bytes: &[u8], expected: u8) -> bool {
    payload(bytes) == expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn byte_sum(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
    }

    #[test]
    fn test_frame_checksum_known_value() {
        // Marker bytes add up to 0x0473
        assert_eq!(frame(0), 0x8D);
        assert_eq!(frame(7), 0x86);
        assert_eq!(frame(11), 0x82);
        assert_eq!(frame(0x0107), 0x85);
    }

    #[test]
    fn test_payload_checksum_empty() {
        assert_eq!(payload(&[]), 0);
    }

    #[test]
    fn test_payload_checksum_heartbeat() {
        // password 0, command 0x03/0x03
        let envelope = [0x00, 0x00, 0x00, 0x00, 0x03, 0x03];
        assert_eq!(payload(&envelope), 0xFA);
    }

    #[test]
    fn test_payload_checksum_wraps() {
        let bytes = vec![0xFF; 1000];
        let checksum = payload(&bytes);
        assert_eq!(byte_sum(&bytes).wrapping_add(checksum), 0);
    }

    #[test]
    fn test_checksum_verify() {
        let bytes = [0xAB, 0xCD];
        let checksum = payload(&bytes);

        assert!(verify_payload(&bytes, checksum));
        assert!(!verify_payload(&bytes, checksum.wrapping_add(1)));
        assert!(verify_frame(11, frame(11)));
        assert!(!verify_frame(11, frame(12)));
    }

    #[test]
    fn test_frame_checksum_sums_length_bytes() {
        assert_eq!(frame(0x0100), frame(0x0001));
        assert_ne!(frame(0x0100), frame(0x0002));
    }

    proptest! {
        #[test]
        fn prop_payload_checksum_sums_to_zero(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let checksum = payload(&bytes);
            prop_assert_eq!(byte_sum(&bytes).wrapping_add(checksum), 0);
        }

        #[test]
        fn prop_frame_checksum_sums_to_zero(length in any::<u16>()) {
            let mut covered = MARKER.to_vec();
            covered.extend_from_slice(&length.to_be_bytes());
            prop_assert_eq!(byte_sum(&covered).wrapping_add(frame(length)), 0);
        }
    }
}
