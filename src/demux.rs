//! Response demultiplexing for a byte stream of unknown chunking.
//!
//! The transport delivers bytes in arbitrary chunk sizes, not aligned to
//! protocol frames. The demultiplexer accumulates inbound bytes and pairs
//! them, strictly in arrival order, with an ordered queue of pending
//! "I need N bytes next" expectations. Each expectation carries a
//! caller-supplied tag instead of a callback, so the demultiplexer stays
//! reusable and testable independent of the session that drives it.

use std::collections::VecDeque;

/// A pending expectation: `len` bytes owed to whoever registered `tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Expectation<T> {
    tag: T,
    len: usize,
}

/// Pairs an inbound byte queue with a FIFO queue of pending expectations.
///
/// Only the head expectation is ever satisfied, which preserves
/// request/response pairing under pipelining: the device answers strictly in
/// request order on one connection, and there is no message-ID correlation.
///
/// No timeout is modeled here. An expectation whose bytes never arrive
/// blocks its slot indefinitely; timeout policy (none by default) belongs to
/// the caller.
#[derive(Debug)]
pub struct ResponseDemux<T> {
    inbound: VecDeque<u8>,
    pending: VecDeque<Expectation<T>>,
}

impl<T> ResponseDemux<T> {
    /// Creates an empty demultiplexer.
    pub fn new() -> Self {
        Self {
            inbound: VecDeque::new(),
            pending: VecDeque::new(),
        }
    }

    /// Registers an expectation for `len` bytes, behind all earlier ones.
    pub fn expect(&mut self, tag: T, len: usize) {
        self.pending.push_back(Expectation { tag, len });
    }

    /// Appends transport bytes and returns every expectation they complete.
    ///
    /// Completions are yielded in registration order, each with exactly its
    /// requested byte count. One large chunk may complete several queued
    /// expectations at once; conversely a frame may take many `feed` calls
    /// to accumulate.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<(T, Vec<u8>)> {
        self.inbound.extend(bytes);

        let mut completed = Vec::new();
        while let Some(head_len) = self.pending.front().map(|head| head.len) {
            if self.inbound.len() < head_len {
                break;
            }
            let frame: Vec<u8> = self.inbound.drain(..head_len).collect();
            if let Some(head) = self.pending.pop_front() {
                completed.push((head.tag, frame));
            }
        }
        completed
    }

    /// Number of expectations still waiting for bytes.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of inbound bytes buffered but not yet claimed.
    pub fn buffered(&self) -> usize {
        self.inbound.len()
    }

    /// Drops all buffered bytes and pending expectations.
    ///
    /// Dropped expectations are simply never yielded.
    pub fn clear(&mut self) {
        self.inbound.clear();
        self.pending.clear();
    }
}

impl<T> Default for ResponseDemux<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_expectation_exact_chunk() {
        let mut demux = ResponseDemux::new();
        demux.expect("a", 4);

        let completed = demux.feed(&[1, 2, 3, 4]);
        assert_eq!(completed, vec![("a", vec![1, 2, 3, 4])]);
        assert_eq!(demux.pending(), 0);
        assert_eq!(demux.buffered(), 0);
    }

    #[test]
    fn test_frame_assembled_across_many_feeds() {
        let mut demux = ResponseDemux::new();
        demux.expect("a", 5);

        assert!(demux.feed(&[1]).is_empty());
        assert!(demux.feed(&[2, 3]).is_empty());
        assert!(demux.feed(&[]).is_empty());
        let completed = demux.feed(&[4, 5]);
        assert_eq!(completed, vec![("a", vec![1, 2, 3, 4, 5])]);
    }

    #[test]
    fn test_one_feed_completes_multiple_expectations() {
        let mut demux = ResponseDemux::new();
        demux.expect("first", 2);
        demux.expect("second", 3);
        demux.expect("third", 1);

        let completed = demux.feed(&[10, 11, 20, 21, 22, 30]);
        assert_eq!(
            completed,
            vec![
                ("first", vec![10, 11]),
                ("second", vec![20, 21, 22]),
                ("third", vec![30]),
            ]
        );
    }

    #[test]
    fn test_surplus_bytes_wait_for_next_expectation() {
        let mut demux = ResponseDemux::new();
        demux.expect("a", 2);

        let completed = demux.feed(&[1, 2, 3, 4]);
        assert_eq!(completed, vec![("a", vec![1, 2])]);
        assert_eq!(demux.buffered(), 2);

        // A late expectation is satisfied from already-buffered bytes.
        demux.expect("b", 2);
        let completed = demux.feed(&[]);
        assert_eq!(completed, vec![("b", vec![3, 4])]);
        assert_eq!(demux.buffered(), 0);
    }

    #[test]
    fn test_head_blocks_later_expectations() {
        let mut demux = ResponseDemux::new();
        demux.expect("big", 10);
        demux.expect("small", 1);

        // Enough bytes for "small", but "big" is the head and must go first.
        assert!(demux.feed(&[1, 2, 3]).is_empty());
        assert_eq!(demux.pending(), 2);
    }

    #[test]
    fn test_order_preserved_regardless_of_chunking() {
        // The same byte sequence, fed in every chunk size from 1 to all at
        // once, must satisfy the same expectations in the same order.
        let bytes: Vec<u8> = (0..24).collect();
        let sizes = [7usize, 7, 10];

        for chunk in 1..=bytes.len() {
            let mut demux = ResponseDemux::new();
            for (index, len) in sizes.iter().enumerate() {
                demux.expect(index, *len);
            }

            let mut completed = Vec::new();
            for piece in bytes.chunks(chunk) {
                completed.extend(demux.feed(piece));
            }

            assert_eq!(completed.len(), sizes.len(), "chunk size {}", chunk);
            let mut offset = 0;
            for (index, len) in sizes.iter().enumerate() {
                let (tag, frame) = &completed[index];
                assert_eq!(*tag, index);
                assert_eq!(frame.as_slice(), &bytes[offset..offset + len]);
                offset += len;
            }
            assert_eq!(demux.pending(), 0);
            assert_eq!(demux.buffered(), 0);
        }
    }

    #[test]
    fn test_clear_drops_bytes_and_expectations() {
        let mut demux = ResponseDemux::new();
        demux.expect("a", 8);
        demux.feed(&[1, 2, 3]);
        assert_eq!(demux.pending(), 1);
        assert_eq!(demux.buffered(), 3);

        demux.clear();
        assert_eq!(demux.pending(), 0);
        assert_eq!(demux.buffered(), 0);

        // A cleared expectation is never yielded, even if its bytes arrive.
        assert!(demux.feed(&[0; 16]).is_empty());
    }

    #[test]
    fn test_zero_length_expectation_completes_immediately() {
        let mut demux = ResponseDemux::new();
        demux.expect("empty", 0);
        let completed = demux.feed(&[]);
        assert_eq!(completed, vec![("empty", vec![])]);
    }
}
