//! Stateful frame extraction from the raw byte stream.
//!
//! The wire format is ASCII with fixed 3-character markers and no checksum,
//! length prefix or escaping:
//!
//! - Telemetry: `TSP` + comma-separated numeric tokens + `TEP`
//! - Status:    `MSP` + free text (no embedded `MEP`) + `MEP`
//!
//! [`FrameDecoder`] owns the accumulated text that has not yet resolved into
//! a frame. It performs no I/O: callers append raw chunks with [`feed`] and
//! receive every frame (or per-frame decode error) the buffer now resolves.
//! Bytes for a frame may arrive split across any number of chunks.
//!
//! Telemetry payload slicing runs three characters long and picks up the end
//! marker itself, a quirk of the original marker-length arithmetic. Its
//! observable effect is kept: the leading comma-separated token is discarded
//! and the eight frame fields are tokens 1 through 8.
//!
//! [`feed`]: FrameDecoder::feed

use tracing::trace;

use crate::error::DecodeError;
use crate::types::{DecodedFrame, StatusMessage, TelemetryFrame};

/// Start marker of a telemetry frame.
pub const TELEMETRY_START: &str = "TSP";
/// End marker of a telemetry frame.
pub const TELEMETRY_END: &str = "TEP";
/// Start marker of a status frame.
pub const STATUS_START: &str = "MSP";
/// End marker of a status frame.
pub const STATUS_END: &str = "MEP";

const MARKER_LEN: usize = 3;

/// Minimum comma-separated tokens in a telemetry payload: the discarded
/// leading token plus the eight frame fields.
const TELEMETRY_TOKENS: usize = 9;

/// Default cap on buffered, unresolved text. Without a cap a stream that
/// never produces an end marker would grow the buffer indefinitely.
pub const DEFAULT_MAX_BUFFER: usize = 64 * 1024;

/// Outcome of scanning the buffer for one frame kind.
enum Scan {
    /// No complete frame of this kind; buffer untouched.
    None,
    /// A span was consumed but produced nothing to report (empty status).
    Consumed,
    Frame(DecodedFrame),
    Error(DecodeError),
}

/// Pure, stateful scanner that extracts complete frames from appended bytes.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: String,
    max_buffer: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self { buffer: String::new(), max_buffer: DEFAULT_MAX_BUFFER }
    }

    /// Override the retained-text cap. Intended for tests and constrained
    /// targets; the default suits a 2 Mbaud link comfortably.
    pub fn with_max_buffer(max_buffer: usize) -> Self {
        Self { buffer: String::new(), max_buffer }
    }

    /// Text currently buffered and not yet resolved into a frame.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Append a raw chunk and extract every frame the buffer now resolves.
    ///
    /// Invalid UTF-8 sequences are replaced rather than dropped, and the
    /// sanitization is reported once per affected chunk. Telemetry frames
    /// resolve before status frames within a pass; passes repeat until the
    /// buffer yields nothing further, so one call drains every complete
    /// frame. If no frame markers are present the chunk is retained in full
    /// for the next call, subject to the buffer cap.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<DecodedFrame, DecodeError>> {
        let mut out = Vec::new();

        let text = String::from_utf8_lossy(chunk);
        if let std::borrow::Cow::Owned(_) = text {
            let replaced = text.matches('\u{FFFD}').count();
            out.push(Err(DecodeError::InvalidEncoding { replaced }));
        }
        self.buffer.push_str(&text);
        trace!(chunk = chunk.len(), buffered = self.buffer.len(), "chunk appended");

        loop {
            let mut progress = false;

            match self.scan_telemetry() {
                Scan::None => {}
                Scan::Consumed => progress = true,
                Scan::Frame(frame) => {
                    out.push(Ok(frame));
                    progress = true;
                }
                Scan::Error(e) => {
                    out.push(Err(e));
                    progress = true;
                }
            }

            match self.scan_status() {
                Scan::None => {}
                Scan::Consumed => progress = true,
                Scan::Frame(frame) => {
                    out.push(Ok(frame));
                    progress = true;
                }
                Scan::Error(e) => {
                    out.push(Err(e));
                    progress = true;
                }
            }

            if !progress {
                break;
            }
        }

        if let Some(dropped) = self.enforce_cap() {
            out.push(Err(DecodeError::BufferOverflow { dropped }));
        }

        out
    }

    /// Discard all buffered text, e.g. after a link restart.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    fn scan_telemetry(&mut self) -> Scan {
        let Some(start) = self.buffer.find(TELEMETRY_START) else { return Scan::None };
        let Some(end) = self.buffer.find(TELEMETRY_END) else { return Scan::None };

        if end < start {
            // Orphan end marker whose start never arrived. Consume it so the
            // stream cannot wedge; the frame it belonged to is unrecoverable.
            let from = if self.buffer[..end].contains(STATUS_START) { end } else { 0 };
            self.buffer.drain(from..end + MARKER_LEN);
            return Scan::Error(DecodeError::OrphanEndMarker { marker: TELEMETRY_END });
        }

        // The historical slice runs to end+3 and so includes the end marker;
        // strip it back off before tokenizing.
        let raw = &self.buffer[start + MARKER_LEN..end + MARKER_LEN];
        let payload = raw.strip_suffix(TELEMETRY_END).unwrap_or(raw);

        let result = parse_telemetry_payload(payload);

        // Bad payloads still consume their span so one malformed frame
        // cannot wedge the stream. The prefix before the start marker is
        // consumed too, unless a status frame begins there.
        let from = if self.buffer[..start].contains(STATUS_START) { start } else { 0 };
        self.buffer.drain(from..end + MARKER_LEN);

        match result {
            Ok(frame) => Scan::Frame(DecodedFrame::Telemetry(frame)),
            Err(e) => Scan::Error(e),
        }
    }

    fn scan_status(&mut self) -> Scan {
        let Some(start) = self.buffer.find(STATUS_START) else { return Scan::None };
        let Some(end) = self.buffer.find(STATUS_END) else { return Scan::None };

        if end < start {
            let from = if self.buffer[..end].contains(TELEMETRY_START) { end } else { 0 };
            self.buffer.drain(from..end + MARKER_LEN);
            return Scan::Error(DecodeError::OrphanEndMarker { marker: STATUS_END });
        }

        // Strictly between the markers; inner whitespace is payload.
        let text = self.buffer[start + MARKER_LEN..end].to_owned();
        let from = if self.buffer[..start].contains(TELEMETRY_START) { start } else { 0 };
        self.buffer.drain(from..end + MARKER_LEN);

        if text.is_empty() {
            trace!("empty status payload discarded");
            return Scan::Consumed;
        }

        Scan::Frame(DecodedFrame::Status(StatusMessage::new(text)))
    }

    /// Truncate from the front when the buffer exceeds its cap. The newest
    /// bytes survive: an in-progress frame lives at the tail.
    fn enforce_cap(&mut self) -> Option<usize> {
        if self.buffer.len() <= self.max_buffer {
            return None;
        }
        let mut cut = self.buffer.len() - self.max_buffer;
        while !self.buffer.is_char_boundary(cut) {
            cut += 1;
        }
        self.buffer.drain(..cut);
        Some(cut)
    }
}

fn parse_telemetry_payload(payload: &str) -> Result<TelemetryFrame, DecodeError> {
    let tokens: Vec<&str> = payload.split(',').collect();
    if tokens.len() < TELEMETRY_TOKENS {
        return Err(DecodeError::FieldCount { got: tokens.len().saturating_sub(1) });
    }

    // Token 0 is discarded: the slice starts three characters early, so the
    // first token is never frame data (altitude is token 1, not token 0).
    let mut fields = [0.0f64; 8];
    for (slot, index) in (1..TELEMETRY_TOKENS).enumerate() {
        let token = tokens[index];
        fields[slot] = token.trim().parse::<f64>().map_err(|_| DecodeError::NonNumeric {
            index,
            token: token.to_owned(),
        })?;
    }

    Ok(TelemetryFrame::from_fields(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_FRAME: &str = "TSP0,100,25.5,1,2,3,4,5,6TEP";

    fn frames(events: &[Result<DecodedFrame, DecodeError>]) -> Vec<DecodedFrame> {
        events.iter().filter_map(|e| e.as_ref().ok().cloned()).collect()
    }

    fn errors(events: &[Result<DecodedFrame, DecodeError>]) -> Vec<DecodeError> {
        events.iter().filter_map(|e| e.as_ref().err().cloned()).collect()
    }

    #[test]
    fn decodes_a_complete_telemetry_frame() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.feed(GOOD_FRAME.as_bytes());

        let frames = frames(&events);
        assert_eq!(frames.len(), 1);
        let DecodedFrame::Telemetry(frame) = &frames[0] else {
            panic!("expected telemetry frame");
        };
        assert_eq!(frame.altitude, 100.0);
        assert_eq!(frame.temperature, 25.5);
        assert_eq!((frame.accel_x, frame.accel_y, frame.accel_z), (1.0, 2.0, 3.0));
        assert_eq!((frame.gyro_x, frame.gyro_y, frame.gyro_z), (4.0, 5.0, 6.0));
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn leading_token_is_discarded() {
        // The first token (a frame counter on the wire) never reaches the
        // decoded frame: altitude comes from token 1.
        let mut decoder = FrameDecoder::new();
        let events = decoder.feed(b"TSP999,1,2,3,4,5,6,7,8TEP");

        let frames = frames(&events);
        assert_eq!(frames.len(), 1);
        let DecodedFrame::Telemetry(frame) = &frames[0] else {
            panic!("expected telemetry frame");
        };
        assert_eq!(frame.altitude, 1.0);
        assert_eq!(frame.gyro_z, 8.0);
    }

    #[test]
    fn frame_split_across_feeds_decodes_exactly_once() {
        let mut decoder = FrameDecoder::new();
        assert!(frames(&decoder.feed(b"noise TS")).is_empty());
        assert!(frames(&decoder.feed(b"P0,100,25.5,1,2,")).is_empty());
        let events = decoder.feed(b"3,4,5,6TEP");
        assert_eq!(frames(&events).len(), 1);
    }

    #[test]
    fn short_payload_errors_and_span_is_consumed() {
        let mut decoder = FrameDecoder::new();
        // Eight raw tokens: only seven usable fields after the leading skip.
        let events = decoder.feed(b"TSP0,1,2,3,4,5,6,7TEP");

        assert!(frames(&events).is_empty());
        assert_eq!(errors(&events), vec![DecodeError::FieldCount { got: 7 }]);

        // The bad span is gone; the next frame decodes normally.
        let events = decoder.feed(GOOD_FRAME.as_bytes());
        assert_eq!(frames(&events).len(), 1);
        assert!(errors(&events).is_empty());
    }

    #[test]
    fn non_numeric_field_errors_and_span_is_consumed() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.feed(b"TSP0,1,2,bogus,4,5,6,7,8TEP");

        assert!(frames(&events).is_empty());
        assert_eq!(
            errors(&events),
            vec![DecodeError::NonNumeric { index: 3, token: "bogus".to_owned() }]
        );
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn status_frame_payload_is_verbatim() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.feed(b"MSP  apogee reached  MEP");

        assert_eq!(
            frames(&events),
            vec![DecodedFrame::Status(StatusMessage::new("  apogee reached  "))]
        );
    }

    #[test]
    fn empty_status_payload_is_discarded() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.feed(b"MSPMEP");
        assert!(events.is_empty());
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn interleaved_frames_extract_each_exactly_once() {
        for chunk in
            ["MSPliftoffMEPTSP0,1,2,3,4,5,6,7,8TEP", "TSP0,1,2,3,4,5,6,7,8TEPMSPliftoffMEP"]
        {
            let mut decoder = FrameDecoder::new();
            let events = decoder.feed(chunk.as_bytes());
            let frames = frames(&events);

            assert_eq!(frames.len(), 2, "both frames from {chunk:?}");
            let telemetry =
                frames.iter().filter(|f| matches!(f, DecodedFrame::Telemetry(_))).count();
            let status = frames.iter().filter(|f| matches!(f, DecodedFrame::Status(_))).count();
            assert_eq!((telemetry, status), (1, 1));
            assert!(decoder.pending().is_empty());
        }
    }

    #[test]
    fn multiple_telemetry_frames_in_one_chunk_all_decode() {
        let mut decoder = FrameDecoder::new();
        let chunk = format!("{GOOD_FRAME}{GOOD_FRAME}{GOOD_FRAME}");
        let events = decoder.feed(chunk.as_bytes());
        assert_eq!(frames(&events).len(), 3);
    }

    #[test]
    fn unfinished_status_survives_a_telemetry_extraction() {
        let mut decoder = FrameDecoder::new();
        // A status frame is still waiting for its end marker when a complete
        // telemetry frame lands behind it.
        let events = decoder.feed(b"MSPchute armTSP0,1,2,3,4,5,6,7,8TEP");
        assert_eq!(frames(&events).len(), 1);
        assert_eq!(decoder.pending(), "MSPchute arm");

        let events = decoder.feed(b"edMEP");
        assert_eq!(frames(&events), vec![DecodedFrame::Status(StatusMessage::new("chute armed"))]);
    }

    #[test]
    fn markerless_data_is_retained_for_the_next_call() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"free-running text with no markers").is_empty());
        assert_eq!(decoder.pending(), "free-running text with no markers");
    }

    #[test]
    fn orphan_end_marker_is_consumed_and_reported() {
        let mut decoder = FrameDecoder::new();
        // The first TEP has no start; it must not wedge the frame behind it.
        let events = decoder.feed(b"1,2,3TEPTSP0,1,2,3,4,5,6,7,8TEP");

        assert_eq!(frames(&events).len(), 1);
        assert_eq!(errors(&events), vec![DecodeError::OrphanEndMarker { marker: TELEMETRY_END }]);
    }

    #[test]
    fn orphan_status_end_marker_is_consumed_and_reported() {
        let mut decoder = FrameDecoder::new();
        // Same for a stray MEP: consumed, diagnosed, never silent.
        let events = decoder.feed(b"stray textMEPMSPrecovery okMEP");

        assert_eq!(errors(&events), vec![DecodeError::OrphanEndMarker { marker: STATUS_END }]);
        assert_eq!(
            frames(&events),
            vec![DecodedFrame::Status(StatusMessage::new("recovery ok"))]
        );
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn invalid_utf8_is_sanitized_and_reported() {
        let mut decoder = FrameDecoder::new();
        let mut chunk = GOOD_FRAME.as_bytes().to_vec();
        chunk.push(0xFF);
        let events = decoder.feed(&chunk);

        assert_eq!(frames(&events).len(), 1);
        assert_eq!(errors(&events), vec![DecodeError::InvalidEncoding { replaced: 1 }]);
    }

    #[test]
    fn buffer_cap_drops_oldest_bytes_once() {
        let mut decoder = FrameDecoder::with_max_buffer(32);
        let events = decoder.feed(&[b'x'; 100]);

        assert_eq!(errors(&events), vec![DecodeError::BufferOverflow { dropped: 68 }]);
        assert_eq!(decoder.pending().len(), 32);

        // A frame arriving after the overflow still decodes.
        let events = decoder.feed(GOOD_FRAME.as_bytes());
        assert_eq!(frames(&events).len(), 1);
    }

    mod split_properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // A well-formed frame split arbitrarily across feed calls decodes
            // exactly once, regardless of the split points.
            #[test]
            fn arbitrary_splits_decode_exactly_once(
                mut cuts in prop::collection::vec(0usize..28, 0..6)
            ) {
                let wire = GOOD_FRAME.as_bytes();
                cuts.push(wire.len());
                cuts.sort_unstable();

                let mut decoder = FrameDecoder::new();
                let mut decoded = Vec::new();
                let mut from = 0;
                for cut in cuts {
                    let cut = cut.min(wire.len()).max(from);
                    decoded.extend(frames(&decoder.feed(&wire[from..cut])));
                    from = cut;
                }
                decoded.extend(frames(&decoder.feed(&wire[from..])));

                prop_assert_eq!(decoded.len(), 1);
                let DecodedFrame::Telemetry(frame) = &decoded[0] else {
                    return Err(TestCaseError::fail("expected telemetry frame"));
                };
                prop_assert_eq!(frame.altitude, 100.0);
                prop_assert_eq!(frame.gyro_z, 6.0);
            }
        }
    }
}
