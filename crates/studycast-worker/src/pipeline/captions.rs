//! Caption chunking.

use studycast_models::{CaptionChunk, TranscriptSegment};

/// Split one segment into chunks of at most `max_words` words.
///
/// Every chunk gets an equal share of the segment interval; chunks are
/// contiguous and the last one ends exactly at `segment.end`. Timing is
/// uniform per chunk, not proportional to word length.
pub fn chunk_segment(segment: &TranscriptSegment, max_words: usize) -> Vec<CaptionChunk> {
    let words: Vec<&str> = segment.text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let groups: Vec<&[&str]> = words.chunks(max_words.max(1)).collect();
    let n = groups.len();
    let step = (segment.end - segment.start) / n as f64;

    groups
        .into_iter()
        .enumerate()
        .map(|(i, group)| CaptionChunk {
            start: segment.start + step * i as f64,
            end: if i + 1 == n {
                segment.end
            } else {
                segment.start + step * (i + 1) as f64
            },
            text: group.join(" "),
        })
        .collect()
}

/// Chunk every segment of a transcript, preserving order.
pub fn chunk_transcript(segments: &[TranscriptSegment], max_words: usize) -> Vec<CaptionChunk> {
    segments
        .iter()
        .flat_map(|s| chunk_segment(s, max_words))
        .collect()
}
