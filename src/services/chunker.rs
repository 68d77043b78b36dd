// src/services/chunker.rs

/// Texts longer than this many characters are split before sending.
pub const SPLIT_THRESHOLD: usize = 320;

/// Target chunk size once a text has to be split.
pub const CHUNK_SIZE: usize = 300;

/// Split a reply so it fits the Messenger text limit.
pub fn split_response(text: &str) -> Vec<String> {
    if text.chars().count() <= SPLIT_THRESHOLD {
        return vec![text.to_string()];
    }
    chunk_text(text, CHUNK_SIZE)
}

/// Chunk `text` into pieces of at most `max_len` characters, cutting at
/// whitespace.
///
/// A whitespace character sitting right on the boundary stays with the chunk
/// it ends, so a chunk may be one character longer than `max_len`. A run
/// without any whitespace in the window is hard-cut at `max_len`.
/// Joining the chunks always gives back `text`.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let boundary = byte_index_after_n_chars(remaining, max_len);
        if boundary == remaining.len() {
            chunks.push(remaining.to_string());
            break;
        }

        let cut = split_point(remaining, boundary);
        chunks.push(remaining[..cut].to_string());
        remaining = &remaining[cut..];
    }
    chunks
}

fn byte_index_after_n_chars(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

// `boundary` is always a char boundary strictly inside `segment`.
fn split_point(segment: &str, boundary: usize) -> usize {
    if let Some(ch) = segment[boundary..].chars().next() {
        if ch.is_whitespace() {
            return boundary + ch.len_utf8();
        }
    }

    segment[..boundary]
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map(|(idx, ch)| idx + ch.len_utf8())
        .unwrap_or(boundary)
}
