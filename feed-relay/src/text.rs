//! Length limits for post text. Lengths are counted in characters.

/// Maximum length of a post on the destination platform.
pub const POST_LIMIT: usize = 300;

const ELLIPSIS: &str = "...";

/// Trim `text` and, if it is longer than `limit`, drop whole trailing words
/// until the rest plus an ellipsis fits.
pub fn truncate(text: &str, limit: usize) -> String {
    let trimmed = text.trim();
    if char_len(trimmed) <= limit {
        return trimmed.to_string();
    }

    let mut words: Vec<&str> = trimmed.split_whitespace().collect();
    // Running length of `words.join(" ")`
    let mut joined_len = words.iter().map(|w| char_len(w)).sum::<usize>() + words.len().saturating_sub(1);
    while !words.is_empty() && joined_len + ELLIPSIS.len() > limit {
        if let Some(word) = words.pop() {
            joined_len -= char_len(word) + usize::from(!words.is_empty());
        }
    }

    format!("{}{}", words.join(" "), ELLIPSIS)
}

/// Trim `text` and pack its words greedily into chunks of at most `limit`
/// characters. No ellipsis is added.
///
/// Whitespace inside a chunk is kept as written; the whitespace run at a
/// chunk boundary is consumed. A word longer than `limit` on its own is cut
/// at character boundaries.
pub fn split(text: &str, limit: usize) -> Vec<String> {
    let trimmed = text.trim();
    if char_len(trimmed) <= limit {
        return vec![trimmed.to_string()];
    }

    let mut chunks = Vec::new();
    // (byte start, char start) of the open chunk and (byte end, char end) of its last word
    let mut open: Option<((usize, usize), (usize, usize))> = None;

    for word in words_with_offsets(trimmed) {
        if let Some((start, end)) = open {
            if word.char_end - start.1 <= limit {
                open = Some((start, (word.byte_end, word.char_end)));
                continue;
            }
            chunks.push(trimmed[start.0..end.0].to_string());
        }

        if word.char_end - word.char_start > limit {
            let mut pieces = hard_cut(&trimmed[word.byte_start..word.byte_end], limit);
            let last = pieces.pop().unwrap_or_default();
            chunks.extend(pieces);
            let last_len = char_len(&last);
            let last_start = word.byte_end - last.len();
            open = Some(((last_start, word.char_end - last_len), (word.byte_end, word.char_end)));
        } else {
            open = Some(((word.byte_start, word.char_start), (word.byte_end, word.char_end)));
        }
    }

    if let Some((start, end)) = open {
        chunks.push(trimmed[start.0..end.0].to_string());
    }
    chunks
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

struct WordSpan {
    byte_start: usize,
    byte_end: usize,
    char_start: usize,
    char_end: usize,
}

fn words_with_offsets(text: &str) -> Vec<WordSpan> {
    let mut spans = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut char_index = 0;

    for (byte_index, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some((byte_start, char_start)) = current.take() {
                spans.push(WordSpan {
                    byte_start,
                    byte_end: byte_index,
                    char_start,
                    char_end: char_index,
                });
            }
        } else if current.is_none() {
            current = Some((byte_index, char_index));
        }
        char_index += 1;
    }

    if let Some((byte_start, char_start)) = current {
        spans.push(WordSpan {
            byte_start,
            byte_end: text.len(),
            char_start,
            char_end: char_index,
        });
    }
    spans
}

fn hard_cut(word: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(limit.max(1))
        .map(|piece| piece.iter().collect())
        .collect()
}
