//! Splitting of long replies into Telegram-sized messages.
//!
//! Lengths are counted in characters, never bytes, so multi-byte text is
//! never cut inside a code point.

/// Hard limit Telegram enforces on a single text message.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Default chunk size, leaving room for the part label.
pub const DEFAULT_MAX_LENGTH: usize = 4000;

/// Room kept free for a "[Part i/N]\n" label, enough for ten-digit counts.
pub const LABEL_RESERVE: usize = 32;

/// Largest usable chunk size: a labelled chunk of this size still fits
/// within [`TELEGRAM_MESSAGE_LIMIT`].
pub const MAX_CHUNK_LENGTH: usize = TELEGRAM_MESSAGE_LIMIT - LABEL_RESERVE;

/// Splits `text` into chunks of at most `max_length` characters.
///
/// Each cut prefers the last newline in the second half of the window (the
/// newline stays with the earlier chunk), then the last space in that half
/// (the space starts the next chunk), and falls back to a hard cut at
/// `max_length`. Concatenating the chunks yields `text` unchanged. Text that
/// already fits, the empty string included, comes back as a single chunk.
pub fn split_message(text: &str, max_length: usize) -> Vec<String> {
    let max_length = max_length.max(1);
    if text.chars().count() <= max_length {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        // Byte offset just past `max_length` chars, or None if it all fits.
        let window_end = match rest.char_indices().nth(max_length) {
            Some((offset, _)) => offset,
            None => {
                chunks.push(rest.to_string());
                break;
            }
        };

        let cut = find_cut(&rest[..window_end], max_length).unwrap_or(window_end);
        let (head, tail) = rest.split_at(cut);
        chunks.push(head.to_string());
        rest = tail;
    }

    chunks
}

/// Byte offset to cut `window` at, if a natural boundary exists.
fn find_cut(window: &str, max_length: usize) -> Option<usize> {
    let half = max_length / 2;

    let mut last_newline = None;
    let mut last_space = None;
    for (position, (offset, c)) in window.char_indices().enumerate() {
        if position == 0 || position < half {
            continue;
        }
        match c {
            '\n' => last_newline = Some(offset + c.len_utf8()),
            ' ' => last_space = Some(offset),
            _ => {}
        }
    }

    last_newline.or(last_space)
}

/// Prefixes each chunk with a "[Part i/N]" label when there is more than one.
///
/// The first part is labelled only when the label still fits within
/// `max_length`. Later parts are labelled unless that would take them past
/// [`TELEGRAM_MESSAGE_LIMIT`], which cannot happen for chunk sizes up to
/// [`MAX_CHUNK_LENGTH`].
pub fn label_parts(chunks: Vec<String>, max_length: usize) -> Vec<String> {
    let total = chunks.len();
    if total < 2 {
        return chunks;
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let label = format!("[Part {}/{}]\n", index + 1, total);
            let labelled_len = label.chars().count() + chunk.chars().count();
            let limit = if index == 0 {
                max_length
            } else {
                TELEGRAM_MESSAGE_LIMIT
            };
            if labelled_len > limit {
                chunk
            } else {
                label + &chunk
            }
        })
        .collect()
}
