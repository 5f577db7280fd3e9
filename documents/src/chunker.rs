//! Word-window chunking.
//!
//! Text is split on whitespace into windows of `chunk_size` words. Each
//! window starts `chunk_size - chunk_overlap` words after the previous one,
//! so consecutive chunks share `chunk_overlap` words.

/// Split `text` into overlapping word windows.
///
/// Blank text yields no chunks. Text with at most `chunk_size` words is
/// returned unchanged as a single chunk; otherwise chunks are the words of
/// each window joined by single spaces.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let chunk_size = chunk_size.max(1);
    if words.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if start + chunk_size >= words.len() {
            break;
        }
        start += step;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbered(count: usize) -> String {
        (0..count)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(split_text("", 10, 2).is_empty());
        assert!(split_text(" \n\t ", 10, 2).is_empty());
    }

    #[test]
    fn test_short_text_is_returned_unchanged() {
        let text = "  keep   this\nspacing ";
        assert_eq!(split_text(text, 3, 1), vec![text.to_string()]);
    }

    #[test]
    fn test_windows_overlap() {
        let chunks = split_text(&numbered(10), 4, 1);
        assert_eq!(
            chunks,
            vec![
                "w0 w1 w2 w3".to_string(),
                "w3 w4 w5 w6".to_string(),
                "w6 w7 w8 w9".to_string(),
            ]
        );
    }

    #[test]
    fn test_last_window_may_be_short() {
        let chunks = split_text(&numbered(7), 4, 0);
        assert_eq!(chunks, vec!["w0 w1 w2 w3".to_string(), "w4 w5 w6".to_string()]);
    }

    #[test]
    fn test_overlap_not_smaller_than_size_still_advances() {
        let chunks = split_text(&numbered(4), 2, 5);
        assert_eq!(
            chunks,
            vec!["w0 w1".to_string(), "w1 w2".to_string(), "w2 w3".to_string()]
        );
    }

    #[test]
    fn test_default_sizes() {
        let chunks = split_text(&numbered(2500), 1000, 200);
        let lengths: Vec<usize> = chunks.iter().map(|c| c.split(' ').count()).collect();
        assert_eq!(lengths, vec![1000, 1000, 900]);
        assert!(chunks[1].starts_with("w800 "));
        assert!(chunks[2].starts_with("w1600 "));
    }
}
