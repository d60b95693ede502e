/// Splits text into pieces of at most `max_chars` characters, preferring to break after sentence
/// punctuation, then at whitespace, and only cutting through a word if it is longer than
/// `max_chars` on its own.
pub fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();

    for sentence in sentences(text) {
        let mut current = String::new();
        let mut current_len = 0;

        for word in sentence.split_whitespace() {
            let word_len = word.chars().count();

            if word_len > max_chars {
                if current_len > 0 {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let chars: Vec<char> = word.chars().collect();
                let mut pieces = chars.chunks(max_chars).peekable();
                while let Some(piece) = pieces.next() {
                    if pieces.peek().is_some() {
                        chunks.push(piece.iter().collect());
                    } else {
                        // the tail may still share a chunk with the following words
                        current = piece.iter().collect();
                        current_len = piece.len();
                    }
                }
                continue;
            }

            let needed = if current_len == 0 { word_len } else { current_len + 1 + word_len };
            if needed > max_chars {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }

        if current_len > 0 {
            chunks.push(current);
        }
    }

    chunks
}

fn sentences(text: &str) -> Vec<&str> {
    let mut ret = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let at_boundary = match chars.peek() {
            None => true,
            Some((_, next)) => next.is_whitespace(),
        };
        if matches!(c, '.' | '!' | '?' | ';') && at_boundary {
            let end = i + c.len_utf8();
            ret.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        ret.push(&text[start..]);
    }
    ret.retain(|s| !s.trim().is_empty());
    ret
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(vec!["Booking confirmed."], split_for_speech("Booking confirmed.", 100));
        assert!(split_for_speech("   ", 100).is_empty());
    }

    #[test]
    fn test_splits_at_sentences() {
        let chunks = split_for_speech(
            "Booking confirmed for Asha. 2 passengers from Ameerpet to KPHB. Total fare 60 rupees.",
            100,
        );
        assert_eq!(
            vec![
                "Booking confirmed for Asha.",
                "2 passengers from Ameerpet to KPHB.",
                "Total fare 60 rupees.",
            ],
            chunks,
        );
    }

    #[test]
    fn test_decimal_point_is_not_a_sentence_end() {
        assert_eq!(vec!["Fare 1.5 times"], split_for_speech("Fare 1.5 times", 100));
    }

    #[test]
    fn test_splits_long_sentence_at_whitespace() {
        let chunks = split_for_speech("one two three four five", 9);
        assert_eq!(vec!["one two", "three", "four five"], chunks);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 9);
        }
    }

    #[test]
    fn test_cuts_overlong_words() {
        let chunks = split_for_speech("abcdefghij xy", 4);
        assert_eq!(vec!["abcd", "efgh", "ij", "xy"], chunks);

        let chunks = split_for_speech("abcdefghi x", 4);
        assert_eq!(vec!["abcd", "efgh", "i x"], chunks);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let chunks = split_for_speech("ääää öööö", 4);
        assert_eq!(vec!["ääää", "öööö"], chunks);
    }
}
