/// Minimum ASCII token length that contributes 2-grams.
const MIN_NGRAM_TOKEN_LEN: usize = 3;

/// Split a name or path into lowercase ASCII tokens.
///
/// Separators are `/ . _ -`, whitespace, and every non-ASCII character.
pub fn tokenize(s: &str) -> Vec<String> {
    let mapped: String = s
        .to_lowercase()
        .chars()
        .map(|ch| match ch {
            '/' | '.' | '_' | '-' | ' ' => ' ',
            c if c.is_ascii() => c,
            _ => ' ',
        })
        .collect();

    mapped.split_whitespace().map(str::to_string).collect()
}

/// Build fuzzy n-grams for a name, path, or query.
///
/// ASCII tokens of at least three characters contribute every 2-gram.
/// Contiguous CJK runs of at least two characters contribute bigrams.
/// No dictionary is involved, and duplicates are kept.
pub fn build_ngrams(s: &str) -> Vec<String> {
    let lower = s.to_lowercase();
    let mut out = Vec::with_capacity(16);

    for token in tokenize(&lower) {
        if token.len() < MIN_NGRAM_TOKEN_LEN {
            continue;
        }
        // tokens are pure ASCII, so byte windows are char windows
        let bytes = token.as_bytes();
        for window in bytes.windows(2) {
            out.push(String::from_utf8_lossy(window).into_owned());
        }
    }

    let chars: Vec<char> = lower.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if !is_cjk(chars[i]) {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < chars.len() && is_cjk(chars[j]) {
            j += 1;
        }
        if j - i >= 2 {
            for pair in chars[i..j].windows(2) {
                out.push(pair.iter().collect());
            }
        }
        i = j;
    }

    out
}

/// CJK unified ideographs, compatibility ideographs, kana, and Hangul syllables
pub fn is_cjk(ch: char) -> bool {
    matches!(
        ch as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0xF900..=0xFAFF
            | 0x3040..=0x309F
            | 0x30A0..=0x30FF
            | 0xAC00..=0xD7A3
    )
}
