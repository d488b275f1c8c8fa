//! Canonical call rendering and the similarity ratio used for call matching.
//!
//! Canonical text drops comments and layout whitespace outside literals, so
//! two calls that differ only in formatting render identically. Literal
//! content is kept byte-for-byte.

/// Render `source` in canonical form.
///
/// Whitespace (and comments) outside string/char literals is removed, except
/// that a single space is kept between two word characters (`new Foo`).
/// Falls back to the trimmed raw text if nothing survives.
pub fn canonical_text(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut pending_space = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '"' || c == '\'' {
            flush_space(&mut out, &mut pending_space, c);
            let end = literal_end(&chars, i);
            out.extend(&chars[i..end]);
            i = end;
            continue;
        }

        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            pending_space = true;
            continue;
        }

        if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i = (i + 2).min(chars.len());
            pending_space = true;
            continue;
        }

        if c.is_whitespace() {
            pending_space = true;
            i += 1;
            continue;
        }

        flush_space(&mut out, &mut pending_space, c);
        out.push(c);
        i += 1;
    }

    if out.is_empty() {
        source.trim().to_string()
    } else {
        out
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn flush_space(out: &mut String, pending: &mut bool, next: char) {
    if *pending {
        if let Some(prev) = out.chars().last() {
            if is_word_char(prev) && is_word_char(next) {
                out.push(' ');
            }
        }
        *pending = false;
    }
}

/// Index one past the closing quote of the literal opened at `start`.
/// Text blocks (`"""`) are handled; an unterminated literal runs to the end.
fn literal_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    if quote == '"' && chars.get(start + 1) == Some(&'"') && chars.get(start + 2) == Some(&'"') {
        let mut i = start + 3;
        while i + 2 < chars.len() {
            if chars[i] == '\\' {
                i += 2;
                continue;
            }
            if chars[i] == '"' && chars[i + 1] == '"' && chars[i + 2] == '"' {
                return i + 3;
            }
            i += 1;
        }
        return chars.len();
    }

    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

/// Normalized edit similarity in `[0, 1]`; `1.0` means identical.
///
/// Computed as `(|a| + |b| - d) / (|a| + |b|)` where `d` is the edit distance
/// with unit insert/delete cost and substitution cost 2.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let distance = weighted_distance(&a, &b);
    (total - distance) as f64 / total as f64
}

fn weighted_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + if ca == cb { 0 } else { 2 };
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_strips_layout_whitespace() {
        assert_eq!(
            canonical_text("Log.d( TAG ,\n    \"hello world\" )"),
            "Log.d(TAG,\"hello world\")"
        );
    }

    #[test]
    fn test_canonical_keeps_space_between_words() {
        assert_eq!(
            canonical_text("log.info(new   Object())"),
            "log.info(new Object())"
        );
    }

    #[test]
    fn test_canonical_preserves_literal_content() {
        assert_eq!(
            canonical_text("Log.d(\"a  //  b\",  'x')"),
            "Log.d(\"a  //  b\",'x')"
        );
        assert_eq!(
            canonical_text("Log.d(\"say \\\"hi  there\\\"\")"),
            "Log.d(\"say \\\"hi  there\\\"\")"
        );
    }

    #[test]
    fn test_canonical_drops_comments() {
        assert_eq!(
            canonical_text("Log.d(TAG, /* why */ msg // trailing\n)"),
            "Log.d(TAG,msg)"
        );
    }

    #[test]
    fn test_canonical_text_block() {
        let src = "log.info(\"\"\"\n  a  b\n\"\"\")";
        assert_eq!(canonical_text(src), src);
    }

    #[test]
    fn test_canonical_empty_falls_back_to_raw() {
        assert_eq!(canonical_text("  /* only comment */ "), "/* only comment */");
        assert_eq!(canonical_text(""), "");
    }

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert_eq!(similarity_ratio("Log.d(\"a\")", "Log.d(\"a\")"), 1.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("", "abc"), 0.0);
    }

    #[test]
    fn test_ratio_matches_indel_formula() {
        // One substitution over 8 chars: (8 - 2) / 8.
        assert!((similarity_ratio("abcd", "abce") - 0.75).abs() < 1e-9);
        // kitten/sitting: lcs 4, total 13 -> 8/13.
        assert!((similarity_ratio("kitten", "sitting") - 8.0 / 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_is_symmetric() {
        let a = "Log.d(TAG,\"start\")";
        let b = "Log.e(TAG,\"started\"+id)";
        assert_eq!(similarity_ratio(a, b), similarity_ratio(b, a));
    }
}
