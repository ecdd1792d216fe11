//! Text handling for whispers: escaping, hashtag extraction, length checks.

/// Escapes `&`, `<` and `>` after trimming surrounding whitespace.
///
/// Quotes are left alone; the result is only ever placed in element text,
/// never in an attribute.
pub fn sanitize_text(raw: &str) -> String {
    html_escape::encode_text(raw.trim()).into_owned()
}

/// Characters allowed after `#`: the Arabic block plus ASCII word characters.
pub fn is_hashtag_char(c: char) -> bool {
    matches!(c, '\u{0600}'..='\u{06FF}') || c.is_ascii_alphanumeric() || c == '_'
}

/// Every `#tag` in `text`, in order of occurrence, duplicates included.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    segments(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Hashtag(tag) => Some(tag.to_string()),
            Segment::Text(_) => None,
        })
        .collect()
}

/// A piece of post content, as split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    /// Includes the leading `#`
    Hashtag(&'a str),
}

/// Splits `text` into plain runs and hashtags. Concatenating the segments
/// yields `text` again.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut plain_start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find('#') {
        let hash = cursor + offset;
        let tag_len: usize = text[hash + 1..]
            .chars()
            .take_while(|c| is_hashtag_char(*c))
            .map(char::len_utf8)
            .sum();

        if tag_len == 0 {
            cursor = hash + 1;
            continue;
        }

        if hash > plain_start {
            out.push(Segment::Text(&text[plain_start..hash]));
        }
        let end = hash + 1 + tag_len;
        out.push(Segment::Hashtag(&text[hash..end]));
        plain_start = end;
        cursor = end;
    }

    if plain_start < text.len() {
        out.push(Segment::Text(&text[plain_start..]));
    }
    out
}

/// Length as the composer counts it: Unicode scalar values.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_escapes_markup_and_trims() {
        assert_eq!(
            sanitize_text("  <b>hi</b> & bye \n"),
            "&lt;b&gt;hi&lt;/b&gt; &amp; bye"
        );
        assert_eq!(sanitize_text("\"quoted\""), "\"quoted\"");
    }

    #[test]
    fn extracts_arabic_and_latin_tags() {
        assert_eq!(extract_hashtags("مرحبا #سلام"), vec!["#سلام"]);
        assert_eq!(
            extract_hashtags("#rust_lang and #تأمل! #rust_lang"),
            vec!["#rust_lang", "#تأمل", "#rust_lang"]
        );
    }

    #[test]
    fn lone_and_doubled_hashes() {
        assert!(extract_hashtags("# nothing here #").is_empty());
        assert_eq!(extract_hashtags("##twice"), vec!["#twice"]);
        assert_eq!(extract_hashtags("a#b"), vec!["#b"]);
    }

    #[test]
    fn tag_stops_at_non_word_characters() {
        assert_eq!(extract_hashtags("#café"), vec!["#caf"]);
        assert_eq!(extract_hashtags("#السلام_النفسي🌱"), vec!["#السلام_النفسي"]);
    }

    #[test]
    fn segments_round_trip_the_text() {
        let text = "قبل #وسم بعد #tag";
        let parts = segments(text);
        assert_eq!(
            parts,
            vec![
                Segment::Text("قبل "),
                Segment::Hashtag("#وسم"),
                Segment::Text(" بعد "),
                Segment::Hashtag("#tag"),
            ]
        );
        let joined: String = parts
            .iter()
            .map(|s| match s {
                Segment::Text(t) | Segment::Hashtag(t) => *t,
            })
            .collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn counts_scalar_values() {
        assert_eq!(char_count("سلام"), 4);
        assert_eq!(char_count(""), 0);
    }
}
