//! Sentence-level chunking. A chunk is exactly one sentence, however long;
//! no size cap is applied here.

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{a0}', " ")
}

/// Splits raw text into trimmed, non-empty sentences.
///
/// Boundaries are terminator runs (`.`, `!`, `?` plus trailing closing
/// quotes/brackets) followed by whitespace, with a guard for common
/// abbreviations and initials. Paragraph gaps are hard boundaries so
/// headings without terminators still become their own chunk. Word-level
/// concatenation of the output reproduces the input's words in order.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split("\n\n")
        .flat_map(split_paragraph)
        .collect()
}

const ABBREVIATIONS: [&str; 14] = [
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "fig", "al",
];

fn split_paragraph(paragraph: &str) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut cursor = 0usize;

    while cursor < chars.len() {
        if !is_terminator(chars[cursor]) {
            cursor += 1;
            continue;
        }

        let mut end = cursor + 1;
        while end < chars.len() && is_terminator(chars[end]) {
            end += 1;
        }
        while end < chars.len() && is_closer(chars[end]) {
            end += 1;
        }

        let at_break = end >= chars.len() || chars[end].is_whitespace();
        if at_break && !(chars[cursor] == '.' && ends_in_abbreviation(&chars[start..cursor])) {
            push_trimmed(&mut sentences, &chars[start..end]);
            start = end;
        }
        cursor = end;
    }

    push_trimmed(&mut sentences, &chars[start..]);
    sentences
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}')
}

fn push_trimmed(sentences: &mut Vec<String>, chars: &[char]) {
    let sentence = chars.iter().collect::<String>().trim().to_string();
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

/// True when the token right before a period is an abbreviation or a
/// single-letter initial, so the period does not end the sentence.
fn ends_in_abbreviation(before: &[char]) -> bool {
    let token: String = before
        .iter()
        .rev()
        .take_while(|c| c.is_alphanumeric() || **c == '.')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let token = token.trim_start_matches('.').to_lowercase();
    if token.is_empty() {
        return false;
    }

    if token.len() == 1 && token.chars().all(char::is_alphabetic) {
        return true;
    }

    ABBREVIATIONS.contains(&token.as_str())
}
