//! Instructor title detection and name normalization.
//!
//! Matching runs on a separator-normalized form of the cell: every period becomes a
//! space and whitespace runs collapse, so "Dr.Öğr.Üyesi", "Dr. Öğr. Üyesi" and
//! "Dr  Öğr Üyesi" all read as "dr öğr üyesi".
//!
//! Name keys use Turkish lowercasing (`I` -> `ı`). A name typed with ASCII letters
//! in mixed case ("Ibrahim") and the same name in capitals ("IBRAHIM") therefore
//! get different keys ("ıbrahim", "ıbrahım") and are not reconciled.

use crate::models::{ParsedIdentity, Title};

/// Where a phrase may match in the normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    /// Anywhere, including inside a word.
    Anywhere,
    /// Only between non-alphanumeric neighbours.
    WholeWord,
}

/// Recognized title phrases in match-priority order, written dot-free. When several
/// phrases occur in the same text the earliest entry wins, whatever its rank. Longer
/// phrases sit in front of the shorter phrases they contain so that removal never
/// leaves a fragment.
const TITLE_PHRASES: &[(&str, Title, Span)] = &[
    ("prof dr", Title::Prof, Span::Anywhere),
    ("yrd doç dr", Title::DrOgrUyesi, Span::Anywhere),
    ("yrd doc dr", Title::DrOgrUyesi, Span::Anywhere),
    ("doç dr", Title::Doc, Span::Anywhere),
    ("doc dr", Title::Doc, Span::Anywhere),
    ("dr öğretim üyesi", Title::DrOgrUyesi, Span::Anywhere),
    ("dr öğr üyesi", Title::DrOgrUyesi, Span::Anywhere),
    ("dr öğrt üyesi", Title::DrOgrUyesi, Span::Anywhere),
    ("öğretim görevlisi dr", Title::OgrGorDr, Span::Anywhere),
    ("öğr görevlisi dr", Title::OgrGorDr, Span::Anywhere),
    ("öğr gör dr", Title::OgrGorDr, Span::Anywhere),
    ("öğretim görevlisi", Title::OgrGor, Span::Anywhere),
    ("öğr görevlisi", Title::OgrGor, Span::Anywhere),
    ("öğr gör", Title::OgrGor, Span::Anywhere),
    // A bare "dr" inside a word is part of a name ("Andrea").
    ("dr", Title::OgrGorDr, Span::WholeWord),
];

/// Instructor cells that carry no name at all.
const PLACEHOLDERS: &[&str] = &["", "0", "nan", "NaN"];

/// Lowercase with Turkish dotted/dotless i handling: `I` -> `ı`, `İ` -> `i`.
pub fn turkish_lowercase(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            'I' => vec!['ı'],
            'İ' => vec!['i'],
            other => other.to_lowercase().collect(),
        })
        .collect()
}

/// Uppercase counterpart of [`turkish_lowercase`]: `i` -> `İ`, `ı` -> `I`.
pub fn turkish_uppercase(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            'i' => vec!['İ'],
            'ı' => vec!['I'],
            other => other.to_uppercase().collect(),
        })
        .collect()
}

/// Single-char fold used for phrase matching. Every i-variant collapses to `i`.
fn fold_for_match(c: char) -> char {
    match c {
        'I' | 'İ' | 'ı' => 'i',
        other => other.to_lowercase().next().unwrap_or(other),
    }
}

/// Periods become spaces, whitespace runs become one space, ends are trimmed.
fn normalize_separators(text: &str) -> Vec<char> {
    text.replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .collect()
}

fn is_boundary(haystack: &[char], index: Option<usize>) -> bool {
    match index.and_then(|i| haystack.get(i)) {
        Some(c) => !c.is_alphanumeric(),
        None => true,
    }
}

fn find_at(haystack: &[char], needle: &[char], span: Span, from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| {
        haystack[i..i + needle.len()] == *needle
            && (span == Span::Anywhere
                || (is_boundary(haystack, i.checked_sub(1)) && is_boundary(haystack, Some(i + needle.len()))))
    })
}

/// Remove every occurrence of `phrase` from `chars`, comparing folded forms.
fn remove_phrase(chars: Vec<char>, phrase: &[char], span: Span) -> Vec<char> {
    let folded: Vec<char> = chars.iter().copied().map(fold_for_match).collect();
    let mut kept = Vec::with_capacity(chars.len());
    let mut cursor = 0;
    while let Some(start) = find_at(&folded, phrase, span, cursor) {
        kept.extend_from_slice(&chars[cursor..start]);
        cursor = start + phrase.len();
    }
    kept.extend_from_slice(&chars[cursor..]);
    kept
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a raw instructor cell is one of the known "no value" placeholders.
pub fn is_placeholder(raw: &str) -> bool {
    PLACEHOLDERS.contains(&raw.trim())
}

/// Title detected in `raw`, if any: the earliest declared phrase that occurs in it.
pub fn detect_title(raw: &str) -> Option<Title> {
    let folded: Vec<char> = normalize_separators(raw).into_iter().map(fold_for_match).collect();
    TITLE_PHRASES
        .iter()
        .find(|(phrase, _, span)| {
            let phrase: Vec<char> = phrase.chars().collect();
            find_at(&folded, &phrase, *span, 0).is_some()
        })
        .map(|(_, title, _)| *title)
}

/// Split a raw instructor cell into its title and bare name.
pub fn parse_instructor(raw: &str) -> ParsedIdentity {
    let title = detect_title(raw);

    let mut chars = normalize_separators(raw);
    for (phrase, _, span) in TITLE_PHRASES {
        let phrase: Vec<char> = phrase.chars().collect();
        chars = remove_phrase(chars, &phrase, *span);
    }

    let bare_name = collapse_whitespace(&chars.into_iter().collect::<String>());
    let name_key = turkish_lowercase(&bare_name);

    ParsedIdentity {
        title,
        bare_name,
        name_key,
    }
}
