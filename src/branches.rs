//! Heuristic vocabulary of medical branch names, offered as a filter facet.
//!
//! The result is advisory: it may contain words that are not branches.

use crate::models::ReconciledRow;
use crate::titles::{turkish_lowercase, turkish_uppercase};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

const MIN_TOKEN_CHARS: usize = 4;
const MAX_TOKEN_CHARS: usize = 30;
const FALLBACK_COUNT: usize = 20;

const STOPWORDS: &[&str] = &[
    "ders", "dersi", "dersleri", "kurul", "kurulu", "komite", "komitesi", "hafta", "haftası",
    "teorik", "pratik", "giriş", "genel", "temel", "serbest", "çalışma", "saati", "sınav",
    "sınavı", "grup", "prof", "doçent", "öğretim", "üyesi", "görevlisi", "uzman", "asistan",
    "dönem", "tıbbi", "tıpta", "için", "ile", "olan", "veya",
];

static LETTER_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zçğıöşüâîû]+").unwrap());

const BRANCH_SUFFIXES: &[&str] = &["oloji", "loji", "kimya", "mi", "liği", "lığı", "lüğü", "luğu"];

/// Candidate branch keywords drawn from course names, course titles and committee
/// names, sorted alphabetically.
pub fn extract_branch_terms(rows: &[ReconciledRow]) -> Vec<String> {
    let blob = rows
        .iter()
        .flat_map(|r| [&r.row.course_name, &r.row.course_title, &r.row.committee_name])
        .map(|text| turkish_lowercase(text))
        .collect::<Vec<_>>()
        .join(" ");

    branch_terms_from_text(&blob)
}

pub fn branch_terms_from_text(text: &str) -> Vec<String> {
    let tokens: BTreeSet<String> = LETTER_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|t| (MIN_TOKEN_CHARS..=MAX_TOKEN_CHARS).contains(&t.chars().count()))
        .filter(|t| !STOPWORDS.contains(t))
        .map(capitalize)
        .collect();

    let branches: Vec<String> = tokens
        .iter()
        .filter(|t| {
            let lower = turkish_lowercase(t);
            BRANCH_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
        })
        .cloned()
        .collect();

    if branches.is_empty() {
        tokens.into_iter().take(FALLBACK_COUNT).collect()
    } else {
        branches
    }
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => turkish_uppercase(&first.to_string()) + chars.as_str(),
        None => String::new(),
    }
}
