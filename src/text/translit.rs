//! Arabizi → Arabic transliteration for Moroccan Darija.
//!
//! Rule-based and heuristic. Substitutions are applied sequentially over the
//! whole input, so list order is load-bearing: digraphs come before the
//! single letters that could shadow them. The trailing `9a`/`9i`/`9u`
//! entries are kept in their historical position even though the earlier
//! bare `9` rule consumes their prefix first.

use std::sync::LazyLock;

use regex::{Captures, Regex, RegexBuilder};

/// Ordered substitution list. Do not reorder: replacement is sequential,
/// not longest-match.
const ARABIZI_MAP: &[(&str, &str)] = &[
    ("ch", "ش"),
    ("gh", "غ"),
    ("kh", "خ"),
    ("sh", "ش"), // fallback
    ("3", "ع"),
    ("7", "ح"),
    ("9", "ق"),
    ("2", "ء"),
    ("5", "خ"),
    ("6", "ط"),
    ("9a", "قا"),
    ("9i", "قي"),
    ("9u", "قو"),
];

static SUBSTITUTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    ARABIZI_MAP
        .iter()
        .map(|(src, dst)| {
            let re = RegexBuilder::new(&regex::escape(src))
                .case_insensitive(true)
                .build()
                .unwrap();
            (re, *dst)
        })
        .collect()
});

/// Runs of sentence punctuation (Arabic and Latin) collapse to one mark.
static PUNCT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new("[،؛,!?:;]+").unwrap());

/// Best-effort lexical mapping of Latin/digit Arabizi tokens to Arabic
/// script. Already-Arabic text passes through unchanged.
pub fn arabizi_to_arabic(text: &str) -> String {
    let mut t = text.to_string();
    for (re, dst) in SUBSTITUTIONS.iter() {
        t = re.replace_all(&t, *dst).into_owned();
    }

    let t = PUNCT_RUNS.replace_all(&t, |caps: &Captures| {
        caps[0].chars().next().map(String::from).unwrap_or_default()
    });

    t.split_whitespace().collect::<Vec<_>>().join(" ")
}
