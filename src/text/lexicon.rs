//! Incitement lexeme matching.
//!
//! A fixed set of violence-encouraging lexemes in Latin transliteration,
//! Arabizi shorthand, and Arabic script. Each matching pattern adds a small
//! fixed bonus to the fused score, capped well below any action threshold —
//! the heuristic nudges borderline classifier scores, it never convicts on
//! its own.

use regex::RegexBuilder;

/// Bonus added per distinct matching pattern.
const PER_PATTERN_BONUS: f64 = 0.07;

/// Ceiling on the total heuristic bonus.
const MAX_BONUS: f64 = 0.2;

/// Curated with the moderator team. Arabizi stems cover common verb
/// conjugations via `\w*` suffixes.
const LEXEMES: &[&str] = &[
    // Arabizi & English stems (violence verbs / weapons)
    r"\b[nty]?(dreb|darb)\w*",                             // dreb, ndrebouhom, tderbo...
    r"\b(n9?tel|nqtel|n9tlo|nqtlo|nqtl)\w*",               // n9tlhom, nqtlkom...
    r"\b(7rq|hrq|7erq|hreq)\w*",                           // 7rqou, hreqhom...
    r"\b(ksr|kassr|ksro|ksrou)\w*",                        // ksrouhum...
    r"\b(t3awno\w*\s+td?erb\w*)",                          // t3awno ... tderbo
    r"\b(hajm|hajmo|hajmou|hajmo(h|)om|hajmou(h|)om)\w*",  // hajmohom (attack)
    r"\b(syof|syouf|sayf|seif|sif|sword|swords)\b",
    r"\b(hit|kill|attack|smash|burn|molotov)\b",
    r"\b(weapon|weapons|knife|knives|gun|guns|bottle)\b",
    // Arabic verbs/nouns (violence/incitement)
    r"نقتل|نحرق|إ?حرق|اضرب(?:و?هم)?|كسرو(?:هم)?|دير(?:\s)?العنف",
    r"هاجم(?:و?هم)?|هجم(?:و?هم)?",
    r"سيف|سيوف|سلِّ?حوا|تسلَّ?حوا",
    r"سكين|سكاكين|مطواة|خنجر|هراوة|عصي|حجر|حجارة|قنبلة|مولوتوف",
];

/// Compiled incitement lexeme set.
pub struct Lexicon {
    patterns: Vec<regex::Regex>,
}

impl Lexicon {
    /// Compile the fixed lexeme set.
    pub fn new() -> Self {
        let patterns = LEXEMES
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .unwrap()
            })
            .collect();
        Self { patterns }
    }

    /// Heuristic bonus for `text`: `PER_PATTERN_BONUS` per pattern that
    /// matches anywhere, capped at `MAX_BONUS`. A pattern counts once no
    /// matter how often it matches.
    pub fn bonus(&self, text: &str) -> f64 {
        let mut bonus = 0.0;
        for pattern in &self.patterns {
            if pattern.is_match(text) {
                bonus += PER_PATTERN_BONUS;
            }
        }
        bonus.min(MAX_BONUS)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn benign_text_scores_zero() {
        let lex = Lexicon::new();
        assert_eq!(lex.bonus("salam, kif dayr lyoum?"), 0.0);
        assert_eq!(lex.bonus(""), 0.0);
    }

    #[test]
    fn single_pattern_adds_fixed_bonus() {
        let lex = Lexicon::new();
        assert!(close(lex.bonus("they will kill us"), 0.07));
        assert!(close(lex.bonus("سيف"), 0.07));
    }

    #[test]
    fn same_pattern_counts_once() {
        let lex = Lexicon::new();
        // hit/kill/attack are alternatives of one pattern.
        assert!(close(lex.bonus("hit kill attack"), 0.07));
    }

    #[test]
    fn distinct_patterns_accumulate() {
        let lex = Lexicon::new();
        assert!(close(lex.bonus("kill them with a knife"), 0.14));
    }

    #[test]
    fn bonus_is_capped() {
        let lex = Lexicon::new();
        // Four distinct patterns would be 0.28 uncapped.
        let bonus = lex.bonus("kill them, grab a knife and a sword, ndrebouhom");
        assert!(close(bonus, 0.2));
    }

    #[test]
    fn bonus_is_monotone_in_matches() {
        let lex = Lexicon::new();
        let one = lex.bonus("kill");
        let two = lex.bonus("kill knife");
        let three = lex.bonus("kill knife sword");
        assert!(one <= two && two <= three);
        assert!(three <= 0.2);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let lex = Lexicon::new();
        assert!(close(lex.bonus("KILL"), 0.07));
    }

    #[test]
    fn arabizi_conjugations_match_stems() {
        let lex = Lexicon::new();
        assert!(lex.bonus("ndrebouhom") > 0.0);
        assert!(lex.bonus("7rqou dakchi") > 0.0);
    }
}
