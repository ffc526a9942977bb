//! Lexical relevance gating for retrieved chunks.
//!
//! Cosine similarity of short, topic-varied administrative snippets is not
//! calibrated well enough for a fixed numeric cutoff, so relevance is decided
//! lexically: query tokens are expanded through a synonym/stem table and a
//! chunk counts as relevant when it contains an expanded keyword as a
//! substring. The substring-overlap expansion covers Russian morphological
//! variants without a full analyzer.

use std::collections::HashSet;
use tracing::debug;

/// Synonym/stem table for admissions queries. Keys and variants are matched
/// as substrings in either direction.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("пода", &["подач", "подать", "подавать", "способ", "прием", "принятие"]),
    ("документ", &["документы", "бумаг", "документаци", "справк", "заявлени"]),
    ("прием", &["принятие", "подача", "поступлени", "зачислени"]),
    ("когда", &["срок", "дата", "время", "период", "начало", "конец", "до"]),
    ("нужн", &["необходим", "требу", "обязательн", "надо", "следует"]),
    ("как", &["каким образом", "каким способом", "способ", "где", "куда"]),
    ("гимназ", &["гимназия", "гимназии", "гимназист", "школ"]),
    ("бакалавр", &["бакалавриат", "бакалавра", "первое высшее"]),
    ("специал", &["специалитет", "специальность", "направлени"]),
    ("магистр", &["магистратура", "магистерск", "второе высшее"]),
    ("вступительн", &["экзамен", "испытани", "тест", "егэ", "баллы"]),
    ("очн", &["очная", "очное", "очного", "дневн"]),
    ("заочн", &["заочная", "заочное", "дистанционн", "удаленн"]),
    ("форма", &["формат", "формы", "форме", "способ"]),
    ("обучени", &["учеб", "образовани", "учиться", "подготовк"]),
    ("стоимост", &["цена", "оплат", "платн", "бюджет"]),
    ("льгот", &["скидк", "преимуществ", "особые права", "квот"]),
    ("общежити", &["жиль", "прожива", "комнат", "место"]),
    ("адрес", &["находит", "расположен", "где", "как добраться"]),
    ("контакт", &["телефон", "почта", "email", "связаться"]),
];

/// Tokens at or below this length carry no signal (particles, prepositions).
const MIN_TOKEN_CHARS: usize = 3;

/// Lexical relevance gate with query expansion.
#[derive(Debug, Clone)]
pub struct RelevanceGate {
    /// Minimum expanded-keyword matches for a chunk to count as relevant.
    /// 1 deliberately favors recall.
    min_matches: usize,
}

impl RelevanceGate {
    /// Create a gate with the default threshold of one keyword match.
    pub fn new() -> Self {
        Self { min_matches: 1 }
    }

    /// Override the match threshold (clamped to at least 1).
    pub fn with_min_matches(mut self, min_matches: usize) -> Self {
        self.min_matches = min_matches.max(1);
        self
    }

    /// Expand a query into its deduplicated keyword set.
    ///
    /// Tokenizes by whitespace, lower-cases, drops short tokens, then unions
    /// in synonym variants for every table key overlapping a token.
    pub fn expand_keywords(&self, query: &str) -> Vec<String> {
        let query_words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|word| word.chars().count() >= MIN_TOKEN_CHARS)
            .map(String::from)
            .collect();

        let mut seen = HashSet::new();
        let mut expanded = Vec::new();
        let mut push = |keyword: &str| {
            if seen.insert(keyword.to_string()) {
                expanded.push(keyword.to_string());
            }
        };

        for word in &query_words {
            push(word);
            for (key, variants) in SYNONYMS {
                if word.contains(key) || key.contains(word.as_str()) {
                    for variant in *variants {
                        push(variant);
                    }
                }
            }
        }

        expanded
    }

    /// Decide whether the chunk set contains genuinely relevant information.
    ///
    /// Purely lexical; vector similarity scores play no part. An empty chunk
    /// list or an empty expanded keyword set is never relevant.
    pub fn is_relevant(&self, chunks: &[String], query: &str) -> bool {
        if chunks.is_empty() {
            return false;
        }

        let keywords = self.expand_keywords(query);
        if keywords.is_empty() {
            return false;
        }

        debug!(keywords = keywords.len(), "expanded query keywords");

        let relevant = chunks
            .iter()
            .filter(|chunk| {
                let chunk_lower = chunk.to_lowercase();
                let matches = keywords.iter().filter(|kw| chunk_lower.contains(kw.as_str())).count();
                matches >= self.min_matches
            })
            .count();

        debug!(relevant, total = chunks.len(), "relevance gate result");
        relevant > 0
    }
}

impl Default for RelevanceGate {
    fn default() -> Self {
        Self::new()
    }
}
