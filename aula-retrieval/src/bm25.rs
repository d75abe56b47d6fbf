//! BM25 over the current candidate set.
//!
//! Document frequency is measured only against the candidates being
//! re-ranked, never a global corpus. That localized IDF is a deliberate
//! approximation: BM25 here re-ranks an already-filtered shortlist, it
//! never does first-pass retrieval, so corpus-wide statistics buy nothing.

use std::collections::HashMap;

/// `k1` controls term-frequency saturation, `b` length normalization.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Spanish + English stopwords dropped before scoring.
const STOPWORDS: &[&str] = &[
    // Spanish
    "de", "la", "el", "los", "las", "un", "una", "unos", "unas", "del", "al", "en", "es", "son",
    "para", "por", "con", "se", "que", "su", "sus", "mi", "tu", "lo", "le", "me", "te", "ya",
    "si", "no", "este", "esta", "estos", "estas", "hay", "mas", "más", "pero", "muy",
    // English
    "the", "a", "an", "and", "or", "of", "in", "on", "at", "to", "for", "with", "is", "are",
    "was", "be", "been", "this", "that", "these", "those", "it", "its", "from", "by", "as",
    "do", "does",
];

fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        _ => c,
    }
}

/// Lowercase, fold diacritics, split on non-alphanumerics, drop stopwords
/// and single characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(fold_char)
        .collect::<String>()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| t.len() >= 2 && !STOPWORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Raw BM25 scores for every document against the query tokens.
///
/// Scores are non-negative and unnormalized; the ranker max-normalizes
/// them. An empty query or empty candidate list yields all zeros.
pub fn score_all(query_tokens: &[String], documents: &[Vec<String>], params: Bm25Params) -> Vec<f64> {
    let n = documents.len();
    if n == 0 || query_tokens.is_empty() {
        return vec![0.0; n];
    }

    let avg_len: f64 = documents.iter().map(|d| d.len() as f64).sum::<f64>() / n as f64;

    // Document frequency per query term, over this candidate set only.
    let mut df: HashMap<&str, usize> = HashMap::new();
    for term in query_tokens {
        let count = documents
            .iter()
            .filter(|doc| doc.iter().any(|t| t == term))
            .count();
        df.insert(term.as_str(), count);
    }

    documents
        .iter()
        .map(|doc| {
            if doc.is_empty() {
                return 0.0;
            }
            let len_norm = 1.0 - params.b + params.b * (doc.len() as f64 / avg_len.max(1e-9));
            query_tokens
                .iter()
                .map(|term| {
                    let tf = doc.iter().filter(|t| *t == term).count() as f64;
                    if tf == 0.0 {
                        return 0.0;
                    }
                    let dfi = df[term.as_str()] as f64;
                    let idf = (1.0 + (n as f64 - dfi + 0.5) / (dfi + 0.5)).ln();
                    idf * (tf * (params.k1 + 1.0)) / (tf + params.k1 * len_norm)
                })
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<Vec<String>> {
        texts.iter().map(|t| tokenize(t)).collect()
    }

    #[test]
    fn tokenizer_folds_accents_and_drops_stopwords() {
        // "está" folds to the stopword "esta" and is dropped with "la"/"de".
        let tokens = tokenize("¿Dónde está la Biblioteca de Ingeniería?");
        assert_eq!(tokens, vec!["donde", "biblioteca", "ingenieria"]);
    }

    #[test]
    fn matching_document_outscores_unrelated() {
        let query = tokenize("horario biblioteca");
        let documents = docs(&[
            "la biblioteca abre en horario continuado",
            "el gimnasio requiere reserva previa",
        ]);
        let scores = score_all(&query, &documents, Bm25Params::default());
        assert!(scores[0] > scores[1]);
        assert!(scores[1] >= 0.0);
    }

    #[test]
    fn rare_terms_weigh_more_than_common_ones() {
        // "biblioteca" appears in every candidate, "anexo" in one.
        let query = tokenize("biblioteca anexo");
        let documents = docs(&[
            "biblioteca central",
            "biblioteca norte",
            "biblioteca con anexo de revistas",
        ]);
        let scores = score_all(&query, &documents, Bm25Params::default());
        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(best, 2);
    }

    #[test]
    fn empty_inputs_score_zero() {
        let empty: Vec<String> = vec![];
        assert!(score_all(&empty, &docs(&["algo"]), Bm25Params::default())
            .iter()
            .all(|&s| s == 0.0));
        assert!(score_all(&tokenize("algo"), &[], Bm25Params::default()).is_empty());
    }

    #[test]
    fn term_frequency_saturates() {
        let query = tokenize("wifi");
        let documents = docs(&[
            "wifi",
            "wifi wifi wifi wifi wifi wifi wifi wifi wifi wifi",
        ]);
        let scores = score_all(&query, &documents, Bm25Params::default());
        // More repetitions help, but sublinearly: far less than 10×.
        assert!(scores[1] > scores[0] * 0.9);
        assert!(scores[1] < scores[0] * 3.0);
    }
}
