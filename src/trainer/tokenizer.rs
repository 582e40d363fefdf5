//! Word-level tokenizer with an out-of-vocabulary token.
//!
//! Fits a vocabulary by descending word frequency (ties broken by first
//! appearance), index 1 reserved for the OOV token and 0 for padding.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const OOV_TOKEN: &str = "<OOV>";
const OOV_INDEX: usize = 1;

/// Characters stripped before splitting on whitespace.
const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokenizer {
    pub oov_token: String,
    /// word -> 1-based index; the OOV token maps to 1, real words start at 2.
    pub word_index: BTreeMap<String, usize>,
}

/// Lowercase, strip filter characters, split on whitespace.
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if FILTERS.contains(c) { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

impl Tokenizer {
    /// Build the vocabulary from the training texts.
    pub fn fit(texts: &[String]) -> Self {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut seen = 0usize;
        for text in texts {
            for word in words(text) {
                let entry = counts.entry(word).or_insert_with(|| {
                    seen += 1;
                    (0, seen)
                });
                entry.0 += 1;
            }
        }

        let mut ordered: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ordered.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

        let mut word_index = BTreeMap::new();
        word_index.insert(OOV_TOKEN.to_string(), OOV_INDEX);
        for (i, (word, _)) in ordered.into_iter().enumerate() {
            word_index.insert(word, OOV_INDEX + 1 + i);
        }

        Self {
            oov_token: OOV_TOKEN.to_string(),
            word_index,
        }
    }

    /// Number of entries in the word index, OOV token included.
    pub fn vocab_len(&self) -> usize {
        self.word_index.len()
    }

    /// Map texts to index sequences; unknown words become the OOV index.
    pub fn sequences(&self, texts: &[String]) -> Vec<Vec<usize>> {
        texts
            .iter()
            .map(|text| {
                words(text)
                    .iter()
                    .map(|w| self.word_index.get(w).copied().unwrap_or(OOV_INDEX))
                    .collect()
            })
            .collect()
    }
}

/// Pad sequences with trailing zeros to the longest length.
pub fn pad_post(sequences: &[Vec<usize>]) -> (Vec<Vec<usize>>, usize) {
    let max_len = sequences.iter().map(Vec::len).max().unwrap_or(0);
    let padded = sequences
        .iter()
        .map(|seq| {
            let mut row = seq.clone();
            row.resize(max_len, 0);
            row
        })
        .collect();
    (padded, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn most_frequent_word_gets_lowest_real_index() {
        let tok = Tokenizer::fit(&texts(&["hola hola hola que", "que tal"]));
        assert_eq!(tok.word_index[OOV_TOKEN], 1);
        assert_eq!(tok.word_index["hola"], 2);
        assert_eq!(tok.word_index["que"], 3);
        assert_eq!(tok.word_index["tal"], 4);
    }

    #[test]
    fn punctuation_and_case_are_normalized() {
        let tok = Tokenizer::fit(&texts(&["Hola, buenos dias!"]));
        let seqs = tok.sequences(&texts(&["HOLA... buenos"]));
        assert_eq!(seqs[0].len(), 2);
        assert!(seqs[0].iter().all(|&i| i > 1));
    }

    #[test]
    fn unknown_words_map_to_oov() {
        let tok = Tokenizer::fit(&texts(&["hola"]));
        let seqs = tok.sequences(&texts(&["desconocida"]));
        assert_eq!(seqs[0], vec![1]);
    }

    #[test]
    fn pad_post_appends_zeros() {
        let (padded, max_len) = pad_post(&[vec![2, 3, 4], vec![5]]);
        assert_eq!(max_len, 3);
        assert_eq!(padded[1], vec![5, 0, 0]);
    }

    #[test]
    fn serializes_round_trip() {
        let tok = Tokenizer::fit(&texts(&["hola que tal"]));
        let json = serde_json::to_string(&tok).unwrap();
        let back: Tokenizer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.word_index, tok.word_index);
    }
}
