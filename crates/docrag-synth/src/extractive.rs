use std::collections::HashSet;

use docrag_core::traits::Synthesizer;
use docrag_core::types::NO_ANSWER;
use docrag_core::Result;

/// Model-free synthesizer for development and tests: answers with the
/// passage sentence sharing the most terms with the question.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractiveSynthesizer;

fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| t.len() > 2)
}

fn sentences(passage: &str) -> impl Iterator<Item = &str> {
    passage.split_inclusive(['.', '!', '?', '\n']).map(str::trim).filter(|s| !s.is_empty())
}

impl Synthesizer for ExtractiveSynthesizer {
    fn synthesize(&self, question: &str, passages: &[String]) -> Result<String> {
        let wanted: HashSet<String> = terms(question).collect();
        let mut best: Option<(usize, &str)> = None;
        for sentence in passages.iter().flat_map(|p| sentences(p)) {
            let overlap = terms(sentence).collect::<HashSet<_>>().intersection(&wanted).count();
            // First sentence wins ties, keeping retrieval order meaningful.
            if overlap > 0 && best.map_or(true, |(score, _)| overlap > score) {
                best = Some((overlap, sentence));
            }
        }
        Ok(best.map_or_else(|| NO_ANSWER.to_string(), |(_, s)| s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_best_overlapping_sentence() {
        let passages = vec![
            "The weather is mild. Paris is the capital of France.".to_string(),
            "Berlin is in Germany.".to_string(),
        ];
        let answer =
            ExtractiveSynthesizer.synthesize("What is the capital of France?", &passages).unwrap();
        assert_eq!(answer, "Paris is the capital of France.");
    }

    #[test]
    fn no_passages_or_overlap_yields_sentinel() {
        assert_eq!(ExtractiveSynthesizer.synthesize("anything?", &[]).unwrap(), NO_ANSWER);
        let passages = vec!["Completely unrelated words here.".to_string()];
        let answer = ExtractiveSynthesizer.synthesize("capital of France?", &passages).unwrap();
        assert_eq!(answer, NO_ANSWER);
    }
}
