use docrag_core::traits::Synthesizer;
use docrag_core::types::NO_ANSWER;
use docrag_core::Result;

use crate::generator::{truncate_to_budget, TextGenerator};
use crate::prompt::{is_empty_extract, map_prompt, reduce_prompt, stuff_prompt};

/// Answer synthesis over a text generator.
///
/// When every passage fits in one prompt the generator is called once.
/// Otherwise each passage is mapped to its question-relevant extract and the
/// surviving extracts are reduced into the final answer.
pub struct MapReduceSynthesizer<G> {
    generator: G,
}

impl<G: TextGenerator> MapReduceSynthesizer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    fn budget_for(&self, template_tokens: usize) -> usize {
        self.generator.max_input_tokens().saturating_sub(template_tokens)
    }

    fn map(&self, question: &str, passage: &str) -> Result<Option<String>> {
        let budget = self.budget_for(self.generator.count_tokens(&map_prompt(question, "")));
        let passage = truncate_to_budget(&self.generator, passage, budget);
        let extract = self.generator.generate(&map_prompt(question, &passage))?;
        Ok(if is_empty_extract(&extract) { None } else { Some(extract.trim().to_string()) })
    }

    fn reduce(&self, question: &str, extracts: &[String]) -> Result<String> {
        let budget = self.budget_for(self.generator.count_tokens(&reduce_prompt(question, &[])));
        let per_extract = budget / extracts.len().max(1);
        let fitted: Vec<String> = extracts
            .iter()
            .map(|e| truncate_to_budget(&self.generator, e, per_extract))
            .collect();
        self.generator.generate(&reduce_prompt(question, &fitted))
    }
}

/// Generated text is passed through untouched; only blank output becomes
/// the sentinel.
fn finalize(answer: String) -> String {
    if answer.trim().is_empty() {
        NO_ANSWER.to_string()
    } else {
        answer
    }
}

impl<G: TextGenerator> Synthesizer for MapReduceSynthesizer<G> {
    fn synthesize(&self, question: &str, passages: &[String]) -> Result<String> {
        let stuffed = stuff_prompt(question, passages);
        if self.generator.count_tokens(&stuffed) <= self.generator.max_input_tokens() {
            tracing::debug!(passages = passages.len(), "single-pass synthesis");
            return Ok(finalize(self.generator.generate(&stuffed)?));
        }

        tracing::debug!(passages = passages.len(), "map-reduce synthesis");
        let mut extracts = Vec::with_capacity(passages.len());
        for passage in passages {
            if let Some(extract) = self.map(question, passage)? {
                extracts.push(extract);
            }
        }
        if extracts.is_empty() {
            return Ok(NO_ANSWER.to_string());
        }
        Ok(finalize(self.reduce(question, &extracts)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Word-counting generator that replays canned replies and records prompts.
    struct Scripted {
        max_input: usize,
        replies: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(max_input: usize, replies: &[&str]) -> Self {
            Self {
                max_input,
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Scripted {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            Ok(self.replies.lock().pop().unwrap_or_default())
        }
        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
        fn max_input_tokens(&self) -> usize {
            self.max_input
        }
    }

    #[test]
    fn short_context_uses_one_call() {
        let synth = MapReduceSynthesizer::new(Scripted::new(1000, &["Paris"]));
        let passages = vec!["Paris is the capital of France.".to_string()];
        let answer = synth.synthesize("capital of France?", &passages).unwrap();
        assert_eq!(answer, "Paris");
        let prompts = synth.generator().prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Paris is the capital of France."));
    }

    #[test]
    fn long_context_maps_then_reduces() {
        let long = "word ".repeat(60);
        let passages = vec![long.clone(), long.clone(), long];
        let replies = ["first extract", "NONE", "third extract", "final"];
        let synth = MapReduceSynthesizer::new(Scripted::new(100, &replies));
        let answer = synth.synthesize("what?", &passages).unwrap();
        assert_eq!(answer, "final");
        let prompts = synth.generator().prompts.lock();
        assert_eq!(prompts.len(), 4);
        assert!(prompts.iter().all(|p| p.split_whitespace().count() <= 100));
        assert!(prompts[3].contains("first extract"));
        assert!(prompts[3].contains("third extract"));
        assert!(!prompts[3].contains("NONE"));
    }

    #[test]
    fn all_irrelevant_extracts_yield_sentinel() {
        let long = "word ".repeat(80);
        let synth = MapReduceSynthesizer::new(Scripted::new(50, &["NONE", "  "]));
        let answer = synth.synthesize("what?", &[long.clone(), long]).unwrap();
        assert_eq!(answer, NO_ANSWER);
        assert_eq!(synth.generator().prompts.lock().len(), 2);
    }

    #[test]
    fn generated_text_is_returned_verbatim() {
        let synth = MapReduceSynthesizer::new(Scripted::new(1000, &["  Paris, France.\n"]));
        let answer = synth.synthesize("capital?", &["Paris is in France.".into()]).unwrap();
        assert_eq!(answer, "  Paris, France.\n");

        let long = "word ".repeat(60);
        let replies = ["extract", "NONE", " final answer "];
        let synth = MapReduceSynthesizer::new(Scripted::new(100, &replies));
        assert_eq!(synth.synthesize("what?", &[long.clone(), long]).unwrap(), " final answer ");
    }

    #[test]
    fn blank_generation_yields_sentinel() {
        let synth = MapReduceSynthesizer::new(Scripted::new(1000, &["   \n"]));
        assert_eq!(synth.synthesize("anything?", &[]).unwrap(), NO_ANSWER);
    }
}
