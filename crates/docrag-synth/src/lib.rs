//! Answer synthesizer: turns a question and retrieved passages into a
//! natural-language answer.
//!
//! The production path runs a local T5 model through a stuff / map-reduce
//! prompt strategy. `ExtractiveSynthesizer` needs no weights and backs
//! development setups and tests.

use std::sync::Arc;

use docrag_core::config::SynthesisSettings;
use docrag_core::traits::Synthesizer;
use docrag_core::Result;

pub mod extractive;
pub mod generator;
pub mod map_reduce;
pub mod prompt;
pub mod t5;

pub use extractive::ExtractiveSynthesizer;
pub use generator::TextGenerator;
pub use map_reduce::MapReduceSynthesizer;
pub use t5::T5Generator;

/// Build the synthesizer selected by `settings`.
pub fn load_synthesizer(settings: &SynthesisSettings) -> Result<Arc<dyn Synthesizer>> {
    if settings.use_fake {
        tracing::info!("using extractive synthesizer");
        return Ok(Arc::new(ExtractiveSynthesizer));
    }
    let generator = T5Generator::load(
        &settings.model_dir,
        settings.max_new_tokens,
        settings.max_input_tokens,
    )?;
    Ok(Arc::new(MapReduceSynthesizer::new(generator)))
}
