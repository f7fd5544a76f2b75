use std::time::Instant;

use crate::audio::analysis::Analyzer;
use crate::audio::beat::BeatOutput;
use crate::audio::decibel::DecibelFn;
use crate::config::Config;
use crate::error::ConfigError;
use crate::render::{EffectPipeline, FrameBuffer};

/// Analysis and effect chain, advanced together one audio window at a time.
pub struct Visualizer {
    analyzer: Analyzer,
    pipeline: EffectPipeline,
}

impl Visualizer {
    /// Validates `config` and builds every component once.
    pub fn new(config: &Config, to_db: DecibelFn, start: Instant) -> Result<Self, ConfigError> {
        config.validate()?;
        let analyzer = Analyzer::new(config, to_db, start)?;

        let (width, height) = (config.output.width, config.output.height);
        let mut pipeline = EffectPipeline::new(width, height);
        for (index, effect) in config.effect_chain().iter().enumerate() {
            let (effect, routing) = effect.build(index, width, height)?;
            pipeline.push_routed(effect, routing);
        }
        log::info!(
            "Visualizer: {}x{}, {} bands, {} effect(s)",
            width,
            height,
            analyzer.spectrum().layout().len(),
            pipeline.len()
        );

        Ok(Self { analyzer, pipeline })
    }

    /// One tick: analyze `magnitudes` as of `now`, then render a frame.
    pub fn tick(&mut self, magnitudes: &[f32], now: Instant) -> BeatOutput {
        let beat = self.analyzer.update(magnitudes, now);
        self.pipeline.render(&self.analyzer.frame());
        beat
    }

    pub fn frame(&self) -> &FrameBuffer {
        self.pipeline.output()
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decibel;
    use crate::config::EffectConfig;
    use crate::render::Pixel;
    use std::time::Duration;

    #[test]
    fn default_chain_draws_bars() {
        let config = Config::default();
        let start = Instant::now();
        let mut visualizer = Visualizer::new(&config, decibel::full_scale(512, 120.0), start).unwrap();
        let magnitudes = vec![40.0; 512];
        for tick in 1..=5 {
            visualizer.tick(&magnitudes, start + Duration::from_millis(11 * tick));
        }
        let frame = visualizer.frame();
        assert_eq!((frame.width(), frame.height()), (64, 32));
        assert!(frame.pixels().iter().any(|p| *p != Pixel::BLACK));
    }

    #[test]
    fn silence_stays_dark() {
        let mut config = Config::default();
        config.effects = vec![
            EffectConfig::Fill {
                color: [0.0, 0.0, 0.0],
                routing: None,
            },
            EffectConfig::Spectrum {
                mode: Default::default(),
                rotate: false,
                routing: None,
            },
        ];
        let start = Instant::now();
        let mut visualizer = Visualizer::new(&config, decibel::full_scale(512, 120.0), start).unwrap();
        let silence = vec![0.0; 512];
        for tick in 1..=20 {
            let beat = visualizer.tick(&silence, start + Duration::from_millis(11 * tick));
            assert!(!beat.beat);
        }
        assert!(visualizer.frame().pixels().iter().all(|p| *p == Pixel::BLACK));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = Config::default();
        config.output.width = 0;
        assert!(matches!(
            Visualizer::new(&config, Box::new(|m: f32| m), Instant::now()),
            Err(ConfigError::FrameSize { .. })
        ));
    }
}
