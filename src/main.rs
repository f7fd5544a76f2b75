mod audio;
mod cli;
mod config;
mod encode;
mod error;
mod render;
mod report;
mod visualizer;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

use audio::capture::Capture;
use audio::decibel;
use audio::features::BeatEvent;
use audio::transform::Transform;
use cli::Cli;
use config::Config;
use encode::ffmpeg::{EncodeSettings, FfmpegEncoder};
use render::effects::EFFECT_KINDS;
use report::RunReport;
use visualizer::Visualizer;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    if cli.list_effects {
        println!("Available effects:");
        for (name, description) in EFFECT_KINDS {
            println!("  {:<14} {}", name, description);
        }
        return Ok(());
    }

    let mut config = match config::locate_config(cli.config.clone()) {
        Some(path) => {
            let loaded = config::load_config(&path)?;
            log::info!("Loaded config from {}", path.display());
            loaded
        }
        None => Config::default(),
    };
    apply_cli(&cli, &mut config);

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("beatglow - audio-reactive panel visualizer");
    log::info!("Input: {}", input.display());

    // 1. Decode; the file's rate replaces the configured one
    let recording = audio::decode::decode_file(input)?;
    config.audio.sample_rate = recording.sample_rate;
    let sample_count = config.audio.sample_count;
    let tick_secs = config.audio.tick_ms() / 1000.0;
    let total_ticks = recording.window_count(sample_count);
    log::info!(
        "Decoded {} channel(s) at {} Hz, downmixed to mono",
        recording.channels,
        recording.sample_rate
    );
    log::info!(
        "Window: {} samples ({:.2} ms), {} ticks, {:.1}s",
        sample_count,
        config.audio.tick_ms(),
        total_ticks,
        recording.duration_secs()
    );

    // 2. Core components, validated once
    let start = Instant::now();
    let to_db = decibel::full_scale(sample_count, config.spectrum.max_db);
    let mut visualizer =
        Visualizer::new(&config, to_db, start).context("Invalid configuration")?;
    let mut transform = Transform::new(sample_count);
    let mut report = cli
        .report
        .as_ref()
        .map(|_| RunReport::new(input, &config, visualizer.analyzer()));

    // 3. Encoder
    let mut encoder = if cli.no_video {
        None
    } else {
        let settings = EncodeSettings {
            width: config.output.width,
            height: config.output.height,
            scale: config.output.scale,
            frame_rate: format!("{}/{}", recording.sample_rate, sample_count),
            codec: config.output.codec.clone(),
            crf: config.output.crf,
        };
        log::info!("Output: {}", cli.output.display());
        Some(FfmpegEncoder::new(&cli.output, input, &settings)?)
    };

    // 4. Tick loop, paced by the capture queue
    let capture = Capture::spawn(recording.samples, sample_count)?;
    let pb = ProgressBar::new(total_ticks as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ticks ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    let mut tick: u64 = 0;
    let mut beats: u64 = 0;
    while let Some(window) = capture.next_window() {
        // virtual clock: beat spacing follows the audio, not render speed
        let now = start + Duration::from_secs_f64(tick as f64 * tick_secs);
        let magnitudes = transform.process(&window);
        let beat = visualizer.tick(magnitudes, now);
        let spectrum = visualizer.analyzer().spectrum();
        log::trace!(
            "Tick {}: beat probability {:.3}, running level {:.2} dB, loudest band {:.3}",
            tick,
            beat.probability,
            spectrum.running_level(),
            spectrum.raw().iter().copied().fold(0.0f32, f32::max)
        );

        if beat.beat {
            beats += 1;
            log::debug!(
                "Beat at {:.3}s (p = {:.2})",
                tick as f64 * tick_secs,
                beat.probability
            );
            if let Some(report) = report.as_mut() {
                report.record_beat(BeatEvent {
                    tick,
                    time: tick as f64 * tick_secs,
                    probability: beat.probability,
                });
            }
        }

        if let Some(encoder) = encoder.as_mut() {
            encoder.write_frame(visualizer.frame())?;
        }
        tick += 1;
        pb.set_position(tick);
    }
    pb.finish_with_message("Rendering complete");

    let sent = capture.finish()?;
    if sent as u64 != tick {
        log::warn!("Capture sent {} windows but {} were processed", sent, tick);
    }

    // 5. Finish outputs
    if let Some(encoder) = encoder {
        log::info!("Finishing encoding...");
        encoder.finish()?;
    }
    if let (Some(mut report), Some(path)) = (report, cli.report.as_ref()) {
        report.finish(tick, tick_secs);
        if let Some(bpm) = report.beats_per_minute() {
            log::info!("Average beat rate: {:.1} per minute", bpm);
        }
        report.write(path)?;
    }

    log::info!("Done: {} ticks, {} beats", tick, beats);
    Ok(())
}

/// CLI values left at their defaults defer to the config file.
fn apply_cli(cli: &Cli, config: &mut Config) {
    if cli.width != 64 { config.output.width = cli.width; }
    if cli.height != 32 { config.output.height = cli.height; }
    if cli.scale != 8 { config.output.scale = cli.scale; }
    if cli.crf != 18 { config.output.crf = cli.crf; }
    if cli.codec != "libx264" { config.output.codec = cli.codec.clone(); }
    if cli.bands != 32 { config.spectrum.bands = cli.bands; }
    if cli.no_agc { config.spectrum.agc = false; }
    if let Some(policy) = cli.beat_policy {
        config.beat.policy = policy;
    }
}
