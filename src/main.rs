mod cli;

use reelplay::{
    config,
    decoder::Decoder,
    events::{ContentAtmos, ContentAudio, ContentBitmapText, ContentStringText, ContentVideo, EventSink},
    referenced, session, DcpDecoder,
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use reelplay_media::ContentTime;
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelplay=debug,reelplay_media=debug".to_string()
        } else {
            "reelplay=info,reelplay_media=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Play {
            manifest,
            seek,
            accurate,
            limit,
        } => play(&manifest, cli.config.as_deref(), seek, accurate, limit),
        Commands::Reels { manifest } => list_reels(&manifest, cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

/// Prints one line per event.
#[derive(Default)]
struct PrintSink {
    events: usize,
}

impl EventSink for PrintSink {
    fn video(&mut self, video: ContentVideo) {
        self.events += 1;
        println!(
            "video  frame {:>6} {:?} {:?} ({} bytes)",
            video.frame,
            video.eyes,
            video.part,
            video.image.data.len()
        );
    }

    fn audio(&mut self, stream: usize, audio: ContentAudio) {
        self.events += 1;
        println!(
            "audio  frame {:>6} stream {} {}x{}",
            audio.frame,
            stream,
            audio.audio.channels(),
            audio.audio.frames()
        );
    }

    fn plain_text(&mut self, text: ContentStringText) {
        self.events += 1;
        let lines: Vec<&str> = text.subs.iter().map(|s| s.text.as_str()).collect();
        println!(
            "text   {} - {} {:?} {:?}",
            text.period.from,
            text.period.to,
            text.text_type,
            lines
        );
    }

    fn bitmap_text(&mut self, text: ContentBitmapText) {
        self.events += 1;
        println!(
            "image  {} - {} {:?} {}x{}",
            text.period.from, text.period.to, text.text_type, text.image.width, text.image.height
        );
    }

    fn atmos(&mut self, atmos: ContentAtmos) {
        self.events += 1;
        println!("atmos  frame {:>6} ({} bytes)", atmos.frame, atmos.data.len());
    }
}

fn play(
    manifest: &Path,
    config_path: Option<&Path>,
    seek: Option<f64>,
    accurate: bool,
    limit: Option<usize>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let film = config.film.film();
    let session = session::load_session(manifest, config.playback.tolerant)?;

    tracing::info!("Playing {:?} at {} fps", manifest, film.video_frame_rate);

    let mut decoder = DcpDecoder::new(
        &session.library,
        &film,
        Arc::new(session.content),
        config.playback.tolerant,
        None,
    )?;
    decoder.set_preroll(config.playback.preroll());
    decoder.set_forced_reduction(config.playback.forced_reduction);
    decoder.set_decode_referenced(config.playback.decode_referenced)?;

    let mut sink = PrintSink::default();
    if let Some(seconds) = seek {
        decoder.seek(ContentTime::from_seconds(seconds), accurate, &mut sink)?;
    }

    let mut passes = 0;
    while limit.map_or(true, |l| passes < l) {
        if decoder.pass(&mut sink)?.is_exhausted() {
            break;
        }
        passes += 1;
    }

    tracing::info!(
        "{} passes, {} events, stopped at {}",
        passes,
        sink.events,
        decoder.elapsed()
    );
    Ok(())
}

fn list_reels(manifest: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let film = config.film.film();
    let session = session::load_session(manifest, config.playback.tolerant)?;
    let content = Arc::new(session.content);

    let decoder = DcpDecoder::new(
        &session.library,
        &film,
        Arc::clone(&content),
        config.playback.tolerant,
        None,
    )?;

    println!("CPL: {}", content.cpl.as_deref().unwrap_or("-"));
    println!("Digest: {}", decoder.lazy_digest());
    for (i, reel) in decoder.reels().iter().enumerate() {
        println!("  [{}] {} ({} frames)", i, reel.id, reel.duration());
        if let Some(picture) = &reel.main_picture {
            println!("      picture {} from {}", picture.id, picture.entry_point_or_zero());
        }
        if let Some(sound) = &reel.main_sound {
            println!("      sound {} from {}", sound.id, sound.entry_point_or_zero());
        }
        if let Some(subtitle) = &reel.main_subtitle {
            println!("      subtitle {}", subtitle.id);
        }
        for caption in &reel.closed_captions {
            println!("      closed caption {}", caption.id);
        }
        if let Some(atmos) = &reel.atmos {
            println!("      atmos {}", atmos.id);
        }
    }

    for font in decoder.fonts() {
        println!("Font: {} ({} bytes)", font.id, font.data.len());
    }

    if content.references_anything() {
        let assets = referenced::trim_referenced_reels(&film, &content, decoder.reels())?;
        println!("\nReferenced assets: {}", assets.len());
        for asset in assets {
            println!(
                "  {} {} entry {} duration {} at {} - {}",
                asset.asset.kind(),
                asset.asset.id(),
                asset.asset.entry_point(),
                asset.asset.duration(),
                asset.period.from,
                asset.period.to
            );
        }
    }

    Ok(())
}

fn validate_config(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    println!("Configuration is valid");
    println!(
        "Film: {} fps, {} Hz, {} channels",
        config.film.video_frame_rate, config.film.audio_frame_rate, config.film.audio_channels
    );
    println!("Pre-roll: {}s", config.playback.preroll_secs);
    Ok(())
}
