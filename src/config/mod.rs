mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./reelplay.toml",
        "~/.config/reelplay/config.toml",
        "/etc/reelplay/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.film.video_frame_rate <= 0 {
        anyhow::bail!(
            "Film video frame rate must be positive, got {}",
            config.film.video_frame_rate
        );
    }
    if config.film.audio_frame_rate == 0 {
        anyhow::bail!("Film audio frame rate cannot be 0");
    }
    if config.film.audio_channels == 0 {
        anyhow::bail!("Film must have at least one audio channel");
    }

    let preroll = config.playback.preroll_secs;
    if !preroll.is_finite() || preroll < 0.0 {
        anyhow::bail!("Pre-roll must be a non-negative number of seconds, got {}", preroll);
    }

    if let Some(reduction) = config.playback.forced_reduction {
        if reduction > 5 {
            tracing::warn!("Forced reduction {} discards every resolution level", reduction);
        }
    }

    Ok(())
}
