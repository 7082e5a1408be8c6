//! A package described by a TOML manifest, ready to play.
//!
//! The manifest is a package manifest for the in-memory library with an
//! optional `[content]` table describing how the package is used:
//!
//! ```toml
//! [content]
//! cpl = "cpl-feature"
//! kdm = true
//! trim_start = 1.5
//! reference_audio = true
//! frame_type = "three_d_left_right"
//! ```

use crate::content::{AudioContent, DcpContent, Film, VideoFrameType};
use anyhow::{Context, Result};
use reelplay_media::memory::{MemoryLibrary, PackageManifest};
use reelplay_media::{ContentTime, DcpTime, DecryptedKdm, DecryptionKey, PackageLibrary};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
struct SessionManifest {
    #[serde(default)]
    content: ContentManifest,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentManifest {
    /// Playlist to play; the first one when unset.
    #[serde(default)]
    pub cpl: Option<String>,

    /// Issue key material for the selected playlist from the reel keys.
    #[serde(default)]
    pub kdm: bool,

    /// Seconds trimmed from the start.
    #[serde(default)]
    pub trim_start: f64,

    /// Seconds trimmed from the end.
    #[serde(default)]
    pub trim_end: f64,

    /// Seconds into the film where the content starts.
    #[serde(default)]
    pub position: f64,

    #[serde(default)]
    pub reference_video: bool,

    #[serde(default)]
    pub reference_audio: bool,

    #[serde(default)]
    pub reference_open_subtitle: bool,

    #[serde(default)]
    pub reference_closed_caption: bool,

    #[serde(default)]
    pub frame_type: Option<VideoFrameType>,

    #[serde(default)]
    pub audio_delay_ms: i32,
}

/// A library holding one package and the content that plays it.
#[derive(Debug)]
pub struct Session {
    pub library: MemoryLibrary,
    pub content: DcpContent,
}

/// Load the manifest at `path` and examine its package.
pub fn load_session(path: &Path, tolerant: bool) -> Result<Session> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let package = PackageManifest::parse(&text)
        .with_context(|| format!("Failed to parse package in manifest: {:?}", path))?;
    let session: SessionManifest = toml::from_str(&text)
        .with_context(|| format!("Failed to parse content in manifest: {:?}", path))?;

    let settings = session.content;
    let kdm = if settings.kdm {
        issue_kdm(&package, settings.cpl.as_deref())
    } else {
        None
    };

    let directory = package.directory.clone();
    let mut library = MemoryLibrary::new();
    library.insert(&directory, package.into_package());

    let mut content = DcpContent::new(vec![asset_map(&directory)]);
    content.kdm = kdm;
    content.video = settings.frame_type.map(|frame_type| crate::content::VideoContent {
        frame_type,
        ..Default::default()
    });
    content.audio = Some(AudioContent {
        streams: Vec::new(),
        delay_ms: settings.audio_delay_ms,
    });

    let cpls = library
        .find_and_resolve_cpls(&content.directories(), tolerant)
        .with_context(|| format!("Failed to resolve package in {:?}", directory))?;
    let cpl = match &settings.cpl {
        Some(id) => cpls
            .iter()
            .find(|c| &c.id == id)
            .with_context(|| format!("No CPL {} in {:?}", id, directory))?,
        None => cpls
            .first()
            .with_context(|| format!("No CPLs in {:?}", directory))?,
    };
    content.examine(cpl);

    content.trim_start = ContentTime::from_seconds(settings.trim_start);
    content.trim_end = ContentTime::from_seconds(settings.trim_end);
    content.position = DcpTime::from_seconds(settings.position);
    content.reference_video = settings.reference_video;
    content.reference_audio = settings.reference_audio;
    content.reference_open_subtitle = settings.reference_open_subtitle;
    content.reference_closed_caption = settings.reference_closed_caption;

    tracing::debug!(
        "Loaded CPL {} with {} reels from {:?}",
        cpl.id,
        cpl.reels.len(),
        path
    );

    Ok(Session { library, content })
}

impl Session {
    /// Length of the content in `film`, once trimmed.
    pub fn length(&self, film: &Film) -> DcpTime {
        self.content.length_after_trim(film)
    }
}

fn asset_map(directory: &Path) -> PathBuf {
    directory.join("ASSETMAP.xml")
}

/// Key material unlocking every keyed reel of the chosen playlist.
fn issue_kdm(package: &PackageManifest, cpl: Option<&str>) -> Option<DecryptedKdm> {
    let manifest = match cpl {
        Some(id) => package.cpl.iter().find(|c| c.id == id)?,
        None => package.cpl.first()?,
    };
    let mut kdm = DecryptedKdm::new(format!("kdm-{}", manifest.id), &manifest.id);
    for key in manifest.reel.iter().filter_map(|r| r.key.as_ref()) {
        kdm = kdm.with_key(&key.id, DecryptionKey::new(key.value));
    }
    Some(kdm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TextType;
    use std::io::Write;

    const MANIFEST: &str = r#"
directory = "/dcp/feature"

[content]
kdm = true
trim_start = 0.5
reference_audio = true

[[cpl]]
id = "cpl-feature"

[[cpl.reel]]
id = "r1"
picture = 48
sound = 48
channels = 2
key = { id = "k1", value = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16] }

[[cpl.reel.subtitle]]
text = "Hello"
in = 0.5
out = 1.5
"#;

    #[test]
    fn test_load_session() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let session = load_session(file.path(), false).unwrap();
        let content = &session.content;
        assert!(content.encrypted);
        assert!(content.can_be_played());
        assert_eq!(content.kdm.as_ref().unwrap().cpl_id(), "cpl-feature");
        assert!(content.reference_audio);
        assert_eq!(content.trim_start, ContentTime::from_seconds(0.5));
        assert_eq!(content.text[0].text_type, TextType::OpenSubtitle);
        assert_eq!(content.directories(), vec![PathBuf::from("/dcp/feature")]);
        assert_eq!(session.length(&Film::default()), DcpTime::from_seconds(1.5));
    }

    #[test]
    fn test_missing_cpl_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.replace("kdm = true", "cpl = \"other\"").as_bytes())
            .unwrap();
        let err = load_session(file.path(), false).unwrap_err();
        assert!(err.to_string().contains("No CPL other"));
    }
}
