//! Reelplay-Media: time model, reel/asset model and the package-library seam
//!
//! This crate holds everything playback needs to know about a digital-cinema
//! package without knowing how it is stored on disk.
//!
//! # Modules
//!
//! - `time` - Content and output time axes (96kHz ticks) and their periods
//! - `frame_rate` - Frame-rate change between a content and the output
//! - `audio` - Multi-channel float buffers and packed PCM24 unpacking
//! - `asset` - Asset traits and per-asset frame readers
//! - `reel` - Reels, reel assets and playlists (CPLs)
//! - `key` - Decrypted key material
//! - `package` - The `PackageLibrary` trait that resolves playlists
//! - `memory` - Synthetic in-memory library for tests and demos
//!
//! # Architecture
//!
//! A `PackageLibrary` turns directories into resolved `Cpl`s. Each reel of
//! a CPL holds optional picture, sound, subtitle, closed-caption and
//! object-audio assets, each placed by an entry point and a duration into
//! its underlying file. Readers opened on an asset return frame `n` of that
//! file; the caller adds the entry point.

pub mod asset;
pub mod audio;
pub mod error;
pub mod frame_rate;
pub mod key;
pub mod memory;
pub mod package;
pub mod reel;
pub mod time;

pub use asset::{
    Asset, AtmosAsset, BoxedFrameReader, FontData, FrameReader, HAlign, PictureAsset, PictureKind,
    Size, SoundAsset, StereoPictureFrame, Subtitle, SubtitleAsset, SubtitleImage, SubtitleString,
    VAlign,
};
pub use audio::{unpack_pcm24, AudioBuffers};
pub use error::{Error, Result};
pub use frame_rate::{about_equal, FrameRateChange};
pub use key::{DecryptedKdm, DecryptionKey};
pub use package::PackageLibrary;
pub use reel::{
    Cpl, Reel, ReelAsset, ReelAtmosAsset, ReelPictureAsset, ReelSoundAsset, ReelTextAsset,
};
pub use time::{ContentTime, ContentTimePeriod, DcpTime, DcpTimePeriod, HZ};
