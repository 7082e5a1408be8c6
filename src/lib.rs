//! Reelplay - decode and playback synchronization for digital-cinema packages
//!
//! This library crate walks the reels of a package's playlist and turns them
//! into timestamped picture, sound, text and object-audio events.
//!
//! # Modules
//!
//! - `content` - The output film and the content descriptor of a package
//! - `events` - Typed events and the `EventSink` that receives them
//! - `decoder` - Per-essence decoder parts and the `Decoder` trait
//! - `dcp_decoder` - The reel-walking decoder with pre-roll seeking
//! - `referenced` - Trimming of assets referenced by a new package
//! - `session` - Packages described by TOML manifests
//! - `config` - TOML configuration

pub mod config;
pub mod content;
pub mod dcp_decoder;
pub mod decoder;
pub mod error;
pub mod events;
pub mod referenced;
pub mod session;

pub use content::{DcpContent, Film, TextType, VideoFrameType};
pub use dcp_decoder::DcpDecoder;
pub use error::{Error, Result};
pub use events::{EventLog, EventSink, NullSink};
pub use referenced::{referenced_reel_assets, trim_referenced_reels, ReferencedReelAsset};
