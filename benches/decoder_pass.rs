//! Benchmarks for the package decoder
//!
//! Tests throughput of frame-by-frame passes and of pre-roll seeks over a
//! synthetic multi-reel package.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reelplay::content::{AudioContent, AudioStream, TextContent, VideoContent};
use reelplay::decoder::{Decoder, Pass};
use reelplay::{DcpContent, DcpDecoder, Film, NullSink, TextType};
use reelplay_media::memory::{MemoryLibrary, MemoryPackage, MemoryReel};
use reelplay_media::{unpack_pcm24, ContentTime, Subtitle, SubtitleString};
use std::path::PathBuf;
use std::sync::Arc;

const DIR: &str = "/dcp/bench";

/// A package of `reels` reels, each a minute long with a cue every second.
fn library(reels: usize, channels: usize) -> MemoryLibrary {
    let frames = 24 * 60;
    let cues: Vec<Subtitle> = (0..60)
        .map(|s| {
            Subtitle::String(SubtitleString::new(
                format!("cue {s}"),
                ContentTime::from_seconds(s as f64),
                ContentTime::from_seconds(s as f64 + 0.8),
            ))
        })
        .collect();
    let reels = (0..reels)
        .map(|i| {
            MemoryReel::new(format!("r{i}"))
                .picture(frames)
                .sound(frames, channels)
                .subtitle(frames, cues.clone())
        })
        .collect();

    let mut library = MemoryLibrary::new();
    library.insert(DIR, MemoryPackage::new().cpl("cpl-bench", reels));
    library
}

fn content(channels: usize) -> Arc<DcpContent> {
    Arc::new(DcpContent {
        paths: vec![PathBuf::from(DIR).join("ASSETMAP.xml")],
        video: Some(VideoContent {
            frame_rate: Some(24.0),
            ..Default::default()
        }),
        audio: Some(AudioContent {
            streams: vec![AudioStream {
                frame_rate: 48_000,
                channels,
            }],
            delay_ms: 0,
        }),
        text: vec![TextContent::new(TextType::OpenSubtitle)],
        ..Default::default()
    })
}

fn bench_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("pass");
    let film = Film::default();

    for channels in [2usize, 6, 16] {
        let library = library(1, channels);
        let mut decoder =
            DcpDecoder::new(&library, &film, content(channels), false, None).unwrap();

        group.bench_with_input(
            BenchmarkId::new("one_second", channels),
            &channels,
            |b, _| {
                b.iter(|| {
                    decoder
                        .seek(ContentTime::default(), true, &mut NullSink)
                        .unwrap();
                    for _ in 0..24 {
                        black_box(decoder.pass(&mut NullSink).unwrap());
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_seek(c: &mut Criterion) {
    let mut group = c.benchmark_group("seek");
    let film = Film::default();
    let library = library(10, 6);
    let mut decoder = DcpDecoder::new(&library, &film, content(6), false, None).unwrap();

    for target in [0.5f64, 59.5, 540.0] {
        group.bench_with_input(
            BenchmarkId::new("preroll", target),
            &target,
            |b, &target| {
                b.iter(|| {
                    decoder
                        .seek(ContentTime::from_seconds(target), true, &mut NullSink)
                        .unwrap();
                    black_box(decoder.pass(&mut NullSink).unwrap() == Pass::Continued)
                })
            },
        );
    }

    group.finish();
}

fn bench_reuse(c: &mut Criterion) {
    let film = Film::default();
    let library = library(10, 6);
    let old = DcpDecoder::new(&library, &film, content(6), false, None).unwrap();

    c.bench_function("construct/reused_reels", |b| {
        b.iter(|| DcpDecoder::new(&library, &film, content(6), false, Some(&old)).unwrap())
    });
}

fn bench_unpack(c: &mut Criterion) {
    let mut group = c.benchmark_group("unpack_pcm24");
    for channels in [6usize, 16] {
        let data = vec![0x5au8; 2000 * channels * 3];
        group.bench_with_input(BenchmarkId::from_parameter(channels), &data, |b, data| {
            b.iter(|| unpack_pcm24(black_box(data), channels))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pass, bench_seek, bench_reuse, bench_unpack);
criterion_main!(benches);
