//! Benchmark manifest rewriting on realistic playlist sizes.
//!
//! Measures:
//! - a small master playlist (a handful of variants)
//! - a two-hour media playlist with relative segment URIs
//! - the same media playlist with absolute, tokenized segment URIs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hlsrelay_media::{ManifestRewriter, RelayUrls};

const BASE_URL: &str = "https://cdn.example/hls/tt0137523/";
const REFERER: &str = "https://player.example/";

fn master_playlist() -> String {
    let mut out = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");
    for (bw, res) in [(800_000, "640x360"), (1_400_000, "842x480"), (2_800_000, "1280x720"), (5_000_000, "1920x1080")] {
        out.push_str(&format!("#EXT-X-STREAM-INF:BANDWIDTH={bw},RESOLUTION={res}\n"));
        out.push_str(&format!("{res}/index.m3u8\n"));
    }
    out
}

fn media_playlist(segments: usize, absolute: bool) -> String {
    let mut out = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n#EXT-X-MEDIA-SEQUENCE:0\n");
    for i in 0..segments {
        out.push_str("#EXTINF:6.006,\n");
        if absolute {
            out.push_str(&format!(
                "https://edge{}.cdn.example/hls/tt0137523/720p/seg-{i:05}.ts?token=9f8e7d6c5b4a&expires=1700000000\n",
                i % 4
            ));
        } else {
            out.push_str(&format!("seg-{i:05}.ts\n"));
        }
    }
    out.push_str("#EXT-X-ENDLIST\n");
    out
}

fn bench_manifest_rewrite(c: &mut Criterion) {
    let rewriter = ManifestRewriter::new(RelayUrls::new("https://relay.example"));
    let master = master_playlist();
    // Two hours of 6s segments.
    let relative = media_playlist(1200, false);
    let absolute = media_playlist(1200, true);

    let mut group = c.benchmark_group("manifest_rewrite");

    group.bench_function("master", |b| {
        b.iter(|| rewriter.rewrite(black_box(&master), BASE_URL, REFERER));
    });

    group.bench_function("media_relative_1200", |b| {
        b.iter(|| rewriter.rewrite(black_box(&relative), BASE_URL, REFERER));
    });

    group.bench_function("media_absolute_1200", |b| {
        b.iter(|| rewriter.rewrite(black_box(&absolute), BASE_URL, REFERER));
    });

    group.finish();
}

criterion_group!(benches, bench_manifest_rewrite);
criterion_main!(benches);
