use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use kidquiz_core::audio::{PcmBuffer, CHANNELS, SAMPLE_RATE};
use kidquiz_core::parser::parse_quiz_str;
use kidquiz_core::traits::EncodedAudio;

/// Base64 of a 16-bit sawtooth lasting `secs` seconds.
fn encoded_clip(secs: usize) -> EncodedAudio {
    let frames = SAMPLE_RATE as usize * secs;
    let mut bytes = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let sample = ((i % 512) as i16 - 256) * 100;
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    EncodedAudio(STANDARD.encode(bytes))
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_pcm");

    for secs in [1usize, 5, 20] {
        let clip = encoded_clip(secs);
        group.bench_with_input(BenchmarkId::from_parameter(secs), &clip, |b, clip| {
            b.iter(|| PcmBuffer::decode(black_box(clip)))
        });
    }

    let raw: Vec<u8> = (0..SAMPLE_RATE * 5)
        .flat_map(|i| ((i % 1000) as i16).to_le_bytes())
        .collect();
    group.bench_function("pcm16_only_5s", |b| {
        b.iter(|| PcmBuffer::from_pcm16_le(black_box(&raw), SAMPLE_RATE, CHANNELS))
    });

    group.finish();
}

fn bench_quiz_parsing(c: &mut Criterion) {
    let quiz = large_quiz(200);
    c.bench_function("parse_quiz_200", |b| {
        b.iter(|| parse_quiz_str(black_box(&quiz), std::path::Path::new("bench.toml")))
    });
}

fn large_quiz(n: usize) -> String {
    let mut s = String::from("[quiz]\ntopic = \"Bench\"\ntimer_secs = 10\n");
    for i in 0..n {
        s.push_str(&format!(
            r#"
[[questions]]
id = "q{i}"
text = "Câu hỏi số {i}?"
options = ["A{i}", "B{i}", "C{i}", "D{i}"]
correct = {}
"#,
            i % 4
        ));
    }
    s
}

criterion_group!(benches, bench_decode, bench_quiz_parsing);
criterion_main!(benches);
