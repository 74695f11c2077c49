use albumcat::config::Config;
use albumcat::job::{discover_jobs, OUTPUT_DIR_NAME};
use albumcat::manifest::{Manifest, TrackSet};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use tempfile::TempDir;

fn create_test_library(albums: usize, tracks_per_album: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for a in 0..albums {
        let album = root.join(format!("Artist {} - Album {}", a % 17, a));
        fs::create_dir_all(&album).unwrap();

        for t in 0..tracks_per_album {
            // Mix of extensions and casing, plus the usual non-audio clutter
            let ext = ["mp3", "FLAC", "m4a", "ogg", "wav"][t % 5];
            fs::write(album.join(format!("{:02} Track's Name.{}", t + 1, ext)), "").unwrap();
        }
        fs::write(album.join("cover.jpg"), "").unwrap();
        fs::write(album.join("rip.log"), "").unwrap();
    }

    temp_dir
}

fn bench_discover(c: &mut Criterion) {
    let library = create_test_library(200, 0);
    let output_dir = library.path().join(OUTPUT_DIR_NAME);

    c.bench_function("discover_200_albums", |b| {
        b.iter(|| {
            let jobs = discover_jobs(library.path(), &output_dir, "m4a").unwrap();
            black_box(jobs);
        });
    });
}

fn bench_scan_tracks(c: &mut Criterion) {
    let library = create_test_library(1, 300);
    let album = discover_jobs(library.path(), &library.path().join(OUTPUT_DIR_NAME), "m4a")
        .unwrap()
        .remove(0);
    let extensions = Config::default().extensions;

    c.bench_function("scan_300_tracks", |b| {
        b.iter(|| {
            let tracks = TrackSet::scan(&album.source_dir, &extensions).unwrap();
            black_box(tracks);
        });
    });

    let tracks = TrackSet::scan(&album.source_dir, &extensions).unwrap();
    c.bench_function("render_300_track_manifest", |b| {
        b.iter(|| black_box(Manifest::render(&tracks)));
    });
}

criterion_group!(benches, bench_discover, bench_scan_tracks);
criterion_main!(benches);
