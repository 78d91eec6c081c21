//! Benchmarks for the GeoSnap extraction and export pipeline.
//!
//! Run with: cargo bench -p geosnap-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geosnap_core::export::{serializer_for, ExportFormat};
use geosnap_core::pipeline::{CoordinateConverter, Extractor, GpsBlock, ImageSource, TagValue};
use geosnap_core::{Config, Coordinate, CoordinateSet};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

fn survey(n: usize) -> CoordinateSet {
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            Coordinate::new(
                format!("DJI_{i:04}.JPG"),
                47.0 + t * 0.01,
                8.5 - t * 0.02,
            )
        })
        .collect()
}

fn benchmark_convert(c: &mut Criterion) {
    let block = GpsBlock {
        latitude: Some(TagValue::Rationals(vec![(47, 1), (22, 1), (3887, 100)])),
        latitude_ref: Some(TagValue::Text("N".to_string())),
        longitude: Some(TagValue::Rationals(vec![(8, 1), (32, 1), (3999, 1000)])),
        longitude_ref: Some(TagValue::Text("E".to_string())),
    };

    c.bench_function("convert_dms", |b| {
        b.iter(|| {
            let _ = CoordinateConverter::convert(black_box(&block), "DJI_0001.JPG");
        })
    });
}

fn benchmark_serializers(c: &mut Criterion) {
    let coords = survey(1000);

    for format in ExportFormat::ALL {
        let serializer = serializer_for(format);
        c.bench_function(&format!("serialize_{format}_1000"), |b| {
            b.iter(|| {
                let _ = serializer.serialize(black_box(&coords), "coordinates");
            })
        });
    }
}

fn benchmark_extract_batch(c: &mut Criterion) {
    let mut jpeg = Vec::new();
    DynamicImage::new_rgb8(640, 480)
        .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();
    let batch: Vec<ImageSource> = (0..64)
        .map(|i| ImageSource::from_bytes(format!("{i}.jpg"), jpeg.clone()))
        .collect();

    let extractor = Extractor::new(&Config::default());
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("extract_batch_64_untagged", |b| {
        b.iter(|| {
            let _ = rt.block_on(extractor.extract(black_box(batch.clone())));
        })
    });
}

criterion_group!(
    benches,
    benchmark_convert,
    benchmark_serializers,
    benchmark_extract_batch
);
criterion_main!(benches);
