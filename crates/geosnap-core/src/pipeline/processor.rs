//! Extraction orchestration: batch in, ordered coordinates and report out.
//!
//! Each item runs reader + converter on the blocking pool, bounded by a
//! semaphore. Handles are awaited in input order, so the resulting
//! [`CoordinateSet`] is ordered by construction and no re-sorting is needed.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::{Config, ProcessingConfig};
use crate::error::ExtractError;
use crate::types::{
    Coordinate, CoordinateSet, ExtractProgress, ExtractionReport, ItemOutcome, ItemStatus,
    SkipReason,
};

use super::convert::{CoordinateConverter, GpsBlock};
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::metadata::MetadataReader;
use super::validate::Validator;

/// Cancellation token shared between the caller and a running batch.
pub type CancellationToken = Arc<AtomicBool>;

/// Create a fresh, unset cancellation token.
pub fn cancellation_token() -> CancellationToken {
    Arc::new(AtomicBool::new(false))
}

/// Check if cancellation has been requested.
#[inline]
pub fn is_cancelled(token: &CancellationToken) -> bool {
    token.load(Ordering::SeqCst)
}

/// Where an item's bytes come from.
#[derive(Debug, Clone)]
pub enum SourceData {
    /// Read lazily from disk on a worker; `size` is reused for the size
    /// limit when discovery already stat'ed the file
    Path { path: PathBuf, size: Option<u64> },
    /// Already in memory (uploads, archive members)
    Bytes(Arc<[u8]>),
}

/// One batch item: display name plus a way to get its bytes.
#[derive(Debug, Clone)]
pub struct ImageSource {
    /// Display file name, used in reports and exports
    pub name: String,
    pub data: SourceData,
}

impl ImageSource {
    /// A file on disk, named after its final path component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            name,
            data: SourceData::Path { path, size: None },
        }
    }

    /// An in-memory image.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            data: SourceData::Bytes(bytes.into()),
        }
    }
}

impl From<DiscoveredFile> for ImageSource {
    fn from(file: DiscoveredFile) -> Self {
        Self {
            name: file.name,
            data: SourceData::Path {
                path: file.path,
                size: Some(file.size),
            },
        }
    }
}

/// Frozen result of one batch.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Coordinates in input order
    pub coordinates: CoordinateSet,
    /// Per-item outcomes and counts
    pub report: ExtractionReport,
}

/// The extraction orchestrator.
pub struct Extractor {
    processing: ProcessingConfig,
    validator: Validator,
    discovery: FileDiscovery,
    timeout: Duration,
}

impl Extractor {
    /// Create a new extractor with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            processing: config.processing.clone(),
            validator: Validator::new(config.limits.clone()),
            discovery: FileDiscovery::new(config.processing.clone()),
            timeout: Duration::from_millis(config.limits.decode_timeout_ms),
        }
    }

    /// Discover the batch for a list of input paths.
    pub fn discover(&self, paths: &[PathBuf]) -> crate::error::ExtractResult<Vec<ImageSource>> {
        Ok(self
            .discovery
            .discover_all(paths)?
            .into_iter()
            .map(ImageSource::from)
            .collect())
    }

    /// Extract a batch without progress reporting or cancellation.
    pub async fn extract(&self, batch: Vec<ImageSource>) -> Extraction {
        self.extract_with(batch, None, |_| {}).await
    }

    /// Extract a batch.
    ///
    /// Per-item failures become skip reasons in the report; nothing here fails
    /// the batch. `on_progress` fires once per finished item, from worker
    /// tasks, in completion order.
    ///
    /// When `cancel` is set mid-batch, no further items start and the result
    /// holds only the contiguous prefix of items that had finished.
    pub async fn extract_with<F>(
        &self,
        batch: Vec<ImageSource>,
        cancel: Option<CancellationToken>,
        on_progress: F,
    ) -> Extraction
    where
        F: Fn(ExtractProgress) + Send + Sync + 'static,
    {
        let total = batch.len();
        let start = std::time::Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.processing.parallel_workers.max(1)));
        let on_progress = Arc::new(on_progress);
        let finished = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(total);

        for source in batch {
            if cancel.as_ref().is_some_and(is_cancelled) {
                break;
            }
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Extraction semaphore closed unexpectedly, stopping batch");
                    break;
                }
            };
            // Cancellation may have arrived while waiting for a slot
            if cancel.as_ref().is_some_and(is_cancelled) {
                break;
            }

            let name = source.name.clone();
            let processing = self.processing.clone();
            let validator = self.validator.clone();
            let timeout = self.timeout;
            let on_progress = on_progress.clone();
            let finished = finished.clone();

            let handle = tokio::spawn(async move {
                let result = run_bounded(permit, timeout, move || {
                    extract_one(&processing, &validator, &source)
                })
                .await;
                let processed = finished.fetch_add(1, Ordering::SeqCst) + 1;
                on_progress(ExtractProgress { processed, total });
                result
            });
            handles.push((name, handle));
        }

        let mut cancelled = handles.len() < total;
        let mut coordinates = Vec::new();
        let mut items = Vec::with_capacity(handles.len());

        for (index, (filename, handle)) in handles.into_iter().enumerate() {
            if !cancelled && cancel.as_ref().is_some_and(is_cancelled) {
                cancelled = true;
            }
            // After cancellation only already-finished items extend the prefix
            if cancelled && (items.len() != index || !handle.is_finished()) {
                handle.abort();
                continue;
            }

            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(SkipReason::UnreadableImage(format!(
                    "extraction task panicked: {e}"
                ))),
            };

            let status = match result {
                Ok(coordinate) => {
                    tracing::debug!(
                        "Extracted {}: ({}, {})",
                        filename,
                        coordinate.latitude,
                        coordinate.longitude
                    );
                    let status = ItemStatus::Extracted {
                        latitude: coordinate.latitude,
                        longitude: coordinate.longitude,
                    };
                    coordinates.push(coordinate);
                    status
                }
                Err(reason) => {
                    match reason {
                        SkipReason::UnsupportedExtension | SkipReason::NoGpsData => {
                            tracing::debug!("Skipped {}: {}", filename, reason)
                        }
                        _ => tracing::warn!("Skipped {}: {}", filename, reason),
                    }
                    ItemStatus::Skipped(reason)
                }
            };
            items.push(ItemOutcome {
                index,
                filename,
                status,
            });
        }

        let succeeded = coordinates.len();
        let report = ExtractionReport {
            total,
            processed: items.len(),
            succeeded,
            skipped: items.len() - succeeded,
            cancelled,
            items,
        };

        if cancelled {
            tracing::warn!(
                "Extraction cancelled after {}/{} items",
                report.processed,
                total
            );
        }
        if report.is_empty() {
            tracing::warn!("No GPS coordinates found in {} items", report.processed);
        }
        tracing::debug!(
            "Batch done in {:?}: {} succeeded, {} skipped",
            start.elapsed(),
            report.succeeded,
            report.skipped
        );

        Extraction {
            coordinates: CoordinateSet::from(coordinates),
            report,
        }
    }
}

/// Run `work` on the blocking pool with a deadline.
///
/// The permit moves into the blocking closure, so a timed-out item keeps its
/// concurrency slot until the read really ends.
async fn run_bounded<F>(
    permit: OwnedSemaphorePermit,
    timeout: Duration,
    work: F,
) -> Result<Coordinate, SkipReason>
where
    F: FnOnce() -> Result<Coordinate, SkipReason> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || {
        let result = work();
        drop(permit);
        result
    });
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(SkipReason::UnreadableImage(format!(
            "extraction task failed: {e}"
        ))),
        Err(_) => Err(SkipReason::UnreadableImage(format!(
            "timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

/// Run reader + converter for one item.
fn extract_one(
    processing: &ProcessingConfig,
    validator: &Validator,
    source: &ImageSource,
) -> Result<Coordinate, SkipReason> {
    if !processing.accepts(&source.name) {
        return Err(SkipReason::UnsupportedExtension);
    }

    let owned;
    let bytes: &[u8] = match &source.data {
        SourceData::Bytes(bytes) => bytes,
        SourceData::Path { path, size } => {
            let size = match size {
                Some(size) => *size,
                None => std::fs::metadata(path)
                    .map_err(|e| SkipReason::UnreadableImage(format!("cannot stat file: {e}")))?
                    .len(),
            };
            validator
                .check_size(size)
                .map_err(SkipReason::UnreadableImage)?;
            owned = std::fs::read(path)
                .map_err(|e| SkipReason::UnreadableImage(format!("cannot read file: {e}")))?;
            &owned
        }
    };

    validator
        .validate(bytes)
        .map_err(SkipReason::UnreadableImage)?;

    let tags = match MetadataReader::read(bytes, &source.name) {
        Ok(Some(tags)) => tags,
        Ok(None) => return Err(SkipReason::NoGpsData),
        Err(ExtractError::UnreadableImage { message, .. }) => {
            return Err(SkipReason::UnreadableImage(message))
        }
        Err(ExtractError::MalformedCoordinate { message, .. }) => {
            return Err(SkipReason::Malformed(message))
        }
        Err(e) => return Err(SkipReason::UnreadableImage(e.to_string())),
    };

    let block = GpsBlock::from_tags(&tags).ok_or(SkipReason::NoGpsData)?;
    CoordinateConverter::convert(&block, &source.name).map_err(|e| match e {
        ExtractError::MalformedCoordinate { message, .. } => SkipReason::Malformed(message),
        other => SkipReason::Malformed(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use crate::test_utils;
    use exif::Tag;
    use std::sync::Mutex;

    fn extractor(workers: usize) -> Extractor {
        let mut config = Config::default();
        config.processing.parallel_workers = workers;
        Extractor::new(&config)
    }

    fn missing_lat_ref_jpeg() -> Vec<u8> {
        test_utils::jpeg_with_fields(&[
            test_utils::gps_field(
                Tag::GPSLatitude,
                test_utils::dms([(3, 1), (0, 1), (0, 1)]),
            ),
            test_utils::gps_ref(Tag::GPSLongitudeRef, "E"),
            test_utils::gps_field(
                Tag::GPSLongitude,
                test_utils::dms([(4, 1), (0, 1), (0, 1)]),
            ),
        ])
    }

    fn zero_denominator_jpeg() -> Vec<u8> {
        test_utils::jpeg_with_fields(&[
            test_utils::gps_ref(Tag::GPSLatitudeRef, "N"),
            test_utils::gps_field(
                Tag::GPSLatitude,
                test_utils::dms([(10, 1), (30, 0), (0, 1)]),
            ),
            test_utils::gps_ref(Tag::GPSLongitudeRef, "E"),
            test_utils::gps_field(
                Tag::GPSLongitude,
                test_utils::dms([(20, 1), (0, 1), (0, 1)]),
            ),
        ])
    }

    #[tokio::test]
    async fn test_mixed_batch_report() {
        let batch = vec![
            ImageSource::from_bytes("A.jpg", test_utils::geotagged_jpeg(1, "N", 2, "E")),
            ImageSource::from_bytes("B.jpg", test_utils::plain_jpeg()),
            ImageSource::from_bytes("C.jpg", missing_lat_ref_jpeg()),
        ];

        let result = extractor(2).extract(batch).await;

        let coords: Vec<_> = result.coordinates.iter().cloned().collect();
        assert_eq!(coords, vec![Coordinate::new("A.jpg", 1.0, 2.0)]);

        let report = &result.report;
        assert_eq!(report.total, 3);
        assert_eq!(report.processed, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.skipped, 2);
        assert!(!report.cancelled);

        let skipped: Vec<_> = report.skipped_items().collect();
        assert_eq!(skipped[0], ("B.jpg", &SkipReason::NoGpsData));
        assert_eq!(skipped[1].0, "C.jpg");
        assert!(matches!(skipped[1].1, SkipReason::Malformed(msg) if msg.contains("hemisphere")));
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let n = 6;
        let k = 3;
        let batch: Vec<_> = (0..n)
            .map(|i| {
                let bytes = if i == k {
                    zero_denominator_jpeg()
                } else {
                    test_utils::geotagged_jpeg(i as u32, "N", 10, "W")
                };
                ImageSource::from_bytes(format!("img{i}.jpg"), bytes)
            })
            .collect();

        let result = extractor(3).extract(batch).await;

        assert_eq!(result.coordinates.len(), n - 1);
        let names: Vec<_> = result.coordinates.iter().map(|c| c.filename.clone()).collect();
        assert_eq!(
            names,
            vec!["img0.jpg", "img1.jpg", "img2.jpg", "img4.jpg", "img5.jpg"]
        );
        assert_eq!(result.report.skipped, 1);
        let skipped = &result.report.items[k];
        assert_eq!(skipped.index, k);
        assert!(matches!(
            &skipped.status,
            ItemStatus::Skipped(SkipReason::Malformed(msg)) if msg.contains("zero denominator")
        ));
    }

    #[tokio::test]
    async fn test_order_preserved_under_parallelism() {
        // Item 0 is read from disk with a large tail so it finishes after the
        // in-memory items behind it.
        let dir = tempfile::TempDir::new().unwrap();
        let slow = dir.path().join("00.jpg");
        let mut bytes = test_utils::geotagged_jpeg(0, "S", 100, "E");
        bytes.resize(bytes.len() + 48 * 1024 * 1024, 0);
        std::fs::write(&slow, bytes).unwrap();

        let mut batch = vec![ImageSource::from_path(&slow)];
        batch.extend((1..12).map(|i| {
            ImageSource::from_bytes(
                format!("{i:02}.jpg"),
                test_utils::geotagged_jpeg(i, "S", 100 + i, "E"),
            )
        }));

        let result = extractor(4).extract(batch).await;

        let lats: Vec<f64> = result.coordinates.iter().map(|c| c.latitude).collect();
        let expected: Vec<f64> = (0..12).map(|i| -(i as f64)).collect();
        assert_eq!(lats, expected);
        assert_eq!(result.coordinates.iter().next().unwrap().filename, "00.jpg");
        for (i, item) in result.report.items.iter().enumerate() {
            assert_eq!(item.index, i);
        }
    }

    #[tokio::test]
    async fn test_timed_out_item_keeps_its_slot() {
        let semaphore = Arc::new(Semaphore::new(1));
        let permit = semaphore.clone().acquire_owned().await.unwrap();

        let result = run_bounded(permit, Duration::from_millis(10), || {
            std::thread::sleep(Duration::from_millis(300));
            Err(SkipReason::NoGpsData)
        })
        .await;

        assert!(matches!(
            result,
            Err(SkipReason::UnreadableImage(msg)) if msg.contains("timed out")
        ));
        assert_eq!(semaphore.available_permits(), 0);

        let permit = tokio::time::timeout(Duration::from_secs(5), semaphore.acquire_owned())
            .await
            .unwrap();
        assert!(permit.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_exif_is_malformed() {
        let batch = vec![ImageSource::from_bytes(
            "corrupt.jpg",
            test_utils::jpeg_with_corrupt_exif(),
        )];

        let result = extractor(1).extract(batch).await;

        assert!(matches!(
            &result.report.items[0].status,
            ItemStatus::Skipped(SkipReason::Malformed(msg)) if msg.contains("EXIF")
        ));
    }

    #[tokio::test]
    async fn test_same_file_name_in_subdirectories_stays_distinct() {
        let dir = tempfile::TempDir::new().unwrap();
        for (sub, lat) in [("flight1", 1), ("flight2", 2)] {
            let sub = dir.path().join(sub);
            std::fs::create_dir(&sub).unwrap();
            std::fs::write(
                sub.join("DJI_0001.JPG"),
                test_utils::geotagged_jpeg(lat, "N", 5, "E"),
            )
            .unwrap();
        }

        let mut config = Config::default();
        config.processing.recursive = true;
        let extractor = Extractor::new(&config);
        let batch = extractor.discover(&[dir.path().to_path_buf()]).unwrap();
        let result = extractor.extract(batch).await;

        let coords: Vec<_> = result.coordinates.iter().cloned().collect();
        assert_eq!(
            coords,
            vec![
                Coordinate::new("flight1/DJI_0001.JPG", 1.0, 5.0),
                Coordinate::new("flight2/DJI_0001.JPG", 2.0, 5.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_discovered_size_drives_the_limit() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, test_utils::geotagged_jpeg(1, "N", 1, "E")).unwrap();

        let mut config = Config::default();
        config.limits.max_file_size_mb = 1;
        let source = ImageSource::from(DiscoveredFile {
            path,
            name: "a.jpg".to_string(),
            size: 4 * 1024 * 1024,
        });
        let result = Extractor::new(&config).extract(vec![source]).await;

        assert!(matches!(
            &result.report.items[0].status,
            ItemStatus::Skipped(SkipReason::UnreadableImage(msg)) if msg.contains("too large")
        ));
    }

    #[tokio::test]
    async fn test_unsupported_and_unreadable_items() {
        let batch = vec![
            ImageSource::from_bytes("notes.txt", b"hello".to_vec()),
            ImageSource::from_bytes("broken.jpg", b"not really a jpeg".to_vec()),
            ImageSource::from_path("/no/such/dir/missing.jpg"),
            ImageSource::from_bytes("UPPER.JPG", test_utils::geotagged_jpeg(5, "N", 6, "E")),
        ];

        let result = extractor(1).extract(batch).await;

        let statuses: Vec<_> = result.report.items.iter().map(|i| &i.status).collect();
        assert_eq!(
            statuses[0],
            &ItemStatus::Skipped(SkipReason::UnsupportedExtension)
        );
        assert!(matches!(
            statuses[1],
            ItemStatus::Skipped(SkipReason::UnreadableImage(_))
        ));
        assert!(matches!(
            statuses[2],
            ItemStatus::Skipped(SkipReason::UnreadableImage(msg)) if msg.contains("cannot stat")
        ));
        assert_eq!(
            statuses[3],
            &ItemStatus::Extracted {
                latitude: 5.0,
                longitude: 6.0
            }
        );
    }

    #[tokio::test]
    async fn test_oversized_file_is_unreadable() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("huge.jpg");
        std::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();

        let config = Config {
            limits: LimitsConfig {
                max_file_size_mb: 1,
                ..LimitsConfig::default()
            },
            ..Config::default()
        };
        let result = Extractor::new(&config)
            .extract(vec![ImageSource::from_path(&path)])
            .await;

        assert!(matches!(
            &result.report.items[0].status,
            ItemStatus::Skipped(SkipReason::UnreadableImage(msg)) if msg.contains("too large")
        ));
    }

    #[tokio::test]
    async fn test_reads_files_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("a.jpg"),
            test_utils::geotagged_jpeg(7, "N", 8, "W"),
        )
        .unwrap();
        std::fs::write(dir.path().join("b.png"), test_utils::plain_png()).unwrap();

        let extractor = extractor(2);
        let batch = extractor.discover(&[dir.path().to_path_buf()]).unwrap();
        let result = extractor.extract(batch).await;

        let coords: Vec<_> = result.coordinates.iter().cloned().collect();
        assert_eq!(coords, vec![Coordinate::new("a.jpg", 7.0, -8.0)]);
        assert_eq!(result.report.skipped, 1);
    }

    #[tokio::test]
    async fn test_progress_reports_every_item() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let batch: Vec<_> = (0..5)
            .map(|i| ImageSource::from_bytes(format!("{i}.jpg"), test_utils::plain_jpeg()))
            .collect();

        extractor(2)
            .extract_with(batch, None, move |p| sink.lock().unwrap().push(p))
            .await;

        let mut seen = seen.lock().unwrap().clone();
        seen.sort_by_key(|p| p.processed);
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|p| p.total == 5));
        assert_eq!(seen.last().unwrap().processed, 5);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_is_empty_and_flagged() {
        let token = cancellation_token();
        token.store(true, Ordering::SeqCst);
        let batch = vec![ImageSource::from_bytes(
            "a.jpg",
            test_utils::geotagged_jpeg(1, "N", 1, "E"),
        )];

        let result = extractor(2).extract_with(batch, Some(token), |_| {}).await;

        assert!(result.coordinates.is_empty());
        assert!(result.report.cancelled);
        assert_eq!(result.report.total, 1);
        assert_eq!(result.report.processed, 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_batch_keeps_prefix() {
        let token = cancellation_token();
        let trigger = token.clone();
        let batch: Vec<_> = (0..20)
            .map(|i| {
                ImageSource::from_bytes(
                    format!("{i:02}.jpg"),
                    test_utils::geotagged_jpeg(i, "N", i, "E"),
                )
            })
            .collect();

        let result = extractor(1)
            .extract_with(batch, Some(token), move |p| {
                if p.processed == 3 {
                    trigger.store(true, Ordering::SeqCst);
                }
            })
            .await;

        let report = &result.report;
        assert!(report.cancelled);
        assert!(report.processed < 20);
        // Whatever was kept is a gap-free prefix
        for (i, item) in report.items.iter().enumerate() {
            assert_eq!(item.index, i);
        }
        assert_eq!(result.coordinates.len(), report.succeeded);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let result = extractor(4).extract(Vec::new()).await;
        assert!(result.coordinates.is_empty());
        assert!(result.report.is_empty());
        assert!(!result.report.cancelled);
    }
}
