//! Background removal pipelines for single uploads and batches.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use bytes::Bytes;
use cutout_core::traits::ObjectStorage;
use cutout_core::{AppError, AppResult};
use cutout_entity::{BatchItem, JobResult, RemovalOptions};
use tracing::info;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::executor::JobContext;
use crate::jobs::{report, report_batch};

const BATCH_ARCHIVE_NAME: &str = "removed-backgrounds.zip";

pub async fn run_single(
    ctx: &JobContext,
    job_id: Uuid,
    name: &str,
    bytes: &[u8],
    options: &RemovalOptions,
) -> AppResult<JobResult> {
    report(ctx, job_id, 5, "prepare").await?;

    report(ctx, job_id, 30, "remove_background").await?;
    let cutout = ctx
        .removal
        .process(Bytes::copy_from_slice(bytes), options.clone())
        .await?;

    report(ctx, job_id, 80, "upload").await?;
    let filename = format!("{}.png", sanitize_stem(name));
    let storage_key = object_key(job_id, &filename);
    ctx.storage
        .put(&storage_key, cutout, "image/png")
        .await?;

    report(ctx, job_id, 100, "done").await?;
    ctx.metrics.increment("images_processed", 1);
    info!(%job_id, key = %storage_key, "Removal job finished");

    Ok(JobResult::Output {
        storage_key,
        filename,
        content_type: "image/png".to_string(),
    })
}

pub async fn run_batch(
    ctx: &JobContext,
    job_id: Uuid,
    items: &[BatchItem],
    options: &RemovalOptions,
) -> AppResult<JobResult> {
    let total = items.len() as u32;
    report_batch(ctx, job_id, 3, "prepare", 0, total).await?;

    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let entry_options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut used_names: HashSet<String> = HashSet::new();

    for (index, item) in items.iter().enumerate() {
        let cutout = ctx
            .removal
            .process(Bytes::copy_from_slice(&item.bytes), options.clone())
            .await
            .map_err(|err| {
                AppError::new(
                    err.kind,
                    format!("File {} ('{}'): {}", index + 1, item.name, err.message),
                )
            })?;

        let mut entry_name = format!("{}.png", sanitize_stem(&item.name));
        if !used_names.insert(entry_name.clone()) {
            entry_name = format!("{}-{}.png", sanitize_stem(&item.name), index + 1);
            used_names.insert(entry_name.clone());
        }

        archive
            .start_file(&entry_name, entry_options)
            .map_err(|err| AppError::internal("Failed to start zip entry").caused_by(err))?;
        archive
            .write_all(&cutout)
            .map_err(|err| AppError::internal("Failed to write zip entry").caused_by(err))?;
        ctx.metrics.increment("images_processed", 1);

        // Checkpoint after the item so progress never moves backwards:
        // 1-based position, capped at 90 before the upload step.
        let done = index as u32 + 1;
        let progress = ((f64::from(done) / f64::from(total)) * 90.0).round() as u8;
        report_batch(ctx, job_id, progress, "remove_background", done, total).await?;
    }

    let archive_bytes = archive
        .finish()
        .map_err(|err| AppError::internal("Failed to finalize zip archive").caused_by(err))?
        .into_inner();

    report_batch(ctx, job_id, 95, "upload", total, total).await?;
    let storage_key = object_key(job_id, BATCH_ARCHIVE_NAME);
    ctx.storage
        .put(&storage_key, Bytes::from(archive_bytes), "application/zip")
        .await?;

    report_batch(ctx, job_id, 100, "done", total, total).await?;
    info!(%job_id, files = total, key = %storage_key, "Batch removal job finished");

    Ok(JobResult::Output {
        storage_key,
        filename: BATCH_ARCHIVE_NAME.to_string(),
        content_type: "application/zip".to_string(),
    })
}

/// Objects for one job live under a shared `jobs/{id}/` prefix so the
/// cleanup pipeline can find them later.
pub fn object_key(job_id: Uuid, filename: &str) -> String {
    format!("jobs/{job_id}/{filename}")
}

/// Reduces an uploaded filename to a safe object-key stem: the extension is
/// dropped and anything outside `[A-Za-z0-9_-]` is removed. Falls back to a
/// fixed name when nothing survives.
pub fn sanitize_stem(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = match base.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => base,
    };
    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use cutout_core::metrics::MetricsStore;
    use cutout_core::traits::BackgroundRemover;
    use cutout_core::AppError;
    use cutout_entity::{Job, JobMeta, JobStatus};
    use cutout_queue::{FailureOutcome, JobQueue, JobSubmission, QueueStats};
    use cutout_service::RemovalService;
    use cutout_storage::MemoryObjectStorage;

    use super::*;

    /// Queue double that records every meta checkpoint a pipeline publishes.
    #[derive(Debug, Default)]
    struct MetaLog {
        metas: StdMutex<Vec<JobMeta>>,
    }

    #[async_trait]
    impl JobQueue for MetaLog {
        async fn enqueue(&self, _submission: JobSubmission) -> AppResult<Job> {
            Err(AppError::internal("not used"))
        }

        async fn fetch(&self, _id: Uuid) -> AppResult<Option<Job>> {
            Ok(None)
        }

        async fn dequeue(&self) -> AppResult<Option<Job>> {
            Ok(None)
        }

        async fn save_meta(&self, _id: Uuid, meta: &JobMeta) -> AppResult<()> {
            self.metas
                .lock()
                .expect("meta log mutex poisoned")
                .push(meta.clone());
            Ok(())
        }

        async fn complete(&self, _id: Uuid, _result: JobResult) -> AppResult<()> {
            Ok(())
        }

        async fn fail_attempt(&self, _id: Uuid, _error: &str) -> AppResult<FailureOutcome> {
            Ok(FailureOutcome::Exhausted)
        }

        async fn cancel(&self, _id: Uuid) -> AppResult<JobStatus> {
            Err(AppError::internal("not used"))
        }

        async fn stats(&self) -> AppResult<QueueStats> {
            Ok(QueueStats {
                queued: 0,
                started: 0,
                failed: 0,
            })
        }
    }

    #[derive(Debug)]
    struct EchoRemover;

    #[async_trait]
    impl BackgroundRemover for EchoRemover {
        async fn remove(&self, image: Bytes) -> AppResult<Bytes> {
            Ok(image)
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([5, 6, 7, 255]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    fn context(queue: Arc<MetaLog>) -> JobContext {
        JobContext {
            queue,
            storage: Arc::new(MemoryObjectStorage::new()),
            removal: RemovalService::new(Arc::new(EchoRemover), 1),
            metrics: Arc::new(MetricsStore::new()),
        }
    }

    #[tokio::test]
    async fn test_batch_progress_checkpoints_are_monotone() {
        let queue = Arc::new(MetaLog::default());
        let ctx = context(queue.clone());
        let items = vec![
            BatchItem {
                name: "a.png".to_string(),
                bytes: png_bytes(4, 4),
            },
            BatchItem {
                name: "b.png".to_string(),
                bytes: png_bytes(4, 4),
            },
        ];

        run_batch(&ctx, Uuid::new_v4(), &items, &RemovalOptions::default())
            .await
            .unwrap();

        let metas = queue.metas.lock().unwrap();
        let progress: Vec<u8> = metas.iter().map(|m| m.progress).collect();
        assert_eq!(progress, vec![3, 45, 90, 95, 100]);
        assert!(
            progress.windows(2).all(|w| w[0] <= w[1]),
            "progress must be non-decreasing, got {progress:?}"
        );

        // Position counters track items already completed.
        assert_eq!(metas[0].current, Some(0));
        assert_eq!(metas[1].current, Some(1));
        assert_eq!(metas[2].current, Some(2));
        assert!(metas.iter().all(|m| m.total == Some(2)));
    }

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_stem("my-photo_01.jpg"), "my-photo_01");
    }

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(sanitize_stem("../../etc/passwd.png"), "passwd");
        assert_eq!(sanitize_stem("C:\\Users\\me\\cat.png"), "cat");
    }

    #[test]
    fn test_sanitize_drops_unicode_and_spaces() {
        assert_eq!(sanitize_stem("mötley crüe.png"), "mtleycre");
    }

    #[test]
    fn test_sanitize_falls_back_when_nothing_survives() {
        assert_eq!(sanitize_stem("日本語.png"), "image");
        assert_eq!(sanitize_stem(""), "image");
    }

    #[test]
    fn test_object_key_layout() {
        let id = Uuid::nil();
        assert_eq!(
            object_key(id, "cat.png"),
            "jobs/00000000-0000-0000-0000-000000000000/cat.png"
        );
    }
}
