// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Isolated execution context. A `Worker` owns one background task that
// takes commands off a channel and runs them one at a time on the blocking
// pool. Callers talk to it only through messages.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pressproof_core::PreflightConfig;
use pressproof_core::error::{PressproofError, Result};
use pressproof_document::DocumentLoader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::dispatch::execute;
use crate::protocol::{Command, Event};

/// One submitted command and where its events go.
struct Job {
    command: Command,
    events: mpsc::UnboundedSender<Event>,
}

/// Handle to a running worker.
///
/// Commands are processed strictly in submission order, one at a time;
/// `submit` waits while the worker is busy. Dropping the handle lets the
/// current command finish and then stops the worker. [`Worker::terminate`]
/// stops it immediately.
pub struct Worker {
    id: Uuid,
    jobs: mpsc::Sender<Job>,
    terminated: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Worker {
    /// Start a worker on the current tokio runtime.
    pub fn spawn(loader: Arc<dyn DocumentLoader>, config: PreflightConfig) -> Self {
        let id = Uuid::new_v4();
        let (jobs, rx) = mpsc::channel(1);
        let terminated = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run_loop(id, rx, loader, Arc::new(config), Arc::clone(&terminated)));
        info!(worker = %id, "Worker started");
        Self {
            id,
            jobs,
            terminated,
            task,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue `command` and return the stream of its events. The stream ends
    /// after the terminal event.
    pub async fn submit(&self, command: Command) -> Result<mpsc::UnboundedReceiver<Event>> {
        let (events, rx) = mpsc::unbounded_channel();
        self.jobs
            .send(Job { command, events })
            .await
            .map_err(|_| PressproofError::WorkerClosed)?;
        Ok(rx)
    }

    /// Parse and submit a JSON command. A command that does not parse is
    /// rejected here and never reaches the worker.
    pub async fn submit_json(&self, json: &str) -> Result<mpsc::UnboundedReceiver<Event>> {
        let command = Command::from_json(json)?;
        self.submit(command).await
    }

    /// Submit `command`, hand every progress event to `on_progress`, and
    /// return the terminal event.
    pub async fn run(&self, command: Command, mut on_progress: impl FnMut(Event)) -> Result<Event> {
        let mut events = self.submit(command).await?;
        while let Some(event) = events.recv().await {
            if event.is_terminal() {
                return Ok(event);
            }
            on_progress(event);
        }
        Err(PressproofError::WorkerClosed)
    }

    /// Tear the worker down. In-flight work is abandoned: no further events,
    /// terminal or otherwise, are delivered for it.
    pub fn terminate(self) {
        self.terminated.store(true, Ordering::SeqCst);
        self.task.abort();
        info!(worker = %self.id, "Worker terminated");
    }
}

#[instrument(skip_all, fields(worker = %id))]
async fn run_loop(
    id: Uuid,
    mut jobs: mpsc::Receiver<Job>,
    loader: Arc<dyn DocumentLoader>,
    config: Arc<PreflightConfig>,
    terminated: Arc<AtomicBool>,
) {
    while let Some(Job { command, events }) = jobs.recv().await {
        let kind = command.kind();
        debug!(?kind, file = %command.file_meta().name, bytes = command.buffer().len(), "Command received");

        let loader = Arc::clone(&loader);
        let config = Arc::clone(&config);
        let progress_events = events.clone();
        let progress_gate = Arc::clone(&terminated);
        let handle = tokio::task::spawn_blocking(move || {
            let mut emit = |event: Event| {
                if !progress_gate.load(Ordering::SeqCst) {
                    let _ = progress_events.send(event);
                }
            };
            execute(command, loader.as_ref(), &config, &mut emit)
        });

        let terminal = match handle.await {
            Ok(event) => event,
            Err(err) => {
                warn!(?kind, error = %err, "Command task did not complete");
                kind.failure(format!("worker task failed: {err}"))
            }
        };
        if terminated.load(Ordering::SeqCst) {
            break;
        }
        if events.send(terminal).is_err() {
            debug!(?kind, "Caller stopped listening before the result was ready");
        }
    }
    debug!("Worker loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, Object, Stream, dictionary};
    use pressproof_core::FileMeta;
    use pressproof_document::{DocumentModel, LopdfModel, PdfLoader};
    use pressproof_preflight::TransformKind;

    /// `count` pages of 432 × 576 pt, each with a red fill.
    fn sample_pdf(count: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..count {
            let content_id = doc.add_object(Stream::new(dictionary! {}, b"1 0 0 rg 0 0 100 100 re f".to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 432.into(), 576.into()],
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn meta(bytes: &[u8]) -> FileMeta {
        FileMeta::new("job.pdf", bytes.len() as u64, "application/pdf")
    }

    fn worker() -> Worker {
        Worker::spawn(Arc::new(PdfLoader::new()), PreflightConfig::default())
    }

    #[tokio::test]
    async fn analyze_streams_progress_then_result() {
        let bytes = sample_pdf(2);
        let worker = worker();
        let mut events = worker
            .submit(Command::Analyze {
                file_meta: meta(&bytes),
                buffer: bytes,
            })
            .await
            .unwrap();

        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            seen.push(event);
        }
        let (last, progress) = seen.split_last().unwrap();
        let percents: Vec<u8> = progress
            .iter()
            .map(|e| match e {
                Event::AnalysisProgress { progress, .. } => *progress,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(percents, vec![50, 100]);

        let Event::AnalysisResult { result } = last else {
            panic!("expected a result, got {last:?}");
        };
        assert_eq!(result.meta.page_count, 2);
        assert!(result.issue("rgb-only").is_some());
        assert!(result.issue("missing-bleed-info").is_some());
    }

    #[tokio::test]
    async fn unreadable_document_still_yields_a_result() {
        let worker = worker();
        let event = worker
            .run(
                Command::Analyze {
                    file_meta: FileMeta::new("junk.pdf", 4, "application/pdf"),
                    buffer: b"junk".to_vec(),
                },
                |_| {},
            )
            .await
            .unwrap();
        let Event::AnalysisResult { result } = event else {
            panic!("expected a result");
        };
        assert_eq!(result.issues[0].id, "unreadable-document");
    }

    #[tokio::test]
    async fn fix_bleed_returns_new_document() {
        let bytes = sample_pdf(1);
        let worker = worker();
        let mut progress = 0;
        let event = worker
            .run(
                Command::FixBleed {
                    file_meta: meta(&bytes),
                    buffer: bytes.clone(),
                    bleed_mm: Some(3.0),
                },
                |_| progress += 1,
            )
            .await
            .unwrap();
        assert_eq!(progress, 1);

        let Event::TransformResult {
            operation,
            buffer,
            file_meta,
        } = event
        else {
            panic!("expected a transform result");
        };
        assert_eq!(operation, TransformKind::FixBleed);
        assert_eq!(file_meta.name, "job-bleed.pdf");
        assert_eq!(file_meta.size, buffer.len() as u64);

        let model = LopdfModel::from_bytes(&buffer).unwrap();
        let geometry = model.page_geometry(0).unwrap();
        assert!((geometry.trim_box.width() - 432.0).abs() < 0.01);
        assert!((geometry.media_box.width() - (432.0 + 2.0 * pressproof_core::mm_to_pt(3.0))).abs() < 0.01);
    }

    #[tokio::test]
    async fn commands_run_back_to_back() {
        let bytes = sample_pdf(3);
        let worker = worker();
        let booklet = worker
            .run(
                Command::CreateBooklet {
                    file_meta: meta(&bytes),
                    buffer: bytes.clone(),
                },
                |_| {},
            )
            .await
            .unwrap();
        let Event::TransformResult { buffer, .. } = booklet else {
            panic!("expected a transform result");
        };
        assert_eq!(LopdfModel::from_bytes(&buffer).unwrap().page_count(), 2);

        let second = worker
            .run(
                Command::Analyze {
                    file_meta: meta(&bytes),
                    buffer: bytes,
                },
                |_| {},
            )
            .await
            .unwrap();
        assert!(matches!(second, Event::AnalysisResult { .. }));
    }

    #[tokio::test]
    async fn out_of_range_page_is_an_error_event() {
        let bytes = sample_pdf(1);
        let worker = worker();
        let event = worker
            .run(
                Command::TacHeatmap {
                    file_meta: meta(&bytes),
                    buffer: bytes,
                    page_index: Some(5),
                },
                |_| {},
            )
            .await
            .unwrap();
        let Event::TacHeatmapError { message } = event else {
            panic!("expected a heatmap error");
        };
        assert!(message.contains("page 5"));
    }

    #[cfg(not(feature = "pdfium"))]
    #[tokio::test]
    async fn raster_transform_without_renderer_fails_with_operation() {
        let bytes = sample_pdf(1);
        let worker = worker();
        let event = worker
            .run(
                Command::ConvertToGrayscale {
                    file_meta: meta(&bytes),
                    buffer: bytes,
                },
                |_| {},
            )
            .await
            .unwrap();
        assert!(matches!(
            event,
            Event::TransformError {
                operation: TransformKind::ConvertToGrayscale,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn malformed_json_never_reaches_the_worker() {
        let worker = worker();
        let err = worker.submit_json(r#"{"type":"shred"}"#).await.unwrap_err();
        assert!(matches!(err, PressproofError::InvalidCommand(_)));

        let bytes = sample_pdf(1);
        let json = Command::Analyze {
            file_meta: meta(&bytes),
            buffer: bytes,
        }
        .to_json()
        .unwrap();
        let mut events = worker.submit_json(&json).await.unwrap();
        let mut last = None;
        while let Some(event) = events.recv().await {
            last = Some(event);
        }
        assert!(matches!(last, Some(Event::AnalysisResult { .. })));
    }

    #[tokio::test]
    async fn terminated_worker_delivers_nothing_more() {
        let bytes = sample_pdf(1);
        let worker = worker();
        let id = worker.id();
        let mut events = worker
            .submit(Command::Analyze {
                file_meta: meta(&bytes),
                buffer: bytes,
            })
            .await
            .unwrap();
        worker.terminate();
        assert!(!id.is_nil());
        // Whatever was sent before the abort, no terminal event follows it.
        while let Some(event) = events.recv().await {
            assert!(!event.is_terminal());
        }
    }
}
