use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tempfile::TempDir;

use super::{
    dependencies::{
        ClipboardAccess, ConfirmDialog, MetadataStripper, Notifier, ScreenshotSource, SoundPlayer,
        Transport, UploadDependencies,
    },
    fallback::{self, FallbackOutcome},
    fetch::HttpClient,
    history::HistoryLog,
    orchestrator::Uploader,
    pipeline::{Mode, Pipeline, PipelineOutcome, exit_code},
    temp::TempSlot,
    types::{ResolvedArtifact, UploadError},
};
use crate::capture::CaptureError;
use crate::config::{Config, StorageTarget};
use crate::notification::Urgency;

const PNG_BYTES: &[u8] = &[137, 80, 78, 71, 13, 10, 26, 10, 0, 0];

/// Ordered record of side effects shared between mocks.
type Journal = Arc<Mutex<Vec<String>>>;

struct MockScreenshot {
    result: Mutex<Option<Result<Vec<u8>, CaptureError>>>,
}

#[async_trait]
impl ScreenshotSource for MockScreenshot {
    async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        self.result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(CaptureError::Tool("captured twice".into())))
    }
}

#[derive(Default)]
struct MockClipboard {
    mime_types: Vec<String>,
    data: Vec<u8>,
    text: String,
    copied_text: Mutex<Vec<String>>,
    copied_bytes: Mutex<Vec<(Vec<u8>, String)>>,
    journal: Journal,
}

impl ClipboardAccess for MockClipboard {
    fn mime_types(&self) -> Result<Vec<String>, CaptureError> {
        Ok(self.mime_types.clone())
    }

    fn read(&self, _mime_type: &str) -> Result<Vec<u8>, CaptureError> {
        Ok(self.data.clone())
    }

    fn read_text(&self) -> Result<String, CaptureError> {
        Ok(self.text.clone())
    }

    fn copy_text(&self, text: &str) -> Result<(), CaptureError> {
        self.journal.lock().unwrap().push(format!("clipboard {text}"));
        self.copied_text.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn copy_bytes(&self, data: &[u8], mime_type: &str) -> Result<(), CaptureError> {
        self.copied_bytes
            .lock()
            .unwrap()
            .push((data.to_vec(), mime_type.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct MockTransport {
    should_fail: bool,
    /// (key, contents) of every publish call.
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn publish(&self, local_path: &Path, key: &str) -> Result<(), String> {
        // Sparse test files are large; record only a prefix.
        let mut contents = Vec::new();
        fs::File::open(local_path)
            .and_then(|file| file.take(64).read_to_end(&mut contents))
            .map_err(|e| e.to_string())?;
        self.published
            .lock()
            .unwrap()
            .push((key.to_string(), contents));
        if self.should_fail {
            Err("bucket unreachable".to_string())
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct MockNotifier {
    sent: Mutex<Vec<(String, String, Urgency)>>,
    journal: Journal,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, summary: &str, body: &str, urgency: Urgency) -> Result<(), String> {
        self.journal.lock().unwrap().push(format!("notify {summary}"));
        self.sent
            .lock()
            .unwrap()
            .push((summary.to_string(), body.to_string(), urgency));
        Ok(())
    }
}

#[derive(Default)]
struct MockSound {
    played: Mutex<Vec<PathBuf>>,
}

impl SoundPlayer for MockSound {
    fn play(&self, sound: &Path, _volume: f64) {
        self.played.lock().unwrap().push(sound.to_path_buf());
    }
}

struct MockDialog {
    answer: bool,
    asked: Mutex<usize>,
}

impl ConfirmDialog for MockDialog {
    fn confirm(&self, _question: &str) -> bool {
        *self.asked.lock().unwrap() += 1;
        self.answer
    }
}

#[derive(Default)]
struct MockStripper {
    stripped: Mutex<Vec<PathBuf>>,
}

impl MetadataStripper for MockStripper {
    fn strip(&self, path: &Path) -> Result<(), String> {
        self.stripped.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

/// Serves one scripted response; a missing body makes downloads fail.
#[derive(Default)]
struct ScriptedHttp {
    body: Option<Vec<u8>>,
    content_type: Option<String>,
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn get_text(&self, url: &str) -> Result<String, String> {
        self.calls.lock().unwrap().push(format!("GET {url}"));
        self.body
            .as_ref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
            .ok_or_else(|| "404 Not Found".to_string())
    }

    async fn content_type(&self, url: &str) -> Result<Option<String>, String> {
        self.calls.lock().unwrap().push(format!("HEAD {url}"));
        Ok(self.content_type.clone())
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, String> {
        self.calls.lock().unwrap().push(format!("DOWNLOAD {url}"));
        let body = self
            .body
            .as_ref()
            .ok_or_else(|| "503 Service Unavailable".to_string())?;
        fs::write(dest, body).map_err(|e| e.to_string())?;
        Ok(body.len() as u64)
    }
}

struct Harness {
    dir: TempDir,
    config: Config,
    target: StorageTarget,
    screenshot: Arc<MockScreenshot>,
    clipboard: Arc<MockClipboard>,
    transport: Arc<MockTransport>,
    http: Arc<ScriptedHttp>,
    notifier: Arc<MockNotifier>,
    sound: Arc<MockSound>,
    dialog: Option<Arc<MockDialog>>,
    stripper: Arc<MockStripper>,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            config: Config::default(),
            target: StorageTarget {
                endpoint: "https://s3.test".into(),
                access_key: "key".into(),
                secret_key: "secret".into(),
                bucket: "shots".into(),
                region: "us-east-1".into(),
                url_base: "https://i.test".into(),
            },
            screenshot: Arc::new(MockScreenshot {
                result: Mutex::new(Some(Ok(PNG_BYTES.to_vec()))),
            }),
            clipboard: Arc::new(MockClipboard::default()),
            transport: Arc::new(MockTransport::default()),
            http: Arc::new(ScriptedHttp::default()),
            notifier: Arc::new(MockNotifier::default()),
            sound: Arc::new(MockSound::default()),
            dialog: None,
            stripper: Arc::new(MockStripper::default()),
        }
    }

    fn temp_dir(&self) -> PathBuf {
        let dir = self.dir.path().join("tmp");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn history_path(&self) -> PathBuf {
        self.dir.path().join("history.log")
    }

    fn deps(&self) -> UploadDependencies {
        UploadDependencies {
            screenshot: self.screenshot.clone(),
            clipboard: self.clipboard.clone(),
            transport: self.transport.clone(),
            http: self.http.clone(),
            notifier: self.notifier.clone(),
            sound: self.sound.clone(),
            dialog: self
                .dialog
                .clone()
                .map(|dialog| dialog as Arc<dyn ConfirmDialog>),
            stripper: Some(self.stripper.clone() as Arc<dyn MetadataStripper>),
            history: HistoryLog::new(self.history_path()),
        }
    }

    async fn run(&self, mode: Mode) -> Result<PipelineOutcome, UploadError> {
        let deps = self.deps();
        Pipeline::new(&self.config, &self.target, &deps)
            .with_temp_slot(TempSlot::in_dir(self.temp_dir()))
            .run(mode)
            .await
    }

    fn keys(&self) -> Vec<String> {
        self.transport
            .published
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[tokio::test]
async fn screenshot_is_published_and_url_copied() {
    let harness = Harness::new();

    let outcome = harness.run(Mode::Screenshot).await.unwrap();
    let PipelineOutcome::Published(result) = outcome else {
        panic!("expected a publish");
    };

    let keys = harness.keys();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].ends_with(".png"));
    assert_eq!(keys[0].len(), 8 + ".png".len());
    assert_eq!(result.public_url, format!("https://i.test/{}", keys[0]));
    assert_eq!(result.size_bytes, PNG_BYTES.len() as u64);
    assert_eq!(result.formatted_size, "10 bytes");

    assert_eq!(
        *harness.clipboard.copied_text.lock().unwrap(),
        vec![result.public_url.clone()]
    );
    let history = fs::read_to_string(harness.history_path()).unwrap();
    assert!(history.contains(&result.public_url));

    let sent = harness.notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].2, Urgency::Success);
    assert_eq!(
        *harness.sound.played.lock().unwrap(),
        vec![harness.config.sound.success_sound.clone()]
    );
}

#[tokio::test]
async fn temporary_file_is_removed_after_run() {
    let harness = Harness::new();
    harness.run(Mode::Screenshot).await.unwrap();

    let leftovers: Vec<_> = fs::read_dir(harness.temp_dir()).unwrap().collect();
    assert!(leftovers.is_empty(), "temp files left: {leftovers:?}");
}

#[tokio::test]
async fn cancelled_screenshot_aborts_quietly() {
    let harness = Harness::new();
    *harness.screenshot.result.lock().unwrap() =
        Some(Err(CaptureError::Cancelled("selection dismissed".into())));

    let outcome = harness.run(Mode::Screenshot).await.unwrap();

    assert!(matches!(outcome, PipelineOutcome::Aborted(_)));
    assert!(harness.keys().is_empty());
    assert!(harness.notifier.sent.lock().unwrap().is_empty());
    assert!(harness.sound.played.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_screenshot_upload_copies_image_instead() {
    let mut harness = Harness::new();
    harness.transport = Arc::new(MockTransport {
        should_fail: true,
        ..Default::default()
    });

    let err = harness.run(Mode::Screenshot).await.unwrap_err();

    assert!(matches!(err, UploadError::UploadFailed { .. }));
    let copied = harness.clipboard.copied_bytes.lock().unwrap();
    assert_eq!(copied.len(), 1);
    assert_eq!(copied[0].0, PNG_BYTES);
    assert_eq!(copied[0].1, "image/png");
    assert!(harness.clipboard.copied_text.lock().unwrap().is_empty());

    let sent = harness.notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Upload failed");
    assert_eq!(sent[0].2, Urgency::Failure);
    assert!(!harness.history_path().exists());
}

#[tokio::test]
async fn failed_text_upload_only_notifies() {
    let harness = Harness::new();
    let path = harness.dir.path().join("notes.txt");
    fs::write(&path, "hello").unwrap();
    let deps = harness.deps();

    let err = UploadError::upload_failed("bucket unreachable", &path);
    let outcome = fallback::handle(&err, &deps, &harness.config.sound).await;

    assert_eq!(outcome, FallbackOutcome::Notified);
    assert!(harness.clipboard.copied_bytes.lock().unwrap().is_empty());
    assert_eq!(
        *harness.sound.played.lock().unwrap(),
        vec![harness.config.sound.failure_sound.clone()]
    );
}

#[tokio::test]
async fn large_file_without_dialog_is_uploaded() {
    let harness = Harness::new();
    let path = harness.dir.path().join("big.bin");
    let file = fs::File::create(&path).unwrap();
    file.set_len(70 * 1024 * 1024).unwrap();

    let outcome = harness
        .run(Mode::Upload(path.to_string_lossy().into_owned()))
        .await
        .unwrap();

    let PipelineOutcome::Published(result) = outcome else {
        panic!("expected a publish");
    };
    assert_eq!(result.formatted_size, "70.00 MB");
    assert!(harness.keys()[0].ends_with(".bin"));
    assert!(path.exists(), "user files must never be deleted");
}

#[tokio::test]
async fn declined_large_upload_is_cancelled() {
    let mut harness = Harness::new();
    let dialog = Arc::new(MockDialog {
        answer: false,
        asked: Mutex::new(0),
    });
    harness.dialog = Some(dialog.clone());
    let path = harness.dir.path().join("big.tar.gz");
    fs::File::create(&path)
        .unwrap()
        .set_len(65 * 1024 * 1024)
        .unwrap();

    let err = harness
        .run(Mode::Upload(path.to_string_lossy().into_owned()))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::UploadCancelled));
    assert_eq!(exit_code(&Err(err)), 0);
    assert_eq!(*dialog.asked.lock().unwrap(), 1);
    assert!(harness.keys().is_empty());
    assert_eq!(harness.notifier.sent.lock().unwrap()[0].0, "Upload cancelled");
}

#[tokio::test]
async fn small_file_skips_dialog() {
    let mut harness = Harness::new();
    let dialog = Arc::new(MockDialog {
        answer: false,
        asked: Mutex::new(0),
    });
    harness.dialog = Some(dialog.clone());
    let path = harness.dir.path().join("backup.tar.gz");
    fs::write(&path, b"archive").unwrap();

    harness
        .run(Mode::Upload(path.to_string_lossy().into_owned()))
        .await
        .unwrap();

    assert_eq!(*dialog.asked.lock().unwrap(), 0);
    assert!(harness.keys()[0].ends_with(".tar.gz"));
    assert_eq!(*harness.stripper.stripped.lock().unwrap(), vec![path]);
}

#[tokio::test]
async fn file_url_with_space_resolves_exact_path() {
    let harness = Harness::new();
    let path = harness.dir.path().join("my shot.png");
    fs::write(&path, PNG_BYTES).unwrap();
    let uri = url::Url::from_file_path(&path).unwrap().to_string();

    harness.run(Mode::Upload(uri)).await.unwrap();

    let published = harness.transport.published.lock().unwrap();
    assert_eq!(published[0].1, PNG_BYTES);
    assert!(published[0].0.ends_with(".png"));
}

#[tokio::test]
async fn missing_file_url_is_not_found() {
    let harness = Harness::new();
    let path = harness.dir.path().join("gone away.png");
    let uri = url::Url::from_file_path(&path).unwrap().to_string();

    let err = harness.run(Mode::Upload(uri)).await.unwrap_err();

    assert!(matches!(err, UploadError::NotFound(_)));
    assert!(harness.keys().is_empty());
    assert_eq!(harness.notifier.sent.lock().unwrap()[0].0, "File not found");
}

#[tokio::test]
async fn clipboard_text_is_uploaded_as_txt() {
    let mut harness = Harness::new();
    harness.clipboard = Arc::new(MockClipboard {
        mime_types: vec!["text/plain;charset=utf-8".into()],
        text: "  some notes\nover two lines  ".into(),
        ..Default::default()
    });

    harness.run(Mode::Clipboard).await.unwrap();

    let published = harness.transport.published.lock().unwrap();
    assert!(published[0].0.ends_with(".txt"));
    assert_eq!(published[0].1, b"  some notes\nover two lines  ");
}

#[tokio::test]
async fn clipboard_image_is_dumped_and_stripped() {
    let mut harness = Harness::new();
    harness.clipboard = Arc::new(MockClipboard {
        mime_types: vec!["image/jpeg".into(), "image/png".into(), "text/plain".into()],
        data: PNG_BYTES.to_vec(),
        ..Default::default()
    });

    harness.run(Mode::Clipboard).await.unwrap();

    assert!(harness.keys()[0].ends_with(".png"));
    assert_eq!(harness.stripper.stripped.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn whitespace_clipboard_is_empty() {
    let mut harness = Harness::new();
    harness.clipboard = Arc::new(MockClipboard {
        mime_types: vec!["text/plain".into()],
        text: " \n\t ".into(),
        ..Default::default()
    });

    let err = harness.run(Mode::Clipboard).await.unwrap_err();

    assert!(matches!(err, UploadError::EmptyClipboard));
    assert!(harness.keys().is_empty());
    assert_eq!(
        harness.notifier.sent.lock().unwrap()[0].0,
        "Clipboard is empty"
    );
}

#[tokio::test]
async fn timed_out_screenshot_aborts_quietly() {
    let harness = Harness::new();
    *harness.screenshot.result.lock().unwrap() =
        Some(Err(CaptureError::TimedOut(std::time::Duration::from_secs(20))));

    let result = harness.run(Mode::Screenshot).await;

    assert!(matches!(result, Ok(PipelineOutcome::Aborted(_))));
    assert_eq!(exit_code(&result), 0);
    assert!(harness.keys().is_empty());
    assert!(harness.notifier.sent.lock().unwrap().is_empty());
    assert!(harness.sound.played.lock().unwrap().is_empty());
}

#[tokio::test]
async fn broken_screenshot_tool_is_a_failure() {
    let harness = Harness::new();
    *harness.screenshot.result.lock().unwrap() =
        Some(Err(CaptureError::Tool("grim failed: no outputs".into())));

    let result = harness.run(Mode::Screenshot).await;

    assert!(matches!(result, Err(UploadError::CaptureFailed(_))));
    assert_eq!(exit_code(&result), 1);
    assert_eq!(harness.notifier.sent.lock().unwrap()[0].0, "Capture failed");
}

#[tokio::test]
async fn remote_url_is_downloaded_stripped_and_published() {
    let mut harness = Harness::new();
    harness.http = Arc::new(ScriptedHttp {
        body: Some(b"GIF89a-frames".to_vec()),
        ..Default::default()
    });
    let temp_dir = harness.temp_dir();

    let result = harness
        .run(Mode::Upload("https://example.com/media/cat.gif?w=200".into()))
        .await;

    let Ok(PipelineOutcome::Published(upload)) = &result else {
        panic!("expected a publish");
    };
    assert_eq!(upload.size_bytes, 13);
    assert_eq!(exit_code(&result), 0);

    let published = harness.transport.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert!(published[0].0.ends_with(".gif"));
    assert_eq!(published[0].1, b"GIF89a-frames");

    let stripped = harness.stripper.stripped.lock().unwrap();
    assert_eq!(stripped.len(), 1);
    assert!(stripped[0].starts_with(&temp_dir));

    assert_eq!(
        *harness.http.calls.lock().unwrap(),
        vec!["DOWNLOAD https://example.com/media/cat.gif?w=200".to_string()]
    );
    assert_eq!(fs::read_dir(&temp_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn failed_download_goes_through_failure_handler() {
    let harness = Harness::new();

    let result = harness
        .run(Mode::Upload("https://example.com/missing.png".into()))
        .await;

    assert!(matches!(result, Err(UploadError::DownloadFailed(ref msg)) if msg.contains("503")));
    assert_eq!(exit_code(&result), 1);
    assert!(harness.keys().is_empty());
    assert!(harness.clipboard.copied_bytes.lock().unwrap().is_empty());

    let sent = harness.notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Download failed");
    assert_eq!(sent[0].2, Urgency::Failure);
    assert_eq!(
        *harness.sound.played.lock().unwrap(),
        vec![harness.config.sound.failure_sound.clone()]
    );
    assert_eq!(fs::read_dir(harness.temp_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn success_is_announced_before_url_is_copied() {
    let mut harness = Harness::new();
    let journal = Journal::default();
    harness.clipboard = Arc::new(MockClipboard {
        journal: journal.clone(),
        ..Default::default()
    });
    harness.notifier = Arc::new(MockNotifier {
        journal: journal.clone(),
        ..Default::default()
    });

    let outcome = harness.run(Mode::Screenshot).await.unwrap();
    let PipelineOutcome::Published(result) = outcome else {
        panic!("expected a publish");
    };

    assert_eq!(
        *journal.lock().unwrap(),
        vec![
            "notify Upload complete".to_string(),
            format!("clipboard {}", result.public_url),
        ]
    );
}

#[tokio::test]
async fn public_name_uses_the_artifact_extension() {
    let harness = Harness::new();
    let deps = harness.deps();
    let uploader = Uploader {
        config: &harness.config,
        target: &harness.target,
        deps: &deps,
    };
    let path = harness.dir.path().join("capture");
    fs::write(&path, PNG_BYTES).unwrap();
    let mut artifact = ResolvedArtifact::local(path);
    assert_eq!(artifact.extension, None);
    artifact.extension = Some("webp".to_string());

    let result = uploader.upload(&artifact).await.unwrap();

    assert!(result.public_url.ends_with(".webp"));
    assert!(harness.keys()[0].ends_with(".webp"));
}
