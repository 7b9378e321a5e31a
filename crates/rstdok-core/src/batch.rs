//! Parsing a whole source tree
//!
//! Documents are independent until compilation, so a directory can be
//! parsed on a bounded worker pool. Workers pull paths from a shared queue
//! and send results back over a channel; the collecting thread enforces the
//! per-document timeout. A worker stuck past the timeout is abandoned and a
//! replacement takes over the rest of the queue. Sequential and parallel
//! runs produce the same map.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use rstdok_ast::DocumentNode;

use crate::config::BuildSettings;
use crate::diagnostics::{codes, Reporter};
use crate::error::Result;
use crate::events::{Event, EventDispatcher};
use crate::fs::{strip_extension, Filesystem};
use crate::parser::document::compute_source_hash;
use crate::parser::{InputFormat, Parser};

/// How a batch is parsed
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub parallel: bool,
    pub max_workers: usize,
    /// Fixed pool size. Unlike `max_workers` it is not capped by the
    /// number of CPUs.
    pub workers: Option<usize>,
    /// Budget for one document; exceeding it fails that document only
    pub worker_timeout: Duration,
    pub events: EventDispatcher,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_settings(&BuildSettings::default())
    }
}

impl BatchOptions {
    pub fn from_settings(settings: &BuildSettings) -> Self {
        Self {
            parallel: settings.parallel,
            max_workers: settings.max_workers,
            workers: None,
            worker_timeout: settings.worker_timeout(),
            events: EventDispatcher::new(),
        }
    }

    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Workers for `jobs` documents
    pub fn worker_count(&self, jobs: usize) -> usize {
        let limit = match self.workers {
            Some(workers) => workers,
            None => {
                let available = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
                self.max_workers.min(available)
            }
        };
        limit.min(jobs).max(1)
    }
}

/// A document that could not be parsed
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    /// Source path
    pub file: String,
    pub message: String,
}

/// Where a parsed document came from
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    /// Source path, relative to the filesystem root
    pub source: String,
    /// Hash of the source as read, before any `PreParse` listener ran
    pub hash: String,
}

/// Parsed documents keyed by extension-less path, plus failures
#[derive(Debug, Default)]
pub struct BatchResult {
    pub documents: BTreeMap<String, DocumentNode>,
    pub sources: BTreeMap<String, SourceInfo>,
    pub failures: Vec<BatchFailure>,
    /// Size of the worker pool; 1 when parsed on the calling thread
    pub workers: usize,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Source files of `format` below `root`, sorted
pub fn discover_sources(
    filesystem: &dyn Filesystem,
    root: &str,
    format: InputFormat,
) -> Result<Vec<String>> {
    let mut sources: Vec<String> = filesystem
        .list_contents(root, true)?
        .into_iter()
        .filter(|entry| !entry.is_directory)
        .map(|entry| entry.path)
        .filter(|path| format.is_source(path))
        .collect();
    sources.sort();
    Ok(sources)
}

/// Document path of a source file: relative to `root`, without extension
pub fn document_path(root: &str, source: &str) -> String {
    let root = root.trim_matches('/');
    let relative = if root.is_empty() {
        source
    } else {
        source
            .strip_prefix(root)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(source)
    };
    strip_extension(relative)
}

/// Parse every `format` source below `root`
pub fn parse_directory(
    parser: &Parser,
    filesystem: Arc<dyn Filesystem>,
    root: &str,
    format: InputFormat,
    options: &BatchOptions,
) -> Result<BatchResult> {
    let sources = discover_sources(filesystem.as_ref(), root, format)?;
    tracing::info!(root, count = sources.len(), "Parsing sources");
    Ok(parse_sources(parser, filesystem, root, sources, options))
}

/// Parse the given source paths
pub fn parse_sources(
    parser: &Parser,
    filesystem: Arc<dyn Filesystem>,
    root: &str,
    sources: Vec<String>,
    options: &BatchOptions,
) -> BatchResult {
    let workers = options.worker_count(sources.len());
    if !options.parallel || workers < 2 {
        let mut result = BatchResult {
            workers: 1,
            ..BatchResult::default()
        };
        for source in sources {
            let outcome = parse_one(parser, filesystem.as_ref(), root, &source, &options.events);
            collect(&mut result, parser.reporter(), source, outcome);
        }
        return result;
    }
    parse_parallel(parser, filesystem, root, sources, options, workers)
}

struct Parsed {
    path: String,
    hash: String,
    document: DocumentNode,
}

type Outcome = std::result::Result<Parsed, String>;

enum Message {
    Started(String),
    Finished(String, Outcome),
    Exited,
}

/// Everything a worker thread needs, cloned per worker
#[derive(Clone)]
struct WorkerSetup {
    queue: Arc<Mutex<VecDeque<String>>>,
    sender: Sender<Message>,
    parser: Parser,
    filesystem: Arc<dyn Filesystem>,
    events: EventDispatcher,
    root: String,
}

/// Reports the end of a worker, and the document it was on if it panicked
struct ExitGuard {
    sender: Sender<Message>,
    current: Option<String>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if let Some(source) = self.current.take() {
            if thread::panicking() {
                let outcome = Err("parse worker panicked".to_string());
                let _ = self.sender.send(Message::Finished(source, outcome));
            }
        }
        let _ = self.sender.send(Message::Exited);
    }
}

fn pop(queue: &Mutex<VecDeque<String>>) -> Option<String> {
    queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front()
}

/// Start a detached worker that parses queued sources until the queue is
/// empty or the collector is gone
fn spawn_worker(setup: WorkerSetup) {
    thread::spawn(move || {
        let mut guard = ExitGuard {
            sender: setup.sender.clone(),
            current: None,
        };
        while let Some(source) = pop(&setup.queue) {
            if setup.sender.send(Message::Started(source.clone())).is_err() {
                break;
            }
            guard.current = Some(source.clone());
            let outcome = parse_one(
                &setup.parser,
                setup.filesystem.as_ref(),
                &setup.root,
                &source,
                &setup.events,
            );
            guard.current = None;
            if setup.sender.send(Message::Finished(source, outcome)).is_err() {
                break;
            }
        }
    });
}

fn parse_parallel(
    parser: &Parser,
    filesystem: Arc<dyn Filesystem>,
    root: &str,
    sources: Vec<String>,
    options: &BatchOptions,
    workers: usize,
) -> BatchResult {
    tracing::debug!(workers, documents = sources.len(), "Starting parse workers");
    let mut pending = sources.len();
    let (sender, receiver) = mpsc::channel();
    let setup = WorkerSetup {
        queue: Arc::new(Mutex::new(sources.into_iter().collect())),
        sender,
        parser: parser.clone(),
        filesystem,
        events: options.events.clone(),
        root: root.to_string(),
    };
    // workers are detached so a stuck document cannot hold up the batch
    for _ in 0..workers {
        spawn_worker(setup.clone());
    }
    let mut alive = workers;

    let mut result = BatchResult {
        workers,
        ..BatchResult::default()
    };
    let mut running: HashMap<String, Instant> = HashMap::new();
    while pending > 0 {
        if alive == 0 {
            abandon(&mut result, parser.reporter(), &setup.queue, &mut running);
            break;
        }
        let now = Instant::now();
        let wait = running
            .values()
            .map(|started| (*started + options.worker_timeout).saturating_duration_since(now))
            .min()
            .unwrap_or(options.worker_timeout);

        match receiver.recv_timeout(wait) {
            Ok(Message::Started(source)) => {
                running.insert(source, Instant::now());
            }
            Ok(Message::Finished(source, outcome)) => {
                // results of documents already timed out are discarded
                if running.remove(&source).is_some() {
                    pending -= 1;
                    collect(&mut result, parser.reporter(), source, outcome);
                }
            }
            Ok(Message::Exited) => alive -= 1,
            Err(RecvTimeoutError::Timeout) => {
                let now = Instant::now();
                let expired: Vec<String> = running
                    .iter()
                    .filter(|(_, started)| now.duration_since(**started) >= options.worker_timeout)
                    .map(|(source, _)| source.clone())
                    .collect();
                for source in expired {
                    running.remove(&source);
                    pending -= 1;
                    let message = format!(
                        "parsing did not finish within {:?}",
                        options.worker_timeout
                    );
                    parser
                        .reporter()
                        .error(codes::WORKER_TIMEOUT, &source, None, message.clone());
                    result.failures.push(BatchFailure {
                        file: source,
                        message,
                    });
                    // the stuck worker keeps its thread; the queue gets a new one
                    spawn_worker(setup.clone());
                    alive += 1;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                abandon(&mut result, parser.reporter(), &setup.queue, &mut running);
                break;
            }
        }
    }

    result.failures.sort_by(|a, b| a.file.cmp(&b.file));
    result
}

/// Fail every document that is still queued or running
fn abandon(
    result: &mut BatchResult,
    reporter: &Reporter,
    queue: &Mutex<VecDeque<String>>,
    running: &mut HashMap<String, Instant>,
) {
    let mut sources: Vec<String> = running.drain().map(|(source, _)| source).collect();
    sources.extend(std::mem::take(&mut *queue.lock().unwrap_or_else(PoisonError::into_inner)));
    for source in sources {
        let message = "parse worker exited unexpectedly".to_string();
        reporter.error(codes::PARSE_FAILURE, &source, None, message.clone());
        result.failures.push(BatchFailure {
            file: source,
            message,
        });
    }
}

fn collect(
    result: &mut BatchResult,
    reporter: &Reporter,
    source: String,
    outcome: Outcome,
) {
    match outcome {
        Ok(parsed) => {
            result.sources.insert(
                parsed.path.clone(),
                SourceInfo {
                    source,
                    hash: parsed.hash,
                },
            );
            result.documents.insert(parsed.path, parsed.document);
        }
        Err(message) => {
            reporter.error(codes::PARSE_FAILURE, &source, None, message.clone());
            result.failures.push(BatchFailure {
                file: source,
                message,
            });
        }
    }
}

/// Read, parse and announce one document
fn parse_one(
    parser: &Parser,
    filesystem: &dyn Filesystem,
    root: &str,
    source: &str,
    events: &EventDispatcher,
) -> Outcome {
    let mut text = filesystem.read(source).map_err(|e| e.to_string())?;
    let hash = compute_source_hash(&text);
    events.dispatch(&mut Event::PreParse {
        file: source,
        source: &mut text,
    });

    let path = document_path(root, source);
    let format = InputFormat::from_path(source).unwrap_or_default();
    let mut document = parser
        .parse_document(&path, &text, format)
        .map_err(|e| e.to_string())?;
    events.dispatch(&mut Event::PostParseDocument {
        document: &mut document,
    });
    Ok(Parsed {
        path,
        hash,
        document,
    })
}
