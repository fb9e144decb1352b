#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use trellis::http::{Request, Response};
use trellis::logger::{Logger, SharedLogger};

/// Stamps every hit with a sequence number from one atomic counter.
#[derive(Default)]
pub struct Recorder {
    counter: AtomicUsize,
    hits: Mutex<Vec<(String, usize)>>,
}

impl Recorder {
    pub fn shared() -> Arc<Recorder> {
        Arc::new(Recorder::default())
    }

    pub fn hit(&self, name: &str) {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        self.hits.lock().unwrap().push((name.to_string(), seq));
    }

    pub fn names(&self) -> Vec<String> {
        let mut hits = self.hits.lock().unwrap().clone();
        hits.sort_by_key(|(_, seq)| *seq);
        hits.into_iter().map(|(name, _)| name).collect()
    }
}

/// Sync hook recording `name` on the request's [`Recorder`] service.
pub fn record(name: &'static str) -> impl Fn(Request, Response) -> Response + Send + Sync + 'static {
    move |req: Request, res: Response| {
        if let Some(recorder) = req.service::<Arc<Recorder>>() {
            recorder.hit(name);
        }
        res
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: &'static str,
    pub source: String,
    pub message: String,
}

#[derive(Clone, Default)]
pub struct RecordingLogger {
    source: String,
    lines: Arc<Mutex<Vec<LogLine>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> SharedLogger {
        Arc::new(self.clone())
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().unwrap().clone()
    }

    pub fn from_source(&self, source: &str) -> Vec<LogLine> {
        self.lines().into_iter().filter(|line| line.source == source).collect()
    }

    fn push(&self, level: &'static str, message: &str) {
        self.lines.lock().unwrap().push(LogLine {
            level,
            source: self.source.clone(),
            message: message.to_string(),
        });
    }
}

impl Logger for RecordingLogger {
    fn source(&self, source: &str) -> SharedLogger {
        Arc::new(RecordingLogger {
            source: source.to_string(),
            lines: Arc::clone(&self.lines),
        })
    }

    fn debug(&self, message: &str) {
        self.push("debug", message);
    }

    fn info(&self, message: &str) {
        self.push("info", message);
    }

    fn warn(&self, message: &str) {
        self.push("warn", message);
    }

    fn error(&self, message: &str) {
        self.push("error", message);
    }

    fn critical(&self, message: &str) {
        self.push("critical", message);
    }
}
