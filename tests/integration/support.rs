//! Scripted collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use kline_archive_downloader::archive::{ArchiveTransport, ByteStream, FetchError, FetchResult};
use kline_archive_downloader::downloader::Sleeper;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Transport serving canned responses and recording every requested URL
///
/// URLs with a queued script consume it one response per request; every
/// other URL is served with a small body, unless it is marked missing.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<FetchResult<Vec<u8>>>>>,
    missing: Vec<String>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer 404 for every URL ending in `suffix`
    pub fn with_missing(mut self, suffix: &str) -> Self {
        self.missing.push(suffix.to_string());
        self
    }

    /// Queue responses for URLs ending in `suffix`
    pub fn with_script(self, suffix: &str, responses: Vec<FetchResult<Vec<u8>>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(suffix.to_string(), responses.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ArchiveTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> FetchResult<ByteStream> {
        self.requests.lock().unwrap().push(url.to_string());

        if self.missing.iter().any(|m| url.ends_with(m.as_str())) {
            return Err(FetchError::HttpStatus {
                status: 404,
                url: url.to_string(),
            });
        }

        let scripted = {
            let mut scripts = self.scripts.lock().unwrap();
            scripts
                .iter_mut()
                .find(|(suffix, _)| url.ends_with(suffix.as_str()))
                .and_then(|(_, queue)| queue.pop_front())
        };

        let body = match scripted {
            Some(response) => response?,
            None => b"PK\x03\x04archive".to_vec(),
        };
        let chunk: FetchResult<Bytes> = Ok(Bytes::from(body));
        Ok(Box::pin(futures::stream::iter(vec![chunk])))
    }
}

/// Sleeper recording requested delays instead of waiting
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

pub fn transient() -> FetchResult<Vec<u8>> {
    Err(FetchError::NetworkError("connection reset by peer".to_string()))
}
