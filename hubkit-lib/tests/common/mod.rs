//! Shared fixtures for hub integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use hubkit_lib::driver::DriverResult;
use hubkit_lib::errors::BoxError;
use hubkit_lib::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;

pub const DRIVER_READ_URL: &str = "http://test.com/";

/// What the driver saw for one write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedWrite {
    pub key: String,
    pub content_type: String,
    pub content_length: Option<u64>,
    pub body: Vec<u8>,
}

/// In-memory driver that answers with `http://test.com/<address>/<path>`.
#[derive(Default)]
pub struct EchoDriver {
    writes: Mutex<Vec<RecordedWrite>>,
}

impl EchoDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn last_write(&self) -> Option<RecordedWrite> {
        self.writes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Driver for EchoDriver {
    fn read_url_prefix(&self) -> String {
        DRIVER_READ_URL.to_string()
    }

    async fn perform_write(&self, mut descriptor: WriteDescriptor) -> DriverResult<String> {
        let mut body = Vec::new();
        descriptor.content.read_to_end(&mut body).await?;

        let key = descriptor.storage_key();
        self.writes.lock().unwrap().push(RecordedWrite {
            key: key.clone(),
            content_type: descriptor.content_type,
            content_length: descriptor.content_length,
            body,
        });
        Ok(format!("{}{}", DRIVER_READ_URL, key))
    }

    async fn list_files(
        &self,
        storage_top_level: &str,
        _page: Option<&str>,
    ) -> DriverResult<ListFilesResult> {
        let prefix = format!("{}/", storage_top_level);
        let entries = self
            .writes
            .lock()
            .unwrap()
            .iter()
            .filter_map(|write| write.key.strip_prefix(&prefix).map(str::to_string))
            .collect();
        Ok(ListFilesResult {
            entries,
            page: None,
        })
    }
}

/// Driver whose writes always fail.
pub struct FailingDriver;

#[async_trait]
impl Driver for FailingDriver {
    fn read_url_prefix(&self) -> String {
        DRIVER_READ_URL.to_string()
    }

    async fn perform_write(&self, _descriptor: WriteDescriptor) -> DriverResult<String> {
        Err("disk full".into())
    }

    async fn list_files(
        &self,
        _storage_top_level: &str,
        _page: Option<&str>,
    ) -> DriverResult<ListFilesResult> {
        Err("unavailable".into())
    }
}

/// Proof checker that can be switched to reject, and counts its calls.
#[derive(Default)]
pub struct ToggleProofs {
    reject: AtomicBool,
    calls: AtomicUsize,
}

impl ToggleProofs {
    pub fn rejecting() -> Arc<Self> {
        let checker = Self::default();
        checker.reject.store(true, Ordering::SeqCst);
        Arc::new(checker)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProofChecker for ToggleProofs {
    async fn check_proofs(
        &self,
        _address: &str,
        _path: &str,
        _read_url_prefix: &str,
    ) -> std::result::Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            Err("insufficient social proofs".into())
        } else {
            Ok(())
        }
    }
}

pub fn auth_headers(token: &AuthToken) -> Headers {
    HashMap::from([("authorization".to_string(), token.to_header())])
}

pub fn body(bytes: &'static [u8]) -> ContentStream {
    Box::new(bytes)
}

pub fn owned_body(bytes: Vec<u8>) -> ContentStream {
    Box::new(std::io::Cursor::new(bytes))
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
