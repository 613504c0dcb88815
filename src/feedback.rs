// ABOUTME: Append-only JSON-Lines store for user feedback on predictions
// ABOUTME: Mutex-serialized atomic appends with lazy, restartable reads
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Feedback Store
//!
//! An append-only log of user correctness judgments, one JSON object per line.
//! Appends serialize on a writer mutex so concurrent events never interleave
//! within a record; each event is written and flushed as one unit. There is no
//! update or delete operation.
//!
//! Reads open an independent handle, so they can run concurrently with
//! appends, but are not guaranteed to observe events not yet flushed.

use crate::config::FeedbackConfig;
use crate::errors::{AppError, AppResult};
use crate::models::FeedbackEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Append-only JSON-Lines store for feedback events
pub struct FeedbackStore {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    sync_on_append: bool,
}

impl FeedbackStore {
    /// Open (or create) the feedback log at the configured path
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::PersistenceError`](crate::errors::ErrorCode) when
    /// the log file or its parent directory cannot be created.
    pub fn open(config: &FeedbackConfig) -> AppResult<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::persistence(format!(
                        "cannot create feedback directory {}",
                        parent.display()
                    ))
                    .with_source(e)
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .map_err(|e| {
                AppError::persistence(format!(
                    "cannot open feedback log {}",
                    config.path.display()
                ))
                .with_source(e)
            })?;

        info!(path = %config.path.display(), "feedback store opened");

        Ok(Self {
            path: config.path.clone(),
            writer: Mutex::new(BufWriter::new(file)),
            sync_on_append: config.sync_on_append,
        })
    }

    /// Path of the underlying log file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event durably.
    ///
    /// The event is serialized outside the lock, then written and flushed as a
    /// single line under it. Returns only after the write reached the OS (and
    /// the disk, when `sync_on_append` is configured). Failures surface as
    /// [`ErrorCode::PersistenceError`](crate::errors::ErrorCode); the event is
    /// never silently dropped — the caller decides whether to retry.
    pub fn append(&self, event: &FeedbackEvent) -> AppResult<()> {
        let mut line = serde_json::to_string(event)
            .map_err(|e| AppError::serialization("feedback event is not serializable").with_source(e))?;
        line.push('\n');

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| AppError::persistence("feedback writer lock poisoned"))?;

        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| {
                AppError::persistence(format!(
                    "failed to append feedback for prediction {}",
                    event.prediction_id
                ))
                .with_source(e)
            })?;

        if self.sync_on_append {
            writer.get_ref().sync_all().map_err(|e| {
                AppError::persistence("failed to fsync feedback log").with_source(e)
            })?;
        }

        debug!(prediction_id = %event.prediction_id, "feedback appended");
        Ok(())
    }

    /// Lazily iterate all events currently flushed to the log.
    ///
    /// Each call opens a fresh reader, so the sequence is finite and
    /// restartable. A missing log file reads as an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::PersistenceError`](crate::errors::ErrorCode) when
    /// the log exists but cannot be opened.
    pub fn read_all(&self) -> AppResult<FeedbackIter> {
        match File::open(&self.path) {
            Ok(file) => Ok(FeedbackIter {
                lines: Some(BufReader::new(file).lines()),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(FeedbackIter { lines: None })
            }
            Err(e) => Err(AppError::persistence(format!(
                "cannot open feedback log {}",
                self.path.display()
            ))
            .with_source(e)),
        }
    }
}

/// Lazy iterator over stored feedback events
pub struct FeedbackIter {
    lines: Option<Lines<BufReader<File>>>,
}

impl Iterator for FeedbackIter {
    type Item = AppResult<FeedbackEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        let lines = self.lines.as_mut()?;

        loop {
            match lines.next()? {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(&line).map_err(|e| {
                        AppError::serialization("corrupt feedback record").with_source(e)
                    }));
                }
                Err(e) => {
                    return Some(Err(
                        AppError::persistence("failed to read feedback log").with_source(e)
                    ))
                }
            }
        }
    }
}
