// Copyright (c) 2026 rezky_nightky

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FxError {
    #[error("terminal i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot install log subscriber: {0}")]
    Subscriber(String),
    #[error("cannot allocate a {width}x{height} raster surface")]
    Surface { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, FxError>;
