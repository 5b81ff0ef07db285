//! Error types for `mail_resolve`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A regex match in which none of the three shape groups captured.
    /// This means the token grammar itself is broken, so it is never
    /// swallowed per-record.
    #[error("name token {matched:?} captured none of the shape groups")]
    InvalidNameMatch { matched: String },

    /// The same canonical name claimed by two different person ids.
    /// The identity mapping is unusable; raised before any record
    /// resolution happens.
    #[error("canonical name {name:?} claimed by both {first_id:?} and {second_id:?}")]
    NameCollision {
        name: String,
        first_id: String,
        second_id: String,
    },

    #[error("unparseable floor_date {value:?} (expected YYYY-MM-DDTHH:MM:SS)")]
    InvalidFloorDate { value: String },

    #[error("no .csv input files under {}", .0.display())]
    NoInput(PathBuf),

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
