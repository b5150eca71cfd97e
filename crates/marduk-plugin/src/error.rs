use marduk_doc::DocError;
use thiserror::Error;

use crate::abi::PluginStatus;

/// Why a plugin or one of its descriptors was rejected.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("plugin ABI version {found} does not match host version {expected}")]
    AbiMismatch { expected: u32, found: u32 },

    #[error("plugin struct is {found} bytes, host needs at least {expected}")]
    StructTooSmall { expected: usize, found: usize },

    #[error("null pointer for {0}")]
    NullPointer(&'static str),

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("invalid widget descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("widget type '{0}' is already registered")]
    DuplicateType(String),

    #[error("malformed JSON from plugin: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plugin properties rejected: {0}")]
    InvalidProperties(#[from] DocError),

    #[error("plugin {callback} callback returned {status:?}")]
    CallbackFailed { callback: &'static str, status: PluginStatus },
}
