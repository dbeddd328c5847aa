//! Command-line Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of a command failed.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("failed to open photo source")]
    Source,
    #[display("catalog operation failed")]
    Catalog,
    #[display("failed to write {}", _0.display())]
    Output(#[error(not(source))] PathBuf),
}
