//! Command-line Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the library database")]
    Database,
    #[display("could not open attachment storage")]
    Storage,
    #[display("could not create the HTTP client")]
    Http,
    #[display("manuscript pipeline failed")]
    Pipeline,
    #[display("could not write {}", _0.display())]
    Output(#[error(not(source))] PathBuf),
}
