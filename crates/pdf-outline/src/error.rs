use std::path::PathBuf;

#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Input directory not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid substitutions file {}: {reason}", .path.display())]
    InvalidSubstitutions { path: PathBuf, reason: String },
}
