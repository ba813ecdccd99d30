use std::path::{Path, PathBuf};

use pdf_outline::Substitutions;

use crate::prelude::*;

/// Container mount point checked before falling back to relative paths.
const CONTAINER_INPUT: &str = "/app/input";
const CONTAINER_OUTPUT: &str = "/app/output";

/// Input and output directories for a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directories {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Directories {
    /// Explicit paths win. Otherwise use the container layout when
    /// `/app/input` exists, and `input`/`output` in the working directory when
    /// it does not.
    pub fn resolve(input: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        Self::resolve_with(input, output, Path::new(CONTAINER_INPUT).is_dir())
    }

    fn resolve_with(input: Option<PathBuf>, output: Option<PathBuf>, in_container: bool) -> Self {
        let (default_input, default_output) = if in_container {
            (CONTAINER_INPUT, CONTAINER_OUTPUT)
        } else {
            ("input", "output")
        };

        Directories {
            input: input.unwrap_or_else(|| PathBuf::from(default_input)),
            output: output.unwrap_or_else(|| PathBuf::from(default_output)),
        }
    }
}

/// Load substitution tables from a JSON file, or the empty tables when no
/// file is given.
pub fn load_substitutions(path: Option<&Path>) -> Result<Substitutions> {
    let Some(path) = path else {
        return Ok(Substitutions::default());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading substitutions from {}", path.display()))?;

    let substitutions: Substitutions =
        serde_json::from_str(&raw).map_err(|e| Error::InvalidSubstitutions {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    log::debug!(
        "loaded {} pre and {} post substitutions from {}",
        substitutions.pre.len(),
        substitutions.post.len(),
        path.display()
    );
    Ok(substitutions)
}
