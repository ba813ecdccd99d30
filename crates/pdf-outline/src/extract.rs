use std::path::PathBuf;

use pdf_outline::{envelope, OutlineExtractor};

use crate::config::load_substitutions;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct ExtractOptions {
    /// Path to the PDF file
    file: PathBuf,

    /// JSON file with literal text substitutions
    #[arg(short, long, env = "PDF_OUTLINE_SUBSTITUTIONS")]
    substitutions: Option<PathBuf>,
}

pub fn run(options: ExtractOptions, global: crate::Global) -> Result<()> {
    let substitutions = load_substitutions(options.substitutions.as_deref())?;

    if global.verbose {
        eprintln!("File: {}", options.file.display());
        eprintln!(
            "Substitutions: {} pre, {} post",
            substitutions.pre.len(),
            substitutions.post.len()
        );
    }

    let extractor = OutlineExtractor::with_substitutions(substitutions);
    let result = extractor.extract_path(&options.file);
    println!("{}", envelope::to_json_pretty(&result)?);
    Ok(())
}
