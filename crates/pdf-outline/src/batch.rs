use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use colored::Colorize;
use pdf_outline::{envelope, OutlineExtractor, OutlineResult};

use crate::config::{load_substitutions, Directories};
use crate::prelude::{println, *};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct BatchOptions {
    /// Directory containing the PDF files (default: /app/input, else ./input)
    #[arg(short, long, env = "PDF_OUTLINE_INPUT")]
    input: Option<PathBuf>,

    /// Directory for the JSON outlines (default: /app/output, else ./output)
    #[arg(short, long, env = "PDF_OUTLINE_OUTPUT")]
    output: Option<PathBuf>,

    /// JSON file with literal text substitutions
    #[arg(short, long, env = "PDF_OUTLINE_SUBSTITUTIONS")]
    substitutions: Option<PathBuf>,
}

/// Counts reported at the end of a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

pub fn run(options: BatchOptions, global: crate::Global) -> Result<()> {
    let dirs = Directories::resolve(options.input, options.output);
    let substitutions = load_substitutions(options.substitutions.as_deref())?;

    if global.verbose {
        println!("Input directory: {}", dirs.input.display());
        println!("Output directory: {}", dirs.output.display());
        println!(
            "Substitutions: {} pre, {} post",
            substitutions.pre.len(),
            substitutions.post.len()
        );
        println!();
    }

    let extractor = OutlineExtractor::with_substitutions(substitutions);
    process_directory(&extractor, &dirs)?;
    Ok(())
}

/// Extract every PDF in `dirs.input` and write `<stem>.json` into
/// `dirs.output`. Per-document failures are written as error results and
/// never stop the run, nor does an output file that cannot be written.
pub fn process_directory(extractor: &OutlineExtractor, dirs: &Directories) -> Result<BatchSummary> {
    let pdfs = find_pdfs(&dirs.input)?;
    let mut summary = BatchSummary::default();

    if pdfs.is_empty() {
        println!("No PDF files found in input directory.");
        return Ok(summary);
    }
    println!("Found {} PDF file(s) to process.", pdfs.len());

    std::fs::create_dir_all(&dirs.output)
        .with_context(|| format!("creating output directory {}", dirs.output.display()))?;

    for pdf in &pdfs {
        let name = file_name(pdf);
        println!("Processing: {}", name);

        let result = extract_guarded(extractor, pdf);
        let output_name = format!("{}.json", file_stem(pdf));
        summary.processed += 1;

        if let Err(e) = write_result(&dirs.output.join(&output_name), &result) {
            log::error!("cannot save outline for {}: {:#}", name, e);
            summary.failed += 1;
            println!("{} Error processing {}: {:#}", "✗".red(), name, e);
            continue;
        }

        match &result.error {
            None => println!("{} Saved outline to: {}", "✓".green(), output_name),
            Some(error) => {
                summary.failed += 1;
                println!("{} Error processing {}: {}", "✗".red(), name, error);
            }
        }
    }

    println!("{}", "PDF outline extraction completed.".bold());
    Ok(summary)
}

/// `*.pdf` files directly inside `dir`, sorted by file name.
pub fn find_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(Error::InputNotFound(dir.to_path_buf()).into());
    }
    if !dir.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()).into());
    }

    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "pdf") {
            pdfs.push(path);
        }
    }

    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}

/// Run one extraction, turning a panic into an error result.
fn extract_guarded(extractor: &OutlineExtractor, pdf: &Path) -> OutlineResult {
    panic::catch_unwind(AssertUnwindSafe(|| extractor.extract_path(pdf))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unexpected panic".to_string());
        log::error!("panic while processing {}: {}", pdf.display(), message);
        envelope::to_error(message)
    })
}

fn write_result(path: &Path, result: &OutlineResult) -> Result<()> {
    let json = envelope::to_json_pretty(result)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
