use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::classifier::Classifier;
use crate::config::Config;
use crate::discard::{load_discard_ids, stage_discard_list};
use crate::error::{CurateError, Result};
use crate::llm::TextModel;
use crate::model::SourceKind;
use crate::reconcile::{ReconcileStats, reconcile};
use crate::scanner::{ScanReport, Scanner};
use crate::sources::{VectorStore, load_validation_items};

pub struct CollectResult {
    pub reports: Vec<ScanReport>,
    pub artifacts: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub training_discard_ids: usize,
    pub validation_discard_ids: usize,
    pub stats: ReconcileStats,
}

pub fn discard_path(results_dir: &Path, source: SourceKind) -> PathBuf {
    results_dir.join(source.discard_file_name())
}

/// `<dir>/<input stem>_cleaned_<YYYYmmdd_HHMMSS>.jsonl`
pub fn cleaned_output_path(dir: &Path, input: &Path, at: DateTime<Local>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "evaluation".to_string());
    dir.join(format!("{stem}_cleaned_{}.jsonl", at.format("%Y%m%d_%H%M%S")))
}

/// Collection phase: scan training then validation and write both discard lists.
///
/// Both sources are opened before the first model call, so a missing input
/// aborts the run without spending any requests.
pub fn run_collect(
    config: &Config,
    model: &dyn TextModel,
    store: &mut dyn VectorStore,
) -> Result<CollectResult> {
    let delay = config.scan.delay()?;

    store.use_collection(
        &config.paths.train_collection,
        &config.paths.train_collection_description,
    )?;
    let training = store.get()?.into_items();
    info!(count = training.len(), "training samples found");

    let validation = load_validation_items(&config.paths.validation_items)?;
    info!(count = validation.len(), "validation samples found");

    let classifier = Classifier::new(model, &config.prompts);
    let scanner = Scanner::new(&classifier, delay);

    let reports = vec![
        scanner.scan(SourceKind::Training, training, config.scan.max_train_samples),
        scanner.scan(
            SourceKind::Validation,
            validation,
            config.scan.max_validation_samples,
        ),
    ];

    // Both lists are fully written before either replaces the previous pair.
    let staged = reports
        .iter()
        .map(|report| {
            stage_discard_list(
                &discard_path(&config.paths.results_dir, report.source),
                &report.entries,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let mut artifacts = Vec::with_capacity(staged.len());
    for (report, list) in reports.iter().zip(staged) {
        let path = list.commit()?;
        info!(source = %report.source, path = %path.display(), entries = report.entries.len(), "discard list written");
        artifacts.push(path);
    }

    Ok(CollectResult { reports, artifacts })
}

/// Cleaning phase: apply the reviewed discard lists to the evaluation file.
pub fn run_clean(config: &Config, now: DateTime<Local>) -> Result<CleanResult> {
    let results_dir = &config.paths.results_dir;
    let validation_ids = load_discard_ids(&discard_path(results_dir, SourceKind::Validation))?;
    let training_ids = load_discard_ids(&discard_path(results_dir, SourceKind::Training))?;
    info!(
        validation = validation_ids.len(),
        training = training_ids.len(),
        "discard ids loaded"
    );

    let input = config.paths.evaluation_input.clone();
    if !input.is_file() {
        return Err(CurateError::Config(format!(
            "evaluation file not found: {}",
            input.display()
        )));
    }

    let out_dir = &config.paths.cleaned_output_dir;
    fs::create_dir_all(out_dir)?;
    let output = cleaned_output_path(out_dir, &input, now);

    // The cleaned file only appears under its final name once every line reconciled.
    let reader = BufReader::new(File::open(&input)?);
    let mut staged = NamedTempFile::new_in(out_dir)?;
    let stats = reconcile(
        reader,
        BufWriter::new(staged.as_file_mut()),
        &training_ids,
        &validation_ids,
    )?;
    staged.persist(&output).map_err(|err| err.error)?;
    info!(path = %output.display(), retained = stats.retained, "cleaned file written");

    Ok(CleanResult {
        input,
        output,
        training_discard_ids: training_ids.len(),
        validation_discard_ids: validation_ids.len(),
        stats,
    })
}
