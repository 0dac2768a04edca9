use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::errors::{AppError, ConversionError};
use crate::file_utils::FileManager;
use crate::formats::{self, AnnotationFormat, DecodeContext, WavProbe};

// @module: Application controller for annotation conversion

/// Name of the batch issue log written next to the converted inputs
pub const ISSUES_LOG_FILE: &str = "annoconv.issues.log";

/// What happened to a single input file
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    /// Output written to the path
    Converted(PathBuf),
    /// Output already existed and overwriting was not requested
    Skipped(PathBuf),
}

/// Counts for a directory run
#[derive(Debug, Default, Clone)]
pub struct BatchSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,

    // @field: Failing inputs with the error that stopped them
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.converted + self.skipped + self.failed
    }
}

/// Main application controller for annotation conversion
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert one file into `output_dir`.
    ///
    /// The output is named after the input's stem with the target's
    /// extension. An existing output is left alone unless `force_overwrite`
    /// is set, and the input itself is never overwritten.
    pub fn convert_file(
        &self,
        input_file: &Path,
        output_dir: &Path,
        target: AnnotationFormat,
        force_overwrite: bool,
    ) -> Result<ConversionOutcome> {
        if !FileManager::file_exists(input_file) {
            return Err(AppError::File(format!("Input file does not exist: {:?}", input_file)).into());
        }
        if !target.can_encode() {
            return Err(ConversionError::UnsupportedTarget(format!(
                "{} files can be read but not written",
                target.display_name()
            ))
            .into());
        }

        let source = AnnotationFormat::from_path(input_file)
            .ok_or_else(|| anyhow!("Unrecognized annotation file extension: {:?}", input_file))?;

        let output_path = FileManager::generate_output_path(input_file, output_dir, target.extension());
        if output_path.exists() {
            if Self::same_file(input_file, &output_path) {
                return Err(anyhow!("Refusing to overwrite the input file {:?}", input_file));
            }
            if !force_overwrite {
                warn!(
                    "Skipping {:?}, output already exists (use -f to force overwrite)",
                    output_path
                );
                return Ok(ConversionOutcome::Skipped(output_path));
            }
        }

        let content = FileManager::read_utf8(input_file)?;

        let options = &self.config.conversion;
        let base_dir = input_file.parent().unwrap_or(Path::new("."));
        let context = DecodeContext::new(options).with_media_probe(WavProbe::with_base_dir(base_dir));

        let decoded = formats::decode(content.as_bytes(), source, &context)
            .with_context(|| format!("Failed to read {} file {:?}", source.display_name(), input_file))?;
        for warning in &decoded.warnings {
            warn!("{:?}: {}", input_file, warning);
        }

        let rendered = formats::encode(decoded.annotation, target, options)?
            .render(self.config.output.pretty_print)?;

        FileManager::write_atomic(&output_path, &rendered)?;
        info!("Success: {}", output_path.display());

        Ok(ConversionOutcome::Converted(output_path))
    }

    /// Convert every recognized annotation file below `input_dir`.
    ///
    /// Outputs go next to each input, or into `output_dir` mirroring the
    /// input tree. Inputs already in the target format are skipped. One
    /// file's failure is logged and counted, and the run moves on.
    pub fn run_folder(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        target: AnnotationFormat,
        force_overwrite: bool,
    ) -> Result<BatchSummary> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_annotation_files(input_dir)?;
        if files.is_empty() {
            return Err(anyhow!("No annotation files found in directory: {:?}", input_dir));
        }

        let folder_pb = ProgressBar::new(files.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Converting files");

        let mut summary = BatchSummary::default();

        for file in &files {
            let file_name = file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Converting: {}", file_name));

            if AnnotationFormat::from_path(file) == Some(target) {
                debug!("Skipping {:?}, already in target format", file);
                summary.skipped += 1;
                folder_pb.inc(1);
                continue;
            }

            let file_output_dir = Self::output_dir_for(file, input_dir, output_dir);
            match self.convert_file(file, &file_output_dir, target, force_overwrite) {
                Ok(ConversionOutcome::Converted(_)) => summary.converted += 1,
                Ok(ConversionOutcome::Skipped(_)) => summary.skipped += 1,
                Err(e) => {
                    error!("Error converting file {}: {:#}", file_name, e);
                    summary.failed += 1;
                    summary.failures.push((file.clone(), format!("{:#}", e)));
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder conversion complete");

        let summary_message = format!(
            "Folder conversion completed: {} converted, {} skipped, {} errors",
            summary.converted, summary.skipped, summary.failed
        );
        info!("{} in {}", summary_message, Self::format_duration(start_time.elapsed()));

        if summary.failed > 0 {
            let log_file_path = input_dir.join(ISSUES_LOG_FILE);
            if let Err(e) = self.write_issues_log(&log_file_path, &summary_message, &summary) {
                warn!("Failed to write folder issues to file: {}", e);
            } else {
                info!("Folder issues written to {}", log_file_path.display());
            }
        }

        Ok(summary)
    }

    // @returns: Output directory for one input of a folder run
    fn output_dir_for(file: &Path, input_dir: &Path, output_dir: Option<&Path>) -> PathBuf {
        let parent = file.parent().unwrap_or(input_dir);
        match output_dir {
            Some(root) => match parent.strip_prefix(input_dir) {
                Ok(relative) => root.join(relative),
                Err(_) => root.to_path_buf(),
            },
            None => parent.to_path_buf(),
        }
    }

    fn same_file(a: &Path, b: &Path) -> bool {
        match (a.canonicalize(), b.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    fn write_issues_log(&self, path: &Path, summary_message: &str, summary: &BatchSummary) -> Result<()> {
        FileManager::append_to_log_file(path, summary_message)?;
        for (file, reason) in &summary.failures {
            FileManager::append_to_log_file(path, &format!("ERROR {}: {}", file.display(), reason))?;
        }
        Ok(())
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
