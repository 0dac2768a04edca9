use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use url::Url;

// @module: Media duration probing for documents that reference audio

/// Media locations declared by a document header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaReference {
    /// Absolute location, usually a `file:///` URL
    pub url: Option<String>,

    /// Location relative to the annotation file
    pub relative_url: Option<String>,
}

impl MediaReference {
    /// Label used in warnings
    pub fn describe(&self) -> String {
        self.url
            .clone()
            .or_else(|| self.relative_url.clone())
            .unwrap_or_else(|| "<none>".to_string())
    }
}

/// Reads the duration of referenced media.
///
/// Probing is best-effort: callers treat any error as "duration unknown" and
/// fall back to values found in the document itself.
pub trait MediaProbe {
    fn duration_secs(&self, media: &MediaReference) -> Result<f64>;
}

/// Probe for local WAV files, read through `hound`
#[derive(Debug, Clone, Default)]
pub struct WavProbe {
    // @field: Directory used to resolve relative references
    base_dir: Option<PathBuf>,
}

impl WavProbe {
    /// Probe that resolves relative references against `base_dir`
    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: Some(base_dir.as_ref().to_path_buf()),
        }
    }

    // @returns: Local paths worth trying, absolute reference first
    fn candidate_paths(&self, media: &MediaReference) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(url) = media.url.as_deref() {
            if let Some(path) = Self::url_to_path(url) {
                candidates.push(path);
            }
        }

        if let (Some(relative), Some(base_dir)) = (media.relative_url.as_deref(), self.base_dir.as_ref()) {
            let relative = relative.strip_prefix("file:").unwrap_or(relative);
            let relative = relative.trim_start_matches('/');
            candidates.push(base_dir.join(relative));
        }

        candidates
    }

    fn url_to_path(reference: &str) -> Option<PathBuf> {
        if reference.starts_with("file:") {
            Url::parse(reference).ok()?.to_file_path().ok()
        } else if Path::new(reference).is_absolute() {
            Some(PathBuf::from(reference))
        } else {
            None
        }
    }

    fn wav_duration(path: &Path) -> Result<f64> {
        let reader = hound::WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {:?}", path))?;
        let sample_rate = reader.spec().sample_rate;
        if sample_rate == 0 {
            return Err(anyhow!("WAV file has a zero sample rate: {:?}", path));
        }
        Ok(reader.duration() as f64 / sample_rate as f64)
    }
}

impl MediaProbe for WavProbe {
    fn duration_secs(&self, media: &MediaReference) -> Result<f64> {
        let candidates = self.candidate_paths(media);
        if candidates.is_empty() {
            return Err(anyhow!("no locally resolvable media path"));
        }

        let mut failures = Vec::new();
        for path in candidates {
            match Self::wav_duration(&path) {
                Ok(duration) => return Ok(duration),
                Err(e) => failures.push(format!("{:#}", e)),
            }
        }

        Err(anyhow!(failures.join("; ")))
    }
}
