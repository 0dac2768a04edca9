/*!
 * Annotation interchange formats.
 *
 * Each submodule owns one format:
 * - `textgrid`: Praat TextGrid (long text format), read and write
 * - `eaf`: ELAN annotation format, read and write
 * - `trs`: Transcriber transcriptions, read only
 * - `antx`: Annotation Pro, read and write
 * - `media`: best-effort media duration probing used by the EAF reader
 *
 * [`decode`] and [`encode`] are the boundary contract: raw bytes plus a
 * format tag in, canonical [`Annotation`] in the middle, an encoded document
 * out. Paths, dialogs and persistence belong to the caller.
 */

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::anyhow;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::app_config::ConversionOptions;
use crate::errors::{ConversionError, ConversionWarning};
use crate::xml::XmlElement;

pub mod antx;
pub mod eaf;
pub mod media;
pub mod textgrid;
pub mod trs;

pub use media::{MediaProbe, MediaReference, WavProbe};

/// Supported annotation file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationFormat {
    /// Praat TextGrid
    TextGrid,
    /// ELAN EAF
    Eaf,
    /// Transcriber TRS
    Trs,
    /// Annotation Pro ANTX
    Antx,
}

impl AnnotationFormat {
    pub const ALL: [AnnotationFormat; 4] = [Self::TextGrid, Self::Eaf, Self::Trs, Self::Antx];

    // @returns: Format for a file extension, case-insensitive
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "textgrid" => Some(Self::TextGrid),
            "eaf" => Some(Self::Eaf),
            "trs" => Some(Self::Trs),
            "antx" => Some(Self::Antx),
            _ => None,
        }
    }

    // @returns: Format detected from a path's extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    // @returns: Extension used for output files
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TextGrid => "TextGrid",
            Self::Eaf => "eaf",
            Self::Trs => "trs",
            Self::Antx => "antx",
        }
    }

    // @returns: Human-readable format name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TextGrid => "Praat TextGrid",
            Self::Eaf => "ELAN",
            Self::Trs => "Transcriber",
            Self::Antx => "Annotation Pro",
        }
    }

    /// Whether an encoder exists for this format
    pub fn can_encode(&self) -> bool {
        !matches!(self, Self::Trs)
    }

    fn to_lowercase_string(self) -> &'static str {
        match self {
            Self::TextGrid => "textgrid",
            Self::Eaf => "eaf",
            Self::Trs => "trs",
            Self::Antx => "antx",
        }
    }
}

impl fmt::Display for AnnotationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl FromStr for AnnotationFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::from_extension(s.trim_start_matches('.'))
            .ok_or_else(|| anyhow!("Invalid annotation format: {}", s))
    }
}

/// Everything a decoder may need besides the raw content
pub struct DecodeContext<'a> {
    /// Active conversion options
    pub options: &'a ConversionOptions,

    /// Probe used to read the duration of media referenced by the document
    pub media_probe: Box<dyn MediaProbe + 'a>,
}

impl<'a> DecodeContext<'a> {
    /// Context with a WAV probe that only resolves absolute media references
    pub fn new(options: &'a ConversionOptions) -> Self {
        Self {
            options,
            media_probe: Box::new(WavProbe::default()),
        }
    }

    pub fn with_media_probe(mut self, probe: impl MediaProbe + 'a) -> Self {
        self.media_probe = Box::new(probe);
        self
    }
}

/// Result of decoding one document
#[derive(Debug)]
pub struct Decoded {
    pub annotation: Annotation,
    pub warnings: Vec<ConversionWarning>,
}

impl From<Annotation> for Decoded {
    fn from(annotation: Annotation) -> Self {
        Self {
            annotation,
            warnings: Vec::new(),
        }
    }
}

/// Encoder output, serialized by the caller
#[derive(Debug, Clone)]
pub enum EncodedDocument {
    /// Plain-text formats (TextGrid)
    Text(String),
    /// XML formats (EAF, ANTX), still a tree
    Xml(XmlElement),
}

impl EncodedDocument {
    /// Serialize the document; `pretty` only affects XML output
    pub fn render(&self, pretty: bool) -> Result<String, ConversionError> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Xml(root) => root.to_document_string(pretty),
        }
    }
}

/// Check that input is UTF-8 and strip a leading byte order mark
pub fn decode_utf8(content: &[u8]) -> Result<&str, ConversionError> {
    let text = std::str::from_utf8(content).map_err(|e| ConversionError::Encoding(e.to_string()))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Decode raw file content of the given format into an annotation
pub fn decode(content: &[u8], format: AnnotationFormat, context: &DecodeContext) -> Result<Decoded, ConversionError> {
    let text = decode_utf8(content)?;

    let decoded = match format {
        AnnotationFormat::TextGrid => Decoded::from(textgrid::decode(text)?),
        AnnotationFormat::Eaf => eaf::decode(text, context)?,
        AnnotationFormat::Trs => Decoded::from(trs::decode(text, &context.options.transcriber)?),
        AnnotationFormat::Antx => Decoded::from(antx::decode(text, context.options)?),
    };

    debug!("Decoded {}: {}", format.display_name(), decoded.annotation);
    Ok(decoded)
}

/// Normalize an annotation for `target` and encode it
pub fn encode(
    mut annotation: Annotation,
    target: AnnotationFormat,
    options: &ConversionOptions,
) -> Result<EncodedDocument, ConversionError> {
    match target {
        AnnotationFormat::TextGrid => {
            annotation.prepare_for_interval_target();
            Ok(EncodedDocument::Text(textgrid::encode(&annotation)))
        }
        AnnotationFormat::Eaf => {
            annotation.prepare_for_span_target(options.include_point);
            Ok(EncodedDocument::Xml(eaf::encode(&annotation, options)))
        }
        AnnotationFormat::Antx => {
            annotation.prepare_for_span_target(options.include_point);
            Ok(EncodedDocument::Xml(antx::encode(&annotation, options)))
        }
        AnnotationFormat::Trs => Err(ConversionError::UnsupportedTarget(format!(
            "{} files can be read but not written",
            target.display_name()
        ))),
    }
}

/// Parse a numeric field, reporting the field name on failure
pub(crate) fn parse_number(value: &str, field: &str) -> Result<f64, ConversionError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConversionError::MalformedInput(format!("invalid number '{}' for {}", value.trim(), field)))
}
