/*!
 * # annoconv - Annotation format converter
 *
 * A Rust library for converting time-aligned linguistic annotations between
 * the file formats of common annotation tools.
 *
 * ## Features
 *
 * - Read Praat TextGrid, ELAN EAF, Transcriber TRS and Annotation Pro ANTX
 * - Write Praat TextGrid, ELAN EAF and Annotation Pro ANTX
 * - Resolve EAF time slots and referring annotations, including deep chains
 * - Derive Transcriber end times from start-only markers
 * - Gap-fill interval tiers and optionally stretch point tiers into spans
 * - Batch conversion of whole directory trees
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `annotation`: Canonical in-memory model and normalization passes
 * - `formats`: One decoder/encoder per file format:
 *   - `formats::textgrid`: Praat TextGrid
 *   - `formats::eaf`: ELAN
 *   - `formats::trs`: Transcriber (read only)
 *   - `formats::antx`: Annotation Pro
 *   - `formats::media`: Media duration probing
 * - `xml`: Owned XML tree shared by the XML formats
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod annotation;
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod formats;
pub mod xml;

// Re-export main types for easier usage
pub use annotation::{Annotation, Interval, Tier};
pub use app_config::{Config, ConversionOptions};
pub use app_controller::{BatchSummary, ConversionOutcome, Controller};
pub use errors::{AppError, ConversionError, ConversionWarning};
pub use formats::{decode, encode, AnnotationFormat, DecodeContext, Decoded, EncodedDocument};
