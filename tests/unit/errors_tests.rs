/*!
 * Tests for error types and conversions
 */

use annoconv::errors::{AppError, ConversionError, ConversionWarning};

#[test]
fn test_conversionError_encoding_shouldDisplayCorrectly() {
    let error = ConversionError::Encoding("invalid utf-8 sequence".to_string());
    let display = format!("{}", error);
    assert!(display.contains("UTF-8"));
    assert!(display.contains("invalid utf-8 sequence"));
}

#[test]
fn test_conversionError_malformedInput_shouldDisplayCorrectly() {
    let error = ConversionError::MalformedInput("EAF document has no TIME_ORDER".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Malformed input"));
    assert!(display.contains("TIME_ORDER"));
}

#[test]
fn test_conversionWarning_missingMedia_shouldNameMediaAndFallback() {
    let warning = ConversionWarning::MissingMedia {
        media: "file:///audio/take1.wav".to_string(),
        reason: "No such file".to_string(),
        fallback_secs: 300.0,
    };
    let display = format!("{}", warning);
    assert!(display.contains("take1.wav"));
    assert!(display.contains("No such file"));
    assert!(display.contains("300"));
}

#[test]
fn test_appError_fromConversionError_shouldWrap() {
    let app_error: AppError = ConversionError::UnsupportedTarget("trs".to_string()).into();
    assert!(matches!(app_error, AppError::Conversion(ConversionError::UnsupportedTarget(_))));
    assert!(format!("{}", app_error).contains("Conversion error"));
}

#[test]
fn test_appError_fromIoError_shouldBeFileError() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.eaf");
    let app_error: AppError = io_error.into();
    assert!(matches!(app_error, AppError::File(ref msg) if msg.contains("missing.eaf")));
}

#[test]
fn test_appError_fromAnyhow_shouldBeUnknown() {
    let app_error: AppError = anyhow::anyhow!("something odd").into();
    assert!(matches!(app_error, AppError::Unknown(_)));
}
