/*!
 * Integration tests for single-file conversion through the controller
 */

use anyhow::Result;
use std::fs;

use crate::common;
use annoconv::app_config::Config;
use annoconv::app_controller::{ConversionOutcome, Controller};
use annoconv::errors::{AppError, ConversionError};
use annoconv::file_utils::FileManager;
use annoconv::formats::{self, AnnotationFormat, DecodeContext};

fn controller() -> Result<Controller> {
    Controller::with_config(Config::default())
}

/// Test a TextGrid to EAF conversion end to end
#[test]
fn test_convert_file_withTextGridToEaf_shouldWriteEaf() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "speech.TextGrid", common::SAMPLE_TEXTGRID)?;
    let output_dir = temp_dir.path().join("out");

    let outcome = controller()?.convert_file(&input, &output_dir, AnnotationFormat::Eaf, false)?;

    let output = output_dir.join("speech.eaf");
    assert_eq!(outcome, ConversionOutcome::Converted(output.clone()));
    let content = fs::read_to_string(&output)?;
    assert!(content.starts_with("<?xml"));
    assert!(content.contains("TIER_ID=\"words\""));
    assert!(content.contains("urn:nl-mpi-tools-elan-eaf:"));

    Ok(())
}

/// Test that every readable format converts to every writable format
#[test]
fn test_convert_file_withEveryPair_shouldProduceDecodableOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let inputs = [
        common::create_test_file(temp_dir.path(), "tg.TextGrid", common::SAMPLE_TEXTGRID)?,
        common::create_test_file(temp_dir.path(), "elan.eaf", &common::sample_eaf(""))?,
        common::create_test_file(temp_dir.path(), "trans.trs", common::SAMPLE_TRS)?,
        common::create_test_file(temp_dir.path(), "pro.antx", common::SAMPLE_ANTX)?,
    ];
    let controller = controller()?;
    let options = controller.config().conversion.clone();

    for target in [AnnotationFormat::TextGrid, AnnotationFormat::Eaf, AnnotationFormat::Antx] {
        let output_dir = temp_dir.path().join(target.to_string());
        for input in &inputs {
            let outcome = controller.convert_file(input, &output_dir, target, false)?;
            let ConversionOutcome::Converted(path) = outcome else {
                panic!("expected {:?} to convert", input);
            };

            let content = FileManager::read_utf8(&path)?;
            let context = DecodeContext::new(&options);
            let decoded = formats::decode(content.as_bytes(), target, &context)?;
            assert!(!decoded.annotation.tiers.is_empty(), "{:?} -> {}", input, target);
        }
    }

    Ok(())
}

/// Test that an existing output is skipped unless forced
#[test]
fn test_convert_file_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "trans.trs", common::SAMPLE_TRS)?;
    let existing = common::create_test_file(temp_dir.path(), "trans.TextGrid", "keep me")?;
    let controller = controller()?;

    let outcome = controller.convert_file(&input, temp_dir.path(), AnnotationFormat::TextGrid, false)?;
    assert_eq!(outcome, ConversionOutcome::Skipped(existing.clone()));
    assert_eq!(fs::read_to_string(&existing)?, "keep me");

    let outcome = controller.convert_file(&input, temp_dir.path(), AnnotationFormat::TextGrid, true)?;
    assert_eq!(outcome, ConversionOutcome::Converted(existing.clone()));
    assert!(fs::read_to_string(&existing)?.contains("name = \"Transcription\""));

    Ok(())
}

/// Test that converting a file onto itself is refused even with force
#[test]
fn test_convert_file_withSameInputAndOutput_shouldRefuse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "tg.TextGrid", common::SAMPLE_TEXTGRID)?;

    let result = controller()?.convert_file(&input, temp_dir.path(), AnnotationFormat::TextGrid, true);

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&input)?, common::SAMPLE_TEXTGRID);

    Ok(())
}

/// Test that non-UTF-8 input fails without creating any output
#[test]
fn test_convert_file_withLatin1Input_shouldNotCreateOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("latin1.TextGrid");
    let latin1: Vec<u8> = common::SAMPLE_TEXTGRID.replace("hello", "caf\u{e9}").chars().map(|c| c as u8).collect();
    fs::write(&input, latin1)?;
    let output_dir = temp_dir.path().join("out");

    let err = controller()?
        .convert_file(&input, &output_dir, AnnotationFormat::Eaf, false)
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConversionError>(),
        Some(ConversionError::Encoding(_))
    ));
    assert!(!output_dir.join("latin1.eaf").exists());

    Ok(())
}

/// Test that requesting a Transcriber output is rejected
#[test]
fn test_convert_file_toTrs_shouldBeUnsupported() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "tg.TextGrid", common::SAMPLE_TEXTGRID)?;

    let err = controller()?
        .convert_file(&input, temp_dir.path(), AnnotationFormat::Trs, false)
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConversionError>(),
        Some(ConversionError::UnsupportedTarget(_))
    ));
    assert!(!temp_dir.path().join("tg.trs").exists());

    Ok(())
}

/// Test that compact output has no indentation
#[test]
fn test_convert_file_withCompactOutput_shouldWriteSingleLineXml() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "pro.antx", common::SAMPLE_ANTX)?;
    let mut config = Config::default();
    config.output.pretty_print = false;

    let outcome = Controller::with_config(config)?.convert_file(&input, temp_dir.path(), AnnotationFormat::Eaf, false)?;

    let ConversionOutcome::Converted(path) = outcome else {
        panic!("expected conversion");
    };
    let content = fs::read_to_string(path)?;
    assert_eq!(content.trim_end().lines().count(), 1);

    Ok(())
}

/// Test that a missing input is reported as a file error
#[test]
fn test_convert_file_withMissingInput_shouldFailWithFileError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let err = controller()?
        .convert_file(&temp_dir.path().join("nowhere.eaf"), temp_dir.path(), AnnotationFormat::TextGrid, false)
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::File(_))));

    Ok(())
}
