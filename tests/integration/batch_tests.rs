/*!
 * Integration tests for directory conversion
 */

use anyhow::Result;
use std::fs;

use crate::common;
use annoconv::app_config::Config;
use annoconv::app_controller::{Controller, ISSUES_LOG_FILE};
use annoconv::formats::AnnotationFormat;

/// Test that one malformed file does not stop the rest of the batch
#[test]
fn test_run_folder_withOneBrokenFile_shouldConvertTheRest() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "a.TextGrid", common::SAMPLE_TEXTGRID)?;
    common::create_test_file(temp_dir.path(), "b.eaf", "<ANNOTATION_DOCUMENT><HEADER/></ANNOTATION_DOCUMENT>")?;
    common::create_test_file(temp_dir.path(), "nested/c.trs", common::SAMPLE_TRS)?;
    common::create_test_file(temp_dir.path(), "readme.txt", "ignored")?;

    let controller = Controller::with_config(Config::default())?;
    let summary = controller.run_folder(temp_dir.path(), None, AnnotationFormat::Antx, false)?;

    assert_eq!(summary.converted, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total(), 3);
    assert!(summary.failures[0].0.ends_with("b.eaf"));
    assert!(temp_dir.path().join("a.antx").exists());
    assert!(temp_dir.path().join("nested").join("c.antx").exists());
    assert!(!temp_dir.path().join("b.antx").exists());

    let issues = fs::read_to_string(temp_dir.path().join(ISSUES_LOG_FILE))?;
    assert!(issues.contains("1 errors"));
    assert!(issues.contains("b.eaf"));

    Ok(())
}

/// Test that a second run skips outputs that already exist
#[test]
fn test_run_folder_twice_shouldSkipExistingOutputs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "a.trs", common::SAMPLE_TRS)?;
    common::create_test_file(temp_dir.path(), "b.antx", common::SAMPLE_ANTX)?;
    let controller = Controller::with_config(Config::default())?;

    let first = controller.run_folder(temp_dir.path(), None, AnnotationFormat::Eaf, false)?;
    assert_eq!(first.converted, 2);
    assert!(!temp_dir.path().join(ISSUES_LOG_FILE).exists());

    // The outputs written by the first run are now inputs in the target format
    let second = controller.run_folder(temp_dir.path(), None, AnnotationFormat::Eaf, false)?;
    assert_eq!(second.converted, 0);
    assert_eq!(second.skipped, 4);
    assert_eq!(second.failed, 0);

    Ok(())
}

/// Test that an output directory mirrors the input tree
#[test]
fn test_run_folder_withOutputDir_shouldMirrorTree() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let output_dir = common::create_temp_dir()?;
    common::create_test_file(input_dir.path(), "x/y/deep.antx", common::SAMPLE_ANTX)?;

    let controller = Controller::with_config(Config::default())?;
    let summary = controller.run_folder(input_dir.path(), Some(output_dir.path()), AnnotationFormat::TextGrid, false)?;

    assert_eq!(summary.converted, 1);
    assert!(output_dir.path().join("x").join("y").join("deep.TextGrid").exists());

    Ok(())
}

/// Test that an empty directory is reported as an error
#[test]
fn test_run_folder_withNoAnnotations_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "notes.txt", "nothing here")?;

    let controller = Controller::with_config(Config::default())?;
    assert!(controller.run_folder(temp_dir.path(), None, AnnotationFormat::Eaf, false).is_err());

    Ok(())
}
