/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::common;
use annoconv::errors::{AppError, ConversionError};
use annoconv::file_utils::FileManager;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "exists.TextGrid", "content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.eaf"));
}

/// Test that dir_exists returns false for non-existent directories
#[test]
fn test_dir_exists_withNonExistentDir_shouldReturnFalse() {
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));
}

/// Test that generate_output_path swaps the extension and directory
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(
        Path::new("/tmp/input/session.01.eaf"),
        Path::new("/tmp/output"),
        "TextGrid",
    );

    assert_eq!(output_path, Path::new("/tmp/output/session.01.TextGrid"));
}

/// Test that discovery finds recognized extensions only, recursively
#[test]
fn test_find_annotation_files_withMixedTree_shouldReturnAnnotationsOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "a.eaf", "")?;
    common::create_test_file(temp_dir.path(), "nested/b.TextGrid", "")?;
    common::create_test_file(temp_dir.path(), "nested/deeper/c.ANTX", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;

    let files = FileManager::find_annotation_files(temp_dir.path())?;

    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"a.eaf".to_string()));
    assert!(names.contains(&"b.TextGrid".to_string()));
    assert!(names.contains(&"c.ANTX".to_string()));

    Ok(())
}

/// Test that non-UTF-8 content is rejected with an encoding error
#[test]
fn test_read_utf8_withLatin1File_shouldFailWithEncodingError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("latin1.TextGrid");
    fs::write(&path, b"text = \"caf\xe9\"")?;

    let err = FileManager::read_utf8(&path).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConversionError>(),
        Some(ConversionError::Encoding(_))
    ));

    Ok(())
}

/// Test that a missing file is reported as a file error naming the path
#[test]
fn test_read_utf8_withMissingFile_shouldFailWithFileError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("absent.eaf");

    let err = FileManager::read_utf8(&path).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::File(msg)) if msg.contains("absent.eaf")
    ));

    Ok(())
}

/// Test that writing below a regular file fails with a file error
#[test]
fn test_write_atomic_withFileAsParent_shouldFailWithFileError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let blocker = common::create_test_file(temp_dir.path(), "blocker", "not a directory")?;

    let err = FileManager::write_atomic(blocker.join("out.eaf"), "<ANNOTATION_DOCUMENT/>").unwrap_err();

    assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::File(_))));

    Ok(())
}

/// Test that a byte order mark is stripped
#[test]
fn test_read_utf8_withBom_shouldStripBom() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("bom.trs");
    fs::write(&path, "\u{feff}<Trans/>")?;

    assert_eq!(FileManager::read_utf8(&path)?, "<Trans/>");

    Ok(())
}

/// Test that atomic writes create parents and leave no temporary files behind
#[test]
fn test_write_atomic_withNewDirectory_shouldWriteOnlyTarget() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = temp_dir.path().join("out").join("result.eaf");

    FileManager::write_atomic(&target, "<ANNOTATION_DOCUMENT/>")?;
    FileManager::write_atomic(&target, "<ANNOTATION_DOCUMENT></ANNOTATION_DOCUMENT>")?;

    assert_eq!(fs::read_to_string(&target)?, "<ANNOTATION_DOCUMENT></ANNOTATION_DOCUMENT>");
    let entries = fs::read_dir(temp_dir.path().join("out"))?.count();
    assert_eq!(entries, 1);

    Ok(())
}

/// Test that log lines are appended with timestamps
#[test]
fn test_append_to_log_file_withTwoLines_shouldAppendBoth() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log_path = temp_dir.path().join("issues.log");

    FileManager::append_to_log_file(&log_path, "first")?;
    FileManager::append_to_log_file(&log_path, "second")?;

    let content = fs::read_to_string(&log_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("first"));
    assert!(lines[1].ends_with("second"));

    Ok(())
}
