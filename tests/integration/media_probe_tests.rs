/*!
 * Integration tests for EAF duration probing against real WAV files
 */

use anyhow::Result;

use crate::common;
use annoconv::app_config::ConversionOptions;
use annoconv::errors::ConversionWarning;
use annoconv::formats::{self, AnnotationFormat, DecodeContext, MediaProbe, MediaReference, WavProbe};

/// Test that a WAV referenced by a relative URL sets the duration
#[test]
fn test_decode_eaf_withRelativeWav_shouldUseMediaLength() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_wav(temp_dir.path(), "take.wav", 2.5, 8000)?;
    let descriptor = r#"<MEDIA_DESCRIPTOR MEDIA_URL="file:///nonexistent/take.wav" RELATIVE_MEDIA_URL="./take.wav" MIME_TYPE="audio/x-wav"/>"#;
    let content = common::sample_eaf(descriptor);

    let options = ConversionOptions::default();
    let context = DecodeContext::new(&options).with_media_probe(WavProbe::with_base_dir(temp_dir.path()));
    let decoded = formats::decode(content.as_bytes(), AnnotationFormat::Eaf, &context)?;

    assert_eq!(decoded.annotation.duration, 2.5);
    assert!(decoded.warnings.is_empty());

    Ok(())
}

/// Test that an absolute file URL is probed directly
#[test]
fn test_wavProbe_withFileUrl_shouldReadDuration() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let wav = common::create_test_wav(temp_dir.path(), "abs.wav", 1.0, 16000)?;
    let url = url::Url::from_file_path(&wav).map_err(|_| anyhow::anyhow!("not an absolute path"))?;

    let media = MediaReference {
        url: Some(url.to_string()),
        relative_url: None,
    };

    assert_eq!(WavProbe::default().duration_secs(&media)?, 1.0);

    Ok(())
}

/// Test that a missing WAV yields a warning and the time-slot fallback
#[test]
fn test_decode_eaf_withMissingWav_shouldWarnAndUseFloor() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let descriptor = r#"<MEDIA_DESCRIPTOR RELATIVE_MEDIA_URL="./gone.wav"/>"#;
    let content = common::sample_eaf(descriptor);

    let options = ConversionOptions::default();
    let context = DecodeContext::new(&options).with_media_probe(WavProbe::with_base_dir(temp_dir.path()));
    let decoded = formats::decode(content.as_bytes(), AnnotationFormat::Eaf, &context)?;

    assert_eq!(decoded.annotation.duration, 300.0);
    assert!(matches!(
        decoded.warnings.as_slice(),
        [ConversionWarning::MissingMedia { media, .. }] if media == "./gone.wav"
    ));

    Ok(())
}
