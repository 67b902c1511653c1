/*!
 * Tests for subtitle readers and writers
 */

use anyhow::Result;

use subforge::errors::SubtitleError;
use subforge::formats::{self, SubtitleFormat};
use subforge::subtitle_processor::{Column, CueId, SubtitleCollection, SubtitleEntry};
use crate::common;

const YOUTUBE_VTT: &str = "WEBVTT
Kind: captions
Language: en

00:00:00.000 --> 00:00:02.000 align:start position:0%
 
hello<00:00:00.500><c> world</c>

00:00:02.000 --> 00:00:02.010 align:start position:0%
hello world
 

00:00:02.010 --> 00:00:04.000 align:start position:0%
hello world
how<00:00:02.500><c> are</c><00:00:03.000><c> you</c>
";

fn translated_entries() -> Vec<SubtitleEntry> {
    vec![
        SubtitleEntry::new("1", 1_001, 2_345, "Hello there", "Bonjour"),
        SubtitleEntry::new("2", 3_600_000 + 61_007, 3_600_000 + 62_999, "Only original", ""),
    ]
}

#[test]
fn test_fileRoundTrip_withMillisecondFormats_shouldPreserveEntries() -> Result<()> {
    let dir = common::create_temp_dir()?;

    for format in [SubtitleFormat::Srt, SubtitleFormat::Vtt, SubtitleFormat::Json] {
        let path = dir.path().join(format!("out.{}", format.extension()));
        formats::write_subtitle_file(&translated_entries(), &path, format)?;
        let loaded = formats::from_subtitle_file(&path)?;
        assert_eq!(loaded, translated_entries(), "round trip through {}", format);
    }
    Ok(())
}

fn blank_text_entries() -> Vec<SubtitleEntry> {
    vec![
        SubtitleEntry::new("1", 1_000, 2_000, "", "Bonjour"),
        SubtitleEntry::new("2", 3_000, 4_000, "World", ""),
        SubtitleEntry::new("3", 5_000, 6_000, "", ""),
        SubtitleEntry::new("4", 7_000, 8_000, "Paragraphs", "first\n\nsecond"),
        SubtitleEntry::new("5", 9_000, 10_000, "Last", ""),
    ]
}

#[test]
fn test_roundTrip_withBlankTexts_shouldKeepEveryCue() -> Result<()> {
    for format in [SubtitleFormat::Srt, SubtitleFormat::Vtt, SubtitleFormat::Ass, SubtitleFormat::Json] {
        let text = formats::serialize(&blank_text_entries(), format)?;
        let parsed = formats::parse(&text, format)?;
        assert_eq!(parsed, blank_text_entries(), "round trip through {}", format);
    }
    Ok(())
}

#[test]
fn test_writeBlockFormats_shouldNeverEmitBlankLineInsideCue() -> Result<()> {
    for format in [SubtitleFormat::Srt, SubtitleFormat::Vtt] {
        let text = formats::serialize(&blank_text_entries(), format)?;
        assert!(text.contains("\n \nBonjour\n"), "blank original in {}", format);
        assert!(text.contains("first\n \nsecond"), "blank secondary line in {}", format);
    }
    Ok(())
}

#[test]
fn test_saveAndReload_afterClearingOriginal_shouldKeepRowCount() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut collection = SubtitleCollection::from_entries(translated_entries());
    collection.edit_cell(&CueId::from("1"), Column::Original, "")?;

    let path = dir.path().join("cleared.srt");
    formats::write_subtitle_file(&collection.serialize(), &path, SubtitleFormat::Srt)?;
    let loaded = formats::from_subtitle_file(&path)?;

    assert_eq!(loaded.len(), collection.len());
    assert_eq!(loaded[0].original_text, "");
    assert_eq!(loaded[0].secondary_text, "Bonjour");
    assert_eq!(loaded[1].original_text, "Only original");
    Ok(())
}

#[test]
fn test_assRoundTrip_shouldTruncateToCentiseconds() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("out.ass");
    formats::write_subtitle_file(&translated_entries(), &path, SubtitleFormat::Ass)?;

    let loaded = formats::from_subtitle_file(&path)?;
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].start_time_ms, 1_000);
    assert_eq!(loaded[0].end_time_ms, 2_340);
    assert_eq!(loaded[0].original_text, "Hello there");
    assert_eq!(loaded[0].secondary_text, "Bonjour");
    Ok(())
}

#[test]
fn test_jsonRoundTrip_withMultilineOriginal_shouldBeExact() -> Result<()> {
    let entries = vec![SubtitleEntry::new("a", 0, 10, "two\nlines", "deux\nlignes")];
    let text = formats::serialize(&entries, SubtitleFormat::Json)?;

    assert!(text.contains("\"original_subtitle\""));
    assert!(text.contains("\"translated_subtitle\""));
    assert_eq!(formats::parse(&text, SubtitleFormat::Json)?, entries);
    Ok(())
}

#[test]
fn test_parseVtt_withYoutubeCaptions_shouldKeepTimedLinesOnly() -> Result<()> {
    let entries = formats::parse(YOUTUBE_VTT, SubtitleFormat::Vtt)?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].original_text, "hello world");
    assert_eq!((entries[0].start_time_ms, entries[0].end_time_ms), (0, 2_000));
    assert_eq!(entries[1].original_text, "how are you");
    assert_eq!(entries[1].start_time_ms, 2_010);
    Ok(())
}

#[test]
fn test_parseVtt_withPlainCues_shouldFallBackToGenericParser() -> Result<()> {
    let content = "WEBVTT\n\nintro\n00:01.000 --> 00:02.500\n<v Roger>Hi</v>\nSalut\n";
    let entries = formats::parse(content, SubtitleFormat::Vtt)?;

    assert_eq!(entries, vec![SubtitleEntry::new("1", 1_000, 2_500, "Hi", "Salut")]);
    Ok(())
}

#[test]
fn test_parseSrt_withBomAndCrlf_shouldParse() -> Result<()> {
    let content = format!("\u{feff}{}", common::SAMPLE_SRT.replace('\n', "\r\n"));
    let entries = formats::parse(&content, SubtitleFormat::Srt)?;

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].original_text, "For testing purposes.");
    assert_eq!(entries[2].start_time_ms, 10_000);
    Ok(())
}

#[test]
fn test_parse_withGarbage_shouldReturnParseError() {
    let result = formats::parse("not a subtitle", SubtitleFormat::Srt);
    assert!(matches!(result, Err(SubtitleError::Parse { .. })));

    let result = formats::parse("{}", SubtitleFormat::Json);
    assert!(matches!(result, Err(SubtitleError::Parse { .. })));
}

#[test]
fn test_fromSubtitleFile_withUnsupportedExtension_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "notes.docx", "hello")?;

    let result = formats::from_subtitle_file(&path);
    assert_eq!(result, Err(SubtitleError::UnsupportedFormat("docx".to_string())));
    Ok(())
}

#[test]
fn test_writeTxt_shouldEmitTextOnly() -> Result<()> {
    let text = formats::serialize(&translated_entries(), SubtitleFormat::Txt)?;
    assert_eq!(text, "Hello there\nBonjour\nOnly original\n");
    assert!(!SubtitleFormat::Txt.is_readable());
    Ok(())
}

#[test]
fn test_writeSubtitleFile_withFileAsParent_shouldReportSerializeError() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let blocker = common::create_test_file(dir.path(), "blocker", "x")?;

    let result = formats::write_subtitle_file(&translated_entries(), blocker.join("out.srt"), SubtitleFormat::Srt);
    assert!(matches!(result, Err(SubtitleError::Serialize { .. })));
    assert_eq!(std::fs::read_to_string(&blocker)?, "x");
    Ok(())
}

#[test]
fn test_subtitleFormat_fromStr_shouldBeCaseInsensitive() {
    assert_eq!(".SRT".parse::<SubtitleFormat>(), Ok(SubtitleFormat::Srt));
    assert_eq!("Json".parse::<SubtitleFormat>(), Ok(SubtitleFormat::Json));
    assert!("mkv".parse::<SubtitleFormat>().is_err());
}
