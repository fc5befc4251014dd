use crate::exif_reader::ascii_field;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use exif::{Exif, Tag};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: &[&str] = &["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];
const DATE_ONLY_FORMATS: &[&str] = &["%Y:%m:%d", "%Y-%m-%d", "%Y/%m/%d"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DateSource {
    ExifDateTimeOriginal,
    ExifDateTime,
    FileModified,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureDate {
    pub date: NaiveDate,
    pub source: DateSource,
}

impl CaptureDate {
    pub fn label(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for CaptureDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format(DATE_FORMAT))
    }
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    ExifTag(Tag, DateSource),
    FileModified,
}

const STRATEGIES: &[Strategy] = &[
    Strategy::ExifTag(Tag::DateTimeOriginal, DateSource::ExifDateTimeOriginal),
    Strategy::ExifTag(Tag::DateTime, DateSource::ExifDateTime),
    Strategy::FileModified,
];

impl Strategy {
    fn resolve(self, exif: Option<&Exif>, path: &Path) -> Option<CaptureDate> {
        match self {
            Strategy::ExifTag(tag, source) => {
                let raw = ascii_field(exif?, tag)?;
                let date = parse_date(&raw)?;
                Some(CaptureDate { date, source })
            }
            Strategy::FileModified => {
                let date = file_modified_date(path)?;
                Some(CaptureDate {
                    date,
                    source: DateSource::FileModified,
                })
            }
        }
    }
}

pub fn resolve_capture_date(exif: Option<&Exif>, path: &Path) -> Option<CaptureDate> {
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy.resolve(exif, path))
}

pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let normalized = input.trim();

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(normalized, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_ONLY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(normalized, fmt) {
            return Some(date);
        }
    }

    None
}

fn file_modified_date(path: &Path) -> Option<NaiveDate> {
    let time = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(time).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif_reader::tests::{ascii, exif_with};
    use chrono::TimeZone;
    use exif::{Field, In, Value};
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    fn file_modified_at(year: i32, month: u32, day: u32) -> (TempDir, PathBuf) {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("IMG_0001.jpg");
        fs::write(&path, b"x").expect("write file");
        let local = Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .expect("unambiguous local time");
        set_file_mtime(&path, FileTime::from_unix_time(local.timestamp(), 0)).expect("set mtime");
        (temp, path)
    }

    #[test]
    fn prefers_date_time_original() {
        let (_temp, path) = file_modified_at(2020, 1, 1);
        let exif = exif_with(&[
            ascii(Tag::DateTimeOriginal, "2023:07:15 10:30:00"),
            ascii(Tag::DateTime, "2024:01:01 00:00:00"),
        ]);

        let resolved = resolve_capture_date(Some(&exif), &path).expect("date");
        assert_eq!(resolved.label(), "2023-07-15");
        assert_eq!(resolved.source, DateSource::ExifDateTimeOriginal);
    }

    #[test]
    fn falls_back_to_generic_date_time_tag() {
        let (_temp, path) = file_modified_at(2020, 1, 1);
        let exif = exif_with(&[
            ascii(Tag::DateTimeOriginal, "garbage"),
            ascii(Tag::DateTime, "2019/12/31 23:59:59"),
        ]);

        let resolved = resolve_capture_date(Some(&exif), &path).expect("date");
        assert_eq!(resolved.to_string(), "2019-12-31");
        assert_eq!(resolved.source, DateSource::ExifDateTime);
    }

    #[test]
    fn non_string_tag_is_treated_as_absent() {
        let (_temp, path) = file_modified_at(2022, 3, 4);
        let exif = exif_with(&[Field {
            tag: Tag::DateTimeOriginal,
            ifd_num: In::PRIMARY,
            value: Value::Long(vec![20230715]),
        }]);

        let resolved = resolve_capture_date(Some(&exif), &path).expect("date");
        assert_eq!(resolved.label(), "2022-03-04");
        assert_eq!(resolved.source, DateSource::FileModified);
    }

    #[test]
    fn uses_file_modified_time_without_metadata() {
        let (_temp, path) = file_modified_at(2018, 11, 23);
        let resolved = resolve_capture_date(None, &path).expect("date");
        assert_eq!(resolved.label(), "2018-11-23");
        assert_eq!(resolved.source, DateSource::FileModified);
    }

    #[test]
    fn no_metadata_and_no_file_yields_none() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("gone.jpg");
        assert!(resolve_capture_date(None, &missing).is_none());
    }

    #[test]
    fn parse_date_accepts_every_supported_format() {
        let expected = NaiveDate::from_ymd_opt(2023, 7, 15);
        for input in [
            "2023:07:15 10:30:00",
            "2023-07-15 10:30:00",
            "2023/07/15 10:30:00",
            "2023:07:15",
            "2023-07-15",
            "2023/07/15",
            " 2023:07:15 10:30:00 ",
        ] {
            assert_eq!(parse_date(input), expected, "{input}");
        }
    }

    #[test]
    fn parse_date_rejects_unknown_shapes() {
        assert_eq!(parse_date("0000:00:00 00:00:00"), None);
        assert_eq!(parse_date("15.07.2023"), None);
        assert_eq!(parse_date(""), None);
    }
}
