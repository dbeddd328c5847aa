use crate::MetadataExtractor;
use crate::error::{ErrorKind, Result};
use exif::{Exif, In, Tag, Value};
use exn::ResultExt;
use std::io::Cursor;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Reads the capture time from EXIF data (JPEG, TIFF, PNG, WebP, HEIF).
///
/// `DateTimeOriginal` is preferred over `DateTime`, which some tools rewrite
/// on edit. Timestamps without an `OffsetTime*` tag are taken to be UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExifExtractor;

/// Timestamp tags in order of preference, with their matching offset and
/// sub-second tags.
const TIMESTAMP_TAGS: [(Tag, Tag, Tag); 2] = [
    (Tag::DateTimeOriginal, Tag::OffsetTimeOriginal, Tag::SubSecTimeOriginal),
    (Tag::DateTime, Tag::OffsetTime, Tag::SubSecTime),
];

impl MetadataExtractor for ExifExtractor {
    fn created_time(&self, data: &[u8]) -> Result<OffsetDateTime> {
        let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => exn::bail!(ErrorKind::MissingMetadata),
            Err(err) => exn::bail!(ErrorKind::InvalidMetadata(err.to_string())),
        };
        let (date_time, offset, subsec) = TIMESTAMP_TAGS
            .into_iter()
            .find_map(|(date_time, offset, subsec)| ascii(&exif, date_time).map(|v| (v, offset, subsec)))
            .ok_or_else(|| exn::Exn::from(ErrorKind::MissingMetadata))?;

        let mut parsed = exif::DateTime::from_ascii(date_time)
            .map_err(|err| exn::Exn::from(ErrorKind::InvalidMetadata(err.to_string())))?;
        // Both are optional refinements; a malformed one is ignored.
        if let Some(offset) = ascii(&exif, offset) {
            let _ = parsed.parse_offset(offset);
        }
        if let Some(subsec) = ascii(&exif, subsec) {
            let _ = parsed.parse_subsec(subsec);
        }
        to_offset_date_time(&parsed)
    }
}

fn ascii(exif: &Exif, tag: Tag) -> Option<&[u8]> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(values) => values.first().map(Vec::as_slice).filter(|v| !v.is_empty()),
        _ => None,
    }
}

fn to_offset_date_time(parsed: &exif::DateTime) -> Result<OffsetDateTime> {
    let invalid = || ErrorKind::InvalidMetadata(parsed.to_string());
    let month = Month::try_from(parsed.month).or_raise(invalid)?;
    let date = Date::from_calendar_date(i32::from(parsed.year), month, parsed.day).or_raise(invalid)?;
    let time = Time::from_hms_nano(parsed.hour, parsed.minute, parsed.second, parsed.nanosecond.unwrap_or(0))
        .or_raise(invalid)?;
    let offset = match parsed.offset {
        Some(minutes) => UtcOffset::from_whole_seconds(i32::from(minutes) * 60).or_raise(invalid)?,
        None => UtcOffset::UTC,
    };
    Ok(PrimitiveDateTime::new(date, time).assume_offset(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::Field;
    use exif::experimental::Writer;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageFormat, Rgb, RgbImage};
    use rstest::rstest;
    use time::macros::datetime;

    fn plain(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    /// A JPEG carrying an APP1 segment with the given ASCII fields.
    fn jpeg_with_exif(fields: &[(Tag, &str)]) -> Vec<u8> {
        let fields: Vec<Field> = fields
            .iter()
            .map(|(tag, value)| Field {
                tag: *tag,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![value.as_bytes().to_vec()]),
            })
            .collect();
        let mut writer = Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, false).unwrap();
        let tiff = tiff.into_inner();

        let img = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));
        let mut jpeg = Vec::new();
        JpegEncoder::new(&mut jpeg).encode_image(&img).unwrap();

        let segment_len = u16::try_from(2 + 6 + tiff.len()).unwrap();
        let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[rstest]
    #[case::original(
        &[(Tag::DateTimeOriginal, "2021:03:04 05:06:07")],
        datetime!(2021-03-04 05:06:07 UTC)
    )]
    #[case::original_preferred(
        &[(Tag::DateTime, "2023:01:01 00:00:00"), (Tag::DateTimeOriginal, "2021:03:04 05:06:07")],
        datetime!(2021-03-04 05:06:07 UTC)
    )]
    #[case::fallback(&[(Tag::DateTime, "2019:12:31 23:59:58")], datetime!(2019-12-31 23:59:58 UTC))]
    #[case::with_offset(
        &[(Tag::DateTimeOriginal, "2021:03:04 05:06:07"), (Tag::OffsetTimeOriginal, "+02:00")],
        datetime!(2021-03-04 05:06:07 +2)
    )]
    fn created_time_from_exif(#[case] fields: &[(Tag, &str)], #[case] expected: OffsetDateTime) {
        let created = ExifExtractor.created_time(&jpeg_with_exif(fields)).unwrap();
        assert_eq!(created, expected);
    }

    #[rstest]
    #[case::jpeg(ImageFormat::Jpeg)]
    #[case::png(ImageFormat::Png)]
    fn created_time_missing(#[case] format: ImageFormat) {
        let err = ExifExtractor.created_time(&plain(format)).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingMetadata);
    }

    #[test]
    fn created_time_without_timestamp_tags() {
        let err = ExifExtractor.created_time(&jpeg_with_exif(&[(Tag::Make, "Acme")])).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingMetadata);
    }

    #[test]
    fn created_time_malformed() {
        let data = jpeg_with_exif(&[(Tag::DateTimeOriginal, "yesterday-ish")]);
        let err = ExifExtractor.created_time(&data).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidMetadata(_)));
    }

    #[test]
    fn created_time_garbage() {
        let err = ExifExtractor.created_time(b"not an image at all").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidMetadata(_)));
    }
}
