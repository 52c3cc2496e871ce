use core::fmt;

use crate::constants::STORE;
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};

/// One central directory record, as written by the archive writers and as
/// parsed back by [`ArchiveReader`](crate::uncompress::ArchiveReader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFileEntry {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub general_purpose_flags: u16,
    pub compression_method: u16,
    pub last_mod_file_time: u16,
    pub last_mod_file_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_as_bytes: Vec<u8>,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    pub internal_file_attributes: u16,
    pub external_file_attributes: u32,
    pub offset: u32,
}

impl ArchiveFileEntry {
    pub fn file_name_len(&self) -> u16 {
        self.file_name_as_bytes.len() as u16
    }

    /// The entry name, with invalid UTF-8 sequences replaced.
    pub fn get_file_name(&self) -> String {
        String::from_utf8_lossy(&self.file_name_as_bytes).into_owned()
    }

    pub fn is_stored(&self) -> bool {
        self.compression_method == STORE
    }

    pub fn last_modified(&self) -> DateTimeCS {
        DateTimeCS::from_msdos(self.last_mod_file_date, self.last_mod_file_time)
    }

    fn extended_local_header(&self) -> bool {
        self.general_purpose_flags & (1u16 << 3) != 0
    }

    fn is_encrypted(&self) -> bool {
        self.general_purpose_flags & (1u16 << 0) != 0
    }

    fn pretty_version(zip_version: u16) -> (u16, u16) {
        let zip_version = zip_version & 0xFF;
        let major = zip_version / 10;
        let minor = zip_version % 10;

        (major, minor)
    }
}

impl fmt::Display for ArchiveFileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let padding = 48;

        writeln!(f, "{}", self.get_file_name())?;

        writeln!(
            f,
            "{: <padding$}{}",
            "offset of local header from start of archive:", self.offset
        )?;

        let (major, minor) = ArchiveFileEntry::pretty_version(self.version_needed);
        writeln!(
            f,
            "{: <padding$}{}.{}",
            "minimum software version required to extract:", major, minor
        )?;

        writeln!(
            f,
            "{: <padding$}{:#018b}",
            "general purpose bit flag:", self.general_purpose_flags
        )?;

        let label = if self.is_stored() {
            "none (stored)".to_owned()
        } else {
            format!("unknown ({})", self.compression_method)
        };

        writeln!(f, "{: <padding$}{}", "compression method:", label)?;

        let security = if self.is_encrypted() {
            "encrypted"
        } else {
            "not encrypted"
        };

        writeln!(f, "{: <padding$}{}", "file security status:", security)?;

        let extended_local_header = if self.extended_local_header() {
            "yes"
        } else {
            "no"
        };

        writeln!(
            f,
            "{: <padding$}{}",
            "extended local header:", extended_local_header
        )?;

        writeln!(
            f,
            "{: <padding$}{}",
            "file last modified on (DOS date/time):",
            self.last_modified()
        )?;

        writeln!(
            f,
            "{: <padding$}{:x}",
            "32-bit CRC value (hex):", self.crc32
        )?;

        writeln!(
            f,
            "{: <padding$}{} bytes",
            "compressed size:", self.compressed_size
        )?;
        writeln!(
            f,
            "{: <padding$}{} bytes",
            "uncompressed size:", self.uncompressed_size
        )?;

        writeln!(
            f,
            "{: <padding$}{} characters",
            "length of filename:",
            self.file_name_len()
        )
    }
}

/// A calendar date and time restricted to what MS-DOS date/time fields can
/// hold: 1980-01-01 00:00:00 to 2107-12-31 23:59:58, two second resolution.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DateTimeCS {
    year: u16,
    month: u16,
    day: u16,
    hour: u16,
    minute: u16,
    second: u16,
}

impl Default for DateTimeCS {
    /// 1980, January 1st, midnight.
    fn default() -> Self {
        Self {
            year: 1980,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl DateTimeCS {
    const MAX_YEAR: u16 = 2107;

    fn max() -> Self {
        Self {
            year: Self::MAX_YEAR,
            month: 12,
            day: 31,
            hour: 23,
            minute: 59,
            second: 58,
        }
    }

    /// Build from calendar fields.
    ///
    /// Returns `None` if the fields do not name a real date and time. Values
    /// outside the MS-DOS range are clamped to its bounds.
    pub fn from_date_and_time(
        year: u16,
        month: u16,
        day: u16,
        hour: u16,
        minute: u16,
        second: u16,
    ) -> Option<Self> {
        let datetime = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?
            .and_hms_opt(hour as u32, minute as u32, second as u32)?;

        Some(Self::from_naive(datetime))
    }

    /// Build from any timezone aware `chrono` value, keeping its wall clock time.
    pub fn from_chrono_datetime<Tz: TimeZone>(datetime: DateTime<Tz>) -> Self {
        Self::from_naive(datetime.naive_local())
    }

    fn from_naive(datetime: NaiveDateTime) -> Self {
        if datetime.year() < 1980 {
            return Self::default();
        }
        if datetime.year() > Self::MAX_YEAR as i32 {
            return Self::max();
        }

        Self {
            year: datetime.year() as u16,
            month: datetime.month() as u16,
            day: datetime.day() as u16,
            hour: datetime.hour() as u16,
            minute: datetime.minute() as u16,
            second: datetime.second() as u16,
        }
    }

    pub fn now() -> Self {
        Self::from_chrono_datetime(Local::now())
    }

    pub fn from_msdos(datepart: u16, timepart: u16) -> Self {
        let seconds = (timepart & 0b0000000000011111) << 1;
        let minutes = (timepart & 0b0000011111100000) >> 5;
        let hours = (timepart & 0b1111100000000000) >> 11;
        let days = datepart & 0b0000000000011111;
        let months = (datepart & 0b0000000111100000) >> 5;
        let years = (datepart & 0b1111111000000000) >> 9;

        Self {
            year: years + 1980,
            month: months,
            day: days,
            hour: hours,
            minute: minutes,
            second: seconds,
        }
    }

    pub fn to_time(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
            .and_then(|date| {
                date.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
            })
            .or_else(|| {
                NaiveDate::from_ymd_opt(1980, 1, 1).and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .unwrap_or_default()
    }

    /// The `(date, time)` pair as stored in the local and central headers.
    pub fn ms_dos(&self) -> (u16, u16) {
        let date = self.day | (self.month << 5) | self.year.saturating_sub(1980) << 9;
        let time = (self.second / 2) | (self.minute << 5) | self.hour << 11;
        (date, time)
    }
}

impl fmt::Display for DateTimeCS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_time())
    }
}

/// The (timezone-less) date and time that will be written in the archive alongside the file.
///
/// Use `FileDateTime::Zero` if the date and time are insignificant. This will set the value to 0 which is 1980, January 1th, 12AM.
/// Use `FileDateTime::Custom` if you need to set a custom date and time.
/// Use `FileDateTime::Now` to take the local date and time when the entry is written.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum FileDateTime {
    /// 1980, January 1th, 12AM.
    Zero,
    /// (year, month, day, hour, minute, second)
    Custom(DateTimeCS),
    #[default]
    Now,
}

impl FileDateTime {
    pub fn from_chrono_datetime<Tz: TimeZone>(datetime: DateTime<Tz>) -> Self {
        FileDateTime::Custom(DateTimeCS::from_chrono_datetime(datetime))
    }

    fn tuple(&self) -> DateTimeCS {
        match self {
            FileDateTime::Zero => DateTimeCS::default(),
            FileDateTime::Custom(date_time) => *date_time,
            FileDateTime::Now => DateTimeCS::now(),
        }
    }

    pub fn ms_dos(&self) -> (u16, u16) {
        self.tuple().ms_dos()
    }

    pub fn to_time(&self) -> NaiveDateTime {
        self.tuple().to_time()
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for FileDateTime {
    fn from(datetime: DateTime<Tz>) -> Self {
        FileDateTime::from_chrono_datetime(datetime)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_time_zero_msdos() {
        let (date, time) = FileDateTime::Zero.ms_dos();

        assert_eq!(date, 0b0000000000100001);
        assert_eq!(time, 0);
    }

    #[test]
    fn test_time_msdos_packing() {
        let date_time = DateTimeCS::from_date_and_time(2023, 6, 15, 13, 45, 31).unwrap();
        let (date, time) = date_time.ms_dos();

        assert_eq!(date, (43 << 9) | (6 << 5) | 15);
        assert_eq!(time, (13 << 11) | (45 << 5) | 15);
    }

    #[test]
    fn test_time_msdos_roundtrip() {
        let date_time = DateTimeCS::from_date_and_time(2024, 2, 29, 23, 59, 58).unwrap();
        let (date, time) = date_time.ms_dos();

        assert_eq!(DateTimeCS::from_msdos(date, time), date_time);
        assert_eq!(
            DateTimeCS::from_msdos(date, time).to_string(),
            "2024-02-29 23:59:58"
        );
    }

    #[test]
    fn test_time_clamped() {
        let early = DateTimeCS::from_date_and_time(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(early, DateTimeCS::default());

        let late = DateTimeCS::from_date_and_time(2200, 5, 5, 5, 5, 5).unwrap();
        assert_eq!(late.ms_dos(), (0xFF9F, 0xBF7D));
    }

    #[test]
    fn test_time_invalid_date() {
        assert!(DateTimeCS::from_date_and_time(2023, 2, 30, 0, 0, 0).is_none());
        assert!(DateTimeCS::from_date_and_time(2023, 1, 1, 24, 0, 0).is_none());
    }

    #[test]
    fn test_time_from_chrono() {
        let utc = Utc.with_ymd_and_hms(2021, 12, 24, 18, 30, 10).unwrap();
        let time = FileDateTime::from(utc);

        assert_eq!(
            time,
            FileDateTime::Custom(DateTimeCS::from_date_and_time(2021, 12, 24, 18, 30, 10).unwrap())
        );
    }

    #[test]
    fn test_time_display_0_0() {
        let date_time = DateTimeCS::from_msdos(0, 0);

        // day 0 is not a real date
        assert_eq!(date_time.to_time().to_string(), "1980-01-01 00:00:00");
    }
}
