//! Date/time conversion utilities for the PCF8563 RTC.
//!
//! The PCF8563 keeps the calendar in seven BCD registers that are read and
//! written one byte at a time. This module holds the decoded view of those
//! registers ([`Snapshot`]), the optional-field write request
//! ([`TimeFields`]) and the conversions to and from chrono types.
//!
//! # Error Handling
//!
//! Validation and conversion errors are reported via [`PCF8563DateTimeError`].

use core::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike};

use crate::bcd::{decode_bcd, encode_bcd};
use crate::{RegAddr, TimeField};

/// Errors that can occur during PCF8563 date/time conversion or validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PCF8563DateTimeError {
    /// A field value is outside the range the chip accepts
    OutOfRange {
        /// The offending field
        field: TimeField,
        /// The rejected value
        value: u8,
    },
    /// The register contents do not form a valid calendar date/time, or the
    /// local time is ambiguous in the requested timezone
    InvalidDateTime,
}

/// Decoded contents of the seven time/date registers.
///
/// Each field is read with its own bus transaction, so a snapshot taken
/// across a rollover (e.g. 23:59:59 -> 00:00:00) can mix values from both
/// sides of it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    /// Two-digit year (0-99)
    pub year: u8,
    /// Month (1-12)
    pub month: u8,
    /// Day of month (1-31)
    pub date: u8,
    /// Day of week (0-7)
    pub weekday: u8,
    /// Hours (0-23)
    pub hours: u8,
    /// Minutes (0-59)
    pub minutes: u8,
    /// Seconds (0-59)
    pub seconds: u8,
}

impl Snapshot {
    /// Decodes a snapshot from the raw register bytes, in read order
    /// (year, month, date, weekday, hours, minutes, seconds).
    pub(crate) fn from_registers(raw: [u8; 7]) -> Self {
        let field = |field: TimeField, byte: u8| decode_bcd(byte & field.mask());
        Snapshot {
            year: field(TimeField::Year, raw[0]),
            month: field(TimeField::Month, raw[1]),
            date: field(TimeField::Date, raw[2]),
            weekday: field(TimeField::Weekday, raw[3]),
            hours: field(TimeField::Hours, raw[4]),
            minutes: field(TimeField::Minutes, raw[5]),
            seconds: field(TimeField::Seconds, raw[6]),
        }
    }

    /// Builds a calendar date/time, placing the two-digit year in `century`
    /// (21 means 2000-2099).
    pub fn to_naive_datetime(&self, century: u8) -> Result<NaiveDateTime, PCF8563DateTimeError> {
        let year = (i32::from(century) - 1) * 100 + i32::from(self.year);
        NaiveDate::from_ymd_opt(year, u32::from(self.month), u32::from(self.date))
            .and_then(|d| {
                d.and_hms_opt(
                    u32::from(self.hours),
                    u32::from(self.minutes),
                    u32::from(self.seconds),
                )
            })
            .ok_or(PCF8563DateTimeError::InvalidDateTime)
    }

    /// Like [`Snapshot::to_naive_datetime`], with `tz` attached to the result.
    ///
    /// The register values are taken as local time in `tz`; no conversion is
    /// applied.
    pub fn to_datetime<Tz: TimeZone>(
        &self,
        century: u8,
        tz: &Tz,
    ) -> Result<DateTime<Tz>, PCF8563DateTimeError> {
        let naive = self.to_naive_datetime(century)?;
        tz.from_local_datetime(&naive)
            .single()
            .ok_or(PCF8563DateTimeError::InvalidDateTime)
    }
}

impl fmt::Display for Snapshot {
    /// Formats as `YY-MM-DDTHH:MM:SS`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.date, self.hours, self.minutes, self.seconds
        )
    }
}

/// A set of time/date fields to write. Fields left as `None` are not touched
/// on the chip.
///
/// ```rust,ignore
/// let fields = TimeFields::new().with_hours(9).with_minutes(15);
/// rtc.write_all(&fields)?;
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeFields {
    /// Seconds (0-59)
    pub seconds: Option<u8>,
    /// Minutes (0-59)
    pub minutes: Option<u8>,
    /// Hours (0-23)
    pub hours: Option<u8>,
    /// Day of week (0-7)
    pub weekday: Option<u8>,
    /// Day of month (1-31)
    pub date: Option<u8>,
    /// Month (1-12)
    pub month: Option<u8>,
    /// Two-digit year (0-99)
    pub year: Option<u8>,
}

macro_rules! with_field {
    ($($name:ident),+) => {
        paste::paste! {
            $(
                #[doc = concat!("Sets the ", stringify!($name), " field.")]
                #[must_use]
                pub fn [<with_ $name>](mut self, $name: u8) -> Self {
                    self.$name = Some($name);
                    self
                }
            )+
        }
    };
}

/// Validated register writes, in the order they are issued.
pub(crate) type EncodedFields = [Option<(RegAddr, u8)>; 7];

impl TimeFields {
    /// Creates an empty set of fields.
    pub fn new() -> Self {
        Self::default()
    }

    with_field!(seconds, minutes, hours, weekday, date, month, year);

    /// Takes every field from a calendar date/time: ISO weekday (Monday = 1
    /// through Sunday = 7) and the year modulo 100.
    pub fn from_datetime<T: Datelike + Timelike>(
        datetime: &T,
    ) -> Result<Self, PCF8563DateTimeError> {
        let narrow = |v: u32| u8::try_from(v).map_err(|_| PCF8563DateTimeError::InvalidDateTime);
        let year = u8::try_from(datetime.year().rem_euclid(100))
            .map_err(|_| PCF8563DateTimeError::InvalidDateTime)?;
        Ok(TimeFields {
            seconds: Some(narrow(datetime.second())?),
            minutes: Some(narrow(datetime.minute())?),
            hours: Some(narrow(datetime.hour())?),
            weekday: Some(narrow(datetime.weekday().number_from_monday())?),
            date: Some(narrow(datetime.day())?),
            month: Some(narrow(datetime.month())?),
            year: Some(year),
        })
    }

    /// Validates every present field and encodes it as BCD.
    ///
    /// Nothing is returned unless all present fields are in range, so a
    /// rejected request never leads to a partial write.
    pub(crate) fn encode(&self) -> Result<EncodedFields, PCF8563DateTimeError> {
        let ordered = [
            (TimeField::Seconds, self.seconds),
            (TimeField::Minutes, self.minutes),
            (TimeField::Hours, self.hours),
            (TimeField::Year, self.year),
            (TimeField::Month, self.month),
            (TimeField::Date, self.date),
            (TimeField::Weekday, self.weekday),
        ];
        let mut encoded: EncodedFields = [None; 7];
        for (slot, (field, value)) in encoded.iter_mut().zip(ordered) {
            if let Some(value) = value {
                *slot = Some((field.register(), encode_field(field, value)?));
            }
        }
        Ok(encoded)
    }
}

/// Checks `value` against the field's range and encodes it as BCD.
pub(crate) fn encode_field(field: TimeField, value: u8) -> Result<u8, PCF8563DateTimeError> {
    if !field.range().contains(&value) {
        error!("{:?} value {} is out of range", field, value);
        return Err(PCF8563DateTimeError::OutOfRange { field, value });
    }
    encode_bcd(value).ok_or(PCF8563DateTimeError::OutOfRange { field, value })
}
