//! Daily alarm configuration for the PCF8563 RTC.
//!
//! The chip compares minutes, hours, day and weekday against the alarm
//! registers; each comparator is switched off by bit 7 of its register. A
//! daily alarm uses only the minute and hour comparators. Either may be left
//! out, in which case its register is not touched.

use crate::bcd::decode_bcd;
use crate::datetime::{encode_field, PCF8563DateTimeError};
use crate::{AlarmHours, AlarmMinutes, RegAddr, TimeField};

/// Minute/hour alarm settings.
///
/// On write, `None` leaves the comparator as it is. On read (see
/// [`PCF8563::daily_alarm`](crate::PCF8563::daily_alarm)), `None` means the
/// comparator is disabled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DailyAlarm {
    /// Hours value (0-23)
    pub hours: Option<u8>,
    /// Minutes value (0-59)
    pub minutes: Option<u8>,
}

/// Validated alarm register writes: minutes first, then hours.
pub(crate) type EncodedAlarm = [Option<(RegAddr, u8)>; 2];

impl DailyAlarm {
    /// Alarm at `hours:minutes` every day.
    pub fn at(hours: u8, minutes: u8) -> Self {
        DailyAlarm {
            hours: Some(hours),
            minutes: Some(minutes),
        }
    }

    /// Validates both fields and encodes the enabled register values.
    pub(crate) fn encode(&self) -> Result<EncodedAlarm, PCF8563DateTimeError> {
        let minutes = self
            .minutes
            .map(|m| encode_comparator(TimeField::Minutes, RegAddr::AlarmMinutes, m))
            .transpose()?;
        let hours = self
            .hours
            .map(|h| encode_comparator(TimeField::Hours, RegAddr::AlarmHours, h))
            .transpose()?;
        Ok([minutes, hours])
    }

    /// Decodes the alarm minute and hour registers.
    pub(crate) fn from_registers(minutes: AlarmMinutes, hours: AlarmHours) -> Self {
        let value = |disabled: bool, raw: u8, reg: RegAddr| {
            if disabled {
                None
            } else {
                Some(decode_bcd(raw & reg.value_mask().unwrap_or(0xFF)))
            }
        };
        DailyAlarm {
            minutes: value(minutes.alarm_disable(), minutes.into(), RegAddr::AlarmMinutes),
            hours: value(hours.alarm_disable(), hours.into(), RegAddr::AlarmHours),
        }
    }
}

fn encode_comparator(
    field: TimeField,
    reg: RegAddr,
    value: u8,
) -> Result<(RegAddr, u8), PCF8563DateTimeError> {
    // bit 7 clear enables the comparator
    let bcd = encode_field(field, value)? & 0x7F;
    Ok((reg, bcd))
}
