//! A platform-agnostic driver for the NXP PCF8563 real-time clock.
//!
//! The driver talks to the chip over any [`embedded_hal::i2c::I2c`] bus (or
//! [`embedded_hal_async::i2c::I2c`] with the `async` feature) and converts
//! between the chip's BCD registers and plain integer fields.
//!
//! # Features
//!
//! - Reading the calendar as a [`Snapshot`], a `YY-MM-DDTHH:MM:SS` string or a
//!   chrono date/time
//! - Writing any subset of the calendar fields with [`TimeFields`]
//! - Daily alarm ([`DailyAlarm`]), alarm flag and alarm interrupt control
//! - Clock-output (CLKOUT) frequency selection
//!
//! # Example
//!
//! ```rust,ignore
//! use pcf8563::{TimeFields, PCF8563};
//!
//! let mut rtc = PCF8563::new(i2c, pcf8563::DEFAULT_ADDRESS);
//! rtc.write_all(&TimeFields::new().with_hours(9).with_minutes(15))?;
//! let now = rtc.read_all()?;
//! ```
//!
//! # Concurrency
//!
//! Each operation is a sequence of independent single-byte transactions.
//! Read-modify-write operations on control register 2 are not atomic: if the
//! bus is shared, serialize access to the chip in the bus wrapper.

#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

cfg_if::cfg_if! {
    if #[cfg(feature = "log")] {
        macro_rules! debug {
            ($($arg:tt)*) => { log::debug!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { log::error!($($arg)*) };
        }
    } else if #[cfg(feature = "defmt")] {
        macro_rules! debug {
            ($($arg:tt)*) => { defmt::debug!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { defmt::error!($($arg)*) };
        }
    } else {
        macro_rules! debug {
            ($($arg:expr),* $(,)?) => {{ $( let _ = &$arg; )* }};
        }
        macro_rules! error {
            ($($arg:expr),* $(,)?) => {{ $( let _ = &$arg; )* }};
        }
    }
}

mod alarm;
#[cfg(feature = "async")]
pub mod asynch;
pub mod bcd;
mod datetime;
mod registers;
#[cfg(test)]
mod testing;

#[cfg(feature = "alloc")]
use alloc::string::{String, ToString};

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Timelike};
use embedded_hal::i2c::I2c;
use paste::paste;

pub use crate::alarm::DailyAlarm;
pub use crate::bcd::{decode_bcd, encode_bcd};
pub use crate::datetime::{PCF8563DateTimeError, Snapshot, TimeFields};
pub use crate::registers::*;

/// The 7-bit I2C address of the PCF8563.
pub const DEFAULT_ADDRESS: u8 = 0x51;

/// Error type for PCF8563 operations.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PCF8563Error<I2CE> {
    /// I2C bus error, passed through unchanged
    I2c(I2CE),
    /// A field value is outside its valid range; nothing was written
    OutOfRange {
        /// The offending field
        field: TimeField,
        /// The rejected value
        value: u8,
    },
    /// The calendar registers do not hold a valid date/time
    InvalidDateTime,
}

impl<I2CE> From<I2CE> for PCF8563Error<I2CE> {
    fn from(e: I2CE) -> Self {
        PCF8563Error::I2c(e)
    }
}

impl<I2CE> PCF8563Error<I2CE> {
    pub(crate) fn from_datetime(e: PCF8563DateTimeError) -> Self {
        match e {
            PCF8563DateTimeError::OutOfRange { field, value } => {
                PCF8563Error::OutOfRange { field, value }
            }
            PCF8563DateTimeError::InvalidDateTime => PCF8563Error::InvalidDateTime,
        }
    }
}

/// Order in which [`PCF8563::read_all`] reads the calendar registers.
pub(crate) const READ_ORDER: [RegAddr; 7] = [
    RegAddr::Year,
    RegAddr::Month,
    RegAddr::Date,
    RegAddr::Weekday,
    RegAddr::Hours,
    RegAddr::Minutes,
    RegAddr::Seconds,
];

/// Values written to the alarm registers by [`PCF8563::clear_alarm_state`].
pub(crate) const ALARM_CLEAR_WRITES: [(RegAddr, u8); 4] = [
    (RegAddr::AlarmMinutes, ALARM_DISABLED),
    (RegAddr::AlarmHours, ALARM_DISABLED),
    (RegAddr::AlarmDay, ALARM_DISABLED),
    (RegAddr::ALARM_WEEKDAY, ALARM_DISABLED),
];

/// PCF8563 Real-Time Clock driver.
///
/// Owns the bus and the device address for its lifetime. No chip state is
/// cached: every call goes to the device.
pub struct PCF8563<I2C: I2c> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> PCF8563<I2C> {
    /// Creates a new driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus implementation
    /// * `address` - The 7-bit I2C address of the device (typically [`DEFAULT_ADDRESS`])
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Consumes the driver and returns the bus.
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    /// The device address this driver talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    fn read_register(&mut self, reg: RegAddr) -> Result<u8, PCF8563Error<I2C::Error>> {
        let mut data = [0];
        self.i2c
            .write_read(self.address, &[reg as u8], &mut data)?;
        Ok(data[0])
    }

    fn write_register(&mut self, reg: RegAddr, value: u8) -> Result<(), PCF8563Error<I2C::Error>> {
        debug!("PCF8563: write {:?} = {}", reg, value);
        self.i2c.write(self.address, &[reg as u8, value])?;
        Ok(())
    }

    fn modify_control2<F>(&mut self, f: F) -> Result<(), PCF8563Error<I2C::Error>>
    where
        F: FnOnce(&mut Control2),
    {
        let mut control = self.control2()?;
        f(&mut control);
        self.set_control2(control)
    }

    /// Reads every calendar field.
    ///
    /// Fields are read one register at a time, so the result is not atomic
    /// across a rollover.
    pub fn read_all(&mut self) -> Result<Snapshot, PCF8563Error<I2C::Error>> {
        let mut raw = [0; 7];
        for (byte, reg) in raw.iter_mut().zip(READ_ORDER) {
            *byte = self.read_register(reg)?;
        }
        let snapshot = Snapshot::from_registers(raw);
        debug!("PCF8563: read {:?}", snapshot);
        Ok(snapshot)
    }

    /// Reads the calendar formatted as `YY-MM-DDTHH:MM:SS`.
    #[cfg(feature = "alloc")]
    pub fn read_as_string(&mut self) -> Result<String, PCF8563Error<I2C::Error>> {
        Ok(self.read_all()?.to_string())
    }

    /// Reads the calendar as a date/time in `century` (21 for years 2000-2099).
    pub fn read_naive_datetime(
        &mut self,
        century: u8,
    ) -> Result<NaiveDateTime, PCF8563Error<I2C::Error>> {
        self.read_all()?
            .to_naive_datetime(century)
            .map_err(PCF8563Error::from_datetime)
    }

    /// Reads the calendar as a date/time in `century`, tagged with `tz`.
    ///
    /// The chip time is taken as local time in `tz`; it is not converted.
    pub fn read_as_calendar_datetime<Tz: TimeZone>(
        &mut self,
        century: u8,
        tz: &Tz,
    ) -> Result<DateTime<Tz>, PCF8563Error<I2C::Error>> {
        self.read_all()?
            .to_datetime(century, tz)
            .map_err(PCF8563Error::from_datetime)
    }

    /// Writes the fields present in `fields`; the other registers are left
    /// untouched.
    ///
    /// All present fields are validated before the first write, so an
    /// out-of-range value leaves the chip unchanged.
    pub fn write_all(&mut self, fields: &TimeFields) -> Result<(), PCF8563Error<I2C::Error>> {
        let writes = fields.encode().map_err(PCF8563Error::from_datetime)?;
        for (reg, value) in writes.into_iter().flatten() {
            self.write_register(reg, value)?;
        }
        Ok(())
    }

    /// Writes every calendar field from `datetime` (ISO weekday, year modulo 100).
    pub fn write_from_calendar_datetime<T: Datelike + Timelike>(
        &mut self,
        datetime: &T,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        let fields = TimeFields::from_datetime(datetime).map_err(PCF8563Error::from_datetime)?;
        self.write_all(&fields)
    }

    /// Sets the clock to the host's current local time.
    #[cfg(feature = "clock")]
    pub fn write_now(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        let now = chrono::Local::now();
        self.write_from_calendar_datetime(&now)
    }

    /// Overwrites the clock-output register.
    ///
    /// Accepts a [`ClockOutFrequency`] or any raw byte, which is written as is.
    pub fn set_clock_output_frequency(
        &mut self,
        frequency: impl Into<u8>,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        self.write_register(RegAddr::ClockOut, frequency.into())
    }

    /// Returns true if the alarm flag is set. The flag is not cleared.
    pub fn is_alarm_active(&mut self) -> Result<bool, PCF8563Error<I2C::Error>> {
        Ok(self.control2()?.alarm_flag())
    }

    /// Clears the alarm flag, leaving every other control register 2 bit as is.
    pub fn deactivate_alarm(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        self.modify_control2(|c| c.set_alarm_flag(false))
    }

    /// Resets control register 2 to zero (flags and interrupt enables) and
    /// disables all alarm comparators.
    pub fn clear_alarm_state(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        self.set_control2(Control2::from(0))?;
        for (reg, value) in ALARM_CLEAR_WRITES {
            self.write_register(reg, value)?;
        }
        Ok(())
    }

    /// Returns the alarm interrupt bit (`0x02`) of control register 2.
    pub fn has_alarm_interrupt_fired(&mut self) -> Result<bool, PCF8563Error<I2C::Error>> {
        Ok(self.control2()?.alarm_interrupt_enable())
    }

    /// Enables the alarm interrupt, leaving every other bit as is.
    pub fn enable_alarm_interrupt(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        self.modify_control2(|c| c.set_alarm_interrupt_enable(true))
    }

    /// Disables the alarm interrupt, leaving every other bit as is.
    pub fn disable_alarm_interrupt(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        self.modify_control2(|c| c.set_alarm_interrupt_enable(false))
    }

    /// Sets and enables the minute and/or hour alarm comparators.
    ///
    /// A field left as `None` is not written, so its comparator keeps its
    /// current setting.
    pub fn set_daily_alarm(&mut self, alarm: &DailyAlarm) -> Result<(), PCF8563Error<I2C::Error>> {
        let writes = alarm.encode().map_err(PCF8563Error::from_datetime)?;
        for (reg, value) in writes.into_iter().flatten() {
            self.write_register(reg, value)?;
        }
        Ok(())
    }

    /// Reads back the minute and hour alarm comparators.
    pub fn daily_alarm(&mut self) -> Result<DailyAlarm, PCF8563Error<I2C::Error>> {
        let minutes = self.alarm_minutes()?;
        let hours = self.alarm_hours()?;
        Ok(DailyAlarm::from_registers(minutes, hours))
    }

    /// Returns true if the chip reports a supply drop since the flag was last
    /// cleared, meaning the time may be wrong.
    pub fn low_voltage_detected(&mut self) -> Result<bool, PCF8563Error<I2C::Error>> {
        Ok(self.seconds_register()?.low_voltage())
    }
}

// Raw register access
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<I2C: I2c> PCF8563<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    pub fn $name(&mut self) -> Result<$typ, PCF8563Error<I2C::Error>> {
                        let value = self.read_register($regaddr)?;
                        Ok(<$typ>::from(value))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    pub fn [<set_ $name>](&mut self, value: $typ) -> Result<(), PCF8563Error<I2C::Error>> {
                        self.write_register($regaddr, value.into())
                    }
                }
            )+
        }
    }
}

impl_register_access!(
    (control1, RegAddr::Control1, Control1),
    (control2, RegAddr::Control2, Control2),
    (seconds_register, RegAddr::Seconds, Seconds),
    (alarm_minutes, RegAddr::AlarmMinutes, AlarmMinutes),
    (alarm_hours, RegAddr::AlarmHours, AlarmHours),
    (alarm_day, RegAddr::AlarmDay, AlarmDay),
    (alarm_weekday, RegAddr::ALARM_WEEKDAY, AlarmDay),
    (clock_out, RegAddr::ClockOut, ClockOut)
);
