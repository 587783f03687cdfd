//! Async implementation of the PCF8563 driver.
//!
//! This module provides an async interface to the PCF8563 RTC device using
//! `embedded-hal-async` traits. It is only available when the `async` feature
//! is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use pcf8563::asynch::PCF8563;
//!
//! let mut rtc = PCF8563::new(i2c, pcf8563::DEFAULT_ADDRESS);
//! rtc.enable_alarm_interrupt().await?;
//! let now = rtc.read_all().await?;
//! ```

#[cfg(feature = "alloc")]
use alloc::string::{String, ToString};

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Timelike};
use embedded_hal_async::i2c::I2c;
use paste::paste;

use crate::{
    AlarmDay, AlarmHours, AlarmMinutes, ClockOut, Control1, Control2, DailyAlarm, PCF8563Error,
    RegAddr, Seconds, Snapshot, TimeFields, ALARM_CLEAR_WRITES, READ_ORDER,
};

/// PCF8563 Real-Time Clock async driver.
///
/// This struct provides the async interface to the PCF8563 RTC device.
/// Operations match the blocking [`crate::PCF8563`] transaction for transaction.
pub struct PCF8563<I2C: I2c> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> PCF8563<I2C> {
    /// Creates a new PCF8563 async driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The async I2C bus implementation
    /// * `address` - The I2C address of the device (typically 0x51)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Consumes the driver and returns the bus.
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    async fn read_register(&mut self, reg: RegAddr) -> Result<u8, PCF8563Error<I2C::Error>> {
        let mut data = [0];
        self.i2c
            .write_read(self.address, &[reg as u8], &mut data)
            .await?;
        Ok(data[0])
    }

    async fn write_register(
        &mut self,
        reg: RegAddr,
        value: u8,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        debug!("PCF8563: write {:?} = {}", reg, value);
        self.i2c.write(self.address, &[reg as u8, value]).await?;
        Ok(())
    }

    /// Reads every calendar field, one register at a time.
    pub async fn read_all(&mut self) -> Result<Snapshot, PCF8563Error<I2C::Error>> {
        let mut raw = [0; 7];
        for (byte, reg) in raw.iter_mut().zip(READ_ORDER) {
            *byte = self.read_register(reg).await?;
        }
        Ok(Snapshot::from_registers(raw))
    }

    /// Reads the calendar formatted as `YY-MM-DDTHH:MM:SS`.
    #[cfg(feature = "alloc")]
    pub async fn read_as_string(&mut self) -> Result<String, PCF8563Error<I2C::Error>> {
        Ok(self.read_all().await?.to_string())
    }

    /// Reads the calendar as a date/time in `century`.
    pub async fn read_naive_datetime(
        &mut self,
        century: u8,
    ) -> Result<NaiveDateTime, PCF8563Error<I2C::Error>> {
        self.read_all()
            .await?
            .to_naive_datetime(century)
            .map_err(PCF8563Error::from_datetime)
    }

    /// Reads the calendar as a date/time in `century`, tagged with `tz`.
    pub async fn read_as_calendar_datetime<Tz: TimeZone>(
        &mut self,
        century: u8,
        tz: &Tz,
    ) -> Result<DateTime<Tz>, PCF8563Error<I2C::Error>> {
        self.read_all()
            .await?
            .to_datetime(century, tz)
            .map_err(PCF8563Error::from_datetime)
    }

    /// Writes the fields present in `fields`, validating all of them first.
    pub async fn write_all(&mut self, fields: &TimeFields) -> Result<(), PCF8563Error<I2C::Error>> {
        let writes = fields.encode().map_err(PCF8563Error::from_datetime)?;
        for (reg, value) in writes.into_iter().flatten() {
            self.write_register(reg, value).await?;
        }
        Ok(())
    }

    /// Writes every calendar field from `datetime`.
    pub async fn write_from_calendar_datetime<T: Datelike + Timelike>(
        &mut self,
        datetime: &T,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        let fields = TimeFields::from_datetime(datetime).map_err(PCF8563Error::from_datetime)?;
        self.write_all(&fields).await
    }

    /// Sets the clock to the host's current local time.
    #[cfg(feature = "clock")]
    pub async fn write_now(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        let now = chrono::Local::now();
        self.write_from_calendar_datetime(&now).await
    }

    /// Overwrites the clock-output register with `frequency`.
    pub async fn set_clock_output_frequency(
        &mut self,
        frequency: impl Into<u8>,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        self.write_register(RegAddr::ClockOut, frequency.into())
            .await
    }

    /// Returns true if the alarm flag is set.
    pub async fn is_alarm_active(&mut self) -> Result<bool, PCF8563Error<I2C::Error>> {
        Ok(self.control2().await?.alarm_flag())
    }

    /// Clears the alarm flag only.
    pub async fn deactivate_alarm(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        let mut control = self.control2().await?;
        control.set_alarm_flag(false);
        self.set_control2(control).await
    }

    /// Resets control register 2 and disables all alarm comparators.
    pub async fn clear_alarm_state(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        self.set_control2(Control2::from(0)).await?;
        for (reg, value) in ALARM_CLEAR_WRITES {
            self.write_register(reg, value).await?;
        }
        Ok(())
    }

    /// Returns the alarm interrupt bit (`0x02`) of control register 2.
    pub async fn has_alarm_interrupt_fired(&mut self) -> Result<bool, PCF8563Error<I2C::Error>> {
        Ok(self.control2().await?.alarm_interrupt_enable())
    }

    /// Enables the alarm interrupt.
    pub async fn enable_alarm_interrupt(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        let mut control = self.control2().await?;
        control.set_alarm_interrupt_enable(true);
        self.set_control2(control).await
    }

    /// Disables the alarm interrupt.
    pub async fn disable_alarm_interrupt(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        let mut control = self.control2().await?;
        control.set_alarm_interrupt_enable(false);
        self.set_control2(control).await
    }

    /// Sets and enables the minute and/or hour alarm comparators.
    pub async fn set_daily_alarm(
        &mut self,
        alarm: &DailyAlarm,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        let writes = alarm.encode().map_err(PCF8563Error::from_datetime)?;
        for (reg, value) in writes.into_iter().flatten() {
            self.write_register(reg, value).await?;
        }
        Ok(())
    }

    /// Reads back the minute and hour alarm comparators.
    pub async fn daily_alarm(&mut self) -> Result<DailyAlarm, PCF8563Error<I2C::Error>> {
        let minutes = self.alarm_minutes().await?;
        let hours = self.alarm_hours().await?;
        Ok(DailyAlarm::from_registers(minutes, hours))
    }

    /// Returns true if the low-voltage flag is set.
    pub async fn low_voltage_detected(&mut self) -> Result<bool, PCF8563Error<I2C::Error>> {
        Ok(self.seconds_register().await?.low_voltage())
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<I2C: I2c> PCF8563<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    #[doc = "\n\n# Returns"]
                    #[doc = concat!("* `Ok(", stringify!($typ), ")` - The register value on success")]
                    #[doc = "* `Err(PCF8563Error)` on error"]
                    pub async fn $name(&mut self) -> Result<$typ, PCF8563Error<I2C::Error>> {
                        let value = self.read_register($regaddr).await?;
                        Ok(<$typ>::from(value))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    #[doc = "\n\n# Arguments"]
                    #[doc = concat!("* `value` - The value to write to the ", stringify!($name), " register")]
                    pub async fn [<set_ $name>](&mut self, value: $typ) -> Result<(), PCF8563Error<I2C::Error>> {
                        self.write_register($regaddr, value.into()).await
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

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use crate::{ClockOutFrequency, TimeField};
    use alloc::vec;
    use chrono::NaiveDate;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const DEVICE_ADDRESS: u8 = 0x51;

    async fn setup_mock(expectations: &[I2cTrans]) -> I2cMock {
        I2cMock::new(expectations)
    }

    fn read(reg: RegAddr, value: u8) -> I2cTrans {
        I2cTrans::write_read(DEVICE_ADDRESS, vec![reg as u8], vec![value])
    }

    fn write(reg: RegAddr, value: u8) -> I2cTrans {
        I2cTrans::write(DEVICE_ADDRESS, vec![reg as u8, value])
    }

    #[tokio::test]
    async fn test_async_read_all() {
        let mock = setup_mock(&[
            read(RegAddr::Year, 0x24),
            read(RegAddr::Month, 0x06),
            read(RegAddr::Date, 0x01),
            read(RegAddr::Weekday, 0x06),
            read(RegAddr::Hours, 0x09),
            read(RegAddr::Minutes, 0x15),
            read(RegAddr::Seconds, 0x30),
        ])
        .await;
        let mut dev = PCF8563::new(mock, DEVICE_ADDRESS);

        let snapshot = dev.read_all().await.unwrap();
        assert_eq!(snapshot.year, 24);
        assert_eq!(snapshot.weekday, 6);
        assert_eq!(snapshot.seconds, 30);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_read_naive_datetime() {
        let mock = setup_mock(&[
            read(RegAddr::Year, 0x24),
            read(RegAddr::Month, 0x03),
            read(RegAddr::Date, 0x14),
            read(RegAddr::Weekday, 0x04),
            read(RegAddr::Hours, 0x15),
            read(RegAddr::Minutes, 0x30),
            read(RegAddr::Seconds, 0x00),
        ])
        .await;
        let mut dev = PCF8563::new(mock, DEVICE_ADDRESS);

        let dt = dev.read_naive_datetime(21).await.unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2024, 3, 14)
                .unwrap()
                .and_hms_opt(15, 30, 0)
                .unwrap()
        );
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_write_from_calendar_datetime() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();

        let mock = setup_mock(&[
            write(RegAddr::Seconds, 0x00),
            write(RegAddr::Minutes, 0x30),
            write(RegAddr::Hours, 0x15),
            write(RegAddr::Year, 0x24),
            write(RegAddr::Month, 0x03),
            write(RegAddr::Date, 0x14),
            // Thursday
            write(RegAddr::Weekday, 0x04),
        ])
        .await;
        let mut dev = PCF8563::new(mock, DEVICE_ADDRESS);

        dev.write_from_calendar_datetime(&dt).await.unwrap();
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_write_all_out_of_range() {
        let mock = setup_mock(&[]).await;
        let mut dev = PCF8563::new(mock, DEVICE_ADDRESS);

        let err = dev
            .write_all(&TimeFields::new().with_hours(9).with_date(32))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PCF8563Error::OutOfRange {
                field: TimeField::Date,
                value: 32
            }
        ));
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_alarm_control() {
        let mock = setup_mock(&[
            // enable interrupt
            read(RegAddr::Control2, 0x08),
            write(RegAddr::Control2, 0x0A),
            // alarm active
            read(RegAddr::Control2, 0x0A),
            // deactivate keeps the interrupt enable bit
            read(RegAddr::Control2, 0x0A),
            write(RegAddr::Control2, 0x02),
            // disable interrupt
            read(RegAddr::Control2, 0x02),
            write(RegAddr::Control2, 0x00),
            read(RegAddr::Control2, 0x00),
        ])
        .await;
        let mut dev = PCF8563::new(mock, DEVICE_ADDRESS);

        dev.enable_alarm_interrupt().await.unwrap();
        assert!(dev.is_alarm_active().await.unwrap());
        dev.deactivate_alarm().await.unwrap();
        dev.disable_alarm_interrupt().await.unwrap();
        assert!(!dev.has_alarm_interrupt_fired().await.unwrap());
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_clear_alarm_state() {
        let mock = setup_mock(&[
            write(RegAddr::Control2, 0x00),
            write(RegAddr::AlarmMinutes, 0x80),
            write(RegAddr::AlarmHours, 0x80),
            write(RegAddr::AlarmDay, 0x80),
            write(RegAddr::ALARM_WEEKDAY, 0x80),
        ])
        .await;
        let mut dev = PCF8563::new(mock, DEVICE_ADDRESS);

        dev.clear_alarm_state().await.unwrap();
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_daily_alarm() {
        let mock = setup_mock(&[
            write(RegAddr::AlarmMinutes, 0x00),
            write(RegAddr::AlarmHours, 0x06),
            read(RegAddr::AlarmMinutes, 0x00),
            read(RegAddr::AlarmHours, 0x06),
        ])
        .await;
        let mut dev = PCF8563::new(mock, DEVICE_ADDRESS);

        dev.set_daily_alarm(&DailyAlarm::at(6, 0)).await.unwrap();
        assert_eq!(dev.daily_alarm().await.unwrap(), DailyAlarm::at(6, 0));
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_clock_output() {
        let mock = setup_mock(&[
            write(RegAddr::ClockOut, 0x80),
            read(RegAddr::ClockOut, 0x80),
        ])
        .await;
        let mut dev = PCF8563::new(mock, DEVICE_ADDRESS);

        dev.set_clock_output_frequency(ClockOutFrequency::Khz32_768)
            .await
            .unwrap();
        let clock_out = dev.clock_out().await.unwrap();
        assert_eq!(clock_out.selector(), Some(ClockOutFrequency::Khz32_768));
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_bus_error() {
        let mock = setup_mock(&[write(RegAddr::ClockOut, 0x83).with_error(ErrorKind::Other)]).await;
        let mut dev = PCF8563::new(mock, DEVICE_ADDRESS);

        let err = dev
            .set_clock_output_frequency(ClockOutFrequency::Hz1)
            .await
            .unwrap_err();
        assert!(matches!(err, PCF8563Error::I2c(ErrorKind::Other)));
        dev.i2c.done();
    }
}
