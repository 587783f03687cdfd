//! Register definitions and bitfield structures for the PCF8563 RTC.
//!
//! This module contains the register addresses, the masks that strip flag bits
//! from the BCD time registers, and bitfield views of the control, alarm and
//! clock-output registers.

use core::ops::RangeInclusive;

use bitfield::bitfield;

/// Register addresses for the PCF8563 RTC.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Control/status 1 (test mode, STOP, power-on-reset override)
    Control1 = 0x00,
    /// Control/status 2 (alarm and timer flags and interrupt enables)
    Control2 = 0x01,
    /// Seconds register (0-59), bit 7 is the low-voltage flag
    Seconds = 0x02,
    /// Minutes register (0-59)
    Minutes = 0x03,
    /// Hours register (0-23)
    Hours = 0x04,
    /// Date register (1-31)
    Date = 0x05,
    /// Weekday register (0-7)
    Weekday = 0x06,
    /// Month register (1-12), bit 7 is the century flag
    Month = 0x07,
    /// Year register (0-99)
    Year = 0x08,
    /// Alarm minutes register
    AlarmMinutes = 0x09,
    /// Alarm hours register
    AlarmHours = 0x0A,
    /// Alarm day register, also addressed as [`RegAddr::ALARM_WEEKDAY`]
    AlarmDay = 0x0B,
    /// Clock-output control register
    ClockOut = 0x0D,
}

impl RegAddr {
    /// The alarm weekday register.
    ///
    /// This register map places alarm-day and alarm-weekday at the same address,
    /// so this is the same physical register as [`RegAddr::AlarmDay`]: a write
    /// through either name lands in register `0x0B`, and the chip interprets the
    /// byte as its day-of-month comparator.
    pub const ALARM_WEEKDAY: RegAddr = RegAddr::AlarmDay;

    /// Mask selecting the BCD value bits of a time, date or alarm register.
    ///
    /// Returns `None` for registers that hold flags rather than a value.
    pub const fn value_mask(self) -> Option<u8> {
        match self {
            RegAddr::Seconds | RegAddr::Minutes => Some(0x7F),
            RegAddr::Hours | RegAddr::Date => Some(0x3F),
            RegAddr::Weekday => Some(0x07),
            RegAddr::Month => Some(0x1F),
            RegAddr::Year => Some(0xFF),
            RegAddr::AlarmMinutes | RegAddr::AlarmHours => Some(0x7F),
            RegAddr::Control1 | RegAddr::Control2 | RegAddr::AlarmDay | RegAddr::ClockOut => None,
        }
    }
}

impl From<RegAddr> for u8 {
    fn from(v: RegAddr) -> Self {
        v as u8
    }
}

/// The seven calendar fields kept by the chip.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeField {
    /// Seconds (0-59)
    Seconds,
    /// Minutes (0-59)
    Minutes,
    /// Hours (0-23)
    Hours,
    /// Day of week (0-7)
    Weekday,
    /// Day of month (1-31)
    Date,
    /// Month (1-12)
    Month,
    /// Two-digit year (0-99)
    Year,
}

impl TimeField {
    /// The register that stores this field.
    pub const fn register(self) -> RegAddr {
        match self {
            TimeField::Seconds => RegAddr::Seconds,
            TimeField::Minutes => RegAddr::Minutes,
            TimeField::Hours => RegAddr::Hours,
            TimeField::Weekday => RegAddr::Weekday,
            TimeField::Date => RegAddr::Date,
            TimeField::Month => RegAddr::Month,
            TimeField::Year => RegAddr::Year,
        }
    }

    /// The accepted range of values.
    pub const fn range(self) -> RangeInclusive<u8> {
        match self {
            TimeField::Seconds | TimeField::Minutes => 0..=59,
            TimeField::Hours => 0..=23,
            TimeField::Weekday => 0..=7,
            TimeField::Date => 1..=31,
            TimeField::Month => 1..=12,
            TimeField::Year => 0..=99,
        }
    }

    /// Mask applied to the raw register before decoding.
    pub const fn mask(self) -> u8 {
        match self.register().value_mask() {
            Some(mask) => mask,
            None => 0xFF,
        }
    }
}

/// Clock-output (CLKOUT pin) selector values.
///
/// These are full register bytes: bit 7 enables the output and bits 1-0 pick
/// the frequency.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockOutFrequency {
    /// 32.768 kHz
    Khz32_768 = 0x80,
    /// 1.024 kHz
    Khz1_024 = 0x81,
    /// Selector `0x82` (FD = 0b10): 32 Hz on the PCF8563 datasheet
    Hz32 = 0x82,
    /// 1 Hz
    Hz1 = 0x83,
    /// Output disabled, pin in high impedance
    HighImpedance = 0x00,
}

impl ClockOutFrequency {
    /// Interprets a raw clock-output register value, if it matches one of the
    /// named selectors exactly.
    pub const fn from_register(v: u8) -> Option<Self> {
        match v {
            0x80 => Some(ClockOutFrequency::Khz32_768),
            0x81 => Some(ClockOutFrequency::Khz1_024),
            0x82 => Some(ClockOutFrequency::Hz32),
            0x83 => Some(ClockOutFrequency::Hz1),
            0x00 => Some(ClockOutFrequency::HighImpedance),
            _ => None,
        }
    }
}

impl From<ClockOutFrequency> for u8 {
    fn from(v: ClockOutFrequency) -> Self {
        v as u8
    }
}

/// Alarm register value with only the disable bit set, written to every
/// alarm comparator when the alarm is cleared.
pub const ALARM_DISABLED: u8 = 0x80;

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Control/status 1 register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control1(u8);
    impl Debug;
    /// EXT_CLK test mode
    pub test_mode, set_test_mode: 7;
    /// Clock stopped (prescaler held in reset)
    pub stop, set_stop: 5;
    /// Power-on-reset override
    pub power_on_reset_override, set_power_on_reset_override: 3;
}
from_register_u8!(Control1);

#[cfg(feature = "defmt")]
impl defmt::Format for Control1 {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Control1(");
        if self.test_mode() {
            defmt::write!(f, "TEST ");
        }
        if self.stop() {
            defmt::write!(f, "STOP ");
        }
        if self.power_on_reset_override() {
            defmt::write!(f, "POR ");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Control/status 2 register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control2(u8);
    impl Debug;
    /// INT pin pulses for timer interrupts instead of following the flag
    pub timer_interrupt_pulse, set_timer_interrupt_pulse: 4;
    /// Alarm flag, set by the chip when the alarm matches
    pub alarm_flag, set_alarm_flag: 3;
    /// Timer flag, set by the chip when the countdown timer expires
    pub timer_flag, set_timer_flag: 2;
    /// Alarm interrupt enable
    pub alarm_interrupt_enable, set_alarm_interrupt_enable: 1;
    /// Timer interrupt enable
    pub timer_interrupt_enable, set_timer_interrupt_enable: 0;
}
from_register_u8!(Control2);

#[cfg(feature = "defmt")]
impl defmt::Format for Control2 {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Control2(");
        if self.alarm_flag() {
            defmt::write!(f, "AF ");
        }
        if self.alarm_interrupt_enable() {
            defmt::write!(f, "AIE ");
        }
        if self.timer_flag() {
            defmt::write!(f, "TF ");
        }
        if self.timer_interrupt_enable() {
            defmt::write!(f, "TIE ");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Seconds register with the low-voltage flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Seconds(u8);
    impl Debug;
    /// Clock integrity is no longer guaranteed (supply dropped too low)
    pub low_voltage, set_low_voltage: 7;
    /// Tens place of seconds (0-5)
    pub ten_seconds, set_ten_seconds: 6, 4;
    /// Ones place of seconds (0-9)
    pub seconds, set_seconds: 3, 0;
}
from_register_u8!(Seconds);

#[cfg(feature = "defmt")]
impl defmt::Format for Seconds {
    fn format(&self, f: defmt::Formatter) {
        let seconds = 10 * self.ten_seconds() + self.seconds();
        if self.low_voltage() {
            defmt::write!(f, "Seconds({} LV)", seconds);
        } else {
            defmt::write!(f, "Seconds({})", seconds);
        }
    }
}

bitfield! {
    /// Alarm minutes register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmMinutes(u8);
    impl Debug;
    /// Minute comparator disabled
    pub alarm_disable, set_alarm_disable: 7;
    /// BCD minutes value
    pub value, set_value: 6, 0;
}
from_register_u8!(AlarmMinutes);

#[cfg(feature = "defmt")]
impl defmt::Format for AlarmMinutes {
    fn format(&self, f: defmt::Formatter) {
        if self.alarm_disable() {
            defmt::write!(f, "AlarmMinutes(disabled)");
        } else {
            defmt::write!(f, "AlarmMinutes({})", crate::bcd::decode_bcd(self.value()));
        }
    }
}

bitfield! {
    /// Alarm hours register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmHours(u8);
    impl Debug;
    /// Hour comparator disabled
    pub alarm_disable, set_alarm_disable: 7;
    /// BCD hours value
    pub value, set_value: 6, 0;
}
from_register_u8!(AlarmHours);

#[cfg(feature = "defmt")]
impl defmt::Format for AlarmHours {
    fn format(&self, f: defmt::Formatter) {
        if self.alarm_disable() {
            defmt::write!(f, "AlarmHours(disabled)");
        } else {
            defmt::write!(f, "AlarmHours({})", crate::bcd::decode_bcd(self.value()));
        }
    }
}

bitfield! {
    /// Alarm day register, shared with the alarm weekday name.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmDay(u8);
    impl Debug;
    /// Day comparator disabled
    pub alarm_disable, set_alarm_disable: 7;
    /// BCD day-of-month value
    pub day, set_day: 5, 0;
    /// The same bits read as a weekday
    pub weekday, set_weekday: 2, 0;
}
from_register_u8!(AlarmDay);

#[cfg(feature = "defmt")]
impl defmt::Format for AlarmDay {
    fn format(&self, f: defmt::Formatter) {
        if self.alarm_disable() {
            defmt::write!(f, "AlarmDay(disabled)");
        } else {
            defmt::write!(f, "AlarmDay({})", crate::bcd::decode_bcd(self.day()));
        }
    }
}

bitfield! {
    /// Clock-output control register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct ClockOut(u8);
    impl Debug;
    /// CLKOUT pin enabled
    pub enable, set_enable: 7;
    /// Frequency select
    pub frequency, set_frequency: 1, 0;
}
from_register_u8!(ClockOut);

#[cfg(feature = "defmt")]
impl defmt::Format for ClockOut {
    fn format(&self, f: defmt::Formatter) {
        let state = if self.enable() { "on" } else { "off" };
        match self.selector() {
            Some(selector) => defmt::write!(f, "ClockOut({=str} {})", state, selector),
            None => defmt::write!(f, "ClockOut({=str} FD={=u8})", state, self.frequency()),
        }
    }
}

impl ClockOut {
    /// The named selector matching this register value, if any.
    pub fn selector(&self) -> Option<ClockOutFrequency> {
        ClockOutFrequency::from_register(self.0)
    }
}
