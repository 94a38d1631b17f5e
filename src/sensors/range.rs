//! VL53L0X time-of-flight range sensor, mounted above the water surface.
//!
//! [`RangeSensor::init`] brings the part up the way ST's reference flow
//! does: data init, reference SPAD selection, the default tuning table,
//! the measurement timing budget and the VHV and phase calibrations.
//!
//! [`RangeSensor::start_continuous`] then selects continuous timed
//! mode: the sensor ranges once per `period_ms` on its own and raises
//! its interrupt status when a result is waiting.  A zero period falls
//! back to back-to-back ranging.  [`RangeSensor::read_mm`] only polls
//! that status, so a stalled sensor can never block the control loop.
//!
//! ## Timeout
//!
//! A sample is due one period after the previous one.  If none has
//! arrived `timeout_ms` past that point, `read_mm` reports
//! [`SensorError::Timeout`] once and starts waiting afresh.
//!
//! ## Dual-target design
//!
//! The driver is generic over [`embedded_hal::i2c::I2c`]; on the device
//! it runs over the ESP-IDF I2C master driver, in tests over a paged
//! register map mock.

use embedded_hal::i2c::I2c;
use log::{debug, info};

use crate::error::SensorError;
use crate::monitor::Distance;

/// Fixed 7-bit bus address.
pub const ADDRESS: u8 = 0x29;

/// Value of [`reg::MODEL_ID`] on a genuine part.
pub const MODEL_ID: u8 = 0xEE;

mod reg {
    pub const SYSRANGE_START: u8 = 0x00;
    pub const SYSTEM_SEQUENCE_CONFIG: u8 = 0x01;
    pub const SYSTEM_INTERMEASUREMENT_PERIOD: u8 = 0x04;
    pub const SYSTEM_INTERRUPT_CONFIG_GPIO: u8 = 0x0A;
    pub const SYSTEM_INTERRUPT_CLEAR: u8 = 0x0B;
    pub const RESULT_INTERRUPT_STATUS: u8 = 0x13;
    pub const RESULT_RANGE_STATUS: u8 = 0x14;
    pub const FINAL_RANGE_MIN_COUNT_RATE_RTN_LIMIT: u8 = 0x44;
    pub const MSRC_CONFIG_TIMEOUT_MACROP: u8 = 0x46;
    pub const PRE_RANGE_CONFIG_VCSEL_PERIOD: u8 = 0x50;
    pub const PRE_RANGE_CONFIG_TIMEOUT_MACROP_HI: u8 = 0x51;
    pub const MSRC_CONFIG_CONTROL: u8 = 0x60;
    pub const FINAL_RANGE_CONFIG_VCSEL_PERIOD: u8 = 0x70;
    pub const FINAL_RANGE_CONFIG_TIMEOUT_MACROP_HI: u8 = 0x71;
    pub const GPIO_HV_MUX_ACTIVE_HIGH: u8 = 0x84;
    pub const VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV: u8 = 0x89;
    pub const I2C_STANDARD_MODE: u8 = 0x88;
    pub const STOP_VARIABLE: u8 = 0x91;
    pub const SPAD_INFO: u8 = 0x92;
    pub const SPAD_INFO_STROBE: u8 = 0x83;
    pub const DYNAMIC_SPAD_NUM_REQUESTED_REF_SPAD: u8 = 0x4E;
    pub const DYNAMIC_SPAD_REF_EN_START_OFFSET: u8 = 0x4F;
    pub const GLOBAL_CONFIG_SPAD_ENABLES_REF_0: u8 = 0xB0;
    pub const GLOBAL_CONFIG_REF_EN_START_SELECT: u8 = 0xB6;
    pub const MODEL_ID: u8 = 0xC0;
    pub const OSC_CALIBRATE_VAL: u8 = 0xF8;
    pub const POWER_MANAGEMENT: u8 = 0x80;
    pub const PAGE_SELECT: u8 = 0xFF;
    pub const INTERNAL_TUNING: u8 = 0x00;
}

/// Continuous mode with an inter-measurement period.
const START_TIMED: u8 = 0x04;
/// Continuous back-to-back mode.
const START_BACK_TO_BACK: u8 = 0x02;
/// 0.25 MCPS return signal limit in 9.7 fixed point.
const SIGNAL_RATE_LIMIT: u16 = 0x0020;
/// Offset of the range result inside the result block.
const RANGE_OFFSET: u8 = 10;
/// Sequence steps used for ranging: DSS, pre-range and final range.
const SEQUENCE_RANGING: u8 = 0xE8;
/// Status reads allowed while waiting on a blocking init step.
const POLL_LIMIT: u32 = 5_000;

/// ST's default tuning settings, written as `(register, value)` pairs.
/// Page switches via `0xFF` are part of the table.
#[rustfmt::skip]
const DEFAULT_TUNING: &[(u8, u8)] = &[
    (0xFF, 0x01), (0x00, 0x00),
    (0xFF, 0x00), (0x09, 0x00), (0x10, 0x00), (0x11, 0x00),
    (0x24, 0x01), (0x25, 0xFF), (0x75, 0x00),
    (0xFF, 0x01), (0x4E, 0x2C), (0x48, 0x00), (0x30, 0x20),
    (0xFF, 0x00), (0x30, 0x09), (0x54, 0x00), (0x31, 0x04), (0x32, 0x03),
    (0x40, 0x83), (0x46, 0x25), (0x60, 0x00), (0x27, 0x00), (0x50, 0x06),
    (0x51, 0x00), (0x52, 0x96), (0x56, 0x08), (0x57, 0x30), (0x61, 0x00),
    (0x62, 0x00), (0x64, 0x00), (0x65, 0x00), (0x66, 0xA0),
    (0xFF, 0x01), (0x22, 0x32), (0x47, 0x14), (0x49, 0xFF), (0x4A, 0x00),
    (0xFF, 0x00), (0x7A, 0x0A), (0x7B, 0x00), (0x78, 0x21),
    (0xFF, 0x01), (0x23, 0x34), (0x42, 0x00), (0x44, 0xFF), (0x45, 0x26),
    (0x46, 0x05), (0x40, 0x40), (0x0E, 0x06), (0x20, 0x1A), (0x43, 0x40),
    (0xFF, 0x00), (0x34, 0x03), (0x35, 0x44),
    (0xFF, 0x01), (0x31, 0x04), (0x4B, 0x09), (0x4C, 0x05), (0x4D, 0x04),
    (0xFF, 0x00), (0x44, 0x00), (0x45, 0x20), (0x47, 0x08), (0x48, 0x28),
    (0x67, 0x00), (0x70, 0x04), (0x71, 0x01), (0x72, 0xFE), (0x76, 0x00),
    (0x77, 0x00),
    (0xFF, 0x01), (0x0D, 0x01),
    (0xFF, 0x00), (0x80, 0x01), (0x01, 0xF8),
    (0xFF, 0x01), (0x8E, 0x01), (0x00, 0x01), (0xFF, 0x00), (0x80, 0x00),
];

/// Fixed per-step costs of a ranging sequence, in microseconds.
mod overhead {
    pub const START: u32 = 1910;
    pub const END: u32 = 960;
    pub const MSRC: u32 = 660;
    pub const TCC: u32 = 590;
    pub const DSS: u32 = 690;
    pub const PRE_RANGE: u32 = 660;
    pub const FINAL_RANGE: u32 = 550;
}

/// Which steps of the ranging sequence are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SequenceSteps {
    tcc: bool,
    dss: bool,
    msrc: bool,
    pre_range: bool,
    final_range: bool,
}

impl SequenceSteps {
    fn from_config(config: u8) -> Self {
        Self {
            tcc: config & 0x10 != 0,
            dss: config & 0x08 != 0,
            msrc: config & 0x04 != 0,
            pre_range: config & 0x40 != 0,
            final_range: config & 0x80 != 0,
        }
    }
}

/// Step timeouts as read back from the part.
#[derive(Debug, Clone, Copy)]
struct StepTimeouts {
    final_vcsel_pclks: u16,
    msrc_dss_tcc_us: u32,
    pre_range_mclks: u32,
    pre_range_us: u32,
    final_range_us: u32,
}

/// Macro period in nanoseconds for a VCSEL period in PCLKs.
fn macro_period_ns(vcsel_pclks: u16) -> u32 {
    (2304 * u32::from(vcsel_pclks) * 1655 + 500) / 1000
}

fn mclks_to_us(mclks: u32, vcsel_pclks: u16) -> u32 {
    let ns = macro_period_ns(vcsel_pclks);
    mclks.saturating_mul(ns).saturating_add(500) / 1000
}

fn us_to_mclks(us: u32, vcsel_pclks: u16) -> u32 {
    let ns = macro_period_ns(vcsel_pclks);
    us.saturating_mul(1000).saturating_add(ns / 2) / ns
}

/// Timeout registers hold `(lsb << msb) + 1` with `msb` in the high byte.
fn decode_timeout(raw: u16) -> u32 {
    u32::from(raw & 0xFF)
        .checked_shl(u32::from(raw >> 8))
        .unwrap_or(u32::MAX)
        .saturating_add(1)
}

fn encode_timeout(mclks: u32) -> u16 {
    if mclks == 0 {
        return 0;
    }
    let mut lsb = mclks - 1;
    let mut msb = 0u16;
    while lsb > 0xFF {
        lsb >>= 1;
        msb += 1;
    }
    (msb << 8) | (lsb as u16)
}

fn decode_vcsel_period(raw: u8) -> u16 {
    (u16::from(raw) + 1) << 1
}

/// Keep `count` reference SPADs enabled starting at `first`, clearing the rest.
fn select_ref_spads(map: &mut [u8; 6], first: usize, count: u8) {
    let mut enabled = 0u8;
    for i in 0..48 {
        let (byte, bit) = (i / 8, 1u8 << (i % 8));
        if i < first || enabled == count {
            map[byte] &= !bit;
        } else if map[byte] & bit != 0 {
            enabled += 1;
        }
    }
}

pub struct RangeSensor<I2C> {
    i2c: I2C,
    timeout_ms: u64,
    period_ms: u64,
    stop_variable: u8,
    timing_budget_us: u32,
    /// When the current wait for a sample began.
    waiting_since_ms: Option<u64>,
}

impl<I2C: I2c> RangeSensor<I2C> {
    pub fn new(i2c: I2C, timeout_ms: u32) -> Self {
        Self {
            i2c,
            timeout_ms: u64::from(timeout_ms),
            period_ms: 0,
            stop_variable: 0,
            timing_budget_us: 0,
            waiting_since_ms: None,
        }
    }

    /// Verify the part, run data and static init, then calibrate.
    ///
    /// Blocks on the bus for the SPAD info strobe and both reference
    /// calibrations, each bounded by a fixed number of status reads.
    pub fn init(&mut self) -> Result<(), SensorError> {
        let id = self.read_reg(reg::MODEL_ID)?;
        if id != MODEL_ID {
            return Err(SensorError::WrongDevice(id));
        }

        // 2V8 I/O mode
        let extsup = self.read_reg(reg::VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV)?;
        self.write_reg(reg::VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV, extsup | 0x01)?;
        self.write_reg(reg::I2C_STANDARD_MODE, 0x00)?;

        self.stop_variable = self.with_internal_page(|s| s.read_reg(reg::STOP_VARIABLE))?;

        // Disable MSRC and TCC limit checks, set the return signal limit.
        let msrc = self.read_reg(reg::MSRC_CONFIG_CONTROL)?;
        self.write_reg(reg::MSRC_CONFIG_CONTROL, msrc | 0x12)?;
        self.write_reg16(reg::FINAL_RANGE_MIN_COUNT_RATE_RTN_LIMIT, SIGNAL_RATE_LIMIT)?;
        self.write_reg(reg::SYSTEM_SEQUENCE_CONFIG, 0xFF)?;

        self.configure_ref_spads()?;
        for &(r, v) in DEFAULT_TUNING {
            self.write_reg(r, v)?;
        }

        // Interrupt on "new sample ready", active low.
        self.write_reg(reg::SYSTEM_INTERRUPT_CONFIG_GPIO, 0x04)?;
        let mux = self.read_reg(reg::GPIO_HV_MUX_ACTIVE_HIGH)?;
        self.write_reg(reg::GPIO_HV_MUX_ACTIVE_HIGH, mux & !0x10)?;
        self.write_reg(reg::SYSTEM_INTERRUPT_CLEAR, 0x01)?;

        // The budget read under the tuned sequence is re-applied once
        // TCC and MSRC are dropped from it.
        let budget = self.measurement_timing_budget()?;
        self.write_reg(reg::SYSTEM_SEQUENCE_CONFIG, SEQUENCE_RANGING)?;
        self.set_measurement_timing_budget(budget)?;

        self.write_reg(reg::SYSTEM_SEQUENCE_CONFIG, 0x01)?;
        self.single_ref_calibration(0x40)?;
        self.write_reg(reg::SYSTEM_SEQUENCE_CONFIG, 0x02)?;
        self.single_ref_calibration(0x00)?;
        self.write_reg(reg::SYSTEM_SEQUENCE_CONFIG, SEQUENCE_RANGING)?;

        info!(
            "RANGE | VL53L0X ready (stop_variable=0x{:02X} budget={}us)",
            self.stop_variable, self.timing_budget_us
        );
        Ok(())
    }

    /// Measurement timing budget applied by [`init`](Self::init).
    pub fn timing_budget_us(&self) -> u32 {
        self.timing_budget_us
    }

    /// Start continuous ranging.  `period_ms == 0` selects back-to-back mode.
    pub fn start_continuous(&mut self, period_ms: u32, now_ms: u64) -> Result<(), SensorError> {
        let stop = self.stop_variable;
        self.with_internal_page(|s| s.write_reg(reg::STOP_VARIABLE, stop))?;

        if period_ms == 0 {
            self.write_reg(reg::SYSRANGE_START, START_BACK_TO_BACK)?;
        } else {
            let osc = self.read_reg16(reg::OSC_CALIBRATE_VAL)?;
            let mut period = period_ms;
            if osc != 0 {
                period = period.saturating_mul(u32::from(osc));
            }
            self.write_reg32(reg::SYSTEM_INTERMEASUREMENT_PERIOD, period)?;
            self.write_reg(reg::SYSRANGE_START, START_TIMED)?;
        }

        self.period_ms = u64::from(period_ms);
        self.waiting_since_ms = Some(now_ms);
        info!("RANGE | continuous timed mode (period={}ms)", period_ms);
        Ok(())
    }

    /// Poll for a fresh sample without blocking.
    pub fn read_mm(&mut self, now_ms: u64) -> Result<Distance, SensorError> {
        let status = self.read_reg(reg::RESULT_INTERRUPT_STATUS)?;
        if status & 0x07 == 0 {
            let since = *self.waiting_since_ms.get_or_insert(now_ms);
            if now_ms.saturating_sub(since) > self.period_ms + self.timeout_ms {
                self.waiting_since_ms = Some(now_ms);
                debug!("RANGE | no sample for {}ms", now_ms - since);
                return Err(SensorError::Timeout);
            }
            return Err(SensorError::NotReady);
        }

        let mm = self.read_reg16(reg::RESULT_RANGE_STATUS + RANGE_OFFSET)?;
        self.write_reg(reg::SYSTEM_INTERRUPT_CLEAR, 0x01)?;
        self.waiting_since_ms = Some(now_ms);
        Ok(mm)
    }

    /// Hand the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    // ── Static init ──────────────────────────────────────────

    /// Read the factory SPAD count and type, then enable exactly that
    /// many reference SPADs from the first usable one.
    fn configure_ref_spads(&mut self) -> Result<(), SensorError> {
        let (count, aperture) = self.spad_info()?;

        let mut map = [0u8; 6];
        self.read_block(reg::GLOBAL_CONFIG_SPAD_ENABLES_REF_0, &mut map)?;

        self.write_reg(reg::PAGE_SELECT, 0x01)?;
        self.write_reg(reg::DYNAMIC_SPAD_REF_EN_START_OFFSET, 0x00)?;
        self.write_reg(reg::DYNAMIC_SPAD_NUM_REQUESTED_REF_SPAD, 0x2C)?;
        self.write_reg(reg::PAGE_SELECT, 0x00)?;
        self.write_reg(reg::GLOBAL_CONFIG_REF_EN_START_SELECT, 0xB4)?;

        // Aperture SPADs start at index 12.
        let first = if aperture { 12 } else { 0 };
        select_ref_spads(&mut map, first, count);
        self.write_block(reg::GLOBAL_CONFIG_SPAD_ENABLES_REF_0, &map)?;

        debug!("RANGE | ref spads count={} aperture={}", count, aperture);
        Ok(())
    }

    fn spad_info(&mut self) -> Result<(u8, bool), SensorError> {
        self.write_reg(reg::POWER_MANAGEMENT, 0x01)?;
        self.write_reg(reg::PAGE_SELECT, 0x01)?;
        self.write_reg(reg::INTERNAL_TUNING, 0x00)?;

        self.write_reg(reg::PAGE_SELECT, 0x06)?;
        let strobe = self.read_reg(reg::SPAD_INFO_STROBE)?;
        self.write_reg(reg::SPAD_INFO_STROBE, strobe | 0x04)?;
        self.write_reg(reg::PAGE_SELECT, 0x07)?;
        self.write_reg(0x81, 0x01)?;
        self.write_reg(reg::POWER_MANAGEMENT, 0x01)?;
        self.write_reg(0x94, 0x6B)?;
        self.write_reg(reg::SPAD_INFO_STROBE, 0x00)?;
        self.poll_until(reg::SPAD_INFO_STROBE, |v| v != 0)?;
        self.write_reg(reg::SPAD_INFO_STROBE, 0x01)?;
        let info = self.read_reg(reg::SPAD_INFO)?;

        self.write_reg(0x81, 0x00)?;
        self.write_reg(reg::PAGE_SELECT, 0x06)?;
        let strobe = self.read_reg(reg::SPAD_INFO_STROBE)?;
        self.write_reg(reg::SPAD_INFO_STROBE, strobe & !0x04)?;
        self.write_reg(reg::PAGE_SELECT, 0x01)?;
        self.write_reg(reg::INTERNAL_TUNING, 0x01)?;
        self.write_reg(reg::PAGE_SELECT, 0x00)?;
        self.write_reg(reg::POWER_MANAGEMENT, 0x00)?;

        Ok((info & 0x7F, info & 0x80 != 0))
    }

    /// Single-shot reference calibration; `0x40` selects VHV, `0x00` phase.
    fn single_ref_calibration(&mut self, vhv_init: u8) -> Result<(), SensorError> {
        self.write_reg(reg::SYSRANGE_START, 0x01 | vhv_init)?;
        self.poll_until(reg::RESULT_INTERRUPT_STATUS, |v| v & 0x07 != 0)?;
        self.write_reg(reg::SYSTEM_INTERRUPT_CLEAR, 0x01)?;
        self.write_reg(reg::SYSRANGE_START, 0x00)
    }

    fn poll_until(&mut self, reg: u8, done: impl Fn(u8) -> bool) -> Result<u8, SensorError> {
        for _ in 0..POLL_LIMIT {
            let v = self.read_reg(reg)?;
            if done(v) {
                return Ok(v);
            }
        }
        Err(SensorError::Timeout)
    }

    // ── Timing budget ────────────────────────────────────────

    fn sequence_steps(&mut self) -> Result<SequenceSteps, SensorError> {
        Ok(SequenceSteps::from_config(self.read_reg(reg::SYSTEM_SEQUENCE_CONFIG)?))
    }

    fn step_timeouts(&mut self, steps: SequenceSteps) -> Result<StepTimeouts, SensorError> {
        let pre_vcsel = decode_vcsel_period(self.read_reg(reg::PRE_RANGE_CONFIG_VCSEL_PERIOD)?);
        let msrc_mclks = u32::from(self.read_reg(reg::MSRC_CONFIG_TIMEOUT_MACROP)?) + 1;
        let pre_range_mclks =
            decode_timeout(self.read_reg16(reg::PRE_RANGE_CONFIG_TIMEOUT_MACROP_HI)?);

        let final_vcsel =
            decode_vcsel_period(self.read_reg(reg::FINAL_RANGE_CONFIG_VCSEL_PERIOD)?);
        let mut final_mclks =
            decode_timeout(self.read_reg16(reg::FINAL_RANGE_CONFIG_TIMEOUT_MACROP_HI)?);
        if steps.pre_range {
            final_mclks = final_mclks.saturating_sub(pre_range_mclks);
        }

        Ok(StepTimeouts {
            final_vcsel_pclks: final_vcsel,
            msrc_dss_tcc_us: mclks_to_us(msrc_mclks, pre_vcsel),
            pre_range_mclks,
            pre_range_us: mclks_to_us(pre_range_mclks, pre_vcsel),
            final_range_us: mclks_to_us(final_mclks, final_vcsel),
        })
    }

    /// Budget spent on every enabled step except the final range.
    fn fixed_budget_us(steps: SequenceSteps, t: &StepTimeouts) -> u32 {
        let mut used = overhead::START + overhead::END;
        if steps.tcc {
            used += t.msrc_dss_tcc_us + overhead::TCC;
        }
        if steps.dss {
            used += 2 * (t.msrc_dss_tcc_us + overhead::DSS);
        } else if steps.msrc {
            used += t.msrc_dss_tcc_us + overhead::MSRC;
        }
        if steps.pre_range {
            used += t.pre_range_us + overhead::PRE_RANGE;
        }
        used
    }

    fn measurement_timing_budget(&mut self) -> Result<u32, SensorError> {
        let steps = self.sequence_steps()?;
        let t = self.step_timeouts(steps)?;
        let mut budget = Self::fixed_budget_us(steps, &t);
        if steps.final_range {
            budget += t.final_range_us + overhead::FINAL_RANGE;
        }
        Ok(budget)
    }

    /// Give the final range step whatever the other steps leave of `budget_us`.
    fn set_measurement_timing_budget(&mut self, budget_us: u32) -> Result<(), SensorError> {
        let steps = self.sequence_steps()?;
        let t = self.step_timeouts(steps)?;
        if steps.final_range {
            let used = Self::fixed_budget_us(steps, &t) + overhead::FINAL_RANGE;
            let Some(final_us) = budget_us.checked_sub(used) else {
                return Err(SensorError::Budget(budget_us));
            };
            let mut mclks = us_to_mclks(final_us, t.final_vcsel_pclks);
            if steps.pre_range {
                mclks += t.pre_range_mclks;
            }
            self.write_reg16(reg::FINAL_RANGE_CONFIG_TIMEOUT_MACROP_HI, encode_timeout(mclks))?;
        }
        self.timing_budget_us = budget_us;
        Ok(())
    }

    // ── Register access ──────────────────────────────────────

    /// Run `f` with the internal tuning page selected, restoring the
    /// default page afterwards.
    fn with_internal_page<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, SensorError>,
    ) -> Result<T, SensorError> {
        self.write_reg(reg::POWER_MANAGEMENT, 0x01)?;
        self.write_reg(reg::PAGE_SELECT, 0x01)?;
        self.write_reg(reg::INTERNAL_TUNING, 0x00)?;
        let out = f(self)?;
        self.write_reg(reg::INTERNAL_TUNING, 0x01)?;
        self.write_reg(reg::PAGE_SELECT, 0x00)?;
        self.write_reg(reg::POWER_MANAGEMENT, 0x00)?;
        Ok(out)
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(ADDRESS, &[reg, value])
            .map_err(|_| SensorError::Bus)
    }

    fn write_reg16(&mut self, reg: u8, value: u16) -> Result<(), SensorError> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(ADDRESS, &[reg, hi, lo])
            .map_err(|_| SensorError::Bus)
    }

    fn write_reg32(&mut self, reg: u8, value: u32) -> Result<(), SensorError> {
        let [a, b, c, d] = value.to_be_bytes();
        self.i2c
            .write(ADDRESS, &[reg, a, b, c, d])
            .map_err(|_| SensorError::Bus)
    }

    fn write_block(&mut self, reg: u8, data: &[u8; 6]) -> Result<(), SensorError> {
        let mut buf = [0u8; 7];
        buf[0] = reg;
        buf[1..].copy_from_slice(data);
        self.i2c.write(ADDRESS, &buf).map_err(|_| SensorError::Bus)
    }

    fn read_block(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), SensorError> {
        self.i2c
            .write_read(ADDRESS, &[reg], buf)
            .map_err(|_| SensorError::Bus)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.read_block(reg, &mut buf)?;
        Ok(buf[0])
    }

    fn read_reg16(&mut self, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.read_block(reg, &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }
}
