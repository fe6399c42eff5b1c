//! Thermistor calibration data
//!
//! Per-channel offset/scale applied as `(T + offset) × scale`. The record
//! form carries a header and CRC so it can be persisted to flash and
//! validated on boot.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::traits::CHANNEL_COUNT;

/// Magic number to identify valid calibration data
pub const CALIBRATION_MAGIC: u32 = 0x5254_4341; // "RTCA"

/// Current calibration data version
pub const CALIBRATION_VERSION: u8 = 1;

/// Calibration for one sensor channel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorCalibration {
    /// Additive offset (°C)
    pub offset_c: f32,
    /// Multiplicative scale
    pub scale: f32,
}

impl SensorCalibration {
    /// No correction
    pub const IDENTITY: Self = Self {
        offset_c: 0.0,
        scale: 1.0,
    };

    pub const fn new(offset_c: f32, scale: f32) -> Self {
        Self { offset_c, scale }
    }

    /// Apply to a raw temperature
    pub fn apply(&self, raw_c: f32) -> f32 {
        (raw_c + self.offset_c) * self.scale
    }
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Calibration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Serialization failed (buffer too small)
    Encode,
    /// Bytes are not a calibration record
    Decode,
    /// Magic number mismatch
    BadMagic,
    /// Record written by a different format version
    BadVersion,
    /// Checksum mismatch
    BadCrc,
}

/// Complete calibration data stored in flash
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationRecord {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Per-channel calibration, indexed by [`Channel::index`](crate::traits::Channel::index)
    pub channels: [SensorCalibration; CHANNEL_COUNT],
    /// CRC32 over magic, version and channels
    pub crc: u32,
}

/// Upper bound on the encoded record size
pub const CALIBRATION_RECORD_MAX_SIZE: usize = 32;

impl Default for CalibrationRecord {
    fn default() -> Self {
        Self::new([SensorCalibration::IDENTITY; CHANNEL_COUNT])
    }
}

impl CalibrationRecord {
    /// Build a record with a valid header and CRC
    pub fn new(channels: [SensorCalibration; CHANNEL_COUNT]) -> Self {
        let mut record = Self {
            magic: CALIBRATION_MAGIC,
            version: CALIBRATION_VERSION,
            channels,
            crc: 0,
        };
        record.crc = record.calculate_crc();
        record
    }

    /// Calculate CRC32 for the data (excluding the crc field itself)
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFF_FFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        for cal in &self.channels {
            crc = crc32_update(crc, &cal.offset_c.to_le_bytes());
            crc = crc32_update(crc, &cal.scale.to_le_bytes());
        }
        !crc
    }

    /// Check header and CRC
    pub fn verify(&self) -> Result<(), CalibrationError> {
        if self.magic != CALIBRATION_MAGIC {
            return Err(CalibrationError::BadMagic);
        }
        if self.version != CALIBRATION_VERSION {
            return Err(CalibrationError::BadVersion);
        }
        if self.crc != self.calculate_crc() {
            return Err(CalibrationError::BadCrc);
        }
        Ok(())
    }

    /// Serialize into `buf`, returning the used prefix
    #[cfg(feature = "serde")]
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], CalibrationError> {
        postcard::to_slice(self, buf).map_err(|_| CalibrationError::Encode)
    }

    /// Deserialize and validate a stored record
    #[cfg(feature = "serde")]
    pub fn decode(bytes: &[u8]) -> Result<Self, CalibrationError> {
        let record: Self = postcard::from_bytes(bytes).map_err(|_| CalibrationError::Decode)?;
        record.verify()?;
        Ok(record)
    }
}

/// CRC32 update (IEEE 802.3 polynomial, reflected)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
