//! Two-channel plate temperature estimator
//!
//! Per update and channel: oversample the ADC, convert through the
//! thermistor model, reject implausible values (hold the last smoothed
//! value), apply calibration, then smooth with an EMA seeded from the
//! first valid sample.

use reflow_core::config::{CalibrationRecord, SensorCalibration, SensorConfig};
use reflow_core::traits::{AdcReader, Channel, SensorError, CHANNEL_COUNT};

use super::thermistor::Thermistor;

/// Smoothed temperatures for the front and back plates
pub struct SensorEstimator<A> {
    adcs: [A; CHANNEL_COUNT],
    thermistor: Thermistor,
    config: SensorConfig,
    calibration: [SensorCalibration; CHANNEL_COUNT],
    smoothed: [Option<f32>; CHANNEL_COUNT],
    last_fault: [Option<SensorError>; CHANNEL_COUNT],
}

impl<A: AdcReader> SensorEstimator<A> {
    pub fn new(front: A, back: A, config: SensorConfig) -> Self {
        Self {
            adcs: [front, back],
            thermistor: Thermistor::new(config.thermistor, config.vref_v, config.adc_max),
            config,
            calibration: [SensorCalibration::IDENTITY; CHANNEL_COUNT],
            smoothed: [None; CHANNEL_COUNT],
            last_fault: [None; CHANNEL_COUNT],
        }
    }

    /// Sample both channels once; call every control tick
    pub fn update(&mut self) {
        let samples = self.config.oversample;
        for channel in Channel::ALL {
            let idx = channel.index();
            match self.sample_raw(channel, samples) {
                Ok(raw) => {
                    let t = self.calibration[idx].apply(raw);
                    let alpha = self.config.smoothing_alpha;
                    let next = match self.smoothed[idx] {
                        Some(prev) => alpha * t + (1.0 - alpha) * prev,
                        None => t,
                    };
                    self.smoothed[idx] = Some(next);
                    self.last_fault[idx] = None;
                }
                Err(e) => {
                    if self.last_fault[idx].is_none() {
                        warn!("{} sensor fault {}, holding last value", channel, e);
                    }
                    self.last_fault[idx] = Some(e);
                }
            }
        }
    }

    /// One-shot room-temperature offset calibration
    ///
    /// Averages raw samples without smoothing and sets each channel's
    /// offset so the calibrated value equals `room_c`. Calibration is only
    /// changed if both channels read plausibly.
    pub fn calibrate(
        &mut self,
        room_c: f32,
    ) -> Result<[SensorCalibration; CHANNEL_COUNT], SensorError> {
        let samples = self.config.calibration_samples;
        let mut raw = [0.0f32; CHANNEL_COUNT];
        for channel in Channel::ALL {
            raw[channel.index()] = self.sample_raw(channel, samples)?;
        }

        let mut next = self.calibration;
        for (cal, raw_c) in next.iter_mut().zip(raw) {
            let scale = if cal.scale == 0.0 { 1.0 } else { cal.scale };
            *cal = SensorCalibration::new(room_c / scale - raw_c, scale);
        }

        info!(
            "calibrated at {}C: raw front {} back {}, offsets {} {}",
            room_c,
            raw[0],
            raw[1],
            next[0].offset_c,
            next[1].offset_c
        );
        self.set_calibration(next);
        Ok(next)
    }

    /// Replace both channel calibrations
    ///
    /// Smoothed values are carried over to the new calibration so the
    /// output does not jump by the old correction.
    pub fn set_calibration(&mut self, calibration: [SensorCalibration; CHANNEL_COUNT]) {
        for idx in 0..CHANNEL_COUNT {
            let old = self.calibration[idx];
            if let Some(t) = self.smoothed[idx] {
                if old.scale != 0.0 {
                    let raw = t / old.scale - old.offset_c;
                    self.smoothed[idx] = Some(calibration[idx].apply(raw));
                }
            }
        }
        self.calibration = calibration;
    }

    pub fn calibration(&self) -> [SensorCalibration; CHANNEL_COUNT] {
        self.calibration
    }

    /// Persistable form of the current calibration
    pub fn calibration_record(&self) -> CalibrationRecord {
        CalibrationRecord::new(self.calibration)
    }

    /// Apply a stored record after validating it
    pub fn load_calibration(&mut self, record: &CalibrationRecord) -> bool {
        match record.verify() {
            Ok(()) => {
                self.set_calibration(record.channels);
                true
            }
            Err(e) => {
                warn!("stored calibration rejected: {}", e);
                false
            }
        }
    }

    /// Smoothed temperature (°C); the configured initial value before
    /// the first valid sample
    pub fn temperature(&self, channel: Channel) -> f32 {
        self.smoothed[channel.index()].unwrap_or(self.config.initial_c)
    }

    pub fn temperatures(&self) -> [f32; CHANNEL_COUNT] {
        [
            self.temperature(Channel::Front),
            self.temperature(Channel::Back),
        ]
    }

    /// Hottest plate (°C)
    pub fn max_temperature(&self) -> f32 {
        let [front, back] = self.temperatures();
        front.max(back)
    }

    /// A valid sample has been seen on this channel
    pub fn has_reading(&self, channel: Channel) -> bool {
        self.smoothed[channel.index()].is_some()
    }

    /// Fault seen on the latest update, if any
    pub fn last_fault(&self, channel: Channel) -> Option<SensorError> {
        self.last_fault[channel.index()]
    }

    /// Averaged, uncalibrated temperature of one channel
    fn sample_raw(&mut self, channel: Channel, samples: u8) -> Result<f32, SensorError> {
        let samples = samples.max(1);
        let adc = &mut self.adcs[channel.index()];
        let mut sum: u32 = 0;
        for _ in 0..samples {
            sum += adc.read()? as u32;
        }
        let counts = sum as f32 / samples as f32;

        let t = self.thermistor.celsius(counts);
        if !t.is_finite() || t < self.config.min_plausible_c || t > self.config.max_plausible_c {
            return Err(SensorError::OutOfRange);
        }
        Ok(t)
    }
}
