//! NTC thermistor conversion
//!
//! ADC counts → divider node voltage → thermistor resistance → °C via the
//! Beta equation:
//!
//! `1/T = 1/T₀ + ln(R/R₀)/B`

use reflow_core::config::{DividerTopology, ThermistorConfig};

const KELVIN_OFFSET: f32 = 273.15;

/// Node voltage is kept this far from the rails (V)
const RAIL_MARGIN_V: f32 = 0.0005;

/// Thermistor in a voltage divider read by an ADC
#[derive(Debug, Clone, Copy)]
pub struct Thermistor {
    config: ThermistorConfig,
    vref_v: f32,
    adc_max: f32,
}

impl Thermistor {
    /// # Arguments
    /// - `config`: NTC and series resistor parameters
    /// - `vref_v`: ADC reference voltage
    /// - `adc_max`: full-scale ADC count
    pub fn new(config: ThermistorConfig, vref_v: f32, adc_max: u16) -> Self {
        Self {
            config,
            vref_v,
            adc_max: adc_max.max(1) as f32,
        }
    }

    /// Node voltage for an (averaged) ADC reading, kept off the rails
    pub fn voltage(&self, counts: f32) -> f32 {
        let v = counts / self.adc_max * self.vref_v;
        v.clamp(RAIL_MARGIN_V, self.vref_v - RAIL_MARGIN_V)
    }

    /// Thermistor resistance for a node voltage (Ω)
    pub fn resistance(&self, volts: f32) -> f32 {
        let rs = self.config.series_ohms;
        match self.config.topology {
            DividerTopology::NtcToSupply => rs * (self.vref_v - volts) / volts,
            DividerTopology::NtcToGround => rs * volts / (self.vref_v - volts),
        }
    }

    /// Temperature for a thermistor resistance (°C)
    ///
    /// May be non-finite for degenerate inputs; callers check plausibility.
    pub fn celsius_from_resistance(&self, ohms: f32) -> f32 {
        let t0 = self.config.nominal_temp_c + KELVIN_OFFSET;
        let inv_t = 1.0 / t0 + libm::logf(ohms / self.config.nominal_ohms) / self.config.beta;
        1.0 / inv_t - KELVIN_OFFSET
    }

    /// Temperature for an (averaged) ADC reading (°C)
    pub fn celsius(&self, counts: f32) -> f32 {
        self.celsius_from_resistance(self.resistance(self.voltage(counts)))
    }
}
