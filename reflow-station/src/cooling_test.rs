//! Cooling characterization routine
//!
//! Drives both plates to a reference temperature, then releases the heat,
//! runs the fan and logs the cooling rate until the hottest plate is
//! below the release threshold. Rows are logged as
//! `elapsed_s,temp_c,rate_c_per_min`.

use reflow_core::config::{CoolingTestConfig, PidGains};
use reflow_core::render::{CoolingTestPhase, CoolingTestStatus};
use reflow_core::traits::{FanOutput, HeatSelection, HeaterOutput, CHANNEL_COUNT};
use reflow_drivers::heater::HeaterRegulator;

const MS_PER_MIN: f32 = 60_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Phase {
    /// Gains and ceiling not applied yet
    Idle,
    Heating,
    Cooling {
        start_c: f32,
        started_ms: u32,
        last_log_ms: u32,
        rate_c_per_min: f32,
    },
}

/// Result of a completed routine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoolingSummary {
    /// Hottest plate when the heat was released (°C)
    pub start_c: f32,
    /// Hottest plate at the end (°C)
    pub end_c: f32,
    /// Time spent cooling (min)
    pub minutes: f32,
    /// Mean cooling rate (°C/min)
    pub avg_rate_c_per_min: f32,
}

/// Cooling test state
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoolingTest {
    config: CoolingTestConfig,
    gains: PidGains,
    phase: Phase,
}

impl CoolingTest {
    pub fn new(config: CoolingTestConfig, gains: PidGains) -> Self {
        Self {
            config,
            gains,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> CoolingTestPhase {
        match self.phase {
            Phase::Idle | Phase::Heating => CoolingTestPhase::Heating,
            Phase::Cooling { .. } => CoolingTestPhase::Cooling,
        }
    }

    /// Snapshot for the display
    pub fn status(&self, now_ms: u32) -> CoolingTestStatus {
        match self.phase {
            Phase::Idle | Phase::Heating => CoolingTestStatus {
                phase: CoolingTestPhase::Heating,
                start_c: 0.0,
                elapsed_s: 0,
                rate_c_per_min: 0.0,
            },
            Phase::Cooling {
                start_c,
                started_ms,
                rate_c_per_min,
                ..
            } => CoolingTestStatus {
                phase: CoolingTestPhase::Cooling,
                start_c,
                elapsed_s: now_ms.wrapping_sub(started_ms) / 1000,
                rate_c_per_min,
            },
        }
    }

    /// Run one tick
    ///
    /// Returns the summary once the plates have cooled below the release
    /// threshold; the fan is switched off at that point.
    pub fn tick<H: HeaterOutput, F: FanOutput>(
        &mut self,
        now_ms: u32,
        temps: [f32; CHANNEL_COUNT],
        regulator: &mut HeaterRegulator<H>,
        fan: &mut F,
    ) -> Option<CoolingSummary> {
        let max_temp = temps[0].max(temps[1]);
        let cfg = self.config;

        match &mut self.phase {
            Phase::Idle => {
                regulator.set_gains(self.gains);
                regulator.reset();
                regulator.set_max_output(regulator.config().max_output_pct);
                info!("cooling test: heating to {}C", cfg.reference_c);
                self.phase = Phase::Heating;
                self.heat(now_ms, temps, max_temp, regulator, fan);
                None
            }
            Phase::Heating => {
                self.heat(now_ms, temps, max_temp, regulator, fan);
                None
            }
            Phase::Cooling {
                start_c,
                started_ms,
                last_log_ms,
                rate_c_per_min,
            } => {
                let elapsed_ms = now_ms.wrapping_sub(*started_ms);
                let minutes = elapsed_ms as f32 / MS_PER_MIN;

                if now_ms.wrapping_sub(*last_log_ms) >= cfg.log_interval_ms {
                    *rate_c_per_min = if minutes > 0.0 {
                        (*start_c - max_temp) / minutes
                    } else {
                        0.0
                    };
                    *last_log_ms = now_ms;
                    info!("{},{},{}", elapsed_ms / 1000, max_temp, *rate_c_per_min);
                }

                if max_temp >= cfg.release_c {
                    return None;
                }

                let avg_rate_c_per_min = if minutes > 0.0 {
                    (*start_c - max_temp) / minutes
                } else {
                    0.0
                };
                info!(
                    "cooling test done: {}C -> {}C in {} min, avg {} C/min",
                    *start_c,
                    max_temp,
                    minutes,
                    avg_rate_c_per_min
                );
                fan.set(false);
                Some(CoolingSummary {
                    start_c: *start_c,
                    end_c: max_temp,
                    minutes,
                    avg_rate_c_per_min,
                })
            }
        }
    }

    fn heat<H: HeaterOutput, F: FanOutput>(
        &mut self,
        now_ms: u32,
        temps: [f32; CHANNEL_COUNT],
        max_temp: f32,
        regulator: &mut HeaterRegulator<H>,
        fan: &mut F,
    ) {
        if max_temp < self.config.reference_c {
            regulator.control(HeatSelection::Both, self.config.reference_c, temps, now_ms);
            return;
        }

        regulator.reset();
        fan.set(true);
        self.phase = Phase::Cooling {
            start_c: max_temp,
            started_ms: now_ms,
            last_log_ms: now_ms,
            rate_c_per_min: 0.0,
        };
        info!("cooling test: heat released at {}C", max_temp);
        info!("elapsed_s,temp_c,rate_c_per_min");
        info!("0,{},0", max_temp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflow_core::config::RegulatorConfig;
    use reflow_core::traits::Channel;

    struct MockHeater {
        on: bool,
    }

    impl HeaterOutput for MockHeater {
        fn set_on(&mut self, on: bool) {
            self.on = on;
        }

        fn is_on(&self) -> bool {
            self.on
        }
    }

    struct MockFan {
        duty: u8,
    }

    impl FanOutput for MockFan {
        fn set_duty_pct(&mut self, pct: u8) {
            self.duty = pct.min(100);
        }

        fn duty_pct(&self) -> u8 {
            self.duty
        }
    }

    fn rig() -> (CoolingTest, HeaterRegulator<MockHeater>, MockFan) {
        let test = CoolingTest::new(CoolingTestConfig::default(), PidGains::COOLING_TEST);
        let regulator = HeaterRegulator::new(
            MockHeater { on: false },
            MockHeater { on: false },
            RegulatorConfig::default(),
        );
        (test, regulator, MockFan { duty: 0 })
    }

    #[test]
    fn test_heats_both_plates_with_test_gains() {
        let (mut test, mut reg, mut fan) = rig();
        assert_eq!(test.tick(0, [25.0, 30.0], &mut reg, &mut fan), None);

        assert_eq!(*reg.gains(), PidGains::COOLING_TEST);
        assert_eq!(reg.max_output(), 90);
        assert!(reg.duty_pct(Channel::Front) > 0);
        assert!(reg.duty_pct(Channel::Back) > 0);
        assert_eq!(test.phase(), CoolingTestPhase::Heating);
        assert!(!fan.is_on());
    }

    #[test]
    fn test_release_then_log_then_finish() {
        let (mut test, mut reg, mut fan) = rig();
        test.tick(0, [150.0, 150.0], &mut reg, &mut fan);

        // Reference reached: heat off, fan on
        assert_eq!(test.tick(1_000, [199.0, 201.0], &mut reg, &mut fan), None);
        assert_eq!(test.phase(), CoolingTestPhase::Cooling);
        assert!(fan.is_on());
        assert_eq!(reg.duty_pct(Channel::Front), 0);
        assert!(!reg.is_output_on(Channel::Back));

        // First logged row after 30 s: 201 -> 186 = 30 C/min
        test.tick(31_000, [186.0, 186.0], &mut reg, &mut fan);
        let status = test.status(31_000);
        assert_eq!(status.elapsed_s, 30);
        assert_eq!(status.start_c, 201.0);
        assert!((status.rate_c_per_min - 30.0).abs() < 1e-3);

        // Between log intervals the rate is unchanged
        test.tick(45_000, [170.0, 170.0], &mut reg, &mut fan);
        assert!((test.status(45_000).rate_c_per_min - 30.0).abs() < 1e-3);

        let summary = test
            .tick(601_000, [39.0, 35.0], &mut reg, &mut fan)
            .expect("finished below release threshold");
        assert!((summary.minutes - 10.0).abs() < 1e-3);
        assert!((summary.avg_rate_c_per_min - 16.2).abs() < 1e-3);
        assert_eq!(summary.end_c, 39.0);
        assert!(!fan.is_on());
    }
}
