//! One control tick: sample, poll, advance, render
//!
//! [`Station`] owns every collaborator and is driven by the board's main
//! loop with a millisecond timestamp. Nothing here blocks; the caller
//! decides the tick rate.

use embedded_hal::digital::InputPin;
use reflow_core::config::SensorCalibration;
use reflow_core::state::InputEvents;
use reflow_core::traits::{AdcReader, FanOutput, Frontend, HeaterOutput, CHANNEL_COUNT};
use reflow_drivers::input::EncoderDecoder;
use reflow_drivers::sensor::SensorEstimator;

use crate::controller::StationController;

/// Outcome of the power-on checks
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootReport {
    /// Offsets applied by room-temperature self-calibration
    pub calibration: Option<[SensorCalibration; CHANNEL_COUNT]>,
    /// Hottest plate after priming (°C)
    pub max_c: f32,
    /// A plate was above the hot-plate threshold
    pub hot_plate: bool,
}

/// Complete station: sensors, input, controller and frontend
pub struct Station<'a, A, P, H, F, D> {
    sensors: SensorEstimator<A>,
    input: EncoderDecoder<'a, P>,
    controller: StationController<H, F>,
    frontend: D,
}

impl<'a, A, P, H, F, D> Station<'a, A, P, H, F, D>
where
    A: AdcReader,
    P: InputPin,
    H: HeaterOutput,
    F: FanOutput,
    D: Frontend,
{
    pub fn new(
        sensors: SensorEstimator<A>,
        input: EncoderDecoder<'a, P>,
        controller: StationController<H, F>,
        frontend: D,
    ) -> Self {
        Self {
            sensors,
            input,
            controller,
            frontend,
        }
    }

    /// Power-on sequence
    ///
    /// Primes the estimator, self-calibrates when the plates are at room
    /// temperature and warns about a plate that is still hot.
    pub fn boot(&mut self, now_ms: u32) -> BootReport {
        let boot = self.controller.config().boot;

        for _ in 0..boot.priming_samples {
            self.sensors.update();
        }

        let [front, back] = self.sensors.temperatures();
        let mean = (front + back) / 2.0;
        let calibration = if mean > boot.calibration_min_c && mean < boot.calibration_max_c {
            match self.sensors.calibrate(boot.calibration_reference_c) {
                Ok(cal) => Some(cal),
                Err(e) => {
                    warn!("self-calibration failed: {}", e);
                    None
                }
            }
        } else {
            info!("plates at {}C, self-calibration skipped", mean);
            None
        };

        self.controller
            .tick(now_ms, self.sensors.temperatures(), InputEvents::NONE);

        let max_c = self.sensors.max_temperature();
        let hot_plate = max_c > boot.hot_plate_c;
        if hot_plate {
            self.controller.hot_plate_warning(max_c);
        }

        self.publish();
        BootReport {
            calibration,
            max_c,
            hot_plate,
        }
    }

    /// Run one control tick
    pub fn tick(&mut self, now_ms: u32) {
        self.sensors.update();
        let input = self.input.poll(now_ms);
        if !input.is_empty() {
            trace!("input {}", input);
        }
        self.controller
            .tick(now_ms, self.sensors.temperatures(), input);
        self.publish();
    }

    /// Hand pending feedback and the snapshot to the frontend
    fn publish(&mut self) {
        while let Some(feedback) = self.controller.take_feedback() {
            self.frontend.notify(feedback);
        }
        self.frontend.render(&self.controller.render_state());
    }

    pub fn sensors(&self) -> &SensorEstimator<A> {
        &self.sensors
    }

    /// Mutable access for loading a stored calibration
    pub fn sensors_mut(&mut self) -> &mut SensorEstimator<A> {
        &mut self.sensors
    }

    pub fn controller(&self) -> &StationController<H, F> {
        &self.controller
    }

    pub fn frontend(&self) -> &D {
        &self.frontend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use reflow_core::config::{
        RegulatorConfig, SensorConfig, StationConfig, ThermistorConfig, PROFILES,
    };
    use reflow_core::render::RenderState;
    use reflow_core::state::{Feedback, ModeKind};
    use reflow_core::traits::AdcError;
    use reflow_drivers::heater::HeaterRegulator;
    use reflow_drivers::input::QuadratureCounter;
    use std::vec::Vec;

    struct MockAdc {
        counts: u16,
    }

    impl AdcReader for MockAdc {
        fn read(&mut self) -> Result<u16, AdcError> {
            Ok(self.counts)
        }
    }

    /// ADC count for a plate temperature with the stock divider
    fn counts_for(celsius: f32) -> u16 {
        let cfg = ThermistorConfig::default();
        let t = celsius + 273.15;
        let t0 = cfg.nominal_temp_c + 273.15;
        let r = cfg.nominal_ohms * libm::expf(cfg.beta * (1.0 / t - 1.0 / t0));
        let v = 3.3 * cfg.series_ohms / (cfg.series_ohms + r);
        libm::roundf(v / 3.3 * 4095.0) as u16
    }

    struct IdleButton;

    impl ErrorType for IdleButton {
        type Error = Infallible;
    }

    impl InputPin for IdleButton {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(true)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(false)
        }
    }

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

    #[derive(Default)]
    struct Recorder {
        feedback: Vec<Feedback>,
        frames: u32,
        last: Option<RenderState>,
    }

    impl Frontend for Recorder {
        fn render(&mut self, state: &RenderState) {
            self.frames += 1;
            self.last = Some(*state);
        }

        fn notify(&mut self, feedback: Feedback) {
            self.feedback.push(feedback);
        }
    }

    type TestStation<'a> = Station<'a, MockAdc, IdleButton, MockHeater, MockFan, Recorder>;

    fn station(counter: &QuadratureCounter, front_c: f32, back_c: f32) -> TestStation<'_> {
        let sensors = SensorEstimator::new(
            MockAdc {
                counts: counts_for(front_c),
            },
            MockAdc {
                counts: counts_for(back_c),
            },
            SensorConfig::default(),
        );
        let config = StationConfig::default();
        let input = EncoderDecoder::new(counter, IdleButton, Default::default());
        let regulator = HeaterRegulator::new(
            MockHeater { on: false },
            MockHeater { on: false },
            RegulatorConfig::default(),
        );
        let controller =
            StationController::new(regulator, MockFan { duty: 0 }, PROFILES, config);
        Station::new(sensors, input, controller, Recorder::default())
    }

    #[test]
    fn test_boot_self_calibrates_at_room_temperature() {
        let counter = QuadratureCounter::new();
        let mut st = station(&counter, 26.0, 25.0);
        let report = st.boot(0);

        assert!(report.calibration.is_some());
        assert!(!report.hot_plate);
        for t in st.sensors().temperatures() {
            assert!((t - 23.5).abs() < 0.01, "{}", t);
        }
        assert!(!st.controller().fan().is_on());
        assert!(st.frontend().feedback.is_empty());
        assert_eq!(st.frontend().frames, 1);
    }

    #[test]
    fn test_boot_hot_plate_warning() {
        let counter = QuadratureCounter::new();
        let mut st = station(&counter, 45.0, 25.0);
        let report = st.boot(0);

        assert_eq!(report.calibration, None);
        assert!(report.hot_plate);
        assert!((report.max_c - 45.0).abs() < 0.5);
        assert!(st.controller().fan().is_on());
        assert_eq!(st.frontend().feedback, [Feedback::HotPlateWarning]);
    }

    #[test]
    fn test_tick_forwards_encoder_to_menu() {
        let counter = QuadratureCounter::new();
        let mut st = station(&counter, 25.0, 25.0);
        st.boot(0);

        for (a, b) in [(false, true), (false, false), (true, false), (true, true)] {
            counter.on_transition(a, b);
        }
        st.tick(10);

        let last = st.frontend().last.expect("rendered");
        assert_eq!(last.mode, ModeKind::Menu);
        assert_eq!(last.menu_item, reflow_core::state::MenuItem::Profile);
        assert_eq!(st.frontend().frames, 2);
    }
}
