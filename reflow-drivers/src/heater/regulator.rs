//! Dual-channel PID heater regulator
//!
//! Each plate has its own PID state and time-proportioning window. The
//! SSR output is asserted for the first `duty% × window` of every window.
//!
//! Control per channel and tick:
//! - measured temperature within the cooling band of setpoint: duty 0,
//!   PID state cleared, no evaluation
//! - otherwise PID with conditional integration: the integral only moves
//!   when the output is unsaturated or the error drives it back out of
//!   saturation; the integral is clamped to ±`i_max`
//! - output clamped to `[0, max_output]` and rounded to whole percent
//!
//! A setpoint drop larger than the bumpless threshold clears the PID
//! state of every channel before evaluation.

use reflow_core::config::{PidGains, RegulatorConfig};
use reflow_core::traits::{Channel, HeatSelection, HeaterOutput, CHANNEL_COUNT};

/// PID and window state for one channel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelState {
    /// Accumulated error (°C·s)
    pub integral: f32,
    /// Error at the previous evaluation; `None` right after a reset
    pub prev_error: Option<f32>,
    /// Timestamp of the previous evaluation (ms)
    pub last_update_ms: Option<u32>,
    /// Start of the current time-proportioning window (ms)
    pub window_start_ms: Option<u32>,
    /// Commanded duty (%)
    pub duty_pct: u8,
    /// Output asserted this tick
    pub output_on: bool,
}

impl ChannelState {
    /// Clear PID terms, keep window timing
    fn clear_pid(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}

struct HeatChannel<H> {
    output: H,
    state: ChannelState,
}

impl<H: HeaterOutput> HeatChannel<H> {
    fn drive(&mut self, on: bool) {
        self.state.output_on = on;
        if self.output.is_on() != on {
            self.output.set_on(on);
        }
    }

    fn disable(&mut self) {
        self.state.duty_pct = 0;
        self.state.clear_pid();
        self.state.last_update_ms = None;
        self.drive(false);
    }

    /// Apply the commanded duty through the fixed window
    fn actuate(&mut self, window_ms: u32, now_ms: u32) {
        let window_ms = window_ms.max(1);
        let start = *self.state.window_start_ms.get_or_insert(now_ms);
        let elapsed = now_ms.wrapping_sub(start);
        let start = if elapsed >= window_ms {
            // Additive advance keeps window edges on a fixed grid
            start.wrapping_add((elapsed / window_ms) * window_ms)
        } else {
            start
        };
        self.state.window_start_ms = Some(start);

        let on_time = self.state.duty_pct as u32 * window_ms / 100;
        self.drive(now_ms.wrapping_sub(start) < on_time);
    }
}

/// Two-plate PID regulator with time-proportioned SSR outputs
pub struct HeaterRegulator<H> {
    channels: [HeatChannel<H>; CHANNEL_COUNT],
    config: RegulatorConfig,
    gains: PidGains,
    max_output_pct: u8,
    last_setpoint: Option<f32>,
}

impl<H: HeaterOutput> HeaterRegulator<H> {
    /// Create a regulator; both outputs are switched off
    pub fn new(front: H, back: H, config: RegulatorConfig) -> Self {
        let mut regulator = Self {
            channels: [
                HeatChannel {
                    output: front,
                    state: ChannelState::default(),
                },
                HeatChannel {
                    output: back,
                    state: ChannelState::default(),
                },
            ],
            gains: config.gains,
            max_output_pct: config.max_output_pct.min(100),
            config,
            last_setpoint: None,
        };
        for ch in regulator.channels.iter_mut() {
            ch.output.set_on(false);
        }
        regulator
    }

    /// Replace the gain set
    ///
    /// Clears the integral terms of both channels.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
        for ch in self.channels.iter_mut() {
            ch.state.integral = 0.0;
        }
        info!(
            "PID gains P={} I={} D={} iMax={}",
            gains.p,
            gains.i,
            gains.d,
            gains.i_max
        );
    }

    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    pub fn config(&self) -> &RegulatorConfig {
        &self.config
    }

    /// Clear all PID state and switch both outputs off
    pub fn reset(&mut self) {
        for ch in self.channels.iter_mut() {
            ch.state.clear_pid();
            ch.state.last_update_ms = None;
            ch.state.duty_pct = 0;
            ch.drive(false);
        }
        self.last_setpoint = None;
        debug!("regulator reset, outputs off");
    }

    /// Set the output ceiling (%), capped at 100
    pub fn set_max_output(&mut self, pct: u8) {
        let pct = pct.min(100);
        if pct != self.max_output_pct {
            trace!("max output {}%", pct);
        }
        self.max_output_pct = pct;
    }

    pub fn max_output(&self) -> u8 {
        self.max_output_pct
    }

    /// Commanded duty of a channel (%)
    pub fn duty_pct(&self, channel: Channel) -> u8 {
        self.channels[channel.index()].state.duty_pct
    }

    /// Output state of a channel this tick
    pub fn is_output_on(&self, channel: Channel) -> bool {
        self.channels[channel.index()].state.output_on
    }

    /// Internal state of a channel
    pub fn channel_state(&self, channel: Channel) -> &ChannelState {
        &self.channels[channel.index()].state
    }

    /// Underlying output driver of a channel
    pub fn output(&self, channel: Channel) -> &H {
        &self.channels[channel.index()].output
    }

    /// Run one closed-loop tick
    ///
    /// # Arguments
    /// - `selection`: channels to regulate; the others are forced off
    /// - `setpoint`: target temperature (°C)
    /// - `temps`: measured temperature per channel (°C)
    /// - `now_ms`: monotonic timestamp
    pub fn control(
        &mut self,
        selection: HeatSelection,
        setpoint: f32,
        temps: [f32; CHANNEL_COUNT],
        now_ms: u32,
    ) {
        if let Some(last) = self.last_setpoint {
            if setpoint < last - self.config.bumpless_threshold_c {
                for ch in self.channels.iter_mut() {
                    ch.state.clear_pid();
                }
                debug!("setpoint drop {} -> {}, PID state cleared", last, setpoint);
            }
        }
        self.last_setpoint = Some(setpoint);

        for channel in Channel::ALL {
            let idx = channel.index();
            if !selection.includes(channel) {
                self.channels[idx].disable();
                continue;
            }

            let duty = self.evaluate(idx, setpoint, temps[idx], now_ms);
            let window_ms = self.config.window_ms;
            let ch = &mut self.channels[idx];
            ch.state.duty_pct = duty;
            ch.actuate(window_ms, now_ms);
        }
    }

    /// Drive the selected channels open-loop at a fixed duty
    ///
    /// The duty is capped by the output ceiling and applied through the
    /// same fixed window. PID state is left untouched.
    pub fn drive_manual(&mut self, selection: HeatSelection, duty_pct: u8, now_ms: u32) {
        let duty = duty_pct.min(self.max_output_pct);
        let window_ms = self.config.window_ms;
        for channel in Channel::ALL {
            let ch = &mut self.channels[channel.index()];
            if selection.includes(channel) {
                ch.state.duty_pct = duty;
                ch.actuate(window_ms, now_ms);
            } else {
                ch.disable();
            }
        }
    }

    /// PID evaluation for one channel, returns duty (%)
    fn evaluate(&mut self, idx: usize, setpoint: f32, measured: f32, now_ms: u32) -> u8 {
        let cfg = &self.config;
        let gains = self.gains;
        let state = &mut self.channels[idx].state;

        let dt = match state.last_update_ms {
            Some(last) => now_ms.wrapping_sub(last) as f32 / 1000.0,
            None => 0.0,
        };
        let dt = if dt <= 0.0 || dt > cfg.max_dt_s {
            cfg.dt_epsilon_s
        } else {
            dt
        };
        state.last_update_ms = Some(now_ms);

        // Coasting into the target from above: never add heat
        if measured >= setpoint - cfg.cooling_band_c {
            state.clear_pid();
            return 0;
        }

        let error = setpoint - measured;
        let derivative = match state.prev_error {
            Some(prev) => gains.d * (error - prev) / dt,
            None => 0.0,
        };
        let proportional = gains.p * error;

        let candidate = state.integral + error * dt;
        let unclamped = proportional + gains.i * candidate + derivative;
        let saturated_high = unclamped >= cfg.saturation_pct;
        let saturated_low = unclamped <= 0.0;
        let accept = (!saturated_high && !saturated_low)
            || (saturated_high && error < 0.0)
            || (saturated_low && error > 0.0);
        if accept {
            state.integral = candidate;
        }
        let i_max = libm::fabsf(gains.i_max);
        state.integral = if i_max.is_nan() {
            0.0
        } else {
            state.integral.clamp(-i_max, i_max)
        };
        state.prev_error = Some(error);

        let output = proportional + gains.i * state.integral + derivative;
        let output = libm::roundf(output.clamp(0.0, self.max_output_pct as f32));
        output as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct MockHeater {
        on: bool,
        switches: u32,
    }

    impl MockHeater {
        fn new() -> Self {
            Self {
                on: false,
                switches: 0,
            }
        }
    }

    impl HeaterOutput for MockHeater {
        fn set_on(&mut self, on: bool) {
            self.on = on;
            self.switches += 1;
        }

        fn is_on(&self) -> bool {
            self.on
        }
    }

    fn regulator(gains: PidGains) -> HeaterRegulator<MockHeater> {
        let config = RegulatorConfig {
            gains,
            ..Default::default()
        };
        HeaterRegulator::new(MockHeater::new(), MockHeater::new(), config)
    }

    #[test]
    fn test_proportional_only() {
        let mut reg = regulator(PidGains::new(2.0, 0.0, 0.0, 150.0));
        reg.control(HeatSelection::Both, 100.0, [90.0, 95.0], 0);
        assert_eq!(reg.duty_pct(Channel::Front), 20);
        assert_eq!(reg.duty_pct(Channel::Back), 10);
        // Start of the window: both outputs asserted
        assert!(reg.output(Channel::Front).is_on());
        assert!(reg.output(Channel::Back).is_on());
    }

    #[test]
    fn test_output_clamped_to_ceiling() {
        let mut reg = regulator(PidGains::new(10.0, 0.0, 0.0, 150.0));
        reg.control(HeatSelection::Both, 200.0, [20.0, 20.0], 0);
        assert_eq!(reg.duty_pct(Channel::Front), 90);

        reg.set_max_output(50);
        reg.control(HeatSelection::Both, 200.0, [20.0, 20.0], 100);
        assert_eq!(reg.duty_pct(Channel::Front), 50);

        reg.set_max_output(0);
        reg.control(HeatSelection::Both, 200.0, [20.0, 20.0], 200);
        assert_eq!(reg.duty_pct(Channel::Front), 0);
        assert!(!reg.is_output_on(Channel::Front));
    }

    #[test]
    fn test_cooling_band_guard() {
        let mut reg = regulator(PidGains::PROFILE);
        reg.control(HeatSelection::Both, 150.0, [140.0, 140.0], 0);
        reg.control(HeatSelection::Both, 150.0, [140.0, 140.0], 500);
        assert!(reg.channel_state(Channel::Front).integral > 0.0);

        // Within 0.5 °C below setpoint: no heat, PID state cleared
        reg.control(HeatSelection::Both, 150.0, [149.6, 151.0], 1000);
        for ch in Channel::ALL {
            assert_eq!(reg.duty_pct(ch), 0);
            assert_eq!(reg.channel_state(ch).integral, 0.0);
            assert_eq!(reg.channel_state(ch).prev_error, None);
            assert!(!reg.is_output_on(ch));
        }
    }

    #[test]
    fn test_disabled_channel_forced_off() {
        let mut reg = regulator(PidGains::DEFAULT);
        reg.control(HeatSelection::Both, 200.0, [190.0, 190.0], 0);
        reg.control(HeatSelection::Both, 200.0, [190.0, 190.0], 500);
        assert!(reg.channel_state(Channel::Back).integral != 0.0);

        reg.control(HeatSelection::Front, 200.0, [190.0, 190.0], 1000);
        assert_eq!(reg.duty_pct(Channel::Back), 0);
        assert!(!reg.output(Channel::Back).is_on());
        assert_eq!(reg.channel_state(Channel::Back).integral, 0.0);
        assert!(reg.duty_pct(Channel::Front) > 0);
    }

    #[test]
    fn test_reselected_channel_skips_stale_derivative() {
        let mut reg = regulator(PidGains::new(1.0, 0.0, 100.0, 150.0));
        reg.control(HeatSelection::Both, 100.0, [50.0, 50.0], 0);
        assert_eq!(reg.duty_pct(Channel::Back), 50);

        reg.control(HeatSelection::Front, 100.0, [50.0, 50.0], 1000);
        let back = reg.channel_state(Channel::Back);
        assert_eq!(back.prev_error, None);
        assert_eq!(back.last_update_ms, None);

        // Error fell 50 -> 40 while disabled: P only on resumption
        reg.control(HeatSelection::Both, 100.0, [50.0, 60.0], 2000);
        assert_eq!(reg.duty_pct(Channel::Back), 40);
    }

    #[test]
    fn test_negative_integral_limit_uses_magnitude() {
        let mut reg = regulator(PidGains::new(0.0, 1.0, 0.0, -10.0));
        reg.control(HeatSelection::Front, 100.0, [50.0, 0.0], 0);
        reg.control(HeatSelection::Front, 100.0, [50.0, 0.0], 1000);
        assert_eq!(reg.channel_state(Channel::Front).integral, 10.0);

        reg.set_gains(PidGains::new(0.0, 1.0, 0.0, f32::NAN));
        reg.control(HeatSelection::Front, 100.0, [50.0, 0.0], 2000);
        assert_eq!(reg.channel_state(Channel::Front).integral, 0.0);
        assert_eq!(reg.duty_pct(Channel::Front), 0);
    }

    #[test]
    fn test_integral_stops_at_saturation() {
        // Large P saturates immediately; error stays positive
        let mut reg = regulator(PidGains::new(20.0, 1.0, 0.0, 150.0));
        reg.control(HeatSelection::Both, 200.0, [20.0, 20.0], 0);
        let first = reg.channel_state(Channel::Front).integral;
        for t in 1..50u32 {
            reg.control(HeatSelection::Both, 200.0, [20.0, 20.0], t * 1000);
        }
        assert_eq!(reg.channel_state(Channel::Front).integral, first);
    }

    #[test]
    fn test_integral_accumulates_when_unsaturated() {
        let mut reg = regulator(PidGains::new(0.1, 0.1, 0.0, 150.0));
        reg.control(HeatSelection::Front, 50.0, [40.0, 0.0], 0);
        reg.control(HeatSelection::Front, 50.0, [40.0, 0.0], 1000);
        reg.control(HeatSelection::Front, 50.0, [40.0, 0.0], 2000);
        // 10 °C error for 2 s plus the first epsilon step
        let integral = reg.channel_state(Channel::Front).integral;
        assert!((integral - 20.01).abs() < 1e-3);
    }

    #[test]
    fn test_bumpless_transfer_on_setpoint_drop() {
        let mut reg = regulator(PidGains::PROFILE);
        reg.control(HeatSelection::Both, 200.0, [150.0, 150.0], 0);
        reg.control(HeatSelection::Both, 200.0, [150.0, 150.0], 1000);
        assert!(reg.channel_state(Channel::Front).prev_error.is_some());

        reg.control(HeatSelection::Both, 140.0, [150.0, 150.0], 2000);
        for ch in Channel::ALL {
            let state = reg.channel_state(ch);
            assert_eq!(state.integral, 0.0);
            assert_eq!(state.prev_error, None);
        }
    }

    #[test]
    fn test_derivative_skipped_after_reset() {
        let mut reg = regulator(PidGains::new(1.0, 0.0, 100.0, 150.0));
        reg.control(HeatSelection::Front, 100.0, [50.0, 0.0], 0);
        // P only on the first evaluation
        assert_eq!(reg.duty_pct(Channel::Front), 50);

        reg.reset();
        assert!(!reg.output(Channel::Front).is_on());
        reg.control(HeatSelection::Front, 100.0, [60.0, 0.0], 1000);
        assert_eq!(reg.duty_pct(Channel::Front), 40);
    }

    #[test]
    fn test_timer_anomaly_uses_epsilon() {
        let mut reg = regulator(PidGains::new(0.0, 1.0, 0.0, 150.0));
        reg.control(HeatSelection::Front, 100.0, [90.0, 0.0], 5000);
        // Same timestamp: dt falls back to epsilon
        reg.control(HeatSelection::Front, 100.0, [90.0, 0.0], 5000);
        let integral = reg.channel_state(Channel::Front).integral;
        assert!((integral - 0.02).abs() < 1e-5);

        // Backwards jump looks like a huge wrap: also epsilon
        reg.control(HeatSelection::Front, 100.0, [90.0, 0.0], 4000);
        let integral = reg.channel_state(Channel::Front).integral;
        assert!((integral - 0.03).abs() < 1e-5);
    }

    #[test]
    fn test_window_does_not_drift() {
        let mut reg = regulator(PidGains::DEFAULT);
        // 10 ms ticks with 3 ms jitter every fourth tick
        let mut now = 0u32;
        let mut on_ticks = 0u32;
        let mut ticks = 0u32;
        for i in 0..2000u32 {
            reg.drive_manual(HeatSelection::Front, 30, now);
            if reg.is_output_on(Channel::Front) {
                on_ticks += 1;
            }
            ticks += 1;
            now += if i % 4 == 3 { 13 } else { 9 };
        }
        let start = reg.channel_state(Channel::Front).window_start_ms.unwrap_or(1);
        assert_eq!(start % 1000, 0);
        let fraction = on_ticks as f32 / ticks as f32;
        assert!((fraction - 0.30).abs() < 0.02, "fraction {}", fraction);
    }

    #[test]
    fn test_manual_drive_respects_ceiling() {
        let mut reg = regulator(PidGains::DEFAULT);
        reg.drive_manual(HeatSelection::Back, 100, 0);
        assert_eq!(reg.duty_pct(Channel::Back), 90);
        assert_eq!(reg.duty_pct(Channel::Front), 0);
        assert!(reg.output(Channel::Back).is_on());
        assert!(!reg.output(Channel::Front).is_on());

        // 900 ms into the window the 90% output has ended
        reg.drive_manual(HeatSelection::Back, 100, 900);
        assert!(!reg.is_output_on(Channel::Back));
    }

    #[test]
    fn test_outputs_only_switched_on_change() {
        let mut reg = regulator(PidGains::new(10.0, 0.0, 0.0, 150.0));
        let before = reg.output(Channel::Front).switches;
        for t in 0..10u32 {
            reg.control(HeatSelection::Front, 200.0, [20.0, 20.0], t * 10);
        }
        assert_eq!(reg.output(Channel::Front).switches, before + 1);
    }

    proptest! {
        #[test]
        fn prop_integral_within_clamp(
            temps in proptest::collection::vec(0.0f32..250.0, 1..60),
            setpoint in 0.0f32..250.0,
        ) {
            let mut reg = regulator(PidGains::new(0.5, 0.5, 0.0, 150.0));
            for (i, t) in temps.iter().enumerate() {
                reg.control(HeatSelection::Both, setpoint, [*t, *t], i as u32 * 1000);
                for ch in Channel::ALL {
                    prop_assert!(reg.channel_state(ch).integral.abs() <= 150.0);
                    prop_assert!(reg.duty_pct(ch) <= reg.max_output());
                }
            }
        }

        #[test]
        fn prop_unselected_channel_stays_off(
            temps in proptest::collection::vec(0.0f32..250.0, 1..40),
            duty in 0u8..=100,
        ) {
            let mut reg = regulator(PidGains::CONSTANT);
            for (i, t) in temps.iter().enumerate() {
                let now = i as u32 * 97;
                if i % 2 == 0 {
                    reg.control(HeatSelection::Front, 220.0, [*t, *t], now);
                } else {
                    reg.drive_manual(HeatSelection::Front, duty, now);
                }
                prop_assert_eq!(reg.duty_pct(Channel::Back), 0);
                prop_assert!(!reg.output(Channel::Back).is_on());
            }
        }
    }
}
