//! Station controller coordinating modes, heaters and fan
//!
//! The controller is the central state machine that:
//! - Turns encoder input into mode transitions
//! - Runs the active mode's control step once per tick
//! - Arbitrates the fan (automatic rules, manual mode, safety override)
//! - Queues audible feedback for the frontend
//! - Produces the render snapshot

use heapless::Deque;
use reflow_core::config::{PidGains, Profile, StationConfig};
use reflow_core::render::{
    CoolingTestPhase, Detail, FanStatus, RenderState, RunKind, RunStatus,
};
use reflow_core::safety::{CoolingAction, CoolingMonitor, FanArbiter, FanDecision};
use reflow_core::state::{Feedback, InputEvents, MenuItem, ModeKind, SetupField};
use reflow_core::traits::{Channel, FanOutput, HeatSelection, HeaterOutput, CHANNEL_COUNT};
use reflow_drivers::heater::HeaterRegulator;

use crate::cooling_test::CoolingTest;
use crate::mode::{ConstantRun, Mode, ProfileRun};

/// Pending feedback notifications; the oldest is dropped when full
pub const FEEDBACK_QUEUE_LEN: usize = 4;

/// Station state machine
pub struct StationController<H, F> {
    regulator: HeaterRegulator<H>,
    fan: F,
    config: StationConfig,
    profiles: &'static [Profile],
    cooling: CoolingMonitor,
    arbiter: FanArbiter,
    /// Current mode and its data
    mode: Mode,
    /// Highlighted main-menu entry
    menu_item: MenuItem,
    /// Plates chosen in the menu
    selection: HeatSelection,
    /// Plates driven by the current run, fixed when it starts
    active: HeatSelection,
    /// Automatic fan rules suppressed
    manual_fan: bool,
    /// Profile offered when entering profile setup
    profile_index: u8,
    /// Constant setup values offered when entering constant setup
    constant_setpoint_c: i16,
    constant_duration_s: u16,
    /// Plate temperatures of the latest tick (°C)
    temps: [f32; CHANNEL_COUNT],
    /// Timestamp of the latest tick (ms)
    now_ms: u32,
    feedback: Deque<Feedback, FEEDBACK_QUEUE_LEN>,
}

impl<H: HeaterOutput, F: FanOutput> StationController<H, F> {
    /// Create a controller in the menu with heaters and fan off
    pub fn new(
        regulator: HeaterRegulator<H>,
        mut fan: F,
        profiles: &'static [Profile],
        config: StationConfig,
    ) -> Self {
        fan.set(false);
        Self {
            regulator,
            fan,
            profiles,
            cooling: CoolingMonitor::new(config.cooling),
            arbiter: FanArbiter::new(config.fan),
            mode: Mode::Menu,
            menu_item: MenuItem::default(),
            selection: HeatSelection::default(),
            active: HeatSelection::Off,
            manual_fan: false,
            profile_index: 0,
            constant_setpoint_c: config.setup.setpoint_default_c,
            constant_duration_s: config.setup.duration_default_s,
            temps: [0.0; CHANNEL_COUNT],
            now_ms: 0,
            feedback: Deque::new(),
            config,
        }
    }

    /// Current mode with its data
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn menu_item(&self) -> MenuItem {
        self.menu_item
    }

    pub fn selection(&self) -> HeatSelection {
        self.selection
    }

    pub fn is_manual_fan(&self) -> bool {
        self.manual_fan
    }

    pub fn regulator(&self) -> &HeaterRegulator<H> {
        &self.regulator
    }

    pub fn fan(&self) -> &F {
        &self.fan
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Next pending notification, oldest first
    pub fn take_feedback(&mut self) -> Option<Feedback> {
        self.feedback.pop_front()
    }

    /// Power-on with a hot plate: start the fan and warn
    pub fn hot_plate_warning(&mut self, max_temp: f32) {
        warn!("plate at {}C on power-up, fan on", max_temp);
        self.fan.set(true);
        self.notify(Feedback::HotPlateWarning);
    }

    /// Run one control tick
    ///
    /// # Arguments
    /// - `now_ms`: monotonic timestamp (wrapping)
    /// - `temps`: calibrated, smoothed plate temperatures (°C)
    /// - `input`: encoder and button events since the previous tick
    pub fn tick(&mut self, now_ms: u32, temps: [f32; CHANNEL_COUNT], input: InputEvents) {
        self.now_ms = now_ms;
        self.temps = temps;

        if input.steps != 0 {
            self.handle_steps(input.steps);
        }
        if input.long_press {
            self.handle_long_press();
        } else if input.click {
            self.handle_click();
        }

        self.run_mode(now_ms);
        self.apply_safety();
    }

    /// Snapshot for the display
    pub fn render_state(&self) -> RenderState {
        let mut duty_pct = [0; CHANNEL_COUNT];
        let mut heater_on = [false; CHANNEL_COUNT];
        for channel in Channel::ALL {
            duty_pct[channel.index()] = self.regulator.duty_pct(channel);
            heater_on[channel.index()] = self.regulator.is_output_on(channel);
        }

        RenderState {
            mode: self.mode.kind(),
            menu_item: self.menu_item,
            temperatures_c: self.temps,
            duty_pct,
            heater_on,
            selection: self.selection,
            fan: FanStatus {
                manual: self.manual_fan,
                on: self.fan.is_on(),
                duty_pct: self.fan.duty_pct(),
            },
            detail: self.detail(),
        }
    }

    fn detail(&self) -> Detail {
        match self.mode {
            Mode::Menu => Detail::None,
            Mode::ProfileSetup { index } => Detail::ProfileSetup {
                index,
                name: self
                    .profiles
                    .get(index as usize)
                    .map(|p| p.name)
                    .unwrap_or(""),
            },
            Mode::ConstantSetup {
                setpoint_c,
                duration_s,
                field,
            } => Detail::ConstantSetup {
                setpoint_c,
                duration_s,
                field,
            },
            Mode::ProfileRun(run) => Detail::Run(RunStatus {
                kind: RunKind::Profile {
                    index: run.index,
                    name: run.context.profile().name,
                },
                elapsed_s: run.elapsed_s,
                remaining_s: run.remaining_s(),
                setpoint_c: run.setpoint_c,
                done: run.done,
                aborted: run.aborted,
                cooling: self.cooling.is_active(),
            }),
            Mode::ConstantRun(run) => Detail::Run(RunStatus {
                kind: RunKind::Constant,
                elapsed_s: run.elapsed_s,
                remaining_s: run.remaining_s(),
                setpoint_c: run.setpoint_c,
                done: run.done,
                aborted: run.aborted,
                cooling: false,
            }),
            Mode::TestRun { duty_pct } => Detail::Test { duty_pct },
            Mode::CoolingTest(test) => Detail::CoolingTest(test.status(self.now_ms)),
        }
    }

    fn max_temperature(&self) -> f32 {
        self.temps[0].max(self.temps[1])
    }

    fn notify(&mut self, feedback: Feedback) {
        if self.feedback.is_full() {
            if let Some(dropped) = self.feedback.pop_front() {
                warn!("feedback queue full, dropped {}", dropped);
            }
        }
        let _ = self.feedback.push_back(feedback);
    }

    fn set_mode(&mut self, mode: Mode) {
        let (from, to) = (self.mode.kind(), mode.kind());
        if from != to {
            info!("mode {} -> {}", from, to);
        }
        self.mode = mode;
    }

    // ---- Input ----

    fn handle_steps(&mut self, steps: i32) {
        let limits = self.config.setup;
        match &mut self.mode {
            Mode::Menu => {
                self.menu_item = self.menu_item.step(steps);
            }
            Mode::ProfileSetup { index } => {
                let len = self.profiles.len() as i32;
                if len > 0 {
                    *index = (*index as i32 + steps).rem_euclid(len) as u8;
                    self.profile_index = *index;
                }
            }
            Mode::ConstantSetup {
                setpoint_c,
                duration_s,
                field,
            } => match field {
                SetupField::Setpoint => {
                    let next = *setpoint_c as i32
                        + steps.saturating_mul(limits.setpoint_step_c as i32);
                    *setpoint_c = next.clamp(
                        limits.setpoint_min_c as i32,
                        limits.setpoint_max_c as i32,
                    ) as i16;
                }
                SetupField::Duration => {
                    let next = *duration_s as i32
                        + steps.saturating_mul(limits.duration_step_s as i32);
                    *duration_s = next.clamp(
                        limits.duration_min_s as i32,
                        limits.duration_max_s as i32,
                    ) as u16;
                }
            },
            Mode::TestRun { duty_pct } => {
                let next =
                    *duty_pct as i32 + steps.saturating_mul(limits.test_duty_step_pct as i32);
                *duty_pct = next.clamp(0, 100) as u8;
            }
            _ => {}
        }
    }

    fn handle_click(&mut self) {
        match self.mode {
            Mode::Menu => self.handle_menu_click(),
            Mode::ProfileSetup { index } => self.start_profile(index),
            Mode::ConstantSetup {
                setpoint_c,
                duration_s,
                field: SetupField::Setpoint,
            } => {
                self.mode = Mode::ConstantSetup {
                    setpoint_c,
                    duration_s,
                    field: SetupField::Duration,
                };
                self.notify(Feedback::Select);
            }
            Mode::ConstantSetup {
                setpoint_c,
                duration_s,
                field: SetupField::Duration,
            } => self.start_constant(setpoint_c, duration_s),
            Mode::ProfileRun(ProfileRun { done, aborted, .. })
            | Mode::ConstantRun(ConstantRun { done, aborted, .. }) => {
                if done || aborted {
                    self.return_to_menu();
                } else {
                    self.abort_run();
                }
            }
            Mode::TestRun { .. } => {
                self.regulator.reset();
                self.fan.set(false);
                self.set_mode(Mode::Menu);
                self.notify(Feedback::Acknowledge);
            }
            Mode::CoolingTest(_) => {}
        }
    }

    fn handle_menu_click(&mut self) {
        match self.menu_item {
            MenuItem::Plates => {
                self.selection = self.selection.next();
                info!("heat selection {}", self.selection);
                self.notify(Feedback::Select);
            }
            MenuItem::Profile => {
                if self.require_selection() {
                    if self.profiles.is_empty() {
                        warn!("no profiles configured");
                        self.notify(Feedback::Reject);
                        return;
                    }
                    let last = self.profiles.len() - 1;
                    let index = (self.profile_index as usize).min(last) as u8;
                    self.set_mode(Mode::ProfileSetup { index });
                    self.notify(Feedback::Select);
                }
            }
            MenuItem::Constant => {
                if self.require_selection() {
                    self.set_mode(Mode::ConstantSetup {
                        setpoint_c: self.constant_setpoint_c,
                        duration_s: self.constant_duration_s,
                        field: SetupField::Setpoint,
                    });
                    self.notify(Feedback::Select);
                }
            }
            MenuItem::Fan => {
                if self.manual_fan {
                    let on = !self.fan.is_on();
                    self.fan.set(on);
                    info!("manual fan {}", on);
                } else {
                    self.manual_fan = true;
                    self.fan.set(false);
                    info!("manual fan mode");
                }
                self.notify(Feedback::Select);
            }
            MenuItem::Test => {
                self.regulator.reset();
                self.restore_ceiling();
                self.manual_fan = false;
                self.fan.set(false);
                self.set_mode(Mode::TestRun { duty_pct: 0 });
            }
        }
    }

    /// Reject with a tone when no plate is selected
    fn require_selection(&mut self) -> bool {
        if self.selection.any() {
            return true;
        }
        warn!("no plate selected");
        self.notify(Feedback::Reject);
        false
    }

    fn handle_long_press(&mut self) {
        if let Mode::TestRun { .. } = self.mode {
            self.regulator.reset();
            self.manual_fan = false;
            let test = CoolingTest::new(self.config.cooling_test, self.config.gains.cooling_test);
            self.set_mode(Mode::CoolingTest(test));
            self.notify(Feedback::CoolingTestStart);
            return;
        }

        warn!("long press: outputs off, back to menu");
        self.regulator.reset();
        self.fan.set(false);
        self.manual_fan = false;
        self.end_run();
        self.notify(Feedback::Acknowledge);
    }

    // ---- Run lifecycle ----

    fn start_profile(&mut self, index: u8) {
        let Some(profile) = self.profiles.get(index as usize) else {
            self.notify(Feedback::Reject);
            return;
        };
        if let Err(e) = profile.validate() {
            warn!("profile {} rejected: {}", profile.name, e);
            self.notify(Feedback::Reject);
            return;
        }
        if !self.require_selection() {
            return;
        }

        self.profile_index = index;
        self.begin_run(self.config.gains.profile);
        info!(
            "profile run {} ({}s) on {}",
            profile.name,
            profile.duration_s(),
            self.active
        );
        self.set_mode(Mode::ProfileRun(ProfileRun::begin(index, profile, self.now_ms)));
        self.notify(Feedback::Select);
    }

    fn start_constant(&mut self, setpoint_c: i16, duration_s: u16) {
        if !self.require_selection() {
            return;
        }

        self.constant_setpoint_c = setpoint_c;
        self.constant_duration_s = duration_s;
        self.begin_run(self.config.gains.constant);
        info!("constant run {}C for {}s on {}", setpoint_c, duration_s, self.active);
        self.set_mode(Mode::ConstantRun(ConstantRun::begin(
            setpoint_c as f32,
            duration_s,
            self.now_ms,
        )));
        self.notify(Feedback::Select);
    }

    /// Fresh regulator, automatic fan switched off, no cooling state
    fn begin_run(&mut self, gains: PidGains) {
        self.active = self.selection;
        self.manual_fan = false;
        self.regulator.set_gains(gains);
        self.regulator.reset();
        self.restore_ceiling();
        self.fan.set(false);
        self.cooling.clear();
    }

    /// Undo a cooling-mode ceiling of 0
    fn restore_ceiling(&mut self) {
        self.regulator
            .set_max_output(self.regulator.config().max_output_pct);
    }

    fn abort_run(&mut self) {
        match &mut self.mode {
            Mode::ProfileRun(run) => run.aborted = true,
            Mode::ConstantRun(run) => run.aborted = true,
            _ => return,
        }
        self.regulator.reset();
        info!("run aborted");
        self.notify(Feedback::Acknowledge);
    }

    fn finish_run(&mut self) {
        self.regulator.reset();
        self.fan.set(true);
        info!("run complete, fan on for cooldown");
        self.notify(Feedback::Complete);
    }

    /// Leave a finished or aborted run, fan left on for cooldown
    fn return_to_menu(&mut self) {
        self.regulator.reset();
        self.manual_fan = false;
        self.fan.set(true);
        self.end_run();
        self.notify(Feedback::Acknowledge);
    }

    fn end_run(&mut self) {
        self.active = HeatSelection::Off;
        self.selection = HeatSelection::Both;
        self.cooling.clear();
        self.restore_ceiling();
        self.set_mode(Mode::Menu);
    }

    /// A run reached with no plate selected is a logic error: stop heating
    fn check_active(&mut self) -> bool {
        if self.active.any() {
            return true;
        }
        error!("run without a selected plate, aborting");
        self.regulator.reset();
        self.fan.set(true);
        self.end_run();
        false
    }

    // ---- Per-mode control ----

    fn run_mode(&mut self, now_ms: u32) {
        match self.mode {
            Mode::Menu => {
                if !self.manual_fan {
                    let decision = self.arbiter.menu(self.max_temperature());
                    self.apply_fan(decision);
                }
            }
            Mode::ProfileRun(run) if run.is_active() => self.run_profile(run, now_ms),
            Mode::ConstantRun(run) if run.is_active() => self.run_constant(run, now_ms),
            Mode::TestRun { duty_pct } => {
                self.regulator.drive_manual(self.selection, duty_pct, now_ms);
            }
            Mode::CoolingTest(test) => self.run_cooling_test(test, now_ms),
            _ => {}
        }
    }

    fn run_profile(&mut self, mut run: ProfileRun, now_ms: u32) {
        if !self.check_active() {
            return;
        }

        let setpoint = run.context.advance(now_ms);
        run.setpoint_c = setpoint.celsius;
        run.elapsed_s = run.context.elapsed_s(now_ms);

        if setpoint.finished {
            run.done = true;
            self.mode = Mode::ProfileRun(run);
            self.finish_run();
            return;
        }

        let max_temp = self.max_temperature();
        let in_phase = run.context.in_cooling_phase(now_ms);
        let full_ceiling = self.regulator.config().max_output_pct;
        let decision = self
            .cooling
            .update(setpoint.celsius, max_temp, in_phase, full_ceiling);

        if decision.entered {
            info!(
                "cooling mode on: setpoint {}C, max {}C",
                setpoint.celsius,
                max_temp
            );
        }
        if decision.exited {
            info!(
                "cooling mode off: setpoint {}C, max {}C",
                setpoint.celsius,
                max_temp
            );
        }

        match decision.action {
            CoolingAction::Disable => {
                self.regulator.reset();
                self.regulator.set_max_output(0);
            }
            CoolingAction::Hold => {}
            CoolingAction::Regulate { max_output_pct } => {
                self.regulator.set_max_output(max_output_pct);
                self.regulator
                    .control(self.active, setpoint.celsius, self.temps, now_ms);
            }
        }

        if !self.manual_fan {
            let decision = self.arbiter.profile_run(
                self.cooling.is_active(),
                in_phase,
                max_temp,
                setpoint.celsius,
            );
            self.apply_fan(decision);
        }

        self.mode = Mode::ProfileRun(run);
    }

    fn run_constant(&mut self, mut run: ConstantRun, now_ms: u32) {
        if !self.check_active() {
            return;
        }

        if run.advance(now_ms) {
            run.done = true;
            self.mode = Mode::ConstantRun(run);
            self.finish_run();
            return;
        }

        self.regulator
            .control(self.active, run.setpoint_c, self.temps, now_ms);

        if !self.manual_fan {
            let decision = self
                .arbiter
                .constant_run(self.max_temperature(), run.setpoint_c);
            self.apply_fan(decision);
        }

        self.mode = Mode::ConstantRun(run);
    }

    fn run_cooling_test(&mut self, mut test: CoolingTest, now_ms: u32) {
        match test.tick(now_ms, self.temps, &mut self.regulator, &mut self.fan) {
            Some(summary) => {
                debug!("cooling summary {}", summary);
                self.regulator.reset();
                self.set_mode(Mode::Menu);
                self.notify(Feedback::CoolingTestDone);
            }
            None => self.mode = Mode::CoolingTest(test),
        }
    }

    // ---- Fan ----

    fn apply_fan(&mut self, decision: FanDecision) {
        if let Some(on) = decision.target() {
            if on != self.fan.is_on() {
                debug!("fan {}: {}", on, decision);
                self.fan.set(on);
            }
        }
    }

    /// Forces the fan on above the absolute ceiling, manual mode or not
    ///
    /// The cooling test owns the fan while heating to its reference.
    fn apply_safety(&mut self) {
        if let Mode::CoolingTest(test) = &self.mode {
            if test.phase() == CoolingTestPhase::Heating {
                return;
            }
        }
        let max_temp = self.max_temperature();
        if let FanDecision::On(_) = self.arbiter.safety(max_temp) {
            if !self.fan.is_on() {
                warn!("safety: plate at {}C, fan forced on", max_temp);
                self.fan.set(true);
            }
        }
    }
}
