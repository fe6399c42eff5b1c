//! Station modes and menu items

/// Top-level process mode
///
/// Exactly one is active. Mode-local data lives in the controller's
/// tagged mode value; this is the data-free discriminant used for
/// rendering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeKind {
    /// Main menu (initial)
    #[default]
    Menu,
    /// Choosing a profile
    ProfileSetup,
    /// Choosing a constant setpoint and duration
    ConstantSetup,
    /// Following a profile
    ProfileRun,
    /// Holding a constant setpoint
    ConstantRun,
    /// Open-loop manual duty
    TestRun,
    /// Heat-then-cool characterization
    CoolingTest,
}

/// Main menu entries, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuItem {
    /// Heat selection (click cycles plates)
    #[default]
    Plates,
    /// Profile setup
    Profile,
    /// Constant setup
    Constant,
    /// Manual fan toggle
    Fan,
    /// Test mode
    Test,
}

impl MenuItem {
    /// All items in display order
    pub const ALL: [MenuItem; 5] = [
        MenuItem::Plates,
        MenuItem::Profile,
        MenuItem::Constant,
        MenuItem::Fan,
        MenuItem::Test,
    ];

    /// Position in [`MenuItem::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Move by `steps` entries, wrapping at both ends
    pub fn step(self, steps: i32) -> Self {
        let len = Self::ALL.len() as i32;
        let idx = (self.index() as i32 + steps).rem_euclid(len);
        Self::ALL[idx as usize]
    }
}

/// Field being edited in constant setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupField {
    #[default]
    Setpoint,
    Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_wraps_both_ends() {
        assert_eq!(MenuItem::Plates.step(-1), MenuItem::Test);
        assert_eq!(MenuItem::Test.step(1), MenuItem::Plates);
        assert_eq!(MenuItem::Profile.step(2), MenuItem::Fan);
        assert_eq!(MenuItem::Plates.step(11), MenuItem::Profile);
    }
}
