//! Reflow profile definitions
//!
//! Profiles are static, read-only tables of (time, temperature) waypoints.
//! A run interpolates linearly between them; see
//! [`RunContext`](crate::profile::RunContext).

/// Maximum waypoints per profile
pub const MAX_SLOTS: usize = 10;

/// One profile waypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slot {
    /// Offset from run start (s)
    pub time_s: u16,
    /// Target temperature at that offset (°C)
    pub temp_c: u16,
}

impl Slot {
    pub const fn new(time_s: u16, temp_c: u16) -> Self {
        Self { time_s, temp_c }
    }
}

/// Profile validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileError {
    /// Profile has no waypoints
    NoSlots,
    /// More than [`MAX_SLOTS`] waypoints
    TooManySlots,
    /// Waypoint times are not strictly increasing (index of the offender)
    SlotsNotIncreasing(u8),
}

/// Time/temperature reflow profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Profile {
    /// Display name
    pub name: &'static str,
    /// Waypoints, strictly increasing in time
    pub slots: &'static [Slot],
    /// Interpolation floor at t=0, before the first waypoint (°C)
    pub min_temp_c: i16,
    /// Upper bound of the display scale (°C)
    pub max_temp_c: i16,
    /// Index of the waypoint where the cooling phase begins
    ///
    /// Out-of-range means "no cooling phase".
    pub cooling_slot: u8,
}

impl Profile {
    /// Check the waypoint invariants
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.slots.is_empty() {
            return Err(ProfileError::NoSlots);
        }
        if self.slots.len() > MAX_SLOTS {
            return Err(ProfileError::TooManySlots);
        }
        for (i, pair) in self.slots.windows(2).enumerate() {
            if pair[1].time_s <= pair[0].time_s {
                return Err(ProfileError::SlotsNotIncreasing((i + 1) as u8));
            }
        }
        Ok(())
    }

    /// Total duration: time of the last waypoint (s)
    pub fn duration_s(&self) -> u16 {
        self.slots.last().map(|s| s.time_s).unwrap_or(0)
    }

    /// Offset at which the cooling phase begins (s)
    ///
    /// Falls back to the total duration when the cooling index is out of range.
    pub fn cooling_start_s(&self) -> u16 {
        self.slots
            .get(self.cooling_slot as usize)
            .map(|s| s.time_s)
            .unwrap_or_else(|| self.duration_s())
    }

    /// Highest waypoint temperature (°C)
    pub fn peak_c(&self) -> u16 {
        self.slots.iter().map(|s| s.temp_c).max().unwrap_or(0)
    }
}

/// Built-in profiles
pub const PROFILES: &[Profile] = &[
    // Low temp Chipquik, 7 minutes
    Profile {
        name: "Chipqk 165C",
        slots: &[
            Slot::new(90, 45),
            Slot::new(180, 130),
            Slot::new(240, 165), // peak
            Slot::new(330, 100),
            Slot::new(390, 60),
            Slot::new(420, 35),
        ],
        min_temp_c: 10,
        max_temp_c: 170,
        cooling_slot: 4,
    },
    // Leaded, 9 minutes
    Profile {
        name: "Lead 200C",
        slots: &[
            Slot::new(120, 100),
            Slot::new(200, 150),
            Slot::new(250, 200), // peak
            Slot::new(370, 120),
            Slot::new(480, 70),
            Slot::new(540, 40),
        ],
        min_temp_c: 10,
        max_temp_c: 210,
        cooling_slot: 3,
    },
    // Lead-free, 12 minutes
    Profile {
        name: "High 230C",
        slots: &[
            Slot::new(90, 90),
            Slot::new(180, 130),
            Slot::new(210, 165),
            Slot::new(240, 230), // peak
            Slot::new(360, 150),
            Slot::new(510, 90),
            Slot::new(720, 40),
        ],
        min_temp_c: 10,
        max_temp_c: 240,
        cooling_slot: 4,
    },
    // Quick check, 5 minutes
    Profile {
        name: "Test 100C",
        slots: &[
            Slot::new(60, 50),
            Slot::new(120, 100), // peak
            Slot::new(240, 60),
            Slot::new(300, 35),
        ],
        min_temp_c: 25,
        max_temp_c: 110,
        cooling_slot: 2,
    },
    // Step response for PID tuning; cooling index past the end
    Profile {
        name: "Step Test",
        slots: &[Slot::new(30, 50), Slot::new(60, 80), Slot::new(180, 40)],
        min_temp_c: 25,
        max_temp_c: 100,
        cooling_slot: 3,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_valid() {
        for profile in PROFILES {
            assert_eq!(profile.validate(), Ok(()), "{}", profile.name);
            assert!(profile.peak_c() as i16 <= profile.max_temp_c);
        }
    }

    #[test]
    fn test_cooling_start() {
        let lead = &PROFILES[1];
        assert_eq!(lead.duration_s(), 540);
        assert_eq!(lead.cooling_start_s(), 370);

        // Out-of-range cooling index falls back to the duration
        let step = &PROFILES[4];
        assert_eq!(step.cooling_start_s(), step.duration_s());
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        let empty = Profile {
            name: "empty",
            slots: &[],
            min_temp_c: 25,
            max_temp_c: 100,
            cooling_slot: 0,
        };
        assert_eq!(empty.validate(), Err(ProfileError::NoSlots));

        static FLAT: [Slot; 2] = [Slot::new(60, 50), Slot::new(60, 80)];
        let flat = Profile {
            slots: &FLAT,
            ..empty
        };
        assert_eq!(flat.validate(), Err(ProfileError::SlotsNotIncreasing(1)));
    }
}
