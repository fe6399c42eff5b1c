//! Heater channel traits and channel selection

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of independently heated plates
pub const CHANNEL_COUNT: usize = 2;

/// Physical heater channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Channel {
    /// Front plate
    Front,
    /// Back plate
    Back,
}

impl Channel {
    /// All channels in index order
    pub const ALL: [Channel; CHANNEL_COUNT] = [Channel::Front, Channel::Back];

    /// Array index for per-channel storage
    pub const fn index(self) -> usize {
        match self {
            Channel::Front => 0,
            Channel::Back => 1,
        }
    }
}

/// Which heater channels are enabled for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HeatSelection {
    /// No channel selected; runs cannot start
    Off,
    /// Both plates
    #[default]
    Both,
    /// Front plate only
    Front,
    /// Back plate only
    Back,
}

impl HeatSelection {
    /// Check if a channel is part of this selection
    pub const fn includes(self, channel: Channel) -> bool {
        matches!(
            (self, channel),
            (HeatSelection::Both, _)
                | (HeatSelection::Front, Channel::Front)
                | (HeatSelection::Back, Channel::Back)
        )
    }

    /// Check if at least one channel is selected
    pub const fn any(self) -> bool {
        !matches!(self, HeatSelection::Off)
    }

    /// Next selection in menu cycle order: Off → Both → Front → Back → Off
    pub const fn next(self) -> Self {
        match self {
            HeatSelection::Off => HeatSelection::Both,
            HeatSelection::Both => HeatSelection::Front,
            HeatSelection::Front => HeatSelection::Back,
            HeatSelection::Back => HeatSelection::Off,
        }
    }
}

/// Trait for heater output control
///
/// Implementations drive the SSR for one plate. The output is binary;
/// proportional power comes from time-proportioning in the regulator.
pub trait HeaterOutput {
    /// Turn the heater on or off
    fn set_on(&mut self, on: bool);

    /// Check if the heater is currently on
    fn is_on(&self) -> bool;
}
