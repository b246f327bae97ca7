//! Power outage preparedness tips.

use std::fmt;

/// A titled group of tips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipSection {
    /// Heading of the section.
    pub title: &'static str,
    /// The tips, in reading order.
    pub tips: &'static [&'static str],
}

impl fmt::Display for TipSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for tip in self.tips {
            writeln!(f, "  - {tip}")?;
        }
        Ok(())
    }
}

static SECTIONS: [TipSection; 4] = [
    TipSection {
        title: "Before the storm",
        tips: &[
            "Keep flashlights and spare batteries somewhere easy to reach.",
            "Store drinking water in jugs (at least 1 L per person) and non-perishable food.",
            "Know where you can charge phones: power banks, car chargers.",
            "Write down emergency numbers and your utility's phone number.",
        ],
    },
    TipSection {
        title: "During the outage",
        tips: &[
            "Unplug sensitive appliances (fridge, air conditioner, computer).",
            "Use LED flashlights instead of candles to reduce fire risk.",
            "Avoid opening the fridge or freezer so they stay cold.",
            "If you use a generator, follow its manual and store fuel in a ventilated place.",
        ],
    },
    TipSection {
        title: "After power returns",
        tips: &[
            "Check appliances before switching them back on (fridge, medical equipment).",
            "Throw away perishable food left more than 2 hours without refrigeration.",
            "If appliances were damaged by the outage, get them seen by a technician.",
            "Record the damage and send detailed photos to the utility.",
        ],
    },
    TipSection {
        title: "Health and safety",
        tips: &[
            "Keep doors and windows closed to avoid accidents and theft.",
            "Move carefully in the dark and stay clear of loose wires and wet areas.",
            "Look after anyone who depends on medical devices (ventilator, CPAP); keep spare batteries.",
            "Keep medicines and a first aid kit within reach.",
        ],
    },
];

/// All tip sections, in reading order.
#[must_use]
pub fn sections() -> &'static [TipSection] {
    &SECTIONS
}
