use serde::Serialize;

/// Pattern shown by the indicator board, sent as three digital outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StatusLights {
    #[default]
    Off,
    Autonomous,
    LinedUp,
    TeleopNormal,
}

impl StatusLights {
    /// Levels of the three output pins, most significant first.
    pub fn pins(self) -> [bool; 3] {
        match self {
            StatusLights::Off => [false, false, false],
            StatusLights::Autonomous => [false, false, true],
            StatusLights::LinedUp => [false, true, false],
            StatusLights::TeleopNormal => [false, true, true],
        }
    }
}
