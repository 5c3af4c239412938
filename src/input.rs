/// Turns a level sampled once per tick into a one-shot rising edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    previous: bool,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// True only on the tick where `level` goes from low to high.
    pub fn rising(&mut self, level: bool) -> bool {
        let edge = level && !self.previous;
        self.previous = level;
        edge
    }

    pub fn reset(&mut self) {
        self.previous = false;
    }
}

/// A boolean flipped on each rising edge of a button.
#[derive(Debug, Clone, Copy, Default)]
pub struct Toggle {
    edge: EdgeDetector,
    state: bool,
}

impl Toggle {
    pub fn new(initial: bool) -> Self {
        Toggle {
            edge: EdgeDetector::new(),
            state: initial,
        }
    }

    /// Returns `true` when this sample flipped the state.
    pub fn update(&mut self, pressed: bool) -> bool {
        let flipped = self.edge.rising(pressed);
        if flipped {
            self.state = !self.state;
        }
        flipped
    }

    pub fn get(&self) -> bool {
        self.state
    }

    pub fn set(&mut self, state: bool) {
        self.state = state;
    }
}

/// Zeroes joystick values whose magnitude does not exceed `threshold`.
pub fn deadband(value: f64, threshold: f64) -> f64 {
    if value.abs() > threshold {
        value
    } else {
        0.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_edge() {
        let mut edge = EdgeDetector::new();
        let levels = [false, true, true, false, true, false, false, true];
        let edges: Vec<bool> = levels.iter().map(|&level| edge.rising(level)).collect();

        assert_eq!(edges, [false, true, false, false, true, false, false, true]);
    }

    #[test]
    fn test_held_at_start_counts_once() {
        let mut edge = EdgeDetector::new();

        assert!(edge.rising(true));
        assert!(!edge.rising(true));

        edge.reset();
        assert!(edge.rising(true));
    }

    #[test]
    fn test_toggle() {
        let mut toggle = Toggle::new(true);

        assert!(toggle.update(true));
        assert!(!toggle.get());
        assert!(!toggle.update(true));
        assert!(!toggle.get());
        toggle.update(false);
        toggle.update(true);
        assert!(toggle.get());
    }

    #[test]
    fn test_deadband() {
        assert_eq!(deadband(0.1, 0.15), 0.);
        assert_eq!(deadband(-0.15, 0.15), 0.);
        assert_eq!(deadband(0.2, 0.15), 0.2);
        assert_eq!(deadband(-0.9, 0.1), -0.9);
    }
}
