//! White flash over the camera background.

/// Flash units lost per second.
pub const FLASH_DECAY_RATE: f32 = 3.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Flash {
    value: f32,
}

impl Flash {
    /// Raise the flash to at least `amount`.
    pub fn trigger(&mut self, amount: f32) {
        self.value = self.value.max(amount.clamp(0.0, 1.0));
    }

    pub fn update(&mut self, dt: f32) {
        self.value = (self.value - FLASH_DECAY_RATE * dt).max(0.0);
    }

    /// Current mix toward white, in [0, 1].
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn clear(&mut self) {
        self.value = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_decay() {
        let mut flash = Flash::default();
        flash.trigger(0.6);
        flash.update(0.1);
        assert!((flash.value() - 0.3).abs() < 1e-6);
        flash.update(0.2);
        assert_eq!(flash.value(), 0.0);
    }

    #[test]
    fn test_trigger_clamps_and_keeps_max() {
        let mut flash = Flash::default();
        flash.trigger(4.0);
        assert_eq!(flash.value(), 1.0);
        flash.trigger(0.25);
        assert_eq!(flash.value(), 1.0);
    }
}
