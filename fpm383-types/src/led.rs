//! LED control

use bitflags::bitflags;

bitflags! {
    /// LED colour mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LedColor: u8 {
        const GREEN = 0x01;
        const RED = 0x02;
        const BLUE = 0x04;
    }
}

/// LED control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LedMode {
    Off = 0x00,
    On = 0x01,
    /// Module drives the LED from its own state
    Auto = 0x02,
    Pwm = 0x03,
    Blink = 0x04,
}

/// Complete LED command: mode, colours and three mode parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedSettings {
    pub mode: LedMode,
    pub color: LedColor,
    pub params: [u8; 3],
}

impl LedSettings {
    pub fn new(mode: LedMode, color: LedColor) -> Self {
        Self {
            mode,
            color,
            params: [0; 3],
        }
    }

    pub fn off() -> Self {
        Self::new(LedMode::Off, LedColor::empty())
    }

    pub fn on(color: LedColor) -> Self {
        Self::new(LedMode::On, color)
    }

    /// Set the mode-specific parameters (e.g. PWM duty values or blink timing)
    pub fn with_params(mut self, p1: u8, p2: u8, p3: u8) -> Self {
        self.params = [p1, p2, p3];
        self
    }

    /// Request data: `[mode, colour, p1, p2, p3]`
    pub fn to_bytes(self) -> [u8; 5] {
        [
            self.mode as u8,
            self.color.bits(),
            self.params[0],
            self.params[1],
            self.params[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_color_mask() {
        assert_eq!((LedColor::RED | LedColor::GREEN).bits(), 0x03);
        assert_eq!(LedColor::all().bits(), 0x07);
        assert_eq!(LedColor::empty().bits(), 0x00);
    }

    #[test]
    fn test_led_settings_bytes() {
        assert_eq!(LedSettings::off().to_bytes(), [0, 0, 0, 0, 0]);
        assert_eq!(LedSettings::on(LedColor::BLUE).to_bytes(), [1, 4, 0, 0, 0]);
        assert_eq!(
            LedSettings::new(LedMode::Blink, LedColor::RED | LedColor::BLUE)
                .with_params(10, 20, 3)
                .to_bytes(),
            [4, 6, 10, 20, 3]
        );
    }
}
