//! Keyboard mapping for the windowed app.

use winit::keyboard::KeyCode;

use crate::params::{ParameterOverrides, SimulationParams};

/// Step applied to a diffusion rate per key press
pub const DIFFUSION_STEP: f32 = 0.01;

/// Step applied to feed or kill per key press
pub const RATE_STEP: f32 = 0.001;

/// Step applied to the time step per key press
pub const DT_STEP: f32 = 0.1;

/// Action requested by a key press
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    /// Change parameters, then re-seed
    Adjust(ParameterOverrides),
    Reset,
    PrintParams,
    Quit,
}

/// Map a pressed key to a control given the current parameters
///
/// Q/A Da, W/S Db, E/D feed, R/F kill, T/G Δt (up/down), Space reset,
/// P print, Escape quit.
pub fn control_for(key: KeyCode, params: &SimulationParams) -> Option<Control> {
    let none = ParameterOverrides::default();
    let adjust = |overrides| Some(Control::Adjust(overrides));

    match key {
        KeyCode::KeyQ => adjust(ParameterOverrides {
            da: Some(params.da + DIFFUSION_STEP),
            ..none
        }),
        KeyCode::KeyA => adjust(ParameterOverrides {
            da: Some(params.da - DIFFUSION_STEP),
            ..none
        }),
        KeyCode::KeyW => adjust(ParameterOverrides {
            db: Some(params.db + DIFFUSION_STEP),
            ..none
        }),
        KeyCode::KeyS => adjust(ParameterOverrides {
            db: Some(params.db - DIFFUSION_STEP),
            ..none
        }),
        KeyCode::KeyE => adjust(ParameterOverrides {
            feed: Some(params.feed + RATE_STEP),
            ..none
        }),
        KeyCode::KeyD => adjust(ParameterOverrides {
            feed: Some(params.feed - RATE_STEP),
            ..none
        }),
        KeyCode::KeyR => adjust(ParameterOverrides {
            kill: Some(params.kill + RATE_STEP),
            ..none
        }),
        KeyCode::KeyF => adjust(ParameterOverrides {
            kill: Some(params.kill - RATE_STEP),
            ..none
        }),
        KeyCode::KeyT => adjust(ParameterOverrides {
            dt: Some(params.dt + DT_STEP),
            ..none
        }),
        KeyCode::KeyG => adjust(ParameterOverrides {
            dt: Some(params.dt - DT_STEP),
            ..none
        }),
        KeyCode::Space => Some(Control::Reset),
        KeyCode::KeyP => Some(Control::PrintParams),
        KeyCode::Escape => Some(Control::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_keys_nudge_only_feed() {
        let params = SimulationParams::default();
        let Some(Control::Adjust(up)) = control_for(KeyCode::KeyE, &params) else {
            panic!("E should adjust feed");
        };
        assert_eq!(up.feed, Some(0.029 + RATE_STEP));
        assert_eq!((up.da, up.db, up.kill, up.dt), (None, None, None, None));

        let Some(Control::Adjust(down)) = control_for(KeyCode::KeyD, &params) else {
            panic!("D should adjust feed");
        };
        assert_eq!(down.feed, Some(0.029 - RATE_STEP));
    }

    #[test]
    fn test_other_controls() {
        let params = SimulationParams::default();
        assert_eq!(control_for(KeyCode::Space, &params), Some(Control::Reset));
        assert_eq!(control_for(KeyCode::KeyP, &params), Some(Control::PrintParams));
        assert_eq!(control_for(KeyCode::Escape, &params), Some(Control::Quit));
        assert_eq!(control_for(KeyCode::KeyZ, &params), None);
    }
}
