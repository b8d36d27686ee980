//! Gray-Scott reaction parameters and partial overrides.

/// Reaction-diffusion parameters consumed by every step
///
/// No bounds are enforced. Values far outside the usual Gray-Scott ranges make
/// the field diverge, which is a valid (if degenerate) outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    /// Diffusion rate of chemical A (resource)
    pub da: f32,

    /// Diffusion rate of chemical B (activator)
    pub db: f32,

    /// Feed rate: how fast A is replenished
    pub feed: f32,

    /// Kill rate: how fast B is removed
    pub kill: f32,

    /// Integration time step (simulation units per frame)
    pub dt: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            da: 0.4,
            db: 0.15,
            feed: 0.029,
            kill: 0.057,
            dt: 1.5,
        }
    }
}

impl SimulationParams {
    /// Apply only the fields present in `overrides`
    pub fn apply(&mut self, overrides: &ParameterOverrides) {
        if let Some(da) = overrides.da {
            self.da = da;
        }
        if let Some(db) = overrides.db {
            self.db = db;
        }
        if let Some(feed) = overrides.feed {
            self.feed = feed;
        }
        if let Some(kill) = overrides.kill {
            self.kill = kill;
        }
        if let Some(dt) = overrides.dt {
            self.dt = dt;
        }
    }
}

/// Partial parameter update from the input collaborator (keyboard or CLI)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterOverrides {
    pub da: Option<f32>,
    pub db: Option<f32>,
    pub feed: Option<f32>,
    pub kill: Option<f32>,
    pub dt: Option<f32>,
}

impl ParameterOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_only_touch_present_fields() {
        let mut params = SimulationParams::default();
        params.apply(&ParameterOverrides {
            feed: Some(0.055),
            dt: Some(1.0),
            ..Default::default()
        });

        assert_eq!(params.feed, 0.055);
        assert_eq!(params.dt, 1.0);
        assert_eq!(params.da, 0.4);
        assert_eq!(params.db, 0.15);
        assert_eq!(params.kill, 0.057);
    }

    #[test]
    fn test_empty_overrides_are_noop() {
        let overrides = ParameterOverrides::default();
        assert!(overrides.is_empty());

        let mut params = SimulationParams::default();
        params.apply(&overrides);
        assert_eq!(params, SimulationParams::default());
    }
}
