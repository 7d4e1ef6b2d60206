//! Emulated robot state.

use std::time::Instant;

/// Cartesian drift per second while free mode is on.
const FREE_MODE_RATE: f64 = 0.1;
/// Wrap limits for x, y, z (mm) and yaw, pitch, roll (degrees).
const AXIS_WRAP: [f64; 6] = [2000.0, 2000.0, 2000.0, 360.0, 360.0, 360.0];

#[derive(Debug, Clone)]
pub struct RobotState {
    pub power: bool,
    pub attached: bool,
    pub homed: bool,
    /// x, y, z, yaw, pitch, roll
    pub position: [f64; 6],
    pub joint_positions: [f64; 6],
    /// Set while free mode is on.
    pub free_since: Option<Instant>,
    pub system_speed: i32,
    pub rail_position: Option<f64>,
    pub motion_state: &'static str,
    pub selected_robot: Option<usize>,
}

impl Default for RobotState {
    fn default() -> Self {
        Self {
            power: true,
            attached: false,
            homed: false,
            position: [300.0, 0.0, 150.0, 0.0, 90.0, -180.0],
            joint_positions: [0.0; 6],
            free_since: None,
            system_speed: 50,
            rail_position: Some(0.0),
            motion_state: "Idle",
            selected_robot: None,
        }
    }
}

impl RobotState {
    pub fn free_mode(&self) -> bool {
        self.free_since.is_some()
    }

    /// Cartesian position as of `now`, including free-mode drift.
    pub fn position_at(&self, now: Instant) -> [f64; 6] {
        let Some(since) = self.free_since else {
            return self.position;
        };

        let drift = now.saturating_duration_since(since).as_secs_f64() * FREE_MODE_RATE;
        let mut pos = self.position;
        for (axis, value) in pos.iter_mut().enumerate() {
            *value = (*value + drift) % AXIS_WRAP[axis];
        }
        pos
    }

    /// Turn free mode on or off. Turning it off keeps the drifted position.
    pub fn set_free_mode(&mut self, enabled: bool, now: Instant) {
        match (enabled, self.free_since) {
            (true, None) => self.free_since = Some(now),
            (false, Some(_)) => {
                self.position = self.position_at(now);
                self.free_since = None;
            }
            _ => {}
        }
    }
}
