use serde::{Deserialize, Serialize};

use crate::damper;

const INTEGRAL_LIMIT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Gains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            kp: self.kp * factor,
            ki: self.ki * factor,
            kd: self.kd * factor,
        }
    }
}

/// Single-axis attitude PID with a symmetric output clamp. Output is a
/// normalized steering command in [-clamp, clamp].
#[derive(Debug)]
pub struct AxisPid {
    gains: Gains,
    output_clamp: f64,
    integral: f64,
    prev_error: f64,
}

impl AxisPid {
    pub fn new(gains: Gains) -> Self {
        Self {
            gains,
            output_clamp: 1.0,
            integral: 0.0,
            prev_error: 0.0,
        }
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    pub fn output_clamp(&self) -> f64 {
        self.output_clamp
    }

    /// Replaces the gains without touching integrator state.
    pub fn reinitialize_gains(&mut self, gains: Gains) {
        self.gains = gains;
    }

    pub fn set_clamp(&mut self, clamp: f64) {
        self.output_clamp = clamp;
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }

    pub fn compute(&mut self, error: f64, dt: f64) -> f64 {
        self.integral += error * dt;
        self.integral = self.integral.clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);

        let derivative = if dt > 0.0 {
            (error - self.prev_error) / dt
        } else {
            0.0
        };
        self.prev_error = error;

        let output =
            (self.gains.kp * error) + (self.gains.ki * self.integral) + (self.gains.kd * derivative);
        output.clamp(-self.output_clamp, self.output_clamp)
    }
}

/// The three axis controllers of the attitude hold, as the damper sees them.
#[derive(Debug)]
pub struct AttitudePids {
    pub pitch: AxisPid,
    pub roll: AxisPid,
    pub yaw: AxisPid,
}

impl AttitudePids {
    pub fn new() -> Self {
        Self {
            pitch: AxisPid::new(damper::PITCH_BASE_GAINS),
            roll: AxisPid::new(damper::ROLL_BASE_GAINS),
            yaw: AxisPid::new(damper::YAW_BASE_GAINS),
        }
    }

    pub fn set_clamp(&mut self, clamp: f64) {
        self.pitch.set_clamp(clamp);
        self.roll.set_clamp(clamp);
        self.yaw.set_clamp(clamp);
    }

    pub fn reset(&mut self) {
        self.pitch.reset();
        self.roll.reset();
        self.yaw.reset();
    }
}

impl Default for AttitudePids {
    fn default() -> Self {
        Self::new()
    }
}
