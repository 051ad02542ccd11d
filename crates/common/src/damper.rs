//! Adaptive gain/clamp damper for the attitude-hold autopilot.
//!
//! Lightweight craft with excess steering authority oscillate around the
//! hold target. Once the attitude error and angular rate are both small,
//! this damper throttles the axis controllers: the output clamp tracks the
//! error angle and the gain rescale factor ramps down 0.01 per tick, then
//! ramps back up as soon as the craft is pushed off target again.

use crate::config::DamperConfig;
use crate::pid::{AttitudePids, Gains};
use crate::Vec3;

pub const PITCH_BASE_GAINS: Gains = Gains::new(18.3, 0.0, 0.5);
pub const ROLL_BASE_GAINS: Gains = Gains::new(6.0, 0.0, 0.025);
pub const YAW_BASE_GAINS: Gains = Gains::new(18.3, 0.0, 0.5);

/// Error angle below which damping may engage, degrees.
const DAMPING_ENGAGE_ERROR_DEG: f64 = 5.0;
/// Per-tick step of the gain rescale ramp.
const RESPONSE_STEP: f64 = 0.01;

/// Per-tick input read from the host: which vessel is being controlled, the
/// hold target expressed in its body frame, and its angular rate magnitude.
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    pub vessel: u32,
    pub target_dir: Vec3,
    pub angular_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Gains and clamp were written to the controllers.
    Applied { damped: bool },
    /// Same vessel already serviced since the last frame.
    AlreadyServiced,
    /// No vessel or no controllers available; retried next tick.
    Skipped,
}

/// Pitch/yaw error of the hold target direction, degrees. Pitch wraps only
/// on the positive side; atan2 output keeps the negative side in range.
pub fn attitude_errors(target_dir: Vec3) -> (f64, f64) {
    let v = target_dir;
    let mut dp = 90.0 - v.y.atan2(v.z).to_degrees();
    if dp > 180.0 {
        dp -= 360.0;
    }
    let dy = v.x.atan2(v.y).to_degrees();
    (dp, dy)
}

pub fn error_angle(target_dir: Vec3) -> f64 {
    let (dp, dy) = attitude_errors(target_dir);
    ((dp * dp) + (dy * dy)).sqrt()
}

/// Body-frame hold target for the given pitch/yaw error. Inverse of
/// [`attitude_errors`], used by the simulation harnesses and tests.
pub fn target_dir_from_errors(pitch_error_deg: f64, yaw_error_deg: f64) -> Vec3 {
    let a = (90.0 - pitch_error_deg).to_radians();
    let y = a.sin();
    let z = a.cos();
    let x = y * yaw_error_deg.to_radians().tan();
    Vec3::new(x, y, z)
}

#[derive(Debug)]
pub struct AdaptiveDamper {
    config: DamperConfig,
    response_limit: f64,
    clamp_factor: f64,
    tracked: Option<u32>,
}

impl AdaptiveDamper {
    pub fn new(config: DamperConfig) -> Self {
        Self {
            config: config.clamped(),
            response_limit: 1.0,
            clamp_factor: 1.0,
            tracked: None,
        }
    }

    pub fn config(&self) -> &DamperConfig {
        &self.config
    }

    pub fn response_limit(&self) -> f64 {
        self.response_limit
    }

    pub fn clamp_factor(&self) -> f64 {
        self.clamp_factor
    }

    /// Render-frame hook. Clears the serviced-vessel marker so the next
    /// physics tick recomputes; must run before that tick is delivered.
    pub fn begin_frame(&mut self) {
        self.tracked = None;
    }

    /// Physics-tick hook. A missing vessel or missing controller set skips
    /// the tick silently; a vessel switch is picked up immediately.
    pub fn on_tick(
        &mut self,
        input: Option<TickInput>,
        pids: Option<&mut AttitudePids>,
    ) -> TickOutcome {
        let (input, pids) = match (input, pids) {
            (Some(input), Some(pids)) => (input, pids),
            _ => return TickOutcome::Skipped,
        };

        if self.tracked == Some(input.vessel) {
            return TickOutcome::AlreadyServiced;
        }
        self.tracked = Some(input.vessel);

        let (dp, dy) = attitude_errors(input.target_dir);
        let da = ((dp * dp) + (dy * dy)).sqrt();

        self.clamp_factor = 1.0;
        if da < DAMPING_ENGAGE_ERROR_DEG && input.angular_rate < self.config.threshold {
            self.clamp_factor = da / DAMPING_ENGAGE_ERROR_DEG;
            if self.clamp_factor < self.config.min_clamp {
                self.clamp_factor = self.config.min_clamp;
            }
        }

        let damped = self.clamp_factor < 1.0;
        if damped {
            self.response_limit -= RESPONSE_STEP;
            if self.response_limit < self.config.min_response_limit {
                self.response_limit = self.config.min_response_limit;
            }
        } else {
            self.response_limit += RESPONSE_STEP;
            if self.response_limit > 1.0 {
                self.response_limit = 1.0;
            }
        }

        pids.pitch
            .reinitialize_gains(PITCH_BASE_GAINS.scaled(self.response_limit));
        pids.roll
            .reinitialize_gains(ROLL_BASE_GAINS.scaled(self.response_limit));
        pids.yaw
            .reinitialize_gains(YAW_BASE_GAINS.scaled(self.response_limit));
        pids.set_clamp(self.clamp_factor);

        TickOutcome::Applied { damped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_input(pitch_error_deg: f64, yaw_error_deg: f64, rate: f64) -> TickInput {
        TickInput {
            vessel: 1,
            target_dir: target_dir_from_errors(pitch_error_deg, yaw_error_deg),
            angular_rate: rate,
        }
    }

    /// One frame + one tick, the cadence the host delivers.
    fn step(damper: &mut AdaptiveDamper, pids: &mut AttitudePids, input: TickInput) -> TickOutcome {
        damper.begin_frame();
        damper.on_tick(Some(input), Some(pids))
    }

    #[test]
    fn error_extraction_round_trips() {
        for &(p, y) in &[(0.0, 0.0), (3.0, -2.0), (-45.0, 10.0), (80.0, 60.0)] {
            let (dp, dy) = attitude_errors(target_dir_from_errors(p, y));
            assert!((dp - p).abs() < 1e-9, "pitch {p} -> {dp}");
            assert!((dy - y).abs() < 1e-9, "yaw {y} -> {dy}");
        }
    }

    #[test]
    fn pitch_error_at_181_wraps_to_minus_179() {
        // atan2(y, z) = -91 deg puts the raw pitch error at exactly 181.
        let a = (-91.0_f64).to_radians();
        let v = Vec3::new(0.0, a.sin(), a.cos());
        let (dp, _) = attitude_errors(v);
        assert!((dp - (-179.0)).abs() < 1e-9);
    }

    #[test]
    fn negative_pitch_error_is_never_wrapped() {
        // The raw pitch error lives in [-90, 270): only the positive side can
        // overflow, so no symmetric correction exists for the negative side.
        let a = (179.0_f64).to_radians();
        let v = Vec3::new(0.0, a.sin(), a.cos());
        let (dp, _) = attitude_errors(v);
        assert!((dp - (-89.0)).abs() < 1e-9);
    }

    #[test]
    fn still_vessel_clamps_to_floor() {
        let mut damper = AdaptiveDamper::new(DamperConfig::default());
        let mut pids = AttitudePids::new();
        step(&mut damper, &mut pids, quiet_input(0.0, 0.0, 0.0));
        // da/5 is ~0, floored at min_clamp.
        assert_eq!(damper.clamp_factor(), 0.2);
        assert_eq!(pids.pitch.output_clamp(), 0.2);
    }

    #[test]
    fn large_error_keeps_full_authority() {
        let mut damper = AdaptiveDamper::new(DamperConfig::default());
        let mut pids = AttitudePids::new();
        let outcome = step(&mut damper, &mut pids, quiet_input(10.0, 0.0, 0.0));
        assert_eq!(outcome, TickOutcome::Applied { damped: false });
        assert_eq!(damper.clamp_factor(), 1.0);
    }

    #[test]
    fn fast_rotation_keeps_full_authority() {
        let mut damper = AdaptiveDamper::new(DamperConfig::default());
        let mut pids = AttitudePids::new();
        step(&mut damper, &mut pids, quiet_input(1.0, 0.0, 0.5));
        assert_eq!(damper.clamp_factor(), 1.0);
    }

    #[test]
    fn clamp_tracks_error_between_floor_and_one() {
        let mut damper = AdaptiveDamper::new(DamperConfig::default());
        let mut pids = AttitudePids::new();
        step(&mut damper, &mut pids, quiet_input(3.0, 0.0, 0.0));
        assert!((damper.clamp_factor() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn first_damped_tick_steps_to_099() {
        let mut damper = AdaptiveDamper::new(DamperConfig::default());
        let mut pids = AttitudePids::new();
        assert_eq!(damper.response_limit(), 1.0);
        let outcome = step(&mut damper, &mut pids, quiet_input(0.0, 0.0, 0.0));
        assert_eq!(outcome, TickOutcome::Applied { damped: true });
        assert!((damper.response_limit() - 0.99).abs() < 1e-12);
    }

    #[test]
    fn ramp_moves_at_most_one_step_per_tick() {
        let mut damper = AdaptiveDamper::new(DamperConfig::default());
        let mut pids = AttitudePids::new();
        let mut prev = damper.response_limit();
        for i in 0..500 {
            // Alternate bursts of damped and nominal conditions.
            let input = if (i / 37) % 2 == 0 {
                quiet_input(0.0, 0.0, 0.0)
            } else {
                quiet_input(20.0, 5.0, 1.0)
            };
            step(&mut damper, &mut pids, input);
            let rl = damper.response_limit();
            assert!((rl - prev).abs() <= RESPONSE_STEP + 1e-12);
            assert!((0.3..=1.0).contains(&rl));
            assert!((0.2..=1.0).contains(&damper.clamp_factor()));
            prev = rl;
        }
    }

    #[test]
    fn nominal_ticks_recover_strictly_to_one() {
        let mut damper = AdaptiveDamper::new(DamperConfig::default());
        let mut pids = AttitudePids::new();
        for _ in 0..100 {
            step(&mut damper, &mut pids, quiet_input(0.0, 0.0, 0.0));
        }
        assert_eq!(damper.response_limit(), 0.3);

        let mut prev = damper.response_limit();
        while damper.response_limit() < 1.0 {
            step(&mut damper, &mut pids, quiet_input(10.0, 0.0, 0.0));
            assert_eq!(damper.clamp_factor(), 1.0);
            assert!(damper.response_limit() > prev);
            prev = damper.response_limit();
        }
        assert_eq!(damper.response_limit(), 1.0);
    }

    #[test]
    fn floor_follows_configured_min_response_limit() {
        let config = DamperConfig {
            min_response_limit: 0.995,
            ..DamperConfig::default()
        };
        let mut damper = AdaptiveDamper::new(config);
        let mut pids = AttitudePids::new();
        step(&mut damper, &mut pids, quiet_input(0.0, 0.0, 0.0));
        // A full step would overshoot the floor; the floor wins.
        assert_eq!(damper.response_limit(), 0.995);
    }

    #[test]
    fn written_gains_are_exactly_base_times_response_limit() {
        let mut damper = AdaptiveDamper::new(DamperConfig::default());
        let mut pids = AttitudePids::new();
        for i in 0..200 {
            let input = if i % 3 == 0 {
                quiet_input(8.0, 0.0, 0.0)
            } else {
                quiet_input(0.5, 0.5, 0.0)
            };
            step(&mut damper, &mut pids, input);
            let rl = damper.response_limit();
            assert_eq!(pids.pitch.gains(), PITCH_BASE_GAINS.scaled(rl));
            assert_eq!(pids.roll.gains(), ROLL_BASE_GAINS.scaled(rl));
            assert_eq!(pids.yaw.gains(), YAW_BASE_GAINS.scaled(rl));
            assert_eq!(pids.pitch.output_clamp(), damper.clamp_factor());
        }
    }

    #[test]
    fn missing_target_or_pids_skips_silently() {
        let mut damper = AdaptiveDamper::new(DamperConfig::default());
        let mut pids = AttitudePids::new();
        step(&mut damper, &mut pids, quiet_input(0.0, 0.0, 0.0));
        let before = damper.response_limit();

        damper.begin_frame();
        assert_eq!(damper.on_tick(None, Some(&mut pids)), TickOutcome::Skipped);
        let input = quiet_input(0.0, 0.0, 0.0);
        assert_eq!(damper.on_tick(Some(input), None), TickOutcome::Skipped);
        assert_eq!(damper.response_limit(), before);
    }

    #[test]
    fn repeated_tick_without_frame_is_not_reapplied() {
        let mut damper = AdaptiveDamper::new(DamperConfig::default());
        let mut pids = AttitudePids::new();
        let input = quiet_input(0.0, 0.0, 0.0);

        damper.begin_frame();
        assert_eq!(
            damper.on_tick(Some(input), Some(&mut pids)),
            TickOutcome::Applied { damped: true }
        );
        let after_first = damper.response_limit();
        assert_eq!(
            damper.on_tick(Some(input), Some(&mut pids)),
            TickOutcome::AlreadyServiced
        );
        assert_eq!(damper.response_limit(), after_first);

        damper.begin_frame();
        assert_eq!(
            damper.on_tick(Some(input), Some(&mut pids)),
            TickOutcome::Applied { damped: true }
        );
    }

    #[test]
    fn vessel_switch_is_serviced_without_a_frame() {
        let mut damper = AdaptiveDamper::new(DamperConfig::default());
        let mut pids = AttitudePids::new();

        damper.begin_frame();
        let first = TickInput {
            vessel: 1,
            ..quiet_input(0.0, 0.0, 0.0)
        };
        let second = TickInput {
            vessel: 2,
            ..quiet_input(0.0, 0.0, 0.0)
        };
        damper.on_tick(Some(first), Some(&mut pids));
        assert_eq!(
            damper.on_tick(Some(second), Some(&mut pids)),
            TickOutcome::Applied { damped: true }
        );
    }
}
