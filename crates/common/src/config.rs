use serde::Deserialize;
use std::fs;

/// Operator-facing damper tuning. Each value has a declared range; values
/// read from a config file are clamped into range rather than rejected,
/// matching how a host UI slider would behave.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct DamperConfig {
    /// Lower bound for the gain rescale factor, range [0.05, 1.0].
    pub min_response_limit: f64,
    /// Lower bound for the output clamp, range [0.1, 0.3].
    pub min_clamp: f64,
    /// Angular rate below which damping may engage, rad/s, range [0.1, 0.9].
    pub threshold: f64,
    /// Companion-extension gate. When false the damper runs with these fixed
    /// defaults and the demo menu does not surface the tunables.
    pub plus_enabled: bool,
}

impl Default for DamperConfig {
    fn default() -> Self {
        Self {
            min_response_limit: 0.3,
            min_clamp: 0.2,
            threshold: 0.3,
            plus_enabled: false,
        }
    }
}

impl DamperConfig {
    pub fn clamped(self) -> Self {
        Self {
            min_response_limit: self.min_response_limit.clamp(0.05, 1.0),
            min_clamp: self.min_clamp.clamp(0.1, 0.3),
            threshold: self.threshold.clamp(0.1, 0.9),
            plus_enabled: self.plus_enabled,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExperimentConfig {
    pub experiment_name: String,
    pub duration_secs: u64,
    pub physics_period_ms: u64,
    pub frame_period_ms: u64,
    pub mode: String,
    #[serde(default)]
    pub enable_logging: bool,
    pub initial_pitch_error_deg: f64,
    pub initial_yaw_error_deg: f64,
    pub initial_roll_error_deg: f64,
    pub initial_pitch_rate_deg: f64,
    pub initial_yaw_rate_deg: f64,
    pub initial_roll_rate_deg: f64,
    /// Angular acceleration per unit of steering command, deg/s^2. High
    /// values reproduce the overpowered-craft wobble the damper targets.
    pub control_authority: f64,
    /// Error angle beyond which the run counts as diverged, degrees.
    pub divergence_limit_deg: f64,
    #[serde(default)]
    pub damper: DamperConfig,
}

pub fn load_config(path: &str) -> Result<ExperimentConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let mut config: ExperimentConfig = toml::from_str(&content)?;
    config.damper = config.damper.clamped();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASELINE: &str = r#"
        experiment_name = "wobble_baseline"
        duration_secs = 5
        physics_period_ms = 20
        frame_period_ms = 16
        mode = "threaded"
        initial_pitch_error_deg = 4.0
        initial_yaw_error_deg = -2.5
        initial_roll_error_deg = 0.0
        initial_pitch_rate_deg = 0.0
        initial_yaw_rate_deg = 0.0
        initial_roll_rate_deg = 0.0
        control_authority = 150.0
        divergence_limit_deg = 45.0

        [damper]
        min_response_limit = 0.3
        min_clamp = 0.2
        threshold = 0.3
        plus_enabled = true
    "#;

    #[test]
    fn parses_full_experiment_config() {
        let config: ExperimentConfig = toml::from_str(BASELINE).unwrap();
        assert_eq!(config.experiment_name, "wobble_baseline");
        assert_eq!(config.physics_period_ms, 20);
        assert!(!config.enable_logging);
        assert!(config.damper.plus_enabled);
        assert_eq!(config.damper.min_clamp, 0.2);
    }

    #[test]
    fn damper_section_is_optional() {
        let stripped: String = BASELINE
            .lines()
            .take_while(|line| !line.contains("[damper]"))
            .collect::<Vec<_>>()
            .join("\n");
        let config: ExperimentConfig = toml::from_str(&stripped).unwrap();
        assert_eq!(config.damper.min_response_limit, 0.3);
        assert!(!config.damper.plus_enabled);
    }

    #[test]
    fn out_of_range_tunables_are_clamped() {
        let config = DamperConfig {
            min_response_limit: 0.0,
            min_clamp: 0.9,
            threshold: 2.0,
            plus_enabled: true,
        }
        .clamped();
        assert_eq!(config.min_response_limit, 0.05);
        assert_eq!(config.min_clamp, 0.3);
        assert_eq!(config.threshold, 0.9);
        assert!(config.plus_enabled);
    }
}
