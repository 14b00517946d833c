use std::path::PathBuf;

use phosphor_core::{AppConfig, IntensityProfile};

/// Flags of `phosphor run`. Each one overrides the matching config value.
#[derive(Debug, Default)]
pub struct RunCommandConfig {
    pub config_path: Option<PathBuf>,
    pub script_path: Option<PathBuf>,
    pub intensity: Option<IntensityProfile>,
    pub mute: bool,
    pub seed: Option<u64>,
}

pub fn run(cfg: RunCommandConfig) {
    let config = resolve_config(&cfg).unwrap_or_else(|e| super::fail(e));
    let script = config.script_lines().unwrap_or_else(|e| super::fail(e));

    let mut app = crate::tui::app::App::new(config, script, cfg.seed);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}

fn resolve_config(cfg: &RunCommandConfig) -> phosphor_core::Result<AppConfig> {
    let mut config = super::load_config(cfg.config_path.as_deref())?;
    if let Some(script) = &cfg.script_path {
        config.script = Some(script.clone());
    }
    if let Some(intensity) = cfg.intensity {
        config.intensity = intensity;
    }
    if cfg.mute {
        config.muted = true;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_keeps_defaults() {
        let config = resolve_config(&RunCommandConfig::default()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn flags_override_config() {
        let config = resolve_config(&RunCommandConfig {
            script_path: Some(PathBuf::from("boot.json")),
            intensity: Some(IntensityProfile::Extreme),
            mute: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.intensity, IntensityProfile::Extreme);
        assert!(config.muted);
        assert_eq!(config.script, Some(PathBuf::from("boot.json")));
    }
}
