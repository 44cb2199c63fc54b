//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_audio(config)?;
    validate_decoder(config)?;
    validate_selection(config)?;
    validate_inference(config)?;
    Ok(())
}

/// Validate audio conditioning settings.
fn validate_audio(config: &Config) -> Result<()> {
    let audio = &config.audio;

    if audio.sample_rate == 0 {
        return Err(Error::ConfigValidation {
            message: "sample_rate must be at least 1".to_string(),
        });
    }

    if audio.clip_secs <= 0.0 {
        return Err(Error::ConfigValidation {
            message: format!("clip_secs must be positive, got {}", audio.clip_secs),
        });
    }

    if !(0.0..=1.0).contains(&audio.peak_level) || audio.peak_level == 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "peak_level must be within (0.0, 1.0], got {}",
                audio.peak_level
            ),
        });
    }

    if !(0.0..1.0).contains(&audio.pre_emphasis_coef) {
        return Err(Error::ConfigValidation {
            message: format!(
                "pre_emphasis_coef must be within [0.0, 1.0), got {}",
                audio.pre_emphasis_coef
            ),
        });
    }

    if audio.trim_threshold_db <= 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "trim_threshold_db must be positive, got {}",
                audio.trim_threshold_db
            ),
        });
    }

    Ok(())
}

/// Validate decoder chain settings.
fn validate_decoder(config: &Config) -> Result<()> {
    let decoder = &config.decoder;

    if decoder.fallback && decoder.fallback_command.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: "fallback_command must not be empty when fallback is enabled".to_string(),
        });
    }

    if decoder.fallback_timeout_secs == 0 {
        return Err(Error::ConfigValidation {
            message: "fallback_timeout_secs must be at least 1".to_string(),
        });
    }

    Ok(())
}

/// Validate window selection settings.
fn validate_selection(config: &Config) -> Result<()> {
    let selection = &config.selection;

    if selection.hop_secs <= 0.0 {
        return Err(Error::ConfigValidation {
            message: format!("hop_secs must be positive, got {}", selection.hop_secs),
        });
    }

    if selection.hop_secs > config.audio.clip_secs {
        return Err(Error::ConfigValidation {
            message: format!(
                "hop_secs ({}) must not exceed clip_secs ({})",
                selection.hop_secs, config.audio.clip_secs
            ),
        });
    }

    for (prefix, secs) in &selection.lead_in_skip {
        if *secs < 0.0 {
            return Err(Error::ConfigValidation {
                message: format!("lead_in_skip for '{prefix}' must be non-negative, got {secs}"),
            });
        }
    }

    Ok(())
}

/// Validate inference settings.
fn validate_inference(config: &Config) -> Result<()> {
    if config.inference.top_k == 0 {
        return Err(Error::ConfigValidation {
            message: "top_k must be at least 1".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_sample_rate() {
        let mut config = Config::default();
        config.audio.sample_rate = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_peak_level_out_of_range() {
        let mut config = Config::default();
        config.audio.peak_level = 1.5;
        assert!(validate_config(&config).is_err());

        config.audio.peak_level = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_pre_emphasis_coef_bounds() {
        let mut config = Config::default();
        config.audio.pre_emphasis_coef = 1.0;
        assert!(validate_config(&config).is_err());

        config.audio.pre_emphasis_coef = 0.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_fallback_command() {
        let mut config = Config::default();
        config.decoder.fallback_command = "  ".to_string();
        assert!(validate_config(&config).is_err());

        // An empty command is fine when the fallback is disabled.
        config.decoder.fallback = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_hop_exceeding_clip() {
        let mut config = Config::default();
        config.selection.hop_secs = 11.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_negative_lead_in() {
        let mut config = Config::default();
        config
            .selection
            .lead_in_skip
            .insert("museum_".to_string(), -2.0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = Config::default();
        config.inference.top_k = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            Error::ConfigValidation { .. }
        ));
    }
}
