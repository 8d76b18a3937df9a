//! Configuration validation utilities.

use std::collections::HashSet;

use weft_framework::{AdviceKind, AnnotationNames};

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, WeftConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &WeftConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_annotation_names(&config.weaving.annotations)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for module in logging.filters.keys() {
        if module.is_empty() || module.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter module: '{module}'"
            )));
        }
    }

    Ok(())
}

/// Every name must be set, and the five advice annotations must differ so
/// that an annotation maps to exactly one advice kind.
fn validate_annotation_names(names: &AnnotationNames) -> ConfigResult<()> {
    let fields = [
        ("aspect", &names.aspect),
        ("pointcut", &names.pointcut),
        ("before", &names.before),
        ("after", &names.after),
        ("after_returning", &names.after_returning),
        ("after_throwing", &names.after_throwing),
        ("around", &names.around),
        ("order", &names.order),
        ("join_point", &names.join_point),
        ("proceeding_join_point", &names.proceeding_join_point),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(ConfigError::missing_field(format!(
                "weaving.annotations.{field}"
            )));
        }
    }

    let mut seen = HashSet::new();
    for kind in AdviceKind::ALL {
        let name = kind.annotation(names);
        if !seen.insert(name) {
            return Err(ConfigError::validation(format!(
                "Annotation '{name}' is used for more than one advice kind"
            )));
        }
    }

    if names.join_point == names.proceeding_join_point {
        return Err(ConfigError::validation(
            "Join point and proceeding join point types must differ",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&WeftConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_annotation_name() {
        let mut config = WeftConfig::default();
        config.weaving.annotations.pointcut = " ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField { field } if field == "weaving.annotations.pointcut"
        ));
    }

    #[test]
    fn test_duplicate_advice_names() {
        let mut config = WeftConfig::default();
        config.weaving.annotations.around = "Before".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = WeftConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some(PathBuf::from("logs/weft.log"));
        assert!(validate_config(&config).is_ok());
    }
}
