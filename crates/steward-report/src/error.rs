use steward_core::StewardError;
use thiserror::Error;
use uuid::Uuid;

/// Errors from the report pipeline.
///
/// Per-source fetch failures are not carried here — they degrade into
/// `SourceData::Failed` inside the report so the other sources survive.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Template not found: {0}")]
    TemplateNotFound(Uuid),
    #[error("Template configuration invalid: {0}")]
    Config(String),
    #[error("Template declares {declared} data sources, limit is {limit}")]
    TooManySources { declared: usize, limit: usize },
    #[error("Storage error: {0}")]
    Storage(#[from] StewardError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_not_found_display() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let err = ReportError::TemplateNotFound(id);
        assert_eq!(
            err.to_string(),
            "Template not found: 550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_config_display() {
        let err = ReportError::Config("grouping field empty".to_string());
        assert_eq!(
            err.to_string(),
            "Template configuration invalid: grouping field empty"
        );
    }

    #[test]
    fn test_too_many_sources_display() {
        let err = ReportError::TooManySources {
            declared: 12,
            limit: 10,
        };
        assert_eq!(
            err.to_string(),
            "Template declares 12 data sources, limit is 10"
        );
    }

    #[test]
    fn test_from_steward_error() {
        let err: ReportError = StewardError::Storage("catalog offline".to_string()).into();
        assert!(matches!(err, ReportError::Storage(_)));
        assert!(err.to_string().contains("catalog offline"));
    }
}
