use http::header::HeaderValue;

pub const RANGE_CONFLICT_MESSAGE: &str = "Range header and query parameter are inconsistent";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RangeError {
    #[error("Range header and query parameter are inconsistent")]
    Inconsistent,
    #[error("range query parameter is not a valid header value: {0:?}")]
    InvalidParameter(String),
}

/// Reconciles the `Range` header with the `range` query parameter.
///
/// Returns the value that must be forwarded as `Range` when the query parameter
/// is set, or `None` when the inbound header (if any) passes through unchanged.
/// Both present and different is a conflict. Empty values count as absent, and
/// values are compared as exact strings.
pub fn validate_range(
    header: Option<&HeaderValue>,
    param: Option<&str>,
) -> Result<Option<HeaderValue>, RangeError> {
    let header = header.filter(|h| !h.is_empty());
    let Some(param) = param.filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    if let Some(header) = header
        && header.as_bytes() != param.as_bytes()
    {
        return Err(RangeError::Inconsistent);
    }

    HeaderValue::from_str(param)
        .map(Some)
        .map_err(|_| RangeError::InvalidParameter(param.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(s: &'static str) -> HeaderValue {
        HeaderValue::from_static(s)
    }

    #[test]
    fn test_conflict() {
        let result = validate_range(Some(&value("bytes:0-666")), Some("bytes:0-999"));
        assert_eq!(result, Err(RangeError::Inconsistent));
        assert_eq!(
            RangeError::Inconsistent.to_string(),
            RANGE_CONFLICT_MESSAGE
        );
    }

    #[test]
    fn test_exact_comparison() {
        let result = validate_range(Some(&value("bytes:0-666")), Some("bytes:0-666 "));
        assert_eq!(result, Err(RangeError::Inconsistent));

        let result = validate_range(Some(&value("BYTES:0-666")), Some("bytes:0-666"));
        assert_eq!(result, Err(RangeError::Inconsistent));
    }

    #[test]
    fn test_equal_values_forward_param() {
        let result = validate_range(Some(&value("bytes:0-666")), Some("bytes:0-666"));
        assert_eq!(result, Ok(Some(value("bytes:0-666"))));
    }

    #[test]
    fn test_only_param() {
        let result = validate_range(None, Some("bytes:0-999"));
        assert_eq!(result, Ok(Some(value("bytes:0-999"))));
    }

    #[test]
    fn test_only_header_passes_through() {
        assert_eq!(validate_range(Some(&value("bytes:0-666")), None), Ok(None));
        assert_eq!(validate_range(None, None), Ok(None));
    }

    #[test]
    fn test_empty_values_are_absent() {
        assert_eq!(validate_range(Some(&value("bytes:0-666")), Some("")), Ok(None));
        assert_eq!(
            validate_range(Some(&value("")), Some("bytes:0-999")),
            Ok(Some(value("bytes:0-999")))
        );
    }

    #[test]
    fn test_invalid_param() {
        let result = validate_range(None, Some("bytes=0-1\r\nX-Evil: 1"));
        assert!(matches!(result, Err(RangeError::InvalidParameter(_))));
    }
}
