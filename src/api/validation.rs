use super::ApiError;
use crate::models::business::{MAX_PAGE_SIZE, SortOrder};

pub fn validate_required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed)
}

pub fn validate_sort_order(sort_by: Option<&str>) -> Result<SortOrder, ApiError> {
    match sort_by.map(str::trim) {
        None | Some("") => Ok(SortOrder::default()),
        Some(value) => value
            .parse()
            .map_err(|e: crate::models::business::ParseSortOrderError| {
                ApiError::validation(e.to_string())
            }),
    }
}

pub fn validate_page_size(limit: u32) -> Result<u32, ApiError> {
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {limit}. Limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(limit)
}

/// Zero is rejected; anything above the upstream cap is clamped later.
pub fn validate_max_results(max_results: u32) -> Result<u32, ApiError> {
    if max_results == 0 {
        return Err(ApiError::validation("max_results must be at least 1"));
    }
    Ok(max_results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert_eq!(validate_required("term", Some("  pizza ")).unwrap(), "pizza");
        assert!(validate_required("term", Some("   ")).is_err());
        assert!(validate_required("term", None).is_err());
    }

    #[test]
    fn test_validate_sort_order() {
        assert_eq!(validate_sort_order(None).unwrap(), SortOrder::BestMatch);
        assert_eq!(validate_sort_order(Some("")).unwrap(), SortOrder::BestMatch);
        assert_eq!(
            validate_sort_order(Some("review_count")).unwrap(),
            SortOrder::ReviewCount
        );
        assert!(validate_sort_order(Some("newest")).is_err());
    }

    #[test]
    fn test_validate_page_size() {
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(50).is_ok());
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(51).is_err());
    }

    #[test]
    fn test_validate_max_results() {
        assert!(validate_max_results(0).is_err());
        assert_eq!(validate_max_results(5000).unwrap(), 5000);
    }
}
