//! Validation utilities for request parameters

/// Longest database name MySQL accepts
const MAX_DBASE_LEN: usize = 64;

/// Validate a tenant database selector.
///
/// The selector becomes a database name, so only ASCII letters, digits and
/// underscores are accepted.
pub fn validate_dbase(dbase: &str) -> Result<(), &'static str> {
    if dbase.trim().is_empty() {
        return Err("Tenant database is not set");
    }
    if dbase.len() > MAX_DBASE_LEN {
        return Err("Tenant database name is too long");
    }
    if !dbase
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err("Tenant database name contains invalid characters");
    }
    Ok(())
}

/// Split a comma-separated code list, dropping blanks and duplicates
pub fn parse_code_list(raw: &str) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for code in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if !codes.iter().any(|c| c == code) {
            codes.push(code.to_string());
        }
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_dbase_valid() {
        assert!(validate_dbase("srinivasa_foods").is_ok());
        assert!(validate_dbase("erp2024").is_ok());
    }

    #[test]
    fn test_validate_dbase_empty() {
        assert!(validate_dbase("").is_err());
        assert!(validate_dbase("   ").is_err());
    }

    #[test]
    fn test_validate_dbase_rejects_injection() {
        assert!(validate_dbase("erp; DROP DATABASE erp").is_err());
        assert!(validate_dbase("erp`").is_err());
        assert!(validate_dbase(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_parse_code_list() {
        assert_eq!(parse_code_list(" A, B,,A ,C "), vec!["A", "B", "C"]);
        assert!(parse_code_list("").is_empty());
    }
}
