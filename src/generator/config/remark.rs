/// Sanitizes a remark for INI-shaped outputs and makes it unique within
/// the emitted document. `=` would break the `name = spec` lines, and a
/// comma-bearing name needs quoting when the dialect splits on commas.
pub fn process_remark(remark: &mut String, existing: &[String], quote_commas: bool) {
    *remark = remark.replace('=', "-");

    if quote_commas && remark.contains(',') {
        *remark = format!("\"{}\"", remark);
    }

    let mut candidate = remark.clone();
    let mut suffix = 2;
    while existing.contains(&candidate) {
        candidate = format!("{} {}", remark, suffix);
        suffix += 1;
    }
    *remark = candidate;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_replaced() {
        let mut remark = "rate=1.0".to_string();
        process_remark(&mut remark, &[], false);
        assert_eq!(remark, "rate-1.0");
    }

    #[test]
    fn test_duplicates_suffixed() {
        let existing = vec!["HK".to_string(), "HK 2".to_string()];
        let mut remark = "HK".to_string();
        process_remark(&mut remark, &existing, false);
        assert_eq!(remark, "HK 3");
    }

    #[test]
    fn test_comma_quoted() {
        let mut remark = "a,b".to_string();
        process_remark(&mut remark, &[], true);
        assert_eq!(remark, "\"a,b\"");
    }
}
