use std::io;

/// Whether `path` names an existing regular file.
pub async fn file_exists(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file(),
        Err(_) => false,
    }
}

/// Reads a local file to a string.
pub async fn file_get(path: &str) -> io::Result<String> {
    tokio::fs::read_to_string(path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_roundtrip() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "DOMAIN,example.com,DIRECT").unwrap();
        let path = tmp.path().to_str().unwrap().to_string();

        assert!(file_exists(&path).await);
        assert_eq!(file_get(&path).await.unwrap(), "DOMAIN,example.com,DIRECT");
    }

    #[tokio::test]
    async fn test_missing_file() {
        assert!(!file_exists("/nonexistent/definitely-not-here").await);
    }
}
