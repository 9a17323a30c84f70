use base64::{
    engine::{general_purpose, DecodePaddingMode},
    Engine as _,
};

/// Encodes a string to standard Base64.
pub fn base64_encode(input: &str) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Decodes Base64 with an indifferent padding mode so that links with
/// stripped `=` padding still decode.
fn base64_decode(input: &str) -> Option<String> {
    let config = general_purpose::GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent);
    let engine = general_purpose::GeneralPurpose::new(&base64::alphabet::STANDARD, config);
    match engine.decode(input.trim()) {
        Ok(decoded) => Some(String::from_utf8_lossy(&decoded).to_string()),
        Err(_) => None,
    }
}

/// Rewrites the URL-safe alphabet back to the standard one.
pub fn url_safe_base64_reverse(input: &str) -> String {
    input.replace('-', "+").replace('_', "/")
}

/// Rewrites the standard alphabet to the URL-safe one and drops padding.
pub fn url_safe_base64_apply(input: &str) -> String {
    input.replace('+', "-").replace('/', "_").replace('=', "")
}

/// Decodes a Base64 string accepting both alphabets. Returns the input
/// unchanged when it is not valid Base64, which lets plain-text
/// subscription bodies fall through the line-list parser untouched.
pub fn url_safe_base64_decode(input: &str) -> String {
    match base64_decode(&url_safe_base64_reverse(input)) {
        Some(decoded) => decoded,
        None => input.to_string(),
    }
}

/// Encodes a string to URL-safe Base64 without padding.
pub fn url_safe_base64_encode(input: &str) -> String {
    url_safe_base64_apply(&base64_encode(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_without_padding() {
        // "aes-128-gcm:pass" encoded and stripped of padding
        assert_eq!(
            url_safe_base64_decode("YWVzLTEyOC1nY206cGFzcw"),
            "aes-128-gcm:pass"
        );
        assert_eq!(
            url_safe_base64_decode("YWVzLTEyOC1nY206cGFzcw=="),
            "aes-128-gcm:pass"
        );
    }

    #[test]
    fn test_decode_url_safe_alphabet() {
        let encoded = url_safe_base64_encode("subj?ects/overflow+");
        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(url_safe_base64_decode(&encoded), "subj?ects/overflow+");
    }

    #[test]
    fn test_decode_invalid_returns_input() {
        assert_eq!(url_safe_base64_decode("not base64 at all!"), "not base64 at all!");
    }
}
