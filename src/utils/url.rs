/// Percent-decodes a string, returning the input unchanged when it is not
/// valid percent-encoding.
pub fn url_decode(input: &str) -> String {
    match urlencoding::decode(input) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => input.to_string(),
    }
}

/// Percent-encodes a string.
pub fn url_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Extracts the value of `name` from a raw query string (or a URL carrying
/// one). Returns an empty string when the argument is absent.
pub fn get_url_arg(input: &str, name: &str) -> String {
    let query = match input.find('?') {
        Some(pos) => &input[pos + 1..],
        None => input,
    };
    for pair in query.split('&') {
        if let Some(eq) = pair.find('=') {
            if &pair[..eq] == name {
                return pair[eq + 1..].to_string();
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_url_arg() {
        let link = "https://t.me/socks?server=1.2.3.4&port=443&user=u&pass=p";
        assert_eq!(get_url_arg(link, "server"), "1.2.3.4");
        assert_eq!(get_url_arg(link, "port"), "443");
        assert_eq!(get_url_arg(link, "missing"), "");
    }

    #[test]
    fn test_get_url_arg_raw_query() {
        assert_eq!(get_url_arg("remark=a&aid=2", "aid"), "2");
    }

    #[test]
    fn test_url_decode_passthrough() {
        assert_eq!(url_decode("Hong%20Kong"), "Hong Kong");
        assert_eq!(url_decode("plain"), "plain");
    }
}
