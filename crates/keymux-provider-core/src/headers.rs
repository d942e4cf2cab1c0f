/// Ordered header list as forwarded between client and upstream.
///
/// Names compare case-insensitively; insertion order is preserved.
pub type Headers = Vec<(String, String)>;

pub fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub fn header_set(headers: &mut Headers, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
        Some((_, existing)) => *existing = value,
        None => headers.push((name, value)),
    }
}

pub fn header_remove(headers: &mut Headers, name: &str) -> Option<String> {
    let idx = headers.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))?;
    Some(headers.remove(idx).1)
}

/// Keeps only the headers whose names appear in `allowed`.
pub fn retain_headers(headers: &mut Headers, allowed: &[&str]) {
    headers.retain(|(k, _)| allowed.iter().any(|name| k.eq_ignore_ascii_case(name)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        assert_eq!(header_get(&headers, "content-type"), Some("application/json"));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut headers = vec![("Accept".to_string(), "*/*".to_string())];
        header_set(&mut headers, "accept", "application/json");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].1, "application/json");
    }

    #[test]
    fn retain_drops_everything_else() {
        let mut headers = vec![
            ("accept".to_string(), "*/*".to_string()),
            ("cookie".to_string(), "secret".to_string()),
        ];
        retain_headers(&mut headers, &["accept", "user-agent"]);
        assert_eq!(headers, vec![("accept".to_string(), "*/*".to_string())]);
    }
}
