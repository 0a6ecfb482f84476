use std::collections::HashMap;

/// Parse an `application/x-www-form-urlencoded` body.
///
/// `+` decodes to a space and values are percent-decoded. Repeated keys keep
/// the last value; a key without `=` maps to an empty string.
pub fn parse_form(body: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in body.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(decode_component(key), decode_component(value));
    }

    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}

pub fn get_string(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params.get(key).cloned()
}
