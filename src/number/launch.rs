//! Decoding numbers handed over by a URL handler or launcher.

use percent_encoding::percent_decode_str;

const SCHEMES: [&str; 2] = ["tel:", "callto:"];

/// Extract the number from a launch parameter.
///
/// A leading `tel:` or `callto:` scheme is removed and the rest is
/// percent-decoded. Anything else is passed through untouched.
pub fn launch_number(param: &str) -> String {
    for scheme in SCHEMES {
        if let Some(rest) = param.strip_prefix(scheme) {
            return percent_decode_str(rest).decode_utf8_lossy().into_owned();
        }
    }
    param.to_string()
}

/// Look up `name` in a query string such as `?tel=...&x=1`.
///
/// The value is percent-decoded; `+` is kept literally since phone numbers
/// use it. When a name repeats, the last occurrence wins.
pub fn query_parameter(query: &str, name: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);

    query
        .split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            (key == name).then(|| parts.next().unwrap_or(""))
        })
        .last()
        .map(|value| percent_decode_str(value).decode_utf8_lossy().into_owned())
}
