/// Strips everything but ASCII digits.
pub fn digits(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Number with country code, no `+`. Ten-digit local numbers get
/// `country_code` prefixed; anything longer is assumed to carry one already.
pub fn international(phone: &str, country_code: &str) -> String {
    let d = digits(phone);
    if d.len() == 10 {
        format!("{}{}", digits(country_code), d)
    } else {
        d
    }
}

/// Local number without the country code, as bulk SMS gateways expect.
pub fn national(phone: &str, country_code: &str) -> String {
    let d = digits(phone);
    let cc = digits(country_code);
    match d.strip_prefix(cc.as_str()) {
        Some(rest) if d.len() > 10 && rest.len() == 10 => rest.to_string(),
        _ => d,
    }
}
