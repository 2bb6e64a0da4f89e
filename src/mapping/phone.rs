// Swedish phone canonicalization. Anything that cannot be coerced into a
// plausible +46 number comes back as an empty string.

/// Normalize a raw phone value to `+46XXXXXXXXX` form.
///
/// Accepts national format (`070-123 45 67`), bare country code
/// (`46701234567`) and already-international input. Rejects numbers whose
/// digit count falls outside [9, 12] and degenerate input where one digit
/// repeats seven or more times in a row.
pub fn normalize_se(raw: &str) -> String {
    let mut s: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if s.is_empty() {
        return String::new();
    }

    let leading_plus = s.chars().take_while(|c| *c == '+').count();
    if leading_plus > 1 {
        s = format!("+{}", &s[leading_plus..]);
    }

    if all_digits(&s) && s.starts_with('0') && s.len() >= 7 {
        s = format!("+46{}", &s[1..]);
    }
    if all_digits(&s) && s.starts_with("46") && s.len() >= 3 {
        s = format!("+{s}");
    }
    if !s.starts_with("+46") {
        return String::new();
    }

    let digits: String = s[1..].chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 9 || digits.len() > 12 {
        return String::new();
    }
    if has_repeated_run(&digits, 7) {
        return String::new();
    }
    format!("+{digits}")
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn has_repeated_run(digits: &str, limit: usize) -> bool {
    let mut prev = None;
    let mut run = 0;
    for c in digits.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run >= limit {
            return true;
        }
    }
    false
}
