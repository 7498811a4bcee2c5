const ISIN_PREFIX: &str = "INF";
const ISIN_LEN: usize = 12;

pub(crate) fn repair_isin(raw: &str) -> String {
    let mut isin = raw.trim().to_uppercase();

    // extra leading I
    if let Some(rest) = isin.strip_prefix("IIN") {
        isin = format!("IN{rest}");
    }
    // missing leading I
    if isin.starts_with("NF") {
        isin.insert(0, 'I');
    }
    // missing F
    if let Some(rest) = isin.strip_prefix("IN9") {
        isin = format!("INF9{rest}");
    }

    isin
}

fn is_valid_isin(isin: &str) -> bool {
    isin.starts_with(ISIN_PREFIX) && isin.chars().count() == ISIN_LEN
}

pub(crate) fn normalize_isin(raw: &str) -> Option<String> {
    let isin = repair_isin(raw);
    is_valid_isin(&isin).then_some(isin)
}
