use alloy::primitives::U256;

/// Returns `10^decimals`. ERC20 decimals are a `uint8`, so this can never
/// overflow for the values tokens actually report (at most 10^77 fits).
pub fn pow10(decimals: u8) -> Option<U256> {
    U256::from(10).checked_pow(U256::from(decimals))
}

/// Re-expresses a fixed-point `value` with `from` decimals using `to`
/// decimals. Scaling down truncates.
///
/// ```text
/// rescale(188522000000, 8, 6) == 1885220000
/// ```
pub fn rescale(value: U256, from: u8, to: u8) -> Option<U256> {
    match from.cmp(&to) {
        std::cmp::Ordering::Equal => Some(value),
        std::cmp::Ordering::Less => value.checked_mul(pow10(to - from)?),
        std::cmp::Ordering::Greater => Some(value / pow10(from - to)?),
    }
}

/// Parses a human readable decimal amount such as `"1885.22"` into a
/// fixed-point integer with the given number of decimals. Extra fractional
/// digits are rejected rather than rounded.
pub fn parse_units(amount: &str, decimals: u8) -> anyhow::Result<U256> {
    let amount = amount.trim();
    let (integer, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    anyhow::ensure!(
        fraction.len() <= usize::from(decimals),
        "{amount:?} has more than {decimals} fractional digits"
    );
    let integer = if integer.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(integer, 10)?
    };
    let fraction = if fraction.is_empty() {
        U256::ZERO
    } else {
        let digits = u8::try_from(fraction.len())?;
        let scale = pow10(decimals - digits).ok_or_else(|| anyhow::anyhow!("overflow"))?;
        U256::from_str_radix(fraction, 10)? * scale
    };
    let one = pow10(decimals).ok_or_else(|| anyhow::anyhow!("overflow"))?;
    integer
        .checked_mul(one)
        .and_then(|integer| integer.checked_add(fraction))
        .ok_or_else(|| anyhow::anyhow!("{amount:?} does not fit into a u256"))
}
