//! Monetary amounts spelled out in English, as printed on documents.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const ONES: [&str; 20] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "Zero", "Ten", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

/// Whole numbers at or above this are printed as digits
pub const WORDS_LIMIT: u64 = 1_000_000;

/// English words for `n` below [`WORDS_LIMIT`]; plain digits otherwise
pub fn number_to_words(n: u64) -> String {
    match n {
        0..=19 => ONES[n as usize].to_string(),
        20..=99 => {
            let tens = TENS[(n / 10) as usize];
            match n % 10 {
                0 => tens.to_string(),
                rest => format!("{} {}", tens, ONES[rest as usize]),
            }
        }
        100..=999 => {
            let head = format!("{} Hundred", ONES[(n / 100) as usize]);
            match n % 100 {
                0 => head,
                rest => format!("{} {}", head, number_to_words(rest)),
            }
        }
        1_000..=999_999 => {
            let head = format!("{} Thousand", number_to_words(n / 1000));
            match n % 1000 {
                0 => head,
                rest => format!("{} {}", head, number_to_words(rest)),
            }
        }
        _ => n.to_string(),
    }
}

/// `"{whole} {major} Only"` or `"{whole} {major} And {fraction} {minor}"`.
///
/// The fraction is rounded to two places first, so 1.999 reads as two
/// whole units. Negative amounts are prefixed with "Minus".
pub fn amount_in_words(amount: Decimal, major: &str, minor: &str) -> String {
    let rounded = amount.abs().round_dp(2);
    let whole = rounded.trunc();
    let fraction = ((rounded - whole) * Decimal::ONE_HUNDRED)
        .to_u64()
        .unwrap_or_default();

    let whole_words = match whole.to_u64() {
        Some(n) => number_to_words(n),
        None => whole.to_string(),
    };

    let mut words = if amount.is_sign_negative() && !rounded.is_zero() {
        format!("Minus {} {}", whole_words, major)
    } else {
        format!("{} {}", whole_words, major)
    };

    if fraction > 0 {
        words.push_str(&format!(" And {} {}", number_to_words(fraction), minor));
    } else {
        words.push_str(" Only");
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn kwacha(amount: Decimal) -> String {
        amount_in_words(amount, "Kwacha", "Ngwee")
    }

    #[test_case(dec!(0) => "Zero Kwacha Only")]
    #[test_case(dec!(1) => "One Kwacha Only")]
    #[test_case(dec!(1.50) => "One Kwacha And Fifty Ngwee")]
    #[test_case(dec!(120) => "One Hundred Twenty Kwacha Only")]
    #[test_case(dec!(0.05) => "Zero Kwacha And Five Ngwee")]
    #[test_case(dec!(1.999) => "Two Kwacha Only"; "fraction rounding carries")]
    #[test_case(dec!(-15.25) => "Minus Fifteen Kwacha And Twenty Five Ngwee")]
    fn spells_amounts(amount: Decimal) -> String {
        kwacha(amount)
    }

    #[test_case(13 => "Thirteen")]
    #[test_case(40 => "Forty")]
    #[test_case(99 => "Ninety Nine")]
    #[test_case(100 => "One Hundred")]
    #[test_case(305 => "Three Hundred Five")]
    #[test_case(1_000 => "One Thousand")]
    #[test_case(21_017 => "Twenty One Thousand Seventeen")]
    #[test_case(999_999 => "Nine Hundred Ninety Nine Thousand Nine Hundred Ninety Nine")]
    #[test_case(1_000_000 => "1000000"; "limit falls back to digits")]
    #[test_case(2_500_000 => "2500000")]
    fn spells_whole_numbers(n: u64) -> String {
        number_to_words(n)
    }

    #[test]
    fn large_amounts_keep_currency_suffix() {
        assert_eq!(kwacha(dec!(1250000.75)), "1250000 Kwacha And Seventy Five Ngwee");
    }
}
