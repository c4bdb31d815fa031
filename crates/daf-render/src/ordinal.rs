//! Ordinal rendering for verse labels, running headers, and page slots.

/// Renders a one-based ordinal as display text.
///
/// The filler never formats numbers itself, so scripts with letter-based
/// numerals plug in here.
pub trait OrdinalFormatter {
    fn ordinal(&self, value: u32) -> String;
}

/// Plain decimal ordinals.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArabicNumerals;

impl OrdinalFormatter for ArabicNumerals {
    fn ordinal(&self, value: u32) -> String {
        value.to_string()
    }
}

const UNITS: [char; 9] = ['א', 'ב', 'ג', 'ד', 'ה', 'ו', 'ז', 'ח', 'ט'];
const TENS: [char; 9] = ['י', 'כ', 'ל', 'מ', 'נ', 'ס', 'ע', 'פ', 'צ'];
const HUNDREDS: [char; 4] = ['ק', 'ר', 'ש', 'ת'];

/// Additive Hebrew numerals, without punctuation marks.
///
/// Hundreds use ק through ת, with ת repeated for values past four
/// hundred. The sums spelling ten-five and ten-six are avoided in any
/// century, so 15 is טו and 115 is קטו.
#[derive(Clone, Copy, Debug, Default)]
pub struct HebrewNumerals;

impl OrdinalFormatter for HebrewNumerals {
    fn ordinal(&self, value: u32) -> String {
        let mut out = String::new();
        let mut rest = value;
        while rest >= 400 {
            out.push(HUNDREDS[3]);
            rest -= 400;
        }
        if rest >= 100 {
            out.push(HUNDREDS[(rest / 100 - 1) as usize]);
            rest %= 100;
        }
        match rest {
            15 => {
                out.push(UNITS[8]);
                out.push(UNITS[5]);
            }
            16 => {
                out.push(UNITS[8]);
                out.push(UNITS[6]);
            }
            _ => {
                if rest >= 10 {
                    out.push(TENS[(rest / 10 - 1) as usize]);
                    rest %= 10;
                }
                if rest > 0 {
                    out.push(UNITS[(rest - 1) as usize]);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hebrew(value: u32) -> String {
        HebrewNumerals.ordinal(value)
    }

    #[test]
    fn units_and_tens() {
        assert_eq!(hebrew(1), "א");
        assert_eq!(hebrew(9), "ט");
        assert_eq!(hebrew(10), "י");
        assert_eq!(hebrew(11), "יא");
        assert_eq!(hebrew(20), "כ");
        assert_eq!(hebrew(99), "צט");
    }

    #[test]
    fn fifteen_and_sixteen_avoid_the_divine_spelling() {
        assert_eq!(hebrew(15), "טו");
        assert_eq!(hebrew(16), "טז");
        assert_eq!(hebrew(115), "קטו");
        assert_eq!(hebrew(516), "תקטז");
    }

    #[test]
    fn hundreds_repeat_tav() {
        assert_eq!(hebrew(100), "ק");
        assert_eq!(hebrew(400), "ת");
        assert_eq!(hebrew(500), "תק");
        assert_eq!(hebrew(747), "תשמז");
        assert_eq!(hebrew(900), "תתק");
    }

    #[test]
    fn zero_renders_empty() {
        assert_eq!(hebrew(0), "");
        assert_eq!(ArabicNumerals.ordinal(0), "0");
    }
}
