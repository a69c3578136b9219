//! Bulgarian amounts in words (leva and stotinki).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::invoice::round2;

/// Grammatical gender of the counted noun. Only 1 and 2 change form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gender {
    Masculine,
    Feminine,
}

const UNITS: [&str; 10] = [
    "", "един", "два", "три", "четири", "пет", "шест", "седем", "осем", "девет",
];

const TEENS: [&str; 10] = [
    "десет",
    "единадесет",
    "дванадесет",
    "тринадесет",
    "четиринадесет",
    "петнадесет",
    "шестнадесет",
    "седемнадесет",
    "осемнадесет",
    "деветнадесет",
];

const TENS: [&str; 10] = [
    "",
    "",
    "двадесет",
    "тридесет",
    "четиридесет",
    "петдесет",
    "шестдесет",
    "седемдесет",
    "осемдесет",
    "деветдесет",
];

const HUNDREDS: [&str; 10] = [
    "",
    "сто",
    "двеста",
    "триста",
    "четиристотин",
    "петстотин",
    "шестстотин",
    "седемстотин",
    "осемстотин",
    "деветстотин",
];

const MAX_LEVA: u64 = 999_999_999;

fn unit_word(n: usize, gender: Gender) -> &'static str {
    match (n, gender) {
        (1, Gender::Feminine) => "една",
        (2, Gender::Feminine) => "две",
        _ => UNITS[n],
    }
}

/// Words of 1..=999, one entry per spoken element.
fn triplet_elements(n: u64, gender: Gender) -> Vec<&'static str> {
    let n = (n % 1000) as usize;
    let (h, t, u) = (n / 100, (n % 100) / 10, n % 10);

    let mut elements = Vec::new();
    if h > 0 {
        elements.push(HUNDREDS[h]);
    }
    match t {
        0 if u > 0 => elements.push(unit_word(u, gender)),
        0 => {}
        1 => elements.push(TEENS[u]),
        _ => {
            elements.push(TENS[t]);
            if u > 0 {
                elements.push(unit_word(u, gender));
            }
        }
    }
    elements
}

/// Join elements, with "и" before the last one.
fn join_with_and(elements: &[&str]) -> String {
    match elements {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} и {}", init.join(" "), last),
    }
}

/// Words for a whole number below one billion.
fn integer_words(n: u64, gender: Gender) -> String {
    if n == 0 {
        return "нула".to_string();
    }

    let millions = n / 1_000_000;
    let thousands = (n / 1000) % 1000;
    let rest = n % 1000;

    // (words, element count) of each non-zero group, largest first.
    let mut groups: Vec<(String, usize)> = Vec::new();

    if millions > 0 {
        let elements = triplet_elements(millions, Gender::Masculine);
        let words = if millions == 1 {
            "един милион".to_string()
        } else {
            format!("{} милиона", join_with_and(&elements))
        };
        groups.push((words, elements.len()));
    }

    if thousands > 0 {
        let elements = triplet_elements(thousands, Gender::Feminine);
        let words = if thousands == 1 {
            "хиляда".to_string()
        } else {
            format!("{} хиляди", join_with_and(&elements))
        };
        groups.push((words, elements.len()));
    }

    if rest > 0 {
        let elements = triplet_elements(rest, gender);
        groups.push((join_with_and(&elements), elements.len()));
    }

    // A single-element last group takes the "и": "хиляда и пет",
    // "пет хиляди и шестстотин". Otherwise it carries its own.
    let mut out = String::new();
    let count = groups.len();
    for (i, (words, elements)) in groups.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
            if i == count - 1 && elements == 1 {
                out.push_str("и ");
            }
        }
        out.push_str(&words);
    }
    out
}

fn leva_words(leva: u64) -> String {
    match leva {
        1 => "един лев".to_string(),
        n => format!("{} лева", integer_words(n, Gender::Masculine)),
    }
}

fn stotinki_words(stotinki: u64) -> String {
    match stotinki {
        1 => "една стотинка".to_string(),
        n => format!("{} стотинки", integer_words(n, Gender::Feminine)),
    }
}

/// Amount in Bulgarian words, e.g. 5640 → "пет хиляди шестстотин и
/// четиридесет лева".
///
/// The amount is rounded to stotinki first. Amounts of a billion leva or
/// more are written with digits.
pub fn amount_in_words(amount: Decimal) -> String {
    let amount = round2(amount);
    let negative = amount.is_sign_negative() && !amount.is_zero();
    let amount = amount.abs();

    let leva = amount.trunc();
    let stotinki = ((amount - leva) * Decimal::ONE_HUNDRED).trunc();

    let (Some(leva), Some(stotinki)) = (leva.to_u64(), stotinki.to_u64()) else {
        return format!("{} лева", amount);
    };
    if leva > MAX_LEVA {
        return format!("{} лева", amount.round_dp(2));
    }

    let mut words = leva_words(leva);
    if stotinki > 0 {
        words.push_str(" и ");
        words.push_str(&stotinki_words(stotinki));
    }

    if negative {
        format!("минус {}", words)
    } else {
        words
    }
}
