//! Phonetic Latin to Cyrillic transliteration.

/// Multi-letter sequences, matched before single letters.
const DIGRAPHS: [(&str, &str); 8] = [
    ("sht", "щ"),
    ("dzh", "дж"),
    ("sh", "ш"),
    ("ch", "ч"),
    ("zh", "ж"),
    ("ts", "ц"),
    ("yu", "ю"),
    ("ya", "я"),
];

const LETTERS: [(char, &str); 26] = [
    ('a', "а"),
    ('b', "б"),
    ('c', "ц"),
    ('d', "д"),
    ('e', "е"),
    ('f', "ф"),
    ('g', "г"),
    ('h', "х"),
    ('i', "и"),
    ('j', "дж"),
    ('k', "к"),
    ('l', "л"),
    ('m', "м"),
    ('n', "н"),
    ('o', "о"),
    ('p', "п"),
    ('q', "к"),
    ('r', "р"),
    ('s', "с"),
    ('t', "т"),
    ('u', "у"),
    ('v', "в"),
    ('w', "в"),
    ('x', "кс"),
    ('y', "й"),
    ('z', "з"),
];

/// Transliterate Latin letters to Cyrillic, keeping everything else.
///
/// A capitalized source gives a capitalized result; an all-caps word stays
/// all caps.
pub fn transliterate(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let (len, cyrillic) = match match_at(&chars, i) {
            Some(found) => found,
            None => {
                out.push(chars[i]);
                i += 1;
                continue;
            }
        };

        let source = &chars[i..i + len];
        let next_upper = chars.get(i + len).is_some_and(|c| c.is_uppercase());
        let prev_upper = i > 0 && chars[i - 1].is_uppercase();

        if source[0].is_uppercase() {
            let all_caps = source.iter().all(|c| c.is_uppercase()) && (len > 1 || next_upper || prev_upper);
            if all_caps {
                out.push_str(&cyrillic.to_uppercase());
            } else {
                let mut rest = cyrillic.chars();
                if let Some(first) = rest.next() {
                    out.extend(first.to_uppercase());
                    out.push_str(rest.as_str());
                }
            }
        } else {
            out.push_str(cyrillic);
        }

        i += len;
    }

    out
}

fn match_at(chars: &[char], i: usize) -> Option<(usize, &'static str)> {
    for (latin, cyrillic) in DIGRAPHS {
        let len = latin.len();
        if i + len <= chars.len()
            && chars[i..i + len]
                .iter()
                .zip(latin.chars())
                .all(|(c, l)| c.to_ascii_lowercase() == l)
        {
            return Some((len, cyrillic));
        }
    }

    let lower = chars[i].to_ascii_lowercase();
    LETTERS
        .iter()
        .find(|(latin, _)| *latin == lower)
        .map(|(_, cyrillic)| (1, *cyrillic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_digraphs_first() {
        assert_eq!(transliterate("Shtip"), "Щип");
        assert_eq!(transliterate("Yambol"), "Ямбол");
        assert_eq!(transliterate("Tsarevo"), "Царево");
        assert_eq!(transliterate("zhelyazko"), "желязко");
    }

    #[test]
    fn test_case_preserved() {
        assert_eq!(transliterate("Plovdiv"), "Пловдив");
        assert_eq!(transliterate("QUESTE"), "КУЕСТЕ");
        assert_eq!(transliterate("SHUMEN"), "ШУМЕН");
    }

    #[test]
    fn test_other_characters_untouched() {
        assert_eq!(transliterate("ul. Vitosha 15, София"), "ул. Витоша 15, София");
        assert_eq!(transliterate(""), "");
    }
}
