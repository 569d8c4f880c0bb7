//! Identifier inflection: table/entity naming (plural snake_case <-> singular UpperCamelCase) and humanized display names.

use regex::Regex;
use std::sync::LazyLock;

/// Pure string transforms used to derive table names, entity types and display names.
pub trait Grammar: Send + Sync {
    /// "first_name" -> "First Name", "BlogPost" -> "Blog Post"
    fn humanize(&self, s: &str) -> String;
    fn pluralize(&self, s: &str) -> String;
    fn singularize(&self, s: &str) -> String;
    /// "blog_post" -> "blogPost", or "BlogPost" when `upper_first` is set.
    fn camelize(&self, s: &str, upper_first: bool) -> String;
    /// "BlogPost" -> "blog_post"
    fn underscorize(&self, s: &str) -> String;
}

/// Default English rules.
#[derive(Clone, Debug, Default)]
pub struct EnglishGrammar;

const ACRONYMS: &[&str] = &["api", "html", "id", "ip", "sql", "uri", "url"];

const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "fish",
    "information",
    "news",
    "series",
    "sheep",
    "species",
];

/// (singular, plural)
const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

fn compile(rules: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    rules
        .iter()
        .map(|(pattern, replacement)| {
            let re = Regex::new(&format!("(?i){}", pattern)).expect("inflection rule is a valid regex");
            (re, *replacement)
        })
        .collect()
}

static PLURAL_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(matr)ix$", "${1}ices"),
        (r"(vert|ind)ex$", "${1}ices"),
        (r"(quiz)$", "${1}zes"),
        (r"(x|ch|ss|sh|s|z)$", "${1}es"),
        (r"([^aeiouy])y$", "${1}ies"),
        (r"(kni|wi|li)fe$", "${1}ves"),
        (r"([lr])f$", "${1}ves"),
        (r"$", "s"),
    ])
});

static SINGULAR_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(matr)ices$", "${1}ix"),
        (r"(vert|ind)ices$", "${1}ex"),
        (r"(quiz)zes$", "${1}"),
        (r"(x|ch|ss|sh|z)es$", "${1}"),
        (r"(us)es$", "${1}"),
        (r"([^aeiouy])ies$", "${1}y"),
        (r"(kni|wi|li)ves$", "${1}fe"),
        (r"([lr])ves$", "${1}f"),
        (r"(ss)$", "${1}"),
        (r"s$", ""),
    ])
});

/// Splits an identifier into (prefix, last word) so only the last word gets inflected.
/// "blog_post" -> ("blog_", "post"), "BlogPost" -> ("Blog", "Post")
fn split_last_word(s: &str) -> (&str, &str) {
    let mut start = 0;
    let mut prev: Option<char> = None;
    for (i, c) in s.char_indices() {
        if c == '_' || c == ' ' {
            start = i + c.len_utf8();
        } else if c.is_uppercase() && prev.map(|p| p.is_lowercase() || p.is_ascii_digit()).unwrap_or(false) {
            start = i;
        }
        prev = Some(c);
    }
    s.split_at(start)
}

/// Copies the case of `template`'s first letter onto `word`.
fn match_case(template: &str, word: &str) -> String {
    let upper = template.chars().next().map(char::is_uppercase).unwrap_or(false);
    if upper {
        capitalize(word)
    } else {
        word.to_string()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn inflect(s: &str, rules: &[(Regex, &'static str)], to_plural: bool) -> String {
    let (prefix, word) = split_last_word(s);
    if word.is_empty() {
        return s.to_string();
    }
    let lower = word.to_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return s.to_string();
    }
    for (singular, plural) in IRREGULAR {
        let (from, to) = if to_plural { (singular, plural) } else { (plural, singular) };
        if lower == *from {
            return format!("{}{}", prefix, match_case(word, to));
        }
    }
    for (re, replacement) in rules {
        if re.is_match(word) {
            return format!("{}{}", prefix, re.replacen(word, 1, *replacement));
        }
    }
    s.to_string()
}

impl Grammar for EnglishGrammar {
    fn humanize(&self, s: &str) -> String {
        if s.contains(' ') {
            return s.to_string();
        }
        self.underscorize(s)
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                if ACRONYMS.contains(&w) {
                    w.to_uppercase()
                } else {
                    capitalize(w)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn pluralize(&self, s: &str) -> String {
        inflect(s, &PLURAL_RULES, true)
    }

    fn singularize(&self, s: &str) -> String {
        inflect(s, &SINGULAR_RULES, false)
    }

    fn camelize(&self, s: &str, upper_first: bool) -> String {
        let mut out = String::with_capacity(s.len());
        let mut capitalize_next = false;
        for c in s.chars() {
            if c == '_' || c == ' ' {
                capitalize_next = true;
            } else if capitalize_next {
                out.extend(c.to_uppercase());
                capitalize_next = false;
            } else {
                out.push(c);
            }
        }
        if upper_first {
            capitalize(&out)
        } else {
            lower_first(&out)
        }
    }

    fn underscorize(&self, s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut out = String::with_capacity(s.len() + 4);
        for (i, &c) in chars.iter().enumerate() {
            if c == ' ' || c == '-' {
                out.push('_');
            } else if c.is_uppercase() {
                if i > 0 && !out.ends_with('_') {
                    let prev = chars[i - 1];
                    let next_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
                    if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                        out.push('_');
                    }
                }
                out.extend(c.to_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}
