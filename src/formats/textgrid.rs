/*!
 * Praat TextGrid reader and writer (long text format).
 *
 * The reader tokenizes the file into bare words, quoted strings and the
 * punctuation `[ ] : =`, then walks `key = value` fields and `name [n]:`
 * headers. Quoted strings use doubled quotes (`""`) for a literal quote and
 * may span several lines.
 */

use log::warn;

use crate::annotation::{Annotation, Interval, Tier};
use crate::errors::ConversionError;
use crate::formats::parse_number;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Symbol(char),
}

#[derive(Debug, Clone, PartialEq)]
enum Item {
    /// `kind [index]:`, e.g. `item [2]:` or `intervals [5]:`
    Header { kind: String, index: usize },
    /// `key = value`
    Field { key: String, value: String },
}

fn is_symbol(c: char) -> bool {
    matches!(c, '[' | ']' | ':' | '=')
}

fn tokenize(content: &str) -> Result<Vec<Token>, ConversionError> {
    let mut tokens = Vec::new();
    let mut chars = content.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        text.push('"');
                    }
                    Some('"') => break,
                    Some(ch) => text.push(ch),
                    None => {
                        return Err(ConversionError::MalformedInput(
                            "unterminated string in TextGrid".to_string(),
                        ))
                    }
                }
            }
            tokens.push(Token::Quoted(text));
        } else if is_symbol(c) {
            chars.next();
            tokens.push(Token::Symbol(c));
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || ch == '"' || is_symbol(ch) {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }

    Ok(tokens)
}

fn items(tokens: &[Token]) -> Result<Vec<Item>, ConversionError> {
    let mut items = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let Token::Word(word) = &tokens[i] else {
            i += 1;
            continue;
        };

        match tokens.get(i + 1) {
            Some(Token::Symbol('[')) => {
                match (tokens.get(i + 2), tokens.get(i + 3), tokens.get(i + 4)) {
                    (Some(Token::Word(n)), Some(Token::Symbol(']')), Some(Token::Symbol(':'))) => {
                        let index = n.parse::<usize>().map_err(|_| {
                            ConversionError::MalformedInput(format!("invalid index '{}' in {} header", n, word))
                        })?;
                        items.push(Item::Header { kind: word.clone(), index });
                        i += 5;
                    }
                    // `item []:` opens the tier list and carries no index
                    _ => i += 2,
                }
            }
            Some(Token::Symbol('=')) => {
                let value = match tokens.get(i + 2) {
                    Some(Token::Word(v)) | Some(Token::Quoted(v)) => v.clone(),
                    _ => {
                        return Err(ConversionError::MalformedInput(format!(
                            "missing value for '{}'",
                            word
                        )))
                    }
                };
                items.push(Item::Field { key: word.clone(), value });
                i += 3;
            }
            _ => i += 1,
        }
    }

    Ok(items)
}

fn is_tier_header(item: &Item) -> bool {
    matches!(item, Item::Header { kind, .. } if kind == "item")
}

/// Decode the contents of a TextGrid file
pub fn decode(content: &str) -> Result<Annotation, ConversionError> {
    let tokens = tokenize(content)?;
    let items = items(&tokens)?;

    let has_first_tier = items
        .iter()
        .any(|item| matches!(item, Item::Header { kind, index: 1 } if kind == "item"));
    if !has_first_tier {
        return Err(ConversionError::MalformedInput(
            "no 'item [1]:' marker found in TextGrid".to_string(),
        ));
    }

    let first_tier = items.iter().position(is_tier_header).unwrap_or(items.len());
    let duration = items[..first_tier]
        .iter()
        .find_map(|item| match item {
            Item::Field { key, value } if key == "xmax" => Some(value.as_str()),
            _ => None,
        })
        .ok_or_else(|| ConversionError::MalformedInput("missing global xmax in TextGrid".to_string()))
        .and_then(|v| parse_number(v, "xmax"))?;

    let mut tiers = Vec::new();
    let mut blocks: Vec<&[Item]> = Vec::new();
    let mut block_start = first_tier;
    for (i, item) in items.iter().enumerate().skip(first_tier + 1) {
        if is_tier_header(item) {
            blocks.push(&items[block_start + 1..i]);
            block_start = i;
        }
    }
    if first_tier < items.len() {
        blocks.push(&items[block_start + 1..]);
    }

    for block in blocks {
        if let Some(tier) = decode_tier(block)? {
            tiers.push(tier);
        }
    }

    Ok(Annotation::new(duration, tiers))
}

fn field_value<'a>(block: &'a [Item], wanted: &str) -> Option<&'a str> {
    block.iter().find_map(|item| match item {
        Item::Field { key, value } if key == wanted => Some(value.as_str()),
        _ => None,
    })
}

fn decode_tier(block: &[Item]) -> Result<Option<Tier>, ConversionError> {
    let class = field_value(block, "class").unwrap_or_default();
    let name = field_value(block, "name").unwrap_or_default().to_string();

    match class {
        "IntervalTier" => Ok(Some(Tier::new(name, decode_intervals(block)?))),
        "TextTier" => Ok(Some(Tier::points(name, decode_points(block)?))),
        other => {
            warn!("Skipping TextGrid tier '{}' with unsupported class '{}'", name, other);
            Ok(None)
        }
    }
}

fn decode_intervals(block: &[Item]) -> Result<Vec<Interval>, ConversionError> {
    let mut intervals = Vec::new();
    let mut in_entry = false;
    let mut start = None;
    let mut end = None;

    for item in block {
        match item {
            Item::Header { .. } => {
                in_entry = true;
                start = None;
                end = None;
            }
            // Fields before the first entry header are the tier's own bounds
            Item::Field { .. } if !in_entry => {}
            Item::Field { key, value } => match key.as_str() {
                "xmin" => start = Some(parse_number(value, "xmin")?),
                "xmax" => end = Some(parse_number(value, "xmax")?),
                "text" => {
                    let (Some(s), Some(e)) = (start, end) else {
                        return Err(ConversionError::MalformedInput(
                            "TextGrid interval without xmin/xmax".to_string(),
                        ));
                    };
                    intervals.push(Interval::new(s, e, value.trim()));
                }
                _ => {}
            },
        }
    }

    Ok(intervals)
}

fn decode_points(block: &[Item]) -> Result<Vec<Interval>, ConversionError> {
    let mut points = Vec::new();
    let mut in_entry = false;
    let mut time = None;

    for item in block {
        match item {
            Item::Header { .. } => {
                in_entry = true;
                time = None;
            }
            Item::Field { .. } if !in_entry => {}
            Item::Field { key, value } => match key.as_str() {
                "number" | "time" => time = Some(parse_number(value, "number")?),
                "mark" => {
                    let Some(t) = time else {
                        return Err(ConversionError::MalformedInput(
                            "TextGrid point without number".to_string(),
                        ));
                    };
                    points.push(Interval::point(t, value.trim()));
                }
                _ => {}
            },
        }
    }

    Ok(points)
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Encode an annotation as a long-format TextGrid
pub fn encode(annotation: &Annotation) -> String {
    let duration = annotation.duration;
    let mut out = String::new();

    out.push_str("File type = \"ooTextFile\"\n");
    out.push_str("Object class = \"TextGrid\"\n\n");
    out.push_str("xmin = 0\n");
    out.push_str(&format!("xmax = {}\n", duration));
    out.push_str("tiers? <exists>\n");
    out.push_str(&format!("size = {}\n", annotation.tiers.len()));
    out.push_str("item []:\n");

    for (t, tier) in annotation.tiers.iter().enumerate() {
        let (class, entries) = if tier.is_point {
            ("TextTier", "points")
        } else {
            ("IntervalTier", "intervals")
        };

        out.push_str(&format!("    item [{}]:\n", t + 1));
        out.push_str(&format!("        class = \"{}\"\n", class));
        out.push_str(&format!("        name = {}\n", quote(&tier.name)));
        out.push_str("        xmin = 0\n");
        out.push_str(&format!("        xmax = {}\n", duration));
        out.push_str(&format!("        {}: size = {}\n", entries, tier.len()));

        for (i, interval) in tier.intervals.iter().enumerate() {
            out.push_str(&format!("        {} [{}]:\n", entries, i + 1));
            if tier.is_point {
                out.push_str(&format!("            number = {}\n", interval.start));
                out.push_str(&format!("            mark = {}\n", quote(&interval.text)));
            } else {
                out.push_str(&format!("            xmin = {}\n", interval.start));
                out.push_str(&format!("            xmax = {}\n", interval.end));
                out.push_str(&format!("            text = {}\n", quote(&interval.text)));
            }
        }
    }

    out
}
