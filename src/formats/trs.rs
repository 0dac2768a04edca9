/*!
 * Transcriber (`.trs`) reader.
 *
 * Transcriber stores start times only: sections and turns carry both bounds,
 * but the running transcription is cut by `Sync` markers whose ends are the
 * next marker's start. Inline elements (`Who`, `Comment`, `Event`,
 * `Background`) are folded into the current transcription interval as text
 * markup.
 */

use std::collections::HashMap;

use log::debug;

use crate::annotation::{fill_ends_backward, Annotation, Interval, Tier};
use crate::app_config::TranscriberLabels;
use crate::errors::ConversionError;
use crate::formats::parse_number;
use crate::xml::{XmlElement, XmlNode};

/// Accumulates transcription and background intervals while walking turns
#[derive(Debug, Default)]
struct Transcript {
    transcription: Vec<Interval>,
    background: Vec<Interval>,
    has_background: bool,
}

impl Transcript {
    fn open(&mut self, time: f64, text: &str) {
        self.transcription.push(Interval::new(time, time, text));
    }

    // @returns: The interval markup should go to, opened at `fallback` if none exists yet
    fn current(&mut self, fallback: f64) -> &mut Interval {
        if self.transcription.is_empty() {
            self.open(fallback, "");
        }
        let last = self.transcription.len() - 1;
        &mut self.transcription[last]
    }

    fn append(&mut self, fallback: f64, markup: &str, tail: &str) {
        let current = self.current(fallback);
        if !markup.is_empty() {
            current.text.push(' ');
            current.text.push_str(markup);
        }
        if !tail.is_empty() {
            current.text.push(' ');
            current.text.push_str(tail);
        }
    }
}

fn required_time(element: &XmlElement, key: &str) -> Result<f64, ConversionError> {
    let value = element.attr(key).ok_or_else(|| {
        ConversionError::MalformedInput(format!("{} element is missing '{}'", element.name, key))
    })?;
    parse_number(value, key)
}

fn event_markup(element: &XmlElement) -> String {
    let desc = element.attr("desc").unwrap_or_default();
    match element.attr("extent").unwrap_or("instantaneous") {
        "begin" => format!("[{}-]", desc),
        "end" => format!("[-{}]", desc),
        "next" => format!("[{}]+", desc),
        "previous" => format!("+[{}]", desc),
        _ => format!("[{}]", desc),
    }
}

fn lookup_table(root: &XmlElement, table: &str, entry: &str, value_key: &str) -> HashMap<String, String> {
    root.child(table)
        .map(|t| {
            t.children_named(entry)
                .filter_map(|e| Some((e.attr("id")?.to_string(), e.attr(value_key)?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Split a turn's children into `(element, following text)` pairs.
///
/// Text before the first element is returned separately.
fn with_tails(turn: &XmlElement) -> (String, Vec<(&XmlElement, String)>) {
    let mut leading = String::new();
    let mut pairs: Vec<(&XmlElement, String)> = Vec::new();

    for node in &turn.children {
        match node {
            XmlNode::Element(element) => pairs.push((element, String::new())),
            XmlNode::Text(text) => match pairs.last_mut() {
                Some((_, tail)) => tail.push_str(text),
                None => leading.push_str(text),
            },
        }
    }

    (leading.trim().to_string(), pairs)
}

fn walk_turn(turn: &XmlElement, turn_start: f64, transcript: &mut Transcript) -> Result<(), ConversionError> {
    let (leading, pairs) = with_tails(turn);
    if !leading.is_empty() {
        transcript.append(turn_start, "", &leading);
    }

    for (element, tail) in pairs {
        let tail = tail.trim();
        match element.name.as_str() {
            "Sync" => transcript.open(required_time(element, "time")?, tail),
            "Who" => {
                let markup = format!("{}:", element.attr("nb").unwrap_or_default());
                transcript.append(turn_start, &markup, tail);
            }
            "Comment" => {
                let markup = format!("{{{}}}", element.attr("desc").unwrap_or_default());
                transcript.append(turn_start, &markup, tail);
            }
            "Event" => transcript.append(turn_start, &event_markup(element), tail),
            "Background" => {
                let time = required_time(element, "time")?;
                transcript.append(turn_start, "", tail);
                let label = if element.attr("level") == Some("off") {
                    ""
                } else {
                    element.attr("type").unwrap_or_default()
                };
                transcript.background.push(Interval::point(time, label));
                transcript.has_background = true;
            }
            other => debug!("Ignoring <{}> inside Turn", other),
        }
    }

    Ok(())
}

/// Decode a Transcriber document
pub fn decode(content: &str, labels: &TranscriberLabels) -> Result<Annotation, ConversionError> {
    let root = XmlElement::parse(content)?;

    let topics = lookup_table(&root, "Topics", "Topic", "desc");
    let speakers = lookup_table(&root, "Speakers", "Speaker", "name");

    let sections = root.descendants_named("Section");
    if sections.is_empty() {
        return Err(ConversionError::MalformedInput(
            "Transcriber document has no Section".to_string(),
        ));
    }

    let mut topic_intervals = Vec::new();
    let mut speaker_intervals = Vec::new();
    let mut transcript = Transcript::default();
    let mut duration = 0.0;

    for section in sections {
        let start = required_time(section, "startTime")?;
        let end = required_time(section, "endTime")?;
        duration = end;

        let topic_id = section.attr("topic");
        let topic = topic_id
            .and_then(|id| topics.get(id).map(String::as_str))
            .or_else(|| section.attr("type"))
            .or(topic_id)
            .unwrap_or_default();
        topic_intervals.push(Interval::new(start, end, topic));

        for turn in section.children_named("Turn") {
            let turn_start = required_time(turn, "startTime")?;
            let turn_end = required_time(turn, "endTime")?;

            let speaker = match turn.attr("speaker").map(str::trim).filter(|s| !s.is_empty()) {
                Some(ids) => ids
                    .split_whitespace()
                    .map(|id| speakers.get(id).map(String::as_str).unwrap_or(id))
                    .collect::<Vec<_>>()
                    .join(" + "),
                None => labels.no_speaker.clone(),
            };
            speaker_intervals.push(Interval::new(turn_start, turn_end, speaker));

            walk_turn(turn, turn_start, &mut transcript)?;
        }
    }

    let Transcript {
        mut transcription,
        mut background,
        has_background,
    } = transcript;

    fill_ends_backward(&mut transcription, duration);
    for interval in &mut transcription {
        interval.text = interval.text.trim().to_string();
    }

    let mut tiers = vec![
        Tier::new(labels.topics_tier.as_str(), topic_intervals),
        Tier::new(labels.speakers_tier.as_str(), speaker_intervals),
        Tier::new(labels.transcription_tier.as_str(), transcription),
    ];
    if has_background {
        fill_ends_backward(&mut background, duration);
        tiers.push(Tier::new(labels.background_tier.as_str(), background));
    }

    Ok(Annotation::new(duration, tiers))
}
