/*!
 * Annotation Pro (`.antx`) reader and writer.
 *
 * An ANTX file is a flat dataset: `Layer` rows, `Segment` rows pointing at a
 * layer through `IdLayer`, and `Configuration` key/value rows. Segment times
 * are sample counts at the dataset's `Samplerate`.
 */

use std::collections::HashMap;

use log::{debug, warn};
use uuid::Uuid;

use crate::annotation::{Annotation, Interval, Tier};
use crate::app_config::ConversionOptions;
use crate::errors::ConversionError;
use crate::formats::parse_number;
use crate::xml::XmlElement;

const NAMESPACE: &str = "http://tempuri.org/AnnotationSystemDataSet.xsd";

/// Sample rate used for every written file
const OUTPUT_SAMPLE_RATE: f64 = 44100.0;

const BLACK: &str = "-16777216";
const WHITE: &str = "-1";

fn configuration_value(root: &XmlElement, key: &str) -> Option<String> {
    root.children_named("Configuration")
        .find(|c| c.child_text("Key").map(|k| k.trim() == key).unwrap_or(false))
        .and_then(|c| c.child_text("Value"))
}

fn sample_rate(root: &XmlElement) -> Result<f64, ConversionError> {
    let value = configuration_value(root, "Samplerate")
        .ok_or_else(|| ConversionError::MalformedInput("ANTX file has no Samplerate configuration".to_string()))?;
    let rate = parse_number(&value, "Samplerate")?;
    if rate <= 0.0 {
        return Err(ConversionError::MalformedInput(format!(
            "ANTX sample rate must be positive, got {}",
            rate
        )));
    }
    Ok(rate)
}

fn required_field(element: &XmlElement, field: &str) -> Result<String, ConversionError> {
    element
        .child_text(field)
        .ok_or_else(|| ConversionError::MalformedInput(format!("{} element is missing {}", element.name, field)))
}

/// Decode an Annotation Pro document
pub fn decode(content: &str, options: &ConversionOptions) -> Result<Annotation, ConversionError> {
    let root = XmlElement::parse(content)?;
    let rate = sample_rate(&root)?;

    let mut tiers = Vec::new();
    let mut layer_index: HashMap<String, usize> = HashMap::new();
    for layer in root.children_named("Layer") {
        let id = required_field(layer, "Id")?.trim().to_string();
        let name = layer.child_text("Name").unwrap_or_default();
        layer_index.insert(id, tiers.len());
        tiers.push(Tier::new(name, Vec::new()));
    }

    let mut max_end: f64 = 0.0;
    for segment in root.children_named("Segment") {
        let layer_id = required_field(segment, "IdLayer")?;
        let Some(&tier) = layer_index.get(layer_id.trim()) else {
            warn!("Skipping ANTX segment for unknown layer '{}'", layer_id.trim());
            continue;
        };

        let start = parse_number(&required_field(segment, "Start")?, "Start")? / rate;
        let length = parse_number(&required_field(segment, "Duration")?, "Duration")? / rate;
        let label = segment.child_text("Label").unwrap_or_default();

        max_end = max_end.max(start + length);
        tiers[tier].intervals.push(Interval::new(start, start + length, label));
    }

    let duration = max_end.max(options.antx_min_duration);
    debug!("ANTX sample rate {} Hz, duration {}s", rate, duration);
    Ok(Annotation::new(duration, tiers))
}

fn field(name: &str, value: impl Into<String>) -> XmlElement {
    XmlElement::new(name).with_text(value)
}

fn samples(seconds: f64) -> String {
    ((seconds * OUTPUT_SAMPLE_RATE).round() as i64).to_string()
}

fn layer_element(id: &str, name: &str) -> XmlElement {
    XmlElement::new("Layer")
        .with_child(field("Id", id))
        .with_child(field("Name", name))
        .with_child(field("ForeColor", BLACK))
        .with_child(field("BackColor", WHITE))
        .with_child(field("IsSelected", "false"))
        .with_child(field("Height", "70"))
        .with_child(field("CoordinateControlStyle", "0"))
        .with_child(field("IsLocked", "false"))
        .with_child(field("IsClosed", "false"))
        .with_child(field("ShowOnSpectrogram", "false"))
        .with_child(field("ShowAsChart", "false"))
        .with_child(field("ChartMinimum", "-50"))
        .with_child(field("ChartMaximum", "50"))
        .with_child(field("ShowBoundaries", "true"))
        .with_child(field("IncludeInFrequency", "true"))
        .with_child(field("Parameter1Name", "Parameter 1"))
        .with_child(field("Parameter2Name", "Parameter 2"))
        .with_child(field("Parameter3Name", "Parameter 3"))
        .with_child(field("IsVisible", "true"))
        .with_child(field("FontSize", "10"))
        .with_child(field("VideoPlayerIndex", "0"))
}

fn segment_element(layer_id: &str, interval: &Interval) -> XmlElement {
    let mut segment = XmlElement::new("Segment")
        .with_child(field("Id", Uuid::new_v4().to_string()))
        .with_child(field("IdLayer", layer_id))
        .with_child(field("Label", interval.text.as_str()))
        .with_child(field("ForeColor", BLACK))
        .with_child(field("BackColor", WHITE))
        .with_child(field("BorderColor", BLACK))
        .with_child(field("Start", samples(interval.start)))
        .with_child(field("Duration", samples(interval.length())))
        .with_child(field("IsSelected", "false"));

    for empty in [
        "Feature",
        "Language",
        "Group",
        "Name",
        "Parameter1",
        "Parameter2",
        "Parameter3",
    ] {
        segment.push_child(XmlElement::new(empty));
    }

    segment
        .with_child(field("IsMarker", "false"))
        .with_child(XmlElement::new("Marker"))
        .with_child(XmlElement::new("RScript"))
        .with_child(field("VideoOffset", "0"))
}

/// Encode an annotation as an Annotation Pro dataset
pub fn encode(annotation: &Annotation, options: &ConversionOptions) -> XmlElement {
    let mut root = XmlElement::new("AnnotationSystemDataSet").with_attr("xmlns", NAMESPACE);

    let layer_ids: Vec<String> = annotation.tiers.iter().map(|_| Uuid::new_v4().to_string()).collect();
    for (tier, id) in annotation.tiers.iter().zip(&layer_ids) {
        root.push_child(layer_element(id, &tier.name));
    }

    let mut segment_count = 0;
    for (tier, id) in annotation.tiers.iter().zip(&layer_ids) {
        for interval in tier.intervals.iter().filter(|i| options.include_empty || i.has_text()) {
            root.push_child(segment_element(id, interval));
            segment_count += 1;
        }
    }

    let configuration = [
        ("Version", "5".to_string()),
        ("Created", String::new()),
        ("Modified", String::new()),
        ("Samplerate", OUTPUT_SAMPLE_RATE.to_string()),
        ("FileVersion", "5".to_string()),
        ("Author", String::new()),
        ("ProjectTitle", String::new()),
        ("ProjectEnvironment", String::new()),
        ("ProjectNoises", String::new()),
        ("ProjectCollection", String::new()),
        ("ProjectCorpusType", String::new()),
        ("ProjectCorpusOwner", String::new()),
        ("ProjectLicense", String::new()),
        ("ProjectDescription", String::new()),
    ];
    for (key, value) in configuration {
        root.push_child(
            XmlElement::new("Configuration")
                .with_child(field("Key", key))
                .with_child(field("Value", value)),
        );
    }

    debug!("Encoded ANTX with {} layers and {} segments", layer_ids.len(), segment_count);
    root
}
