/*!
 * ELAN annotation format (EAF 3.0 subset).
 *
 * Time-aligned annotations reference the global `TIME_ORDER` slot table;
 * referring annotations carry no time of their own and split their parent's
 * span equally among siblings of the same tier. Referring chains are resolved
 * with an id-keyed table and a worklist so arbitrarily deep (or cyclic)
 * chains never recurse.
 */

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use chrono::Local;
use log::{debug, warn};
use uuid::Uuid;

use crate::annotation::{Annotation, Interval, Tier};
use crate::app_config::ConversionOptions;
use crate::errors::{ConversionError, ConversionWarning};
use crate::formats::{parse_number, DecodeContext, Decoded, MediaReference};
use crate::xml::XmlElement;

const LINGUISTIC_TYPE_ID: &str = "default-lt";

const CONSTRAINTS: [(&str, &str); 4] = [
    (
        "Time_Subdivision",
        "Time subdivision of parent annotation's time interval, no time gaps allowed within this interval",
    ),
    (
        "Symbolic_Subdivision",
        "Symbolic subdivision of a parent annotation. Annotations refering to the same parent are ordered",
    ),
    ("Symbolic_Association", "1-1 association with a parent annotation"),
    (
        "Included_In",
        "Time alignable annotations within the parent annotation's time interval, gaps are allowed",
    ),
];

#[derive(Debug, Clone)]
enum Anchor {
    Aligned { start: f64, end: f64 },
    Referring { parent: String },
}

#[derive(Debug, Clone)]
struct Entry {
    // @field: Index of the owning tier
    tier: usize,
    id: String,
    anchor: Anchor,
    text: String,
}

/// Decode an EAF document
pub fn decode(content: &str, context: &DecodeContext) -> Result<Decoded, ConversionError> {
    let root = XmlElement::parse(content)?;

    let time_order = root
        .child("TIME_ORDER")
        .ok_or_else(|| ConversionError::MalformedInput("EAF document has no TIME_ORDER".to_string()))?;
    let slots = slot_table(time_order)?;

    let mut tier_names = Vec::new();
    let mut entries = Vec::new();
    for (tier_index, tier) in root.children_named("TIER").enumerate() {
        tier_names.push(tier.attr("TIER_ID").unwrap_or_default().to_string());
        for wrapper in tier.children_named("ANNOTATION") {
            for annotation in wrapper.elements() {
                entries.push(read_entry(annotation, tier_index, &slots)?);
            }
        }
    }

    let spans = resolve_spans(&entries)?;

    let mut tiers: Vec<Tier> = tier_names.into_iter().map(|name| Tier::new(name, Vec::new())).collect();
    for (entry, (start, end)) in entries.into_iter().zip(spans) {
        tiers[entry.tier].intervals.push(Interval::new(start, end, entry.text));
    }

    let slot_max = slots.values().copied().fold(0.0, f64::max);
    let fallback = slot_max.max(context.options.eaf_min_duration);
    let mut warnings = Vec::new();

    let media = root
        .child("HEADER")
        .and_then(|header| header.child("MEDIA_DESCRIPTOR"))
        .map(|descriptor| MediaReference {
            url: descriptor.attr("MEDIA_URL").map(str::to_string),
            relative_url: descriptor.attr("RELATIVE_MEDIA_URL").map(str::to_string),
        });

    let duration = match media {
        Some(media) => match context.media_probe.duration_secs(&media) {
            Ok(duration) => {
                debug!("Using media duration {}s from {}", duration, media.describe());
                duration
            }
            Err(e) => {
                let warning = ConversionWarning::MissingMedia {
                    media: media.describe(),
                    reason: format!("{:#}", e),
                    fallback_secs: fallback,
                };
                warn!("{}", warning);
                warnings.push(warning);
                fallback
            }
        },
        None => fallback,
    };

    Ok(Decoded {
        annotation: Annotation::new(duration, tiers),
        warnings,
    })
}

// @returns: Slot id to time in seconds, unaligned slots interpolated
fn slot_table(time_order: &XmlElement) -> Result<HashMap<String, f64>, ConversionError> {
    let mut ids = Vec::new();
    let mut values = Vec::new();
    for slot in time_order.children_named("TIME_SLOT") {
        let id = slot
            .attr("TIME_SLOT_ID")
            .ok_or_else(|| ConversionError::MalformedInput("TIME_SLOT without TIME_SLOT_ID".to_string()))?;
        let value = slot
            .attr("TIME_VALUE")
            .map(|v| parse_number(v, "TIME_VALUE"))
            .transpose()?;
        ids.push(id.to_string());
        values.push(value);
    }

    let filled = interpolate_unaligned(&values);
    Ok(ids.into_iter().zip(filled).map(|(id, ms)| (id, ms / 1000.0)).collect())
}

/// Fill missing values linearly between the nearest known neighbours
fn interpolate_unaligned(values: &[Option<f64>]) -> Vec<f64> {
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();

    (0..values.len())
        .map(|i| {
            if let Some(v) = values[i] {
                return v;
            }
            let before = known.iter().rev().find(|(k, _)| *k < i);
            let after = known.iter().find(|(k, _)| *k > i);
            match (before, after) {
                (Some(&(ia, a)), Some(&(ib, b))) => a + (b - a) * (i - ia) as f64 / (ib - ia) as f64,
                (Some(&(_, v)), None) | (None, Some(&(_, v))) => v,
                (None, None) => 0.0,
            }
        })
        .collect()
}

fn read_entry(element: &XmlElement, tier: usize, slots: &HashMap<String, f64>) -> Result<Entry, ConversionError> {
    let id = element.attr("ANNOTATION_ID").unwrap_or_default().to_string();
    let text = element.child_text("ANNOTATION_VALUE").unwrap_or_default();

    let anchor = match element.name.as_str() {
        "ALIGNABLE_ANNOTATION" => {
            let slot = |key: &str| -> Result<f64, ConversionError> {
                let reference = element.attr(key).ok_or_else(|| {
                    ConversionError::MalformedInput(format!("annotation '{}' has no {}", id, key))
                })?;
                slots.get(reference).copied().ok_or_else(|| {
                    ConversionError::MalformedInput(format!(
                        "annotation '{}' references unknown time slot '{}'",
                        id, reference
                    ))
                })
            };
            Anchor::Aligned {
                start: slot("TIME_SLOT_REF1")?,
                end: slot("TIME_SLOT_REF2")?,
            }
        }
        "REF_ANNOTATION" => {
            let parent = element.attr("ANNOTATION_REF").ok_or_else(|| {
                ConversionError::MalformedInput(format!("referring annotation '{}' has no ANNOTATION_REF", id))
            })?;
            Anchor::Referring {
                parent: parent.to_string(),
            }
        }
        other => {
            return Err(ConversionError::MalformedInput(format!(
                "unexpected annotation element '{}'",
                other
            )))
        }
    };

    Ok(Entry { tier, id, anchor, text })
}

/// Resolve every entry to a `(start, end)` span.
///
/// Aligned entries seed the worklist. Popping a resolved entry splits its span
/// among each group of children (one group per referring tier) and enqueues
/// them in turn.
fn resolve_spans(entries: &[Entry]) -> Result<Vec<(f64, f64)>, ConversionError> {
    let mut by_id: HashMap<&str, usize> = HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        by_id.insert(entry.id.as_str(), i);
    }

    // Children grouped per (parent id, tier), groups and members in document order
    let mut groups: HashMap<&str, Vec<(usize, Vec<usize>)>> = HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        if let Anchor::Referring { parent } = &entry.anchor {
            let parent_groups = groups.entry(parent.as_str()).or_default();
            match parent_groups.iter_mut().find(|(tier, _)| *tier == entry.tier) {
                Some((_, members)) => members.push(i),
                None => parent_groups.push((entry.tier, vec![i])),
            }
        }
    }

    let mut spans: Vec<Option<(f64, f64)>> = vec![None; entries.len()];
    let mut worklist = VecDeque::new();
    for (i, entry) in entries.iter().enumerate() {
        if let Anchor::Aligned { start, end } = entry.anchor {
            spans[i] = Some((start, end));
            worklist.push_back(i);
        }
    }

    while let Some(parent) = worklist.pop_front() {
        let Some((start, end)) = spans[parent] else { continue };
        let Some(children) = groups.get(entries[parent].id.as_str()) else { continue };

        for (_, members) in children {
            let count = members.len();
            // Shared boundaries come from the same expression so siblings stay contiguous
            let boundary = |j: usize| if j == count { end } else { start + (end - start) * j as f64 / count as f64 };
            for (j, &child) in members.iter().enumerate() {
                if spans[child].is_none() {
                    spans[child] = Some((boundary(j), boundary(j + 1)));
                    worklist.push_back(child);
                }
            }
        }
    }

    if let Some(unresolved) = spans.iter().position(Option::is_none) {
        return Err(diagnose_unresolved(entries, &by_id, unresolved));
    }

    Ok(spans.into_iter().flatten().collect())
}

fn diagnose_unresolved(entries: &[Entry], by_id: &HashMap<&str, usize>, start: usize) -> ConversionError {
    let mut visited = HashSet::new();
    let mut current = start;

    loop {
        visited.insert(current);
        let Anchor::Referring { parent } = &entries[current].anchor else {
            break;
        };
        match by_id.get(parent.as_str()) {
            None => {
                return ConversionError::MalformedInput(format!(
                    "annotation '{}' references unknown annotation '{}'",
                    entries[current].id, parent
                ))
            }
            Some(&next) if visited.contains(&next) => {
                return ConversionError::MalformedInput(format!(
                    "referring annotation cycle through '{}'",
                    entries[next].id
                ))
            }
            Some(&next) => current = next,
        }
    }

    ConversionError::MalformedInput(format!(
        "annotation '{}' could not be aligned",
        entries[start].id
    ))
}

fn to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// Encode an annotation as an EAF document tree
pub fn encode(annotation: &Annotation, options: &ConversionOptions) -> XmlElement {
    let exported: Vec<(&str, Vec<&Interval>)> = annotation
        .tiers
        .iter()
        .map(|tier| {
            let intervals = tier
                .intervals
                .iter()
                .filter(|i| options.include_empty || i.has_text())
                .collect();
            (tier.name.as_str(), intervals)
        })
        .collect();

    let times: BTreeSet<i64> = exported
        .iter()
        .flat_map(|(_, intervals)| intervals.iter().flat_map(|i| [to_ms(i.start), to_ms(i.end)]))
        .collect();
    let slot_ids: HashMap<i64, String> = times
        .iter()
        .enumerate()
        .map(|(i, ms)| (*ms, format!("ts{}", i + 1)))
        .collect();

    let mut time_order = XmlElement::new("TIME_ORDER");
    for ms in &times {
        time_order.push_child(
            XmlElement::new("TIME_SLOT")
                .with_attr("TIME_SLOT_ID", slot_ids[ms].as_str())
                .with_attr("TIME_VALUE", ms.to_string()),
        );
    }

    let mut annotation_count = 0;
    let mut tiers = Vec::with_capacity(exported.len());
    for (name, intervals) in &exported {
        let mut tier = XmlElement::new("TIER")
            .with_attr("LINGUISTIC_TYPE_REF", LINGUISTIC_TYPE_ID)
            .with_attr("TIER_ID", *name);
        for interval in intervals {
            annotation_count += 1;
            let aligned = XmlElement::new("ALIGNABLE_ANNOTATION")
                .with_attr("ANNOTATION_ID", format!("a{}", annotation_count))
                .with_attr("TIME_SLOT_REF1", slot_ids[&to_ms(interval.start)].as_str())
                .with_attr("TIME_SLOT_REF2", slot_ids[&to_ms(interval.end)].as_str())
                .with_child(XmlElement::new("ANNOTATION_VALUE").with_text(interval.text.as_str()));
            tier.push_child(XmlElement::new("ANNOTATION").with_child(aligned));
        }
        tiers.push(tier);
    }

    let header = XmlElement::new("HEADER")
        .with_attr("MEDIA_FILE", "")
        .with_attr("TIME_UNITS", "milliseconds")
        .with_child(
            XmlElement::new("PROPERTY")
                .with_attr("NAME", "URN")
                .with_text(format!("urn:nl-mpi-tools-elan-eaf:{}", Uuid::new_v4())),
        )
        .with_child(
            XmlElement::new("PROPERTY")
                .with_attr("NAME", "lastUsedAnnotationId")
                .with_text(annotation_count.to_string()),
        );

    let mut root = XmlElement::new("ANNOTATION_DOCUMENT")
        .with_attr("AUTHOR", "")
        .with_attr("DATE", Local::now().format("%Y-%m-%dT%H:%M:%S%:z").to_string())
        .with_attr("FORMAT", "3.0")
        .with_attr("VERSION", "3.0")
        .with_attr("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance")
        .with_attr("xsi:noNamespaceSchemaLocation", "http://www.mpi.nl/tools/elan/EAFv3.0.xsd")
        .with_child(header)
        .with_child(time_order);

    for tier in tiers {
        root.push_child(tier);
    }

    root.push_child(
        XmlElement::new("LINGUISTIC_TYPE")
            .with_attr("GRAPHIC_REFERENCES", "false")
            .with_attr("LINGUISTIC_TYPE_ID", LINGUISTIC_TYPE_ID)
            .with_attr("TIME_ALIGNABLE", "true"),
    );
    for (stereotype, description) in CONSTRAINTS {
        root.push_child(
            XmlElement::new("CONSTRAINT")
                .with_attr("DESCRIPTION", description)
                .with_attr("STEREOTYPE", stereotype),
        );
    }

    debug!("Encoded EAF with {} time slots and {} annotations", times.len(), annotation_count);
    root
}
