/*!
 * Tests for pre-encoding normalization of annotations
 */

use annoconv::annotation::fill_ends_backward;
use annoconv::{Annotation, Interval, Tier};

fn spans(tier: &Tier) -> Vec<(f64, f64)> {
    tier.intervals.iter().map(|i| (i.start, i.end)).collect()
}

#[test]
fn test_fillEndsBackward_withStartsOnly_shouldChainEnds() {
    let mut intervals = vec![
        Interval::point(1.0, "a"),
        Interval::point(4.0, "b"),
        Interval::point(7.5, "c"),
    ];

    fill_ends_backward(&mut intervals, 10.0);

    let ends: Vec<f64> = intervals.iter().map(|i| i.end).collect();
    assert_eq!(ends, vec![4.0, 7.5, 10.0]);
}

#[test]
fn test_prepareForIntervalTarget_withManyTiers_shouldMakeEveryTierContiguous() {
    let mut annotation = Annotation::new(
        8.0,
        vec![
            Tier::new("sparse", vec![Interval::new(1.0, 2.0, "x"), Interval::new(5.0, 6.0, "y")]),
            Tier::new("empty", Vec::new()),
            Tier::new("overrun", vec![Interval::new(7.0, 9.0, "z")]),
        ],
    );

    annotation.prepare_for_interval_target();

    assert_eq!(annotation.duration, 9.0);
    for tier in &annotation.tiers {
        assert_eq!(tier.intervals.first().unwrap().start, 0.0, "tier {}", tier.name);
        assert_eq!(tier.intervals.last().unwrap().end, 9.0, "tier {}", tier.name);
        for pair in tier.intervals.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "tier {}", tier.name);
        }
    }
    assert_eq!(spans(annotation.tier("empty").unwrap()), vec![(0.0, 9.0)]);
}

#[test]
fn test_prepareForSpanTarget_withPoints_shouldExtendToDuration() {
    let mut annotation = Annotation::new(
        12.0,
        vec![Tier::points(
            "marks",
            vec![Interval::point(2.0, "a"), Interval::point(5.0, "b"), Interval::point(9.0, "c")],
        )],
    );

    annotation.prepare_for_span_target(true);

    assert_eq!(spans(&annotation.tiers[0]), vec![(2.0, 5.0), (5.0, 9.0), (9.0, 12.0)]);
}
