use crate::data::model::{EventRecord, Label};

// ---------------------------------------------------------------------------
// Marker mapping: event fields → scatter marker
// ---------------------------------------------------------------------------

/// Marker shape, chosen from the primary label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Marker {
    Cross,
    Circle,
    Square,
}

pub const SIGNIFICANT_RADIUS: f32 = 6.0;
pub const DEFAULT_RADIUS: f32 = 3.0;

/// How one event is drawn. A pure function of the record's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerStyle {
    pub marker: Marker,
    pub significant: bool,
    /// Both classifiers agree on the label.
    pub highlighted: bool,
}

impl MarkerStyle {
    pub fn radius(&self) -> f32 {
        if self.significant {
            SIGNIFICANT_RADIUS
        } else {
            DEFAULT_RADIUS
        }
    }
}

pub fn marker_for(label: Label) -> Marker {
    match label {
        Label::Glitch => Marker::Cross,
        Label::Bbh => Marker::Circle,
        Label::Ns => Marker::Square,
        Label::Other => Marker::Circle,
    }
}

pub fn marker_style(record: &EventRecord) -> MarkerStyle {
    MarkerStyle {
        marker: marker_for(record.primary_label),
        significant: record.significance.is_high(),
        highlighted: record.labels_agree(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{DetectorSet, Significance};

    fn record(primary: Label, secondary: Label, significance: Significance) -> EventRecord {
        EventRecord {
            event_id: "S1".into(),
            primary_label: primary,
            secondary_label: secondary,
            significance,
            detectors: DetectorSet::new(),
            values: Vec::new(),
        }
    }

    #[test]
    fn shapes_follow_primary_label() {
        assert_eq!(marker_for(Label::Glitch), Marker::Cross);
        assert_eq!(marker_for(Label::Bbh), Marker::Circle);
        assert_eq!(marker_for(Label::Ns), Marker::Square);
        assert_eq!(marker_for(Label::Other), Marker::Circle);
    }

    #[test]
    fn size_and_highlight() {
        let agree = marker_style(&record(Label::Ns, Label::Ns, Significance::High));
        assert_eq!(agree.marker, Marker::Square);
        assert!(agree.highlighted);
        assert_eq!(agree.radius(), SIGNIFICANT_RADIUS);

        let disagree = marker_style(&record(Label::Glitch, Label::Bbh, Significance::Low));
        assert_eq!(disagree.marker, Marker::Cross);
        assert!(!disagree.highlighted);
        assert!(disagree.radius() < agree.radius());
    }
}
