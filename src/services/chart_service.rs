//! Donut chart for the dashboard, rendered server-side as SVG paths.
//!
//! Segments are drawn clockwise from 12 o'clock in list order. The ring keeps a
//! 50% cutout. Slice size is the absolute percentage so a negative entry still
//! gets a visible slice; zero entries only show up in the legend.

use std::f64::consts::{PI, TAU};

use crate::models::ParticipationRecord;
use crate::services::text::{format_participation_labels, format_percentage};

pub const VIEW_BOX_SIZE: f64 = 200.0;
const CENTER: f64 = VIEW_BOX_SIZE / 2.0;
const OUTER_RADIUS: f64 = 90.0;
const INNER_RADIUS: f64 = OUTER_RADIUS * 0.5;

const PALETTE: [&str; 10] = [
    "#2f80ed", "#27ae60", "#eb5757", "#f2994a", "#9b51e0", "#00b8d9", "#f2c94c", "#6d4c41",
    "#56ccf2", "#bb6bd9",
];

#[derive(Debug, Clone, PartialEq)]
pub struct DonutSegment {
    pub label: String,
    pub value_label: String,
    pub color: &'static str,
    /// Share of the ring, one decimal.
    pub share_label: String,
    pub has_arc: bool,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DonutChart {
    pub segments: Vec<DonutSegment>,
}

impl DonutChart {
    pub fn from_records(records: &[ParticipationRecord]) -> Self {
        let total: f64 = records.iter().map(|r| r.percentage.abs()).sum();

        let labels = format_participation_labels(records);

        let mut start = 0.0_f64;
        let segments = records
            .iter()
            .zip(labels)
            .enumerate()
            .map(|(idx, (record, label))| {
                let size = record.percentage.abs();
                let fraction = if total > 0.0 { size / total } else { 0.0 };
                let sweep = fraction * TAU;

                let path = if sweep > 0.0 {
                    ring_slice_path(start, start + sweep)
                } else {
                    String::new()
                };
                start += sweep;

                DonutSegment {
                    label,
                    value_label: format_percentage(record.percentage),
                    color: segment_color(idx),
                    share_label: format!("{:.1}%", fraction * 100.0),
                    has_arc: !path.is_empty(),
                    path,
                }
            })
            .collect();

        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn view_box(&self) -> String {
        format!("0 0 {} {}", VIEW_BOX_SIZE, VIEW_BOX_SIZE)
    }
}

pub fn segment_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

fn point(radius: f64, angle: f64) -> (f64, f64) {
    (
        CENTER + radius * angle.sin(),
        CENTER - radius * angle.cos(),
    )
}

fn ring_slice_path(start: f64, end: f64) -> String {
    let sweep = end - start;
    if sweep >= TAU - 1e-9 {
        return full_ring_path();
    }

    let large_arc = if sweep > PI { 1 } else { 0 };
    let (ox0, oy0) = point(OUTER_RADIUS, start);
    let (ox1, oy1) = point(OUTER_RADIUS, end);
    let (ix1, iy1) = point(INNER_RADIUS, end);
    let (ix0, iy0) = point(INNER_RADIUS, start);

    format!(
        "M {:.3} {:.3} A {r} {r} 0 {large} 1 {:.3} {:.3} L {:.3} {:.3} A {ir} {ir} 0 {large} 0 {:.3} {:.3} Z",
        ox0,
        oy0,
        ox1,
        oy1,
        ix1,
        iy1,
        ix0,
        iy0,
        r = OUTER_RADIUS,
        ir = INNER_RADIUS,
        large = large_arc,
    )
}

// An SVG arc cannot start and end on the same point, so a full ring is two halves
// per circle. The inner circle runs the other way to cut the hole.
fn full_ring_path() -> String {
    let top = CENTER - OUTER_RADIUS;
    let bottom = CENTER + OUTER_RADIUS;
    let inner_top = CENTER - INNER_RADIUS;
    let inner_bottom = CENTER + INNER_RADIUS;
    format!(
        "M {c} {top} A {r} {r} 0 1 1 {c} {bottom} A {r} {r} 0 1 1 {c} {top} Z \
         M {c} {inner_top} A {ir} {ir} 0 1 0 {c} {inner_bottom} A {ir} {ir} 0 1 0 {c} {inner_top} Z",
        c = CENTER,
        r = OUTER_RADIUS,
        ir = INNER_RADIUS,
    )
}
