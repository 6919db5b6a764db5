use super::*;

use crate::config::DecorationConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decoration {
    HorizontalRule { x0: f64, x1: f64, y: f64 },
    VerticalRule { x: f64, y0: f64, y1: f64 },
    Box { bbox: BoundingBox },
    Polyline { points: Vec<[f64; 2]> },
}

impl Decoration {
    fn to_element(&self) -> Element {
        let mut element = Element::new(ElementKind::Div);
        match self {
            Self::HorizontalRule { x0, x1, y } => {
                element.set_attr("class", "hrule");
                element.set_attr("x0", format!("{}", round_to(*x0, 2)));
                element.set_attr("x1", format!("{}", round_to(*x1, 2)));
                element.set_attr("y0", format!("{}", round_to(*y, 2)));
            }
            Self::VerticalRule { x, y0, y1 } => {
                element.set_attr("class", "vrule");
                element.set_attr("x0", format!("{}", round_to(*x, 2)));
                element.set_attr("y0", format!("{}", round_to(*y0, 2)));
                element.set_attr("y1", format!("{}", round_to(*y1, 2)));
            }
            Self::Box { bbox } => {
                element.set_attr("class", "box");
                element.set_attr("x0", format!("{}", round_to(bbox.x0, 2)));
                element.set_attr("x1", format!("{}", round_to(bbox.x1, 2)));
                element.set_attr("y0", format!("{}", round_to(bbox.y0, 2)));
                element.set_attr("y1", format!("{}", round_to(bbox.y1, 2)));
            }
            Self::Polyline { points } => {
                element.set_attr("class", "polyline");
                let encoded = points
                    .iter()
                    .map(|[x, y]| format!("{},{}", round_to(*x, 2), round_to(*y, 2)))
                    .collect::<Vec<_>>()
                    .join(" ");
                element.set_attr("points", encoded);
            }
        }
        element
    }
}

pub fn convert_rects(rects: &[RectRecord], config: &DecorationConfig) -> Vec<Decoration> {
    rects
        .iter()
        .map(|rect| {
            let bbox = BoundingBox::new(
                rect.x0,
                rect.y0,
                rect.x0 + rect.width,
                rect.y0 + rect.height,
            );
            if bbox.height() < config.max_thickness && bbox.width() >= bbox.height() {
                Decoration::HorizontalRule {
                    x0: bbox.x0,
                    x1: bbox.x1,
                    y: (bbox.y0 + bbox.y1) / 2.0,
                }
            } else if bbox.width() < config.max_thickness {
                Decoration::VerticalRule {
                    x: (bbox.x0 + bbox.x1) / 2.0,
                    y0: bbox.y0,
                    y1: bbox.y1,
                }
            } else {
                Decoration::Box { bbox }
            }
        })
        .collect()
}

pub fn convert_curves(curves: &[CurveRecord], config: &DecorationConfig) -> Vec<Decoration> {
    if curves.len() > config.max_curves {
        warn!(
            curves = curves.len(),
            max = config.max_curves,
            "too many curves, truncating"
        );
    }
    curves
        .iter()
        .take(config.max_curves)
        .filter(|curve| curve.points.len() >= 2)
        .map(|curve| Decoration::Polyline {
            points: curve
                .points
                .iter()
                .take(config.max_curve_points)
                .copied()
                .collect(),
        })
        .collect()
}

pub fn decorations_element(decorations: &[Decoration]) -> Option<Element> {
    if decorations.is_empty() {
        return None;
    }
    let mut container = Element::new(ElementKind::Div);
    container.set_attr("class", "decorations");
    for decoration in decorations {
        container.push(decoration.to_element());
    }
    Some(container)
}
