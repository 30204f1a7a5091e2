//! SVG preview serializer.
//!
//! Renders ordered stitch segments as an SVG document using the [`svg`]
//! crate for document construction, XML escaping, and path data
//! formatting.
//!
//! - Each segment becomes a `<path>` under `<g id="stitches">`.
//! - Each jump between consecutive segments becomes a dashed `<path>`
//!   under `<g id="jumps">`, so tour quality can be judged by eye.
//!
//! Coordinates stay in the pipeline's y-down millimetre space, which is
//! also SVG's. The `viewBox` is the stitch bounding box plus a margin.
//!
//! No I/O happens here; the caller decides where the `String` goes.

use svg::Document;
use svg::node::Text;
use svg::node::element::path::Data;
use svg::node::element::{Description, Group, Path, Title};

use stitchpath_pipeline::{Bounds, Point, StitchSegment};

/// Blank border around the stitches, in millimetres.
const MARGIN_MM: f64 = 2.0;

/// Metadata to embed in the SVG document.
///
/// Both fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the input file stem.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// Typically the pipeline parameters.
    pub description: Option<&'a str>,
}

/// Build an SVG path `d` attribute from a point run.
///
/// Uses `M` for the first point and `L` for subsequent points. Returns
/// `None` for runs with fewer than 2 points.
fn path_data(points: &[Point]) -> Option<Data> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut data = Data::new().move_to((first.x, first.y));
    for p in rest {
        data = data.line_to((p.x, p.y));
    }
    Some(data)
}

/// Serialize ordered stitch segments into an SVG preview.
///
/// Segments with fewer than 2 points draw nothing but still take part in
/// the jump lines.
///
/// # Examples
///
/// ```
/// use stitchpath_export::{SvgMetadata, to_svg};
/// use stitchpath_pipeline::{Point, StitchSegment};
///
/// let segments = vec![StitchSegment::new(vec![
///     Point::new(10.0, 15.0),
///     Point::new(12.5, 18.5),
/// ])];
/// let metadata = SvgMetadata {
///     title: Some("blink"),
///     description: None,
/// };
/// let svg = to_svg(&segments, &metadata);
/// assert!(svg.contains("<title>blink</title>"));
/// assert!(svg.contains("M10,15 L12.5,18.5"));
/// ```
#[must_use]
pub fn to_svg(segments: &[StitchSegment], metadata: &SvgMetadata<'_>) -> String {
    let bounds = Bounds::of(segments).unwrap_or(Bounds {
        min: Point::default(),
        max: Point::default(),
    });
    let x = bounds.min.x - MARGIN_MM;
    let y = bounds.min.y - MARGIN_MM;
    let width = 2.0f64.mul_add(MARGIN_MM, bounds.width());
    let height = 2.0f64.mul_add(MARGIN_MM, bounds.height());

    let mut doc = Document::new()
        .set("width", format!("{width}mm"))
        .set("height", format!("{height}mm"))
        .set("viewBox", format!("{x} {y} {width} {height}"));

    // Optional <title> element
    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    // Optional <desc> element
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    let mut stitches = Group::new()
        .set("id", "stitches")
        .set("fill", "none")
        .set("stroke", "black")
        .set("stroke-width", "0.2")
        .set("stroke-linejoin", "round");
    for data in segments.iter().filter_map(|s| path_data(s.points())) {
        stitches = stitches.add(Path::new().set("d", data));
    }
    doc = doc.add(stitches);

    let mut jumps = Group::new()
        .set("id", "jumps")
        .set("fill", "none")
        .set("stroke", "red")
        .set("stroke-width", "0.1")
        .set("stroke-dasharray", "0.5 0.5");
    let ends = segments.iter().filter_map(|s| Some((*s.first()?, *s.last()?)));
    let mut previous_back: Option<Point> = None;
    for (front, back) in ends {
        if let Some(from) = previous_back
            && let Some(data) = path_data(&[from, front])
        {
            jumps = jumps.add(Path::new().set("d", data));
        }
        previous_back = Some(back);
    }
    doc = doc.add(jumps);

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
