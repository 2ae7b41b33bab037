//! SVG path data → path commands, polygons and editable vertices.
//!
//! Built on `winnow` 0.7. Supports the subset territories are authored in:
//! `M`, `L`, `C`, `Q`, `Z` (uppercase absolute, lowercase relative), with
//! numbers separated by whitespace and/or commas and implicit command
//! repetition (`L 1 2 3 4` is two line segments).

use crate::model::{ControlPoints, HandleKind, Point, Vertex};
use winnow::ascii::{float, multispace0};
use winnow::combinator::{opt, preceded, repeat, terminated};
use winnow::prelude::*;
use winnow::token::one_of;

/// A single absolute path command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),         // control, end
    CubicTo(Point, Point, Point), // c1, c2, end
    Close,
}

impl PathCmd {
    /// The on-curve end point of the command, if it has one.
    pub fn end_point(&self) -> Option<Point> {
        match self {
            PathCmd::MoveTo(p) | PathCmd::LineTo(p) => Some(*p),
            PathCmd::QuadTo(_, p) | PathCmd::CubicTo(_, _, p) => Some(*p),
            PathCmd::Close => None,
        }
    }

    fn translated(self, d: Point) -> Self {
        match self {
            PathCmd::MoveTo(p) => PathCmd::MoveTo(p + d),
            PathCmd::LineTo(p) => PathCmd::LineTo(p + d),
            PathCmd::QuadTo(c, p) => PathCmd::QuadTo(c + d, p + d),
            PathCmd::CubicTo(c1, c2, p) => PathCmd::CubicTo(c1 + d, c2 + d, p + d),
            PathCmd::Close => PathCmd::Close,
        }
    }
}

type RawSegment = (char, Vec<f64>);

// ─── Parsing ─────────────────────────────────────────────────────────────

/// Parse SVG path data into absolute commands.
///
/// # Errors
/// Returns a message when the data contains unknown commands, stray
/// characters, or argument counts that don't fit the command.
pub fn parse_path(input: &str) -> Result<Vec<PathCmd>, String> {
    let segments: Vec<RawSegment> = terminated(repeat(0.., parse_segment), multispace0)
        .parse(input)
        .map_err(|e| format!("Path parse error: {e}"))?;
    absolutize(&segments)
}

fn parse_segment(input: &mut &str) -> ModalResult<RawSegment> {
    let letter = preceded(
        multispace0,
        one_of(['M', 'm', 'L', 'l', 'C', 'c', 'Q', 'q', 'Z', 'z']),
    )
    .parse_next(input)?;
    let args: Vec<f64> = repeat(0.., parse_number).parse_next(input)?;
    Ok((letter, args))
}

fn parse_number(input: &mut &str) -> ModalResult<f64> {
    preceded((multispace0, opt(','), multispace0), float).parse_next(input)
}

fn absolutize(segments: &[RawSegment]) -> Result<Vec<PathCmd>, String> {
    let mut cmds = Vec::with_capacity(segments.len());
    let mut cursor = Point::ZERO;
    let mut subpath_start = Point::ZERO;

    for (letter, args) in segments {
        let relative = letter.is_ascii_lowercase();
        let arity = match letter.to_ascii_uppercase() {
            'M' | 'L' => 2,
            'Q' => 4,
            'C' => 6,
            _ => 0,
        };

        if arity == 0 {
            if !args.is_empty() {
                return Err(format!("'{letter}' takes no arguments"));
            }
            cmds.push(PathCmd::Close);
            cursor = subpath_start;
            continue;
        }
        if args.is_empty() || args.len() % arity != 0 {
            return Err(format!(
                "'{letter}' expects a multiple of {arity} numbers, got {}",
                args.len()
            ));
        }

        for (i, group) in args.chunks(arity).enumerate() {
            let origin = if relative { cursor } else { Point::ZERO };
            let pt = |j: usize| Point::new(group[j], group[j + 1]) + origin;
            let cmd = match letter.to_ascii_uppercase() {
                // Extra coordinate pairs after a moveto are implicit linetos.
                'M' if i == 0 => PathCmd::MoveTo(pt(0)),
                'M' | 'L' => PathCmd::LineTo(pt(0)),
                'Q' => PathCmd::QuadTo(pt(0), pt(2)),
                _ => PathCmd::CubicTo(pt(0), pt(2), pt(4)),
            };
            if let PathCmd::MoveTo(p) = cmd {
                subpath_start = p;
            }
            if let Some(end) = cmd.end_point() {
                cursor = end;
            }
            cmds.push(cmd);
        }
    }
    Ok(cmds)
}

// ─── Conversions ─────────────────────────────────────────────────────────

/// Polygon approximation of a path: one vertex per command end point.
/// Curve interiors are not tessellated. Malformed data yields an empty list.
pub fn path_to_polygon(path: &str) -> Vec<Point> {
    match parse_path(path) {
        Ok(cmds) => cmds.iter().filter_map(PathCmd::end_point).collect(),
        Err(e) => {
            log::trace!("path_to_polygon: {e}");
            Vec::new()
        }
    }
}

/// Editable vertex list of a path. Curve control points become the
/// `out` handle of the segment start and the `in` handle of its end.
/// An explicit closing segment back onto the first vertex is folded into it.
pub fn path_to_vertices(path: &str) -> Vec<Vertex> {
    let cmds = match parse_path(path) {
        Ok(cmds) => cmds,
        Err(e) => {
            log::trace!("path_to_vertices: {e}");
            return Vec::new();
        }
    };

    let mut vertices: Vec<Vertex> = Vec::with_capacity(cmds.len());
    for cmd in cmds {
        match cmd {
            PathCmd::MoveTo(p) | PathCmd::LineTo(p) => vertices.push(Vertex::corner(p)),
            PathCmd::QuadTo(c, p) => push_curve(&mut vertices, c, c, p),
            PathCmd::CubicTo(c1, c2, p) => push_curve(&mut vertices, c1, c2, p),
            PathCmd::Close => {}
        }
    }

    if vertices.len() > 1 {
        let (first, last) = (vertices[0], vertices[vertices.len() - 1]);
        if first.point() == last.point() {
            vertices.pop();
            if let Some(handle_in) = last.handle(HandleKind::In) {
                vertices[0].control_points.get_or_insert_with(ControlPoints::default).handle_in =
                    Some(handle_in);
            }
        }
    }
    vertices
}

fn push_curve(vertices: &mut Vec<Vertex>, out: Point, handle_in: Point, end: Point) {
    if let Some(prev) = vertices.last_mut() {
        prev.control_points
            .get_or_insert_with(ControlPoints::default)
            .handle_out = Some(out);
    }
    vertices.push(Vertex {
        x: end.x,
        y: end.y,
        control_points: Some(ControlPoints {
            handle_in: Some(handle_in),
            handle_out: None,
        }),
    });
}

/// Emit a closed path through `vertices`. Segments touching a handle become
/// cubic curves; a missing handle falls back to its anchor point.
pub fn vertices_to_path(vertices: &[Vertex]) -> String {
    let Some(first) = vertices.first() else {
        return String::new();
    };
    let mut cmds = vec![PathCmd::MoveTo(first.point())];
    let n = vertices.len();
    for i in 1..=n {
        let from = &vertices[i - 1];
        let to = &vertices[i % n];
        let curved = from.handle(HandleKind::Out).is_some()
            || to.handle(HandleKind::In).is_some();
        if i == n && !curved {
            break;
        }
        if curved {
            cmds.push(PathCmd::CubicTo(
                from.handle(HandleKind::Out)
                    .unwrap_or(from.point()),
                to.handle(HandleKind::In).unwrap_or(to.point()),
                to.point(),
            ));
        } else {
            cmds.push(PathCmd::LineTo(to.point()));
        }
    }
    cmds.push(PathCmd::Close);
    commands_to_string(&cmds)
}

/// Shift every coordinate of a path. Unparseable data is returned untouched.
pub fn translate_path(path: &str, delta: Point) -> String {
    match parse_path(path) {
        Ok(cmds) => {
            let moved: Vec<PathCmd> = cmds.into_iter().map(|c| c.translated(delta)).collect();
            commands_to_string(&moved)
        }
        Err(e) => {
            log::debug!("translate_path: leaving path unchanged ({e})");
            path.to_string()
        }
    }
}

/// Canonical text form: absolute commands, space separated.
pub fn commands_to_string(cmds: &[PathCmd]) -> String {
    let mut out = String::new();
    for cmd in cmds {
        if !out.is_empty() {
            out.push(' ');
        }
        match cmd {
            PathCmd::MoveTo(p) => out.push_str(&format!("M {}", format_point(*p))),
            PathCmd::LineTo(p) => out.push_str(&format!("L {}", format_point(*p))),
            PathCmd::QuadTo(c, p) => {
                out.push_str(&format!("Q {} {}", format_point(*c), format_point(*p)));
            }
            PathCmd::CubicTo(c1, c2, p) => out.push_str(&format!(
                "C {} {} {}",
                format_point(*c1),
                format_point(*c2),
                format_point(*p)
            )),
            PathCmd::Close => out.push('Z'),
        }
    }
    out
}

fn format_point(p: Point) -> String {
    format!("{} {}", format_num(p.x), format_num(p.y))
}

fn format_num(n: f64) -> String {
    if n == n.floor() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n:.3}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_absolute_commands() {
        let cmds = parse_path("M 0 0 L 10 0 Q 15 5 10 10 C 8 12, 2 12, 0 10 Z").unwrap();
        assert_eq!(cmds.len(), 5);
        assert_eq!(cmds[0], PathCmd::MoveTo(Point::new(0.0, 0.0)));
        assert_eq!(
            cmds[2],
            PathCmd::QuadTo(Point::new(15.0, 5.0), Point::new(10.0, 10.0))
        );
        assert_eq!(cmds[4], PathCmd::Close);
    }

    #[test]
    fn parse_relative_and_implicit_repeats() {
        let cmds = parse_path("m 10 10 l 5 0 0 5 z").unwrap();
        assert_eq!(
            cmds,
            vec![
                PathCmd::MoveTo(Point::new(10.0, 10.0)),
                PathCmd::LineTo(Point::new(15.0, 10.0)),
                PathCmd::LineTo(Point::new(15.0, 15.0)),
                PathCmd::Close,
            ]
        );
    }

    #[test]
    fn parse_compact_numbers() {
        let cmds = parse_path("M-1.5,2e1L3-4").unwrap();
        assert_eq!(cmds[0], PathCmd::MoveTo(Point::new(-1.5, 20.0)));
        assert_eq!(cmds[1], PathCmd::LineTo(Point::new(3.0, -4.0)));
    }

    #[test]
    fn malformed_paths_are_errors() {
        assert!(parse_path("M 0").is_err());
        assert!(parse_path("X 1 2").is_err());
        assert!(parse_path("M 0 0 L 1 2 3").is_err());
        assert!(parse_path("Z 4").is_err());
    }

    #[test]
    fn polygon_takes_curve_endpoints_only() {
        let poly = path_to_polygon("M 0 0 C 5 -5 10 -5 10 0 L 10 10 Z");
        assert_eq!(
            poly,
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0)
            ]
        );
    }

    #[test]
    fn polygon_of_bad_data_is_empty() {
        assert!(path_to_polygon("").is_empty());
        assert!(path_to_polygon("M 1 oops").is_empty());
    }

    #[test]
    fn vertices_capture_handles() {
        let v = path_to_vertices("M 0 0 C 2 -2 8 -2 10 0 L 10 10 Z");
        assert_eq!(v.len(), 3);
        assert_eq!(v[0].handle(HandleKind::Out), Some(Point::new(2.0, -2.0)));
        assert_eq!(v[1].handle(HandleKind::In), Some(Point::new(8.0, -2.0)));
        assert!(!v[2].is_bezier());
    }

    #[test]
    fn closing_vertex_is_folded_into_first() {
        let v = path_to_vertices("M 0 0 L 10 0 L 10 10 L 0 0 Z");
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn vertices_emit_back_to_path() {
        let path = "M 0 0 L 10 0 L 10 10 Z";
        assert_eq!(vertices_to_path(&path_to_vertices(path)), path);

        let curved = "M 0 0 C 2 -2 8 -2 10 0 L 10 10 Z";
        assert_eq!(vertices_to_path(&path_to_vertices(curved)), curved);
    }

    #[test]
    fn translate_moves_every_coordinate() {
        let moved = translate_path("M 0 0 Q 5 5 10 0 Z", Point::new(1.5, -2.0));
        assert_eq!(moved, "M 1.5 -2 Q 6.5 3 11.5 -2 Z");
        assert_eq!(translate_path("garbage", Point::new(1.0, 1.0)), "garbage");
    }
}
