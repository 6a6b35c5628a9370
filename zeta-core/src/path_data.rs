//! SVG-style path instruction strings (`M x y L x y ... Z`).
//!
//! The projector builds [`PathData`] for polylines and rectangles; raster
//! backends parse the string form back with [`parse_path_data`].
use std::fmt;

use nom::{
    branch::alt,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt},
    multi::many0,
    number::complete::double,
    sequence::{pair, preceded, terminated},
    IResult,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Close,
}

/// Ordered move/line/close instructions in pixel coordinates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    commands: Vec<PathCommand>,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    /// Starts the path at the first point and continues it with lines afterwards.
    pub fn push_point(&mut self, x: f64, y: f64) {
        if self.commands.is_empty() {
            self.commands.push(PathCommand::MoveTo(x, y));
        } else {
            self.commands.push(PathCommand::LineTo(x, y));
        }
    }

    pub fn close(&mut self) {
        if !self.commands.is_empty() {
            self.commands.push(PathCommand::Close);
        }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Line segments in drawing order, including the closing segment.
    pub fn segments(&self) -> Vec<((f64, f64), (f64, f64))> {
        let mut segments = Vec::new();
        let mut start = None;
        let mut current = None;
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(x, y) => {
                    start = Some((x, y));
                    current = Some((x, y));
                }
                PathCommand::LineTo(x, y) => {
                    if let Some(from) = current {
                        segments.push((from, (x, y)));
                    }
                    current = Some((x, y));
                }
                PathCommand::Close => {
                    if let (Some(from), Some(to)) = (current, start) {
                        if from != to {
                            segments.push((from, to));
                        }
                    }
                    current = start;
                }
            }
        }
        segments
    }
}

impl fmt::Display for PathData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match command {
                PathCommand::MoveTo(x, y) => write!(f, "M{x:.2} {y:.2}")?,
                PathCommand::LineTo(x, y) => write!(f, "L{x:.2} {y:.2}")?,
                PathCommand::Close => f.write_str("Z")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("invalid path data near: {remaining:?}")]
pub struct PathDataError {
    pub remaining: String,
}

/// Parse a path string as produced by [`PathData`]'s `Display`
pub fn parse_path_data(input: &str) -> Result<PathData, PathDataError> {
    match all_consuming(terminated(many0(parse_command), multispace0))(input) {
        Ok((_, commands)) => Ok(PathData { commands }),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(PathDataError {
            remaining: e.input.chars().take(16).collect(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(PathDataError {
            remaining: String::new(),
        }),
    }
}

fn parse_command(input: &str) -> IResult<&str, PathCommand> {
    preceded(
        multispace0,
        alt((
            map(preceded(char('M'), parse_coord), |(x, y)| PathCommand::MoveTo(x, y)),
            map(preceded(char('L'), parse_coord), |(x, y)| PathCommand::LineTo(x, y)),
            map(alt((char('Z'), char('z'))), |_| PathCommand::Close),
        )),
    )(input)
}

fn parse_coord(input: &str) -> IResult<&str, (f64, f64)> {
    pair(
        preceded(multispace0, double),
        preceded(pair(multispace0, opt(char(','))), preceded(multispace0, double)),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let mut path = PathData::new();
        path.push_point(10.0, 20.0);
        path.push_point(30.5, -4.25);
        path.close();

        let text = path.to_string();
        assert_eq!(text, "M10.00 20.00 L30.50 -4.25 Z");
        assert_eq!(parse_path_data(&text).unwrap(), path);
    }

    #[test]
    fn test_parse_loose_formatting() {
        let path = parse_path_data("M1 2 L3,4 L 5 6 z ").unwrap();
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(1.0, 2.0),
                PathCommand::LineTo(3.0, 4.0),
                PathCommand::LineTo(5.0, 6.0),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_path_data("M1 2 Q3 4").is_err());
        assert!(parse_path_data("").unwrap().is_empty());
    }

    #[test]
    fn test_segments_include_closing_edge() {
        let path = parse_path_data("M0 0 L4 0 L4 3 Z").unwrap();
        let segments = path.segments();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2], ((4.0, 3.0), (0.0, 0.0)));
    }

    #[test]
    fn test_close_on_empty_is_noop() {
        let mut path = PathData::new();
        path.close();
        assert!(path.is_empty());
        assert_eq!(path.to_string(), "");
    }
}
