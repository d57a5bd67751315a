//! Path recording
//!
//! While a path is open, line drawing is recorded here in device coordinates
//! instead of reaching the device.

use crate::error::{GdiError, GdiResult};
use crate::foundation::math::Point;

/// Kind of a recorded path vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathVertex {
    /// Starts a new figure
    MoveTo,
    /// Straight segment from the previous vertex
    LineTo,
    /// Straight segment that also closes the figure
    CloseFigure,
}

/// Whether a path is still accepting drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    /// Between `begin_path` and `end_path`
    Open,
    /// Ended and ready to be stroked or filled
    Closed,
}

/// A recorded path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    state: PathState,
    points: Vec<(Point, PathVertex)>,
    new_figure: bool,
}

impl Path {
    /// Start an empty open path
    pub fn open() -> Self {
        Self {
            state: PathState::Open,
            points: Vec::new(),
            new_figure: true,
        }
    }

    /// Current state
    pub fn state(&self) -> PathState {
        self.state
    }

    /// Whether drawing is being recorded
    pub fn is_open(&self) -> bool {
        self.state == PathState::Open
    }

    /// Recorded vertices
    pub fn points(&self) -> &[(Point, PathVertex)] {
        &self.points
    }

    /// Record a segment; a move is inserted when a new figure starts
    pub fn line_to(&mut self, from: Point, to: Point) -> GdiResult<()> {
        self.require_open()?;
        if self.new_figure {
            self.points.push((from, PathVertex::MoveTo));
            self.new_figure = false;
        }
        self.points.push((to, PathVertex::LineTo));
        Ok(())
    }

    /// Record a closed polygon
    pub fn polygon(&mut self, points: &[Point]) -> GdiResult<()> {
        self.require_open()?;
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };
        self.points.push((*first, PathVertex::MoveTo));
        self.points.extend(rest.iter().map(|p| (*p, PathVertex::LineTo)));
        self.close_figure()
    }

    /// Pen moved without drawing
    pub fn move_to(&mut self) {
        self.new_figure = true;
    }

    /// Close the current figure back to its starting point
    pub fn close_figure(&mut self) -> GdiResult<()> {
        self.require_open()?;
        match self.points.last_mut() {
            Some((_, vertex)) if *vertex == PathVertex::LineTo => *vertex = PathVertex::CloseFigure,
            _ => {}
        }
        self.new_figure = true;
        Ok(())
    }

    /// Stop recording
    pub fn end(&mut self) -> GdiResult<()> {
        self.require_open()?;
        self.state = PathState::Closed;
        Ok(())
    }

    fn require_open(&self) -> GdiResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(GdiError::invalid("no open path"))
        }
    }
}
