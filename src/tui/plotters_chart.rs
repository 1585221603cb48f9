//! Plotters-powered diagnostic chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - histogram bars are plain rectangles
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A line series with its color.
pub struct ChartLine<'a> {
    pub points: &'a [(f64, f64)],
    pub color: RGBColor,
}

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call, so `render()`
/// only draws.
pub struct DiagnosticChart<'a> {
    /// Histogram bars as `(left edge, right edge, height)`.
    pub bars: &'a [(f64, f64, f64)],
    /// Outlined boxes as `(x0, y0, x1, y1)` (boxplot body).
    pub boxes: &'a [(f64, f64, f64, f64)],
    pub lines: Vec<ChartLine<'a>>,
    /// Scatter points (Q-Q points, boxplot outliers).
    pub points: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    /// Formatting of tick labels.
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for DiagnosticChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines are disabled to reduce clutter at terminal resolution.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let bar_color = RGBColor(90, 140, 200);
            chart.draw_series(
                self.bars
                    .iter()
                    .map(|&(l, r, h)| Rectangle::new([(l, 0.0), (r, h)], bar_color.stroke_width(1))),
            )?;

            let box_color = RGBColor(255, 200, 0);
            chart.draw_series(
                self.boxes
                    .iter()
                    .map(|&(bx0, by0, bx1, by1)| Rectangle::new([(bx0, by0), (bx1, by1)], box_color.stroke_width(1))),
            )?;

            for line in &self.lines {
                chart.draw_series(LineSeries::new(line.points.iter().copied(), &line.color))?;
            }

            // `Circle` radii are mis-scaled by the ratatui backend; single
            // pixels render cleanly.
            chart.draw_series(self.points.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart<'a>(bars: &'a [(f64, f64, f64)], boxes: &'a [(f64, f64, f64, f64)], x_bounds: [f64; 2]) -> DiagnosticChart<'a> {
        DiagnosticChart {
            bars,
            boxes,
            lines: Vec::new(),
            points: &[],
            x_bounds,
            y_bounds: [0.0, 1.0],
            x_label: "x",
            y_label: "y",
            fmt_x: |v| format!("{v:.1}"),
            fmt_y: |v| format!("{v:.1}"),
        }
    }

    #[test]
    fn small_area_shows_a_hint() {
        let area = Rect::new(0, 0, 40, 4);
        let mut buf = Buffer::empty(area);
        chart(&[(0.0, 1.0, 0.5)], &[], [0.0, 1.0]).render(area, &mut buf);
        let first_row: String = (0..area.width).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(first_row.starts_with("Chart area too small"), "{first_row}");
    }

    #[test]
    fn degenerate_bounds_leave_the_buffer_untouched() {
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        chart(&[(0.0, 1.0, 0.5)], &[(0.2, 0.4, 0.8, 0.6)], [1.0, 1.0]).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }
}
