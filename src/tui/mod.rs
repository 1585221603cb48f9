//! Ratatui-based terminal UI.
//!
//! The TUI runs the analysis once, then lets the user flip between variables
//! and diagnostic views (histogram with densities, normal Q-Q, boxplot) while
//! the fit and decision table stays visible next to the chart.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::pipeline::{RunOutput, run_analysis};
use crate::domain::{AnalysisConfig, Decision, Variable};
use crate::error::AppError;
use crate::plot::VariablePlots;
use crate::report::{kendall_model, recommendation};

mod plotters_chart;

use plotters_chart::{ChartLine, DiagnosticChart};

const KDE_COLOR: RGBColor = RGBColor(0, 200, 200);
const BEST_FIT_COLOR: RGBColor = RGBColor(230, 80, 80);
const BOX_LINE_COLOR: RGBColor = RGBColor(255, 200, 0);

/// Start the TUI.
///
/// The analysis runs before the terminal is switched into raw mode, so input
/// errors are reported on a normal screen.
pub fn run(config: AnalysisConfig) -> Result<(), AppError> {
    let mut app = App::new(config)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Which diagnostic the chart panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlotView {
    Histogram,
    Qq,
    Boxplot,
}

impl PlotView {
    fn next(self) -> Self {
        match self {
            PlotView::Histogram => PlotView::Qq,
            PlotView::Qq => PlotView::Boxplot,
            PlotView::Boxplot => PlotView::Histogram,
        }
    }

    fn prev(self) -> Self {
        match self {
            PlotView::Histogram => PlotView::Boxplot,
            PlotView::Qq => PlotView::Histogram,
            PlotView::Boxplot => PlotView::Qq,
        }
    }

    fn title(self) -> &'static str {
        match self {
            PlotView::Histogram => "Histogram + KDE + best fit",
            PlotView::Qq => "Normal Q-Q",
            PlotView::Boxplot => "Boxplot",
        }
    }
}

struct App {
    config: AnalysisConfig,
    run: RunOutput,
    plots: Vec<VariablePlots>,
    variable_idx: usize,
    view: PlotView,
    status: String,
}

impl App {
    fn new(config: AnalysisConfig) -> Result<Self, AppError> {
        let run = run_analysis(&config)?;
        let plots = run.plots();
        let status = format!("Loaded {} rows.", run.ingest.stats.rows_kept);
        Ok(Self {
            config,
            run,
            plots,
            variable_idx: 0,
            view: PlotView::Histogram,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let n = self.plots.len().max(1);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => self.variable_idx = (self.variable_idx + n - 1) % n,
            KeyCode::Right => self.variable_idx = (self.variable_idx + 1) % n,
            KeyCode::Down | KeyCode::Tab => self.view = self.view.next(),
            KeyCode::Up | KeyCode::BackTab => self.view = self.view.prev(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    /// Re-read the input file; a failed reload keeps the previous results.
    fn reload(&mut self) {
        match run_analysis(&self.config) {
            Ok(run) => {
                self.plots = run.plots();
                self.status = format!("Reloaded {} rows.", run.ingest.stats.rows_kept);
                self.run = run;
            }
            Err(err) => {
                self.status = format!("Reload failed: {}", err.message());
            }
        }
    }

    fn current_variable(&self) -> Variable {
        self.plots
            .get(self.variable_idx)
            .map(|p| p.variable)
            .unwrap_or(Variable::Arrivals)
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let stats = &self.run.ingest.stats;
        let arrivals = self.run.evaluation(Variable::Arrivals).and_then(recommendation);
        let service = self.run.evaluation(Variable::Service).and_then(recommendation);

        let lines = vec![
            Line::from(vec![
                Span::styled("qfit", Style::default().fg(Color::Cyan)),
                Span::raw(" | queueing distribution fit"),
            ]),
            Line::from(Span::styled(
                format!(
                    "input: {} | rows: read={} kept={} | suspect={}",
                    self.run.ingest.source.display(),
                    stats.rows_read,
                    stats.rows_kept,
                    self.run.ingest.suspect_rows.len(),
                ),
                Style::default().fg(Color::Gray),
            )),
            Line::from(Span::styled(
                format!(
                    "variable: {} | view: {} | model: {}",
                    self.current_variable().title(),
                    self.view.title(),
                    kendall_model(arrivals.as_ref(), service.as_ref()),
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(58)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_fit_table(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = format!("{} | {}", self.current_variable().title(), self.view.title());
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(series) = self
            .plots
            .get(self.variable_idx)
            .and_then(|p| view_series(p, self.view))
        else {
            let msg = Paragraph::new("Not enough data for this view.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = DiagnosticChart {
            bars: &series.bars,
            boxes: &series.boxes,
            lines: series
                .lines
                .iter()
                .map(|(points, color)| ChartLine {
                    points,
                    color: *color,
                })
                .collect(),
            points: &series.points,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: series.x_label,
            y_label: series.y_label,
            fmt_x: fmt_axis,
            fmt_y: fmt_axis,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, &series);
        }
    }

    fn draw_fit_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let variable = self.current_variable();
        let best = self.run.evaluation(variable).and_then(|e| e.best);

        let mut lines = vec![Line::from(Span::styled(
            format!("  {:<12} {:>8} {:>8} {:<11} {:<6} N", "dist", "ks_p", "A2", "label", "dec"),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        for row in self.run.decisions.iter().filter(|d| d.variable == variable) {
            let marker = if best == Some(row.distribution) { "*" } else { " " };
            let color = match row.decision {
                Decision::Accept => Color::Green,
                Decision::Reject => Color::Red,
                Decision::Undefined => Color::DarkGray,
            };
            lines.push(Line::from(Span::styled(
                format!(
                    "{marker} {:<12} {:>8} {:>8} {:<11} {:<6} {}",
                    row.distribution.name(),
                    row.ks_p_value.map_or("-".to_string(), |p| format!("{p:.4}")),
                    row.ad_statistic.map_or("-".to_string(), |a| format!("{a:.3}")),
                    row.label.as_str(),
                    row.decision.as_str(),
                    row.notation.letter(),
                ),
                Style::default().fg(color),
            )));
        }

        if let Some((_, s)) = self.run.summaries.iter().find(|(v, _)| *v == variable) {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                format!("n={} mean={:.4} sd={:.4}", s.count, s.mean, s.std_dev),
                Style::default().fg(Color::Gray),
            )));
            lines.push(Line::from(Span::styled(
                format!("median={:.4} skew={:.3} kurt={:.3}", s.median, s.skewness, s.kurtosis),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Goodness of fit").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ variable  ↑/↓ view  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Owned chart data for one view; the widget borrows from it.
#[derive(Debug, Clone, PartialEq)]
struct ChartSeries {
    bars: Vec<(f64, f64, f64)>,
    boxes: Vec<(f64, f64, f64, f64)>,
    lines: Vec<(Vec<(f64, f64)>, RGBColor)>,
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    x_label: &'static str,
    y_label: &'static str,
}

/// Build chart series for Plotters. `None` when the view has nothing to draw.
fn view_series(plots: &VariablePlots, view: PlotView) -> Option<ChartSeries> {
    match view {
        PlotView::Histogram => histogram_series(plots),
        PlotView::Qq => qq_series(plots),
        PlotView::Boxplot => boxplot_series(plots),
    }
}

fn histogram_series(plots: &VariablePlots) -> Option<ChartSeries> {
    let hist = plots.histogram.as_ref()?;
    let bars: Vec<(f64, f64, f64)> = hist
        .edges
        .windows(2)
        .zip(&hist.density)
        .map(|(w, &d)| (w[0], w[1], d))
        .collect();

    let mut lines = Vec::new();
    if !plots.kde.is_empty() {
        lines.push((plots.kde.clone(), KDE_COLOR));
    }
    if let Some(best) = &plots.best_fit {
        let finite: Vec<(f64, f64)> = best.points.iter().copied().filter(|(_, y)| y.is_finite()).collect();
        lines.push((finite, BEST_FIT_COLOR));
    }

    let xs = hist
        .edges
        .iter()
        .copied()
        .chain(lines.iter().flat_map(|(l, _)| l.iter().map(|p| p.0)));
    let (x0, x1) = bounds(xs)?;
    let ys = hist
        .density
        .iter()
        .copied()
        .chain(lines.iter().flat_map(|(l, _)| l.iter().map(|p| p.1)));
    let (_, y1) = bounds(ys)?;

    Some(ChartSeries {
        bars,
        boxes: Vec::new(),
        lines,
        points: Vec::new(),
        x_bounds: [x0, x1],
        y_bounds: [0.0, if y1 > 0.0 { y1 * 1.05 } else { 1.0 }],
        x_label: "value",
        y_label: "density",
    })
}

fn qq_series(plots: &VariablePlots) -> Option<ChartSeries> {
    let qq = plots.qq.as_ref()?;
    let (x0, x1) = bounds(qq.points.iter().map(|p| p.0))?;
    let line = vec![
        (x0, qq.intercept + qq.slope * x0),
        (x1, qq.intercept + qq.slope * x1),
    ];
    let (y0, y1) = bounds(qq.points.iter().map(|p| p.1).chain(line.iter().map(|p| p.1)))?;
    let (y0, y1) = pad(y0, y1);

    Some(ChartSeries {
        bars: Vec::new(),
        boxes: Vec::new(),
        lines: vec![(line, BEST_FIT_COLOR)],
        points: qq.points.clone(),
        x_bounds: [x0, x1],
        y_bounds: [y0, y1],
        x_label: "theoretical quantile",
        y_label: "ordered value",
    })
}

fn boxplot_series(plots: &VariablePlots) -> Option<ChartSeries> {
    let b = plots.boxplot.as_ref()?;
    let (lo, hi) = (0.6, 1.4);
    let lines = vec![
        (vec![(b.median, lo), (b.median, hi)], BOX_LINE_COLOR),
        (vec![(b.whisker_low, 1.0), (b.q1, 1.0)], BOX_LINE_COLOR),
        (vec![(b.q3, 1.0), (b.whisker_high, 1.0)], BOX_LINE_COLOR),
        (vec![(b.whisker_low, 0.8), (b.whisker_low, 1.2)], BOX_LINE_COLOR),
        (vec![(b.whisker_high, 0.8), (b.whisker_high, 1.2)], BOX_LINE_COLOR),
    ];
    let points: Vec<(f64, f64)> = b.outliers.iter().map(|&v| (v, 1.0)).collect();
    let xs = [b.whisker_low, b.whisker_high, b.q1, b.q3]
        .into_iter()
        .chain(b.outliers.iter().copied());
    let (x0, x1) = bounds(xs)?;
    let (x0, x1) = pad(x0, x1);

    Some(ChartSeries {
        bars: Vec::new(),
        boxes: vec![(b.q1, lo, b.q3, hi)],
        lines,
        points,
        x_bounds: [x0, x1],
        y_bounds: [0.0, 2.0],
        x_label: "value",
        y_label: "",
    })
}

/// Min and max of the finite values; `None` when there are none.
fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return None;
    }
    if hi > lo { Some((lo, hi)) } else { Some((lo - 0.5, hi + 0.5)) }
}

fn pad(lo: f64, hi: f64) -> (f64, f64) {
    let pad = ((hi - lo).abs() * 0.05).max(1e-12);
    (lo - pad, hi + pad)
}

fn fmt_axis(v: f64) -> String {
    format!("{v:.2}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    series: &ChartSeries,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);
    let [x_lo, x_hi] = series.x_bounds;
    let [y_lo, y_hi] = series.y_bounds;

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_lo + u * (x_hi - x_lo);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{:.1}", x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    // The boxplot's vertical axis carries no values.
    if !series.y_label.is_empty() {
        for i in 0..ticks {
            let u = i as f64 / (ticks as f64 - 1.0);
            let y_val = y_lo + u * (y_hi - y_lo);
            let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
            let label = format!("{:.2}", y_val);
            let label_len = label.len() as u16;
            let x = inner.x + insets.left.saturating_sub(1);
            let start = x.saturating_sub(label.len() as u16);
            if start < inner.x {
                continue;
            }
            frame.render_widget(
                Paragraph::new(label).style(style),
                Rect {
                    x: start,
                    y,
                    width: label_len,
                    height: 1,
                },
            );
        }
    }

    let x_label = Paragraph::new(series.x_label)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(series.y_label)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
