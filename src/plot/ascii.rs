//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - histogram bars: `#`
//! - kernel density: `.`
//! - best-fit density: `*`
//! - Q-Q points: `o`, reference line: `-`
//! - boxplot: `|---[==|==]---|` with outliers `x`

use crate::plot::series::{BoxSummary, Histogram, QqPlot, VariablePlots};

const BAR: char = '#';

/// Render all panels for one variable.
pub fn render_variable_plots(plots: &VariablePlots, width: usize, height: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- {} ---\n", plots.variable.title()));

    if let Some(hist) = &plots.histogram {
        let best = plots.best_fit.as_ref();
        out.push_str(&render_histogram(
            hist,
            &plots.kde,
            best.map(|b| b.points.as_slice()),
            width,
            height,
        ));
        if let Some(b) = best {
            out.push_str(&format!("(* best fit: {})\n", b.distribution.name()));
        }
    }
    if let Some(b) = &plots.boxplot {
        out.push_str(&render_boxplot(b, width));
    }
    if let Some(qq) = &plots.qq {
        out.push_str(&render_qq(qq, width, height));
    }

    out
}

/// Density histogram with optional KDE and best-fit overlays.
pub fn render_histogram(
    hist: &Histogram,
    kde: &[(f64, f64)],
    best_fit: Option<&[(f64, f64)]>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let x_min = hist.edges[0];
    let x_max = hist.edges[hist.edges.len() - 1];
    let in_range = |pts: &[(f64, f64)]| -> Vec<(f64, f64)> {
        pts.iter()
            .copied()
            .filter(|(x, y)| (x_min..=x_max).contains(x) && y.is_finite())
            .collect()
    };
    let kde = in_range(kde);
    let best = best_fit.map(in_range).unwrap_or_default();

    let y_max = hist
        .density
        .iter()
        .copied()
        .chain(kde.iter().map(|p| p.1))
        .chain(best.iter().map(|p| p.1))
        .fold(0.0, f64::max);
    let (y_min, y_max) = (0.0, if y_max > 0.0 { y_max * 1.05 } else { 1.0 });

    let mut grid = vec![vec![' '; width]; height];

    // Bars first so the curves overlay them.
    let bins = hist.counts.len();
    for col in 0..width {
        let x = x_min + (col as f64 + 0.5) / width as f64 * (x_max - x_min);
        let bin = (((x - x_min) / hist.bin_width()).floor() as usize).min(bins - 1);
        let d = hist.density[bin];
        if d <= 0.0 {
            continue;
        }
        let top = map_y(d, y_min, y_max, height);
        for row in grid.iter_mut().skip(top) {
            row[col] = BAR;
        }
    }

    draw_curve(&mut grid, &kde, x_min, x_max, y_min, y_max, '.');
    draw_curve(&mut grid, &best, x_min, x_max, y_min, y_max, '*');

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: histogram | x=[{x_min:.3}, {x_max:.3}] | density=[0, {y_max:.4}] | bins={bins}\n"
    ));
    push_grid(&mut out, grid);
    out
}

/// Normal Q-Q scatter with its least-squares line.
pub fn render_qq(qq: &QqPlot, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = range(qq.points.iter().map(|p| p.0)).unwrap_or((-1.0, 1.0));
    let line = [
        (x_min, qq.intercept + qq.slope * x_min),
        (x_max, qq.intercept + qq.slope * x_max),
    ];
    let (y_min, y_max) = range(qq.points.iter().map(|p| p.1).chain(line.iter().map(|p| p.1)))
        .unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Line first (so points can overlay).
    draw_curve(&mut grid, &line, x_min, x_max, y_min, y_max, '-');
    for &(x, y) in &qq.points {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: normal Q-Q | x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.3}, {y_max:.3}] | slope={:.3} intercept={:.3} r={:.4}\n",
        qq.slope, qq.intercept, qq.r
    ));
    push_grid(&mut out, grid);
    out
}

/// Horizontal boxplot on a single line.
pub fn render_boxplot(b: &BoxSummary, width: usize) -> String {
    let width = width.max(10);
    let lo = b.outliers.iter().copied().fold(b.whisker_low, f64::min);
    let hi = b.outliers.iter().copied().fold(b.whisker_high, f64::max);
    let (lo, hi) = if hi > lo { (lo, hi) } else { pad_range(lo, hi, 0.5) };

    let mut row = vec![' '; width];
    let at = |v: f64| map_x(v, lo, hi, width);

    let (wl, q1, med, q3, wh) = (at(b.whisker_low), at(b.q1), at(b.median), at(b.q3), at(b.whisker_high));
    for cell in &mut row[wl..=wh] {
        *cell = '-';
    }
    for cell in &mut row[q1..=q3] {
        *cell = '=';
    }
    row[wl] = '|';
    row[wh] = '|';
    row[q1] = '[';
    row[q3] = ']';
    row[med] = '|';
    for &v in &b.outliers {
        row[at(v)] = 'x';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: boxplot | q1={:.3} median={:.3} q3={:.3} | whiskers=[{:.3}, {:.3}] | outliers={}\n",
        b.q1,
        b.median,
        b.q3,
        b.whisker_low,
        b.whisker_high,
        b.outliers.len()
    ));
    out.push_str(&row.into_iter().collect::<String>());
    out.push('\n');
    out
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    ch: char,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, ch);
        } else if is_background(grid[row][col]) {
            grid[row][col] = ch;
        }
        prev = Some((col, row));
    }
}

fn is_background(cell: char) -> bool {
    cell == ' ' || cell == BAR
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && is_background(grid[y0 as usize][x0 as usize])
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qq_golden_snapshot_small() {
        let qq = QqPlot {
            points: vec![(-1.0, 1.0), (0.0, 2.0), (1.0, 3.0)],
            slope: 1.0,
            intercept: 2.0,
            r: 1.0,
        };

        let txt = render_qq(&qq, 10, 5);
        let expected = concat!(
            "Plot: normal Q-Q | x=[-1.000, 1.000] | y=[0.900, 3.100] | slope=1.000 intercept=2.000 r=1.0000\n",
            "        -o\n",
            "      --  \n",
            "    -o    \n",
            "  --      \n",
            "o-        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn histogram_bars_fill_from_the_bottom() {
        let hist = Histogram {
            edges: vec![0.0, 1.0, 2.0],
            counts: vec![1, 3],
            density: vec![0.25, 0.75],
        };
        let txt = render_histogram(&hist, &[], None, 10, 5);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows.len(), 5);
        // Tall bin on the right reaches (almost) the top, short bin stays low.
        assert_eq!(rows[4], "##########");
        assert!(rows[1].starts_with("     #####"));
        assert!(rows[1][..5].trim().is_empty());
    }

    #[test]
    fn curves_overlay_bars() {
        let hist = Histogram {
            edges: vec![0.0, 1.0],
            counts: vec![4],
            density: vec![1.0],
        };
        let kde = [(0.0, 0.5), (1.0, 0.5)];
        let txt = render_histogram(&hist, &kde, None, 10, 5);
        assert!(txt.lines().skip(1).any(|row| row == ".........."));
    }

    #[test]
    fn boxplot_line_has_box_and_outlier() {
        let b = BoxSummary {
            q1: 2.0,
            median: 3.0,
            q3: 4.0,
            whisker_low: 1.0,
            whisker_high: 5.0,
            outliers: vec![10.0],
        };
        let txt = render_boxplot(&b, 19);
        let line = txt.lines().nth(1).unwrap();
        assert_eq!(line.len(), 19);
        assert_eq!(line, format!("|-[=|=]-|{}x", " ".repeat(9)));
    }
}
