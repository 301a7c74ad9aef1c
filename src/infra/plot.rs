// ============================================================
// Layer 6 — Loss Curve Plot
// ============================================================
// Renders the train and test loss curves as a standalone SVG
// line chart: epoch on the x axis, loss on the y axis, one
// polyline per series and a legend in the top-right corner.
//
// Output file: <checkpoint_dir>/loss_curves.svg

use anyhow::{Context, Result};
use std::{fs, path::Path};

const WIDTH:  f64 = 800.0;
const HEIGHT: f64 = 500.0;
const MARGIN: f64 = 60.0;

const TRAIN_COLOUR: &str = "#1f77b4";
const TEST_COLOUR:  &str = "#ff7f0e";

/// Build the SVG document for the two loss series.
pub fn render_loss_svg(train: &[f64], test: &[f64]) -> String {
    let epochs = train.len().max(test.len()).max(1);

    let finite = train.iter().chain(test).copied().filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let (lo, hi) = match (lo.is_finite(), hi > lo) {
        (true, true)  => (lo, hi),
        (true, false) => (lo - 0.5, lo + 0.5),
        (false, _)    => (0.0, 1.0),
    };

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let x_at = |i: usize| {
        let span = (epochs - 1).max(1) as f64;
        MARGIN + plot_w * i as f64 / span
    };
    let y_at = |v: f64| MARGIN + plot_h * (hi - v) / (hi - lo);

    let (x0, y0, x1, y1) = (MARGIN, HEIGHT - MARGIN, WIDTH - MARGIN, MARGIN);

    let mut elements = vec![
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
        ),
        r#"<rect width="100%" height="100%" fill="white"/>"#.to_string(),
        // Axes
        format!(r#"<line x1="{x0}" y1="{y0}" x2="{x1}" y2="{y0}" stroke="black"/>"#),
        format!(r#"<line x1="{x0}" y1="{y0}" x2="{x0}" y2="{y1}" stroke="black"/>"#),
        // Tick labels at the ends of each axis
        format!(r#"<text x="{x0}" y="{}" font-size="12" text-anchor="middle">1</text>"#, y0 + 18.0),
        format!(r#"<text x="{x1}" y="{}" font-size="12" text-anchor="middle">{epochs}</text>"#, y0 + 18.0),
        format!(r#"<text x="{}" y="{y0}" font-size="12" text-anchor="end">{lo:.4}</text>"#, x0 - 6.0),
        format!(r#"<text x="{}" y="{}" font-size="12" text-anchor="end">{hi:.4}</text>"#, x0 - 6.0, y1 + 4.0),
        // Axis labels
        format!(
            r#"<text x="{}" y="{}" font-size="14" text-anchor="middle">Epoch</text>"#,
            WIDTH / 2.0, HEIGHT - 15.0
        ),
        format!(
            r#"<text x="15" y="{}" font-size="14" text-anchor="middle" transform="rotate(-90 15 {})">Loss</text>"#,
            HEIGHT / 2.0, HEIGHT / 2.0
        ),
    ];

    for (series, colour) in [(train, TRAIN_COLOUR), (test, TEST_COLOUR)] {
        let points: Vec<String> = series
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| format!("{:.2},{:.2}", x_at(i), y_at(v)))
            .collect();
        elements.push(format!(
            r#"<polyline fill="none" stroke="{colour}" stroke-width="2" points="{}"/>"#,
            points.join(" ")
        ));
    }

    // Legend
    let lx = WIDTH - MARGIN - 130.0;
    for (row, (label, colour)) in [("Train Loss", TRAIN_COLOUR), ("Test Loss", TEST_COLOUR)]
        .into_iter()
        .enumerate()
    {
        let ly = MARGIN + 10.0 + 20.0 * row as f64;
        elements.push(format!(
            r#"<line x1="{lx}" y1="{ly}" x2="{}" y2="{ly}" stroke="{colour}" stroke-width="2"/>"#,
            lx + 25.0
        ));
        elements.push(format!(
            r#"<text x="{}" y="{}" font-size="12">{label}</text>"#,
            lx + 32.0, ly + 4.0
        ));
    }
    elements.push("</svg>".to_string());

    let mut svg = elements.join("\n");
    svg.push('\n');
    svg
}

/// Write the loss chart to `path`.
pub fn save_loss_plot(train: &[f64], test: &[f64], path: &Path) -> Result<()> {
    fs::write(path, render_loss_svg(train, test))
        .with_context(|| format!("Cannot write plot to '{}'", path.display()))?;
    tracing::info!("Loss curves written to '{}'", path.display());
    Ok(())
}
