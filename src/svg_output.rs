//! Before/after RunQA comparison plots
//!
//! Two panels side by side. The left panel shows the profile before RunQA
//! with the population mean (solid red), the `±k·sigma` band edges (dashed
//! red), the flagged runs in red and a legend of the rounded statistics. The
//! right panel shows the after-RunQA profile with the same lines, so removed
//! runs can be checked by eye. Both panels span `mean ± 15·sigma`.

use crate::config::PlotFormat;
use crate::detector::ProfileCheck;
use crate::display::round_value;
use crate::monitored::MonitoredQuantity;
use crate::profile::RunProfile;
use std::collections::HashSet;
use std::fmt::Write as _;

const WIDTH: f64 = 1366.0;
const HEIGHT: f64 = 768.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
/// Half-height of the y window in sigmas
const Y_WINDOW_SIGMAS: f64 = 15.0;
const MARKER_RADIUS: f64 = 3.0;

const BLACK: &str = "#000000";
const RED: &str = "#d62728";

/// Data-to-pixel mapping of one panel
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn px(&self, x: f64) -> f64 {
        self.left + (x - self.x_min) / (self.x_max - self.x_min) * self.width
    }

    fn py(&self, y: f64) -> f64 {
        self.top + (self.y_max - y) / (self.y_max - self.y_min) * self.height
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Two-panel comparison of one profile before and after RunQA
#[derive(Debug)]
pub struct ComparisonPlot<'a> {
    before: &'a RunProfile,
    after: &'a RunProfile,
    check: &'a ProfileCheck,
}

impl<'a> ComparisonPlot<'a> {
    pub fn new(before: &'a RunProfile, after: &'a RunProfile, check: &'a ProfileCheck) -> Self {
        Self {
            before,
            after,
            check,
        }
    }

    /// Escape XML special characters
    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    /// Stored title, else the catalogue title, else the profile name
    fn title(&self) -> String {
        if !self.before.title().is_empty() {
            return self.before.title().to_string();
        }
        MonitoredQuantity::from_profile_name(self.before.name())
            .map(|q| q.title())
            .unwrap_or_else(|| self.before.name().to_string())
    }

    /// Vertical window shared by both panels
    fn y_window(&self) -> (f64, f64) {
        let stats = &self.check.statistics;
        if stats.sigma_content > 0.0 {
            return (
                stats.mean_content - Y_WINDOW_SIGMAS * stats.sigma_content,
                stats.mean_content + Y_WINDOW_SIGMAS * stats.sigma_content,
            );
        }

        // No spread: fall back to the extent of the data
        let (lo, hi) = self
            .before
            .iter()
            .chain(self.after.iter())
            .filter(|(_, b)| b.content != 0.0 || b.error != 0.0)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, b)| {
                (lo.min(b.content - b.error), hi.max(b.content + b.error))
            });
        if !lo.is_finite() || !hi.is_finite() {
            return (stats.mean_content - 1.0, stats.mean_content + 1.0);
        }
        let pad = ((hi - lo) * 0.1).max(stats.mean_content.abs() * 0.1).max(1e-9);
        (lo - pad, hi + pad)
    }

    fn frame(&self, panel: usize) -> Frame {
        let panel_width = WIDTH / 2.0;
        let range = self.before.range();
        let (y_min, y_max) = self.y_window();
        Frame {
            left: panel as f64 * panel_width + MARGIN_LEFT,
            top: MARGIN_TOP,
            width: panel_width - MARGIN_LEFT - MARGIN_RIGHT,
            height: HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
            x_min: range.low as f64,
            x_max: range.high.max(range.low + 1) as f64,
            y_min,
            y_max,
        }
    }

    fn write_axes(&self, out: &mut String, frame: &Frame, title: &str) {
        let _ = writeln!(
            out,
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"#ffffff\" stroke=\"{}\"/>",
            frame.left, frame.top, frame.width, frame.height, BLACK
        );
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"16\">{}</text>",
            frame.left + frame.width / 2.0,
            frame.top - 18.0,
            Self::escape(title)
        );

        for i in 0..=4 {
            let fx = i as f64 / 4.0;
            let x = frame.x_min + fx * (frame.x_max - frame.x_min);
            let y = frame.y_min + fx * (frame.y_max - frame.y_min);
            let _ = writeln!(
                out,
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"11\">{:.0}</text>",
                frame.px(x),
                frame.bottom() + 16.0,
                x
            );
            let _ = writeln!(
                out,
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\">{:.4}</text>",
                frame.left - 6.0,
                frame.py(y) + 4.0,
                y
            );
        }
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"13\">Run ID</text>",
            frame.left + frame.width / 2.0,
            frame.bottom() + 40.0
        );
    }

    fn write_reference_lines(&self, out: &mut String, frame: &Frame) {
        let stats = &self.check.statistics;
        let (lower, upper) = stats.content_band(self.check.sigma_threshold);
        let lines = [
            (stats.mean_content, ""),
            (upper, " stroke-dasharray=\"8,4\""),
            (lower, " stroke-dasharray=\"8,4\""),
        ];
        for (y, dash) in lines {
            if y < frame.y_min || y > frame.y_max {
                continue;
            }
            let _ = writeln!(
                out,
                "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"2\"{}/>",
                frame.left,
                frame.py(y),
                frame.left + frame.width,
                frame.py(y),
                RED,
                dash
            );
        }
    }

    fn write_points(
        &self,
        out: &mut String,
        frame: &Frame,
        profile: &RunProfile,
        flagged: &HashSet<i64>,
    ) {
        for (run, bin) in profile.iter() {
            if bin.content == 0.0 && bin.error == 0.0 {
                continue;
            }
            if bin.content < frame.y_min || bin.content > frame.y_max {
                continue;
            }
            let color = if flagged.contains(&run) { RED } else { BLACK };
            let x = frame.px(run as f64);
            let y_lo = frame.py((bin.content - bin.error).max(frame.y_min));
            let y_hi = frame.py((bin.content + bin.error).min(frame.y_max));
            let _ = writeln!(
                out,
                "<line x1=\"{x:.1}\" y1=\"{y_lo:.1}\" x2=\"{x:.1}\" y2=\"{y_hi:.1}\" stroke=\"{color}\" stroke-width=\"1\"/>"
            );
            let _ = writeln!(
                out,
                "<circle class=\"run\" data-run=\"{}\" cx=\"{:.1}\" cy=\"{:.1}\" r=\"{}\" fill=\"{}\"/>",
                run,
                x,
                frame.py(bin.content),
                MARKER_RADIUS,
                color
            );
        }
    }

    /// Legend lines with the rounded population statistics
    pub fn legend_lines(&self) -> [String; 4] {
        let stats = &self.check.statistics;
        [
            format!("Mean = {:.6}", round_value(stats.mean_content)),
            format!("Mean error = {:.6}", round_value(stats.mean_error)),
            format!("Sigma = {:.6}", round_value(stats.sigma_content)),
            format!("Sigma error = {:.6}", round_value(stats.sigma_error)),
        ]
    }

    fn write_legend(&self, out: &mut String, frame: &Frame) {
        let x = frame.left + frame.width - 10.0;
        for (i, line) in self.legend_lines().iter().enumerate() {
            let _ = writeln!(
                out,
                "<text class=\"legend\" x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"13\">{}</text>",
                x,
                frame.top + 20.0 + i as f64 * 18.0,
                Self::escape(line)
            );
        }
    }

    /// Render as a standalone SVG document
    pub fn to_svg(&self) -> String {
        let flagged: HashSet<i64> = self.check.flagged_runs().collect();
        let no_flags = HashSet::new();
        let title = self.title();

        let mut out = String::new();
        let _ = writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
            w = WIDTH,
            h = HEIGHT
        );
        let _ = writeln!(out, "<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>");

        let panels = [
            (self.before, &flagged, format!("{} (before RunQA)", title)),
            (self.after, &no_flags, format!("{} (after RunQA)", title)),
        ];
        for (panel, (profile, marks, panel_title)) in panels.iter().enumerate() {
            let frame = self.frame(panel);
            self.write_axes(&mut out, &frame, panel_title);
            self.write_reference_lines(&mut out, &frame);
            self.write_points(&mut out, &frame, profile, marks);
            if panel == 0 {
                self.write_legend(&mut out, &frame);
            }
        }

        out.push_str("</svg>\n");
        out
    }

    /// Render as an HTML page embedding the SVG
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n");
        html.push_str("<html lang=\"en\">\n");
        html.push_str("<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        let _ = writeln!(
            html,
            "    <title>RunQA: {}</title>",
            Self::escape(self.before.name())
        );
        html.push_str("    <style>body { font-family: sans-serif; margin: 20px; } li { font-family: monospace; }</style>\n");
        html.push_str("</head>\n");
        html.push_str("<body>\n");
        let _ = writeln!(html, "<h1>{}</h1>", Self::escape(self.before.name()));
        html.push_str(&self.to_svg());

        if !self.check.flagged.is_empty() {
            html.push_str("<h2>Flagged runs</h2>\n<ul>\n");
            for flag in &self.check.flagged {
                let _ = writeln!(
                    html,
                    "<li>{}: content {:.6} &plusmn; {:.6}</li>",
                    flag.run, flag.content, flag.error
                );
            }
            html.push_str("</ul>\n");
        }

        html.push_str("</body>\n");
        html.push_str("</html>\n");
        html
    }

    pub fn render(&self, format: PlotFormat) -> String {
        match format {
            PlotFormat::Svg => self.to_svg(),
            PlotFormat::Html => self.to_html(),
        }
    }
}
