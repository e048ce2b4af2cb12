//! SVG dashboard charts
//!
//! Two charts are drawn from a ledger snapshot:
//! - [`ProgressChartRenderer`]: horizontal bars of `progress_pct` per project,
//!   coloured by computed status
//! - [`RevenueChartRenderer`]: donut chart of revenue per project
//!
//! Both share a dark [`ChartTheme`]. An empty snapshot is an error: the
//! dashboard has no charts to show until a project exists.

use std::f64::consts::PI;

use foledger_core::{format_currency, LedgerSnapshot, ProjectStatus, RenderError, Renderer};
use svg::node::element::{Circle, Group, Line, Rectangle, Text};
use svg::Document;

use crate::truncate;

/// Colours and fonts shared by the dashboard charts
#[derive(Clone, Debug)]
pub struct ChartTheme {
    pub background_color: String,
    pub text_color: String,
    pub muted_color: String,
    pub grid_color: String,
    pub completed_color: String,
    pub in_progress_color: String,
    pub stopped_color: String,
    /// Slice colours for the revenue chart, cycled in row order
    pub palette: Vec<String>,
    pub font_family: String,
    pub font_size: u32,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background_color: "#0B1121".into(),
            text_color: "#E2E8F0".into(),
            muted_color: "#64748B".into(),
            grid_color: "#1F2937".into(),
            completed_color: "#00FF41".into(),
            in_progress_color: "#00CCFF".into(),
            stopped_color: "#FF0033".into(),
            palette: vec![
                "#00FF41".into(),
                "#00CCFF".into(),
                "#FFFF00".into(),
                "#FF0033".into(),
            ],
            font_family: "'Courier New', monospace".into(),
            font_size: 12,
        }
    }
}

impl ChartTheme {
    /// Bar colour for a status
    pub fn status_color(&self, status: ProjectStatus) -> &str {
        match status {
            ProjectStatus::Completed => &self.completed_color,
            ProjectStatus::InProgress => &self.in_progress_color,
            ProjectStatus::Stopped => &self.stopped_color,
        }
    }

    /// Slice colour for the n-th revenue slice
    pub fn slice_color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return &self.text_color;
        }
        &self.palette[index % self.palette.len()]
    }

    fn text(&self, content: impl Into<String>, x: f64, y: f64, size: u32) -> Text {
        Text::new(content.into())
            .set("x", x)
            .set("y", y)
            .set("font-family", self.font_family.as_str())
            .set("font-size", size)
            .set("fill", self.text_color.as_str())
    }

    fn document(&self, width: u32, height: u32) -> Document {
        let background = Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", self.background_color.as_str());

        Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height))
            .set("xmlns", "http://www.w3.org/2000/svg")
            .add(background)
    }
}

fn to_svg_string(document: &Document) -> Result<String, RenderError> {
    let mut output = Vec::new();
    svg::write(&mut output, document)
        .map_err(|e| RenderError::Format(format!("Failed to write SVG: {}", e)))?;
    String::from_utf8(output).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {}", e)))
}

// ============================================================================
// Progress chart
// ============================================================================

/// Horizontal bar chart of installation progress
#[derive(Clone, Debug)]
pub struct ProgressChartRenderer {
    pub theme: ChartTheme,
    /// Width of the bar area in pixels
    pub chart_width: u32,
    /// Height per project row in pixels
    pub row_height: u32,
    /// Width of the name column in pixels
    pub label_width: u32,
    /// Space for the title and axis labels
    pub header_height: u32,
    pub padding: u32,
    pub title: String,
}

impl Default for ProgressChartRenderer {
    fn default() -> Self {
        Self {
            theme: ChartTheme::default(),
            chart_width: 520,
            row_height: 30,
            label_width: 200,
            header_height: 50,
            padding: 20,
            title: "Avance (%)".into(),
        }
    }
}

impl ProgressChartRenderer {
    /// Largest percentage the axis will stretch to
    pub const AXIS_CEILING: f64 = 1000.0;
    /// Grid intervals between 0 and the axis maximum
    const AXIS_STEPS: u32 = 4;

    pub fn new() -> Self {
        Self::default()
    }

    /// Configure bar area width
    pub fn chart_width(mut self, width: u32) -> Self {
        self.chart_width = width;
        self
    }

    fn chart_left(&self) -> f64 {
        (self.padding + self.label_width) as f64
    }

    fn chart_top(&self) -> u32 {
        self.padding + self.header_height
    }

    /// Axis maximum: 100%, or more when a project is over-installed.
    ///
    /// Capped at [`Self::AXIS_CEILING`]; bars past it are drawn at full width.
    fn axis_max(snapshot: &LedgerSnapshot) -> f64 {
        let top = snapshot
            .rows
            .iter()
            .map(|r| r.progress_pct)
            .filter(|p| p.is_finite())
            .fold(100.0_f64, f64::max)
            .min(Self::AXIS_CEILING);
        (top / 25.0).ceil() * 25.0
    }

    fn pct_to_width(&self, pct: f64, axis_max: f64) -> f64 {
        if !pct.is_finite() || pct <= 0.0 {
            return 0.0;
        }
        pct.min(axis_max) / axis_max * self.chart_width as f64
    }

    fn render_axis(&self, row_count: usize, axis_max: f64) -> Group {
        let mut group = Group::new().set("class", "axis");
        let top = self.chart_top();
        let bottom = top + row_count as u32 * self.row_height;

        for step in 0..=Self::AXIS_STEPS {
            let tick = axis_max * f64::from(step) / f64::from(Self::AXIS_STEPS);
            let x = self.chart_left() + self.pct_to_width(tick, axis_max);
            let line = Line::new()
                .set("x1", x)
                .set("y1", top)
                .set("x2", x)
                .set("y2", bottom)
                .set("stroke", self.theme.grid_color.as_str())
                .set("stroke-width", 1);
            group = group.add(line);

            let label = self
                .theme
                .text(format!("{tick:.0}"), x, (top - 8) as f64, self.theme.font_size - 1)
                .set("fill", self.theme.muted_color.as_str())
                .set("text-anchor", "middle");
            group = group.add(label);
        }

        group
    }

    fn render_bar(&self, name: &str, pct: f64, status: ProjectStatus, row: usize, axis_max: f64) -> Group {
        let mut group = Group::new().set("class", "bar");

        let y = self.chart_top() + row as u32 * self.row_height;
        let bar_height = (self.row_height as f64 * 0.6) as u32;
        let bar_y = y + (self.row_height - bar_height) / 2;
        let text_y = (y + self.row_height / 2 + 4) as f64;

        let label = self.theme.text(
            truncate(name, 26),
            (self.padding + 4) as f64,
            text_y,
            self.theme.font_size,
        );
        group = group.add(label);

        let width = self.pct_to_width(pct, axis_max);
        let bar = Rectangle::new()
            .set("x", self.chart_left())
            .set("y", bar_y)
            .set("width", width)
            .set("height", bar_height)
            .set("rx", 2)
            .set("fill", self.theme.status_color(status));
        group = group.add(bar);

        let value = self
            .theme
            .text(format!("{pct:.1}%"), self.chart_left() + width + 6.0, text_y, self.theme.font_size)
            .set("fill", self.theme.status_color(status));
        group = group.add(value);

        group
    }

    fn render_legend(&self, y_offset: u32) -> Group {
        let mut group = Group::new().set("class", "legend");
        let y = y_offset as f64 + 15.0;
        let box_size = 12.0;
        let spacing = 130.0;

        for (i, status) in ProjectStatus::ALL.iter().enumerate() {
            let x = self.padding as f64 + i as f64 * spacing;
            let swatch = Rectangle::new()
                .set("x", x)
                .set("y", y - box_size + 2.0)
                .set("width", box_size)
                .set("height", box_size)
                .set("rx", 2)
                .set("fill", self.theme.status_color(*status));
            group = group.add(swatch);
            group = group.add(self.theme.text(
                status.label(),
                x + box_size + 5.0,
                y,
                self.theme.font_size - 1,
            ));
        }

        group
    }
}

impl Renderer for ProgressChartRenderer {
    type Output = String;

    fn render(&self, snapshot: &LedgerSnapshot) -> Result<String, RenderError> {
        if snapshot.is_empty() {
            return Err(RenderError::InvalidData("No projects to render".into()));
        }

        let row_count = snapshot.len();
        let axis_max = Self::axis_max(snapshot);
        let width = self.padding * 2 + self.label_width + self.chart_width + 70;
        let legend_y = self.chart_top() + row_count as u32 * self.row_height + 10;
        let height = legend_y + 30 + self.padding;

        let mut document = self.theme.document(width, height);

        let title = self
            .theme
            .text(self.title.as_str(), self.padding as f64, (self.padding + 15) as f64, self.theme.font_size + 4)
            .set("font-weight", "bold")
            .set("fill", self.theme.completed_color.as_str());
        document = document.add(title);

        document = document.add(self.render_axis(row_count, axis_max));

        for (row, enriched) in snapshot.rows.iter().enumerate() {
            document = document.add(self.render_bar(
                &enriched.record.name,
                enriched.progress_pct,
                enriched.computed_status,
                row,
                axis_max,
            ));
        }

        document = document.add(self.render_legend(legend_y));

        to_svg_string(&document)
    }
}

// ============================================================================
// Revenue chart
// ============================================================================

/// Donut chart of revenue distribution per project
#[derive(Clone, Debug)]
pub struct RevenueChartRenderer {
    pub theme: ChartTheme,
    /// Outer radius in pixels
    pub radius: f64,
    /// Inner radius as a fraction of the outer one
    pub hole: f64,
    /// Width reserved for the legend
    pub legend_width: u32,
    pub header_height: u32,
    pub padding: u32,
    pub title: String,
}

impl Default for RevenueChartRenderer {
    fn default() -> Self {
        Self {
            theme: ChartTheme::default(),
            radius: 120.0,
            hole: 0.4,
            legend_width: 320,
            header_height: 40,
            padding: 20,
            title: "Distribución Ganancias".into(),
        }
    }
}

/// One coloured ring segment
struct Slice<'a> {
    name: &'a str,
    revenue: f64,
    color: &'a str,
}

impl RevenueChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn slices<'a>(&'a self, snapshot: &'a LedgerSnapshot) -> Vec<Slice<'a>> {
        snapshot
            .rows
            .iter()
            .filter(|r| r.revenue.is_finite() && r.revenue > 0.0)
            .enumerate()
            .map(|(i, r)| Slice {
                name: r.record.name.as_str(),
                revenue: r.revenue,
                color: self.theme.slice_color(i),
            })
            .collect()
    }

    /// Draw each slice as a dashed stroke on a circle of the mid radius
    fn render_ring(&self, slices: &[Slice<'_>], cx: f64, cy: f64) -> Group {
        let mut group = Group::new()
            .set("class", "ring")
            .set("transform", format!("rotate(-90 {cx} {cy})"));

        let mid = self.radius * (1.0 + self.hole) / 2.0;
        let stroke = self.radius * (1.0 - self.hole);
        let circumference = 2.0 * PI * mid;
        let total: f64 = slices.iter().map(|s| s.revenue).sum();

        let track = Circle::new()
            .set("cx", cx)
            .set("cy", cy)
            .set("r", mid)
            .set("fill", "none")
            .set("stroke", self.theme.grid_color.as_str())
            .set("stroke-width", stroke);
        group = group.add(track);

        let mut offset = 0.0;
        for slice in slices {
            let length = slice.revenue / total * circumference;
            let segment = Circle::new()
                .set("cx", cx)
                .set("cy", cy)
                .set("r", mid)
                .set("fill", "none")
                .set("stroke", slice.color)
                .set("stroke-width", stroke)
                .set("stroke-dasharray", format!("{length:.3} {:.3}", circumference - length))
                .set("stroke-dashoffset", format!("{:.3}", -offset));
            group = group.add(segment);
            offset += length;
        }

        group
    }

    fn render_legend(&self, slices: &[Slice<'_>], x: f64, y: f64) -> Group {
        let mut group = Group::new().set("class", "legend");
        let total: f64 = slices.iter().map(|s| s.revenue).sum();
        let box_size = 12.0;
        let line_height = 20.0;

        for (i, slice) in slices.iter().enumerate() {
            let row_y = y + i as f64 * line_height;
            let swatch = Rectangle::new()
                .set("x", x)
                .set("y", row_y - box_size + 2.0)
                .set("width", box_size)
                .set("height", box_size)
                .set("rx", 2)
                .set("fill", slice.color);
            group = group.add(swatch);

            let share = slice.revenue / total * 100.0;
            let label = format!(
                "{} {} ({share:.1}%)",
                truncate(slice.name, 20),
                format_currency(slice.revenue)
            );
            group = group.add(self.theme.text(label, x + box_size + 6.0, row_y, self.theme.font_size - 1));
        }

        group
    }
}

impl Renderer for RevenueChartRenderer {
    type Output = String;

    fn render(&self, snapshot: &LedgerSnapshot) -> Result<String, RenderError> {
        if snapshot.is_empty() {
            return Err(RenderError::InvalidData("No projects to render".into()));
        }

        let slices = self.slices(snapshot);
        let diameter = (self.radius * 2.0).ceil() as u32;
        let legend_rows = slices.len().max(1) as u32;
        let width = self.padding * 3 + diameter + self.legend_width;
        let height = self.padding * 2 + self.header_height + diameter.max(legend_rows * 20);

        let cx = self.padding as f64 + self.radius;
        let cy = (self.padding + self.header_height) as f64 + self.radius;

        let mut document = self.theme.document(width, height);

        let title = self
            .theme
            .text(self.title.as_str(), self.padding as f64, (self.padding + 15) as f64, self.theme.font_size + 4)
            .set("font-weight", "bold")
            .set("fill", self.theme.completed_color.as_str());
        document = document.add(title);

        document = document.add(self.render_ring(&slices, cx, cy));

        let center_label = if slices.is_empty() {
            "Sin ganancias".to_string()
        } else {
            format_currency(slices.iter().map(|s| s.revenue).sum())
        };
        let center = self
            .theme
            .text(center_label, cx, cy + 4.0, self.theme.font_size)
            .set("text-anchor", "middle");
        document = document.add(center);

        let legend_x = (self.padding * 2 + diameter) as f64;
        let legend_y = (self.padding + self.header_height) as f64 + 14.0;
        document = document.add(self.render_legend(&slices, legend_x, legend_y));

        to_svg_string(&document)
    }
}
