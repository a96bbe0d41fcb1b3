use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram over one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub label: String,
    pub bins: Vec<Bin>,
}

impl Histogram {
    /// Buckets `values` into `nbins` equal-width bins spanning [min, max].
    ///
    /// The maximum lands in the last bin. A constant column collapses to a
    /// single bin; non-finite values are ignored.
    pub fn build(label: impl Into<String>, values: &[f64], nbins: usize) -> Self {
        let label = label.into();
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() || nbins == 0 {
            return Self {
                label,
                bins: Vec::new(),
            };
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            return Self {
                label,
                bins: vec![Bin {
                    lower: min,
                    upper: max,
                    count: finite.len(),
                }],
            };
        }

        // Halved so that `max - min` stays finite for extreme but finite data.
        let half_span = max / 2.0 - min / 2.0;
        let edge = |i: usize| {
            let t = i as f64 / nbins as f64;
            min * (1.0 - t) + max * t
        };
        let mut bins: Vec<Bin> = (0..nbins)
            .map(|i| Bin {
                lower: edge(i),
                upper: if i + 1 == nbins { max } else { edge(i + 1) },
                count: 0,
            })
            .collect();

        for v in finite {
            let fraction = (v / 2.0 - min / 2.0) / half_span;
            let i = ((fraction * nbins as f64) as usize).min(nbins - 1);
            bins[i].count += 1;
        }

        Self { label, bins }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Horizontal bar chart, one line per bin, scaled to `bar_width` columns.
    pub fn render_text(&self, bar_width: usize) -> String {
        let mut out = format!("{} (n = {})\n", self.label, self.total());
        if self.bins.is_empty() {
            out.push_str("  (no data)\n");
            return out;
        }

        let peak = self.bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        for bin in &self.bins {
            let len = bin.count * bar_width / peak;
            out.push_str(&format!(
                "  {:>8.1} - {:<8.1} | {:<width$} {}\n",
                bin.lower,
                bin.upper,
                "#".repeat(len),
                bin.count,
                width = bar_width
            ));
        }
        out
    }
}
