use serde::{Deserialize, Serialize};

/// Categorical colors for runners, cycled when runners outnumber them.
pub const RUNNER_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Pale background colors for stage bands.
pub const STAGE_PALETTE: [&str; 9] = [
    "#fbb4ae", "#b3cde3", "#ccebc5", "#decbe4", "#fed9a6", "#ffffcc", "#e5d8bd", "#fddaec",
    "#f2f2f2",
];

/// Bar color for intervals without a runner.
pub const DEFAULT_BAR_COLOR: &str = "#4682b4";

/// Assigns palette colors to distinct keys in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorAssignment {
    palette: Vec<String>,
    assigned: Vec<(String, String)>,
}

impl ColorAssignment {
    pub fn new(palette: &[&str]) -> Self {
        Self {
            palette: palette.iter().map(|color| color.to_string()).collect(),
            assigned: Vec::new(),
        }
    }

    /// Returns the color of `key`, assigning the next palette entry on first sight.
    pub fn color_for(&mut self, key: &str) -> String {
        if let Some((_, color)) = self.assigned.iter().find(|(seen, _)| seen == key) {
            return color.clone();
        }
        let color = if self.palette.is_empty() {
            DEFAULT_BAR_COLOR.to_string()
        } else {
            self.palette[self.assigned.len() % self.palette.len()].clone()
        };
        self.assigned.push((key.to_string(), color.clone()));
        color
    }

    /// Keys and colors in assignment order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.assigned
    }
}
