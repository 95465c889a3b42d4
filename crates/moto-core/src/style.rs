//! Route styles, their routing cost profiles and the degradation ladder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named routing preference, ordered from most to least curvy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteStyle {
    Extreme,
    SuperCurvy,
    Curvy,
    CurvyLight,
    /// Fastest; bottom of every ladder.
    Rapid,
}

impl RouteStyle {
    /// Every style, most curvy first.
    pub const ALL: [RouteStyle; 5] = [
        RouteStyle::Extreme,
        RouteStyle::SuperCurvy,
        RouteStyle::Curvy,
        RouteStyle::CurvyLight,
        RouteStyle::Rapid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RouteStyle::Extreme => "extreme",
            RouteStyle::SuperCurvy => "super-curvy",
            RouteStyle::Curvy => "curvy",
            RouteStyle::CurvyLight => "curvy-light",
            RouteStyle::Rapid => "rapid",
        }
    }

    /// Cost profile sent to the routing oracle for this style.
    pub fn cost_profile(&self) -> CostProfile {
        let use_highways = match self {
            RouteStyle::Extreme => 0.05,
            RouteStyle::SuperCurvy => 0.1,
            RouteStyle::Curvy => 0.2,
            RouteStyle::CurvyLight => 0.5,
            RouteStyle::Rapid => 0.9,
        };
        CostProfile {
            costing: "motorcycle",
            use_highways,
            use_tolls: 0.0,
            shortest: false,
            exclude_unpaved: true,
        }
    }
}

impl fmt::Display for RouteStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown route style '{0}'")]
pub struct UnknownStyle(pub String);

impl FromStr for RouteStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "extreme" => Ok(RouteStyle::Extreme),
            "super-curvy" => Ok(RouteStyle::SuperCurvy),
            "curvy" => Ok(RouteStyle::Curvy),
            "curvy-light" => Ok(RouteStyle::CurvyLight),
            "rapid" | "rapido" | "fastest" => Ok(RouteStyle::Rapid),
            other => Err(UnknownStyle(other.to_string())),
        }
    }
}

/// Routing preference weights for the oracle's motorcycle costing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostProfile {
    #[serde(skip)]
    pub costing: &'static str,
    /// 0 avoids highways, 1 prefers them. Low values produce curvier routes.
    pub use_highways: f64,
    pub use_tolls: f64,
    pub shortest: bool,
    pub exclude_unpaved: bool,
}

/// Ordered styles to fall back through when a route is too long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleLadder {
    steps: Vec<RouteStyle>,
    position: usize,
}

impl Default for StyleLadder {
    fn default() -> Self {
        Self::starting_at(RouteStyle::Curvy)
    }
}

impl StyleLadder {
    /// Ladder from `style` down to [`RouteStyle::Rapid`].
    pub fn starting_at(style: RouteStyle) -> Self {
        let steps = RouteStyle::ALL
            .iter()
            .copied()
            .skip_while(|candidate| *candidate != style)
            .collect();
        Self { steps, position: 0 }
    }

    /// Custom ladder. Empty input yields a single-step `Rapid` ladder.
    pub fn from_steps(steps: Vec<RouteStyle>) -> Self {
        let steps = if steps.is_empty() {
            vec![RouteStyle::Rapid]
        } else {
            steps
        };
        Self { steps, position: 0 }
    }

    pub fn current(&self) -> RouteStyle {
        self.steps[self.position]
    }

    /// True when no cheaper style is left.
    pub fn is_last(&self) -> bool {
        self.position + 1 >= self.steps.len()
    }

    /// Move one step down. Returns the new style, or `None` at the bottom.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<RouteStyle> {
        if self.is_last() {
            return None;
        }
        self.position += 1;
        Some(self.current())
    }

    pub fn steps(&self) -> &[RouteStyle] {
        &self.steps
    }
}
