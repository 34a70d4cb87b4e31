use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::CategoryKey;
use crate::foundation::error::{JourneyError, JourneyResult};

/// A named step in a funnel with its visitor count.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stage {
    pub id: String,
    pub label: String,
    pub count: u64,
    /// Share of the root stage, `0..=100`.
    pub percent_of_root: f64,
    /// Theme key; falls back to `id` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryKey>,
}

impl Stage {
    pub fn new(id: impl Into<String>, label: impl Into<String>, count: u64, percent: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            count,
            percent_of_root: percent,
            category: None,
        }
    }

    pub fn with_category(mut self, category: CategoryKey) -> Self {
        self.category = Some(category);
        self
    }

    pub fn category_key(&self) -> CategoryKey {
        self.category
            .clone()
            .unwrap_or_else(|| CategoryKey::new(self.id.clone()))
    }

    pub fn weight(&self, basis: SizeBasis) -> f64 {
        match basis {
            SizeBasis::Count => self.count as f64,
            SizeBasis::PercentOfRoot => self.percent_of_root,
        }
    }
}

/// Which stage field drives band proportions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeBasis {
    #[default]
    Count,
    PercentOfRoot,
}

/// A transition between two stages, or a drop-off from a stage into the exit sink.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FlowEdge {
    pub from: String,
    /// Destination stage id; `None` for drop-offs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub volume: u64,
    #[serde(default)]
    pub is_dropoff: bool,
}

impl FlowEdge {
    pub fn transition(from: impl Into<String>, to: impl Into<String>, volume: u64) -> Self {
        Self {
            from: from.into(),
            to: Some(to.into()),
            volume,
            is_dropoff: false,
        }
    }

    pub fn dropoff(from: impl Into<String>, volume: u64) -> Self {
        Self {
            from: from.into(),
            to: None,
            volume,
            is_dropoff: true,
        }
    }
}

/// Input document: ordered stages plus the flows between them.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Journey {
    #[serde(default)]
    pub title: String,
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl Journey {
    /// Parse and validate a journey document.
    ///
    /// Decode failures are reported as validation errors: a negative count, for example,
    /// cannot be represented and is rejected here rather than at layout time.
    pub fn from_json_str(s: &str) -> JourneyResult<Self> {
        let journey: Self = serde_json::from_str(s)
            .map_err(|e| JourneyError::validation(format!("invalid journey document: {e}")))?;
        journey.validate()?;
        Ok(journey)
    }

    pub fn from_path(path: &Path) -> JourneyResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read journey '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// A 30-day e-commerce funnel with three transitions and three drop-offs.
    pub fn ecommerce_sample() -> Self {
        Self {
            title: "E-Commerce Customer Journey".to_owned(),
            stages: vec![
                Stage::new("discovery", "Discovery", 10_462, 100.0),
                Stage::new("consideration", "Consideration", 4_835, 46.2),
                Stage::new("purchase", "Purchase", 1_527, 14.6),
                Stage::new("retention", "Retention", 832, 7.9),
            ],
            edges: vec![
                FlowEdge::transition("discovery", "consideration", 4_835),
                FlowEdge::transition("consideration", "purchase", 1_527),
                FlowEdge::transition("purchase", "retention", 832),
                FlowEdge::dropoff("discovery", 5_627),
                FlowEdge::dropoff("consideration", 3_308),
                FlowEdge::dropoff("purchase", 695),
            ],
        }
    }

    pub fn validate(&self) -> JourneyResult<()> {
        if self.stages.is_empty() {
            return Err(JourneyError::validation("journey must have at least one stage"));
        }

        let mut seen = BTreeSet::new();
        for stage in &self.stages {
            if stage.id.trim().is_empty() {
                return Err(JourneyError::validation("stage id must be non-empty"));
            }
            if !seen.insert(stage.id.as_str()) {
                return Err(JourneyError::validation(format!(
                    "duplicate stage id '{}'",
                    stage.id
                )));
            }
            if !stage.percent_of_root.is_finite()
                || !(0.0..=100.0).contains(&stage.percent_of_root)
            {
                return Err(JourneyError::validation(format!(
                    "stage '{}' percent_of_root must be within 0..=100",
                    stage.id
                )));
            }
        }

        let mut outgoing = vec![0u128; self.stages.len()];
        for (i, edge) in self.edges.iter().enumerate() {
            let from = self.stage_index(&edge.from).ok_or_else(|| {
                JourneyError::validation(format!(
                    "edge #{i} references unknown source stage '{}'",
                    edge.from
                ))
            })?;
            match (&edge.to, edge.is_dropoff) {
                (Some(to), false) => {
                    let to_idx = self.stage_index(to).ok_or_else(|| {
                        JourneyError::validation(format!(
                            "edge #{i} references unknown destination stage '{to}'"
                        ))
                    })?;
                    if to_idx == from {
                        return Err(JourneyError::validation(format!(
                            "edge #{i} loops on stage '{to}'"
                        )));
                    }
                }
                (None, true) => {}
                (Some(_), true) => {
                    return Err(JourneyError::validation(format!(
                        "edge #{i} is a drop-off but names a destination stage"
                    )));
                }
                (None, false) => {
                    return Err(JourneyError::validation(format!(
                        "edge #{i} is a transition without a destination stage"
                    )));
                }
            }
            outgoing[from] += u128::from(edge.volume);
        }

        for (stage, total) in self.stages.iter().zip(&outgoing) {
            if *total > u128::from(stage.count) {
                return Err(JourneyError::validation(format!(
                    "outgoing volume {total} exceeds count {} of stage '{}'",
                    stage.count, stage.id
                )));
            }
        }

        if !self.is_monotonic() {
            tracing::debug!(title = %self.title, "stage counts increase along the funnel");
        }
        Ok(())
    }

    pub fn stage_index(&self, id: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.id == id)
    }

    /// Edge indices leaving `stage_idx`, in input order.
    pub fn outgoing(&self, stage_idx: usize) -> impl Iterator<Item = usize> + '_ {
        let id = self.stages.get(stage_idx).map(|s| s.id.as_str());
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, e)| Some(e.from.as_str()) == id)
            .map(|(i, _)| i)
    }

    /// Transition edge indices arriving at `stage_idx`, in input order.
    pub fn incoming(&self, stage_idx: usize) -> impl Iterator<Item = usize> + '_ {
        let id = self.stages.get(stage_idx).map(|s| s.id.as_str());
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, e)| !e.is_dropoff && e.to.as_deref() == id && id.is_some())
            .map(|(i, _)| i)
    }

    /// Whether counts never increase from one stage to the next.
    pub fn is_monotonic(&self) -> bool {
        self.stages.windows(2).all(|w| w[1].count <= w[0].count)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/journey.rs"]
mod tests;
