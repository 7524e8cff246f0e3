//! Upload categories

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Independent upload partition chosen by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Application/registration data used by the descriptive pages
    Descriptive,
    /// Historic enrollment summaries and forecast workbooks
    Forecast,
}

/// Error returned when a category tag is not recognised
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct ParseCategoryError(pub String);

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 2] = [Category::Descriptive, Category::Forecast];

    /// Stable tag used for directory names and manifests
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Descriptive => "descriptive",
            Category::Forecast => "forecast",
        }
    }

    /// Label shown in the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            Category::Descriptive => "Application description",
            Category::Forecast => "Enrollment forecast",
        }
    }

    /// Categories covered by an optional filter, `None` meaning all of them
    pub fn selection(filter: Option<Category>) -> Vec<Category> {
        match filter {
            Some(category) => vec![category],
            None => Self::ALL.to_vec(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "descriptive" => Ok(Category::Descriptive),
            "forecast" => Ok(Category::Forecast),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}
