use crate::{casing, prelude::*};

///
/// DetailTab
///
/// A named group of fields on a model's detail surface. Tabs may nest;
/// an empty tab is a placeholder for custom behavior downstream.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DetailTab {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tabs: Vec<DetailTab>,
}

impl DetailTab {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            fields: Vec::new(),
            tabs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_tab(mut self, tab: DetailTab) -> Self {
        self.tabs.push(tab);
        self
    }

    /// User-facing tab name, title-cased from `name` when unset.
    #[must_use]
    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| casing::title(&self.name))
    }

    /// Depth-first field order across this tab and its sub-tabs.
    #[must_use]
    pub fn flatten_fields(&self) -> Vec<String> {
        let mut out = self.fields.clone();

        for tab in &self.tabs {
            out.extend(tab.flatten_fields());
        }

        out
    }
}
