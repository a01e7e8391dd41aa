use crate::{
    benchmark::{BenchmarkCase, DataSize, ModelCategory},
    common::*,
};

/// Which model categories take part in a benchmark session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModelCategoryFilter {
    /// Every category except `other`.
    Default,
    All,
}

impl Default for ModelCategoryFilter {
    fn default() -> Self {
        Self::Default
    }
}

impl ModelCategoryFilter {
    pub fn accepts(&self, category: ModelCategory) -> bool {
        match self {
            Self::Default => category != ModelCategory::Other,
            Self::All => true,
        }
    }
}

/// Which dataset sizes take part in a benchmark session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DataGroup {
    Small,
    Medium,
    Large,
    All,
}

impl Default for DataGroup {
    fn default() -> Self {
        Self::All
    }
}

impl DataGroup {
    pub fn accepts(&self, size: DataSize) -> bool {
        match self {
            Self::Small => size == DataSize::Small,
            Self::Medium => size == DataSize::Medium,
            Self::Large => size == DataSize::Large,
            Self::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CaseFilter {
    #[serde(default)]
    pub model_category: ModelCategoryFilter,
    #[serde(default)]
    pub data_group: DataGroup,
}

impl CaseFilter {
    pub fn accepts(&self, case: &BenchmarkCase) -> bool {
        self.model_category.accepts(case.model.category)
            && self.data_group.accepts(case.dataset.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn model_category_filter_test() {
        assert!(ModelCategoryFilter::Default.accepts(ModelCategory::Speed));
        assert!(!ModelCategoryFilter::Default.accepts(ModelCategory::Other));
        assert!(ModelCategoryFilter::All.accepts(ModelCategory::Other));
        assert_eq!(
            ModelCategoryFilter::from_str("all").unwrap(),
            ModelCategoryFilter::All
        );
    }

    #[test]
    fn data_group_test() {
        assert!(DataGroup::Medium.accepts(DataSize::Medium));
        assert!(!DataGroup::Medium.accepts(DataSize::Large));
        assert!(DataGroup::All.accepts(DataSize::Small));
        assert_eq!(DataGroup::from_str("large").unwrap(), DataGroup::Large);
        assert!(DataGroup::from_str("huge").is_err());
    }
}
