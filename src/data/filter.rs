use super::model::{Labeling, Value};

// ---------------------------------------------------------------------------
// Label groups: which sample rows belong to which label
// ---------------------------------------------------------------------------

/// Sample rows sharing one label. `label` is `None` for the single group of
/// an unlabeled feature set.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelGroup {
    pub label: Option<Value>,
    pub indices: Vec<usize>,
}

/// Split `n_samples` rows into one group per label, in label order.
///
/// * `Categorical` → one group per distinct label (possibly empty when there
///   are no samples at all)
/// * `Continuous` / `Absent` → a single unlabeled group holding every row
pub fn label_groups(labeling: &Labeling, n_samples: usize) -> Vec<LabelGroup> {
    match labeling {
        Labeling::Categorical { labels, per_sample } => labels
            .iter()
            .map(|label| LabelGroup {
                label: Some(label.clone()),
                indices: indices_with_label(per_sample, label),
            })
            .collect(),
        Labeling::Continuous | Labeling::Absent => vec![LabelGroup {
            label: None,
            indices: (0..n_samples).collect(),
        }],
    }
}

/// Return indices of samples whose target equals `label`.
pub fn indices_with_label(per_sample: &[Value], label: &Value) -> Vec<usize> {
    per_sample
        .iter()
        .enumerate()
        .filter(|(_, v)| *v == label)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::RawColumn;

    #[test]
    fn categorical_groups_follow_label_order() {
        let per_sample = vec![
            Value::String("b".into()),
            Value::String("a".into()),
            Value::String("b".into()),
        ];
        let target = RawColumn::new("target", per_sample.clone());
        let labeling = Labeling::from_target(Some(&target));

        let groups = label_groups(&labeling, per_sample.len());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, Some(Value::String("a".into())));
        assert_eq!(groups[0].indices, vec![1]);
        assert_eq!(groups[1].indices, vec![0, 2]);
    }

    #[test]
    fn unlabeled_is_one_group_of_everything() {
        for labeling in [Labeling::Absent, Labeling::Continuous] {
            let groups = label_groups(&labeling, 3);
            assert_eq!(
                groups,
                vec![LabelGroup {
                    label: None,
                    indices: vec![0, 1, 2]
                }]
            );
        }
    }

    #[test]
    fn null_targets_form_their_own_group() {
        let target = RawColumn::new("target", vec![Value::Integer(1), Value::Null]);
        let groups = label_groups(&Labeling::from_target(Some(&target)), 2);
        assert_eq!(groups[0].label, Some(Value::Null));
        assert_eq!(groups[0].indices, vec![1]);
    }
}
