use super::report::DimensionDiff;
use crate::dataset::Dimension;
use crate::policy::NameFilter;

/// Compares every non-excluded dimension of file 1 with the dimension of the
/// same name in file 2, in file 1 order. Dimensions that only exist in file 2
/// are not reported.
pub fn compare_dimensions(
    file1: &[Dimension],
    file2: &[Dimension],
    excluded: &NameFilter,
) -> Vec<(String, DimensionDiff)> {
    file1
        .iter()
        .filter(|dimension| !excluded.matches(&dimension.name))
        .filter_map(|dimension| {
            let counterpart = file2.iter().find(|other| other.name == dimension.name);
            match counterpart {
                Some(other) if other.size == dimension.size => None,
                _ => Some((
                    dimension.name.clone(),
                    DimensionDiff {
                        file1: dimension.size,
                        file2: counterpart.map(|other| other.size),
                    },
                )),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::compare_dimensions;
    use crate::compare::report::DimensionDiff;
    use crate::dataset::Dimension;
    use crate::policy::{NameFilter, STRING_LENGTH_DIMENSIONS};

    fn dims(entries: &[(&str, u64)]) -> Vec<Dimension> {
        entries
            .iter()
            .map(|(name, size)| Dimension::new(*name, *size))
            .collect()
    }

    #[test]
    fn string_length_dimensions_are_ignored() {
        let file1 = dims(&[
            ("num_nodes", 10),
            ("len_string", 33),
            ("len_name", 33),
            ("len_line", 81),
        ]);
        let file2 = dims(&[("num_nodes", 10), ("len_string", 256), ("len_name", 256)]);

        let diffs = compare_dimensions(&file1, &file2, &NameFilter::string_lengths());
        assert!(diffs.is_empty());
        assert_eq!(STRING_LENGTH_DIMENSIONS.len(), 3);
    }

    #[test]
    fn reports_size_changes_and_missing_dimensions_in_file1_order() {
        let file1 = dims(&[("num_nodes", 10), ("num_elem", 4), ("num_dim", 3)]);
        let file2 = dims(&[("num_dim", 2), ("num_nodes", 12), ("num_side_sets", 1)]);

        let diffs = compare_dimensions(&file1, &file2, &NameFilter::string_lengths());
        assert_eq!(
            diffs,
            vec![
                (
                    "num_nodes".to_string(),
                    DimensionDiff {
                        file1: 10,
                        file2: Some(12)
                    }
                ),
                (
                    "num_elem".to_string(),
                    DimensionDiff {
                        file1: 4,
                        file2: None
                    }
                ),
                (
                    "num_dim".to_string(),
                    DimensionDiff {
                        file1: 3,
                        file2: Some(2)
                    }
                ),
            ]
        );
    }

    #[test]
    fn extra_patterns_extend_the_exclusions() {
        let file1 = dims(&[("num_qa_rec", 1), ("num_info", 3)]);
        let file2 = dims(&[("num_qa_rec", 2), ("num_info", 5)]);
        let filter = NameFilter::new(&["num_qa_rec".to_string(), "num_*".to_string()])
            .expect("patterns should compile");

        assert!(compare_dimensions(&file1, &file2, &filter).is_empty());
    }
}
