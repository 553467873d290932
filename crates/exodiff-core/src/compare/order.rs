//! Name-based reordering of the indexed result-variable families.
//!
//! Exodus stores the values of element, nodal, side-set and node-set result
//! variables under names carrying a 1-based index (`vals_elem_var3eb1`), and
//! the index refers to a row of the family's name table (`name_elem_var`).
//! Two equivalent files may list the same variables in a different order, so
//! the index in file 1 is translated to the index of the same name in file 2.

use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexedFamily {
    Element,
    Nodal,
    SideSet,
    NodeSet,
}

impl IndexedFamily {
    pub const ALL: [Self; 4] = [Self::Element, Self::Nodal, Self::SideSet, Self::NodeSet];

    /// Token used in variable names: `vals_<token>_var<N>`.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Element => "elem",
            Self::Nodal => "nod",
            Self::SideSet => "sset",
            Self::NodeSet => "nset",
        }
    }

    /// Text variable holding the family's variable names.
    pub const fn name_table(self) -> &'static str {
        match self {
            Self::Element => "name_elem_var",
            Self::Nodal => "name_nod_var",
            Self::SideSet => "name_sset_var",
            Self::NodeSet => "name_nset_var",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.token() == token)
    }
}

impl Display for IndexedFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// A parsed `vals_<family>_var<index><suffix>` variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyVariable<'a> {
    pub family: IndexedFamily,
    pub index: usize,
    /// Block or set qualifier such as `eb1`; empty for nodal variables.
    pub suffix: &'a str,
}

impl<'a> FamilyVariable<'a> {
    pub fn parse(name: &'a str) -> Option<Self> {
        let rest = name.strip_prefix("vals_")?;
        let (token, rest) = rest.split_once("_var")?;
        let family = IndexedFamily::from_token(token)?;

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let index: usize = rest[..digits].parse().ok()?;
        if index == 0 {
            return None;
        }
        Some(Self {
            family,
            index,
            suffix: &rest[digits..],
        })
    }

    /// The same variable with a different index.
    pub fn name_with_index(&self, index: usize) -> String {
        format!("vals_{}_var{}{}", self.family.token(), index, self.suffix)
    }
}

/// Combined nodal layout: every nodal variable in one
/// `(time_step, num_nod_var, num_nodes)` array.
pub const COMBINED_NODAL_VALUES: &str = "vals_nod_var";

/// For each entry of file 1's name table, the 1-based position of the same
/// name in file 2's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermutationMap {
    positions: Vec<usize>,
}

impl PermutationMap {
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Maps a 1-based index of file 1 to the 1-based index in file 2.
    pub fn remap(&self, index: usize) -> Option<usize> {
        index
            .checked_sub(1)
            .and_then(|zero_based| self.positions.get(zero_based))
            .copied()
    }

    pub fn is_identity(&self) -> bool {
        self.positions
            .iter()
            .enumerate()
            .all(|(index, position)| *position == index + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("name '{name}' of '{table}' matches {matches} entries in the second file, expected exactly one")]
pub struct PermutationError {
    pub table: String,
    pub name: String,
    pub matches: usize,
}

/// Builds the permutation between two name tables whose name sets are
/// already known to be equal. A name that matches zero or several entries
/// of file 2 is an error, never a guess.
pub fn resolve_permutation(
    table: &str,
    file1_names: &[String],
    file2_names: &[String],
) -> Result<PermutationMap, PermutationError> {
    let mut positions = Vec::with_capacity(file1_names.len());
    for name in file1_names {
        let mut matches = file2_names
            .iter()
            .enumerate()
            .filter(|(_, candidate)| *candidate == name)
            .map(|(index, _)| index + 1);
        let (Some(position), None) = (matches.next(), matches.next()) else {
            return Err(PermutationError {
                table: table.to_string(),
                name: name.clone(),
                matches: file2_names.iter().filter(|candidate| *candidate == name).count(),
            });
        };
        positions.push(position);
    }
    Ok(PermutationMap { positions })
}

#[cfg(test)]
mod tests {
    use super::{FamilyVariable, IndexedFamily, PermutationError, resolve_permutation};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn resolves_positions_of_file1_names_in_file2() {
        let file1 = strings(&["variable1", "variable2", "variable3", "variable4"]);
        let file2 = strings(&["variable3", "variable4", "variable1", "variable2"]);

        let map = resolve_permutation("varnames", &file1, &file2).expect("names should resolve");
        assert_eq!(map.positions(), &[3, 4, 1, 2]);
        assert_eq!(map.remap(1), Some(3));
        assert_eq!(map.remap(0), None);
        assert_eq!(map.remap(5), None);
        assert!(!map.is_identity());

        let identity =
            resolve_permutation("varnames", &file1, &file1).expect("names should resolve");
        assert!(identity.is_identity());
    }

    #[test]
    fn unmatched_or_duplicated_names_are_errors() {
        let missing = resolve_permutation(
            "name_elem_var",
            &strings(&["stress", "foo"]),
            &strings(&["stress", "strain"]),
        );
        assert_eq!(
            missing,
            Err(PermutationError {
                table: "name_elem_var".to_string(),
                name: "foo".to_string(),
                matches: 0,
            })
        );

        let duplicated = resolve_permutation(
            "name_elem_var",
            &strings(&["stress", "stress"]),
            &strings(&["stress", "stress"]),
        );
        assert!(matches!(duplicated, Err(PermutationError { matches: 2, .. })));
    }

    #[test]
    fn parses_family_variable_names() {
        let element = FamilyVariable::parse("vals_elem_var12eb3").expect("name should parse");
        assert_eq!(element.family, IndexedFamily::Element);
        assert_eq!(element.index, 12);
        assert_eq!(element.suffix, "eb3");
        assert_eq!(element.name_with_index(2), "vals_elem_var2eb3");

        let nodal = FamilyVariable::parse("vals_nod_var2").expect("name should parse");
        assert_eq!(nodal.family, IndexedFamily::Nodal);
        assert_eq!(nodal.suffix, "");

        let side_set = FamilyVariable::parse("vals_sset_var1ss4").expect("name should parse");
        assert_eq!(side_set.family, IndexedFamily::SideSet);
        let node_set = FamilyVariable::parse("vals_nset_var5ns1").expect("name should parse");
        assert_eq!(node_set.family, IndexedFamily::NodeSet);
        assert_eq!(node_set.index, 5);
    }

    #[test]
    fn rejects_names_outside_the_four_families() {
        for name in [
            "vals_nod_var",
            "vals_glo_var",
            "vals_elem_var0eb1",
            "vals_elem_vareb1",
            "name_elem_var",
            "coordx",
            "vals_face_var1",
        ] {
            assert_eq!(FamilyVariable::parse(name), None, "{name} should not parse");
        }
    }
}
