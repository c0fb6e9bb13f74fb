//! Select-list options offered by the queue site.

/// One entry of the unit ("poli") or practitioner select list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FacilityOption {
    /// The `value` attribute submitted back to the site.
    pub code: String,
    /// Human readable text of the option.
    pub label: String,
}

impl FacilityOption {
    /// Create a new option.
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// Look up the label for `code` in a list of options.
pub fn label_for<'a>(options: &'a [FacilityOption], code: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|o| o.code == code)
        .map(|o| o.label.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_for() {
        let options = vec![
            FacilityOption::new("INT", "Poli Penyakit Dalam"),
            FacilityOption::new("ANK", "Poli Anak"),
        ];

        assert_eq!(label_for(&options, "ANK"), Some("Poli Anak"));
        assert_eq!(label_for(&options, "GIG"), None);
    }
}
