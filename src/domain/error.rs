use thiserror::Error;

/// A single field constraint that a product payload failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: &'static str,
}

/// Every violated field of a payload, in the order the checks ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", render(.violations))]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: &'static str) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: &'static str) {
        self.violations.push(FieldViolation { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected violations.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn render(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_every_violation() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "must not be empty");
        errors.push("price", "must be greater than zero");

        assert_eq!(
            errors.to_string(),
            "name: must not be empty; price: must be greater than zero"
        );
        assert_eq!(errors.fields(), vec!["name", "price"]);
    }

    #[test]
    fn violations_surface_as_a_std_error() {
        let errors = ValidationErrors::single("stock", "must not be negative");
        let boxed: Box<dyn std::error::Error> = Box::new(errors);
        assert_eq!(boxed.to_string(), "stock: must not be negative");
        assert!(boxed.source().is_none());
    }

    #[test]
    fn empty_collection_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
        assert!(ValidationErrors::single("stock", "x").into_result().is_err());
    }
}
