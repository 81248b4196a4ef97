//! Small helpers shared by the catalog modules.

/// Log prefix naming the catalog module a log line comes from.
pub fn log_prefix(module: &str) -> String {
    format!("catalog::{module}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_names_the_module() {
        assert_eq!(log_prefix("books"), "catalog::books");
    }
}
