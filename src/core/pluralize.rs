//! Singular forms of resource names for user-facing text

/// Converts plural resource names ("buses", "salaries") to their singular form
pub struct Pluralizer;

impl Pluralizer {
    /// Convert a plural noun to its singular form
    ///
    /// # Examples
    ///
    /// ```
    /// use transit::core::pluralize::Pluralizer;
    ///
    /// assert_eq!(Pluralizer::singularize("buses"), "bus");
    /// assert_eq!(Pluralizer::singularize("salaries"), "salary");
    /// assert_eq!(Pluralizer::singularize("schedules"), "schedule");
    /// ```
    pub fn singularize(plural: &str) -> String {
        match plural {
            // salaries -> salary
            s if s.ends_with("ies") && s.len() > 3 => format!("{}y", &s[..s.len() - 3]),

            // buses, addresses -> remove es
            s if s.len() > 3
                && (s.ends_with("ses")
                    || s.ends_with("shes")
                    || s.ends_with("ches")
                    || s.ends_with("xes")
                    || s.ends_with("zes")) =>
            {
                s[..s.len() - 2].to_string()
            }

            s if s.ends_with("oes") && s.len() > 3 => s[..s.len() - 2].to_string(),

            s if s.ends_with('s') && !s.ends_with("ss") && s.len() > 1 => {
                s[..s.len() - 1].to_string()
            }

            s => s.to_string(),
        }
    }
}
