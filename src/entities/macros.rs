//! Macros for reducing boilerplate when defining console records
//!
//! These generate the struct and the [`Record`](crate::core::record::Record)
//! implementation needed for each typed entity.

/// Create a typed record with an automatic `Record` implementation
///
/// The struct gets an `id: String` field plus the declared fields. On the
/// wire, field names are camelCase (`plateNumber`); inside the pipeline,
/// fields are addressed by their Rust names (`plate_number`).
///
/// # Example
///
/// ```rust,ignore
/// use transit::prelude::*;
///
/// impl_record!(
///     Depot,
///     "depots",
///     {
///         name: String,
///         bays: i64,
///         opened_at: Option<DateTime<Utc>>,
///     }
/// );
///
/// let depot = Depot::new("d1", "Central".to_string(), 12, None);
/// assert_eq!(depot.field_text("bays"), "12");
/// ```
#[macro_export]
macro_rules! impl_record {
    (
        $type:ident,
        $resource:expr,
        {
            $( $field:ident : $field_type:ty ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $type {
            /// Unique identifier, assigned by the backend when empty
            #[serde(default)]
            pub id: String,
            $( pub $field : $field_type ),*
        }

        impl $crate::core::record::Record for $type {
            fn resource_name() -> &'static str {
                $resource
            }

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn field_value(&self, field: &str) -> Option<$crate::core::field::FieldValue> {
                use $crate::core::field::ToFieldValue;
                match field {
                    "id" => Some(self.id.to_field_value()),
                    $( stringify!($field) => Some(self.$field.to_field_value()), )*
                    _ => None,
                }
            }

            fn field_names() -> &'static [&'static str] {
                &[ "id", $( stringify!($field) ),* ]
            }
        }

        impl $type {
            /// Create a new instance of this record
            #[allow(clippy::too_many_arguments)]
            pub fn new(
                id: impl Into<String>,
                $( $field: $field_type ),*
            ) -> Self {
                Self {
                    id: id.into(),
                    $( $field ),*
                }
            }
        }
    };
}
