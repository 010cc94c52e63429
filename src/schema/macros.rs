/// Declare the [`Entity`](crate::schema::Entity) descriptor for an existing struct.
///
/// Each field maps to the column of the same name (override with `as "column"`); a
/// timestamp field may carry its own encoding layout after `=>`.
///
/// ```rust
/// use chrono::NaiveDateTime;
/// use sql_rowmap::prelude::*;
///
/// #[derive(Debug, Default)]
/// struct Article {
///     id: i64,
///     title: String,
///     created: NaiveDateTime,
/// }
///
/// sql_rowmap::entity! {
///     Article in "article" pk "id" {
///         id: i64,
///         title: String,
///         created as "createdatetime": NaiveDateTime => "2006/01/02 15:04:05",
///     }
/// }
///
/// assert_eq!(Article::schema().table(), "article");
/// assert_eq!(Article::schema().field_index("CREATEDATETIME"), Some(2));
/// ```
#[macro_export]
macro_rules! entity {
    (
        $ty:ident in $table:literal $(pk $pk:literal)? {
            $( $field:ident $(as $column:literal)? : $fty:ty $(=> $layout:literal)? ),* $(,)?
        }
    ) => {
        impl $crate::schema::Entity for $ty {
            fn schema() -> &'static $crate::schema::Schema<Self> {
                static SCHEMA: ::std::sync::OnceLock<$crate::schema::Schema<$ty>> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    let builder = $crate::schema::Schema::<$ty>::builder($table)
                        .element(stringify!($ty))
                        $(.primary_key($pk))?;
                    $(
                        let builder = builder.field(
                            $crate::__entity_column!($field $(, $column)?),
                            |row: &mut $ty, value: &$crate::RowValues| {
                                row.$field =
                                    <$fty as $crate::schema::FromRowValue>::from_row_value(value)?;
                                Ok(())
                            },
                            |row: &$ty| $crate::schema::ToRowValue::to_row_value(&row.$field),
                        );
                        $(
                            let builder = builder.date_layout($layout).unwrap_or_else(|e| {
                                panic!("invalid layout on {}.{}: {e}", stringify!($ty), stringify!($field))
                            });
                        )?
                    )*
                    builder
                        .build()
                        .unwrap_or_else(|e| panic!("invalid schema for {}: {e}", stringify!($ty)))
                })
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __entity_column {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $column:literal) => {
        $column
    };
}
