//! Named-field access shared by every filterable record type.

use super::FieldValue;

/// A record that search predicates and list filters can inspect.
pub trait Record {
    /// Name used in error messages, e.g. `"run"`.
    const NAME: &'static str;

    /// Every field name [`Record::field`] answers for.
    const FIELDS: &'static [&'static str];

    /// Read a field by name. `None` for names outside [`Record::FIELDS`].
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}
