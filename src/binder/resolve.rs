//! Source resolution for source-bound fields.

use super::descriptor::{Field, Source};
use crate::request::RequestInputs;

/// Finds the raw value for a field.
///
/// The field's own tags are consulted in priority order (param, query, form,
/// header) and the first non-empty value wins. Sources the field has no tag
/// for are never consulted, and an absent value is not an error.
pub(crate) fn resolve<'i, T>(
    inputs: &'i RequestInputs,
    field: &Field<T>,
) -> Option<(Source, &'i str)> {
    field.sources().find_map(|(source, tag)| {
        inputs
            .lookup(source, tag)
            .filter(|raw| !raw.is_empty())
            .map(|raw| (source, raw))
    })
}
