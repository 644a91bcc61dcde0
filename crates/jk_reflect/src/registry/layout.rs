use alloc::borrow::Cow;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use jk_utils::hash::HashMap;

use crate::info::{FieldDescriptor, RecordInfo, RenameRule};
use crate::registry::hierarchy::Tag;

// -----------------------------------------------------------------------------
// Encoding

/// Encoding options declared at runtime, overlaid on the type's attributes.
#[derive(Clone, Debug, Default)]
pub(crate) struct Encoding {
    pub list: bool,
    pub renames: HashMap<String, String>,
    pub rename_all: Option<RenameRule>,
    pub unserializable: bool,
}

// -----------------------------------------------------------------------------
// RecordLayout

/// How one record type is written, with inherited settings applied.
///
/// Computed per call from the registry tables; never cached, so later
/// declarations take effect immediately.
#[derive(Debug)]
pub(crate) struct RecordLayout {
    pub info: &'static RecordInfo,
    /// Resolved descriptors, aligned with `RecordInfo::fields`.
    pub fields: Arc<[FieldDescriptor]>,
    /// Wire name of each field, aligned with `fields`.
    pub names: Vec<Cow<'static, str>>,
    pub list: bool,
    pub unserializable: bool,
    pub tag: Option<Tag>,
}

impl RecordLayout {
    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.info.type_path()
    }

    /// The discriminator written into this record's own payload.
    #[inline]
    pub fn inside_tag(&self) -> Option<&Tag> {
        self.tag.as_ref().filter(|tag| tag.is_inside())
    }

    /// Number of leading positional slots that must be present.
    pub fn required_len(&self) -> usize {
        self.fields
            .iter()
            .rposition(|field| !field.has_default())
            .map_or(0, |index| index + 1)
    }
}

/// Computes the wire name of every field.
///
/// The field name goes through the rename rule first (own, else the
/// root's); explicit mappings then overlay it in order: the root's runtime
/// mapping, the field's own attribute, the record's runtime mapping.
pub(crate) fn wire_names(
    info: &RecordInfo,
    own: Option<&Encoding>,
    root: Option<&Encoding>,
) -> Vec<Cow<'static, str>> {
    let rule = own
        .and_then(|encoding| encoding.rename_all)
        .or(info.attrs().rename_all)
        .or_else(|| root.and_then(|encoding| encoding.rename_all));

    info.fields()
        .iter()
        .map(|field| {
            let name = field.name();
            let mut wire = match rule {
                Some(rule) => rule.apply(name),
                None => Cow::Borrowed(name),
            };
            if let Some(mapped) = root.and_then(|encoding| encoding.renames.get(name)) {
                wire = Cow::Owned(mapped.clone());
            }
            if let Some(renamed) = field.rename() {
                wire = Cow::Borrowed(renamed);
            }
            if let Some(mapped) = own.and_then(|encoding| encoding.renames.get(name)) {
                wire = Cow::Owned(mapped.clone());
            }
            wire
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::{Encoding, wire_names};
    use crate::derive::Record;
    use crate::info::{RenameRule, Typed};

    #[derive(Record)]
    struct Sample {
        max_size: u32,
        #[record(rename = "label")]
        display_name: String,
        count: u32,
    }

    #[test]
    fn child_mappings_overlay_the_root() {
        let info = Sample::type_info().as_record().unwrap();

        let mut root = Encoding {
            rename_all: Some(RenameRule::CamelCase),
            ..Encoding::default()
        };
        root.renames.insert("count".into(), "n".into());
        root.renames.insert("display_name".into(), "title".into());

        let mut own = Encoding::default();
        own.renames.insert("count".into(), "total".into());

        assert_eq!(wire_names(info, None, Some(&root)), vec!["maxSize", "label", "n"]);
        assert_eq!(
            wire_names(info, Some(&own), Some(&root)),
            vec!["maxSize", "label", "total"]
        );
        assert_eq!(wire_names(info, None, None), vec!["max_size", "label", "count"]);
    }
}
