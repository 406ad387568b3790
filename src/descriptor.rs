use crate::types::FieldValue;

/// Per-position coercion policy, resolved from a tag character.
///
/// Unrecognized characters fall back to [`TypeTag::Escaped`], the same policy
/// as 's'. The tag alphabet is closed here so the rest of the engine never
/// sees raw characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    /// 'i': integral coercion with leading-prefix parsing.
    Int,
    /// 'd': floating-point coercion with leading-prefix parsing.
    Double,
    /// 't': text passed through with escape slashes removed, nothing else.
    RawText,
    /// 'a': text run through the full scrub pipeline, then driver-escaped.
    RichText,
    /// 's' and anything unrecognized: driver escape only.
    Escaped,
}

impl TypeTag {
    #[must_use]
    pub fn from_char(c: char) -> Self {
        match c {
            'i' => Self::Int,
            'd' => Self::Double,
            't' => Self::RawText,
            'a' => Self::RichText,
            _ => Self::Escaped,
        }
    }
}

/// Parameter values as supplied by the caller: one row for ordinary
/// statements, row groups for a repeated insert.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamPayload {
    Row(Vec<FieldValue>),
    Rows(Vec<Vec<FieldValue>>),
}

impl ParamPayload {
    /// Value count as the arity check sees it: values for a single row,
    /// row groups for a batch.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            ParamPayload::Row(values) => values.len(),
            ParamPayload::Rows(groups) => groups.len(),
        }
    }
}

/// A tag string plus the values it describes, position for position.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub tags: String,
    pub payload: ParamPayload,
}

impl ParamDescriptor {
    /// Descriptor for a statement that binds nothing.
    #[must_use]
    pub fn none() -> Self {
        Self {
            tags: String::new(),
            payload: ParamPayload::Row(Vec::new()),
        }
    }

    pub fn row(tags: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Self {
            tags: tags.into(),
            payload: ParamPayload::Row(values),
        }
    }

    pub fn rows(tags: impl Into<String>, groups: Vec<Vec<FieldValue>>) -> Self {
        Self {
            tags: tags.into(),
            payload: ParamPayload::Rows(groups),
        }
    }

    /// Split the descriptor into resolved tags and counts.
    ///
    /// Returns `None` when the tag string is empty, the sentinel for "no
    /// usable descriptor". Count mismatches against the statement's
    /// placeholder count are left to the executor, which knows that count.
    #[must_use]
    pub fn parse(&self) -> Option<ParsedDescriptor> {
        let type_tags: Vec<TypeTag> = self.tags.chars().map(TypeTag::from_char).collect();
        if type_tags.is_empty() {
            return None;
        }
        let format_count = type_tags.len();
        let value_count = self.payload.count();
        Some(ParsedDescriptor {
            type_tags,
            format_count,
            value_count,
        })
    }
}

/// Parser output: resolved tags plus the two counts the arity check uses.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDescriptor {
    pub type_tags: Vec<TypeTag>,
    pub format_count: usize,
    pub value_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_resolve_by_character() {
        let d = ParamDescriptor::row(
            "idtas",
            vec![
                FieldValue::Int(1),
                FieldValue::Float(2.0),
                FieldValue::Text("a".into()),
                FieldValue::Text("b".into()),
                FieldValue::Text("c".into()),
            ],
        );
        let parsed = d.parse().unwrap();
        assert_eq!(
            parsed.type_tags,
            vec![
                TypeTag::Int,
                TypeTag::Double,
                TypeTag::RawText,
                TypeTag::RichText,
                TypeTag::Escaped,
            ]
        );
        assert_eq!(parsed.format_count, 5);
        assert_eq!(parsed.value_count, 5);
    }

    #[test]
    fn unknown_tags_become_escaped() {
        let d = ParamDescriptor::row("xq9", vec![FieldValue::Null; 3]);
        let parsed = d.parse().unwrap();
        assert!(parsed.type_tags.iter().all(|t| *t == TypeTag::Escaped));
    }

    #[test]
    fn empty_tags_are_unusable() {
        assert!(ParamDescriptor::none().parse().is_none());
        let with_values = ParamDescriptor::row("", vec![FieldValue::Int(1)]);
        assert!(with_values.parse().is_none());
    }

    #[test]
    fn row_groups_count_as_groups() {
        let d = ParamDescriptor::rows(
            "is",
            vec![
                vec![FieldValue::Int(1), FieldValue::Text("a".into())],
                vec![FieldValue::Int(2), FieldValue::Text("b".into())],
                vec![FieldValue::Int(3), FieldValue::Text("c".into())],
            ],
        );
        let parsed = d.parse().unwrap();
        assert_eq!(parsed.format_count, 2);
        assert_eq!(parsed.value_count, 3);
    }

    #[test]
    fn counts_do_not_have_to_agree_at_parse_time() {
        // The arity decision belongs to the executor; parsing only reports.
        let d = ParamDescriptor::row("iii", vec![FieldValue::Int(1)]);
        let parsed = d.parse().unwrap();
        assert_eq!(parsed.format_count, 3);
        assert_eq!(parsed.value_count, 1);
    }
}
