use crate::error::{ErrorKind, Result};
use mediadex_catalog::{CatalogEntry, SearchField};

/// The title field every document has.
pub const NAME_FIELD: &str = "name";
/// Relevance boost of the title field.
pub const NAME_BOOST: f64 = 3.0;
const MIN_KEYWORD_BOOST: f64 = 1.0;
const MAX_KEYWORD_BOOST: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub boost: f64,
}

/// Searchable fields of an inverted index, in declaration order.
///
/// The title always comes first. Keyword fields are the union of what every
/// provider of a kind declares; a field two providers both declare must agree
/// on its boost.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}
impl Default for Schema {
    fn default() -> Self {
        Self { fields: vec![Field { name: NAME_FIELD.to_string(), boost: NAME_BOOST }] }
    }
}
impl Schema {
    pub fn new<'a>(declared: impl IntoIterator<Item = &'a SearchField>) -> Result<Self> {
        let mut schema = Self::default();
        for field in declared {
            schema.declare(field)?;
        }
        Ok(schema)
    }

    /// Add one provider-declared keyword field.
    pub fn declare(&mut self, field: &SearchField) -> Result<()> {
        let name = field.name.trim();
        if name.is_empty() || name == NAME_FIELD {
            exn::bail!(ErrorKind::InvalidField(field.name.clone()));
        }
        if !field.boost.is_finite() || !(MIN_KEYWORD_BOOST..=MAX_KEYWORD_BOOST).contains(&field.boost) {
            exn::bail!(ErrorKind::InvalidBoost(format!("{name} = {}", field.boost)));
        }
        match self.fields.iter().find(|existing| existing.name == name) {
            Some(existing) if existing.boost == field.boost => {},
            Some(_) => exn::bail!(ErrorKind::DuplicateField(name.to_string())),
            None => self.fields.push(Field { name: name.to_string(), boost: field.boost }),
        }
        Ok(())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Text of each field for one entry, in field order. A keyword field the
    /// entry doesn't carry is empty.
    pub(crate) fn texts<'e>(&self, entry: &'e CatalogEntry) -> impl Iterator<Item = &'e str> {
        self.fields.iter().map(move |field| match field.name.as_str() {
            NAME_FIELD => entry.name(),
            other => entry.keywords.get(other).map(String::as_str).unwrap_or_default(),
        })
    }
}
