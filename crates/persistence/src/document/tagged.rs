//! An entity with a list field. No stored entity has one yet, so the
//! `arrayContains` path is exercised through this.

use common::AppResult;
use serde::{Deserialize, Serialize};

use crate::mappers::EntityMapper;
use crate::schema::{FieldDef, FieldKind, Persistable};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Tagged {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct TaggedPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

const TAGGED_FIELDS: &[FieldDef] = &[
    FieldDef::new("id", FieldKind::Text),
    FieldDef::new("name", FieldKind::Text),
    FieldDef::new("tags", FieldKind::TextArray),
];

impl Persistable for Tagged {
    type Patch = TaggedPatch;
    const NAME: &'static str = "tagged";

    fn fields() -> &'static [FieldDef] {
        TAGGED_FIELDS
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TaggedDoc {
    #[serde(skip_serializing)]
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
}

pub(crate) struct TaggedDocMapper;

impl EntityMapper for TaggedDocMapper {
    type Domain = Tagged;
    type Persisted = TaggedDoc;

    fn to_domain(d: TaggedDoc) -> AppResult<Tagged> {
        Ok(Tagged {
            id: d.id,
            name: d.name,
            tags: d.tags,
        })
    }

    fn to_persistence(t: &Tagged) -> TaggedDoc {
        TaggedDoc {
            id: t.id.clone(),
            name: t.name.clone(),
            tags: t.tags.clone(),
        }
    }
}
