//! Content model registration
//!
//! Declares the ticket post type, its meta fields and the category taxonomy.
//! Registration happens once at startup through [`register_ticket_model`];
//! registering a name that already exists is a no-op.

use super::meta::{MetaField, ticket_meta_fields};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const TICKET_POST_TYPE: &str = "tickefic_ticket";
pub const CATEGORY_TAXONOMY: &str = "tickefic_cat";

/// Editor features a post type opts into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Support {
    Title,
    Editor,
    Thumbnail,
    CustomFields,
    Comments,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTypeSpec {
    pub name: String,
    pub label: String,
    pub description: String,
    pub public: bool,
    pub hierarchical: bool,
    pub show_in_rest: bool,
    /// Path segment under `/wp/v2/` for the generic CRUD routes
    pub rest_base: String,
    pub supports: Vec<Support>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomySpec {
    pub name: String,
    pub label: String,
    pub object_types: Vec<String>,
    pub hierarchical: bool,
    pub show_in_rest: bool,
    pub rewrite_slug: String,
}

/// Registry of post types, meta fields and taxonomies
#[derive(Debug, Default, Clone)]
pub struct ContentModel {
    post_types: BTreeMap<String, PostTypeSpec>,
    meta: BTreeMap<String, Vec<MetaField>>,
    taxonomies: BTreeMap<String, TaxonomySpec>,
}

impl ContentModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a post type; returns `false` if it was already registered
    pub fn register_post_type(&mut self, spec: PostTypeSpec) -> bool {
        if self.post_type_exists(&spec.name) {
            debug!(post_type = %spec.name, "post type already registered");
            return false;
        }
        self.post_types.insert(spec.name.clone(), spec);
        true
    }

    #[must_use]
    pub fn post_type_exists(&self, name: &str) -> bool {
        self.post_types.contains_key(name)
    }

    #[must_use]
    pub fn post_type(&self, name: &str) -> Option<&PostTypeSpec> {
        self.post_types.get(name)
    }

    #[must_use]
    pub fn supports(&self, post_type: &str, feature: Support) -> bool {
        self.post_type(post_type)
            .is_some_and(|spec| spec.supports.contains(&feature))
    }

    /// Register a meta field; returns `false` if the key already exists for the type
    pub fn register_post_meta(&mut self, post_type: &str, field: MetaField) -> bool {
        let fields = self.meta.entry(post_type.to_string()).or_default();
        if fields.iter().any(|f| f.key == field.key) {
            return false;
        }
        fields.push(field);
        true
    }

    /// Registered meta fields for `post_type`, in registration order
    #[must_use]
    pub fn meta_fields(&self, post_type: &str) -> &[MetaField] {
        self.meta.get(post_type).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn register_taxonomy(&mut self, spec: TaxonomySpec) -> bool {
        if self.taxonomies.contains_key(&spec.name) {
            return false;
        }
        self.taxonomies.insert(spec.name.clone(), spec);
        true
    }

    #[must_use]
    pub fn taxonomy(&self, name: &str) -> Option<&TaxonomySpec> {
        self.taxonomies.get(name)
    }

    /// Taxonomies attached to `post_type`
    pub fn taxonomies_for<'a>(&'a self, post_type: &'a str) -> impl Iterator<Item = &'a TaxonomySpec> + 'a {
        self.taxonomies
            .values()
            .filter(move |t| t.object_types.iter().any(|o| o == post_type))
    }
}

#[must_use]
pub fn ticket_post_type() -> PostTypeSpec {
    PostTypeSpec {
        name: TICKET_POST_TYPE.to_string(),
        label: "Ticket".to_string(),
        description: "Custom Post Type for Tickets".to_string(),
        public: true,
        hierarchical: true,
        show_in_rest: true,
        rest_base: "tickefic/tickets".to_string(),
        supports: vec![
            Support::Title,
            Support::Editor,
            Support::Thumbnail,
            Support::CustomFields,
            Support::Comments,
        ],
    }
}

#[must_use]
pub fn ticket_taxonomy() -> TaxonomySpec {
    TaxonomySpec {
        name: CATEGORY_TAXONOMY.to_string(),
        label: "Ticket Categories".to_string(),
        object_types: vec![TICKET_POST_TYPE.to_string()],
        hierarchical: true,
        show_in_rest: true,
        rewrite_slug: "ticket-category".to_string(),
    }
}

/// Register the ticket type, its meta fields and the category taxonomy
pub fn register_ticket_model(model: &mut ContentModel) {
    model.register_post_type(ticket_post_type());
    for field in ticket_meta_fields() {
        model.register_post_meta(TICKET_POST_TYPE, field);
    }
    model.register_taxonomy(ticket_taxonomy());
}
