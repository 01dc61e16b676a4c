use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Roots, their sub-options, and deep options.
pub const MAX_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(value: &str) -> Self {
        CategoryId(value.to_string())
    }
}

/// A node in the category hierarchy ("parent role" when it has no parent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CategoryId>,
}

/// Admin request to create a category. Without an `id` one is generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewCategory {
    #[serde(default)]
    pub id: Option<CategoryId>,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

impl NewCategory {
    pub fn root(id: &str, label: &str) -> Self {
        Self {
            id: Some(CategoryId::from(id)),
            label: label.to_string(),
            description: None,
            parent_id: None,
        }
    }

    pub fn child(id: &str, label: &str, parent: &str) -> Self {
        Self {
            parent_id: Some(CategoryId::from(parent)),
            ..Self::root(id, label)
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryError {
    #[error("category label must not be empty")]
    EmptyLabel,
    #[error("category '{0}' already exists")]
    DuplicateId(CategoryId),
    #[error("parent category '{0}' does not exist")]
    UnknownParent(CategoryId),
    #[error("category '{0}' not found")]
    NotFound(CategoryId),
    #[error("category '{0}' still has sub-categories")]
    HasChildren(CategoryId),
    #[error("categories may nest at most {max} levels deep")]
    DepthExceeded { max: usize },
    #[error("category catalog unavailable")]
    Unavailable,
}

impl CategoryError {
    pub const fn kind(&self) -> &'static str {
        match self {
            CategoryError::EmptyLabel => "empty_label",
            CategoryError::DuplicateId(_) => "duplicate_id",
            CategoryError::UnknownParent(_) => "unknown_parent",
            CategoryError::NotFound(_) => "not_found",
            CategoryError::HasChildren(_) => "has_children",
            CategoryError::DepthExceeded { .. } => "depth_exceeded",
            CategoryError::Unavailable => "catalog_unavailable",
        }
    }
}

/// In-memory hierarchy kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: Vec<Category>,
    next_id: u64,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Category] {
        &self.nodes
    }

    pub fn get(&self, id: &CategoryId) -> Option<&Category> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn roots(&self) -> Vec<&Category> {
        self.nodes
            .iter()
            .filter(|node| node.parent_id.is_none())
            .collect()
    }

    /// Children of any of `parents`, in insertion order.
    pub fn children_of(&self, parents: &[CategoryId]) -> Vec<&Category> {
        let parents: HashSet<&CategoryId> = parents.iter().collect();
        self.nodes
            .iter()
            .filter(|node| {
                node.parent_id
                    .as_ref()
                    .is_some_and(|parent| parents.contains(parent))
            })
            .collect()
    }

    /// Number of levels from the root down to `id` (roots are depth 1).
    pub fn depth(&self, id: &CategoryId) -> Option<usize> {
        let mut depth = 0;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.get(current)?;
            depth += 1;
            if depth > self.nodes.len() {
                // Parent cycle; `insert` never builds one.
                return None;
            }
            cursor = node.parent_id.as_ref();
        }
        Some(depth)
    }

    pub fn insert(&mut self, request: NewCategory) -> Result<Category, CategoryError> {
        let label = request.label.trim();
        if label.is_empty() {
            return Err(CategoryError::EmptyLabel);
        }

        if let Some(parent) = &request.parent_id {
            let parent_depth = self
                .depth(parent)
                .ok_or_else(|| CategoryError::UnknownParent(parent.clone()))?;
            if parent_depth >= MAX_DEPTH {
                return Err(CategoryError::DepthExceeded { max: MAX_DEPTH });
            }
        }

        let id = match request.id {
            Some(id) if self.get(&id).is_some() => return Err(CategoryError::DuplicateId(id)),
            Some(id) => id,
            None => self.generate_id(),
        };

        let category = Category {
            id,
            label: label.to_string(),
            description: clean_description(request.description),
            parent_id: request.parent_id,
        };
        self.nodes.push(category.clone());
        Ok(category)
    }

    pub fn rename(
        &mut self,
        id: &CategoryId,
        label: &str,
        description: Option<String>,
    ) -> Result<Category, CategoryError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(CategoryError::EmptyLabel);
        }

        let node = self
            .nodes
            .iter_mut()
            .find(|node| &node.id == id)
            .ok_or_else(|| CategoryError::NotFound(id.clone()))?;
        node.label = label.to_string();
        node.description = clean_description(description);
        Ok(node.clone())
    }

    /// Remove a leaf category. Parents must be emptied first.
    pub fn remove(&mut self, id: &CategoryId) -> Result<Category, CategoryError> {
        let position = self
            .nodes
            .iter()
            .position(|node| &node.id == id)
            .ok_or_else(|| CategoryError::NotFound(id.clone()))?;

        if !self.children_of(std::slice::from_ref(id)).is_empty() {
            return Err(CategoryError::HasChildren(id.clone()));
        }

        Ok(self.nodes.remove(position))
    }

    /// Built-in tutoring categories used when no catalog export is configured.
    pub fn tutoring_defaults() -> Self {
        let mut tree = Self::new();
        let seed = [
            NewCategory::root("music", "Music").with_description("Instruments, voice, and theory"),
            NewCategory::root("languages", "Languages"),
            NewCategory::root("mathematics", "Mathematics"),
            NewCategory::child("piano", "Piano", "music"),
            NewCategory::child("guitar", "Guitar", "music"),
            NewCategory::child("voice", "Voice", "music"),
            NewCategory::child("english", "English", "languages"),
            NewCategory::child("spanish", "Spanish", "languages"),
            NewCategory::child("algebra", "Algebra", "mathematics"),
            NewCategory::child("calculus", "Calculus", "mathematics"),
            NewCategory::child("piano-classical", "Classical repertoire", "piano"),
            NewCategory::child("piano-jazz", "Jazz improvisation", "piano"),
            NewCategory::child("guitar-acoustic", "Acoustic", "guitar"),
            NewCategory::child("guitar-electric", "Electric", "guitar"),
            NewCategory::child("english-exam-prep", "Exam preparation", "english"),
            NewCategory::child("english-conversation", "Conversation", "english"),
            NewCategory::child("spanish-conversation", "Conversation", "spanish"),
            NewCategory::child("algebra-linear", "Linear algebra", "algebra"),
            NewCategory::child("calculus-ap", "AP Calculus", "calculus"),
        ];

        for request in seed {
            if let Err(err) = tree.insert(request) {
                tracing::error!(error = %err, "built-in category rejected");
            }
        }

        tree
    }

    fn generate_id(&mut self) -> CategoryId {
        loop {
            self.next_id += 1;
            let candidate = CategoryId(format!("cat-{:04}", self.next_id));
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
