use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::tree::{Category, CategoryError, CategoryId, CategoryTree, NewCategory};
use crate::workflows::registration::{CatalogError, CatalogOption, OptionCatalog, OptionQuery};

/// Thread-safe category catalog shared by the admin API and the registration flow.
#[derive(Debug, Default)]
pub struct SharedCategoryCatalog {
    tree: RwLock<CategoryTree>,
}

impl SharedCategoryCatalog {
    pub fn new(tree: CategoryTree) -> Self {
        Self {
            tree: RwLock::new(tree),
        }
    }

    pub fn snapshot(&self) -> Result<Vec<Category>, CategoryError> {
        Ok(self.read()?.nodes().to_vec())
    }

    pub fn get(&self, id: &CategoryId) -> Result<Option<Category>, CategoryError> {
        Ok(self.read()?.get(id).cloned())
    }

    pub fn insert(&self, request: NewCategory) -> Result<Category, CategoryError> {
        self.write()?.insert(request)
    }

    pub fn rename(
        &self,
        id: &CategoryId,
        label: &str,
        description: Option<String>,
    ) -> Result<Category, CategoryError> {
        self.write()?.rename(id, label, description)
    }

    pub fn remove(&self, id: &CategoryId) -> Result<Category, CategoryError> {
        self.write()?.remove(id)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CategoryTree>, CategoryError> {
        self.tree.read().map_err(|_| CategoryError::Unavailable)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CategoryTree>, CategoryError> {
        self.tree.write().map_err(|_| CategoryError::Unavailable)
    }
}

impl OptionCatalog for SharedCategoryCatalog {
    fn options_for_step(&self, query: &OptionQuery) -> Result<Vec<CatalogOption>, CatalogError> {
        let tree = self
            .read()
            .map_err(|err| CatalogError::Unavailable(err.to_string()))?;

        let nodes = if query.dependent_ids.is_empty() {
            tree.roots()
        } else {
            let parents: Vec<CategoryId> = query
                .dependent_ids
                .iter()
                .map(|id| CategoryId(id.clone()))
                .collect();
            tree.children_of(&parents)
        };

        debug!(
            role = %query.role,
            step = query.step_number,
            parents = query.dependent_ids.len(),
            options = nodes.len(),
            "resolved catalog options"
        );

        Ok(nodes
            .into_iter()
            .map(|node| CatalogOption {
                id: node.id.0.clone(),
                label: node.label.clone(),
                description: node.description.clone(),
            })
            .collect())
    }
}
