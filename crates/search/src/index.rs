//! In-memory section index
//!
//! Built in one linear pass over a persisted section list. Children are
//! derived from `parent_id` links; any `children` cache on the input is ignored.

use reportforge_common::errors::{AppError, Result};
use reportforge_common::models::Section;
use std::collections::{HashMap, HashSet};

/// Lookup tables over a borrowed section list
#[derive(Debug, Clone)]
pub struct SectionIndex<'a> {
    /// Sections in tree (creation) order
    sections: &'a [Section],

    /// Section id -> position in `sections`
    by_id: HashMap<&'a str, usize>,

    /// Parent id -> child positions in encounter order
    children_by_parent: HashMap<&'a str, Vec<usize>>,

    /// Positions of sections without a parent
    roots: Vec<usize>,
}

impl<'a> SectionIndex<'a> {
    /// Index a section list; duplicate ids are a data-integrity error
    pub fn build(sections: &'a [Section]) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(sections.len());
        let mut children_by_parent: HashMap<&'a str, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();

        for (position, section) in sections.iter().enumerate() {
            if by_id.insert(section.id.as_str(), position).is_some() {
                return Err(AppError::DuplicateSectionId {
                    id: section.id.clone(),
                });
            }
            match section.parent_id.as_deref() {
                Some(parent_id) => children_by_parent.entry(parent_id).or_default().push(position),
                None => roots.push(position),
            }
        }

        tracing::debug!(
            sections = sections.len(),
            parents = children_by_parent.len(),
            "Section index built"
        );

        Ok(Self {
            sections,
            by_id,
            children_by_parent,
            roots,
        })
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &'a [Section] {
        self.sections
    }

    pub fn get(&self, id: &str) -> Option<&'a Section> {
        self.by_id.get(id).map(|&position| &self.sections[position])
    }

    /// Fetch a section or fail with `SectionNotFound`
    pub fn require(&self, id: &str) -> Result<&'a Section> {
        self.get(id).ok_or_else(|| AppError::SectionNotFound { id: id.to_string() })
    }

    /// Direct children in encounter order
    pub fn children(&self, id: &str) -> Vec<&'a Section> {
        self.positions_under(Some(id))
            .iter()
            .map(|&position| &self.sections[position])
            .collect()
    }

    pub fn roots(&self) -> Vec<&'a Section> {
        self.positions_under(None)
            .iter()
            .map(|&position| &self.sections[position])
            .collect()
    }

    /// Ancestors ordered root first, direct parent last
    pub fn parent_chain(&self, id: &str) -> Result<Vec<&'a Section>> {
        let mut current = self.require(id)?;
        let mut seen: HashSet<&str> = HashSet::from([current.id.as_str()]);
        let mut chain = Vec::new();

        while let Some(parent_id) = current.parent_id.as_deref() {
            if !seen.insert(parent_id) {
                return Err(AppError::CycleDetected {
                    section_id: id.to_string(),
                });
            }
            let parent = self.get(parent_id).ok_or_else(|| AppError::DanglingParent {
                section_id: current.id.clone(),
                parent_id: parent_id.to_string(),
            })?;
            chain.push(parent);
            current = parent;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Sections sharing this section's parent (roots share `None`), minus itself
    pub fn siblings(&self, id: &str) -> Result<Vec<&'a Section>> {
        let section = self.require(id)?;
        Ok(self
            .positions_under(section.parent_id.as_deref())
            .iter()
            .map(|&position| &self.sections[position])
            .filter(|sibling| sibling.id != section.id)
            .collect())
    }

    /// Transitive children, level by level, each level in creation order
    pub fn descendants(&self, id: &str) -> Result<Vec<&'a Section>> {
        let root = self.require(id)?;
        let mut visited: HashSet<&str> = HashSet::from([root.id.as_str()]);
        let mut level: Vec<&str> = vec![root.id.as_str()];
        let mut result = Vec::new();

        while !level.is_empty() {
            let mut positions: Vec<usize> = level
                .iter()
                .flat_map(|&parent_id| self.positions_under(Some(parent_id)))
                .copied()
                .collect();
            positions.sort_unstable();

            level = Vec::with_capacity(positions.len());
            for position in positions {
                let child = &self.sections[position];
                if !visited.insert(child.id.as_str()) {
                    return Err(AppError::CycleDetected {
                        section_id: child.id.clone(),
                    });
                }
                result.push(child);
                level.push(child.id.as_str());
            }
        }

        Ok(result)
    }

    fn positions_under(&self, parent: Option<&str>) -> &[usize] {
        match parent {
            Some(parent_id) => self
                .children_by_parent
                .get(parent_id)
                .map(|v| v.as_slice())
                .unwrap_or(&[]),
            None => &self.roots,
        }
    }
}
