//! Selection controller
//!
//! Owns the [`ScopeSelection`] and applies the cascading rules:
//!
//! - a new region clears the compartment and the instance set, and both
//!   levels are reloaded (compartments right away, instances once a
//!   compartment is picked)
//! - a new compartment clears the instance set and reloads the instance level
//!   when the document kind uses instances
//! - a new document kind never clears anything
//!
//! Setting a value equal to the current one is a no-op.

use crate::model::{DocumentKind, OptionId, ScopeSelection};
use crate::tree::OptionLevel;

/// Outcome of one selection change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionUpdate {
    /// Scope after the change
    pub scope: ScopeSelection,

    /// Levels whose options are no longer valid, nearest first
    pub invalidated: Vec<OptionLevel>,

    /// Levels that must be fetched again for the new scope
    pub reload: Vec<OptionLevel>,
}

impl SelectionUpdate {
    fn unchanged(scope: &ScopeSelection) -> Self {
        Self {
            scope: scope.clone(),
            invalidated: Vec::new(),
            reload: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.invalidated.is_empty() && self.reload.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SelectionController {
    scope: ScopeSelection,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> &ScopeSelection {
        &self.scope
    }

    pub fn is_submission_ready(&self) -> bool {
        self.scope.is_submission_ready()
    }

    pub fn set_region(&mut self, region: impl Into<OptionId>) -> SelectionUpdate {
        let region = region.into();
        if self.scope.region.as_ref() == Some(&region) {
            return SelectionUpdate::unchanged(&self.scope);
        }

        self.scope.region = Some(region);
        self.scope.compartment_id = None;
        self.scope.compartment_name = None;
        self.scope.instance_ids.clear();

        SelectionUpdate {
            scope: self.scope.clone(),
            invalidated: OptionLevel::Region.downstream().to_vec(),
            reload: vec![OptionLevel::Compartment],
        }
    }

    pub fn set_document_kind(&mut self, kind: DocumentKind) -> SelectionUpdate {
        if self.scope.document_kind == Some(kind) {
            return SelectionUpdate::unchanged(&self.scope);
        }
        self.scope.document_kind = Some(kind);

        // Switching into a kind that uses instances needs the list if a
        // compartment is already chosen.
        let reload = if kind.uses_instances() && self.scope.compartment_id.is_some() {
            vec![OptionLevel::Instance]
        } else {
            Vec::new()
        };

        SelectionUpdate {
            scope: self.scope.clone(),
            invalidated: Vec::new(),
            reload,
        }
    }

    pub fn set_compartment(
        &mut self,
        compartment_id: impl Into<OptionId>,
        compartment_name: impl Into<String>,
    ) -> SelectionUpdate {
        let compartment_id = compartment_id.into();
        if self.scope.compartment_id.as_ref() == Some(&compartment_id) {
            return SelectionUpdate::unchanged(&self.scope);
        }

        self.scope.compartment_id = Some(compartment_id);
        self.scope.compartment_name = Some(compartment_name.into());
        self.scope.instance_ids.clear();

        let reload = if self.uses_instances() {
            vec![OptionLevel::Instance]
        } else {
            Vec::new()
        };

        SelectionUpdate {
            scope: self.scope.clone(),
            invalidated: OptionLevel::Compartment.downstream().to_vec(),
            reload,
        }
    }

    /// Flip membership of one instance; returns whether it is now selected
    /// together with the new scope.
    pub fn toggle_instance(&mut self, instance_id: impl Into<OptionId>) -> (bool, SelectionUpdate) {
        let instance_id = instance_id.into();
        let selected = if self.scope.instance_ids.remove(&instance_id) {
            false
        } else {
            self.scope.instance_ids.insert(instance_id);
            true
        };
        (selected, SelectionUpdate::unchanged(&self.scope))
    }

    /// Drop the whole scope
    pub fn reset(&mut self) -> SelectionUpdate {
        self.scope = ScopeSelection::new();
        SelectionUpdate {
            scope: self.scope.clone(),
            invalidated: vec![
                OptionLevel::Compartment,
                OptionLevel::Instance,
            ],
            reload: Vec::new(),
        }
    }

    fn uses_instances(&self) -> bool {
        self.scope
            .document_kind
            .map(|k| k.uses_instances())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_with_instances() -> SelectionController {
        let mut c = SelectionController::new();
        c.set_document_kind(DocumentKind::NewHost);
        c.set_region("r1");
        c.set_compartment("comp-a", "A");
        c.toggle_instance("i1");
        c.toggle_instance("i2");
        c
    }

    #[test]
    fn test_region_change_clears_downstream() {
        let mut c = controller_with_instances();
        let update = c.set_region("r2");

        assert_eq!(update.scope.region, Some("r2".into()));
        assert_eq!(update.scope.compartment_id, None);
        assert_eq!(update.scope.compartment_name, None);
        assert!(update.scope.instance_ids.is_empty());
        assert_eq!(
            update.invalidated,
            vec![OptionLevel::Compartment, OptionLevel::Instance]
        );
        assert_eq!(update.reload, vec![OptionLevel::Compartment]);
        // kind survives
        assert_eq!(update.scope.document_kind, Some(DocumentKind::NewHost));
    }

    #[test]
    fn test_compartment_change_clears_instances() {
        let mut c = controller_with_instances();
        let update = c.set_compartment("comp-b", "B");

        assert_eq!(update.scope.compartment_id, Some("comp-b".into()));
        assert!(update.scope.instance_ids.is_empty());
        assert_eq!(update.invalidated, vec![OptionLevel::Instance]);
        assert_eq!(update.reload, vec![OptionLevel::Instance]);
    }

    #[test]
    fn test_compartment_change_without_new_host_skips_instance_reload() {
        let mut c = SelectionController::new();
        c.set_document_kind(DocumentKind::FullInfra);
        c.set_region("r1");
        let update = c.set_compartment("comp-a", "A");

        assert_eq!(update.invalidated, vec![OptionLevel::Instance]);
        assert!(update.reload.is_empty());
        assert!(c.is_submission_ready());
    }

    #[test]
    fn test_document_kind_keeps_scope() {
        let mut c = controller_with_instances();
        let update = c.set_document_kind(DocumentKind::Kubernetes);

        assert_eq!(update.scope.compartment_id, Some("comp-a".into()));
        assert_eq!(update.scope.instance_ids.len(), 2);
        assert!(update.invalidated.is_empty());
        // gate now follows the compartment rule
        assert!(c.is_submission_ready());

        let update = c.set_document_kind(DocumentKind::NewHost);
        assert_eq!(update.reload, vec![OptionLevel::Instance]);
    }

    #[test]
    fn test_same_value_is_noop() {
        let mut c = controller_with_instances();
        assert!(c.set_region("r1").is_noop());
        assert!(c.set_compartment("comp-a", "A").is_noop());
        assert_eq!(c.scope().instance_ids.len(), 2);
    }

    #[test]
    fn test_toggle_on_then_off() {
        let mut c = SelectionController::new();
        c.set_document_kind(DocumentKind::NewHost);
        c.set_region("r1");
        c.set_compartment("comp-a", "A");

        let (on, _) = c.toggle_instance("i1");
        assert!(on);
        c.toggle_instance("i2");
        let (on, update) = c.toggle_instance("i1");
        assert!(!on);
        assert_eq!(update.scope.instance_ids.len(), 1);
        assert!(update.scope.instance_ids.contains(&OptionId::from("i2")));
        assert!(c.is_submission_ready());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut c = controller_with_instances();
        let update = c.reset();
        assert_eq!(update.scope, ScopeSelection::new());
        assert!(!c.is_submission_ready());
    }

    /// Whatever happened before, a region change ends with an empty
    /// compartment and instance set; a compartment change with an empty
    /// instance set.
    #[test]
    fn test_cascading_invalidation_property() {
        let kinds = [None, Some(DocumentKind::NewHost), Some(DocumentKind::FullInfra)];
        for kind in kinds {
            for toggles in 0..3 {
                let mut c = SelectionController::new();
                if let Some(kind) = kind {
                    c.set_document_kind(kind);
                }
                c.set_region("r1");
                c.set_compartment("comp", "Comp");
                for i in 0..toggles {
                    c.toggle_instance(format!("i{i}"));
                }

                let update = c.set_compartment("other", "Other");
                assert!(update.scope.instance_ids.is_empty());

                for i in 0..toggles {
                    c.toggle_instance(format!("i{i}"));
                }
                let update = c.set_region("r2");
                assert!(update.scope.compartment_id.is_none());
                assert!(update.scope.instance_ids.is_empty());
            }
        }
    }
}
