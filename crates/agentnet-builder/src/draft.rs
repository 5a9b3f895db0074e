use agentnet_core::types::AgentKind;
use agentnet_graph::Node;

/// Fields of an in-progress agent-creation form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentFormDraft {
    pub name: String,
    pub role: String,
    /// Comma-separated.
    pub goals: String,
    pub model: String,
    pub kind: AgentKind,
}

impl AgentFormDraft {
    /// Empty draft with `model` preselected.
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Name and role are required; everything else may be blank.
    pub fn is_submittable(&self) -> bool {
        !self.name.trim().is_empty() && !self.role.trim().is_empty()
    }

    pub fn goal_list(&self) -> Vec<String> {
        split_goals(&self.goals)
    }

    /// Node carrying this draft's fields under `id`.
    pub fn to_node(&self, id: impl Into<String>) -> Node {
        let mut node = Node::new(id, self.name.trim())
            .with_kind(self.kind)
            .with_role(self.role.trim())
            .with_goals(self.goal_list());
        let model = self.model.trim();
        if !model.is_empty() {
            node = node.with_model(model);
        }
        node
    }
}

/// Split a comma-separated goal string, trimming and dropping empty parts.
pub fn split_goals(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// The creation form: visibility, the draft being edited, and whether a
/// submission is waiting on the backend.
#[derive(Debug, Clone)]
pub struct AgentForm {
    open: bool,
    pending: bool,
    draft: AgentFormDraft,
    default_model: String,
}

impl AgentForm {
    pub fn new(default_model: impl Into<String>) -> Self {
        let default_model = default_model.into();
        Self {
            open: false,
            pending: false,
            draft: AgentFormDraft::with_model(default_model.clone()),
            default_model,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn draft(&self) -> &AgentFormDraft {
        &self.draft
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Replace the draft. Ignored while a submission is pending.
    pub fn edit(&mut self, draft: AgentFormDraft) {
        if self.pending {
            return;
        }
        self.draft = draft;
    }

    /// Discard the draft and close. A pending submission still completes.
    pub fn cancel(&mut self) {
        self.reset();
        self.open = false;
    }

    pub(crate) fn mark_pending(&mut self) {
        self.pending = true;
    }

    /// Called once the submission is resolved, by the backend or by fallback.
    pub(crate) fn finish_submit(&mut self) {
        self.pending = false;
        self.reset();
        self.open = false;
    }

    fn reset(&mut self) {
        self.draft = AgentFormDraft::with_model(self.default_model.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_goals() {
        assert_eq!(split_goals("a, b,,  c "), vec!["a", "b", "c"]);
        assert!(split_goals("").is_empty());
        assert!(split_goals(" , ,").is_empty());
        assert_eq!(split_goals("single"), vec!["single"]);
    }

    #[test]
    fn test_submittable_requires_name_and_role() {
        let mut draft = AgentFormDraft::with_model("gpt-4o-mini");
        assert!(!draft.is_submittable());
        draft.name = "Writer".into();
        assert!(!draft.is_submittable());
        draft.role = "   ".into();
        assert!(!draft.is_submittable());
        draft.role = "Writes".into();
        assert!(draft.is_submittable());
    }

    #[test]
    fn test_to_node_carries_fields() {
        let draft = AgentFormDraft {
            name: " Writer ".into(),
            role: "Writes copy".into(),
            goals: "draft, edit".into(),
            model: "gpt-4o".into(),
            kind: AgentKind::LlmAgent,
        };
        let node = draft.to_node("n7");
        assert_eq!(node.id, "n7");
        assert_eq!(node.label, "Writer");
        assert_eq!(node.kind, AgentKind::LlmAgent);
        assert_eq!(node.role.as_deref(), Some("Writes copy"));
        assert_eq!(node.model.as_deref(), Some("gpt-4o"));
        assert_eq!(node.goals, vec!["draft", "edit"]);
    }

    #[test]
    fn test_to_node_blank_model_is_none() {
        let draft = AgentFormDraft {
            name: "A".into(),
            role: "R".into(),
            ..AgentFormDraft::default()
        };
        assert!(draft.to_node("x").model.is_none());
    }

    #[test]
    fn test_form_cancel_resets_to_default_model() {
        let mut form = AgentForm::new("gpt-4o-mini");
        form.open();
        form.edit(AgentFormDraft {
            name: "A".into(),
            model: "other".into(),
            ..AgentFormDraft::default()
        });
        form.cancel();
        assert!(!form.is_open());
        assert_eq!(form.draft(), &AgentFormDraft::with_model("gpt-4o-mini"));
    }

    #[test]
    fn test_form_edit_ignored_while_pending() {
        let mut form = AgentForm::new("m");
        form.edit(AgentFormDraft {
            name: "first".into(),
            ..AgentFormDraft::default()
        });
        form.mark_pending();
        form.edit(AgentFormDraft {
            name: "second".into(),
            ..AgentFormDraft::default()
        });
        assert_eq!(form.draft().name, "first");
        form.finish_submit();
        assert!(!form.is_pending());
        assert!(form.draft().name.is_empty());
    }
}
