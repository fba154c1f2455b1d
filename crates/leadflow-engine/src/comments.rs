//! # Comment Thread
//!
//! Free-text notes on a lead's assignment. Anyone may comment; only the
//! author or a privileged actor may delete. Deletion keeps the removed
//! text in the `comment_deleted` activity.

use leadflow_core::{Actor, CommentId, LeadId, Timestamp};

use crate::activity::{comment_preview, ActivityData, ActivityEntry, ActivityKind};
use crate::engine::LeadEngine;
use crate::error::{EngineError, RecordKind};
use crate::records::{LeadAssignment, LeadComment};
use crate::store::Transaction;

impl LeadEngine {
    /// Attach a comment to the lead's current assignment.
    pub fn add_comment(
        &self,
        lead_id: &LeadId,
        actor: &Actor,
        text: &str,
    ) -> Result<LeadComment, EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::validation("comment text is empty"));
        }

        let (comment, _) = self.store().transaction(*lead_id, |tx| {
            tx.lead()?;
            let assignment = tx.require_assignment()?;
            Ok(self.stage_comment(tx, &assignment, actor, text))
        })?;

        tracing::info!(%lead_id, comment_id = %comment.id, "comment added");
        Ok(comment)
    }

    /// Stage a comment and its `comment_added` activity on `tx`.
    pub(crate) fn stage_comment(
        &self,
        tx: &mut Transaction<'_>,
        assignment: &LeadAssignment,
        actor: &Actor,
        text: &str,
    ) -> LeadComment {
        let comment = LeadComment {
            id: CommentId::new(),
            assignment_id: assignment.id,
            lead_id: assignment.lead_id,
            author_id: actor.employee_id,
            text: text.to_string(),
            created_at: Timestamp::now(),
        };
        tx.add_comment(comment.clone());
        tx.log(ActivityEntry::new(
            ActivityKind::CommentAdded,
            format!(
                "Comment added: {}",
                comment_preview(text, self.config().comment_preview_chars)
            ),
            ActivityData::CommentAdded {
                comment_id: comment.id,
                comment: comment.text.clone(),
            },
            Some(actor.employee_id),
        ));
        comment
    }

    /// Remove a comment. Permitted for its author and privileged actors.
    pub fn delete_comment(&self, comment_id: &CommentId, actor: &Actor) -> Result<(), EngineError> {
        let lead_id = self
            .store()
            .lead_of_comment(comment_id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Comment, comment_id))?;

        self.store().transaction(lead_id, |tx| {
            let comment = tx
                .comment(comment_id)
                .ok_or_else(|| EngineError::not_found(RecordKind::Comment, comment_id))?;
            if !actor.is_privileged_or(&comment.author_id) {
                tracing::warn!(actor = %actor, %comment_id, "comment deletion refused");
                return Err(EngineError::permission(actor, "delete this comment"));
            }
            tx.remove_comment(comment.id);
            tx.log(ActivityEntry::new(
                ActivityKind::CommentDeleted,
                format!(
                    "Comment deleted: {}",
                    comment_preview(&comment.text, self.config().comment_preview_chars)
                ),
                ActivityData::CommentDeleted {
                    comment_id: comment.id,
                    author_id: comment.author_id,
                    deleted_comment: comment.text,
                },
                Some(actor.employee_id),
            ));
            Ok(())
        })?;

        tracing::info!(%lead_id, %comment_id, "comment deleted");
        Ok(())
    }

    /// Comments on a lead, oldest first.
    pub fn list_comments(&self, lead_id: &LeadId) -> Result<Vec<LeadComment>, EngineError> {
        self.store().read(|t| {
            if !t.leads.contains(lead_id) {
                return Err(EngineError::not_found(RecordKind::Lead, lead_id));
            }
            Ok(t.comments_for(lead_id).to_vec())
        })
    }
}
