use crate::core::AppError;
use crate::db::access::{visible_resource, visible_resource_for_update, Viewer};
use crate::db::points::{award, COMMENT_POINTS};
use crate::models::comments::{AddCommentRequest, Comment, CommentNode};
use crate::models::points::PointAction;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

const MAX_COMMENT_GRAPHEMES: usize = 2000;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for CommentNode {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            parent_id: row.parent_id,
            content: row.content,
            created_at: row.created_at,
            replies: Vec::new(),
        }
    }
}

/// Assembles flat rows (oldest first) into a forest. Children land under
/// their parent in chronological order; a comment whose parent is absent
/// from the batch, or which names itself, is promoted to a root rather
/// than dropped. Iterative, so reply depth is unbounded.
pub fn build_comment_forest(rows: Vec<CommentRow>) -> Vec<CommentNode> {
    let order: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut nodes: HashMap<Uuid, CommentNode> = rows
        .into_iter()
        .map(|row| (row.id, CommentNode::from(row)))
        .collect();

    // Walk youngest-first so every child is attached before its parent
    // is itself moved. A removed parent means the child stays a root.
    for id in order.iter().rev() {
        let parent_id = match nodes.get(id).and_then(|node| node.parent_id) {
            Some(parent_id) if parent_id != *id && nodes.contains_key(&parent_id) => parent_id,
            _ => continue,
        };

        if let Some(child) = nodes.remove(id) {
            if let Some(parent) = nodes.get_mut(&parent_id) {
                parent.replies.insert(0, child);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| nodes.remove(&id))
        .collect()
}

/// Adds a comment (optionally as a reply), bumps the cached counter and
/// awards the commenter in one transaction.
pub async fn add_comment(
    pool: &PgPool,
    viewer: &Viewer,
    resource_id: Uuid,
    request: AddCommentRequest,
) -> Result<Comment, AppError> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(AppError::invalid_operation("Comment cannot be empty"));
    }
    if content.graphemes(true).count() > MAX_COMMENT_GRAPHEMES {
        return Err(AppError::invalid_operation("Comment is too long"));
    }

    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    visible_resource_for_update(&mut tx, viewer, resource_id).await?;

    if let Some(parent_id) = request.parent_id {
        let parent_ok: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM comments
                WHERE id = $1 AND resource_id = $2 AND is_deleted = FALSE
            )
            "#,
        )
        .bind(parent_id)
        .bind(resource_id)
        .fetch_one(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

        if !parent_ok {
            return Err(AppError::not_found("Parent comment not found"));
        }
    }

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (resource_id, user_id, parent_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(resource_id)
    .bind(viewer.id)
    .bind(request.parent_id)
    .bind(content)
    .fetch_one(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    sqlx::query(
        "UPDATE resources SET total_comments = total_comments + 1, updated_at = now() WHERE id = $1",
    )
    .bind(resource_id)
    .execute(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    award(
        &mut tx,
        viewer.id,
        PointAction::Comment,
        COMMENT_POINTS,
        Some(resource_id),
        None,
    )
    .await?;

    tx.commit().await.map_err(AppError::db_error)?;

    Ok(comment)
}

pub async fn get_comment_tree(
    pool: &PgPool,
    viewer: &Viewer,
    resource_id: Uuid,
) -> Result<Vec<CommentNode>, AppError> {
    visible_resource(pool, viewer, resource_id).await?;

    let rows = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT c.id, c.user_id, p.name AS user_name, c.parent_id, c.content, c.created_at
        FROM comments c
        JOIN profiles p ON c.user_id = p.id
        WHERE c.resource_id = $1 AND c.is_deleted = FALSE
        ORDER BY c.created_at ASC
        "#,
    )
    .bind(resource_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(build_comment_forest(rows))
}

/// Soft-deletes a comment. Authors can delete their own; moderators can
/// delete any. Replies survive and get promoted on the next tree read.
pub async fn delete_comment(
    pool: &PgPool,
    viewer: &Viewer,
    comment_id: Uuid,
    is_moderator: bool,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    let comment = sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
    )
    .bind(comment_id)
    .fetch_optional(tx.as_mut())
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("Comment not found"))?;

    if comment.user_id != viewer.id && !is_moderator {
        return Err(AppError::forbidden_error(
            "You cannot delete another user's comment",
        ));
    }

    sqlx::query("UPDATE comments SET is_deleted = TRUE, updated_at = now() WHERE id = $1")
        .bind(comment_id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    sqlx::query(
        r#"
        UPDATE resources
        SET total_comments = GREATEST(total_comments - 1, 0), updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(comment.resource_id)
    .execute(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    tx.commit().await.map_err(AppError::db_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fake::faker::name::en::Name;
    use fake::Fake;
    use quickcheck_macros::quickcheck;

    fn row(n: u128, parent: Option<u128>, minute: u32) -> CommentRow {
        CommentRow {
            id: Uuid::from_u128(n),
            user_id: Uuid::from_u128(1000 + n),
            user_name: Name().fake(),
            parent_id: parent.map(Uuid::from_u128),
            content: format!("comment {}", n),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, minute, 0).unwrap(),
        }
    }

    fn count_nodes(nodes: &[CommentNode]) -> usize {
        nodes
            .iter()
            .map(|node| 1 + count_nodes(&node.replies))
            .sum()
    }

    #[test]
    fn nests_replies_and_promotes_orphans() {
        let rows = vec![
            row(1, None, 0),
            row(2, Some(1), 1),
            row(3, Some(2), 2),
            row(4, Some(99), 3),
        ];

        let forest = build_comment_forest(rows);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].id, Uuid::from_u128(1));
        assert_eq!(forest[0].replies.len(), 1);
        assert_eq!(forest[0].replies[0].id, Uuid::from_u128(2));
        assert_eq!(forest[0].replies[0].replies[0].id, Uuid::from_u128(3));
        assert_eq!(forest[1].id, Uuid::from_u128(4));
        assert!(forest[1].replies.is_empty());
    }

    #[test]
    fn siblings_stay_in_chronological_order() {
        let rows = vec![
            row(1, None, 0),
            row(2, Some(1), 1),
            row(3, Some(1), 2),
            row(4, Some(1), 3),
        ];

        let forest = build_comment_forest(rows);

        assert_eq!(forest.len(), 1);
        let ids: Vec<Uuid> = forest[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![Uuid::from_u128(2), Uuid::from_u128(3), Uuid::from_u128(4)]
        );
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let mut rows = vec![row(1, None, 0)];
        for n in 2..=5000u128 {
            rows.push(row(n, Some(n - 1), (n % 60) as u32));
        }

        let forest = build_comment_forest(rows);

        assert_eq!(forest.len(), 1);
        assert_eq!(count_nodes(&forest), 5000);
    }

    #[test]
    fn self_referencing_comment_becomes_a_root() {
        let rows = vec![row(1, Some(1), 0), row(2, Some(1), 1)];

        let forest = build_comment_forest(rows);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, Uuid::from_u128(1));
        assert_eq!(forest[0].replies.len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_forest() {
        assert!(build_comment_forest(Vec::new()).is_empty());
    }

    #[quickcheck]
    fn every_comment_survives_forest_assembly(parent_choices: Vec<Option<usize>>) -> bool {
        let rows: Vec<CommentRow> = parent_choices
            .iter()
            .enumerate()
            .map(|(i, choice)| {
                let parent = choice.map(|p| (p % (parent_choices.len().max(1)) + 1) as u128);
                row((i + 1) as u128, parent, (i % 60) as u32)
            })
            .collect();
        let expected = rows.len();

        count_nodes(&build_comment_forest(rows)) == expected
    }
}
