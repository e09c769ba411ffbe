//! Database queries for teacher profiles and their subject/class assignments.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entity::teacher::{self, Entity as Teacher};
use crate::entity::{teacher_class, teacher_subject};
use crate::error::{AppError, AppResult};

use super::DbPool;

/// A teacher profile with its assignment sets loaded.
#[derive(Debug, Clone)]
pub struct TeacherAssignment {
    pub teacher_id: Uuid,
    pub user_id: Uuid,
    pub subject_ids: HashSet<Uuid>,
    pub class_ids: HashSet<Uuid>,
    pub created_at: chrono::DateTime<Utc>,
}

impl TeacherAssignment {
    pub fn subject_list(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.subject_ids.iter().copied().collect();
        ids.sort();
        ids
    }

    pub fn class_list(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.class_ids.iter().copied().collect();
        ids.sort();
        ids
    }
}

async fn write_assignments(
    txn: &DatabaseTransaction,
    teacher_id: Uuid,
    subject_ids: &[Uuid],
    class_ids: &[Uuid],
) -> AppResult<()> {
    teacher_subject::Entity::delete_many()
        .filter(teacher_subject::Column::TeacherId.eq(teacher_id))
        .exec(txn)
        .await?;
    teacher_class::Entity::delete_many()
        .filter(teacher_class::Column::TeacherId.eq(teacher_id))
        .exec(txn)
        .await?;

    let subjects: HashSet<Uuid> = subject_ids.iter().copied().collect();
    if !subjects.is_empty() {
        let rows = subjects.into_iter().map(|subject_id| teacher_subject::ActiveModel {
            teacher_id: Set(teacher_id),
            subject_id: Set(subject_id),
        });
        teacher_subject::Entity::insert_many(rows)
            .exec_without_returning(txn)
            .await?;
    }

    let classes: HashSet<Uuid> = class_ids.iter().copied().collect();
    if !classes.is_empty() {
        let rows = classes.into_iter().map(|class_id| teacher_class::ActiveModel {
            teacher_id: Set(teacher_id),
            class_id: Set(class_id),
        });
        teacher_class::Entity::insert_many(rows)
            .exec_without_returning(txn)
            .await?;
    }

    Ok(())
}

impl DbPool {
    /// Create a teacher profile and its assignments in one transaction.
    pub async fn insert_teacher(
        &self,
        user_id: Uuid,
        subject_ids: &[Uuid],
        class_ids: &[Uuid],
    ) -> AppResult<TeacherAssignment> {
        let teacher_id = Uuid::now_v7();
        let txn = self.connection().begin().await?;

        teacher::ActiveModel {
            id: Set(teacher_id),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert teacher: {}", e)))?;

        write_assignments(&txn, teacher_id, subject_ids, class_ids).await?;
        txn.commit().await?;

        self.get_teacher_assignment(teacher_id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to fetch newly inserted teacher".to_string()))
    }

    /// Replace both assignment sets atomically.
    pub async fn set_teacher_assignments(
        &self,
        teacher_id: Uuid,
        subject_ids: &[Uuid],
        class_ids: &[Uuid],
    ) -> AppResult<()> {
        let txn = self.connection().begin().await?;
        write_assignments(&txn, teacher_id, subject_ids, class_ids).await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn get_teacher_by_user_id(&self, user_id: Uuid) -> AppResult<Option<teacher::Model>> {
        Ok(Teacher::find()
            .filter(teacher::Column::UserId.eq(user_id))
            .one(self.connection())
            .await?)
    }

    pub async fn get_teacher_assignment(
        &self,
        teacher_id: Uuid,
    ) -> AppResult<Option<TeacherAssignment>> {
        match Teacher::find_by_id(teacher_id).one(self.connection()).await? {
            Some(profile) => Ok(Some(self.load_assignment(profile).await?)),
            None => Ok(None),
        }
    }

    /// Profile of the teacher behind a user account, with assignments.
    pub async fn get_teacher_assignment_by_user(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<TeacherAssignment>> {
        match self.get_teacher_by_user_id(user_id).await? {
            Some(profile) => Ok(Some(self.load_assignment(profile).await?)),
            None => Ok(None),
        }
    }

    async fn load_assignment(&self, profile: teacher::Model) -> AppResult<TeacherAssignment> {
        let subject_ids = teacher_subject::Entity::find()
            .filter(teacher_subject::Column::TeacherId.eq(profile.id))
            .all(self.connection())
            .await?
            .into_iter()
            .map(|row| row.subject_id)
            .collect();

        let class_ids = teacher_class::Entity::find()
            .filter(teacher_class::Column::TeacherId.eq(profile.id))
            .all(self.connection())
            .await?
            .into_iter()
            .map(|row| row.class_id)
            .collect();

        Ok(TeacherAssignment {
            teacher_id: profile.id,
            user_id: profile.user_id,
            subject_ids,
            class_ids,
            created_at: profile.created_at,
        })
    }
}
